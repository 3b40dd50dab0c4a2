use crate::error::Result;
use crate::tracking::domain::associator::Associator;
use crate::tracking::domain::bounding_box::BoundingBox;
use crate::tracking::domain::detection::Detection;
use crate::tracking::domain::feature::Feature;
use crate::tracking::domain::labeled_frame::{LabeledFrame, LabeledObject};
use crate::tracking::domain::track::{Track, TrackConfig};

/// Owns every live track and the pending-detection buffer, and runs the
/// predict / associate / update / birth / decay cycle once per frame.
pub struct TrackManager {
    tracks: Vec<Track>,
    pending: Vec<Detection>,
    next_id: u64,
    associator: Associator,
    track_config: TrackConfig,
}

impl TrackManager {
    pub fn new(associator: Associator, track_config: TrackConfig) -> Self {
        Self {
            tracks: Vec::new(),
            pending: Vec::new(),
            next_id: 0,
            associator,
            track_config,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Step 1: advance every live track's motion filter.
    pub fn predict_all(&mut self) {
        for t in &mut self.tracks {
            t.predict();
        }
    }

    /// Step 2: fold new detections into the pending buffer.
    fn ingest(&mut self, detections: Vec<Detection>) -> Result<()> {
        // Drop anything already consumed by a live track or aged past the
        // 3-frame buffering window *before* matching this frame's
        // detections against it — otherwise a zombie entry can still win
        // a match, swallow the fresh detection (marking it "matched" so
        // it's never re-appended), and then get dropped itself a few
        // lines down, losing the detection entirely for this frame.
        self.pending.retain(|p| !p.is_consumed() && p.age <= 2);

        let pairs = {
            let left: Vec<(&BoundingBox, &Feature)> =
                self.pending.iter().map(|p| (&p.bbox, &p.feature)).collect();
            let right: Vec<(&BoundingBox, &Feature)> =
                detections.iter().map(|d| (&d.bbox, &d.feature)).collect();
            self.associator.match_greedy(&left, &right)?
        };

        let mut matched_detection = vec![false; detections.len()];
        for (p_idx, d_idx) in pairs {
            self.pending[p_idx].bbox = detections[d_idx].bbox;
            self.pending[p_idx].feature = detections[d_idx].feature.clone();
            self.pending[p_idx].class_id = detections[d_idx].class_id;
            self.pending[p_idx].score = detections[d_idx].score;
            matched_detection[d_idx] = true;
        }

        for (i, detection) in detections.into_iter().enumerate() {
            if !matched_detection[i] {
                self.pending.push(detection);
            }
        }
        Ok(())
    }

    /// Step 3: associate live tracks against pending, applying hits
    /// where the pending data is still fresh and marking every matched
    /// pending entry consumed either way. Returns which track indices
    /// were matched.
    fn associate_tracks_with_pending(&mut self) -> Result<Vec<bool>> {
        let pairs = {
            let left: Vec<(&BoundingBox, &Feature)> =
                self.tracks.iter().map(|t| (t.bbox(), t.feature())).collect();
            let right: Vec<(&BoundingBox, &Feature)> =
                self.pending.iter().map(|p| (&p.bbox, &p.feature)).collect();
            self.associator.match_greedy(&left, &right)?
        };

        let mut matched = vec![false; self.tracks.len()];
        for (t_idx, p_idx) in pairs {
            matched[t_idx] = true;
            if self.pending[p_idx].age < 2 {
                self.tracks[t_idx].update_as_hit(&self.pending[p_idx])?;
            }
            self.pending[p_idx].mark_consumed();
        }
        Ok(matched)
    }

    /// Step 4: decay tracks that weren't matched this frame, removing
    /// any whose life hit zero.
    fn decay_unmatched(&mut self, matched: &[bool]) {
        let mut i = 0;
        while i < self.tracks.len() {
            if !matched[i] {
                if self.tracks[i].update_as_miss() {
                    self.tracks.remove(i);
                    continue;
                }
            }
            i += 1;
        }
    }

    /// Step 5: graduate pending entries that survived two ingest
    /// cycles without being claimed by an existing track.
    fn confirm_new_tracks(&mut self) {
        let mut graduated = Vec::new();
        for (idx, p) in self.pending.iter().enumerate() {
            if p.is_consumed() || p.age < 2 {
                continue;
            }
            let feature = match p.feature.normalized() {
                Ok(f) => f,
                // near-zero appearance signal: drop this candidate rather
                // than fail the whole frame.
                Err(_) => continue,
            };
            let id = self.next_id;
            self.next_id += 1;
            self.tracks.push(Track::new(id, p.bbox, p.class_id, p.score, feature, self.track_config));
            graduated.push(idx);
        }
        // Mark the source entry consumed right away so the next frame's
        // `ingest` drops it instead of letting it re-match and swallow a
        // fresh detection meant for the track it just became.
        for idx in graduated {
            self.pending[idx].mark_consumed();
        }
    }

    /// Step 6: age every surviving pending entry by one frame.
    fn age_pending(&mut self) {
        for p in &mut self.pending {
            if !p.is_consumed() {
                p.age += 1;
            }
        }
    }

    /// Runs the full per-frame cycle (steps 2-6; `predict_all` is
    /// called separately, before detection, per the pipeline's flow).
    pub fn update(&mut self, detections: Vec<Detection>) -> Result<()> {
        self.ingest(detections)?;
        let matched = self.associate_tracks_with_pending()?;
        self.decay_unmatched(&matched);
        self.confirm_new_tracks();
        self.age_pending();
        Ok(())
    }

    /// Clears `out` and appends a `LabeledObject` for every healthy
    /// track, in internal track order.
    pub fn fill_labeled_frame(&self, frame_index: u64, out: &mut LabeledFrame) {
        out.frame_index = frame_index;
        out.objects.clear();
        for t in &self.tracks {
            if t.is_healthy() {
                let bbox = t.bbox();
                out.objects.push(LabeledObject {
                    id: t.id(),
                    x: bbox.x.round() as i32,
                    y: bbox.y.round() as i32,
                    w: bbox.w.round() as i32,
                    h: bbox.h.round() as i32,
                    class_id: t.class_id(),
                    score: t.score(),
                });
            }
        }
    }
}
