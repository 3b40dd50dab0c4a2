use crate::config::settings::{DetectorConfig, EngineConfig};
use crate::error::{Result, TrackError};
use crate::shared::frame::Image;
use crate::tracking::domain::bounding_box::BoundingBox;
use crate::tracking::domain::detection::Detection;
use crate::tracking::domain::detector::{Detect, DetectionCandidate};
use crate::tracking::domain::feature::Feature;
use crate::tracking::domain::feature_extractor::Extract;
use crate::tracking::domain::frame_source::FrameSource;
use crate::tracking::domain::labeled_frame::LabeledFrame;
use crate::tracking::domain::roi_gate::RoiGate;
use crate::tracking::domain::track_manager::TrackManager;

/// Minimum pixel area a clipped detection box must keep after edge
/// clipping to be worth extracting a feature for.
const MIN_BOX_AREA: f32 = 1.0;

/// Drives the full per-tick flow of §4.8, in order: predict, emit
/// (ROI-filtered), then optional ROI crop, detect, per-detection
/// extract, associate/update — predict then show, observe then learn.
///
/// Grounded on `pipeline/preview_faces_use_case.rs`'s
/// read-detect-extract-accumulate shape, simplified to the
/// single-threaded loop this system's concurrency model specifies (§5).
pub struct Pipeline {
    source: Box<dyn FrameSource>,
    detector: Box<dyn Detect>,
    extractor: Box<dyn Extract>,
    manager: TrackManager,
    roi: RoiGate,
    detector_config: DetectorConfig,
    frame_index: u64,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn Detect>,
        extractor: Box<dyn Extract>,
        engine: &EngineConfig,
    ) -> Result<Self> {
        let associator = engine.build_associator()?;
        let roi = engine.build_roi_gate()?;
        let manager = TrackManager::new(associator, engine.track_config());
        Ok(Self {
            source,
            detector,
            extractor,
            manager,
            roi,
            detector_config: engine.detector.clone(),
            frame_index: 0,
        })
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Pulls and processes the next frame into `out`. Returns `Ok(false)`
    /// once the source is exhausted. A recoverable per-frame error
    /// (`BadImage`/`DetectorFailure`/`ExtractorFailure`/
    /// `DimensionMismatch`) is logged and the loop moves to the next
    /// source frame without advancing `frame_index`, per §7.
    pub fn next(&mut self, out: &mut LabeledFrame) -> Result<bool> {
        loop {
            if !self.source.has_next() {
                return Ok(false);
            }
            let image = match self.source.next()? {
                Some(image) => image,
                None => return Ok(false),
            };

            // predict then show: emission reflects the just-computed
            // prediction, before this frame's detections correct it.
            self.manager.predict_all();
            self.manager.fill_labeled_frame(self.frame_index, out);
            if self.roi.enabled() {
                let (w, h) = (image.width(), image.height());
                let roi = &self.roi;
                out.objects.retain(|o| {
                    let bbox = BoundingBox::new(o.x as f32, o.y as f32, o.w as f32, o.h as f32);
                    roi.contains_center(&bbox, w, h)
                });
            }

            // observe then learn: detect/extract/associate against the
            // prediction just emitted.
            match self.detect_and_update(&image) {
                Ok(()) => {
                    self.frame_index += 1;
                    return Ok(true);
                }
                Err(e) if is_frame_recoverable(&e) => {
                    log::warn!("skipping frame {}: {e}", image.index());
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn detect_and_update(&mut self, image: &Image) -> Result<()> {
        let (fw, fh) = (image.width(), image.height());
        let roi_rect = self.roi.pixel_rect(fw, fh);
        let detect_image;
        let detect_image_ref: &Image = if self.roi.enabled() {
            detect_image = image
                .crop(
                    roi_rect.x.round() as i32,
                    roi_rect.y.round() as i32,
                    roi_rect.w.round() as i32,
                    roi_rect.h.round() as i32,
                )
                .ok_or(TrackError::BadImage)?;
            &detect_image
        } else {
            image
        };

        let candidates = self
            .detector
            .detect(detect_image_ref, self.frame_index)
            .map_err(TrackError::DetectorFailure)?;
        let candidates = apply_detector_filters(candidates, &self.detector_config, detect_image_ref.width(), detect_image_ref.height());

        let mut detections = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let mut bbox = candidate.bbox;
            if self.roi.enabled() {
                bbox.x += roi_rect.x;
                bbox.y += roi_rect.y;
            }
            let clipped = bbox.clip(fw as f32, fh as f32);
            if clipped.area() < MIN_BOX_AREA {
                continue;
            }
            let patch = match image.crop(
                clipped.x.round() as i32,
                clipped.y.round() as i32,
                clipped.w.round() as i32,
                clipped.h.round() as i32,
            ) {
                Some(p) => p,
                None => continue,
            };

            let raw = self.extractor.extract(&patch).map_err(TrackError::ExtractorFailure)?;
            let feature = Feature::new(raw).normalized()?;
            detections.push(Detection::new(clipped, candidate.class_id, candidate.score, feature));
        }

        self.manager.update(detections)
    }
}

/// Applies §6's detector-config knobs: confidence threshold, class
/// whitelist, and edge-touching rejection. Grounded on the filtering
/// idiom in `examples/neutrinographics-faceguard/crates/core/src/detection/domain/region_merger.rs`.
fn apply_detector_filters(
    candidates: Vec<DetectionCandidate>,
    config: &DetectorConfig,
    frame_width: u32,
    frame_height: u32,
) -> Vec<DetectionCandidate> {
    candidates
        .into_iter()
        .filter(|c| c.score >= config.score_threshold)
        .filter(|c| config.focus_class_ids.is_empty() || config.focus_class_ids.contains(&c.class_id))
        .filter(|c| !config.filter_edge_boxes || !touches_edge(&c.bbox, frame_width, frame_height))
        .collect()
}

fn touches_edge(bbox: &BoundingBox, frame_width: u32, frame_height: u32) -> bool {
    bbox.x <= 0.0 || bbox.y <= 0.0 || bbox.x + bbox.w >= frame_width as f32 || bbox.y + bbox.h >= frame_height as f32
}

fn is_frame_recoverable(e: &TrackError) -> bool {
    matches!(
        e,
        TrackError::BadImage
            | TrackError::DetectorFailure(_)
            | TrackError::ExtractorFailure(_)
            | TrackError::DimensionMismatch { .. }
            | TrackError::ZeroVector
    )
}
