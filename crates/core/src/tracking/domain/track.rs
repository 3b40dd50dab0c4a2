use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tracking::domain::bounding_box::BoundingBox;
use crate::tracking::domain::detection::Detection;
use crate::tracking::domain::feature::Feature;
use crate::tracking::domain::motion_filter::{self, MotionFilter};

/// Which emission gate a track must clear to appear in a `LabeledFrame`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthyPolicy {
    /// `life > 0` — emits as soon as a track exists at all.
    Permissive,
    /// `life >= healthy_percent * max_life` — requires sustained hits.
    Strict,
}

impl Default for HealthyPolicy {
    fn default() -> Self {
        HealthyPolicy::Permissive
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    #[serde(default = "default_max_life")]
    pub max_life: u32,
    #[serde(default = "default_feature_momentum")]
    pub feature_momentum: f32,
    #[serde(default = "default_healthy_percent")]
    pub healthy_percent: f32,
    #[serde(default)]
    pub healthy_policy: HealthyPolicy,
    /// Overrides the motion filter's diagonal process noise for the
    /// position channels (§6 `kf_pos_noise`).
    #[serde(default = "default_kf_pos_noise")]
    pub kf_pos_noise: f32,
    /// Overrides the motion filter's diagonal process noise for the
    /// size channels (§6 `kf_size_noise`).
    #[serde(default = "default_kf_size_noise")]
    pub kf_size_noise: f32,
}

fn default_max_life() -> u32 {
    30
}

fn default_feature_momentum() -> f32 {
    0.7
}

fn default_healthy_percent() -> f32 {
    0.5
}

fn default_kf_pos_noise() -> f32 {
    motion_filter::POS_PROCESS_NOISE
}

fn default_kf_size_noise() -> f32 {
    motion_filter::SIZE_PROCESS_NOISE
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            max_life: default_max_life(),
            feature_momentum: default_feature_momentum(),
            healthy_percent: default_healthy_percent(),
            healthy_policy: HealthyPolicy::Permissive,
            kf_pos_noise: default_kf_pos_noise(),
            kf_size_noise: default_kf_size_noise(),
        }
    }
}

const MAX_CONSECUTIVE_HITS: u32 = 3;

/// A persistent identity across frames: motion state, fused appearance,
/// and the life/hit counters that decide whether it survives and
/// whether it's currently eligible for emission.
#[derive(Clone, Debug)]
pub struct Track {
    id: u64,
    motion: MotionFilter,
    bbox: BoundingBox,
    feature: Feature,
    class_id: i32,
    score: f32,
    life: u32,
    consecutive_hits: u32,
    config: TrackConfig,
}

impl Track {
    pub fn new(id: u64, bbox: BoundingBox, class_id: i32, score: f32, feature: Feature, config: TrackConfig) -> Self {
        let motion = MotionFilter::init_with_noise(&bbox, config.kf_pos_noise, config.kf_size_noise);
        Self {
            id,
            motion,
            bbox,
            feature,
            class_id,
            score,
            life: config.max_life,
            consecutive_hits: 0,
            config,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn feature(&self) -> &Feature {
        &self.feature
    }

    pub fn class_id(&self) -> i32 {
        self.class_id
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn life(&self) -> u32 {
        self.life
    }

    pub fn consecutive_hits(&self) -> u32 {
        self.consecutive_hits
    }

    /// Advances the motion filter and overwrites the current box with
    /// the prediction. Does not touch `life` or `consecutive_hits`.
    pub fn predict(&mut self) {
        self.bbox = self.motion.predict();
    }

    /// Corrects the filter, fuses appearance, and grows life.
    pub fn update_as_hit(&mut self, detection: &Detection) -> Result<()> {
        self.bbox = self.motion.correct(&detection.bbox);
        self.feature = self.feature.ema_fuse(&detection.feature, self.config.feature_momentum)?;
        self.class_id = detection.class_id;
        self.score = detection.score;
        self.consecutive_hits = (self.consecutive_hits + 1).min(MAX_CONSECUTIVE_HITS);
        let growth = 1u32 << self.consecutive_hits;
        self.life = (self.life + growth).min(self.config.max_life);
        Ok(())
    }

    /// Decays life on a miss. Returns `true` iff the track should be
    /// removed (life reached zero).
    pub fn update_as_miss(&mut self) -> bool {
        self.consecutive_hits = 0;
        self.life = self.life.saturating_sub(1);
        self.life == 0
    }

    pub fn is_healthy(&self) -> bool {
        match self.config.healthy_policy {
            HealthyPolicy::Permissive => self.life > 0,
            HealthyPolicy::Strict => {
                self.life as f32 >= self.config.healthy_percent * self.config.max_life as f32
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: f32, feat: Vec<f32>) -> Detection {
        Detection::new(
            BoundingBox::new(x, 0.0, 10.0, 10.0),
            0,
            0.9,
            Feature::new(feat).normalized().unwrap(),
        )
    }

    #[test]
    fn test_new_track_starts_at_max_life() {
        let cfg = TrackConfig::default();
        let track = Track::new(
            0,
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            0,
            0.9,
            Feature::new(vec![1.0]).normalized().unwrap(),
            cfg,
        );
        assert_eq!(track.life(), cfg.max_life);
        assert_eq!(track.consecutive_hits(), 0);
    }

    #[test]
    fn test_update_as_hit_grows_life_exponentially() {
        let cfg = TrackConfig {
            max_life: 100,
            ..TrackConfig::default()
        };
        let mut track = Track::new(0, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0, 0.9, Feature::new(vec![1.0]).normalized().unwrap(), cfg);
        track.life = 0;
        track.update_as_hit(&det(0.0, vec![1.0])).unwrap();
        assert_eq!(track.consecutive_hits(), 1);
        assert_eq!(track.life(), 2); // 2^1

        track.update_as_hit(&det(0.0, vec![1.0])).unwrap();
        assert_eq!(track.consecutive_hits(), 2);
        assert_eq!(track.life(), 2 + 4); // + 2^2
    }

    #[test]
    fn test_consecutive_hits_caps_at_three() {
        let cfg = TrackConfig {
            max_life: 1000,
            ..TrackConfig::default()
        };
        let mut track = Track::new(0, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0, 0.9, Feature::new(vec![1.0]).normalized().unwrap(), cfg);
        for _ in 0..10 {
            track.update_as_hit(&det(0.0, vec![1.0])).unwrap();
        }
        assert_eq!(track.consecutive_hits(), 3);
    }

    #[test]
    fn test_update_as_miss_resets_hits_and_decays_life() {
        let cfg = TrackConfig::default();
        let mut track = Track::new(0, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0, 0.9, Feature::new(vec![1.0]).normalized().unwrap(), cfg);
        track.update_as_hit(&det(0.0, vec![1.0])).unwrap();
        assert!(track.consecutive_hits() > 0);
        let removed = track.update_as_miss();
        assert_eq!(track.consecutive_hits(), 0);
        assert!(!removed);
        assert_eq!(track.life(), cfg.max_life - 1);
    }

    #[test]
    fn test_life_exhaustion_signals_removal() {
        let cfg = TrackConfig {
            max_life: 3,
            ..TrackConfig::default()
        };
        let mut track = Track::new(0, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0, 0.9, Feature::new(vec![1.0]).normalized().unwrap(), cfg);
        assert!(!track.update_as_miss());
        assert!(!track.update_as_miss());
        assert!(track.update_as_miss());
        assert_eq!(track.life(), 0);
    }

    #[test]
    fn test_is_healthy_permissive() {
        let cfg = TrackConfig {
            healthy_policy: HealthyPolicy::Permissive,
            ..TrackConfig::default()
        };
        let mut track = Track::new(0, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0, 0.9, Feature::new(vec![1.0]).normalized().unwrap(), cfg);
        assert!(track.is_healthy());
        track.life = 0;
        assert!(!track.is_healthy());
    }

    #[test]
    fn test_is_healthy_strict() {
        let cfg = TrackConfig {
            max_life: 10,
            healthy_percent: 0.5,
            healthy_policy: HealthyPolicy::Strict,
            ..TrackConfig::default()
        };
        let mut track = Track::new(0, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0, 0.9, Feature::new(vec![1.0]).normalized().unwrap(), cfg);
        track.life = 4;
        assert!(!track.is_healthy());
        track.life = 5;
        assert!(track.is_healthy());
    }

    #[test]
    fn test_update_as_hit_renormalizes_feature() {
        let cfg = TrackConfig::default();
        let mut track = Track::new(0, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0, 0.9, Feature::new(vec![1.0, 0.0]).normalized().unwrap(), cfg);
        track.update_as_hit(&det(0.0, vec![0.0, 1.0])).unwrap();
        assert!((track.feature().l2norm() - 1.0).abs() < 1e-4);
    }
}
