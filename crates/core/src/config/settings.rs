use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::tracking::domain::associator::Associator;
use crate::tracking::domain::roi_gate::{RoiGate, RoiRect};
use crate::tracking::domain::track::TrackConfig;

/// Detector settings (§6 `detector` group). The detector itself is an
/// external collaborator (§1); these are the knobs an adapter reads at
/// construction and the pipeline applies as a generic post-filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectorConfig {
    #[serde(default = "default_input_extent")]
    pub input_width: u32,
    #[serde(default = "default_input_extent")]
    pub input_height: u32,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    #[serde(default = "default_nms_threshold")]
    pub nms_threshold: f32,
    #[serde(default)]
    pub focus_class_ids: Vec<i32>,
    #[serde(default)]
    pub filter_edge_boxes: bool,
}

fn default_input_extent() -> u32 {
    640
}

fn default_score_threshold() -> f32 {
    0.5
}

fn default_nms_threshold() -> f32 {
    0.45
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            input_width: default_input_extent(),
            input_height: default_input_extent(),
            score_threshold: default_score_threshold(),
            nms_threshold: default_nms_threshold(),
            focus_class_ids: Vec::new(),
            filter_edge_boxes: false,
        }
    }
}

impl DetectorConfig {
    fn validate(&self) -> Result<()> {
        if self.input_width == 0 || self.input_height == 0 {
            return Err(TrackError::ConfigInvalid(
                "detector input dimensions must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(TrackError::ConfigInvalid(
                "detector score_threshold must be in [0,1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.nms_threshold) {
            return Err(TrackError::ConfigInvalid(
                "detector nms_threshold must be in [0,1]".into(),
            ));
        }
        Ok(())
    }
}

/// Feature-extractor settings (§6 `extractor` group).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ExtractorConfig {
    #[serde(default = "default_extractor_extent")]
    pub input_width: u32,
    #[serde(default = "default_extractor_extent")]
    pub input_height: u32,
}

fn default_extractor_extent() -> u32 {
    128
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            input_width: default_extractor_extent(),
            input_height: default_extractor_extent(),
        }
    }
}

impl ExtractorConfig {
    fn validate(&self) -> Result<()> {
        if self.input_width == 0 || self.input_height == 0 {
            return Err(TrackError::ConfigInvalid(
                "extractor input dimensions must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Associator weights/threshold (§6 `matcher` group).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MatcherConfig {
    #[serde(default = "default_matcher_weight")]
    pub iou_weight: f32,
    #[serde(default = "default_matcher_weight")]
    pub feature_weight: f32,
    #[serde(default = "default_matcher_threshold")]
    pub threshold: f32,
}

fn default_matcher_weight() -> f32 {
    0.5
}

fn default_matcher_threshold() -> f32 {
    0.3
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            iou_weight: default_matcher_weight(),
            feature_weight: default_matcher_weight(),
            threshold: default_matcher_threshold(),
        }
    }
}

impl MatcherConfig {
    pub fn build(&self) -> Result<Associator> {
        Associator::new(self.iou_weight, self.feature_weight, self.threshold)
    }
}

/// `engine.tracker_mgr` group: matcher weights plus per-track life/hit
/// tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct TrackerMgrConfig {
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub tracker: TrackConfig,
}

/// Placeholder for the CSV-statistics-recorder settings group. Recording
/// itself is an out-of-scope consumer (§1); this struct exists purely
/// so the persisted document's top-level groups match §6 and round-trip
/// losslessly even though the core interprets none of its fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RecorderConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// Placeholder for the overlay-rendering settings group (§1: out of
/// scope). Present for the same round-trip reason as [`RecorderConfig`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VisualizerConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// `engine` group: every setting the tracking core itself consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub tracker_mgr: TrackerMgrConfig,
    #[serde(default)]
    pub roi: RoiRect,
}

impl EngineConfig {
    /// Validates every construction-time invariant from §7
    /// (`ConfigInvalid`, `ZeroWeights`) without yet building the
    /// runtime objects — useful for a config-file `validate` subcommand.
    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        self.extractor.validate()?;
        self.tracker_mgr.matcher.build()?;
        RoiGate::new(self.roi)?;
        Ok(())
    }

    pub fn build_associator(&self) -> Result<Associator> {
        self.tracker_mgr.matcher.build()
    }

    pub fn build_roi_gate(&self) -> Result<RoiGate> {
        RoiGate::new(self.roi)
    }

    pub fn track_config(&self) -> TrackConfig {
        self.tracker_mgr.tracker
    }
}

/// The full persisted document (§6): `engine.{detector,extractor,
/// tracker_mgr.{matcher,tracker},roi}` plus the out-of-scope
/// `recorder`/`visualizer` groups, round-tripped through YAML.
///
/// Grounded on `desktop/src/settings.rs`'s `Settings::load`/`save`,
/// adapted from JSON to the hierarchical YAML layout §6 specifies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PersistedConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub visualizer: VisualizerConfig,
}

impl PersistedConfig {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("mot-core").join("config.yaml"))
    }

    /// Loads from the platform config directory, falling back to
    /// defaults when no file exists or it fails to parse.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|yaml| serde_yaml::from_str(&yaml).ok())
            .unwrap_or_default()
    }

    /// Saves to the platform config directory, creating parent
    /// directories as needed. Failures are swallowed, matching the
    /// teacher's best-effort `Settings::save`.
    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Ok(yaml) = serde_yaml::to_string(self) {
                let _ = fs::write(path, yaml);
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| TrackError::ConfigInvalid(format!("reading {}: {e}", path.display())))?;
        serde_yaml::from_str(&text)
            .map_err(|e| TrackError::ConfigInvalid(format!("parsing {}: {e}", path.display())))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| TrackError::ConfigInvalid(format!("serializing config: {e}")))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| TrackError::ConfigInvalid(format!("creating {}: {e}", parent.display())))?;
        }
        fs::write(path, yaml)
            .map_err(|e| TrackError::ConfigInvalid(format!("writing {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_yaml() {
        let cfg = PersistedConfig::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let reloaded: PersistedConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(cfg, reloaded);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let yaml = "engine:\n  detector:\n    score_threshold: 0.7\n";
        let cfg: PersistedConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.engine.detector.score_threshold, 0.7);
        assert_eq!(cfg.engine.detector.input_width, default_input_extent());
        assert_eq!(cfg.engine.tracker_mgr.tracker.max_life, 30);
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let cfg: PersistedConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, PersistedConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut cfg = PersistedConfig::default();
        cfg.engine.roi.enabled = true;
        cfg.engine.roi.w = 0.5;
        cfg.save_to(&path).unwrap();

        let loaded = PersistedConfig::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_engine_config_validate_rejects_bad_roi() {
        let mut engine = EngineConfig::default();
        engine.roi.enabled = true;
        engine.roi.x = 0.9;
        engine.roi.w = 0.5;
        assert!(matches!(engine.validate(), Err(TrackError::ConfigInvalid(_))));
    }

    #[test]
    fn test_engine_config_validate_rejects_zero_weights() {
        let mut engine = EngineConfig::default();
        engine.tracker_mgr.matcher.iou_weight = 0.0;
        engine.tracker_mgr.matcher.feature_weight = 0.0;
        assert!(matches!(engine.validate(), Err(TrackError::ZeroWeights)));
    }

    #[test]
    fn test_engine_config_validate_rejects_zero_input_dims() {
        let mut engine = EngineConfig::default();
        engine.detector.input_width = 0;
        assert!(matches!(engine.validate(), Err(TrackError::ConfigInvalid(_))));
    }

    #[test]
    fn test_engine_config_validate_accepts_defaults() {
        assert!(EngineConfig::default().validate().is_ok());
    }
}
