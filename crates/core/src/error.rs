use thiserror::Error;

/// Unified error type for the tracking core.
///
/// Per-frame variants (`DimensionMismatch`, `ZeroVector`,
/// `DetectorFailure`, `ExtractorFailure`, `BadImage`) are recoverable:
/// the pipeline skips the affected frame and continues without
/// advancing `frame_index`. `ZeroWeights` and `ConfigInvalid` are
/// construction-time and always fatal.
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("feature dimension mismatch: {a} vs {b}")]
    DimensionMismatch { a: usize, b: usize },

    #[error("feature vector has near-zero norm")]
    ZeroVector,

    #[error("matcher weights sum to zero or less")]
    ZeroWeights,

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("detector failed: {0}")]
    DetectorFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("feature extractor failed: {0}")]
    ExtractorFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("frame is empty or malformed")]
    BadImage,

    #[error("frame source exhausted")]
    SourceExhausted,
}

pub type Result<T> = std::result::Result<T, TrackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let e = TrackError::DimensionMismatch { a: 4, b: 8 };
        assert_eq!(e.to_string(), "feature dimension mismatch: 4 vs 8");
    }

    #[test]
    fn test_config_invalid_message() {
        let e = TrackError::ConfigInvalid("roi x out of range".into());
        assert_eq!(e.to_string(), "invalid configuration: roi x out of range");
    }
}
