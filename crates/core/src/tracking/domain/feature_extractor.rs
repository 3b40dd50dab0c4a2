use crate::shared::frame::Image;

/// Domain interface for the appearance-feature extractor (§6): maps an
/// image patch to a fixed-dimensional, model-determined float vector.
/// The caller treats the result as raw and normalizes it on store.
pub trait Extract: Send {
    fn extract(
        &mut self,
        patch: &Image,
    ) -> std::result::Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>>;
}
