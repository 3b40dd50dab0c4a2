use crate::error::Result;
use crate::shared::frame::Image;

/// Declared sampling characteristics of a [`FrameSource`], read once at
/// pipeline construction to drive caller-side scheduling (§5: the core
/// itself has no timers).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSourceInfo {
    pub is_live: bool,
    /// `-1` for live sources with no known length.
    pub total_frames: i64,
    pub source_fps: f64,
    pub sample_fps: f64,
    pub frame_step: u32,
}

/// Abstracts decoding so the pipeline can process any media source
/// (file, camera) without depending on a specific codec or capture
/// library. Implementations may block on I/O; the pipeline inherits
/// that blocking behavior (§5).
pub trait FrameSource: Send {
    fn has_next(&self) -> bool;

    /// Pulls the next frame. `Ok(None)` signals end-of-stream; a
    /// malformed frame is reported as `Err(TrackError::BadImage)` and
    /// the pipeline skips it without advancing `frame_index`.
    fn next(&mut self) -> Result<Option<Image>>;

    fn info(&self) -> FrameSourceInfo;
}
