use std::path::{Path, PathBuf};

use crate::error::{Result, TrackError};
use crate::shared::frame::Image;
use crate::tracking::domain::frame_source::{FrameSource, FrameSourceInfo};

/// A finite [`FrameSource`] over a sorted directory of still images,
/// read through the `image` crate and converted to BGR.
///
/// Grounded on `video/infrastructure/image_file_reader.rs`'s
/// single-image adapter, generalized to a multi-file sequence — this is
/// the one dependency-light, concrete frame source the core ships for
/// testability and CLI demo purposes (§1: real decoders are external).
pub struct ImageDirSource {
    paths: Vec<PathBuf>,
    next_index: usize,
    sample_fps: f64,
    frame_step: u32,
}

impl ImageDirSource {
    /// Scans `dir` for files with a recognized image extension, sorted
    /// by filename, and reports them at `sample_fps` (purely
    /// informational — `info()`'s caller decides scheduling, §5).
    pub fn open(dir: &Path, sample_fps: f64) -> Result<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| TrackError::ConfigInvalid(format!("reading {}: {e}", dir.display())))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_image_path(path))
            .collect();
        paths.sort();

        Ok(Self {
            paths,
            next_index: 0,
            sample_fps,
            frame_step: 1,
        })
    }
}

fn is_image_path(path: &Path) -> bool {
    const EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "webp"];
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageDirSource {
    fn has_next(&self) -> bool {
        self.next_index < self.paths.len()
    }

    fn next(&mut self) -> Result<Option<Image>> {
        if !self.has_next() {
            return Ok(None);
        }
        let path = &self.paths[self.next_index];
        let index = self.next_index;
        self.next_index += 1;

        let dynamic = image::open(path)
            .map_err(|e| TrackError::ConfigInvalid(format!("decoding {}: {e}", path.display())))?;
        let rgb = dynamic.to_rgb8();
        let (width, height) = (rgb.width(), rgb.height());
        if width == 0 || height == 0 {
            return Err(TrackError::BadImage);
        }

        // Detector/extractor interfaces expect BGR (§6); `image` decodes RGB.
        let mut bgr = rgb.into_raw();
        for px in bgr.chunks_exact_mut(3) {
            px.swap(0, 2);
        }

        Ok(Some(Image::new(bgr, width, height, 3, index)))
    }

    fn info(&self) -> FrameSourceInfo {
        FrameSourceInfo {
            is_live: false,
            total_frames: self.paths.len() as i64,
            source_fps: self.sample_fps,
            sample_fps: self.sample_fps,
            frame_step: self.frame_step,
        }
    }
}
