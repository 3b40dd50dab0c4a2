use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::tracking::domain::bounding_box::BoundingBox;

/// Normalized-coordinate region of interest, read from config.
///
/// `enabled = false` means the whole frame is in play; `(x, y, w, h)`
/// are fractions of frame width/height, per `spec.md` §4.7.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiRect {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_extent")]
    pub w: f32,
    #[serde(default = "default_extent")]
    pub h: f32,
}

fn default_extent() -> f32 {
    1.0
}

impl Default for RoiRect {
    fn default() -> Self {
        Self {
            enabled: false,
            x: 0.0,
            y: 0.0,
            w: 1.0,
            h: 1.0,
        }
    }
}

impl RoiRect {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.x)
            || !(0.0..=1.0).contains(&self.y)
            || self.w <= 0.0
            || self.h <= 0.0
            || self.x + self.w > 1.0 + 1e-5
            || self.y + self.h > 1.0 + 1e-5
        {
            return Err(TrackError::ConfigInvalid(format!(
                "roi rect out of [0,1] bounds: {self:?}"
            )));
        }
        Ok(())
    }
}

/// Converts a normalized [`RoiRect`] to pixel space and applies it at
/// the pipeline's two gate points: cropping before detection, and
/// filtering emitted objects by center point after.
#[derive(Clone, Copy, Debug)]
pub struct RoiGate {
    roi: RoiRect,
}

impl RoiGate {
    pub fn new(roi: RoiRect) -> Result<Self> {
        roi.validate()?;
        Ok(Self { roi })
    }

    pub fn enabled(&self) -> bool {
        self.roi.enabled
    }

    /// The ROI in pixel coordinates for a `frame_width`x`frame_height`
    /// frame, clipped to the frame. Returns the full-frame rect when
    /// disabled.
    pub fn pixel_rect(&self, frame_width: u32, frame_height: u32) -> BoundingBox {
        let fw = frame_width as f32;
        let fh = frame_height as f32;
        if !self.roi.enabled || frame_width == 0 || frame_height == 0 {
            return BoundingBox::new(0.0, 0.0, fw, fh);
        }
        let x = (self.roi.x * fw).round();
        let y = (self.roi.y * fh).round();
        let w = (self.roi.w * fw).round();
        let h = (self.roi.h * fh).round();
        BoundingBox::new(x, y, w, h).clip(fw, fh)
    }

    /// The center-point emission test: true when `bbox`'s center lies
    /// strictly inside the ROI, or when the gate is disabled. Boxes
    /// straddling the boundary are judged by their center, not area
    /// overlap, to avoid flicker at the edge.
    pub fn contains_center(&self, bbox: &BoundingBox, frame_width: u32, frame_height: u32) -> bool {
        if !self.roi.enabled {
            return true;
        }
        let rect = self.pixel_rect(frame_width, frame_height);
        let (cx, cy) = bbox.center();
        cx > rect.x && cx < rect.x + rect.w && cy > rect.y && cy < rect.y + rect.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_roi_is_noop() {
        let gate = RoiGate::new(RoiRect::default()).unwrap();
        assert!(!gate.enabled());
        let rect = gate.pixel_rect(640, 480);
        assert_eq!(rect, BoundingBox::new(0.0, 0.0, 640.0, 480.0));
        let b = BoundingBox::new(-100.0, -100.0, 10.0, 10.0);
        assert!(gate.contains_center(&b, 640, 480));
    }

    #[test]
    fn test_pixel_rect_conversion() {
        let roi = RoiRect {
            enabled: true,
            x: 0.5,
            y: 0.0,
            w: 0.5,
            h: 1.0,
        };
        let gate = RoiGate::new(roi).unwrap();
        let rect = gate.pixel_rect(640, 480);
        assert_eq!(rect, BoundingBox::new(320.0, 0.0, 320.0, 480.0));
    }

    #[test]
    fn test_center_at_boundary_is_excluded() {
        let roi = RoiRect {
            enabled: true,
            x: 0.5,
            y: 0.0,
            w: 0.5,
            h: 1.0,
        };
        let gate = RoiGate::new(roi).unwrap();
        // center exactly on the left boundary of the ROI (x=320)
        let on_boundary = BoundingBox::new(310.0, 200.0, 20.0, 20.0);
        assert!(!gate.contains_center(&on_boundary, 640, 480));

        let strictly_inside = BoundingBox::new(330.0, 200.0, 20.0, 20.0);
        assert!(gate.contains_center(&strictly_inside, 640, 480));
    }

    #[test]
    fn test_center_outside_roi_is_excluded() {
        let roi = RoiRect {
            enabled: true,
            x: 0.5,
            y: 0.0,
            w: 0.5,
            h: 1.0,
        };
        let gate = RoiGate::new(roi).unwrap();
        let outside = BoundingBox::new(0.0, 0.0, 20.0, 20.0);
        assert!(!gate.contains_center(&outside, 640, 480));
    }

    #[test]
    fn test_invalid_roi_fails_construction() {
        let roi = RoiRect {
            enabled: true,
            x: 0.8,
            y: 0.0,
            w: 0.5,
            h: 1.0,
        };
        assert!(matches!(RoiGate::new(roi), Err(TrackError::ConfigInvalid(_))));
    }

    #[test]
    fn test_zero_extent_fails_construction() {
        let roi = RoiRect {
            enabled: true,
            w: 0.0,
            ..RoiRect::default()
        };
        assert!(matches!(RoiGate::new(roi), Err(TrackError::ConfigInvalid(_))));
    }
}
