/// An axis-aligned rectangle in pixel coordinates.
///
/// Stored as top-left corner plus width/height rather than two corners,
/// matching the convention the detector and feature extractor interfaces
/// use at the crate boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> f32 {
        (self.w.max(0.0)) * (self.h.max(0.0))
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Bottom-midpoint of the box: the anchor the motion filter tracks.
    pub fn bottom_mid(&self) -> (f32, f32) {
        (self.x + self.w * 0.5, self.y + self.h)
    }

    fn intersection_area(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.w).min(other.x + other.w);
        let iy2 = (self.y + self.h).min(other.y + other.h);
        (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0)
    }

    /// Intersection over union. Zero when boxes don't overlap.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union <= f32::EPSILON {
            0.0
        } else {
            inter / (union + 1e-6)
        }
    }

    /// Intersection over the smaller box's area. Useful when one box is
    /// expected to be fully contained in the other (e.g. a crop region).
    pub fn io_min(&self, other: &BoundingBox) -> f32 {
        let inter = self.intersection_area(other);
        let min_area = self.area().min(other.area());
        if min_area <= f32::EPSILON {
            0.0
        } else {
            inter / (min_area + 1e-6)
        }
    }

    /// Clips this box to lie within a `width`x`height` frame.
    pub fn clip(&self, width: f32, height: f32) -> BoundingBox {
        let x1 = self.x.clamp(0.0, width);
        let y1 = self.y.clamp(0.0, height);
        let x2 = (self.x + self.w).clamp(0.0, width);
        let y2 = (self.y + self.h).clamp(0.0, height);
        BoundingBox::new(x1, y1, (x2 - x1).max(0.0), (y2 - y1).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_iou_perfect_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_relative_eq!(a.iou(&a), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[rstest]
    #[case::half_overlap(0.0, 0.0, 10.0, 10.0, 5.0, 0.0, 10.0, 10.0, 1.0 / 3.0)]
    #[case::quarter_overlap(0.0, 0.0, 10.0, 10.0, 5.0, 5.0, 10.0, 10.0, 25.0 / 175.0)]
    fn test_iou_partial_overlap(
        #[case] ax: f32,
        #[case] ay: f32,
        #[case] aw: f32,
        #[case] ah: f32,
        #[case] bx: f32,
        #[case] by: f32,
        #[case] bw: f32,
        #[case] bh: f32,
        #[case] expected: f32,
    ) {
        let a = BoundingBox::new(ax, ay, aw, ah);
        let b = BoundingBox::new(bx, by, bw, bh);
        assert_relative_eq!(a.iou(&b), expected, epsilon = 1e-3);
    }

    #[test]
    fn test_center_and_bottom_mid() {
        let b = BoundingBox::new(10.0, 20.0, 4.0, 8.0);
        assert_eq!(b.center(), (12.0, 24.0));
        assert_eq!(b.bottom_mid(), (12.0, 28.0));
    }

    #[test]
    fn test_clip_within_frame_is_unchanged() {
        let b = BoundingBox::new(1.0, 1.0, 2.0, 2.0);
        let clipped = b.clip(100.0, 100.0);
        assert_eq!(clipped, b);
    }

    #[test]
    fn test_clip_truncates_overhang() {
        let b = BoundingBox::new(95.0, 95.0, 20.0, 20.0);
        let clipped = b.clip(100.0, 100.0);
        assert_eq!(clipped, BoundingBox::new(95.0, 95.0, 5.0, 5.0));
    }

    #[test]
    fn test_clip_fully_outside_yields_zero_area() {
        let b = BoundingBox::new(200.0, 200.0, 10.0, 10.0);
        let clipped = b.clip(100.0, 100.0);
        assert_eq!(clipped.area(), 0.0);
    }

    #[test]
    fn test_io_min_fully_contained() {
        let outer = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let inner = BoundingBox::new(10.0, 10.0, 5.0, 5.0);
        assert_relative_eq!(outer.io_min(&inner), 1.0, epsilon = 1e-4);
    }
}
