use crate::tracking::domain::bounding_box::BoundingBox;
use crate::tracking::domain::feature::Feature;

/// Frames-since-first-seen sentinel meaning "consumed this ingest cycle,
/// ignore me in the confirmation step". Large enough that it can never
/// be reached by ordinary aging.
pub const CONSUMED_AGE: u32 = u32::MAX;

/// One detector output for one frame, carrying its appearance feature
/// and a buffering age while it sits in the pending-detection buffer.
#[derive(Clone, Debug)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_id: i32,
    pub score: f32,
    pub feature: Feature,
    pub age: u32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, class_id: i32, score: f32, feature: Feature) -> Self {
        Self {
            bbox,
            class_id,
            score,
            feature,
            age: 0,
        }
    }

    pub fn is_consumed(&self) -> bool {
        self.age == CONSUMED_AGE
    }

    pub fn mark_consumed(&mut self) {
        self.age = CONSUMED_AGE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_detection_starts_at_age_zero() {
        let d = Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0, 0.9, Feature::new(vec![1.0]));
        assert_eq!(d.age, 0);
        assert!(!d.is_consumed());
    }

    #[test]
    fn test_mark_consumed() {
        let mut d = Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0, 0.9, Feature::new(vec![1.0]));
        d.mark_consumed();
        assert!(d.is_consumed());
    }
}
