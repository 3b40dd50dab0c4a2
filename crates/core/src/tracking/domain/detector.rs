use crate::shared::frame::Image;
use crate::tracking::domain::bounding_box::BoundingBox;

/// One raw detector output: a box plus the class/score pair the
/// detector assigned it, in frame coordinates. `BoundingBox` itself
/// stays pure geometry (§4.1) so IoU/clip/crop math never has to care
/// about labels; this is the label-carrying wrapper the detector
/// boundary actually produces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionCandidate {
    pub bbox: BoundingBox,
    pub class_id: i32,
    pub score: f32,
}

impl DetectionCandidate {
    pub fn new(bbox: BoundingBox, class_id: i32, score: f32) -> Self {
        Self { bbox, class_id, score }
    }
}

/// Domain interface for the object detector (§6): maps an image to a
/// list of labeled boxes in frame coordinates. Implementations may be
/// stateful (e.g. an inference session), hence `&mut self`.
pub trait Detect: Send {
    fn detect(
        &mut self,
        image: &Image,
        frame_index: u64,
    ) -> std::result::Result<Vec<DetectionCandidate>, Box<dyn std::error::Error + Send + Sync>>;
}
