use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for drawing tracked vehicles onto a frame.
///
/// Implementations draw in place; callers pass a copy when the source
/// frame must stay untouched.
pub trait FrameAnnotator: Send {
    fn annotate(&self, frame: &mut Frame, boxes: &[BoundingBox])
        -> Result<(), Box<dyn std::error::Error>>;
}
