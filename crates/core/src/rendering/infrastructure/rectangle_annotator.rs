use crate::rendering::domain::frame_annotator::FrameAnnotator;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{DEFAULT_BOX_COLOR, DEFAULT_BOX_THICKNESS};
use crate::shared::frame::Frame;

/// Draws solid box outlines, `thickness` pixels wide, inside each box.
///
/// Outlines are clipped to the frame; boxes entirely outside it are
/// skipped.
pub struct RectangleAnnotator {
    color: [u8; 3],
    thickness: u32,
}

impl RectangleAnnotator {
    pub fn new(color: [u8; 3], thickness: u32) -> Result<Self, &'static str> {
        if thickness == 0 {
            return Err("thickness must be >= 1");
        }
        Ok(Self { color, thickness })
    }

    fn draw(&self, frame: &mut Frame, bbox: &BoundingBox) {
        let Some(clipped) = bbox.clip(frame.width(), frame.height()) else {
            return;
        };
        let fw = frame.width() as usize;
        let t = self.thickness as i32;
        let data = frame.data_mut();

        for y in clipped.top()..clipped.bottom() {
            let horizontal_edge = y < bbox.top() + t || y >= bbox.bottom() - t;
            for x in clipped.left()..clipped.right() {
                let vertical_edge = x < bbox.left() + t || x >= bbox.right() - t;
                if horizontal_edge || vertical_edge {
                    let offset = (y as usize * fw + x as usize) * 3;
                    data[offset..offset + 3].copy_from_slice(&self.color);
                }
            }
        }
    }
}

impl Default for RectangleAnnotator {
    fn default() -> Self {
        Self {
            color: DEFAULT_BOX_COLOR,
            thickness: DEFAULT_BOX_THICKNESS,
        }
    }
}

impl FrameAnnotator for RectangleAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        boxes: &[BoundingBox],
    ) -> Result<(), Box<dyn std::error::Error>> {
        frame.validate_rgb()?;
        for bbox in boxes {
            self.draw(frame, bbox);
        }
        Ok(())
    }
}
