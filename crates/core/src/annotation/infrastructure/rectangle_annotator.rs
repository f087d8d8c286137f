use ndarray::s;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::shared::constants::{BOX_COLOR, BOX_THICKNESS};
use crate::shared::face_rect::FaceRect;
use crate::shared::frame::Frame;

/// Draws a hollow rectangle around each face.
///
/// The stroke lies inside the face rectangle and is clipped to the frame.
pub struct RectangleAnnotator {
    color: [u8; 3],
    thickness: u32,
}

impl RectangleAnnotator {
    pub fn new(color: [u8; 3], thickness: u32) -> Self {
        Self {
            color,
            thickness: thickness.max(1),
        }
    }
}

impl Default for RectangleAnnotator {
    fn default() -> Self {
        Self::new(BOX_COLOR, BOX_THICKNESS)
    }
}

impl FrameAnnotator for RectangleAnnotator {
    fn annotate(&self, frame: &mut Frame, faces: &[FaceRect]) {
        let fw = frame.width() as usize;
        let fh = frame.height() as usize;
        let mut pixels = frame.as_ndarray_mut();

        for face in faces {
            let x1 = (face.x as usize).min(fw);
            let y1 = (face.y as usize).min(fh);
            let x2 = (face.right() as usize).min(fw);
            let y2 = (face.bottom() as usize).min(fh);
            if x2 <= x1 || y2 <= y1 {
                continue;
            }
            let t = self.thickness as usize;

            // top, bottom, left, right bands
            let bands = [
                (y1, (y1 + t).min(y2), x1, x2),
                (y2.saturating_sub(t).max(y1), y2, x1, x2),
                (y1, y2, x1, (x1 + t).min(x2)),
                (y1, y2, x2.saturating_sub(t).max(x1), x2),
            ];
            for (r0, r1, c0, c1) in bands {
                let mut band = pixels.slice_mut(s![r0..r1, c0..c1, ..]);
                for mut px in band.lanes_mut(ndarray::Axis(2)) {
                    px[0] = self.color[0];
                    px[1] = self.color[1];
                    px[2] = self.color[2];
                }
            }
        }
    }
}
