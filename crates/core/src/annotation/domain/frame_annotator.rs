use crate::shared::face_rect::FaceRect;
use crate::shared::frame::Frame;

/// Draws detection results onto a frame.
///
/// Implementations modify the frame in place; callers that need the
/// original pixels annotate a copy.
pub trait FrameAnnotator: Send + Sync {
    fn annotate(&self, frame: &mut Frame, faces: &[FaceRect]);
}
