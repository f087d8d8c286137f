use std::path::Path;
use std::sync::Arc;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::detection_params::DetectionParameters;
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::pipeline::frame_pipeline::AnnotatedFrame;
use crate::shared::frame::Frame;
use crate::video::domain::image_reader::ImageReader;
use crate::video::domain::image_writer::ImageWriter;

/// Still-image detection: copy → grayscale → detect → annotate.
///
/// The caller's frame is never modified; the annotated result is a copy.
pub struct DetectImageUseCase {
    detector: Arc<dyn FaceDetector>,
    annotator: Arc<dyn FrameAnnotator>,
}

impl DetectImageUseCase {
    pub fn new(detector: Arc<dyn FaceDetector>, annotator: Arc<dyn FrameAnnotator>) -> Self {
        Self {
            detector,
            annotator,
        }
    }

    pub fn execute(
        &self,
        image: &Frame,
        params: &DetectionParameters,
    ) -> Result<AnnotatedFrame, DetectionError> {
        let mut frame = image.clone();
        let faces = self.detector.detect(&frame.to_luma(), params)?;
        self.annotator.annotate(&mut frame, &faces);
        log::debug!("Detected {} face(s) in {}x{} image", faces.len(), frame.width(), frame.height());
        Ok(AnnotatedFrame { frame, faces })
    }

    /// Reads `input`, detects, and writes the annotated image to `output`
    /// when one is given.
    pub fn execute_file(
        &self,
        reader: &dyn ImageReader,
        writer: &dyn ImageWriter,
        input: &Path,
        output: Option<&Path>,
        params: &DetectionParameters,
    ) -> Result<AnnotatedFrame, Box<dyn std::error::Error>> {
        let image = reader.read(input)?;
        let result = self.execute(&image, params)?;
        if let Some(path) = output {
            writer.write(path, &result.frame, None)?;
        }
        Ok(result)
    }
}
