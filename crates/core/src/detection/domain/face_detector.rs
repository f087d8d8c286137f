use image::GrayImage;
use thiserror::Error;

use crate::detection::domain::detection_params::DetectionParameters;
use crate::shared::face_rect::FaceRect;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("invalid detection parameters: scale factor must be greater than 1.0 (got {0})")]
    InvalidParameters(f64),
    #[error("failed to load detector model from {path}: {source}")]
    ModelLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Domain interface for face detection on a luminance image.
///
/// Implementations are stateless from the caller's side and shared
/// between the UI thread and the pipeline worker, hence `&self` and `Sync`.
/// Finding no faces is an empty `Vec`, never an error.
pub trait FaceDetector: Send + Sync {
    fn detect(
        &self,
        image: &GrayImage,
        params: &DetectionParameters,
    ) -> Result<Vec<FaceRect>, DetectionError>;
}
