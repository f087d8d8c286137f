use std::io::Read;
use std::path::Path;

use image::GrayImage;

use crate::detection::domain::detection_params::DetectionParameters;
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::shared::face_rect::FaceRect;

/// Smallest face size the SeetaFace detector accepts.
pub const MIN_SUPPORTED_FACE_SIZE: u32 = 20;

/// Score threshold contributed by each unit of `min_neighbors`.
/// The default of 5 lands on the detector's customary threshold of 2.0.
const SCORE_PER_NEIGHBOR: f64 = 0.4;

/// rustface rejects a threshold of zero; `min_neighbors = 0` maps here.
const MIN_SCORE_THRESH: f64 = 0.1;

/// Pyramid step range rustface accepts.
const PYRAMID_SCALE_RANGE: (f32, f32) = (0.01, 0.99);

const SLIDE_WINDOW_STEP: u32 = 4;

/// SeetaFace funnel-cascade detector (via `rustface`) behind the
/// [`FaceDetector`] interface.
///
/// The parsed model is kept once; every call builds a fresh detector from a
/// clone of it so one instance can serve several threads.
pub struct RustfaceDetector {
    model: rustface::Model,
}

/// Detector settings derived from [`DetectionParameters`].
#[derive(Debug, Clone, Copy, PartialEq)]
struct SeetaSettings {
    pyramid_scale: f32,
    min_face_size: u32,
    score_thresh: f64,
}

impl SeetaSettings {
    fn from_params(params: &DetectionParameters) -> Result<Self, DetectionError> {
        if !params.is_valid() {
            return Err(DetectionError::InvalidParameters(params.scale_factor));
        }
        Ok(Self {
            pyramid_scale: ((1.0 / params.scale_factor) as f32)
                .clamp(PYRAMID_SCALE_RANGE.0, PYRAMID_SCALE_RANGE.1),
            min_face_size: params.min_size.max(MIN_SUPPORTED_FACE_SIZE),
            score_thresh: (params.min_neighbors as f64 * SCORE_PER_NEIGHBOR).max(MIN_SCORE_THRESH),
        })
    }
}

impl RustfaceDetector {
    pub fn from_path(path: &Path) -> Result<Self, DetectionError> {
        let file = std::fs::File::open(path).map_err(|source| DetectionError::ModelLoad {
            path: path.display().to_string(),
            source,
        })?;
        let model = rustface::read_model(std::io::BufReader::new(file)).map_err(|source| {
            DetectionError::ModelLoad {
                path: path.display().to_string(),
                source,
            }
        })?;
        log::info!("Loaded face detection model from {}", path.display());
        Ok(Self { model })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DetectionError> {
        let model = rustface::read_model(reader).map_err(|source| DetectionError::ModelLoad {
            path: "<reader>".to_string(),
            source,
        })?;
        Ok(Self { model })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(
        &self,
        image: &GrayImage,
        params: &DetectionParameters,
    ) -> Result<Vec<FaceRect>, DetectionError> {
        let settings = SeetaSettings::from_params(params)?;
        let (width, height) = image.dimensions();
        if width.min(height) < settings.min_face_size {
            return Ok(Vec::new());
        }

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(settings.min_face_size);
        detector.set_score_thresh(settings.score_thresh);
        detector.set_pyramid_scale_factor(settings.pyramid_scale);
        detector.set_slide_window_step(SLIDE_WINDOW_STEP, SLIDE_WINDOW_STEP);

        let faces = detector.detect(&rustface::ImageData::new(image.as_raw(), width, height));
        log::debug!("rustface returned {} candidate(s)", faces.len());

        Ok(faces
            .iter()
            .filter_map(|face| {
                let bbox = face.bbox();
                FaceRect::clipped(bbox.x(), bbox.y(), bbox.width(), bbox.height(), width, height)
            })
            .collect())
    }
}
