use std::sync::Once;

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::shared::video_source::VideoSource;
use crate::video::domain::video_reader::{CaptureError, VideoReader};

static INIT: Once = Once::new();

/// Reads frames from a local capture device via `nokhwa`.
///
/// Requests the highest frame rate the device offers and decodes every
/// buffer to RGB.
pub struct CameraReader {
    camera: Option<Camera>,
    frame_index: usize,
}

// Safety: the camera handle is opened on the caller's thread and then
// used exclusively by the single pipeline worker it is moved into.
unsafe impl Send for CameraReader {}

impl CameraReader {
    pub fn new() -> Self {
        Self {
            camera: None,
            frame_index: 0,
        }
    }
}

impl Default for CameraReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for CameraReader {
    fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, CaptureError> {
        self.close();
        let open_err = |reason: String| CaptureError::Open {
            target: source.to_string(),
            reason,
        };
        let VideoSource::Device(index) = source else {
            return Err(open_err("not a capture device".to_string()));
        };

        INIT.call_once(|| {
            nokhwa::nokhwa_initialize(|granted| {
                log::debug!("Camera access granted: {granted}");
            });
        });

        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(*index), requested)
            .map_err(|e| open_err(e.to_string()))?;
        camera.open_stream().map_err(|e| open_err(e.to_string()))?;

        let resolution = camera.resolution();
        let metadata = VideoMetadata {
            width: resolution.width(),
            height: resolution.height(),
            fps: camera.frame_rate() as f64,
            source: source.to_string(),
        };
        log::info!(
            "Opened {} at {}x{} @ {} fps",
            metadata.source,
            metadata.width,
            metadata.height,
            metadata.fps
        );

        self.camera = Some(camera);
        Ok(metadata)
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let camera = self.camera.as_mut().ok_or(CaptureError::NotOpen)?;
        let buffer = camera
            .frame()
            .map_err(|e| CaptureError::Read(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::Read(e.to_string()))?;

        let (width, height) = decoded.dimensions();
        let frame = Frame::new(decoded.into_raw(), width, height, self.frame_index);
        self.frame_index += 1;
        Ok(frame)
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("Failed to stop camera stream: {e}");
            }
        }
    }
}

impl Drop for CameraReader {
    fn drop(&mut self) {
        self.close();
    }
}
