use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_reader::ImageIoError;
use crate::video::domain::image_writer::ImageWriter;

/// Writes a single frame to an image file using the `image` crate.
///
/// The format follows the file extension; a path without one is written
/// as JPEG.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), ImageIoError> {
        let img = frame.to_rgb_image();
        let img = if let Some((w, h)) = size {
            image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle)
        } else {
            img
        };

        let result = if path.extension().is_some() {
            img.save(path)
        } else {
            img.save_with_format(path, image::ImageFormat::Jpeg)
        };
        result.map_err(|source| ImageIoError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}
