use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_reader::{ImageIoError, ImageReader};

/// Decodes JPEG, PNG and the other formats the `image` crate supports,
/// converting to RGB.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, ImageIoError> {
        let img = image::open(path).map_err(|source| ImageIoError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Frame::from_rgb_image(img.to_rgb8(), 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_read_png_dimensions_and_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "test.png", 100, 80);
        let frame = ImageFileReader::new().read(&path).unwrap();
        assert_eq!(frame.width(), 100);
        assert_eq!(frame.height(), 80);
        assert_eq!(&frame.data()[..3], &[50, 100, 200]);
    }

    #[test]
    fn test_read_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "test.jpg", 64, 48);
        let frame = ImageFileReader::new().read(&path).unwrap();
        assert_eq!((frame.width(), frame.height()), (64, 48));
    }

    #[test]
    fn test_read_nonexistent_is_error() {
        let result = ImageFileReader::new().read(Path::new("/nonexistent/test.png"));
        assert!(matches!(result, Err(ImageIoError::Read { .. })));
    }

    #[test]
    fn test_read_non_image_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(ImageFileReader::new().read(&path).is_err());
    }
}
