use iced::widget::image::Handle;
use image::imageops::FilterType;
use image::DynamicImage;

use facefinder_core::shared::constants::MAX_DISPLAY_SIZE;
use facefinder_core::shared::frame::Frame;

/// Largest size with the same aspect ratio that fits in `max`×`max`.
/// Smaller images are left as they are.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max {
        return (width, height);
    }
    let scale = max as f64 / longest as f64;
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    (w, h)
}

/// Converts a frame into an image handle scaled for display.
pub fn frame_handle(frame: &Frame) -> Handle {
    let (w, h) = fit_within(frame.width(), frame.height(), MAX_DISPLAY_SIZE);
    let mut rgb = frame.to_rgb_image();
    if (w, h) != rgb.dimensions() {
        rgb = image::imageops::resize(&rgb, w, h, FilterType::Triangle);
    }
    let rgba = DynamicImage::ImageRgb8(rgb).into_rgba8();
    Handle::from_rgba(w, h, rgba.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_image_keeps_size() {
        assert_eq!(fit_within(320, 240, 600), (320, 240));
        assert_eq!(fit_within(600, 600, 600), (600, 600));
    }

    #[test]
    fn test_landscape_is_bounded_by_width() {
        assert_eq!(fit_within(1920, 1080, 600), (600, 338));
    }

    #[test]
    fn test_portrait_is_bounded_by_height() {
        assert_eq!(fit_within(1000, 2000, 600), (300, 600));
    }

    #[test]
    fn test_extreme_aspect_never_collapses() {
        assert_eq!(fit_within(10_000, 2, 600), (600, 1));
    }
}
