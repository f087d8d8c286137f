use std::time::Duration;

pub const SEETA_MODEL_NAME: &str = "seeta_fd_frontal_v1.0.bin";
pub const SEETA_MODEL_URL: &str =
    "https://github.com/atomashpolskiy/rustface/raw/master/model/seeta_fd_frontal_v1.0.bin";

pub const DEFAULT_SCALE_FACTOR: f64 = 1.1;
pub const DEFAULT_MIN_NEIGHBORS: u32 = 5;
pub const DEFAULT_MIN_SIZE: u32 = 30;

/// Settings file, resolved against the working directory.
pub const SETTINGS_FILE_NAME: &str = "face_detection_settings.json";

/// Pause between pipeline iterations (~30 fps cap).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Hand-off queue depth. Only the newest frame matters to the display.
pub const HANDOFF_CAPACITY: usize = 2;

/// Longest edge of an image or frame as shown in the UI.
pub const MAX_DISPLAY_SIZE: u32 = 600;

/// Annotation box colour (RGB) and stroke width in pixels.
pub const BOX_COLOR: [u8; 3] = [0, 0, 255];
pub const BOX_THICKNESS: u32 = 2;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];
