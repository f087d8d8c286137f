use crate::shared::video_source::VideoSource;
use crate::video::domain::video_reader::VideoReader;

use super::camera_reader::CameraReader;
use super::ffmpeg_reader::FfmpegReader;

/// Picks the reader implementation that can open `source`.
pub fn reader_for(source: &VideoSource) -> Box<dyn VideoReader> {
    match source {
        VideoSource::Device(_) => Box::new(CameraReader::new()),
        VideoSource::File(_) => Box::new(FfmpegReader::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::domain::video_reader::CaptureError;
    use std::path::PathBuf;

    #[test]
    fn test_missing_file_reader_fails_to_open() {
        let source = VideoSource::File(PathBuf::from("/nonexistent/clip.mp4"));
        let mut reader = reader_for(&source);
        assert!(matches!(reader.open(&source), Err(CaptureError::Open { .. })));
    }
}
