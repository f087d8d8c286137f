use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::shared::video_source::VideoSource;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("could not open {target}: {reason}")]
    Open { target: String, reason: String },
    #[error("reader is not open")]
    NotOpen,
    #[error("end of stream")]
    EndOfStream,
    #[error("failed to read frame: {0}")]
    Read(String),
}

/// Pulls frames one at a time from a camera or a video file.
///
/// A reader can be reopened after `close` or after a failed read; the
/// pipeline relies on this to retry a stalled source once.
pub trait VideoReader: Send {
    /// Opens the source and returns its metadata.
    fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, CaptureError>;

    /// Blocks until the next frame is available.
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Releases the capture handle. Safe to call more than once.
    fn close(&mut self);
}
