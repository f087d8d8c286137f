use std::fmt;
use std::path::PathBuf;

/// Where a video session reads frames from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoSource {
    /// Capture device by index (0 is the default camera).
    Device(u32),
    File(PathBuf),
}

impl VideoSource {
    /// Interprets the source selector: a string that parses cleanly as a
    /// non-negative integer is a device index, anything else a file path.
    pub fn parse(selector: &str) -> Self {
        let trimmed = selector.trim();
        match trimmed.parse::<u32>() {
            Ok(index) => VideoSource::Device(index),
            Err(_) => VideoSource::File(PathBuf::from(trimmed)),
        }
    }
}

impl fmt::Display for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoSource::Device(index) => write!(f, "camera {index}"),
            VideoSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", VideoSource::Device(0))]
    #[case("2", VideoSource::Device(2))]
    #[case(" 1 ", VideoSource::Device(1))]
    #[case("clip.mp4", VideoSource::File(PathBuf::from("clip.mp4")))]
    #[case("-1", VideoSource::File(PathBuf::from("-1")))]
    #[case("1.5", VideoSource::File(PathBuf::from("1.5")))]
    #[case("/videos/0", VideoSource::File(PathBuf::from("/videos/0")))]
    fn test_parse(#[case] selector: &str, #[case] expected: VideoSource) {
        assert_eq!(VideoSource::parse(selector), expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(VideoSource::Device(3).to_string(), "camera 3");
        assert_eq!(
            VideoSource::File(PathBuf::from("a/b.mp4")).to_string(),
            "a/b.mp4"
        );
    }
}
