#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// 0.0 when the source does not report a rate.
    pub fps: f64,
    pub source: String,
}
