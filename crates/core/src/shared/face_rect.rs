/// An axis-aligned face bounding box in frame pixel coordinates
/// (top-left origin).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rectangle from signed detector output, clipped to a
    /// `frame_width` x `frame_height` frame. Returns `None` when nothing of
    /// the box lies inside the frame.
    pub fn clipped(
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Self> {
        let x1 = (x as i64).max(0);
        let y1 = (y as i64).max(0);
        let x2 = (x as i64 + width as i64).min(frame_width as i64);
        let y2 = (y as i64 + height as i64).min(frame_height as i64);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self::new(
            x1 as u32,
            y1 as u32,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
        ))
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for FaceRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}) {}x{}", self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_edges_and_area() {
        let r = FaceRect::new(10, 20, 30, 40);
        assert_eq!(r.right(), 40);
        assert_eq!(r.bottom(), 60);
        assert_eq!(r.area(), 1200);
    }

    #[test]
    fn test_clipped_inside_frame_is_unchanged() {
        let r = FaceRect::clipped(10, 10, 50, 50, 100, 100).unwrap();
        assert_eq!(r, FaceRect::new(10, 10, 50, 50));
    }

    #[rstest]
    #[case::left_edge(-20, 10, 50, 50, FaceRect::new(0, 10, 30, 50))]
    #[case::top_edge(10, -5, 50, 50, FaceRect::new(10, 0, 50, 45))]
    #[case::bottom_right(80, 90, 50, 50, FaceRect::new(80, 90, 20, 10))]
    fn test_clipped_at_frame_edges(
        #[case] x: i32,
        #[case] y: i32,
        #[case] w: u32,
        #[case] h: u32,
        #[case] expected: FaceRect,
    ) {
        assert_eq!(FaceRect::clipped(x, y, w, h, 100, 100), Some(expected));
    }

    #[rstest]
    #[case::fully_left(-60, 10, 50, 50)]
    #[case::fully_below(10, 100, 50, 50)]
    #[case::zero_width(10, 10, 0, 50)]
    fn test_clipped_outside_frame_is_none(
        #[case] x: i32,
        #[case] y: i32,
        #[case] w: u32,
        #[case] h: u32,
    ) {
        assert_eq!(FaceRect::clipped(x, y, w, h, 100, 100), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(FaceRect::new(1, 2, 3, 4).to_string(), "(1, 2) 3x4");
    }
}
