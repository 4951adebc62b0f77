use crate::geometry::Point;

/// Axis-aligned person detection in output-frame pixel coordinates.
///
/// Boxes are produced fresh every frame; there is no identity or
/// tracking across frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    /// Detector confidence in [0, 1].
    pub confidence: f32,
}

impl BoundingBox {
    /// Corner order is normalized so `x1 <= x2` and `y1 <= y2` hold.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32, confidence: f32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
            confidence,
        }
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }
}
