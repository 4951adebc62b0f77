//! Zone geometry.
//!
//! A `Zone` is the operator-drawn polygon marking the restricted area.
//! Vertex order is significant (it defines the edges); there is no
//! convexity requirement. A polygon with fewer than three vertices is
//! treated as absent: nothing is ever inside it.

/// Integer pixel coordinate in the output frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Ordered polygon vertices. Replaced wholesale on reconfiguration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Zone {
    vertices: Vec<Point>,
}

impl Zone {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// A zone needs at least three vertices to enclose anything.
    pub fn is_active(&self) -> bool {
        self.vertices.len() >= 3
    }

    pub fn contains(&self, point: Point) -> bool {
        point_in_polygon(point, &self.vertices)
    }
}

/// Ray-casting containment test. Boundary points count as inside.
///
/// Returns false unconditionally for degenerate polygons (fewer than
/// three vertices).
pub fn point_in_polygon(point: Point, vertices: &[Point]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let n = vertices.len();
    for i in 0..n {
        if on_segment(point, vertices[i], vertices[(i + 1) % n]) {
            return true;
        }
    }

    // Even-odd rule: count edge crossings of a ray cast in +x.
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (vertices[i], vertices[j]);
        if (a.y > point.y) != (b.y > point.y) {
            // Widen before subtracting: vertices span the full i32 range.
            let dy = (b.y as i64 - a.y as i64) as f64;
            let dx = (b.x as i64 - a.x as i64) as f64;
            let cross_x = a.x as f64 + (point.y as i64 - a.y as i64) as f64 * dx / dy;
            if (point.x as f64) < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(p: Point, a: Point, b: Point) -> bool {
    let cross = (b.x as i64 - a.x as i64) * (p.y as i64 - a.y as i64)
        - (b.y as i64 - a.y as i64) * (p.x as i64 - a.x as i64);
    if cross != 0 {
        return false;
    }
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Zone {
        Zone::new(vec![
            Point::new(0, 0),
            Point::new(0, 10),
            Point::new(10, 10),
            Point::new(10, 0),
        ])
    }

    #[test]
    fn degenerate_polygons_contain_nothing() {
        let candidates = [Point::new(0, 0), Point::new(5, 5), Point::new(-3, 7)];
        for point in candidates {
            assert!(!point_in_polygon(point, &[]));
            assert!(!point_in_polygon(point, &[Point::new(0, 0)]));
            assert!(!point_in_polygon(
                point,
                &[Point::new(0, 0), Point::new(10, 10)]
            ));
        }
        assert!(!Zone::default().is_active());
    }

    #[test]
    fn centroid_is_inside_convex_polygon() {
        assert!(square().contains(Point::new(5, 5)));
    }

    #[test]
    fn far_point_is_outside() {
        assert!(!square().contains(Point::new(100, 100)));
        assert!(!square().contains(Point::new(-20, 5)));
    }

    #[test]
    fn boundary_counts_as_inside() {
        let zone = square();
        assert!(zone.contains(Point::new(0, 5)));
        assert!(zone.contains(Point::new(10, 10)));
        assert!(zone.contains(Point::new(5, 0)));
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        // Operators can submit vertices anywhere in the i32 range.
        let zone = Zone::new(vec![
            Point::new(i32::MIN, 0),
            Point::new(i32::MAX, 0),
            Point::new(0, i32::MAX),
        ]);
        assert!(zone.contains(Point::new(1, 1)));
        assert!(!zone.contains(Point::new(0, -1)));
    }

    #[test]
    fn concave_polygon_respects_vertex_order() {
        // A "U" shape: the notch between the arms is outside.
        let zone = Zone::new(vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(6, 10),
            Point::new(6, 4),
            Point::new(4, 4),
            Point::new(4, 10),
            Point::new(0, 10),
        ]);
        assert!(zone.contains(Point::new(2, 8)));
        assert!(zone.contains(Point::new(8, 8)));
        assert!(!zone.contains(Point::new(5, 8)));
    }
}
