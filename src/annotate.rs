//! Frame annotation.
//!
//! Draws the zone outline and per-detection markers directly into the
//! RGB buffer before publication. Colors follow the operator UI
//! convention: yellow for the zone, red for a detection inside it,
//! green for one outside. All primitives clip at the frame edge.

use crate::detect::BoundingBox;
use crate::frame::Frame;
use crate::geometry::{Point, Zone};

pub const ZONE_COLOR: [u8; 3] = [255, 255, 0];
pub const INTRUDER_COLOR: [u8; 3] = [255, 0, 0];
pub const CLEAR_COLOR: [u8; 3] = [0, 255, 0];

const MARKER_RADIUS: i32 = 5;

/// Outline the zone polygon. Inactive zones draw nothing.
pub fn draw_zone(frame: &mut Frame, zone: &Zone) {
    if !zone.is_active() {
        return;
    }
    let vertices = zone.vertices();
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        draw_line(frame, a, b, ZONE_COLOR);
    }
}

/// Box outline plus a filled dot at the detection center.
pub fn draw_detection(frame: &mut Frame, bbox: &BoundingBox, inside: bool) {
    let color = if inside { INTRUDER_COLOR } else { CLEAR_COLOR };
    draw_rect(frame, bbox, color);
    fill_circle(frame, bbox.center(), MARKER_RADIUS, color);
}

fn draw_rect(frame: &mut Frame, bbox: &BoundingBox, color: [u8; 3]) {
    let max_x = frame.width() as i32 - 1;
    let max_y = frame.height() as i32 - 1;
    if bbox.x2 < 0 || bbox.y2 < 0 || bbox.x1 > max_x || bbox.y1 > max_y {
        return;
    }
    // Clamp the ranges so iteration is bounded by the frame, not the box.
    for x in bbox.x1.max(0)..=bbox.x2.min(max_x) {
        frame.put_pixel(x, bbox.y1, color);
        frame.put_pixel(x, bbox.y2, color);
    }
    for y in bbox.y1.max(0)..=bbox.y2.min(max_y) {
        frame.put_pixel(bbox.x1, y, color);
        frame.put_pixel(bbox.x2, y, color);
    }
}

fn fill_circle(frame: &mut Frame, center: Point, radius: i32, color: [u8; 3]) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                frame.put_pixel(center.x + dx, center.y + dy, color);
            }
        }
    }
}

/// Bresenham line between two vertices, clipped to the frame first so
/// far-offscreen vertices cost nothing.
fn draw_line(frame: &mut Frame, a: Point, b: Point, color: [u8; 3]) {
    let Some((a, b)) = clip_segment(a, b, frame.width(), frame.height()) else {
        return;
    };
    let dx = (b.x as i64 - a.x as i64).abs();
    let dy = -(b.y as i64 - a.y as i64).abs();
    let sx = if a.x < b.x { 1 } else { -1 };
    let sy = if a.y < b.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (a.x, a.y);
    loop {
        frame.put_pixel(x, y, color);
        if x == b.x && y == b.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Liang-Barsky clip of a segment against the frame rectangle. Returns
/// `None` when the segment misses the frame entirely.
fn clip_segment(a: Point, b: Point, width: u32, height: u32) -> Option<(Point, Point)> {
    let (x0, y0) = (a.x as f64, a.y as f64);
    let dx = b.x as f64 - x0;
    let dy = b.y as f64 - y0;
    let max_x = width as f64 - 1.0;
    let max_y = height as f64 - 1.0;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [(-dx, x0), (dx, max_x - x0), (-dy, y0), (dy, max_y - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }
    let at = |t: f64| Point::new((x0 + t * dx).round() as i32, (y0 + t * dy).round() as i32);
    Some((at(t0), at(t1)))
}
