use crate::config::{ARROW_HEAD_ANGLE, ARROW_HEAD_LENGTH};
use crate::surface::Extent;
use crate::Point;

/// On-screen box of the canvas element, as reported by
/// `getBoundingClientRect`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

pub fn normalize_point(point: Point) -> Option<Point> {
    if !point.is_finite() {
        return None;
    }
    Some(point)
}

/// Maps a client-space pointer position into surface pixels. The displayed
/// box and the raster buffer can differ when CSS scales the canvas.
pub fn to_surface_point(client: Point, rect: DisplayRect, surface: Extent) -> Option<Point> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    let scale_x = f64::from(surface.width) / rect.width;
    let scale_y = f64::from(surface.height) / rect.height;
    normalize_point(Point {
        x: (client.x - rect.left) * scale_x,
        y: (client.y - rect.top) * scale_y,
    })
}

pub fn direction_angle(from: Point, to: Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// End points of the two arrowhead segments for a shaft from `start` to
/// `end`. Both segments start at `end`.
pub fn arrowhead(start: Point, end: Point) -> [Point; 2] {
    arrowhead_with(start, end, ARROW_HEAD_LENGTH, ARROW_HEAD_ANGLE)
}

pub fn arrowhead_with(start: Point, end: Point, length: f64, spread: f64) -> [Point; 2] {
    let angle = direction_angle(start, end);
    let wing = |offset: f64| Point {
        x: end.x - length * (angle + offset).cos(),
        y: end.y - length * (angle + offset).sin(),
    };
    [wing(-spread), wing(spread)]
}

pub fn distance(a: Point, b: Point) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}
