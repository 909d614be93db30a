//! Fixed constants shared by the session logic and the browser glue.

use std::time::Duration;

pub const DEFAULT_COLOR: &str = "#673ab7";

pub const PEN_WIDTH: f64 = 2.0;
pub const PEN_OPACITY: f64 = 1.0;
pub const HIGHLIGHTER_WIDTH: f64 = 15.0;
pub const HIGHLIGHTER_OPACITY: f64 = 0.3;

pub const ARROW_HEAD_LENGTH: f64 = 10.0;
/// Half-angle between the shaft and each head segment (30 degrees).
pub const ARROW_HEAD_ANGLE: f64 = std::f64::consts::PI / 6.0;

/// Quiet period before text slots are written back.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(300);

pub const MATH_TEXT_KEY: &str = "mathStorage";
pub const CANVAS_KEY: &str = "canvasStorage";
pub const PAGES_KEY: &str = "pagesData";
pub const PARTICIPANTS_KEY: &str = "participants";
pub const HEADER_KEY_PREFIX: &str = "header-";

pub const HEADER_FIELD_IDS: [&str; 6] = [
    "header-taller",
    "header-fecha",
    "header-materia",
    "header-carrera",
    "header-sede",
    "header-jornada",
];

pub const MATRIX_DEFAULT_SIZE: usize = 2;
pub const MATRIX_MAX_SIZE: usize = 10;

/// Plotter viewport as `[left, top, right, bottom]` in plot units.
pub const PLOT_BOUNDS: [f64; 4] = [-10.0, 10.0, 10.0, -10.0];
pub const PLOT_POINT_SIZE: f64 = 4.0;
pub const PLOT_POINT_COLOR: &str = "#ff5722";
pub const PLOT_POINT_STROKE: &str = "#fff";
pub const PLOT_LINE_COLOR: &str = "#ff9800";
pub const PLOT_LINE_WIDTH: f64 = 3.0;
/// Fewest points the joining polyline accepts.
pub const PLOT_MIN_LINE_POINTS: usize = 2;
