use serde::{Deserialize, Serialize};

pub mod config;
pub mod geometry;
pub mod history;
pub mod latex;
pub mod plot;
pub mod session;
pub mod session_format;
pub mod snapshot;
pub mod store;
pub mod surface;
pub mod worksheet;

pub use history::CanvasHistory;
pub use session::{DrawingSession, Lease, PointerResponse, RestorePurpose, Settled};
pub use session_format::{decode_session_file, encode_session_file, WorksheetFile};
pub use snapshot::{Snapshot, SnapshotError};
pub use store::{KeyValueStore, MemoryStore, Slot};
pub use surface::{DecodeError, Extent, RestoreTicket, Surface};
pub use worksheet::Worksheet;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tool {
    #[default]
    None,
    Pen,
    Highlighter,
    Line,
    Arrow,
}

impl Tool {
    /// Tools that stroke on every pointer move.
    pub fn is_freehand(self) -> bool {
        matches!(self, Tool::Pen | Tool::Highlighter)
    }

    /// Tools that only draw once the pointer is released.
    pub fn is_shape(self) -> bool {
        matches!(self, Tool::Line | Tool::Arrow)
    }

    pub fn name(self) -> &'static str {
        match self {
            Tool::None => "none",
            Tool::Pen => "pen",
            Tool::Highlighter => "highlighter",
            Tool::Line => "line",
            Tool::Arrow => "arrow",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" | "" => Some(Tool::None),
            "pen" => Some(Tool::Pen),
            "highlighter" => Some(Tool::Highlighter),
            "line" => Some(Tool::Line),
            "arrow" => Some(Tool::Arrow),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    pub color: String,
    pub width: f64,
    pub opacity: f64,
}

impl StrokeStyle {
    /// Style for `tool`, using `color` or the default ink when the color
    /// control is missing or empty.
    pub fn for_tool(tool: Tool, color: Option<&str>) -> Self {
        let color = sanitize_color(color);
        match tool {
            Tool::Highlighter => Self {
                color,
                width: config::HIGHLIGHTER_WIDTH,
                opacity: config::HIGHLIGHTER_OPACITY,
            },
            _ => Self {
                color,
                width: config::PEN_WIDTH,
                opacity: config::PEN_OPACITY,
            },
        }
    }
}

pub fn sanitize_color(color: Option<&str>) -> String {
    let color = color.map(str::trim).unwrap_or_default();
    if color.is_empty() {
        return config::DEFAULT_COLOR.to_string();
    }
    let mut color = color.to_string();
    if color.len() > 32 {
        color.truncate(32);
    }
    color
}
