//! The seam between the drawing session and a real raster.
//!
//! The browser client implements [`Surface`] over a `<canvas>` element; the
//! tests implement it over a textual pixel log.

use thiserror::Error;

use crate::snapshot::Snapshot;
use crate::{Point, StrokeStyle};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Identifies one asynchronous snapshot decode. Only the most recently issued
/// ticket is honoured when the decode completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RestoreTicket(pub u64);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("image decoder rejected the snapshot")]
    Rejected,
    #[error("surface could not start decoding: {0}")]
    Unavailable(String),
}

pub trait Surface {
    /// Decoded image handed back by the host once a restore completes.
    type Decoded;

    fn extent(&self) -> Extent;

    /// Resizes the raster buffer. Resizing drops every pixel.
    fn set_extent(&mut self, extent: Extent);

    fn clear(&mut self);

    /// Encodes the current pixels. `None` when the platform refuses (for
    /// example a zero-sized or tainted canvas).
    fn capture(&self) -> Option<Snapshot>;

    fn begin_path(&mut self, at: Point);

    fn move_to(&mut self, at: Point);

    fn line_to(&mut self, to: Point);

    /// Strokes the current path.
    fn stroke(&mut self, style: &StrokeStyle);

    /// Starts decoding `snapshot`. The host reports completion through
    /// `DrawingSession::finish_restore` with the same ticket.
    fn begin_restore(
        &mut self,
        snapshot: &Snapshot,
        ticket: RestoreTicket,
    ) -> Result<(), DecodeError>;

    /// Clears the surface and paints a decoded snapshot at the origin.
    fn draw_decoded(&mut self, decoded: &Self::Decoded);
}
