//! Drawing session: tool selection, stroke capture, snapshot history and
//! resize-preserve for one attached surface.
//!
//! Every mutation of the surface goes through a single lease. A stroke holds
//! it from pointer-down to pointer-up and an asynchronous snapshot decode
//! holds it until the host reports completion. History moves, resyncs and
//! loads that arrive while the lease is taken are queued and replayed in
//! arrival order once it is released.
//!
//! Settle notifications are never run by the session itself. Once they come
//! due they are parked until the host calls [`DrawingSession::take_settled`],
//! so a host that shares the session behind a `RefCell` runs them with the
//! borrow released.

use std::collections::VecDeque;

use crate::geometry::{arrowhead, normalize_point};
use crate::history::{CanvasHistory, HistoryMove};
use crate::snapshot::Snapshot;
use crate::store::{clear_slot, load_snapshot, save_snapshot, KeyValueStore, Slot};
use crate::surface::{DecodeError, Extent, RestoreTicket, Surface};
use crate::{Point, StrokeStyle, Tool};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestorePurpose {
    /// Undo/redo moved to another snapshot.
    History,
    /// Pixels captured before a resize are being replayed.
    Resize,
    /// A persisted or imported snapshot is being brought back.
    Load,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lease {
    Free,
    Stroke,
    Restore {
        ticket: RestoreTicket,
        purpose: RestorePurpose,
    },
}

/// Whether a pointer event was used by the session. Hosts only suppress the
/// platform default (scrolling) for consumed events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerResponse {
    PassThrough,
    Busy,
    Consumed,
}

impl PointerResponse {
    pub fn consumed(self) -> bool {
        !matches!(self, PointerResponse::PassThrough)
    }
}

#[derive(Clone, Debug)]
pub struct Stroke {
    pub tool: Tool,
    pub style: StrokeStyle,
    pub start: Point,
    pub last: Point,
    drawn: bool,
}

impl Stroke {
    pub fn drawn(&self) -> bool {
        self.drawn
    }
}

struct InFlight {
    ticket: RestoreTicket,
    purpose: RestorePurpose,
    loaded: Option<Snapshot>,
}

enum Pending {
    Undo,
    Redo,
    Sync(Extent),
    Load(Snapshot),
    Notify(Settled),
}

pub type Settled = Box<dyn FnOnce()>;

pub struct DrawingSession<S: Surface, K: KeyValueStore> {
    surface: S,
    store: K,
    history: CanvasHistory,
    tool: Tool,
    stroke: Option<Stroke>,
    restore: Option<InFlight>,
    pending: VecDeque<Pending>,
    settled: Vec<Settled>,
    next_ticket: u64,
}

impl<S: Surface, K: KeyValueStore> DrawingSession<S, K> {
    pub fn new(surface: S, store: K) -> Self {
        Self {
            surface,
            store,
            history: CanvasHistory::new(),
            tool: Tool::None,
            stroke: None,
            restore: None,
            pending: VecDeque::new(),
            settled: Vec::new(),
            next_ticket: 0,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn history(&self) -> &CanvasHistory {
        &self.history
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn stroke(&self) -> Option<&Stroke> {
        self.stroke.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    pub fn lease(&self) -> Lease {
        if let Some(restore) = &self.restore {
            return Lease::Restore {
                ticket: restore.ticket,
                purpose: restore.purpose,
            };
        }
        if self.stroke.is_some() {
            return Lease::Stroke;
        }
        Lease::Free
    }

    pub fn is_idle(&self) -> bool {
        self.lease() == Lease::Free
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Switches tool, finishing any stroke in progress with its last point.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.stroke.is_some() {
            self.pointer_up(None);
        }
        log::debug!("tool {} -> {}", self.tool.name(), tool.name());
        self.tool = tool;
    }

    /// Toolbar behaviour: picking the active tool again puts the pen down.
    pub fn toggle_tool(&mut self, tool: Tool) -> Tool {
        let next = if self.tool == tool { Tool::None } else { tool };
        self.set_tool(next);
        next
    }

    pub fn pointer_down(&mut self, point: Point, color: Option<&str>) -> PointerResponse {
        if self.tool == Tool::None {
            return PointerResponse::PassThrough;
        }
        if self.restore.is_some() {
            log::debug!("pointer down refused: restore in flight");
            return PointerResponse::Busy;
        }
        if self.stroke.is_some() {
            return PointerResponse::Consumed;
        }
        let Some(point) = normalize_point(point) else {
            return PointerResponse::Consumed;
        };
        self.surface.begin_path(point);
        self.stroke = Some(Stroke {
            tool: self.tool,
            style: StrokeStyle::for_tool(self.tool, color),
            start: point,
            last: point,
            drawn: false,
        });
        PointerResponse::Consumed
    }

    pub fn pointer_move(&mut self, point: Point) -> PointerResponse {
        if self.tool == Tool::None {
            return PointerResponse::PassThrough;
        }
        let Some(stroke) = self.stroke.as_mut() else {
            return PointerResponse::PassThrough;
        };
        let Some(point) = normalize_point(point) else {
            return PointerResponse::Consumed;
        };
        stroke.last = point;
        if stroke.tool.is_freehand() {
            self.surface.line_to(point);
            self.surface.stroke(&stroke.style);
            stroke.drawn = true;
        }
        PointerResponse::Consumed
    }

    /// Ends the gesture. `None` (touch cancel, tool switch) reuses the last
    /// known position.
    pub fn pointer_up(&mut self, point: Option<Point>) -> PointerResponse {
        let Some(mut stroke) = self.stroke.take() else {
            return PointerResponse::PassThrough;
        };
        let end = point.and_then(normalize_point).unwrap_or(stroke.last);
        if stroke.tool.is_shape() {
            self.surface.begin_path(stroke.start);
            self.surface.line_to(end);
            if stroke.tool == Tool::Arrow {
                let [left, right] = arrowhead(stroke.start, end);
                self.surface.line_to(left);
                self.surface.move_to(end);
                self.surface.line_to(right);
            }
            self.surface.stroke(&stroke.style);
            stroke.drawn = true;
        }
        if stroke.drawn {
            self.push();
        }
        self.drain_pending();
        PointerResponse::Consumed
    }

    pub fn pointer_cancel(&mut self) -> PointerResponse {
        self.pointer_up(None)
    }

    /// Captures the surface onto the history stack and persists it. Refused
    /// while a snapshot decode is in flight.
    pub fn push(&mut self) -> bool {
        if self.restore.is_some() {
            log::warn!("push refused: restore in flight");
            return false;
        }
        let Some(snapshot) = self.surface.capture() else {
            log::warn!("surface capture failed; history unchanged");
            return false;
        };
        self.persist(&snapshot);
        self.history.push(snapshot);
        log::debug!(
            "history push -> step {} of {}",
            self.history.step_index(),
            self.history.len()
        );
        true
    }

    pub fn undo(&mut self) {
        if !self.is_idle() {
            self.pending.push_back(Pending::Undo);
            return;
        }
        let step = self.history.undo();
        self.apply_history_move(step);
    }

    pub fn redo(&mut self) {
        if !self.is_idle() {
            self.pending.push_back(Pending::Redo);
            return;
        }
        let step = self.history.redo();
        self.apply_history_move(step);
    }

    fn apply_history_move(&mut self, step: HistoryMove) {
        match step {
            HistoryMove::Restore(snapshot) => {
                self.persist(&snapshot);
                self.start_restore(snapshot, RestorePurpose::History, false);
            }
            HistoryMove::Clear => {
                self.surface.clear();
                clear_slot(&mut self.store, &Slot::Canvas);
            }
            HistoryMove::Stay => {}
        }
        log::debug!("history at step {}", self.history.step_index());
    }

    /// Empties the history and the surface and forgets the persisted canvas.
    /// Any decode still in flight is abandoned.
    pub fn reset(&mut self) {
        self.stroke = None;
        if let Some(restore) = self.restore.take() {
            log::debug!("reset abandons restore {:?}", restore.ticket);
        }
        self.pending.clear();
        self.history.reset();
        self.surface.clear();
        clear_slot(&mut self.store, &Slot::Canvas);
    }

    /// Resizes the surface to `extent` keeping what is already drawn.
    pub fn sync(&mut self, extent: Extent) {
        if extent.is_empty() {
            log::debug!("sync skipped: reference box not laid out");
            return;
        }
        if !self.is_idle() {
            if let Some(Pending::Sync(queued)) = self.pending.back_mut() {
                *queued = extent;
            } else {
                self.pending.push_back(Pending::Sync(extent));
            }
            return;
        }
        self.run_sync(extent);
    }

    fn run_sync(&mut self, extent: Extent) {
        if extent == self.surface.extent() {
            log::debug!("sync skipped: already {extent:?}");
            return;
        }
        let preserved = self.surface.capture();
        log::debug!(
            "sync {:?} -> {:?} (preserved: {})",
            self.surface.extent(),
            extent,
            preserved.is_some()
        );
        self.surface.set_extent(extent);
        if let Some(snapshot) = preserved {
            self.start_restore(snapshot, RestorePurpose::Resize, false);
        }
    }

    /// Restores the canvas slot from the store, if any. Returns whether a
    /// snapshot was found.
    pub fn load_saved(&mut self) -> bool {
        match load_snapshot(&self.store) {
            Some(snapshot) => {
                self.load_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    /// Brings back an external snapshot. Once it decodes, the history holds
    /// exactly that snapshot at step zero.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) {
        if !self.is_idle() {
            self.pending.push_back(Pending::Load(snapshot));
            return;
        }
        self.start_restore(snapshot, RestorePurpose::Load, true);
    }

    /// Makes `notify` due once everything queued before it has settled. Due
    /// notifications are handed out by [`Self::take_settled`].
    pub fn after_settled(&mut self, notify: impl FnOnce() + 'static) {
        if self.is_idle() && self.pending.is_empty() {
            self.settled.push(Box::new(notify));
            return;
        }
        self.pending.push_back(Pending::Notify(Box::new(notify)));
    }

    /// Notifications that came due, oldest first.
    pub fn take_settled(&mut self) -> Vec<Settled> {
        std::mem::take(&mut self.settled)
    }

    fn start_restore(&mut self, snapshot: Snapshot, purpose: RestorePurpose, keep: bool) {
        self.next_ticket += 1;
        let ticket = RestoreTicket(self.next_ticket);
        match self.surface.begin_restore(&snapshot, ticket) {
            Ok(()) => {
                log::debug!("restore {ticket:?} started for {purpose:?}");
                self.restore = Some(InFlight {
                    ticket,
                    purpose,
                    loaded: keep.then_some(snapshot),
                });
            }
            Err(error) => {
                log::warn!("restore for {purpose:?} could not start: {error}");
            }
        }
    }

    /// Host callback for a finished decode. Returns the purpose of the
    /// restore it completed, or `None` for a stale ticket.
    pub fn finish_restore(
        &mut self,
        ticket: RestoreTicket,
        decoded: Result<S::Decoded, DecodeError>,
    ) -> Option<RestorePurpose> {
        match &self.restore {
            Some(restore) if restore.ticket == ticket => {}
            _ => {
                log::debug!("dropping stale restore {ticket:?}");
                return None;
            }
        }
        let restore = self.restore.take()?;
        match decoded {
            Ok(image) => {
                self.surface.draw_decoded(&image);
                if let Some(snapshot) = restore.loaded {
                    self.persist(&snapshot);
                    self.history.prime(snapshot);
                }
            }
            Err(error) => {
                log::warn!("snapshot lost during {:?} restore: {error}", restore.purpose);
            }
        }
        self.drain_pending();
        Some(restore.purpose)
    }

    fn drain_pending(&mut self) {
        while self.is_idle() {
            let Some(next) = self.pending.pop_front() else {
                break;
            };
            match next {
                Pending::Undo => self.undo(),
                Pending::Redo => self.redo(),
                Pending::Sync(extent) => self.run_sync(extent),
                Pending::Load(snapshot) => {
                    self.start_restore(snapshot, RestorePurpose::Load, true)
                }
                Pending::Notify(notify) => self.settled.push(notify),
            }
        }
    }

    fn persist(&mut self, snapshot: &Snapshot) {
        if let Err(error) = save_snapshot(&mut self.store, snapshot) {
            log::warn!("canvas not persisted: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::store::MemoryStore;

    /// Rasterizes path commands into a list of stroke records so captures
    /// can be compared and replayed.
    #[derive(Default)]
    struct TestSurface {
        extent: Extent,
        pixels: Vec<String>,
        path: Vec<String>,
        restores: Vec<(Snapshot, RestoreTicket)>,
        refuse_decode: bool,
    }

    impl TestSurface {
        fn sized(width: u32, height: u32) -> Self {
            Self {
                extent: Extent::new(width, height),
                ..Self::default()
            }
        }
    }

    fn encode(pixels: &[String]) -> Snapshot {
        Snapshot::from_data_url(format!("data:text/plain,[{}]", pixels.join(";"))).unwrap()
    }

    fn decode(snapshot: &Snapshot) -> Vec<String> {
        let body = snapshot
            .as_data_url()
            .trim_start_matches("data:text/plain,[")
            .trim_end_matches(']');
        body.split(';')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    }

    impl Surface for TestSurface {
        type Decoded = Snapshot;

        fn extent(&self) -> Extent {
            self.extent
        }

        fn set_extent(&mut self, extent: Extent) {
            self.extent = extent;
            self.pixels.clear();
        }

        fn clear(&mut self) {
            self.pixels.clear();
        }

        fn capture(&self) -> Option<Snapshot> {
            if self.extent.is_empty() {
                return None;
            }
            Some(encode(&self.pixels))
        }

        fn begin_path(&mut self, at: Point) {
            self.path = vec![format!("M{},{}", at.x, at.y)];
        }

        fn move_to(&mut self, at: Point) {
            self.path.push(format!("M{},{}", at.x, at.y));
        }

        fn line_to(&mut self, to: Point) {
            self.path.push(format!("L{},{}", to.x, to.y));
        }

        fn stroke(&mut self, style: &StrokeStyle) {
            self.pixels
                .push(format!("{}|{}|{}", self.path.join(" "), style.width, style.color));
        }

        fn begin_restore(
            &mut self,
            snapshot: &Snapshot,
            ticket: RestoreTicket,
        ) -> Result<(), DecodeError> {
            if self.refuse_decode {
                return Err(DecodeError::Unavailable("no decoder".into()));
            }
            self.restores.push((snapshot.clone(), ticket));
            Ok(())
        }

        fn draw_decoded(&mut self, decoded: &Snapshot) {
            self.pixels = decode(decoded);
        }
    }

    type Session = DrawingSession<TestSurface, MemoryStore>;

    fn session() -> Session {
        DrawingSession::new(TestSurface::sized(400, 300), MemoryStore::new())
    }

    /// Completes the most recent decode the way the browser would.
    fn settle(session: &mut Session) -> Option<RestorePurpose> {
        let (snapshot, ticket) = session.surface_mut().restores.pop()?;
        session.finish_restore(ticket, Ok(snapshot))
    }

    fn pen_stroke(session: &mut Session, from: (f64, f64), to: (f64, f64)) {
        session.pointer_down(Point::new(from.0, from.1), Some("#000"));
        session.pointer_move(Point::new(to.0, to.1));
        session.pointer_up(Some(Point::new(to.0, to.1)));
    }

    fn stored_canvas(session: &Session) -> Option<String> {
        session.store().get("canvasStorage")
    }

    #[test]
    fn no_tool_passes_pointer_through() {
        let mut session = session();
        assert_eq!(
            session.pointer_down(Point::new(1.0, 1.0), None),
            PointerResponse::PassThrough
        );
        assert!(!session.is_drawing());
        assert!(session.surface().path.is_empty());
    }

    #[test]
    fn pen_stroke_draws_incrementally_and_pushes() {
        let mut session = session();
        session.set_tool(Tool::Pen);
        session.pointer_down(Point::new(1.0, 1.0), Some("#000"));
        assert_eq!(session.lease(), Lease::Stroke);
        session.pointer_move(Point::new(5.0, 5.0));
        session.pointer_move(Point::new(9.0, 5.0));
        assert_eq!(session.surface().pixels.len(), 2);
        assert_eq!(session.surface().pixels[1], "M1,1 L5,5 L9,5|2|#000");
        assert!(session.history().is_empty());

        session.pointer_up(Some(Point::new(9.0, 5.0)));
        assert_eq!(session.lease(), Lease::Free);
        assert_eq!(session.history().step_index(), 0);
        let saved = stored_canvas(&session).unwrap();
        assert_eq!(saved, session.history().current().unwrap().as_data_url());
    }

    #[test]
    fn highlighter_uses_wide_translucent_style() {
        let mut session = session();
        session.set_tool(Tool::Highlighter);
        session.pointer_down(Point::new(0.0, 0.0), Some("#ff0"));
        let style = &session.stroke().unwrap().style;
        assert_eq!((style.width, style.opacity), (15.0, 0.3));
    }

    #[test]
    fn pen_tap_without_motion_pushes_nothing() {
        let mut session = session();
        session.set_tool(Tool::Pen);
        session.pointer_down(Point::new(1.0, 1.0), None);
        session.pointer_up(Some(Point::new(1.0, 1.0)));
        assert!(session.history().is_empty());
        assert_eq!(stored_canvas(&session), None);
    }

    #[test]
    fn line_draws_only_on_release() {
        let mut session = session();
        session.set_tool(Tool::Line);
        session.pointer_down(Point::new(0.0, 0.0), Some("red"));
        session.pointer_move(Point::new(50.0, 50.0));
        assert!(session.surface().pixels.is_empty());
        session.pointer_up(Some(Point::new(60.0, 0.0)));
        assert_eq!(session.surface().pixels, vec!["M0,0 L60,0|2|red".to_string()]);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn arrow_release_adds_head() {
        let mut session = session();
        session.set_tool(Tool::Arrow);
        session.pointer_down(Point::new(0.0, 0.0), Some("red"));
        session.pointer_up(Some(Point::new(100.0, 0.0)));
        let path = &session.surface().path;
        assert_eq!(path.len(), 5);
        assert_eq!(path[0], "M0,0");
        assert_eq!(path[1], "L100,0");
        assert_eq!(path[3], "M100,0");
        assert!(path[2].starts_with("L91.33"));
        assert!(path[4].starts_with("L91.33"));
    }

    #[test]
    fn touch_cancel_finishes_shape_at_last_point() {
        let mut session = session();
        session.set_tool(Tool::Line);
        session.pointer_down(Point::new(0.0, 0.0), None);
        session.pointer_move(Point::new(10.0, 20.0));
        session.pointer_cancel();
        assert_eq!(session.surface().pixels.len(), 1);
        assert!(session.surface().pixels[0].starts_with("M0,0 L10,20|"));
    }

    #[test]
    fn undo_restores_previous_snapshot_asynchronously() {
        let mut session = session();
        session.set_tool(Tool::Pen);
        pen_stroke(&mut session, (0.0, 0.0), (1.0, 1.0));
        let first = session.surface().pixels.clone();
        pen_stroke(&mut session, (2.0, 2.0), (3.0, 3.0));
        assert_eq!(session.surface().pixels.len(), 2);

        session.undo();
        assert!(matches!(
            session.lease(),
            Lease::Restore {
                purpose: RestorePurpose::History,
                ..
            }
        ));
        assert_eq!(settle(&mut session), Some(RestorePurpose::History));
        assert_eq!(session.surface().pixels, first);
        assert_eq!(
            stored_canvas(&session).as_deref(),
            Some(session.history().current().unwrap().as_data_url())
        );

        session.redo();
        settle(&mut session);
        assert_eq!(session.surface().pixels.len(), 2);
        assert_eq!(session.history().step_index(), 1);
    }

    #[test]
    fn undo_past_first_step_clears_and_forgets_canvas() {
        let mut session = session();
        session.set_tool(Tool::Pen);
        pen_stroke(&mut session, (0.0, 0.0), (1.0, 1.0));

        session.undo();
        assert_eq!(session.history().step_index(), -1);
        assert!(session.surface().pixels.is_empty());
        assert_eq!(stored_canvas(&session), None);

        session.undo();
        assert_eq!(session.history().step_index(), -1);
        assert!(session.surface().restores.is_empty());
    }

    #[test]
    fn new_stroke_after_undo_discards_redo_branch() {
        let mut session = session();
        session.set_tool(Tool::Pen);
        pen_stroke(&mut session, (0.0, 0.0), (1.0, 0.0));
        pen_stroke(&mut session, (0.0, 1.0), (1.0, 1.0));
        pen_stroke(&mut session, (0.0, 2.0), (1.0, 2.0));
        session.undo();
        settle(&mut session);
        session.undo();
        settle(&mut session);
        assert_eq!(session.history().step_index(), 0);

        pen_stroke(&mut session, (0.0, 3.0), (1.0, 3.0));
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history().step_index(), 1);
        session.redo();
        assert!(session.surface().restores.is_empty());
    }

    #[test]
    fn stroke_is_refused_while_restore_in_flight() {
        let mut session = session();
        session.set_tool(Tool::Pen);
        pen_stroke(&mut session, (0.0, 0.0), (1.0, 1.0));
        pen_stroke(&mut session, (0.0, 0.0), (2.0, 2.0));
        session.undo();
        assert_eq!(
            session.pointer_down(Point::new(5.0, 5.0), None),
            PointerResponse::Busy
        );
        assert!(!session.push());
        settle(&mut session);
        assert_eq!(
            session.pointer_down(Point::new(5.0, 5.0), None),
            PointerResponse::Consumed
        );
    }

    #[test]
    fn history_moves_queue_behind_restore() {
        let mut session = session();
        session.set_tool(Tool::Pen);
        for y in 0..3 {
            pen_stroke(&mut session, (0.0, f64::from(y)), (1.0, f64::from(y)));
        }
        session.undo();
        session.undo();
        assert_eq!(session.history().step_index(), 1);
        assert_eq!(session.pending_len(), 1);

        settle(&mut session);
        assert_eq!(session.history().step_index(), 0);
        settle(&mut session);
        assert_eq!(session.surface().pixels.len(), 1);
        assert!(session.is_idle());
    }

    #[test]
    fn repeated_sync_preserves_pixels() {
        let mut session = session();
        session.set_tool(Tool::Pen);
        pen_stroke(&mut session, (0.0, 0.0), (10.0, 10.0));
        let before = session.surface().pixels.clone();

        session.sync(Extent::new(640, 480));
        assert!(session.surface().pixels.is_empty());
        assert_eq!(settle(&mut session), Some(RestorePurpose::Resize));
        assert_eq!(session.surface().pixels, before);

        session.sync(Extent::new(400, 300));
        settle(&mut session);
        assert_eq!(session.surface().pixels, before);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn same_extent_sync_leaves_surface_alone() {
        let mut session = session();
        session.set_tool(Tool::Pen);
        pen_stroke(&mut session, (0.0, 0.0), (10.0, 10.0));
        let before = session.surface().pixels.clone();

        session.sync(Extent::new(400, 300));
        assert_eq!(session.surface().pixels, before);
        assert!(session.surface().restores.is_empty());
        assert!(session.is_idle());
    }

    #[test]
    fn sync_resizes_to_measured_extent() {
        let mut session = session();
        session.sync(Extent::new(800, 1200));
        settle(&mut session);
        assert_eq!(session.surface().extent(), Extent::new(800, 1200));

        session.sync(Extent::new(0, 1200));
        assert_eq!(session.surface().extent(), Extent::new(800, 1200));
    }

    #[test]
    fn sync_during_stroke_waits_for_release() {
        let mut session = session();
        session.set_tool(Tool::Pen);
        session.pointer_down(Point::new(0.0, 0.0), None);
        session.pointer_move(Point::new(3.0, 3.0));
        session.sync(Extent::new(500, 500));
        assert_eq!(session.surface().extent(), Extent::new(400, 300));

        session.pointer_up(None);
        assert_eq!(session.surface().extent(), Extent::new(500, 500));
        settle(&mut session);
        assert_eq!(session.surface().pixels.len(), 1);
    }

    #[test]
    fn queued_syncs_coalesce() {
        let mut session = session();
        session.sync(Extent::new(500, 500));
        session.sync(Extent::new(600, 600));
        session.sync(Extent::new(700, 700));
        assert_eq!(session.pending_len(), 1);
        settle(&mut session);
        assert_eq!(session.surface().extent(), Extent::new(700, 700));
    }

    #[test]
    fn reset_abandons_inflight_restore() {
        let mut session = session();
        session.set_tool(Tool::Pen);
        pen_stroke(&mut session, (0.0, 0.0), (1.0, 1.0));
        session.sync(Extent::new(500, 500));
        let (snapshot, ticket) = session.surface_mut().restores.pop().unwrap();

        session.reset();
        assert!(session.is_idle());
        assert_eq!(session.finish_restore(ticket, Ok(snapshot)), None);
        assert!(session.surface().pixels.is_empty());
        assert!(session.history().is_empty());
        assert_eq!(stored_canvas(&session), None);
    }

    #[test]
    fn load_saved_primes_history_with_one_entry() {
        let saved = encode(&["M0,0 L4,4|2|#000".to_string()]);
        let mut store = MemoryStore::new();
        save_snapshot(&mut store, &saved).unwrap();
        let mut session = DrawingSession::new(TestSurface::sized(400, 300), store);

        assert!(session.load_saved());
        assert!(session.history().is_empty());
        assert_eq!(settle(&mut session), Some(RestorePurpose::Load));
        assert_eq!(session.history().snapshots(), &[saved.clone()]);
        assert_eq!(session.history().step(), Some(0));
        assert_eq!(session.surface().pixels, decode(&saved));
    }

    #[test]
    fn load_without_saved_canvas_does_nothing() {
        let mut session = session();
        assert!(!session.load_saved());
        assert!(session.is_idle());
    }

    #[test]
    fn failed_decode_on_load_is_silent_loss() {
        let saved = encode(&["x".to_string()]);
        let mut session = session();
        session.load_snapshot(saved);
        let (_, ticket) = session.surface_mut().restores.pop().unwrap();
        assert_eq!(
            session.finish_restore(ticket, Err(DecodeError::Rejected)),
            Some(RestorePurpose::Load)
        );
        assert!(session.history().is_empty());
        assert!(session.is_idle());
    }

    #[test]
    fn decoder_unavailable_releases_lease() {
        let mut session = session();
        session.surface_mut().refuse_decode = true;
        session.load_snapshot(encode(&["x".to_string()]));
        assert!(session.is_idle());
        assert!(session.history().is_empty());
    }

    #[test]
    fn load_queued_after_sync_lands_on_resized_surface() {
        let saved = encode(&["M1,1 L2,2|2|#000".to_string()]);
        let mut store = MemoryStore::new();
        save_snapshot(&mut store, &saved).unwrap();
        let mut session = DrawingSession::new(TestSurface::sized(300, 150), store);

        session.sync(Extent::new(900, 700));
        session.load_saved();
        assert_eq!(settle(&mut session), Some(RestorePurpose::Resize));
        assert_eq!(settle(&mut session), Some(RestorePurpose::Load));
        assert_eq!(session.surface().extent(), Extent::new(900, 700));
        assert_eq!(session.surface().pixels, decode(&saved));
        assert_eq!(session.history().len(), 1);
    }

    fn run_settled(session: &mut Session) -> usize {
        let due = session.take_settled();
        let count = due.len();
        for notify in due {
            notify();
        }
        count
    }

    #[test]
    fn after_settled_waits_for_queue() {
        let fired = Rc::new(Cell::new(false));
        let mut session = session();

        {
            let fired = fired.clone();
            session.after_settled(move || fired.set(true));
        }
        assert!(!fired.get());
        assert_eq!(run_settled(&mut session), 1);
        assert!(fired.replace(false));

        session.sync(Extent::new(640, 480));
        {
            let fired = fired.clone();
            session.after_settled(move || fired.set(true));
        }
        assert_eq!(run_settled(&mut session), 0);
        settle(&mut session);
        assert!(!fired.get());
        assert_eq!(run_settled(&mut session), 1);
        assert!(fired.get());
    }

    #[test]
    fn settled_notify_can_reenter_shared_session() {
        let shared = Rc::new(RefCell::new(session()));
        {
            let mut session = shared.borrow_mut();
            session.set_tool(Tool::Pen);
            pen_stroke(&mut session, (0.0, 0.0), (4.0, 4.0));
            session.sync(Extent::new(500, 500));
        }

        let weak = Rc::downgrade(&shared);
        shared.borrow_mut().after_settled(move || {
            if let Some(session) = weak.upgrade() {
                session.borrow_mut().sync(Extent::new(640, 480));
            }
        });

        settle(&mut shared.borrow_mut());
        let due = shared.borrow_mut().take_settled();
        assert_eq!(due.len(), 1);
        for notify in due {
            notify();
        }

        let session = shared.borrow();
        assert_eq!(session.surface().extent(), Extent::new(640, 480));
        assert!(matches!(
            session.lease(),
            Lease::Restore {
                purpose: RestorePurpose::Resize,
                ..
            }
        ));
    }

    #[test]
    fn settled_notifies_keep_arrival_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut session = session();
        session.sync(Extent::new(500, 500));
        for label in ["export", "print"] {
            let order = order.clone();
            session.after_settled(move || order.borrow_mut().push(label));
        }
        settle(&mut session);
        run_settled(&mut session);
        assert_eq!(*order.borrow(), vec!["export", "print"]);
    }

    #[test]
    fn toggle_tool_deselects_active_tool() {
        let mut session = session();
        assert_eq!(session.toggle_tool(Tool::Pen), Tool::Pen);
        assert_eq!(session.toggle_tool(Tool::Pen), Tool::None);
        assert_eq!(session.toggle_tool(Tool::Arrow), Tool::Arrow);
        assert_eq!(session.toggle_tool(Tool::Line), Tool::Line);
    }

    #[test]
    fn switching_tool_mid_stroke_commits_it() {
        let mut session = session();
        session.set_tool(Tool::Line);
        session.pointer_down(Point::new(0.0, 0.0), None);
        session.pointer_move(Point::new(7.0, 0.0));
        session.set_tool(Tool::Pen);
        assert!(!session.is_drawing());
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.tool(), Tool::Pen);
    }
}
