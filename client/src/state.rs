use std::cell::RefCell;
use std::rc::Rc;

use web_sys::{Element, HtmlCanvasElement, HtmlElement, HtmlInputElement};

use sheetboard_shared::{DrawingSession, Point, Snapshot, Tool};

use crate::document::DocumentEditor;
use crate::dom::{content_extent, set_canvas_cursor, set_tool_button};
use crate::math::MathEditor;
use crate::storage::LocalStore;
use crate::surface::CanvasSurface;

pub type Session = DrawingSession<CanvasSurface, LocalStore>;
pub type SharedSession = Rc<RefCell<Session>>;

/// Runs the settle notifications that came due. Must be called with no
/// borrow of `session` held, since a notification may reach the board again.
pub fn run_settled(session: &SharedSession) {
    let due = session.borrow_mut().take_settled();
    for notify in due {
        notify();
    }
}

/// The drawing canvas together with the elements that steer it.
pub struct Board {
    pub session: SharedSession,
    pub canvas: HtmlCanvasElement,
    /// Element whose full content extent the canvas tracks.
    pub reference: HtmlElement,
    pub color_input: Option<HtmlInputElement>,
    pub tool_buttons: Vec<Element>,
}

impl Board {
    pub fn tool(&self) -> Tool {
        self.session.borrow().tool()
    }

    pub fn color(&self) -> Option<String> {
        self.color_input.as_ref().map(HtmlInputElement::value)
    }

    pub fn toggle_tool(&self, tool: Tool) -> Tool {
        let active = self.session.borrow_mut().toggle_tool(tool);
        run_settled(&self.session);
        self.sync_tool_ui(active);
        active
    }

    pub fn sync_tool_ui(&self, active: Tool) {
        for button in &self.tool_buttons {
            let tool = button
                .get_attribute("data-tool")
                .and_then(|name| Tool::from_name(&name));
            set_tool_button(button, active != Tool::None && tool == Some(active));
        }
        set_canvas_cursor(&self.canvas, active != Tool::None);
    }

    /// Matches the canvas to the reference element, keeping the drawing.
    pub fn sync(&self) {
        let extent = content_extent(&self.reference);
        self.session.borrow_mut().sync(extent);
    }

    pub fn undo(&self) {
        self.session.borrow_mut().undo();
    }

    pub fn redo(&self) {
        self.session.borrow_mut().redo();
    }

    pub fn reset(&self) {
        self.session.borrow_mut().reset();
    }

    pub fn load_saved(&self) -> bool {
        self.session.borrow_mut().load_saved()
    }

    pub fn load_snapshot(&self, snapshot: Snapshot) {
        self.session.borrow_mut().load_snapshot(snapshot);
    }

    /// Ends the current stroke, if any, at `point`.
    pub fn pointer_up(&self, point: Option<Point>) {
        let released = {
            let mut session = self.session.borrow_mut();
            session.is_drawing() && session.pointer_up(point).consumed()
        };
        if released {
            run_settled(&self.session);
        }
    }

    /// Runs `notify` once every queued board operation has landed.
    pub fn after_settled(&self, notify: impl FnOnce() + 'static) {
        self.session.borrow_mut().after_settled(notify);
        run_settled(&self.session);
    }
}

/// Whatever the current page provides. Each part is optional.
#[derive(Clone, Default)]
pub struct Editors {
    pub board: Option<Rc<Board>>,
    pub math: Option<Rc<MathEditor>>,
    pub document: Option<Rc<DocumentEditor>>,
}

impl Editors {
    /// Writes out every pending debounced save.
    pub fn flush(&self) {
        if let Some(math) = &self.math {
            math.flush();
        }
        if let Some(document) = &self.document {
            document.flush();
        }
    }
}
