use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Document, Event, HtmlCanvasElement, HtmlElement, HtmlInputElement,
    MouseEvent, TouchEvent, Window,
};

use sheetboard_shared::{DrawingSession, RestorePurpose, Tool};

use crate::config::{CANVAS_ID, COLOR_PICKER_ID, MATH_PREVIEW_ID, TOOL_BUTTON_SELECTOR};
use crate::dom::{find_element, mouse_to_point, query_all, touch_end_point, touch_to_point};
use crate::state::{run_settled, Board, Session};
use crate::storage::LocalStore;
use crate::surface::{CanvasSurface, RestoreSink};

/// Builds the drawing board if the page has a canvas. The canvas tracks the
/// math preview when there is one, otherwise its own parent.
pub fn attach(window: &Window, document: &Document) -> Result<Option<Rc<Board>>, JsValue> {
    let Some(canvas) = find_element::<HtmlCanvasElement>(document, CANVAS_ID) else {
        log::warn!("no #{CANVAS_ID}; drawing disabled");
        return Ok(None);
    };
    let reference = find_element::<HtmlElement>(document, MATH_PREVIEW_ID)
        .or_else(|| {
            canvas
                .parent_element()
                .and_then(|parent| parent.dyn_into::<HtmlElement>().ok())
        })
        .unwrap_or_else(|| canvas.clone().into());

    let sink = RestoreSink::default();
    let surface = CanvasSurface::new(canvas.clone(), sink.clone())?;
    let session = Rc::new(RefCell::new(DrawingSession::new(
        surface,
        LocalStore::open(window),
    )));
    connect_restores(&sink, Rc::downgrade(&session));

    let tool_buttons = document
        .body()
        .map(|body| query_all(&body, TOOL_BUTTON_SELECTOR))
        .unwrap_or_default();
    let board = Rc::new(Board {
        session,
        canvas,
        reference,
        color_input: find_element::<HtmlInputElement>(document, COLOR_PICKER_ID),
        tool_buttons,
    });
    board.sync_tool_ui(Tool::None);

    wire_tool_buttons(&board)?;
    wire_mouse(window, &board)?;
    wire_touch(&board)?;
    log::info!("drawing board ready");
    Ok(Some(board))
}

fn connect_restores(sink: &RestoreSink, session: Weak<RefCell<Session>>) {
    sink.connect(Rc::new(move |ticket, decoded| {
        let Some(session) = session.upgrade() else {
            return;
        };
        {
            let mut session = session.borrow_mut();
            if let Some(RestorePurpose::Load) = session.finish_restore(ticket, decoded) {
                log::info!(
                    "canvas restored; history at step {}",
                    session.history().step_index()
                );
            }
        }
        run_settled(&session);
    }));
}

fn wire_tool_buttons(board: &Rc<Board>) -> Result<(), JsValue> {
    for button in &board.tool_buttons {
        let Some(tool) = button
            .get_attribute("data-tool")
            .and_then(|name| Tool::from_name(&name))
        else {
            continue;
        };
        let click_board = board.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            event.prevent_default();
            click_board.toggle_tool(tool);
        });
        button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }
    Ok(())
}

fn wire_mouse(window: &Window, board: &Rc<Board>) -> Result<(), JsValue> {
    {
        let down_board = board.clone();
        let onmousedown = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            let Some(point) = mouse_to_point(&down_board.canvas, &event) else {
                return;
            };
            let color = down_board.color();
            let response = down_board
                .session
                .borrow_mut()
                .pointer_down(point, color.as_deref());
            if response.consumed() {
                event.prevent_default();
            }
        });
        board
            .canvas
            .add_event_listener_with_callback("mousedown", onmousedown.as_ref().unchecked_ref())?;
        onmousedown.forget();
    }

    {
        let move_board = board.clone();
        let onmousemove = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            let Some(point) = mouse_to_point(&move_board.canvas, &event) else {
                return;
            };
            move_board.session.borrow_mut().pointer_move(point);
        });
        board
            .canvas
            .add_event_listener_with_callback("mousemove", onmousemove.as_ref().unchecked_ref())?;
        onmousemove.forget();
    }

    {
        // On the window so releasing outside the canvas still ends the stroke.
        let up_board = board.clone();
        let onmouseup = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            up_board.pointer_up(mouse_to_point(&up_board.canvas, &event));
        });
        window.add_event_listener_with_callback("mouseup", onmouseup.as_ref().unchecked_ref())?;
        onmouseup.forget();
    }
    Ok(())
}

fn wire_touch(board: &Rc<Board>) -> Result<(), JsValue> {
    let options = AddEventListenerOptions::new();
    options.set_passive(false);

    {
        let start_board = board.clone();
        let ontouchstart = Closure::<dyn FnMut(TouchEvent)>::new(move |event: TouchEvent| {
            let Some(point) = touch_to_point(&start_board.canvas, &event) else {
                return;
            };
            let color = start_board.color();
            let response = start_board
                .session
                .borrow_mut()
                .pointer_down(point, color.as_deref());
            if response.consumed() {
                event.prevent_default();
            }
        });
        board.canvas.add_event_listener_with_callback_and_add_event_listener_options(
            "touchstart",
            ontouchstart.as_ref().unchecked_ref(),
            &options,
        )?;
        ontouchstart.forget();
    }

    {
        let move_board = board.clone();
        let ontouchmove = Closure::<dyn FnMut(TouchEvent)>::new(move |event: TouchEvent| {
            let Some(point) = touch_to_point(&move_board.canvas, &event) else {
                return;
            };
            let response = move_board.session.borrow_mut().pointer_move(point);
            if response.consumed() {
                event.prevent_default();
            }
        });
        board.canvas.add_event_listener_with_callback_and_add_event_listener_options(
            "touchmove",
            ontouchmove.as_ref().unchecked_ref(),
            &options,
        )?;
        ontouchmove.forget();
    }

    {
        let end_board = board.clone();
        let ontouchend = Closure::<dyn FnMut(TouchEvent)>::new(move |event: TouchEvent| {
            end_board.pointer_up(touch_end_point(&end_board.canvas, &event));
        });
        board
            .canvas
            .add_event_listener_with_callback("touchend", ontouchend.as_ref().unchecked_ref())?;
        ontouchend.forget();
    }

    {
        let cancel_board = board.clone();
        let ontouchcancel = Closure::<dyn FnMut(TouchEvent)>::new(move |_| {
            cancel_board.pointer_up(None);
        });
        board.canvas.add_event_listener_with_callback(
            "touchcancel",
            ontouchcancel.as_ref().unchecked_ref(),
        )?;
        ontouchcancel.forget();
    }
    Ok(())
}
