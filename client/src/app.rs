use std::cell::Cell;
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, KeyboardEvent};

use sheetboard_shared::Tool;

use crate::dom::debug_enabled;
use crate::state::Editors;
use crate::{board, document, export, math, plotter};

fn document_ready_state(document: &web_sys::Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

fn init_logging(window: &web_sys::Window) {
    let level = if debug_enabled(window) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    if console_log::init_with_level(level).is_err() {
        web_sys::console::warn_1(&JsValue::from_str("logger already initialised"));
    }
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    init_logging(&window);
    let started = Rc::new(Cell::new(false));

    if document_ready_state(&document).as_deref() == Some("complete") {
        started.set(true);
        return start_app();
    }

    let onload_started = started.clone();
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        if onload_started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    window.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
    onload.forget();

    Ok(())
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    let board = board::attach(&window, &document)?;
    let math = math::attach(&window, &document, board.clone())?;
    // Both pages use #undo-btn; with a canvas those buttons belong to the board.
    let document_editor = document::attach(&window, &document, board.is_none() && math.is_none())?;
    let editors = Editors {
        board,
        math,
        document: document_editor,
    };
    export::attach(&window, &document, &editors)?;
    let plotter = plotter::attach(&window, &document)?;

    if let Some(board) = editors.board.clone() {
        let onresize = Closure::<dyn FnMut()>::new(move || {
            board.sync();
        });
        window.add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    if let Some(board) = editors.board.clone() {
        let onbeforeprint = Closure::<dyn FnMut()>::new(move || {
            board.sync();
        });
        window.add_event_listener_with_callback(
            "beforeprint",
            onbeforeprint.as_ref().unchecked_ref(),
        )?;
        onbeforeprint.forget();
    }

    {
        let flush_editors = editors.clone();
        let onpagehide = Closure::<dyn FnMut(Event)>::new(move |_| {
            flush_editors.flush();
        });
        window.add_event_listener_with_callback("pagehide", onpagehide.as_ref().unchecked_ref())?;
        onpagehide.forget();
    }

    if let Some(board) = editors.board.clone() {
        // Shortcuts only steer the drawing while a tool is active; otherwise
        // the focused text field keeps its own undo.
        let onkeydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            let modifier = event.meta_key() || event.ctrl_key();
            if !modifier || board.tool() == Tool::None {
                return;
            }
            let key = event.key();
            if event.shift_key() && key.eq_ignore_ascii_case("z") {
                event.prevent_default();
                board.redo();
                return;
            }
            if key.eq_ignore_ascii_case("z") {
                event.prevent_default();
                board.undo();
                return;
            }
            if key.eq_ignore_ascii_case("y") {
                event.prevent_default();
                board.redo();
            }
        });
        window.add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
        onkeydown.forget();
    }

    log::info!(
        "sheetboard started (board: {}, math: {}, document: {}, plotter: {})",
        editors.board.is_some(),
        editors.math.is_some(),
        editors.document.is_some(),
        plotter.is_some()
    );
    Ok(())
}
