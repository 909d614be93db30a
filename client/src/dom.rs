use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, HtmlCanvasElement, HtmlDocument, HtmlElement, MouseEvent, TouchEvent, Window,
};

use sheetboard_shared::geometry::{to_surface_point, DisplayRect};
use sheetboard_shared::{Extent, Point};

use crate::config::ACTIVE_TOOL_CLASS;

/// Optional lookup for elements a feature can live without.
pub fn find_element<T: JsCast>(document: &Document, id: &str) -> Option<T> {
    document
        .get_element_by_id(id)
        .and_then(|element| element.dyn_into::<T>().ok())
}

pub fn query_all(root: &Element, selector: &str) -> Vec<Element> {
    let Ok(list) = root.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|index| list.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub fn set_tool_button(button: &Element, active: bool) {
    let pressed = if active { "true" } else { "false" };
    let _ = button.set_attribute("aria-pressed", pressed);
    let _ = button
        .class_list()
        .toggle_with_force(ACTIVE_TOOL_CLASS, active);
}

pub fn set_canvas_cursor(canvas: &HtmlCanvasElement, drawing_enabled: bool) {
    let cursor = if drawing_enabled { "crosshair" } else { "default" };
    let _ = canvas.style().set_property("cursor", cursor);
}

/// Full content extent of `element`, overflow included.
pub fn content_extent(element: &HtmlElement) -> Extent {
    let width = match element.scroll_width() {
        0 => element.offset_width(),
        width => width,
    };
    let height = match element.scroll_height() {
        0 => element.offset_height(),
        height => height,
    };
    Extent::new(width.max(0) as u32, height.max(0) as u32)
}

fn canvas_point(canvas: &HtmlCanvasElement, client_x: f64, client_y: f64) -> Option<Point> {
    let rect = canvas.get_bounding_client_rect();
    to_surface_point(
        Point::new(client_x, client_y),
        DisplayRect {
            left: rect.left(),
            top: rect.top(),
            width: rect.width(),
            height: rect.height(),
        },
        Extent::new(canvas.width(), canvas.height()),
    )
}

pub fn mouse_to_point(canvas: &HtmlCanvasElement, event: &MouseEvent) -> Option<Point> {
    canvas_point(canvas, event.client_x() as f64, event.client_y() as f64)
}

/// First active touch, for `touchstart` and `touchmove`.
pub fn touch_to_point(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Option<Point> {
    let touch = event.touches().item(0)?;
    canvas_point(canvas, touch.client_x() as f64, touch.client_y() as f64)
}

/// The finger that lifted. Other fingers may still be down, so the active
/// list is not consulted.
pub fn touch_end_point(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Option<Point> {
    let touch = event.changed_touches().item(0)?;
    canvas_point(canvas, touch.client_x() as f64, touch.client_y() as f64)
}

pub fn html_document(document: &Document) -> Option<HtmlDocument> {
    document.clone().dyn_into::<HtmlDocument>().ok()
}

/// Runs a host editing command (`undo`, `redo`, `selectAll`, `insertText`)
/// against whatever currently has focus.
pub fn exec_command(document: &Document, command: &str, value: Option<&str>) -> bool {
    let Some(html) = html_document(document) else {
        return false;
    };
    let result = match value {
        Some(value) => html.exec_command_with_show_ui_and_value(command, false, value),
        None => html.exec_command(command),
    };
    result.unwrap_or(false)
}

pub fn confirm(window: &Window, message: &str) -> bool {
    window.confirm_with_message(message).unwrap_or(false)
}

pub fn alert(window: &Window, message: &str) {
    if window.alert_with_message(message).is_err() {
        log::warn!("alert suppressed: {message}");
    }
}

pub fn debug_enabled(window: &Window) -> bool {
    let search = window.location().search().ok().unwrap_or_default();
    search.contains("debug=1")
        || search.contains("debug=true")
        || search.contains("log=1")
        || search.contains("log=true")
}

/// Looks up `name` on a script-provided object as a callable.
pub fn method(target: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
}
