use std::rc::Rc;

use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Blob, BlobPropertyBag, Document, Element, Event, FileReader, HtmlAnchorElement,
    HtmlCanvasElement, HtmlInputElement, ProgressEvent, Url, Window,
};

use sheetboard_shared::config::HEADER_FIELD_IDS;
use sheetboard_shared::store::{load_snapshot, load_text};
use sheetboard_shared::{decode_session_file, encode_session_file, Slot, Worksheet, WorksheetFile};

use crate::config::{
    BAD_SHEET_MESSAGE, EXPORT_BLOCKED_MESSAGE, EXPORT_FILE_NAME, EXPORT_ID, LOAD_SHEET_ID,
    LOAD_SHEET_INPUT_ID, SAVE_SHEET_ID, SHEET_FILE_NAME,
};
use crate::dom::{alert, find_element};
use crate::state::{Board, Editors};
use crate::storage::LocalStore;
use crate::surface::context_2d;

pub fn download(document: &Document, href: &str, file_name: &str) -> Result<(), JsValue> {
    let anchor = document
        .create_element("a")?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| JsValue::from_str("Invalid anchor"))?;
    anchor.set_href(href);
    anchor.set_download(file_name);
    anchor.click();
    Ok(())
}

/// Paints the board over opaque white so transparent pixels do not come out
/// black in viewers.
fn composite_png(document: &Document, canvas: &HtmlCanvasElement) -> Result<String, JsValue> {
    let offscreen = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str("Invalid canvas"))?;
    offscreen.set_width(canvas.width());
    offscreen.set_height(canvas.height());
    let ctx = context_2d(&offscreen)?;
    ctx.set_fill_style_str("#ffffff");
    ctx.fill_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
    ctx.draw_image_with_html_canvas_element(canvas, 0.0, 0.0)?;
    offscreen.to_data_url_with_type("image/png")
}

pub fn export_png(window: &Window, document: &Document, board: &Board) {
    board.sync();
    let window = window.clone();
    let document = document.clone();
    let canvas = board.canvas.clone();
    board.after_settled(move || {
        let result = composite_png(&document, &canvas)
            .and_then(|url| download(&document, &url, EXPORT_FILE_NAME));
        if let Err(err) = result {
            log::warn!("export blocked: {err:?}");
            alert(&window, EXPORT_BLOCKED_MESSAGE);
        }
    });
}

/// Bundles everything persisted so far into a worksheet file.
fn snapshot_file(window: &Window, editors: &Editors) -> WorksheetFile {
    editors.flush();
    let store = LocalStore::open(window);
    WorksheetFile {
        math_text: load_text(&store, &Slot::MathText).unwrap_or_default(),
        canvas: load_snapshot(&store),
        worksheet: match &editors.document {
            Some(document) => document.collect(),
            None => Worksheet::load(&store, &HEADER_FIELD_IDS),
        },
    }
}

pub fn save_sheet(window: &Window, document: &Document, editors: &Editors) -> Result<(), JsValue> {
    let bytes = encode_session_file(&snapshot_file(window, editors));
    let parts = Array::of1(&Uint8Array::from(bytes.as_slice()));
    let options = BlobPropertyBag::new();
    options.set_type("application/octet-stream");
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;
    let result = download(document, &url, SHEET_FILE_NAME);
    let _ = Url::revoke_object_url(&url);
    log::info!("worksheet saved ({} bytes)", bytes.len());
    result
}

/// Replaces everything on the page with the contents of `file`.
pub fn apply_sheet(window: &Window, editors: &Editors, file: WorksheetFile) {
    let mut store = LocalStore::open(window);
    if let Err(err) = file.worksheet.save(&mut store) {
        log::warn!("loaded worksheet not persisted: {err}");
    }
    if let Some(document) = &editors.document {
        document.show(&file.worksheet);
    }
    if let Some(math) = &editors.math {
        math.set_text(&file.math_text);
    }
    match &editors.board {
        Some(board) => {
            board.reset();
            let loaded = file.canvas;
            match &editors.math {
                // Resize to the new content first so the drawing lands on its final extent.
                Some(math) => {
                    let board = board.clone();
                    math.render(Some(Box::new(move || {
                        if let Some(snapshot) = loaded {
                            board.load_snapshot(snapshot);
                        }
                    })));
                }
                None => {
                    if let Some(snapshot) = loaded {
                        board.load_snapshot(snapshot);
                    }
                }
            }
        }
        None => {
            if let Some(math) = &editors.math {
                math.render(None);
            }
        }
    }
}

fn read_sheet(event: &ProgressEvent) -> Option<Vec<u8>> {
    let reader: FileReader = event.target()?.dyn_into().ok()?;
    let buffer = reader.result().ok()?;
    Some(Uint8Array::new(&buffer).to_vec())
}

pub fn attach(window: &Window, document: &Document, editors: &Editors) -> Result<(), JsValue> {
    if let Some(button) = find_element::<Element>(document, EXPORT_ID) {
        let window_cb = window.clone();
        let document_cb = document.clone();
        let board = editors.board.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| match &board {
            Some(board) => export_png(&window_cb, &document_cb, board),
            None => alert(&window_cb, EXPORT_BLOCKED_MESSAGE),
        });
        button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    if let Some(button) = find_element::<Element>(document, SAVE_SHEET_ID) {
        let window_cb = window.clone();
        let document_cb = document.clone();
        let editors_cb = editors.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            if let Err(err) = save_sheet(&window_cb, &document_cb, &editors_cb) {
                log::warn!("worksheet download blocked: {err:?}");
                alert(&window_cb, EXPORT_BLOCKED_MESSAGE);
            }
        });
        button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    let Some(file_input) = find_element::<HtmlInputElement>(document, LOAD_SHEET_INPUT_ID) else {
        return Ok(());
    };
    if let Some(button) = find_element::<Element>(document, LOAD_SHEET_ID) {
        let picker = file_input.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            picker.click();
        });
        button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    let window_cb = window.clone();
    let editors_cb = Rc::new(editors.clone());
    let input_cb = file_input.clone();
    let onchange = Closure::<dyn FnMut(Event)>::new(move |_| {
        let Some(file) = input_cb.files().and_then(|list| list.get(0)) else {
            return;
        };
        // Lets the same file be picked again.
        input_cb.set_value("");
        let reader = match FileReader::new() {
            Ok(reader) => reader,
            Err(_) => return,
        };
        let window_onload = window_cb.clone();
        let editors_onload = editors_cb.clone();
        let onload = Closure::once_into_js(move |event: ProgressEvent| {
            let decoded = read_sheet(&event)
                .ok_or_else(|| "unreadable file".to_string())
                .and_then(|bytes| decode_session_file(&bytes).map_err(|err| err.to_string()));
            match decoded {
                Ok(file) => {
                    log::info!("worksheet loaded ({} page(s))", file.worksheet.pages.len());
                    apply_sheet(&window_onload, &editors_onload, file);
                }
                Err(err) => {
                    log::warn!("worksheet rejected: {err}");
                    alert(&window_onload, BAD_SHEET_MESSAGE);
                }
            }
        });
        reader.set_onload(Some(onload.unchecked_ref()));
        if let Err(err) = reader.read_as_array_buffer(&file) {
            log::warn!("worksheet read failed: {err:?}");
            alert(&window_cb, BAD_SHEET_MESSAGE);
        }
    });
    file_input.add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
    onchange.forget();
    Ok(())
}
