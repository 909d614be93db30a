use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, HtmlElement, HtmlInputElement, HtmlSelectElement, Window,
};

use sheetboard_shared::config::SAVE_DEBOUNCE;
use sheetboard_shared::latex::{
    fill_placeholders, matrix, parse_dimension, preview_markup, Snippet,
};
use sheetboard_shared::store::{clear_slot, load_text, save_text};
use sheetboard_shared::{Slot, Tool};

use crate::config::{
    CLEAR_ALL_CONFIRM, CLEAR_ID, INSERT_BUTTON_SELECTOR, MATH_INPUT_ID, MATH_PREVIEW_ID,
    MATRIX_BUTTON_ID, MATRIX_COLS_ID, MATRIX_ROWS_ID, PRINT_BLOCKED_MESSAGE, PRINT_MATH_ID,
    QUICK_FORMULA_BUTTON_ID, QUICK_FORMULA_ID, REDO_ID, SNIPPET_BUTTON_SELECTOR, UNDO_ID,
};
use crate::dom::{alert, confirm, exec_command, find_element, method, query_all};
use crate::state::Board;
use crate::storage::LocalStore;
use crate::timer::Debouncer;

type Completion = Box<dyn FnOnce()>;

pub struct MathEditor {
    window: Window,
    document: Document,
    input: HtmlElement,
    preview: HtmlElement,
    board: Option<Rc<Board>>,
    store: RefCell<LocalStore>,
    autosave: RefCell<Option<Debouncer>>,
}

impl MathEditor {
    pub fn text(&self) -> String {
        self.input.inner_text()
    }

    pub fn set_text(&self, text: &str) {
        self.input.set_inner_text(text);
        self.save_now();
    }

    /// Mirrors the input into the preview and typesets it. Once typesetting
    /// finishes the canvas is resynced, then `then` runs.
    pub fn render(&self, then: Option<Completion>) {
        self.preview.set_text_content(Some(&preview_markup(&self.text())));
        let board = self.board.clone();
        let done: Completion = Box::new(move || {
            if let Some(board) = board {
                board.sync();
            }
            if let Some(then) = then {
                then();
            }
        });
        typeset(&self.window, &self.preview, done);
    }

    pub fn save_now(&self) {
        let text = self.text();
        if let Err(err) = save_text(&mut *self.store.borrow_mut(), &Slot::MathText, &text) {
            log::warn!("math text not saved: {err}");
        }
    }

    /// Re-render and save once typing pauses.
    pub fn schedule_autosave(&self) {
        if let Some(autosave) = self.autosave.borrow().as_ref() {
            autosave.schedule();
        }
    }

    pub fn flush(&self) {
        if let Some(autosave) = self.autosave.borrow().as_ref() {
            autosave.flush();
        }
    }

    /// Inserts `markup` at the caret through the host editing primitives.
    pub fn insert(&self, markup: &str) {
        let _ = self.input.focus();
        if !exec_command(&self.document, "insertText", Some(markup)) {
            log::debug!("insertText refused; appending instead");
            let text = self.text();
            self.input.set_inner_text(&format!("{text}{markup}"));
        }
        self.schedule_autosave();
    }

    fn drawing_tool_active(&self) -> bool {
        self.board
            .as_ref()
            .is_some_and(|board| board.tool() != Tool::None)
    }

    pub fn undo(&self) {
        match &self.board {
            Some(board) if self.drawing_tool_active() => board.undo(),
            _ => {
                let _ = self.input.focus();
                exec_command(&self.document, "undo", None);
                self.schedule_autosave();
            }
        }
    }

    pub fn redo(&self) {
        match &self.board {
            Some(board) if self.drawing_tool_active() => board.redo(),
            _ => {
                let _ = self.input.focus();
                exec_command(&self.document, "redo", None);
                self.schedule_autosave();
            }
        }
    }

    /// Empties the text, the drawing and both persisted slots.
    pub fn clear_all(&self) {
        if let Some(autosave) = self.autosave.borrow().as_ref() {
            autosave.cancel();
        }
        self.input.set_inner_text("");
        if let Some(board) = &self.board {
            board.reset();
        }
        clear_slot(&mut *self.store.borrow_mut(), &Slot::MathText);
        self.render(None);
    }

    /// Typesets, resyncs the canvas and prints once the canvas settled.
    pub fn print(&self) {
        let window = self.window.clone();
        let board = self.board.clone();
        self.render(Some(Box::new(move || match board {
            Some(board) => board.after_settled(move || print_window(&window)),
            None => print_window(&window),
        })));
    }
}

pub fn print_window(window: &Window) {
    if let Err(err) = window.print() {
        log::warn!("print refused: {err:?}");
        alert(window, PRINT_BLOCKED_MESSAGE);
    }
}

/// Drives `MathJax.typesetPromise`, falling back to the synchronous
/// `MathJax.typeset`. Without MathJax the completion runs right away.
fn typeset(window: &Window, preview: &HtmlElement, done: Completion) {
    let Some(mathjax) = Reflect::get(window.as_ref(), &JsValue::from_str("MathJax"))
        .ok()
        .filter(JsValue::is_object)
    else {
        log::debug!("MathJax not loaded; preview left as markup");
        done();
        return;
    };
    let elements = Array::of1(preview.as_ref());

    if let Some(typeset_promise) = method(&mathjax, "typesetPromise") {
        match typeset_promise
            .call1(&mathjax, &elements)
            .map(|value| value.dyn_into::<Promise>())
        {
            Ok(Ok(promise)) => {
                let done = Rc::new(RefCell::new(Some(done)));
                let ok_done = done.clone();
                let on_ok = Closure::<dyn FnMut(JsValue)>::new(move |_| {
                    if let Some(done) = ok_done.borrow_mut().take() {
                        done();
                    }
                });
                let on_err = Closure::<dyn FnMut(JsValue)>::new(move |err: JsValue| {
                    log::error!("MathJax typeset failed: {err:?}");
                    if let Some(done) = done.borrow_mut().take() {
                        done();
                    }
                });
                let _ = promise.then2(&on_ok, &on_err);
                on_ok.forget();
                on_err.forget();
            }
            Ok(Err(_)) => done(),
            Err(err) => {
                log::error!("MathJax typeset failed: {err:?}");
                done();
            }
        }
        return;
    }

    if let Some(typeset) = method(&mathjax, "typeset") {
        if let Err(err) = typeset.call1(&mathjax, &elements) {
            log::error!("MathJax typeset failed: {err:?}");
        }
    }
    done();
}

pub fn attach(
    window: &Window,
    document: &Document,
    board: Option<Rc<Board>>,
) -> Result<Option<Rc<MathEditor>>, JsValue> {
    let (Some(input), Some(preview)) = (
        find_element::<HtmlElement>(document, MATH_INPUT_ID),
        find_element::<HtmlElement>(document, MATH_PREVIEW_ID),
    ) else {
        log::warn!("no #{MATH_INPUT_ID}/#{MATH_PREVIEW_ID}; math editor disabled");
        return Ok(None);
    };

    let editor = Rc::new(MathEditor {
        window: window.clone(),
        document: document.clone(),
        input,
        preview,
        board,
        store: RefCell::new(LocalStore::open(window)),
        autosave: RefCell::new(None),
    });
    {
        let weak = Rc::downgrade(&editor);
        *editor.autosave.borrow_mut() = Some(Debouncer::new(window.clone(), SAVE_DEBOUNCE, move || {
            if let Some(editor) = weak.upgrade() {
                editor.render(None);
                editor.save_now();
            }
        }));
    }

    wire_input(&editor)?;
    wire_buttons(document, &editor)?;
    wire_inserts(document, &editor)?;
    restore(&editor);
    log::info!("math editor ready");
    Ok(Some(editor))
}

/// Saved text is typeset first; the saved drawing comes back from the
/// typeset completion so it lands on a canvas of the final size.
fn restore(editor: &Rc<MathEditor>) {
    let saved = load_text(&*editor.store.borrow(), &Slot::MathText).filter(|text| !text.is_empty());
    match saved {
        Some(text) => {
            editor.input.set_inner_text(&text);
            let board = editor.board.clone();
            editor.render(Some(Box::new(move || {
                if let Some(board) = board {
                    board.load_saved();
                }
            })));
        }
        None => {
            if let Some(board) = &editor.board {
                board.sync();
                board.load_saved();
            }
        }
    }
}

fn wire_input(editor: &Rc<MathEditor>) -> Result<(), JsValue> {
    let input_editor = editor.clone();
    let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
        input_editor.schedule_autosave();
    });
    editor
        .input
        .add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
    oninput.forget();
    Ok(())
}

fn on_click(
    target: &Element,
    editor: &Rc<MathEditor>,
    action: impl Fn(&MathEditor) + 'static,
) -> Result<(), JsValue> {
    let editor = editor.clone();
    let onclick = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        event.prevent_default();
        action(&editor);
    });
    target.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
    onclick.forget();
    Ok(())
}

fn wire_buttons(document: &Document, editor: &Rc<MathEditor>) -> Result<(), JsValue> {
    if let Some(button) = find_element::<Element>(document, UNDO_ID) {
        on_click(&button, editor, MathEditor::undo)?;
    }
    if let Some(button) = find_element::<Element>(document, REDO_ID) {
        on_click(&button, editor, MathEditor::redo)?;
    }
    if let Some(button) = find_element::<Element>(document, CLEAR_ID) {
        on_click(&button, editor, |editor| {
            if confirm(&editor.window, CLEAR_ALL_CONFIRM) {
                editor.clear_all();
            }
        })?;
    }
    if let Some(button) = find_element::<Element>(document, PRINT_MATH_ID) {
        on_click(&button, editor, MathEditor::print)?;
    }
    Ok(())
}

fn wire_inserts(document: &Document, editor: &Rc<MathEditor>) -> Result<(), JsValue> {
    let Some(body) = document.body() else {
        return Ok(());
    };
    for button in query_all(&body, INSERT_BUTTON_SELECTOR) {
        let Some(markup) = button.get_attribute("data-insert") else {
            continue;
        };
        on_click(&button, editor, move |editor| editor.insert(&markup))?;
    }
    for button in query_all(&body, SNIPPET_BUTTON_SELECTOR) {
        let Some(snippet) = button
            .get_attribute("data-snippet")
            .and_then(|name| Snippet::from_name(&name))
        else {
            log::warn!("unknown snippet button ignored");
            continue;
        };
        on_click(&button, editor, move |editor| editor.insert(snippet.markup()))?;
    }

    if let Some(button) = find_element::<Element>(document, MATRIX_BUTTON_ID) {
        let rows = find_element::<HtmlInputElement>(document, MATRIX_ROWS_ID);
        let cols = find_element::<HtmlInputElement>(document, MATRIX_COLS_ID);
        on_click(&button, editor, move |editor| {
            let value = |input: &Option<HtmlInputElement>| {
                input.as_ref().map(HtmlInputElement::value).unwrap_or_default()
            };
            let rows = parse_dimension(&value(&rows));
            let cols = parse_dimension(&value(&cols));
            editor.insert(&matrix(rows, cols));
        })?;
    }

    if let Some(select) = find_element::<HtmlSelectElement>(document, QUICK_FORMULA_ID) {
        let insert_selected = move |editor: &MathEditor, select: &HtmlSelectElement| {
            let value = select.value();
            if value.is_empty() {
                return;
            }
            editor.insert(&fill_placeholders(&value));
            select.set_selected_index(0);
        };
        {
            let change_editor = editor.clone();
            let change_select = select.clone();
            let onchange = Closure::<dyn FnMut(Event)>::new(move |_| {
                insert_selected(&change_editor, &change_select);
            });
            select.add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
            onchange.forget();
        }
        if let Some(button) = find_element::<Element>(document, QUICK_FORMULA_BUTTON_ID) {
            on_click(&button, editor, move |editor| insert_selected(editor, &select))?;
        }
    }
    Ok(())
}
