use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, HtmlElement, HtmlInputElement, HtmlSelectElement, Window,
};

use sheetboard_shared::config::{HEADER_FIELD_IDS, SAVE_DEBOUNCE};
use sheetboard_shared::Worksheet;

use crate::config::{
    ADD_PAGE_ID, ADD_PARTICIPANT_ID, CLEAR_CONTENT_ID, CLEAR_PAGES_CONFIRM, DELETE_PAGE_CONFIRM,
    PAGES_CONTAINER_ID, PARTICIPANTS_LIST_ID, PRINT_ID, REDO_ID, SELECT_ALL_ID, UNDO_ID,
};
use crate::dom::{confirm, exec_command, find_element, query_all};
use crate::math::print_window;
use crate::storage::LocalStore;
use crate::timer::Debouncer;

const PAGE_CLASS: &str = "page-block";
const PAGE_CONTENT_CLASS: &str = "editable-content";
const DELETE_PAGE_CLASS: &str = "delete-page-btn";
const PARTICIPANT_CLASS: &str = "participant-input";
const REMOVE_PARTICIPANT_CLASS: &str = "remove-participant-btn";
const PAGE_PLACEHOLDER: &str = "Write or paste the content of this page here...";
const PARTICIPANT_PLACEHOLDER: &str = "Team member name";

/// Header inputs may be plain text inputs or drop-downs.
enum HeaderField {
    Input(HtmlInputElement),
    Select(HtmlSelectElement),
}

impl HeaderField {
    fn find(document: &Document, id: &str) -> Option<Self> {
        let element = document.get_element_by_id(id)?;
        match element.dyn_into::<HtmlInputElement>() {
            Ok(input) => Some(HeaderField::Input(input)),
            Err(element) => element.dyn_into::<HtmlSelectElement>().ok().map(HeaderField::Select),
        }
    }

    fn element(&self) -> &Element {
        match self {
            HeaderField::Input(input) => input,
            HeaderField::Select(select) => select,
        }
    }

    fn value(&self) -> String {
        match self {
            HeaderField::Input(input) => input.value(),
            HeaderField::Select(select) => select.value(),
        }
    }

    fn set_value(&self, value: &str) {
        match self {
            HeaderField::Input(input) => input.set_value(value),
            HeaderField::Select(select) => select.set_value(value),
        }
    }
}

pub struct DocumentEditor {
    window: Window,
    document: Document,
    pages: HtmlElement,
    participants: HtmlElement,
    header: Vec<(&'static str, HeaderField)>,
    store: RefCell<LocalStore>,
    autosave: RefCell<Option<Debouncer>>,
}

impl DocumentEditor {
    /// Reads the worksheet back out of the DOM.
    pub fn collect(&self) -> Worksheet {
        let mut worksheet = Worksheet::default();
        for (id, field) in &self.header {
            worksheet.set_header(id, &field.value());
        }
        worksheet.pages = query_all(&self.pages, &format!(".{PAGE_CONTENT_CLASS}"))
            .iter()
            .map(Element::inner_html)
            .collect();
        worksheet.participants = query_all(&self.participants, "input[type=\"text\"]")
            .into_iter()
            .filter_map(|element| element.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value())
            .collect();
        worksheet
    }

    /// Replaces the DOM with `worksheet`. Header fields absent from it keep
    /// their current value.
    pub fn show(&self, worksheet: &Worksheet) {
        for (id, field) in &self.header {
            if let Some(value) = worksheet.header.get(*id) {
                field.set_value(value);
            }
        }
        self.show_pages(worksheet, None);
        self.show_participants(worksheet, None);
    }

    fn show_pages(&self, worksheet: &Worksheet, focus: Option<usize>) {
        self.pages.set_inner_html("");
        for (index, html) in worksheet.pages.iter().enumerate() {
            self.append_page(html, focus == Some(index));
        }
    }

    fn show_participants(&self, worksheet: &Worksheet, focus: Option<usize>) {
        self.participants.set_inner_html("");
        for (index, name) in worksheet.participants.iter().enumerate() {
            self.append_participant(name, focus == Some(index));
        }
    }

    pub fn save_now(&self) {
        self.save(&self.collect());
    }

    fn save(&self, worksheet: &Worksheet) {
        if let Err(err) = worksheet.save(&mut *self.store.borrow_mut()) {
            log::warn!("worksheet not saved: {err}");
        }
    }

    pub fn schedule_save(&self) {
        if let Some(autosave) = self.autosave.borrow().as_ref() {
            autosave.schedule();
        }
    }

    pub fn flush(&self) {
        if let Some(autosave) = self.autosave.borrow().as_ref() {
            autosave.flush();
        }
    }

    fn append_page(&self, html: &str, focus: bool) {
        let Ok(block) = self.document.create_element("div") else {
            return;
        };
        block.set_class_name(PAGE_CLASS);

        if let Ok(delete) = self.document.create_element("button") {
            delete.set_class_name(DELETE_PAGE_CLASS);
            delete.set_text_content(Some("Delete page"));
            let _ = delete.set_attribute("type", "button");
            let _ = block.append_child(&delete);
        }

        let Some(content) = self
            .document
            .create_element("div")
            .ok()
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        content.set_class_name(PAGE_CONTENT_CLASS);
        content.set_content_editable("true");
        let _ = content.set_attribute("placeholder", PAGE_PLACEHOLDER);
        content.set_inner_html(html);
        let _ = block.append_child(&content);
        let _ = self.pages.append_child(&block);
        if focus {
            let _ = content.focus();
        }
    }

    fn append_participant(&self, name: &str, focus: bool) {
        let Ok(row) = self.document.create_element("div") else {
            return;
        };
        row.set_class_name(PARTICIPANT_CLASS);

        let Some(input) = self
            .document
            .create_element("input")
            .ok()
            .and_then(|element| element.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        input.set_type("text");
        input.set_name("participante");
        input.set_placeholder(PARTICIPANT_PLACEHOLDER);
        input.set_value(name);
        let _ = row.append_child(&input);

        if let Ok(remove) = self.document.create_element("button") {
            remove.set_class_name(&format!("modern-btn {REMOVE_PARTICIPANT_CLASS}"));
            remove.set_text_content(Some("x"));
            let _ = remove.set_attribute("type", "button");
            let _ = row.append_child(&remove);
        }
        let _ = self.participants.append_child(&row);
        if focus {
            let _ = input.focus();
        }
    }

    pub fn new_page(&self) {
        let mut worksheet = self.collect();
        let index = worksheet.add_page("");
        self.show_pages(&worksheet, Some(index));
        self.save(&worksheet);
    }

    pub fn new_participant(&self) {
        let mut worksheet = self.collect();
        let index = worksheet.add_participant("");
        self.show_participants(&worksheet, Some(index));
        self.save(&worksheet);
    }

    /// Clicks inside the page list: delete buttons remove their page.
    fn on_pages_click(&self, target: &Element) {
        let Some(index) = row_index(&self.pages, target, DELETE_PAGE_CLASS, PAGE_CLASS) else {
            return;
        };
        if !confirm(&self.window, DELETE_PAGE_CONFIRM) {
            return;
        }
        let mut worksheet = self.collect();
        if worksheet.remove_page(index) {
            self.show_pages(&worksheet, None);
            self.save(&worksheet);
        }
    }

    fn on_participants_click(&self, target: &Element) {
        let Some(index) = row_index(
            &self.participants,
            target,
            REMOVE_PARTICIPANT_CLASS,
            PARTICIPANT_CLASS,
        ) else {
            return;
        };
        let mut worksheet = self.collect();
        if worksheet.remove_participant(index) {
            self.show_participants(&worksheet, None);
            self.save(&worksheet);
        }
    }

    pub fn clear_pages(&self) {
        let mut worksheet = self.collect();
        worksheet.clear_pages();
        self.show_pages(&worksheet, Some(0));
        self.save(&worksheet);
    }
}

fn closest(target: &Element, selector: &str) -> Option<Element> {
    target.closest(selector).ok().flatten()
}

/// Position within `list` of the row whose `button_class` button was hit.
fn row_index(
    list: &HtmlElement,
    target: &Element,
    button_class: &str,
    row_class: &str,
) -> Option<usize> {
    let row = closest(target, &format!(".{button_class}"))?.parent_element()?;
    query_all(list, &format!(".{row_class}"))
        .iter()
        .position(|candidate| *candidate == row)
}

fn event_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

pub fn attach(
    window: &Window,
    document: &Document,
    wire_history_buttons: bool,
) -> Result<Option<Rc<DocumentEditor>>, JsValue> {
    let (Some(pages), Some(participants)) = (
        find_element::<HtmlElement>(document, PAGES_CONTAINER_ID),
        find_element::<HtmlElement>(document, PARTICIPANTS_LIST_ID),
    ) else {
        log::warn!("no #{PAGES_CONTAINER_ID}/#{PARTICIPANTS_LIST_ID}; document editor disabled");
        return Ok(None);
    };
    let header = HEADER_FIELD_IDS
        .iter()
        .filter_map(|id| HeaderField::find(document, id).map(|field| (*id, field)))
        .collect();

    let store = LocalStore::open(window);
    let editor = Rc::new(DocumentEditor {
        window: window.clone(),
        document: document.clone(),
        pages,
        participants,
        header,
        store: RefCell::new(store),
        autosave: RefCell::new(None),
    });
    {
        let weak = Rc::downgrade(&editor);
        *editor.autosave.borrow_mut() = Some(Debouncer::new(window.clone(), SAVE_DEBOUNCE, move || {
            if let Some(editor) = weak.upgrade() {
                editor.save_now();
            }
        }));
    }

    let ids: Vec<&str> = editor.header.iter().map(|(id, _)| *id).collect();
    let saved = Worksheet::load(&*editor.store.borrow(), &ids);
    editor.show(&saved);

    wire_lists(&editor)?;
    wire_header(&editor)?;
    wire_toolbar(document, &editor, wire_history_buttons)?;
    log::info!(
        "document editor ready: {} page(s), {} participant(s)",
        saved.pages.len(),
        saved.participants.len()
    );
    Ok(Some(editor))
}

fn listen(
    target: &Element,
    kind: &str,
    editor: &Rc<DocumentEditor>,
    action: impl Fn(&DocumentEditor, &Event) + 'static,
) -> Result<(), JsValue> {
    let editor = editor.clone();
    let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        action(&editor, &event);
    });
    target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
    callback.forget();
    Ok(())
}

// Pages and participants are created and destroyed at runtime, so their
// events are handled on the containers.
fn wire_lists(editor: &Rc<DocumentEditor>) -> Result<(), JsValue> {
    let pages: &Element = &editor.pages;
    let participants: &Element = &editor.participants;
    listen(pages, "input", editor, |editor, _| editor.schedule_save())?;
    listen(pages, "click", editor, |editor, event| {
        if let Some(target) = event_element(event) {
            editor.on_pages_click(&target);
        }
    })?;
    listen(participants, "input", editor, |editor, _| editor.schedule_save())?;
    listen(participants, "click", editor, |editor, event| {
        if let Some(target) = event_element(event) {
            if closest(&target, &format!(".{REMOVE_PARTICIPANT_CLASS}")).is_some() {
                event.prevent_default();
            }
            editor.on_participants_click(&target);
        }
    })?;
    Ok(())
}

fn wire_header(editor: &Rc<DocumentEditor>) -> Result<(), JsValue> {
    for (_, field) in &editor.header {
        listen(field.element(), "input", editor, |editor, _| editor.schedule_save())?;
        listen(field.element(), "change", editor, |editor, _| editor.schedule_save())?;
    }
    Ok(())
}

fn wire_toolbar(
    document: &Document,
    editor: &Rc<DocumentEditor>,
    wire_history_buttons: bool,
) -> Result<(), JsValue> {
    let button = |id: &str| find_element::<Element>(document, id);

    if let Some(add) = button(ADD_PAGE_ID) {
        listen(&add, "click", editor, |editor, event| {
            event.prevent_default();
            editor.new_page();
        })?;
    }
    if let Some(add) = button(ADD_PARTICIPANT_ID) {
        listen(&add, "click", editor, |editor, event| {
            event.prevent_default();
            editor.new_participant();
        })?;
    }
    if let Some(clear) = button(CLEAR_CONTENT_ID) {
        listen(&clear, "click", editor, |editor, _| {
            if confirm(&editor.window, CLEAR_PAGES_CONFIRM) {
                editor.clear_pages();
            }
        })?;
    }
    if let Some(select_all) = button(SELECT_ALL_ID) {
        listen(&select_all, "click", editor, |editor, _| {
            exec_command(&editor.document, "selectAll", None);
        })?;
    }
    if wire_history_buttons {
        if let Some(undo) = button(UNDO_ID) {
            listen(&undo, "click", editor, |editor, _| {
                exec_command(&editor.document, "undo", None);
            })?;
        }
        if let Some(redo) = button(REDO_ID) {
            listen(&redo, "click", editor, |editor, _| {
                exec_command(&editor.document, "redo", None);
            })?;
        }
    }
    if let Some(print) = button(PRINT_ID) {
        listen(&print, "click", editor, |editor, _| {
            editor.flush();
            print_window(&editor.window);
        })?;
    }
    Ok(())
}
