use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlCanvasElement, HtmlInputElement, Window};

use sheetboard_shared::config::{
    PLOT_BOUNDS, PLOT_LINE_COLOR, PLOT_LINE_WIDTH, PLOT_POINT_COLOR, PLOT_POINT_SIZE,
    PLOT_POINT_STROKE,
};
use sheetboard_shared::plot::{LineChange, PlotError, PlotPoint, PointPlot};

use crate::config::{
    ADD_POINT_ID, CAPTURE_PLOT_ID, EXPORT_BLOCKED_MESSAGE, INVALID_POINT_MESSAGE,
    PLOT_BOX_ID, PLOT_CANVAS_MISSING_MESSAGE, PLOT_FILE_NAME, PLOT_X_ID, PLOT_Y_ID,
    RESET_PLOT_ID, TOGGLE_LINE_ID, TOO_FEW_POINTS_MESSAGE,
};
use crate::dom::{alert, find_element, method};
use crate::export::download;

/// The JSXGraph board in `#box` and the points placed on it.
pub struct Plotter {
    window: Window,
    document: Document,
    x_input: Option<HtmlInputElement>,
    y_input: Option<HtmlInputElement>,
    /// `JXG.JSXGraph`, which creates and frees boards.
    engine: JsValue,
    board: RefCell<JsValue>,
    points: RefCell<Vec<JsValue>>,
    line: RefCell<Option<JsValue>>,
    plot: RefCell<PointPlot>,
}

fn object(entries: &[(&str, JsValue)]) -> Result<Object, JsValue> {
    let object = Object::new();
    for (key, value) in entries {
        Reflect::set(&object, &JsValue::from_str(key), value)?;
    }
    Ok(object)
}

fn call(target: &JsValue, name: &str, args: &Array) -> Result<JsValue, JsValue> {
    let function = method(target, name)
        .ok_or_else(|| JsValue::from_str(&format!("JSXGraph has no {name}")))?;
    function.apply(target, args)
}

// Rendered to a canvas rather than SVG so the board can be captured as PNG.
fn board_options() -> Result<Object, JsValue> {
    let [left, top, right, bottom] = PLOT_BOUNDS;
    let bounds = Array::of4(&left.into(), &top.into(), &right.into(), &bottom.into());
    let pan = object(&[("enabled", true.into()), ("needShift", false.into())])?;
    let zoom = object(&[("wheel", true.into())])?;
    object(&[
        ("boundingbox", bounds.into()),
        ("axis", true.into()),
        ("grid", true.into()),
        ("showCopyright", false.into()),
        ("keepaspectratio", true.into()),
        ("renderer", "canvas".into()),
        ("pan", pan.into()),
        ("zoom", zoom.into()),
    ])
}

fn init_board(engine: &JsValue) -> Result<JsValue, JsValue> {
    let args = Array::of2(&PLOT_BOX_ID.into(), &board_options()?.into());
    call(engine, "initBoard", &args)
}

fn input_value(input: &Option<HtmlInputElement>) -> String {
    input.as_ref().map(HtmlInputElement::value).unwrap_or_default()
}

impl Plotter {
    fn create(&self, kind: &str, parents: &Array, attributes: Object) -> Result<JsValue, JsValue> {
        let board = self.board.borrow();
        call(&board, "create", &Array::of3(&kind.into(), parents, &attributes))
    }

    fn draw_point(&self, point: PlotPoint) -> Result<JsValue, JsValue> {
        let attributes = object(&[
            ("name", point.label().into()),
            ("size", PLOT_POINT_SIZE.into()),
            ("color", PLOT_POINT_COLOR.into()),
            ("strokeColor", PLOT_POINT_STROKE.into()),
            ("fixed", false.into()),
        ])?;
        self.create("point", &Array::of2(&point.x.into(), &point.y.into()), attributes)
    }

    /// Joins the placed points in entry order. The polyline follows the
    /// point elements, so dragging a point bends it.
    fn draw_line(&self) -> Result<(), JsValue> {
        let vertices = self.points.borrow().iter().collect::<Array>();
        let attributes = object(&[
            ("strokeColor", PLOT_LINE_COLOR.into()),
            ("strokeWidth", PLOT_LINE_WIDTH.into()),
        ])?;
        let line = self.create("polyline", &vertices, attributes)?;
        *self.line.borrow_mut() = Some(line);
        Ok(())
    }

    fn remove_line(&self) -> Result<(), JsValue> {
        let Some(line) = self.line.borrow_mut().take() else {
            return Ok(());
        };
        let board = self.board.borrow();
        call(&board, "removeObject", &Array::of1(&line)).map(drop)
    }

    pub fn add_point(&self) {
        let added = self
            .plot
            .borrow_mut()
            .add(&input_value(&self.x_input), &input_value(&self.y_input));
        let point = match added {
            Ok(point) => point,
            Err(err) => {
                log::debug!("point rejected: {err}");
                alert(&self.window, INVALID_POINT_MESSAGE);
                return;
            }
        };
        let drawn = self.draw_point(point).and_then(|element| {
            self.points.borrow_mut().push(element);
            if self.plot.borrow().is_joined() {
                self.remove_line()?;
                self.draw_line()?;
            }
            Ok(())
        });
        if let Err(err) = drawn {
            log::warn!("point {} not drawn: {err:?}", point.label());
        }

        for input in [&self.x_input, &self.y_input].into_iter().flatten() {
            input.set_value("");
        }
        if let Some(x_input) = &self.x_input {
            let _ = x_input.focus();
        }
    }

    pub fn toggle_line(&self) {
        let change = self.plot.borrow_mut().toggle_line();
        let result = match change {
            Ok(LineChange::Joined) => self.draw_line(),
            Ok(LineChange::Split) => self.remove_line(),
            Err(PlotError::TooFewPoints) => {
                alert(&self.window, TOO_FEW_POINTS_MESSAGE);
                Ok(())
            }
            Err(err) => {
                log::warn!("line toggle refused: {err}");
                Ok(())
            }
        };
        if let Err(err) = result {
            log::warn!("line not updated: {err:?}");
        }
    }

    /// Downloads the board as a PNG.
    pub fn capture(&self) {
        let canvas = self
            .document
            .query_selector(&format!("#{PLOT_BOX_ID} canvas"))
            .ok()
            .flatten()
            .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok());
        let Some(canvas) = canvas else {
            alert(&self.window, PLOT_CANVAS_MISSING_MESSAGE);
            return;
        };
        let result = canvas
            .to_data_url_with_type("image/png")
            .and_then(|url| download(&self.document, &url, PLOT_FILE_NAME));
        if let Err(err) = result {
            log::warn!("plot capture blocked: {err:?}");
            alert(&self.window, EXPORT_BLOCKED_MESSAGE);
        }
    }

    /// Frees the board and starts an empty one in its place.
    pub fn reset(&self) {
        let board = self.board.borrow().clone();
        if let Err(err) = call(&self.engine, "freeBoard", &Array::of1(&board)) {
            log::warn!("plot board not freed: {err:?}");
        }
        self.points.borrow_mut().clear();
        self.line.borrow_mut().take();
        self.plot.borrow_mut().reset();
        match init_board(&self.engine) {
            Ok(board) => *self.board.borrow_mut() = board,
            Err(err) => log::error!("plot board not recreated: {err:?}"),
        }
    }
}

fn on_click(
    document: &Document,
    id: &str,
    plotter: &Rc<Plotter>,
    action: impl Fn(&Plotter) + 'static,
) -> Result<(), JsValue> {
    let Some(button) = find_element::<Element>(document, id) else {
        return Ok(());
    };
    let plotter = plotter.clone();
    let onclick = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        event.prevent_default();
        action(&plotter);
    });
    button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
    onclick.forget();
    Ok(())
}

/// Starts the plotter when the page has a `#box` container and JSXGraph is
/// loaded.
pub fn attach(window: &Window, document: &Document) -> Result<Option<Rc<Plotter>>, JsValue> {
    if find_element::<Element>(document, PLOT_BOX_ID).is_none() {
        log::debug!("no #{PLOT_BOX_ID}; plotter disabled");
        return Ok(None);
    }
    let engine = Reflect::get(window.as_ref(), &JsValue::from_str("JXG"))
        .ok()
        .filter(JsValue::is_object)
        .and_then(|jxg| Reflect::get(&jxg, &JsValue::from_str("JSXGraph")).ok())
        .filter(JsValue::is_object);
    let Some(engine) = engine else {
        log::warn!("JSXGraph not loaded; plotter disabled");
        return Ok(None);
    };
    let board = match init_board(&engine) {
        Ok(board) => board,
        Err(err) => {
            log::warn!("plot board not created: {err:?}");
            return Ok(None);
        }
    };

    let plotter = Rc::new(Plotter {
        window: window.clone(),
        document: document.clone(),
        x_input: find_element::<HtmlInputElement>(document, PLOT_X_ID),
        y_input: find_element::<HtmlInputElement>(document, PLOT_Y_ID),
        engine,
        board: RefCell::new(board),
        points: RefCell::new(Vec::new()),
        line: RefCell::new(None),
        plot: RefCell::new(PointPlot::new()),
    });
    on_click(document, ADD_POINT_ID, &plotter, Plotter::add_point)?;
    on_click(document, TOGGLE_LINE_ID, &plotter, Plotter::toggle_line)?;
    on_click(document, CAPTURE_PLOT_ID, &plotter, Plotter::capture)?;
    on_click(document, RESET_PLOT_ID, &plotter, Plotter::reset)?;
    log::info!("plotter ready");
    Ok(Some(plotter))
}
