use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use sheetboard_shared::{DecodeError, Extent, Point, RestoreTicket, Snapshot, StrokeStyle, Surface};

pub type RestoreCallback = Rc<dyn Fn(RestoreTicket, Result<HtmlImageElement, DecodeError>)>;

/// Where image decode completions are delivered. Connected once the session
/// that owns the surface exists.
#[derive(Clone, Default)]
pub struct RestoreSink(Rc<RefCell<Option<RestoreCallback>>>);

impl RestoreSink {
    pub fn connect(&self, callback: RestoreCallback) {
        *self.0.borrow_mut() = Some(callback);
    }

    fn deliver(&self, ticket: RestoreTicket, result: Result<HtmlImageElement, DecodeError>) {
        let callback = self.0.borrow().clone();
        match callback {
            Some(callback) => callback(ticket, result),
            None => log::warn!("decode for {ticket:?} finished before the board was ready"),
        }
    }
}

pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("Invalid 2d context"))
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    sink: RestoreSink,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement, sink: RestoreSink) -> Result<Self, JsValue> {
        let ctx = context_2d(&canvas)?;
        Ok(Self { canvas, ctx, sink })
    }
}

impl Surface for CanvasSurface {
    type Decoded = HtmlImageElement;

    fn extent(&self) -> Extent {
        Extent::new(self.canvas.width(), self.canvas.height())
    }

    fn set_extent(&mut self, extent: Extent) {
        self.canvas.set_width(extent.width);
        self.canvas.set_height(extent.height);
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
    }

    fn capture(&self) -> Option<Snapshot> {
        let url = match self.canvas.to_data_url() {
            Ok(url) => url,
            Err(err) => {
                log::warn!("canvas capture refused: {err:?}");
                return None;
            }
        };
        // A zero-sized canvas encodes as a bare "data:,".
        Snapshot::from_data_url(url).ok()
    }

    fn begin_path(&mut self, at: Point) {
        self.ctx.begin_path();
        self.ctx.move_to(at.x, at.y);
    }

    fn move_to(&mut self, at: Point) {
        self.ctx.move_to(at.x, at.y);
    }

    fn line_to(&mut self, to: Point) {
        self.ctx.line_to(to.x, to.y);
    }

    fn stroke(&mut self, style: &StrokeStyle) {
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
        self.ctx.set_stroke_style_str(&style.color);
        self.ctx.set_line_width(style.width);
        self.ctx.set_global_alpha(style.opacity);
        self.ctx.stroke();
        self.ctx.set_global_alpha(1.0);
    }

    fn begin_restore(
        &mut self,
        snapshot: &Snapshot,
        ticket: RestoreTicket,
    ) -> Result<(), DecodeError> {
        let image = HtmlImageElement::new()
            .map_err(|err| DecodeError::Unavailable(format!("{err:?}")))?;

        let onload_sink = self.sink.clone();
        let onload_image = image.clone();
        let onload = Closure::once_into_js(move || {
            onload_image.set_onload(None);
            onload_image.set_onerror(None);
            onload_sink.deliver(ticket, Ok(onload_image));
        });

        let onerror_sink = self.sink.clone();
        let onerror_image = image.clone();
        let onerror = Closure::once_into_js(move || {
            onerror_image.set_onload(None);
            onerror_image.set_onerror(None);
            onerror_sink.deliver(ticket, Err(DecodeError::Rejected));
        });

        image.set_onload(Some(onload.unchecked_ref()));
        image.set_onerror(Some(onerror.unchecked_ref()));
        image.set_src(snapshot.as_data_url());
        Ok(())
    }

    fn draw_decoded(&mut self, decoded: &HtmlImageElement) {
        self.clear();
        if let Err(err) = self
            .ctx
            .draw_image_with_html_image_element(decoded, 0.0, 0.0)
        {
            log::warn!("decoded snapshot not drawn: {err:?}");
        }
    }
}
