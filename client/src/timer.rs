use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

/// Trailing-edge debounce over `setTimeout`: every `schedule` restarts the
/// window and `action` runs once it elapses quietly.
pub struct Debouncer {
    window: Window,
    delay_ms: i32,
    handle: Rc<Cell<Option<i32>>>,
    action: Rc<dyn Fn()>,
    callback: Closure<dyn FnMut()>,
}

impl Debouncer {
    pub fn new(window: Window, delay: Duration, action: impl Fn() + 'static) -> Self {
        let handle = Rc::new(Cell::new(None));
        let action: Rc<dyn Fn()> = Rc::new(action);
        let callback = {
            let handle = handle.clone();
            let action = action.clone();
            Closure::<dyn FnMut()>::new(move || {
                handle.set(None);
                action();
            })
        };
        Self {
            window,
            delay_ms: delay.as_millis().min(i32::MAX as u128) as i32,
            handle,
            action,
            callback,
        }
    }

    pub fn schedule(&self) {
        self.cancel();
        match self.window.set_timeout_with_callback_and_timeout_and_arguments_0(
            self.callback.as_ref().unchecked_ref(),
            self.delay_ms,
        ) {
            Ok(id) => self.handle.set(Some(id)),
            Err(err) => {
                log::warn!("debounce timer refused, running now: {err:?}");
                (self.action)();
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Runs a pending action right away.
    pub fn flush(&self) {
        if self.is_pending() {
            self.cancel();
            (self.action)();
        }
    }

    pub fn cancel(&self) {
        if let Some(id) = self.handle.take() {
            self.window.clear_timeout_with_handle(id);
        }
    }
}
