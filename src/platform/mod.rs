//! Browser scheduling
//!
//! Two independent schedules drive the game: a `requestAnimationFrame` chain
//! for update/render and a 1000 ms interval for the countdown. Both carry a
//! shared cancellation token that every callback checks, and `cancel()` also
//! revokes the pending browser handle, so no in-flight callback can mutate
//! state after game over.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

/// Shared cancellation flag honored by every scheduled callback
#[derive(Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

type FrameClosure = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Self-rescheduling `requestAnimationFrame` loop
pub struct FrameLoop {
    token: CancelToken,
    handle: Rc<Cell<Option<i32>>>,
    _closure: FrameClosure,
}

impl FrameLoop {
    /// Start the loop; `f` receives the animation-frame timestamp (ms).
    pub fn start(mut f: impl FnMut(f64) + 'static) -> Result<Self, JsValue> {
        let token = CancelToken::new();
        let handle: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let closure: FrameClosure = Rc::new(RefCell::new(None));

        {
            let token = token.clone();
            let handle = handle.clone();
            let closure_rc = closure.clone();
            *closure.borrow_mut() = Some(Closure::new(move |time: f64| {
                if token.is_cancelled() {
                    return;
                }
                f(time);
                // The callback may have cancelled us (game over)
                if token.is_cancelled() {
                    return;
                }
                if let Some(window) = web_sys::window() {
                    let borrowed = closure_rc.borrow();
                    if let Some(cb) = borrowed.as_ref() {
                        if let Ok(id) =
                            window.request_animation_frame(cb.as_ref().unchecked_ref())
                        {
                            handle.set(Some(id));
                        }
                    }
                }
            }));
        }

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let borrowed = closure.borrow();
        let cb = borrowed.as_ref().expect("closure just installed");
        let id = window.request_animation_frame(cb.as_ref().unchecked_ref())?;
        handle.set(Some(id));
        drop(borrowed);

        Ok(Self {
            token,
            handle,
            _closure: closure,
        })
    }

    /// Unconditional cancellation: flips the token and revokes the pending
    /// frame request.
    pub fn cancel(&self) {
        self.token.cancel();
        if let Some(id) = self.handle.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Fixed-period `setInterval` schedule
pub struct IntervalTimer {
    token: CancelToken,
    handle: i32,
    _closure: Closure<dyn FnMut()>,
}

impl IntervalTimer {
    pub fn start(period_ms: i32, mut f: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let token = CancelToken::new();
        let closure = {
            let token = token.clone();
            Closure::new(move || {
                if !token.is_cancelled() {
                    f();
                }
            })
        };

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let handle = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            period_ms,
        )?;

        Ok(Self {
            token,
            handle,
            _closure: closure,
        })
    }

    pub fn cancel(&self) {
        self.token.cancel();
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(self.handle);
        }
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
