use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

pub const TIMEOUT_MARKER: &str = "__configurator_timeout__";

/// Resolve after `ms` milliseconds on the browser's timer queue.
pub async fn sleep(ms: u32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(w) = web::window() {
            let _ = w.set_timeout_with_callback_and_timeout_and_integer(&resolve, ms as i32);
        }
    });
    let _ = JsFuture::from(promise).await;
}

/// A promise that rejects with [`TIMEOUT_MARKER`] after `ms` milliseconds.
pub fn timeout_promise(ms: u32) -> js_sys::Promise {
    js_sys::Promise::new(&mut |_resolve, reject| {
        if let Some(w) = web::window() {
            let _ = w.set_timeout_with_callback_and_timeout_and_arguments_1(
                &reject,
                ms as i32,
                &JsValue::from_str(TIMEOUT_MARKER),
            );
        }
    })
}

#[inline]
pub fn is_timeout(reason: &JsValue) -> bool {
    reason.as_string().as_deref() == Some(TIMEOUT_MARKER)
}

/// `setInterval` handle; cleared on drop.
pub struct Interval {
    id: i32,
    _closure: Closure<dyn FnMut()>,
}

impl Interval {
    pub fn new(ms: u32, callback: impl FnMut() + 'static) -> Option<Self> {
        let window = web::window()?;
        let closure = Closure::wrap(Box::new(callback) as Box<dyn FnMut()>);
        let id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                ms as i32,
            )
            .ok()?;
        Some(Self {
            id,
            _closure: closure,
        })
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        if let Some(w) = web::window() {
            w.clear_interval_with_handle(self.id);
        }
    }
}
