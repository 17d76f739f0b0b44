use configurator_core::ViewerError;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

/// Render a `JsValue` error for logs and error details.
pub fn js_error(e: &JsValue) -> String {
    e.as_string()
        .or_else(|| {
            e.dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{e:?}"))
}

/// GET `path` as text. Transport and HTTP failures are network errors.
pub async fn fetch_text(path: &str) -> Result<String, ViewerError> {
    let fail = |reason: String| ViewerError::Network {
        url: path.to_string(),
        reason,
    };
    let window = web::window().ok_or_else(|| fail("no window".into()))?;
    let resp = JsFuture::from(window.fetch_with_str(path))
        .await
        .map_err(|e| fail(js_error(&e)))?;
    let resp: web::Response = resp
        .dyn_into()
        .map_err(|_| fail("not a Response".into()))?;
    if !resp.ok() {
        return Err(fail(format!("HTTP {}", resp.status())));
    }
    let text = resp.text().map_err(|e| fail(js_error(&e)))?;
    let text = JsFuture::from(text)
        .await
        .map_err(|e| fail(js_error(&e)))?;
    text.as_string()
        .ok_or_else(|| fail("body is not text".into()))
}

#[inline]
pub fn set_class(el: &web::Element, class: &str, on: bool) {
    let list = el.class_list();
    let _ = if on { list.add_1(class) } else { list.remove_1(class) };
}

pub fn show(el: &web::Element, visible: bool) {
    if visible {
        let _ = el.remove_attribute("hidden");
    } else {
        let _ = el.set_attribute("hidden", "");
    }
}

type Handler = Closure<dyn FnMut(web::Event)>;

/// DOM listeners added by the app, kept so they can be removed again.
#[derive(Default)]
pub struct Listeners {
    entries: Vec<(web::EventTarget, &'static str, Handler)>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen(
        &mut self,
        target: &web::EventTarget,
        event: &'static str,
        handler: impl FnMut(web::Event) + 'static,
    ) {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web::Event)>);
        if target
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .is_ok()
        {
            self.entries.push((target.clone(), event, closure));
        }
    }

    /// Click handler on `#id`; silently skipped when the element is absent.
    pub fn on_click(
        &mut self,
        document: &web::Document,
        element_id: &str,
        mut handler: impl FnMut() + 'static,
    ) {
        if let Some(el) = document.get_element_by_id(element_id) {
            self.listen(&el, "click", move |_| handler());
        }
    }

    pub fn clear(&mut self) {
        for (target, event, closure) in self.entries.drain(..) {
            let _ = target
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
    }
}

impl Drop for Listeners {
    fn drop(&mut self) {
        self.clear();
    }
}
