//! `<model-viewer>` adapter.
//!
//! The element's scene-graph API is reached through `js_sys::Reflect`:
//! `model.getMaterialByName`, `createTexture`, and the material's
//! `pbrMetallicRoughness` texture slots.

use crate::dom::js_error;
use crate::timers;
use configurator_core::{MaterialHandle, ModelViewer, ViewerError};
use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

#[derive(Clone)]
pub struct WebTexture(JsValue);

pub struct WebMaterial {
    name: String,
    inner: JsValue,
}

#[derive(Clone)]
pub struct ModelViewerElement {
    el: web::HtmlElement,
}

fn get(target: &JsValue, key: &str) -> Result<JsValue, JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
}

fn method(target: &JsValue, name: &str) -> Result<Function, JsValue> {
    get(target, name)?
        .dyn_into::<Function>()
        .map_err(|_| JsValue::from_str(&format!("`{name}` is not a function")))
}

fn present(v: &JsValue) -> bool {
    !(v.is_undefined() || v.is_null())
}

impl ModelViewerElement {
    pub fn new(el: web::HtmlElement) -> Self {
        Self { el }
    }

    pub fn element(&self) -> &web::HtmlElement {
        &self.el
    }

    pub fn src(&self) -> Option<String> {
        self.el.get_attribute("src")
    }

    pub fn set_src(&self, src: &str) {
        let _ = self.el.set_attribute("src", src);
    }

    /// Resolve once the element fires `load`; `error` or the timeout fail.
    /// Both listeners are removed again however the race settles.
    pub async fn wait_for_load(&self, timeout_ms: u32) -> Result<(), ViewerError> {
        let el = self.el.clone();
        let mut handlers: Option<(Function, Function)> = None;
        let loaded = Promise::new(&mut |resolve, reject| {
            let _ = el.add_event_listener_with_callback("load", &resolve);
            let _ = el.add_event_listener_with_callback("error", &reject);
            handlers = Some((resolve, reject));
        });
        let race = Promise::race(&js_sys::Array::of2(
            &loaded,
            &timers::timeout_promise(timeout_ms),
        ));
        let settled = JsFuture::from(race).await;
        if let Some((resolve, reject)) = handlers {
            let _ = el.remove_event_listener_with_callback("load", &resolve);
            let _ = el.remove_event_listener_with_callback("error", &reject);
        }
        match settled {
            Ok(_) => Ok(()),
            Err(reason) if timers::is_timeout(&reason) => Err(ViewerError::Timeout(timeout_ms)),
            Err(reason) => Err(ViewerError::Network {
                url: self.src().unwrap_or_default(),
                reason: js_error(&reason),
            }),
        }
    }

    /// `toDataURL(type)` of the current frame.
    pub fn to_data_url(&self, mime: &str) -> Result<String, ViewerError> {
        let target: &JsValue = self.el.as_ref();
        let f = method(target, "toDataURL").map_err(|e| ViewerError::Render(js_error(&e)))?;
        f.call1(target, &JsValue::from_str(mime))
            .map_err(|e| ViewerError::Render(js_error(&e)))?
            .as_string()
            .ok_or_else(|| ViewerError::Render("toDataURL returned no data".into()))
    }

    pub async fn activate_ar(&self) -> Result<(), ViewerError> {
        let target: &JsValue = self.el.as_ref();
        let f = method(target, "activateAR").map_err(|e| ViewerError::Unsupported(js_error(&e)))?;
        let ret = f
            .call0(target)
            .map_err(|e| ViewerError::Unsupported(js_error(&e)))?;
        if let Ok(p) = ret.dyn_into::<Promise>() {
            JsFuture::from(p)
                .await
                .map_err(|e| ViewerError::Unsupported(js_error(&e)))?;
        }
        Ok(())
    }
}

impl MaterialHandle for WebMaterial {
    type Texture = WebTexture;

    fn set_base_color_texture(&self, texture: &WebTexture) -> Result<(), ViewerError> {
        self.set_slot("baseColorTexture", texture)
    }

    fn set_roughness_texture(&self, texture: &WebTexture) -> Result<(), ViewerError> {
        self.set_slot("metallicRoughnessTexture", texture)
    }
}

impl WebMaterial {
    fn set_slot(&self, slot: &str, texture: &WebTexture) -> Result<(), ViewerError> {
        let render = |e: JsValue| {
            ViewerError::Render(format!("{}.{}: {}", self.name, slot, js_error(&e)))
        };
        let pbr = get(&self.inner, "pbrMetallicRoughness").map_err(render)?;
        let info = get(&pbr, slot).map_err(render)?;
        let set = method(&info, "setTexture").map_err(render)?;
        set.call1(&info, &texture.0).map_err(render)?;
        Ok(())
    }
}

impl ModelViewer for ModelViewerElement {
    type Texture = WebTexture;
    type Material = WebMaterial;

    fn material_by_name(&self, name: &str) -> Option<WebMaterial> {
        let model = get(self.el.as_ref(), "model").ok().filter(present)?;
        let lookup = method(&model, "getMaterialByName").ok()?;
        let inner = lookup
            .call1(&model, &JsValue::from_str(name))
            .ok()
            .filter(present)?;
        Some(WebMaterial {
            name: name.to_string(),
            inner,
        })
    }

    async fn create_texture(&self, url: &str) -> Result<WebTexture, ViewerError> {
        let network = |e: JsValue| ViewerError::Network {
            url: url.to_string(),
            reason: js_error(&e),
        };
        let target: &JsValue = self.el.as_ref();
        let create = method(target, "createTexture").map_err(network)?;
        let pending = create
            .call1(target, &JsValue::from_str(url))
            .map_err(network)?
            .dyn_into::<Promise>()
            .map_err(network)?;
        let texture = JsFuture::from(pending).await.map_err(network)?;
        log::debug!("[viewer] texture ready: {}", url);
        Ok(WebTexture(texture))
    }

    fn set_auto_rotate(&self, enabled: bool) {
        let _ = if enabled {
            self.el.set_attribute("auto-rotate", "")
        } else {
            self.el.remove_attribute("auto-rotate")
        };
    }

    fn set_background(&self, background: &str) {
        let _ = self.el.style().set_property("background", background);
    }
}
