use crate::format::scene_viewer_available;
use configurator_core::{ArFlags, HostInfo};
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

fn quick_look_supported(document: &web::Document) -> bool {
    document
        .create_element("a")
        .ok()
        .and_then(|a| a.dyn_into::<web::HtmlAnchorElement>().ok())
        .and_then(|a| a.rel_list().supports("ar").ok())
        .unwrap_or(false)
}

fn webxr_present(navigator: &web::Navigator) -> bool {
    js_sys::Reflect::get(navigator, &JsValue::from_str("xr"))
        .map(|xr| !(xr.is_undefined() || xr.is_null()))
        .unwrap_or(false)
}

/// Fresh snapshot of the browser environment. Cheap; taken on every query.
pub fn probe(window: &web::Window) -> HostInfo {
    let navigator = window.navigator();
    let location = window.location();
    let user_agent = navigator.user_agent().unwrap_or_default();
    let quick_look = window
        .document()
        .map(|d| quick_look_supported(&d))
        .unwrap_or(false);

    HostInfo {
        viewport_width: window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0),
        viewport_height: window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0),
        max_touch_points: navigator.max_touch_points().max(0) as u32,
        protocol: location.protocol().unwrap_or_default(),
        hostname: location.hostname().unwrap_or_default(),
        ar: ArFlags {
            quick_look,
            scene_viewer: scene_viewer_available(&user_agent),
            webxr: webxr_present(&navigator),
        },
        user_agent,
    }
}
