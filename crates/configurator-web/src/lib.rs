#![cfg(target_arch = "wasm32")]
mod app;
mod capture;
mod dom;
mod format;
mod host;
mod input;
mod timers;
mod ui;
mod viewer;

use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("configurator-web loaded");
    Ok(())
}

/// Boot the configurator against the page's `<model-viewer>` element.
#[wasm_bindgen]
pub async fn mount() -> Result<Configurator, JsValue> {
    match app::boot().await {
        Ok(app) => Ok(Configurator { app }),
        Err(e) => {
            log::error!("init error: {:#}", e);
            Err(JsValue::from_str(&format!("{e:#}")))
        }
    }
}

/// Handle returned to the host page.
#[wasm_bindgen]
pub struct Configurator {
    app: Rc<app::AppContext>,
}

#[wasm_bindgen]
impl Configurator {
    /// Current selection as `{color, strap, environment}`.
    pub fn state(&self) -> JsValue {
        serde_json::to_string(&self.app.state())
            .ok()
            .and_then(|s| js_sys::JSON::parse(&s).ok())
            .unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = selectColor)]
    pub fn select_color(&self, id: String) {
        let binder = self.app.binder.clone();
        spawn_local(async move { binder.change_color(&id).await });
    }

    #[wasm_bindgen(js_name = selectStrap)]
    pub fn select_strap(&self, id: String) {
        let binder = self.app.binder.clone();
        spawn_local(async move { binder.change_strap(&id).await });
    }

    #[wasm_bindgen(js_name = selectEnvironment)]
    pub fn select_environment(&self, id: String) {
        self.app.binder.change_environment(&id);
    }

    pub fn reset(&self) {
        let binder = self.app.binder.clone();
        spawn_local(async move { binder.reset().await });
    }

    #[wasm_bindgen(js_name = shareUrl)]
    pub fn share_url(&self) -> Option<String> {
        self.app.share_url()
    }

    pub fn screenshot(&self) -> Option<String> {
        self.app.screenshot()
    }

    #[wasm_bindgen(js_name = activateAr)]
    pub fn activate_ar(&self) {
        let app = self.app.clone();
        spawn_local(async move { capture::activate_ar(&app.viewer, &app.ctx).await });
    }

    pub fn destroy(&self) {
        self.app.destroy();
    }
}
