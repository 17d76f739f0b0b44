//! Startup orchestration and teardown.
//!
//! Everything the page session owns lives in one [`AppContext`]; nothing is
//! stored in globals, so a host page can mount, destroy and mount again.

use crate::capture;
use crate::dom::{self, Listeners};
use crate::format;
use crate::host;
use crate::input::{self, IdleWiring};
use crate::timers::{self, Interval};
use crate::ui::Widgets;
use crate::viewer::ModelViewerElement;
use anyhow::anyhow;
use configurator_core::{
    check_ar_support, classify_device_with_override, ArSupport, Binder, Clock, Configuration,
    ConfigLoadError, ConfiguratorEvent, Context, DeviceClass, EventBus, SelectionState, UrlParams,
    MODEL_LOAD_TIMEOUT_MS,
};
use instant::Instant;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

pub type WebBinder = Binder<ModelViewerElement>;

pub const VIEWER_SELECTOR: &str = "model-viewer";
pub const SCREENSHOT_BUTTON: &str = "screenshot-button";
pub const AR_BUTTON: &str = "ar-button";
pub const SHARE_BUTTON: &str = "share-button";
pub const RESET_BUTTON: &str = "reset-button";
const SCREENSHOT_FILE: &str = "configuration.png";

pub struct AppContext {
    pub window: web::Window,
    pub document: web::Document,
    pub viewer: ModelViewerElement,
    pub binder: Rc<WebBinder>,
    pub ctx: Context,
    pub device: DeviceClass,
    pub ar: ArSupport,
    pub params: UrlParams,
    listeners: RefCell<Listeners>,
    idle: RefCell<Option<Interval>>,
    widgets: RefCell<Option<Widgets>>,
    destroyed: Cell<bool>,
}

/// Mirror every bus event onto the viewer element as a bubbling
/// `configurator:<name>` `CustomEvent` whose `detail` is the payload.
fn bridge_to_dom(bus: &EventBus, target: web::HtmlElement) {
    bus.subscribe(move |event| {
        let detail = js_sys::JSON::parse(&event.detail_json()).unwrap_or(JsValue::NULL);
        let init = web::CustomEventInit::new();
        init.set_detail(&detail);
        init.set_bubbles(true);
        match web::CustomEvent::new_with_event_init_dict(&format::dom_event_name(event.name()), &init)
        {
            Ok(ev) => {
                let _ = target.dispatch_event(&ev);
            }
            Err(e) => log::warn!("[ui] cannot dispatch {}: {}", event.name(), dom::js_error(&e)),
        }
    });
}

/// Size of the model download from the Resource Timing buffer, if the
/// browser exposes it.
fn model_file_size(window: &web::Window, src: &str) -> Option<u64> {
    let entries = window.performance()?.get_entries_by_type("resource");
    entries.iter().find_map(|entry| {
        let timing = entry.dyn_into::<web::PerformanceResourceTiming>().ok()?;
        if !format::resource_matches(&timing.name(), src) {
            return None;
        }
        let size = timing.encoded_body_size().max(timing.transfer_size());
        (size > 0.0).then_some(size as u64)
    })
}

async fn load_configuration(viewer: &ModelViewerElement) -> Result<Configuration, ConfigLoadError> {
    let attr = viewer.element().get_attribute("data-config");
    let path = format::config_path(attr.as_deref()).to_string();
    let text = dom::fetch_text(&path).await?;
    let config = Configuration::from_json(&text)?;
    log::info!(
        "[binder] configuration `{}`: {} colors, {} straps, {} environments",
        config.id,
        config.colors.len(),
        config.straps.len(),
        config.environments.len()
    );
    Ok(config)
}

/// Run the full startup sequence. Fatal failures are emitted as `error`
/// events and returned.
pub async fn boot() -> anyhow::Result<Rc<AppContext>> {
    let window = web::window().ok_or_else(|| anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow!("no document"))?;
    let viewer_el = document
        .query_selector(VIEWER_SELECTOR)
        .map_err(|e| anyhow!(dom::js_error(&e)))?
        .ok_or_else(|| anyhow!("missing <{VIEWER_SELECTOR}>"))?
        .dyn_into::<web::HtmlElement>()
        .map_err(|_| anyhow!("<{VIEWER_SELECTOR}> is not an HTML element"))?;
    let viewer = ModelViewerElement::new(viewer_el.clone());

    let clock: Clock = Rc::new(js_sys::Date::now);
    let ctx = Context::new(EventBus::new(), clock);
    bridge_to_dom(&ctx.bus, viewer_el);

    let config = match load_configuration(&viewer).await {
        Ok(c) => Rc::new(c),
        Err(e) => {
            log::error!("[binder] {}", e);
            ctx.emit_error(e.kind(), "Failed to load configuration", Some(e.to_string()));
            return Err(anyhow!(e));
        }
    };

    let params = UrlParams::from_query(&window.location().search().unwrap_or_default());
    let info = host::probe(&window);
    let device = classify_device_with_override(&info, params.force_mobile);
    let ar = check_ar_support(&info);
    if let Some(body) = document.body() {
        dom::set_class(&body, &format::device_body_class(device.as_str()), true);
    }
    log::info!(
        "[ar] device={} ar={} {}",
        device,
        ar.supported,
        ar.reason.as_deref().unwrap_or("")
    );

    let started = Instant::now();
    viewer.set_src(&config.model_path);
    if let Err(e) = viewer.wait_for_load(MODEL_LOAD_TIMEOUT_MS).await {
        log::error!("[viewer] model load failed: {}", e);
        ctx.emit_error(e.kind(), "Failed to load 3D model", Some(e.to_string()));
        return Err(anyhow!(e).context("model load"));
    }
    let load_time = started.elapsed().as_secs_f64() * 1000.0;
    let file_size = model_file_size(&window, &config.model_path);
    log::info!("[viewer] model loaded in {:.0} ms", load_time);
    ctx.bus.emit(ConfiguratorEvent::ModelLoaded {
        load_time,
        file_size,
    });

    let binder = match Binder::new(config, Rc::new(viewer.clone()), ctx.clone()) {
        Ok(b) => Rc::new(b),
        Err(e) => {
            ctx.emit_error(e.kind(), "Invalid configuration", Some(e.to_string()));
            return Err(anyhow!(e));
        }
    };
    if let Err(e) = binder.initialize().await {
        log::error!("[binder] initialize failed: {}", e);
        ctx.emit_error(e.kind(), "Failed to initialize configurator", Some(e.to_string()));
        return Err(anyhow!(e));
    }

    let app = Rc::new(AppContext {
        window,
        document,
        viewer,
        binder,
        ctx,
        device,
        ar,
        params,
        listeners: RefCell::new(Listeners::new()),
        idle: RefCell::new(None),
        widgets: RefCell::new(None),
        destroyed: Cell::new(false),
    });

    let widgets = Widgets::build(&app.document, &app.binder, &mut app.listeners.borrow_mut());
    *app.widgets.borrow_mut() = Some(widgets);
    app.binder.apply_url_params(&app.params).await;

    {
        let binder = app.binder.clone();
        spawn_local(async move {
            binder.preload_textures(timers::sleep).await;
        });
    }

    let idle = input::wire_idle(
        IdleWiring::new(app.viewer.clone(), app.ctx.clone()),
        &mut app.listeners.borrow_mut(),
    );
    *app.idle.borrow_mut() = idle;
    wire_buttons(&app);

    if app.params.ar && app.ar.supported {
        let app = app.clone();
        spawn_local(async move { capture::activate_ar(&app.viewer, &app.ctx).await });
    }

    log::info!("[ui] configurator ready ({})", app.device);
    Ok(app)
}

fn wire_buttons(app: &Rc<AppContext>) {
    let mut listeners = app.listeners.borrow_mut();
    let document = &app.document;

    {
        let app = Rc::downgrade(app);
        listeners.on_click(document, SCREENSHOT_BUTTON, move || {
            if let Some(app) = app.upgrade() {
                app.screenshot();
            }
        });
    }
    {
        let app = Rc::downgrade(app);
        listeners.on_click(document, AR_BUTTON, move || {
            if let Some(app) = app.upgrade() {
                spawn_local(async move { capture::activate_ar(&app.viewer, &app.ctx).await });
            }
        });
    }
    {
        let app = Rc::downgrade(app);
        listeners.on_click(document, SHARE_BUTTON, move || {
            if let Some(app) = app.upgrade() {
                app.copy_share_url();
            }
        });
    }
    {
        let binder = Rc::downgrade(&app.binder);
        listeners.on_click(document, RESET_BUTTON, move || {
            if let Some(binder) = binder.upgrade() {
                spawn_local(async move { binder.reset().await });
            }
        });
    }

    if let Some(button) = document.get_element_by_id(AR_BUTTON) {
        dom::show(&button, app.ar.supported);
    }
}

impl AppContext {
    pub fn state(&self) -> SelectionState {
        self.binder.state()
    }

    pub fn share_url(&self) -> Option<String> {
        let href = self.window.location().href().ok()?;
        match self.binder.share_url(&href) {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("[ui] cannot build share link from {}: {}", href, e);
                None
            }
        }
    }

    /// Write the share link to the clipboard when the browser allows it.
    pub fn copy_share_url(&self) -> Option<String> {
        let url = self.share_url()?;
        let navigator: JsValue = self.window.navigator().into();
        let clipboard = js_sys::Reflect::get(&navigator, &JsValue::from_str("clipboard")).ok();
        let write = clipboard.as_ref().and_then(|c| {
            js_sys::Reflect::get(c, &JsValue::from_str("writeText"))
                .ok()?
                .dyn_into::<js_sys::Function>()
                .ok()
        });
        match (clipboard, write) {
            (Some(c), Some(f)) => {
                let _ = f.call1(&c, &JsValue::from_str(&url));
                log::info!("[ui] share link copied: {}", url);
            }
            _ => log::info!("[ui] share link: {}", url),
        }
        Some(url)
    }

    /// Capture a screenshot and offer it as a download.
    pub fn screenshot(&self) -> Option<String> {
        let data_url = capture::take_screenshot(&self.viewer, &self.ctx)?;
        let link = self
            .document
            .create_element("a")
            .ok()
            .and_then(|a| a.dyn_into::<web::HtmlAnchorElement>().ok());
        if let Some(a) = link {
            a.set_href(&data_url);
            a.set_download(SCREENSHOT_FILE);
            a.click();
        }
        Some(data_url)
    }

    /// Remove listeners and the idle interval, drop widgets, clear the
    /// texture cache and every bus subscriber. Safe to call twice.
    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.listeners.borrow_mut().clear();
        self.idle.borrow_mut().take();
        if let Some(mut widgets) = self.widgets.borrow_mut().take() {
            widgets.teardown();
        }
        self.binder.teardown();
        if let Some(body) = self.document.body() {
            dom::set_class(&body, &format::device_body_class(self.device.as_str()), false);
        }
        log::info!("[ui] configurator destroyed");
    }
}
