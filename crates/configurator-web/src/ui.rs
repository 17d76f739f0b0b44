//! Option widgets rendered from the configuration.
//!
//! Widgets hold no selection of their own: clicks go to the binder and the
//! `active` marker follows the bus.

use crate::app::WebBinder;
use crate::dom::{self, Listeners};
use crate::format;
use configurator_core::{ConfiguratorEvent, EventBus, SelectionState, SubscriptionId};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

pub const COLOR_CONTAINER: &str = "color-options";
pub const STRAP_CONTAINER: &str = "strap-options";
pub const ENVIRONMENT_CONTAINER: &str = "environment-options";
pub const PROGRESS_LABEL: &str = "preload-status";
pub const ERROR_TOAST: &str = "error-toast";
const ACTIVE: &str = "active";
const TOAST_MS: i32 = 4000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    Color,
    Strap,
    Environment,
}

struct Group {
    container: Option<web::Element>,
    options: Vec<(String, web::Element)>,
}

impl Group {
    fn mark_active(&self, id: &str) {
        for (option_id, el) in &self.options {
            dom::set_class(el, ACTIVE, option_id == id);
        }
    }
}

pub struct Widgets {
    colors: Rc<Group>,
    straps: Rc<Group>,
    environments: Rc<Group>,
    bus: EventBus,
    subscription: Option<SubscriptionId>,
}

struct OptionDesc<'a> {
    id: &'a str,
    label: &'a str,
    swatch: Option<String>,
}

fn build_group(
    document: &web::Document,
    container_id: &str,
    axis: Axis,
    descs: Vec<OptionDesc<'_>>,
    binder: &Rc<WebBinder>,
    listeners: &mut Listeners,
) -> Group {
    let Some(container) = document.get_element_by_id(container_id) else {
        log::warn!("[ui] missing #{}; {:?} options not rendered", container_id, axis);
        return Group {
            container: None,
            options: Vec::new(),
        };
    };
    container.set_inner_html("");

    let mut options = Vec::with_capacity(descs.len());
    for opt in descs {
        let Ok(button) = document.create_element("button") else {
            continue;
        };
        let _ = button.set_attribute("type", "button");
        let _ = button.set_attribute("data-id", opt.id);
        let _ = button.set_attribute("title", opt.label);
        button.set_text_content(Some(opt.label));
        if let (Some(swatch), Some(html)) = (&opt.swatch, button.dyn_ref::<web::HtmlElement>()) {
            let _ = html.style().set_property("background", swatch);
        }
        let _ = container.append_child(&button);

        let id = opt.id.to_string();
        let binder = binder.clone();
        listeners.listen(&button, "click", move |_| {
            let binder = binder.clone();
            let id = id.clone();
            match axis {
                Axis::Color => spawn_local(async move { binder.change_color(&id).await }),
                Axis::Strap => spawn_local(async move { binder.change_strap(&id).await }),
                Axis::Environment => binder.change_environment(&id),
            }
        });
        options.push((opt.id.to_string(), button));
    }

    Group {
        container: Some(container),
        options,
    }
}

fn image_swatch(path: &str) -> String {
    format!("center / cover no-repeat url(\"{path}\")")
}

impl Widgets {
    pub fn build(
        document: &web::Document,
        binder: &Rc<WebBinder>,
        listeners: &mut Listeners,
    ) -> Self {
        let config = binder.config();
        let colors = build_group(
            document,
            COLOR_CONTAINER,
            Axis::Color,
            config
                .colors
                .iter()
                .map(|c| OptionDesc {
                    id: &c.id,
                    label: &c.name,
                    swatch: Some(image_swatch(&c.preview)),
                })
                .collect(),
            binder,
            listeners,
        );
        let straps = build_group(
            document,
            STRAP_CONTAINER,
            Axis::Strap,
            config
                .straps
                .iter()
                .map(|s| OptionDesc {
                    id: &s.id,
                    label: &s.name,
                    swatch: s.preview.as_deref().map(image_swatch),
                })
                .collect(),
            binder,
            listeners,
        );
        let environments = build_group(
            document,
            ENVIRONMENT_CONTAINER,
            Axis::Environment,
            config
                .environments
                .iter()
                .map(|e| OptionDesc {
                    id: &e.id,
                    label: &e.name,
                    swatch: Some(e.gradient.clone()),
                })
                .collect(),
            binder,
            listeners,
        );

        let mut widgets = Self {
            colors: Rc::new(colors),
            straps: Rc::new(straps),
            environments: Rc::new(environments),
            bus: binder.context().bus.clone(),
            subscription: None,
        };
        widgets.show_selection(&binder.state());
        widgets.subscribe(document);
        widgets
    }

    fn show_selection(&self, state: &SelectionState) {
        self.colors.mark_active(&state.color);
        self.straps.mark_active(&state.strap);
        self.environments.mark_active(&state.environment);
    }

    fn subscribe(&mut self, document: &web::Document) {
        let colors = self.colors.clone();
        let straps = self.straps.clone();
        let environments = self.environments.clone();
        let progress = document.get_element_by_id(PROGRESS_LABEL);
        let toast = document.get_element_by_id(ERROR_TOAST);

        let id = self.bus.subscribe(move |event| match event {
            ConfiguratorEvent::ColorChanged(id) => colors.mark_active(id),
            ConfiguratorEvent::StrapChanged(id) => straps.mark_active(id),
            ConfiguratorEvent::EnvironmentChanged(id) => environments.mark_active(id),
            ConfiguratorEvent::Reset(state) => {
                colors.mark_active(&state.color);
                straps.mark_active(&state.strap);
                environments.mark_active(&state.environment);
            }
            ConfiguratorEvent::TexturePreloadProgress {
                loaded,
                total,
                percentage,
            } => {
                if let Some(el) = &progress {
                    el.set_text_content(Some(&format::progress_label(*loaded, *total, *percentage)));
                    dom::show(el, true);
                }
            }
            ConfiguratorEvent::TexturePreloadComplete { total, .. } => {
                // Failed colours load on demand later; the queue is done.
                if let Some(el) = &progress {
                    el.set_text_content(Some(&format::progress_label(*total, *total, 100)));
                }
            }
            ConfiguratorEvent::Error(info) => {
                if let Some(el) = &toast {
                    show_toast(el, &format::error_toast_text(&info.message, info.details.as_deref()));
                }
            }
            _ => {}
        });
        self.subscription = Some(id);
    }

    /// Unsubscribe and empty the option containers.
    pub fn teardown(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.bus.unsubscribe(id);
        }
        for group in [&self.colors, &self.straps, &self.environments] {
            if let Some(container) = &group.container {
                container.set_inner_html("");
            }
        }
    }
}

fn show_toast(el: &web::Element, text: &str) {
    el.set_text_content(Some(text));
    dom::show(el, true);
    let el = el.clone();
    let hide = Closure::once_into_js(move || dom::show(&el, false));
    if let Some(w) = web::window() {
        let _ = w.set_timeout_with_callback_and_timeout_and_integer(hide.unchecked_ref(), TOAST_MS);
    }
}
