use crate::dom::Listeners;
use crate::timers::Interval;
use crate::viewer::ModelViewerElement;
use configurator_core::{
    ConfiguratorEvent, Context, IdleTracker, IdleTransition, ModelViewer, IDLE_CHECK_INTERVAL_MS,
};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

const USER_INTERACTION: &str = "user-interaction";

#[derive(Clone)]
pub struct IdleWiring {
    pub viewer: ModelViewerElement,
    pub tracker: Rc<RefCell<IdleTracker>>,
    pub ctx: Context,
}

impl IdleWiring {
    pub fn new(viewer: ModelViewerElement, ctx: Context) -> Self {
        let tracker = IdleTracker::new(ctx.now());
        Self {
            viewer,
            tracker: Rc::new(RefCell::new(tracker)),
            ctx,
        }
    }

    fn apply(&self, transition: Option<IdleTransition>) {
        let Some(t) = transition else {
            return;
        };
        let idle = t.is_idle();
        log::debug!("[idle] {}", if idle { "idle" } else { "active" });
        self.viewer.set_auto_rotate(idle);
        self.ctx.bus.emit(ConfiguratorEvent::IdleModeChanged { idle });
    }

    fn interaction(&self) {
        let now = self.ctx.now();
        let t = self.tracker.borrow_mut().record_interaction(now);
        self.apply(t);
    }
}

/// `camera-change` fires for programmatic moves too; only the ones the user
/// caused count as interaction.
fn is_user_camera_change(ev: &web::Event) -> bool {
    ev.dyn_ref::<web::CustomEvent>()
        .map(|ce| ce.detail())
        .and_then(|d| js_sys::Reflect::get(&d, &JsValue::from_str("source")).ok())
        .and_then(|s| s.as_string())
        .map(|s| s == USER_INTERACTION)
        .unwrap_or(false)
}

/// Pointer, wheel and touch input on the viewer reset the idle timer; the
/// returned interval drives the periodic check.
pub fn wire_idle(w: IdleWiring, listeners: &mut Listeners) -> Option<Interval> {
    let target: web::EventTarget = w.viewer.element().clone().into();
    for event in ["pointerdown", "wheel", "touchstart"] {
        let w = w.clone();
        listeners.listen(&target, event, move |_| w.interaction());
    }
    {
        let w = w.clone();
        listeners.listen(&target, "camera-change", move |ev| {
            if is_user_camera_change(&ev) {
                w.interaction();
            }
        });
    }

    Interval::new(IDLE_CHECK_INTERVAL_MS, move || {
        let now = w.ctx.now();
        let t = w.tracker.borrow_mut().check(now);
        w.apply(t);
    })
}
