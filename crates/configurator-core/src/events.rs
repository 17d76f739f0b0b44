//! Typed publish/subscribe for configurator events.
//!
//! Events form a closed enum, so a listener can never receive a payload of
//! the wrong shape. The bus is single-threaded: handles are `Rc`-shared and
//! listeners run synchronously, in subscription order, on the emitting call.

use crate::error::ErrorKind;
use crate::state::SelectionState;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Payload of an `error` event.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<String>,
    pub timestamp: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "camelCase")]
pub enum ConfiguratorEvent {
    Initialized,
    ColorChanged(String),
    StrapChanged(String),
    EnvironmentChanged(String),
    #[serde(rename_all = "camelCase")]
    ModelLoaded {
        load_time: f64,
        file_size: Option<u64>,
    },
    Error(ErrorInfo),
    #[serde(rename_all = "camelCase")]
    ScreenshotTaken {
        data_url: String,
        size: usize,
        timestamp: f64,
    },
    ArActivated {
        timestamp: f64,
        device: String,
    },
    IdleModeChanged {
        idle: bool,
    },
    TexturePreloadProgress {
        loaded: usize,
        total: usize,
        percentage: u32,
    },
    TexturePreloadComplete {
        loaded: usize,
        total: usize,
    },
    Reset(SelectionState),
}

impl ConfiguratorEvent {
    /// Stable event name, as seen by the host page.
    pub fn name(&self) -> &'static str {
        match self {
            ConfiguratorEvent::Initialized => "initialized",
            ConfiguratorEvent::ColorChanged(_) => "colorChanged",
            ConfiguratorEvent::StrapChanged(_) => "strapChanged",
            ConfiguratorEvent::EnvironmentChanged(_) => "environmentChanged",
            ConfiguratorEvent::ModelLoaded { .. } => "modelLoaded",
            ConfiguratorEvent::Error(_) => "error",
            ConfiguratorEvent::ScreenshotTaken { .. } => "screenshotTaken",
            ConfiguratorEvent::ArActivated { .. } => "arActivated",
            ConfiguratorEvent::IdleModeChanged { .. } => "idleModeChanged",
            ConfiguratorEvent::TexturePreloadProgress { .. } => "texturePreloadProgress",
            ConfiguratorEvent::TexturePreloadComplete { .. } => "texturePreloadComplete",
            ConfiguratorEvent::Reset(_) => "reset",
        }
    }

    /// The event's `detail` payload as JSON (`null` for unit events).
    pub fn detail_json(&self) -> String {
        let tagged = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        tagged
            .get("detail")
            .cloned()
            .unwrap_or(serde_json::Value::Null)
            .to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<RefCell<dyn FnMut(&ConfiguratorEvent)>>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

/// Cloning yields another handle onto the same listener list.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl FnMut(&ConfiguratorEvent) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        let listener: Listener = Rc::new(RefCell::new(listener));
        inner.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().listeners.clear();
    }

    /// Deliver `event` to every current listener.
    ///
    /// The listener list is snapshotted first, so listeners may subscribe or
    /// unsubscribe while being called. Listeners removed mid-emit are skipped.
    /// A listener that emits back into a chain reaching itself is skipped for
    /// the nested event.
    pub fn emit(&self, event: ConfiguratorEvent) {
        log::debug!("[events] {}", event.name());
        let snapshot: Vec<(SubscriptionId, Listener)> = self.inner.borrow().listeners.clone();
        for (id, listener) in snapshot {
            let live = self
                .inner
                .borrow()
                .listeners
                .iter()
                .any(|(lid, _)| *lid == id);
            if !live {
                continue;
            }
            match listener.try_borrow_mut() {
                Ok(mut f) => (&mut *f)(&event),
                Err(_) => log::warn!("[events] re-entrant {} skipped a listener", event.name()),
            }
        }
    }
}

/// Records every event emitted on a bus; used by tests and dry runs.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<ConfiguratorEvent>>>,
}

impl EventLog {
    pub fn attach(bus: &EventBus) -> Self {
        let log = Self::default();
        let sink = log.events.clone();
        bus.subscribe(move |ev| sink.borrow_mut().push(ev.clone()));
        log
    }

    pub fn events(&self) -> Vec<ConfiguratorEvent> {
        self.events.borrow().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(|e| e.name()).collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}
