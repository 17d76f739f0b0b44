//! Selection state shared between the binder, widgets and deep links.

use crate::config::Configuration;
use serde::Serialize;
use std::rc::Rc;

/// The three-axis user choice currently in effect.
///
/// Values handed out by the binder are copies; mutating one has no effect on
/// the binder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub color: String,
    pub strap: String,
    pub environment: String,
}

impl SelectionState {
    pub fn from_defaults(config: &Configuration) -> Self {
        Self {
            color: config.defaults.color.clone(),
            strap: config.defaults.strap.clone(),
            environment: config.defaults.environment.clone(),
        }
    }
}

/// Milliseconds since an arbitrary epoch; used for event timestamps.
pub type Clock = Rc<dyn Fn() -> f64>;

/// Wall-clock milliseconds since the Unix epoch. Not available on
/// `wasm32-unknown-unknown`; the web front-end supplies `Date.now` instead.
pub fn system_clock() -> Clock {
    Rc::new(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    })
}
