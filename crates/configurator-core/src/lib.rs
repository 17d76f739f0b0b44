pub mod binder;
pub mod capability;
pub mod config;
pub mod constants;
pub mod deeplink;
pub mod error;
pub mod events;
pub mod idle;
pub mod recording;
pub mod state;
pub mod texture_cache;
pub mod viewer;

pub use binder::{Binder, Context};
pub use capability::{
    check_ar_support, classify_device, classify_device_with_override, ArFlags, ArMode, ArSupport,
    DeviceClass, HostInfo,
};
pub use config::{
    Color, ColorTextures, Configuration, Defaults, Environment, MaterialBindings, MaterialSlot,
    Strap, StrapTexture,
};
pub use constants::*;
pub use deeplink::{share_url, UrlParams};
pub use error::{BinderError, ConfigError, ConfigLoadError, ErrorKind, ViewerError};
pub use events::{ConfiguratorEvent, ErrorInfo, EventBus, EventLog, SubscriptionId};
pub use idle::{IdleState, IdleTracker, IdleTransition};
pub use state::{system_clock, Clock, SelectionState};
pub use texture_cache::{preload_all, PreloadSummary, TextureCache};
pub use viewer::{MaterialHandle, ModelViewer};
