//! Error types for the configurator core.
//!
//! Every error maps onto one of four [`ErrorKind`]s, which is what the
//! `error` event carries to the host page.

use crate::config::MaterialSlot;
use serde::Serialize;
use thiserror::Error;

/// Coarse failure taxonomy surfaced in `error` events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Resource fetch or load failed.
    Network,
    /// The viewer reported a rendering or device failure.
    Webgl,
    /// The configuration document is invalid or incomplete.
    Configuration,
    /// The user asked for something the environment cannot do.
    User,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Webgl => "webgl",
            ErrorKind::Configuration => "configuration",
            ErrorKind::User => "user",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invalid or incomplete configuration document. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("configuration declares no {0}")]
    Empty(&'static str),

    #[error("duplicate {axis} id `{id}`")]
    DuplicateId { axis: &'static str, id: String },

    #[error("color `{color}` is missing its {texture} texture")]
    MissingTexture {
        color: String,
        texture: &'static str,
    },

    #[error("strap `{0}` must declare exactly one of a fixed texture or the dynamic marker")]
    AmbiguousStrap(String),

    #[error("configuration declares no dynamic strap")]
    NoDynamicStrap,

    #[error("configuration declares more than one dynamic strap (`{0}` and `{1}`)")]
    MultipleDynamicStraps(String, String),

    #[error("default {axis} `{id}` is not declared")]
    UnknownDefault { axis: &'static str, id: String },

    #[error("material name for the {0} slot is empty")]
    EmptyMaterialName(MaterialSlot),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}

/// Failure reported by the model viewer capability.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ViewerError {
    #[error("failed to load `{url}`: {reason}")]
    Network { url: String, reason: String },

    #[error("viewer render failure: {0}")]
    Render(String),

    #[error("timed out after {0} ms")]
    Timeout(u32),

    #[error("{0}")]
    Unsupported(String),
}

impl ViewerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ViewerError::Network { .. } | ViewerError::Timeout(_) => ErrorKind::Network,
            ViewerError::Render(_) => ErrorKind::Webgl,
            ViewerError::Unsupported(_) => ErrorKind::User,
        }
    }
}

/// Failure while fetching and parsing the configuration document.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("cannot fetch configuration: {0}")]
    Fetch(#[from] ViewerError),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

impl ConfigLoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigLoadError::Fetch(e) => e.kind(),
            ConfigLoadError::Invalid(e) => e.kind(),
        }
    }
}

/// Failure while initializing the binder or applying a selection.
#[derive(Debug, Error)]
pub enum BinderError {
    #[error("model has no material `{name}` for the {slot} slot")]
    MissingMaterial { slot: MaterialSlot, name: String },

    #[error("no {axis} `{id}` in the configuration")]
    UnknownSelection { axis: &'static str, id: String },

    #[error("binder used before initialize()")]
    NotInitialized,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Viewer(#[from] ViewerError),
}

impl BinderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BinderError::MissingMaterial { .. }
            | BinderError::UnknownSelection { .. }
            | BinderError::Config(_) => ErrorKind::Configuration,
            BinderError::NotInitialized => ErrorKind::User,
            BinderError::Viewer(e) => e.kind(),
        }
    }
}
