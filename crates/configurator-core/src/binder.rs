//! State/material binder.
//!
//! Owns the selection, resolves each selection to texture URLs, applies them
//! to the model's material slots and broadcasts every transition on the
//! context's [`EventBus`].
//!
//! All operations take `&self` so UI callbacks can share one binder through
//! an `Rc` and start overlapping changes. No `RefCell` borrow is held across
//! an await. Overlapping calls are not cancelled: the slots end up with
//! whichever texture application finishes last.
//!
//! Alongside the visible selection the binder keeps the last selection whose
//! textures were fully applied. A failed change rolls back to that, never to
//! another call's unconfirmed value.

use crate::config::{Color, Configuration, MaterialSlot, Strap, StrapTexture};
use crate::deeplink::{self, UrlParams};
use crate::error::{BinderError, ConfigError, ErrorKind};
use crate::events::{ConfiguratorEvent, ErrorInfo, EventBus};
use crate::state::{Clock, SelectionState};
use crate::texture_cache::{self, PreloadSummary, TextureCache};
use crate::viewer::{MaterialHandle, ModelViewer};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

/// Explicit per-page context handed to every component at construction.
#[derive(Clone)]
pub struct Context {
    pub bus: EventBus,
    pub clock: Clock,
}

impl Context {
    pub fn new(bus: EventBus, clock: Clock) -> Self {
        Self { bus, clock }
    }

    #[inline]
    pub fn now(&self) -> f64 {
        (self.clock)()
    }

    /// Build and emit an `error` event.
    pub fn emit_error(&self, kind: ErrorKind, message: &str, details: Option<String>) {
        self.bus.emit(ConfiguratorEvent::Error(ErrorInfo {
            kind,
            message: message.to_string(),
            details,
            timestamp: self.now(),
        }));
    }
}

struct Slots<M> {
    primary: M,
    secondary: M,
    accent: M,
}

pub struct Binder<V: ModelViewer> {
    config: Rc<Configuration>,
    viewer: Rc<V>,
    ctx: Context,
    cache: TextureCache<V::Texture>,
    selection: RefCell<SelectionState>,
    committed: RefCell<SelectionState>,
    slots: RefCell<Option<Rc<Slots<V::Material>>>>,
    initialized: Cell<bool>,
}

impl<V: ModelViewer> Binder<V> {
    /// Validates `config` (fatal on failure) and seeds the selection from its
    /// defaults. Materials are resolved later by [`Binder::initialize`].
    pub fn new(config: Rc<Configuration>, viewer: Rc<V>, ctx: Context) -> Result<Self, BinderError> {
        config.validate()?;
        let selection = SelectionState::from_defaults(&config);
        Ok(Self {
            config,
            viewer,
            ctx,
            cache: TextureCache::new(),
            committed: RefCell::new(selection.clone()),
            selection: RefCell::new(selection),
            slots: RefCell::new(None),
            initialized: Cell::new(false),
        })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn cache(&self) -> &TextureCache<V::Texture> {
        &self.cache
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Snapshot copy of the current selection.
    pub fn state(&self) -> SelectionState {
        self.selection.borrow().clone()
    }

    /// Resolve the three material slots and apply the default selection.
    ///
    /// A missing material is fatal: the error is returned and nothing is
    /// applied.
    pub async fn initialize(&self) -> Result<(), BinderError> {
        let resolve = |slot: MaterialSlot| {
            let name = self.config.materials.name(slot);
            self.viewer
                .material_by_name(name)
                .ok_or_else(|| BinderError::MissingMaterial {
                    slot,
                    name: name.to_string(),
                })
        };
        let slots = Slots {
            primary: resolve(MaterialSlot::Primary)?,
            secondary: resolve(MaterialSlot::Secondary)?,
            accent: resolve(MaterialSlot::Accent)?,
        };
        *self.slots.borrow_mut() = Some(Rc::new(slots));

        let state = self.state();
        let color = self.lookup_color(&state.color)?;
        let strap = self.lookup_strap(&state.strap)?;
        self.apply_color(color).await?;
        self.apply_strap(strap, color).await?;
        if let Some(env) = self.config.environment(&state.environment) {
            self.viewer.set_background(&env.background);
        }

        *self.committed.borrow_mut() = state.clone();
        self.initialized.set(true);
        log::info!(
            "[binder] ready: color={} strap={} environment={}",
            state.color,
            state.strap,
            state.environment
        );
        self.ctx.bus.emit(ConfiguratorEvent::Initialized);
        Ok(())
    }

    /// Select a color. Emits `colorChanged` before any texture I/O, then
    /// snaps the strap to the dynamic strap (`strapChanged`). On failure the
    /// color and strap roll back to the last fully applied selection,
    /// `colorChanged` is re-emitted with that id and an `error` event follows.
    pub async fn change_color(&self, color_id: &str) {
        let Some(color) = self.config.color(color_id) else {
            log::warn!("[binder] ignoring unknown color `{}`", color_id);
            return;
        };
        if self.selection.borrow().color == color_id {
            return;
        }

        self.selection.borrow_mut().color = color_id.to_string();
        self.ctx
            .bus
            .emit(ConfiguratorEvent::ColorChanged(color_id.to_string()));

        let result = match self.apply_color(color).await {
            Ok(()) => self.snap_strap_to(color).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(strap_id) => {
                let mut committed = self.committed.borrow_mut();
                committed.color = color_id.to_string();
                committed.strap = strap_id;
            }
            Err(e) => {
                log::error!("[binder] color `{}` failed: {}", color_id, e);
                // A newer change owns the selection now; leave it alone.
                let still_ours = self.selection.borrow().color == color_id;
                if still_ours {
                    let last_good = self.committed.borrow().clone();
                    {
                        let mut sel = self.selection.borrow_mut();
                        sel.color = last_good.color.clone();
                        sel.strap = last_good.strap;
                    }
                    self.ctx
                        .bus
                        .emit(ConfiguratorEvent::ColorChanged(last_good.color));
                }
                self.ctx
                    .emit_error(e.kind(), "Failed to change color", Some(e.to_string()));
            }
        }
    }

    /// Select a strap. `strapChanged` is emitted once the texture is applied.
    /// On failure the strap rolls back and an `error` event is emitted.
    pub async fn change_strap(&self, strap_id: &str) {
        let Some(strap) = self.config.strap(strap_id) else {
            log::warn!("[binder] ignoring unknown strap `{}`", strap_id);
            return;
        };
        let previous = self.state();
        if previous.strap == strap_id {
            return;
        }

        self.selection.borrow_mut().strap = strap_id.to_string();
        let result = match self.lookup_color(&previous.color) {
            Ok(color) => self.apply_strap(strap, color).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.committed.borrow_mut().strap = strap_id.to_string();
                self.ctx
                    .bus
                    .emit(ConfiguratorEvent::StrapChanged(strap_id.to_string()));
            }
            Err(e) => {
                log::error!("[binder] strap `{}` failed: {}", strap_id, e);
                if self.selection.borrow().strap == strap_id {
                    let last_good = self.committed.borrow().strap.clone();
                    self.selection.borrow_mut().strap = last_good;
                }
                self.ctx
                    .emit_error(e.kind(), "Failed to change strap", Some(e.to_string()));
            }
        }
    }

    /// Select an environment. Pure backdrop: no texture I/O.
    pub fn change_environment(&self, environment_id: &str) {
        let Some(env) = self.config.environment(environment_id) else {
            log::warn!("[binder] ignoring unknown environment `{}`", environment_id);
            return;
        };
        if self.selection.borrow().environment == environment_id {
            return;
        }
        self.selection.borrow_mut().environment = environment_id.to_string();
        self.committed.borrow_mut().environment = environment_id.to_string();
        self.viewer.set_background(&env.background);
        self.ctx
            .bus
            .emit(ConfiguratorEvent::EnvironmentChanged(environment_id.to_string()));
    }

    /// Return every axis to the configuration defaults, then emit `reset`.
    pub async fn reset(&self) {
        let defaults = self.config.defaults.clone();
        self.change_color(&defaults.color).await;
        self.change_strap(&defaults.strap).await;
        self.change_environment(&defaults.environment);
        self.ctx.bus.emit(ConfiguratorEvent::Reset(self.state()));
    }

    /// Apply deep-link overrides: color, then strap, then environment.
    /// Unknown ids are ignored like any other invalid change.
    pub async fn apply_url_params(&self, params: &UrlParams) {
        if let Some(color) = &params.color {
            self.change_color(color).await;
        }
        if let Some(strap) = &params.strap {
            self.change_strap(strap).await;
        }
        if let Some(env) = &params.environment {
            self.change_environment(env);
        }
    }

    /// The current selection as query parameters on `page_url`.
    pub fn share_url(&self, page_url: &str) -> Result<String, url::ParseError> {
        deeplink::share_url(page_url, &self.state())
    }

    /// Warm the texture cache in the background, current color first.
    pub async fn preload_textures<S, F>(&self, sleep: S) -> PreloadSummary
    where
        S: FnMut(u32) -> F,
        F: Future<Output = ()>,
    {
        let priority = self.state().color;
        texture_cache::preload_all(
            &*self.viewer,
            &self.cache,
            &self.config.colors,
            &priority,
            sleep,
            &self.ctx.bus,
        )
        .await
    }

    /// Drop cached textures and every listener on the bus. A preload still
    /// running stops before its next color.
    pub fn teardown(&self) {
        self.cache.close();
        self.ctx.bus.clear();
        self.slots.borrow_mut().take();
        self.initialized.set(false);
        log::info!("[binder] torn down");
    }

    // ---------------- internals ----------------

    fn lookup_color(&self, id: &str) -> Result<&Color, BinderError> {
        self.config
            .color(id)
            .ok_or_else(|| BinderError::UnknownSelection {
                axis: "color",
                id: id.to_string(),
            })
    }

    fn lookup_strap(&self, id: &str) -> Result<&Strap, BinderError> {
        self.config
            .strap(id)
            .ok_or_else(|| BinderError::UnknownSelection {
                axis: "strap",
                id: id.to_string(),
            })
    }

    fn slots(&self) -> Result<Rc<Slots<V::Material>>, BinderError> {
        self.slots.borrow().clone().ok_or(BinderError::NotInitialized)
    }

    /// Primary texture on the primary slot, accent texture on the secondary
    /// slot, roughness (when present) on both.
    async fn apply_color(&self, color: &Color) -> Result<(), BinderError> {
        let slots = self.slots()?;
        let viewer = &*self.viewer;
        let primary = self.cache.get(viewer, &color.textures.primary).await?;
        let accent = self.cache.get(viewer, &color.textures.accent).await?;
        let roughness = match &color.textures.roughness {
            Some(url) => Some(self.cache.get(viewer, url).await?),
            None => None,
        };

        slots.primary.set_base_color_texture(&primary)?;
        slots.secondary.set_base_color_texture(&accent)?;
        if let Some(r) = roughness {
            slots.primary.set_roughness_texture(&r)?;
            slots.secondary.set_roughness_texture(&r)?;
        }
        Ok(())
    }

    /// Strap texture on the accent slot: the strap's own texture, or the
    /// color's accent texture for the dynamic strap.
    async fn apply_strap(&self, strap: &Strap, color: &Color) -> Result<(), BinderError> {
        let slots = self.slots()?;
        let url = match &strap.texture {
            StrapTexture::Fixed(url) => url.as_str(),
            StrapTexture::Dynamic => color.textures.accent.as_str(),
        };
        let texture = self.cache.get(&*self.viewer, url).await?;
        slots.accent.set_base_color_texture(&texture)?;
        Ok(())
    }

    /// Returns the dynamic strap's id once its texture is on the accent slot.
    async fn snap_strap_to(&self, color: &Color) -> Result<String, BinderError> {
        let strap = self
            .config
            .dynamic_strap()
            .ok_or(ConfigError::NoDynamicStrap)?;
        self.selection.borrow_mut().strap = strap.id.clone();
        self.apply_strap(strap, color).await?;
        self.ctx
            .bus
            .emit(ConfiguratorEvent::StrapChanged(strap.id.clone()));
        Ok(strap.id.clone())
    }
}
