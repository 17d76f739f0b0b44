//! Offline checks over a configuration document.

use anyhow::{anyhow, Context as _};
use configurator_core::recording::RecordingViewer;
use configurator_core::{
    system_clock, Binder, Configuration, ConfiguratorEvent, Context, EventBus, EventLog,
    MaterialSlot,
};
use pollster::block_on;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const SHARE_BASE: &str = "https://localhost/";

pub fn load(path: &Path) -> anyhow::Result<Configuration> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Configuration::from_json(&text).with_context(|| format!("validating {}", path.display()))
}

/// Remote and inline references are not checked on disk.
fn is_local(path: &str) -> bool {
    !(path.starts_with("http://")
        || path.starts_with("https://")
        || path.starts_with("data:")
        || path.starts_with("//"))
}

/// Referenced asset files that do not exist under `root`.
pub fn missing_assets(config: &Configuration, root: &Path) -> Vec<PathBuf> {
    config
        .asset_paths()
        .into_iter()
        .filter(|p| is_local(p))
        .map(|p| root.join(p.trim_start_matches('/')))
        .filter(|p| !p.is_file())
        .collect()
}

/// Textures on each material slot for one selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanEntry {
    pub color: String,
    pub strap: String,
    /// `(slot, material, base colour texture)`
    pub slots: Vec<(MaterialSlot, String, Option<String>)>,
    pub roughness: Option<String>,
}

impl fmt::Display for PlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<12} {:<12}", self.color, self.strap)?;
        for (slot, material, texture) in &self.slots {
            write!(
                f,
                "  {}({})={}",
                slot,
                material,
                texture.as_deref().unwrap_or("-")
            )?;
        }
        if let Some(r) = &self.roughness {
            write!(f, "  roughness={}", r)?;
        }
        Ok(())
    }
}

/// Drive the binder through every color and strap against a recording
/// viewer that exposes exactly the configured material names.
pub fn texture_plan(config: &Configuration) -> anyhow::Result<Vec<PlanEntry>> {
    let m = &config.materials;
    let viewer = RecordingViewer::new([&m.primary, &m.secondary, &m.accent]);
    let bus = EventBus::new();
    let log = EventLog::attach(&bus);
    let binder = Binder::new(
        Rc::new(config.clone()),
        Rc::new(viewer.clone()),
        Context::new(bus, system_clock()),
    )?;
    block_on(binder.initialize())?;

    let mut plan = Vec::with_capacity(config.colors.len() * config.straps.len());
    for color in &config.colors {
        block_on(binder.change_color(&color.id));
        for strap in &config.straps {
            block_on(binder.change_strap(&strap.id));
            let state = binder.state();
            plan.push(PlanEntry {
                color: state.color,
                strap: state.strap,
                slots: MaterialSlot::ALL
                    .iter()
                    .map(|slot| {
                        let material = m.name(*slot).to_string();
                        let texture = viewer.base_color_of(&material);
                        (*slot, material, texture)
                    })
                    .collect(),
                roughness: color.textures.roughness.clone(),
            });
        }
    }

    let errors: Vec<String> = log
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ConfiguratorEvent::Error(info) => Some(format!(
                "{}: {}",
                info.message,
                info.details.unwrap_or_default()
            )),
            _ => None,
        })
        .collect();
    binder.teardown();
    if !errors.is_empty() {
        return Err(anyhow!("dry run reported errors:\n  {}", errors.join("\n  ")));
    }
    Ok(plan)
}

pub fn default_share_url(config: &Configuration) -> anyhow::Result<String> {
    let state = configurator_core::SelectionState::from_defaults(config);
    Ok(configurator_core::share_url(SHARE_BASE, &state)?)
}
