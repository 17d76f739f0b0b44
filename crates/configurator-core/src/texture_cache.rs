//! Session-lifetime texture cache and background preloader.

use crate::config::Color;
use crate::constants::PRELOAD_DELAY_MS;
use crate::error::ViewerError;
use crate::events::{ConfiguratorEvent, EventBus};
use crate::viewer::ModelViewer;
use fnv::FnvHashMap;
use std::cell::{Cell, RefCell};
use std::future::Future;

/// Map from texture URL to loaded handle. Never evicts; [`close`] on
/// teardown empties it for good.
///
/// No borrow is held across the viewer's load, so overlapping `get` calls
/// for the same uncached URL each trigger a load. The first one to finish is
/// stored and every caller receives that stored handle.
///
/// [`close`]: TextureCache::close
pub struct TextureCache<T> {
    entries: RefCell<FnvHashMap<String, T>>,
    closed: Cell<bool>,
}

impl<T: Clone> TextureCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(FnvHashMap::default()),
            closed: Cell::new(false),
        }
    }

    pub fn cached(&self, url: &str) -> Option<T> {
        self.entries.borrow().get(url).cloned()
    }

    #[inline]
    pub fn contains(&self, url: &str) -> bool {
        self.entries.borrow().contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Clear and stop storing. Later loads still return handles but are not
    /// kept, and [`preload_all`] stops at its next color.
    pub fn close(&self) {
        self.closed.set(true);
        self.clear();
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Cached handle for `url`, loading it through `viewer` on a miss.
    pub async fn get<V>(&self, viewer: &V, url: &str) -> Result<T, ViewerError>
    where
        V: ModelViewer<Texture = T>,
    {
        if let Some(hit) = self.cached(url) {
            return Ok(hit);
        }
        log::debug!("[cache] loading {}", url);
        let texture = viewer.create_texture(url).await?;
        if self.is_closed() {
            return Ok(texture);
        }
        let stored = self
            .entries
            .borrow_mut()
            .entry(url.to_string())
            .or_insert(texture)
            .clone();
        Ok(stored)
    }
}

impl<T: Clone> Default for TextureCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts reported when preloading finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreloadSummary {
    pub loaded: usize,
    pub total: usize,
}

/// Colors in preload order: `priority` first, the rest in configuration order.
pub fn preload_order<'a>(colors: &'a [Color], priority: &str) -> Vec<&'a Color> {
    let mut out: Vec<&Color> = Vec::with_capacity(colors.len());
    out.extend(colors.iter().filter(|c| c.id == priority));
    out.extend(colors.iter().filter(|c| c.id != priority));
    out
}

#[inline]
pub fn percentage(loaded: usize, total: usize) -> u32 {
    if total == 0 {
        100
    } else {
        ((loaded as f64 / total as f64) * 100.0).round() as u32
    }
}

/// Warm the cache with every color's textures.
///
/// Waits on `sleep(PRELOAD_DELAY_MS)` between colors so interactive work gets
/// a turn. A color whose textures fail to load is logged and skipped; it does
/// not count towards `loaded`. Emits a progress event after each color and a
/// completion event at the end. Closing the cache stops the run before the
/// next color, without a completion event.
pub async fn preload_all<V, S, F>(
    viewer: &V,
    cache: &TextureCache<V::Texture>,
    colors: &[Color],
    priority: &str,
    mut sleep: S,
    bus: &EventBus,
) -> PreloadSummary
where
    V: ModelViewer,
    S: FnMut(u32) -> F,
    F: Future<Output = ()>,
{
    let order = preload_order(colors, priority);
    let total = order.len();
    let mut loaded = 0usize;

    for (i, color) in order.into_iter().enumerate() {
        if i > 0 {
            sleep(PRELOAD_DELAY_MS).await;
        }
        if cache.is_closed() {
            log::info!("[preload] cache closed; stopping at {}/{}", loaded, total);
            return PreloadSummary { loaded, total };
        }
        let mut failed = None;
        for url in color.textures.urls() {
            if let Err(e) = cache.get(viewer, url).await {
                failed = Some(e);
                break;
            }
        }
        match failed {
            None => loaded += 1,
            Some(e) => log::warn!("[preload] skipping color `{}`: {}", color.id, e),
        }
        bus.emit(ConfiguratorEvent::TexturePreloadProgress {
            loaded,
            total,
            percentage: percentage(loaded, total),
        });
    }

    log::info!("[preload] {}/{} colors ready", loaded, total);
    bus.emit(ConfiguratorEvent::TexturePreloadComplete { loaded, total });
    PreloadSummary { loaded, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColorTextures;

    fn color(id: &str) -> Color {
        Color {
            id: id.into(),
            name: id.into(),
            preview: String::new(),
            textures: ColorTextures {
                primary: format!("{id}_p.png"),
                accent: format!("{id}_a.png"),
                roughness: None,
            },
        }
    }

    #[test]
    fn priority_color_goes_first() {
        let colors = vec![color("red"), color("blue"), color("green")];
        let ids: Vec<&str> = preload_order(&colors, "green")
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["green", "red", "blue"]);
    }

    #[test]
    fn unknown_priority_keeps_configuration_order() {
        let colors = vec![color("red"), color("blue")];
        let ids: Vec<&str> = preload_order(&colors, "nope")
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["red", "blue"]);
    }

    #[test]
    fn percentage_rounds() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 0), 100);
    }
}
