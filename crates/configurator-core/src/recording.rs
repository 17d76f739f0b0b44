//! In-memory [`ModelViewer`] that records what the binder does to it.
//!
//! Used by the native checker's dry run and by tests. Loads and material
//! writes can be made to fail per URL or per material name, and loads can be
//! held back for a number of polls so overlapping calls interleave.

use crate::error::ViewerError;
use crate::viewer::{MaterialHandle, ModelViewer};
use fnv::{FnvHashMap, FnvHashSet};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Texture handle; `id` is unique per load, so two handles compare equal
/// only when they come from the same load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedTexture {
    pub id: u64,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Applied {
    BaseColor { material: String, url: String },
    Roughness { material: String, url: String },
    AutoRotate(bool),
    Background(String),
}

#[derive(Default)]
struct Recorder {
    materials: Vec<String>,
    loads: RefCell<Vec<String>>,
    applied: RefCell<Vec<Applied>>,
    failing_urls: RefCell<FnvHashSet<String>>,
    failing_materials: RefCell<FnvHashSet<String>>,
    delays: RefCell<FnvHashMap<String, usize>>,
    next_id: Cell<u64>,
}

#[derive(Clone)]
pub struct RecordingViewer {
    rec: Rc<Recorder>,
}

pub struct RecordedMaterial {
    name: String,
    rec: Rc<Recorder>,
}

impl RecordingViewer {
    /// A viewer whose model exposes the given material names.
    pub fn new<S: Into<String>>(materials: impl IntoIterator<Item = S>) -> Self {
        Self {
            rec: Rc::new(Recorder {
                materials: materials.into_iter().map(Into::into).collect(),
                ..Recorder::default()
            }),
        }
    }

    /// Make every future load of `url` fail with a network error.
    pub fn fail_url(&self, url: &str) {
        self.rec.failing_urls.borrow_mut().insert(url.to_string());
    }

    /// Make every future texture write to `material` fail.
    pub fn fail_material(&self, material: &str) {
        self.rec
            .failing_materials
            .borrow_mut()
            .insert(material.to_string());
    }

    /// Hold every future load of `url` back for `polls` polls before it
    /// resolves or fails.
    pub fn delay_url(&self, url: &str, polls: usize) {
        self.rec.delays.borrow_mut().insert(url.to_string(), polls);
    }

    pub fn heal(&self) {
        self.rec.failing_urls.borrow_mut().clear();
        self.rec.failing_materials.borrow_mut().clear();
    }

    /// URLs passed to `create_texture`, in call order.
    pub fn loads(&self) -> Vec<String> {
        self.rec.loads.borrow().clone()
    }

    pub fn load_count(&self, url: &str) -> usize {
        self.rec.loads.borrow().iter().filter(|u| *u == url).count()
    }

    pub fn applied(&self) -> Vec<Applied> {
        self.rec.applied.borrow().clone()
    }

    pub fn clear_applied(&self) {
        self.rec.applied.borrow_mut().clear();
    }

    /// Last base-color texture URL written to `material`.
    pub fn base_color_of(&self, material: &str) -> Option<String> {
        self.rec.applied.borrow().iter().rev().find_map(|a| match a {
            Applied::BaseColor { material: m, url } if m == material => Some(url.clone()),
            _ => None,
        })
    }
}

impl RecordedMaterial {
    fn write(&self, entry: Applied) -> Result<(), ViewerError> {
        if self.rec.failing_materials.borrow().contains(&self.name) {
            return Err(ViewerError::Render(format!(
                "cannot bind texture to `{}`",
                self.name
            )));
        }
        self.rec.applied.borrow_mut().push(entry);
        Ok(())
    }
}

impl MaterialHandle for RecordedMaterial {
    type Texture = RecordedTexture;

    fn set_base_color_texture(&self, texture: &RecordedTexture) -> Result<(), ViewerError> {
        self.write(Applied::BaseColor {
            material: self.name.clone(),
            url: texture.url.clone(),
        })
    }

    fn set_roughness_texture(&self, texture: &RecordedTexture) -> Result<(), ViewerError> {
        self.write(Applied::Roughness {
            material: self.name.clone(),
            url: texture.url.clone(),
        })
    }
}

impl ModelViewer for RecordingViewer {
    type Texture = RecordedTexture;
    type Material = RecordedMaterial;

    fn material_by_name(&self, name: &str) -> Option<RecordedMaterial> {
        self.rec
            .materials
            .iter()
            .any(|m| m == name)
            .then(|| RecordedMaterial {
                name: name.to_string(),
                rec: self.rec.clone(),
            })
    }

    async fn create_texture(&self, url: &str) -> Result<RecordedTexture, ViewerError> {
        self.rec.loads.borrow_mut().push(url.to_string());
        let polls = self.rec.delays.borrow().get(url).copied().unwrap_or(0);
        for _ in 0..polls {
            YieldNow(false).await;
        }
        if self.rec.failing_urls.borrow().contains(url) {
            return Err(ViewerError::Network {
                url: url.to_string(),
                reason: "simulated failure".into(),
            });
        }
        let id = self.rec.next_id.get() + 1;
        self.rec.next_id.set(id);
        Ok(RecordedTexture {
            id,
            url: url.to_string(),
        })
    }

    fn set_auto_rotate(&self, enabled: bool) {
        self.rec.applied.borrow_mut().push(Applied::AutoRotate(enabled));
    }

    fn set_background(&self, background: &str) {
        self.rec
            .applied
            .borrow_mut()
            .push(Applied::Background(background.to_string()));
    }
}

/// Pending once, waking itself, then ready.
struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }
        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Poll `a` then `b` on every wake until both finish. Lets a single-threaded
/// executor interleave two binder calls the way overlapping UI clicks do.
pub async fn join<A: Future, B: Future>(a: A, b: B) -> (A::Output, B::Output) {
    let mut a = Box::pin(a);
    let mut b = Box::pin(b);
    let mut out_a = None;
    let mut out_b = None;
    std::future::poll_fn(move |cx| {
        if out_a.is_none() {
            if let Poll::Ready(v) = a.as_mut().poll(cx) {
                out_a = Some(v);
            }
        }
        if out_b.is_none() {
            if let Poll::Ready(v) = b.as_mut().poll(cx) {
                out_b = Some(v);
            }
        }
        match (out_a.take(), out_b.take()) {
            (Some(x), Some(y)) => Poll::Ready((x, y)),
            (x, y) => {
                out_a = x;
                out_b = y;
                Poll::Pending
            }
        }
    })
    .await
}
