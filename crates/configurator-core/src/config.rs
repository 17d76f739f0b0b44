//! Product configuration schema.
//!
//! The document is JSON, read once at startup. Parsing goes through loose
//! `*Document` mirrors so that a missing texture or a strap declaring both a
//! fixed texture and the dynamic marker becomes a [`ConfigError`] naming the
//! offending entry rather than a generic serde message.

use crate::error::ConfigError;
use serde::Deserialize;
use smallvec::SmallVec;
use std::collections::HashSet;

/// Logical material slot on the product model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialSlot {
    Primary,
    Secondary,
    Accent,
}

impl MaterialSlot {
    pub const ALL: [MaterialSlot; 3] = [
        MaterialSlot::Primary,
        MaterialSlot::Secondary,
        MaterialSlot::Accent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialSlot::Primary => "primary",
            MaterialSlot::Secondary => "secondary",
            MaterialSlot::Accent => "accent",
        }
    }
}

impl std::fmt::Display for MaterialSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model-specific material names for each logical slot.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MaterialBindings {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

impl MaterialBindings {
    pub fn name(&self, slot: MaterialSlot) -> &str {
        match slot {
            MaterialSlot::Primary => &self.primary,
            MaterialSlot::Secondary => &self.secondary,
            MaterialSlot::Accent => &self.accent,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorTextures {
    pub primary: String,
    pub accent: String,
    pub roughness: Option<String>,
}

impl ColorTextures {
    /// Texture URLs in load order.
    pub fn urls(&self) -> SmallVec<[&str; 3]> {
        let mut out: SmallVec<[&str; 3]> = SmallVec::new();
        out.push(&self.primary);
        out.push(&self.accent);
        if let Some(r) = &self.roughness {
            out.push(r);
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Color {
    pub id: String,
    pub name: String,
    pub preview: String,
    pub textures: ColorTextures,
}

/// Where a strap's texture comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StrapTexture {
    Fixed(String),
    /// Follow the selected color's accent texture.
    Dynamic,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Strap {
    pub id: String,
    pub name: String,
    pub preview: Option<String>,
    pub texture: StrapTexture,
}

impl Strap {
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        matches!(self.texture, StrapTexture::Dynamic)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Environment {
    pub id: String,
    pub name: String,
    /// CSS gradient used for the option tile.
    pub gradient: String,
    /// Scene background handed to the viewer.
    pub background: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Defaults {
    pub color: String,
    pub strap: String,
    pub environment: String,
}

/// Immutable, validated product configuration.
///
/// Build it with [`Configuration::from_json`] or
/// [`Configuration::from_document`]; a value assembled by hand must pass
/// [`Configuration::validate`] before a binder will accept it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    pub id: String,
    pub name: String,
    pub model_path: String,
    pub materials: MaterialBindings,
    pub colors: Vec<Color>,
    pub straps: Vec<Strap>,
    pub environments: Vec<Environment>,
    pub defaults: Defaults,
}

// ---------------- Document mirrors ----------------

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub model_path: String,
    pub materials: MaterialBindings,
    #[serde(default)]
    pub colors: Vec<ColorDocument>,
    #[serde(default)]
    pub straps: Vec<StrapDocument>,
    #[serde(default)]
    pub environments: Vec<Environment>,
    pub defaults: Defaults,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ColorDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub textures: TexturesDocument,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TexturesDocument {
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub accent: Option<String>,
    #[serde(default)]
    pub roughness: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StrapDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(default)]
    pub dynamic: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl Configuration {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let doc: ConfigDocument = serde_json::from_str(text)?;
        Self::from_document(doc)
    }

    pub fn from_document(doc: ConfigDocument) -> Result<Self, ConfigError> {
        let colors = doc
            .colors
            .into_iter()
            .map(|c| {
                let primary = non_empty(c.textures.primary).ok_or_else(|| {
                    ConfigError::MissingTexture {
                        color: c.id.clone(),
                        texture: "primary",
                    }
                })?;
                let accent = non_empty(c.textures.accent).ok_or_else(|| {
                    ConfigError::MissingTexture {
                        color: c.id.clone(),
                        texture: "accent",
                    }
                })?;
                Ok(Color {
                    id: c.id,
                    name: c.name,
                    preview: c.preview,
                    textures: ColorTextures {
                        primary,
                        accent,
                        roughness: non_empty(c.textures.roughness),
                    },
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let straps = doc
            .straps
            .into_iter()
            .map(|s| {
                let texture = match (non_empty(s.texture), s.dynamic) {
                    (Some(path), false) => StrapTexture::Fixed(path),
                    (None, true) => StrapTexture::Dynamic,
                    _ => return Err(ConfigError::AmbiguousStrap(s.id)),
                };
                Ok(Strap {
                    id: s.id,
                    name: s.name,
                    preview: s.preview,
                    texture,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let config = Configuration {
            name: doc.name.unwrap_or_else(|| doc.id.clone()),
            id: doc.id,
            model_path: doc.model_path,
            materials: doc.materials,
            colors,
            straps,
            environments: doc.environments,
            defaults: doc.defaults,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the cross-entry invariants: non-empty axes, unique ids, a single
    /// dynamic strap, defaults that exist and non-empty material names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for slot in MaterialSlot::ALL {
            if self.materials.name(slot).trim().is_empty() {
                return Err(ConfigError::EmptyMaterialName(slot));
            }
        }
        if self.colors.is_empty() {
            return Err(ConfigError::Empty("colors"));
        }
        if self.straps.is_empty() {
            return Err(ConfigError::Empty("straps"));
        }
        if self.environments.is_empty() {
            return Err(ConfigError::Empty("environments"));
        }
        unique_ids("color", self.colors.iter().map(|c| c.id.as_str()))?;
        unique_ids("strap", self.straps.iter().map(|s| s.id.as_str()))?;
        unique_ids(
            "environment",
            self.environments.iter().map(|e| e.id.as_str()),
        )?;

        for c in &self.colors {
            if c.textures.primary.trim().is_empty() {
                return Err(ConfigError::MissingTexture {
                    color: c.id.clone(),
                    texture: "primary",
                });
            }
            if c.textures.accent.trim().is_empty() {
                return Err(ConfigError::MissingTexture {
                    color: c.id.clone(),
                    texture: "accent",
                });
            }
        }

        let mut dynamic = self.straps.iter().filter(|s| s.is_dynamic());
        match (dynamic.next(), dynamic.next()) {
            (None, _) => return Err(ConfigError::NoDynamicStrap),
            (Some(a), Some(b)) => {
                return Err(ConfigError::MultipleDynamicStraps(
                    a.id.clone(),
                    b.id.clone(),
                ))
            }
            _ => {}
        }

        if self.color(&self.defaults.color).is_none() {
            return Err(ConfigError::UnknownDefault {
                axis: "color",
                id: self.defaults.color.clone(),
            });
        }
        if self.strap(&self.defaults.strap).is_none() {
            return Err(ConfigError::UnknownDefault {
                axis: "strap",
                id: self.defaults.strap.clone(),
            });
        }
        if self.environment(&self.defaults.environment).is_none() {
            return Err(ConfigError::UnknownDefault {
                axis: "environment",
                id: self.defaults.environment.clone(),
            });
        }
        Ok(())
    }

    pub fn color(&self, id: &str) -> Option<&Color> {
        self.colors.iter().find(|c| c.id == id)
    }

    pub fn strap(&self, id: &str) -> Option<&Strap> {
        self.straps.iter().find(|s| s.id == id)
    }

    pub fn environment(&self, id: &str) -> Option<&Environment> {
        self.environments.iter().find(|e| e.id == id)
    }

    /// The strap whose texture follows the selected color.
    pub fn dynamic_strap(&self) -> Option<&Strap> {
        self.straps.iter().find(|s| s.is_dynamic())
    }

    /// Every asset path the document references, model first.
    pub fn asset_paths(&self) -> Vec<&str> {
        let mut out = vec![self.model_path.as_str()];
        for c in &self.colors {
            if !c.preview.is_empty() {
                out.push(&c.preview);
            }
            out.extend(c.textures.urls());
        }
        for s in &self.straps {
            if let Some(p) = &s.preview {
                out.push(p);
            }
            if let StrapTexture::Fixed(p) = &s.texture {
                out.push(p);
            }
        }
        let mut seen = HashSet::new();
        out.retain(|p| seen.insert(*p));
        out
    }
}

fn unique_ids<'a>(
    axis: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ConfigError::DuplicateId {
                axis,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
