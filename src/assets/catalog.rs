//! Asset catalog: the static, ordered lists of selectable character models
//! and animations, and id → URI resolution over them.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ViewerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPolicy {
    Repeat,
    PlayOnce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationCategory {
    Movement,
    Action,
    Dance,
    Idle,
    #[default]
    Other,
}

impl fmt::Display for AnimationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnimationCategory::Movement => "movement",
            AnimationCategory::Action => "action",
            AnimationCategory::Dance => "dance",
            AnimationCategory::Idle => "idle",
            AnimationCategory::Other => "other",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAsset {
    pub id: String,
    pub display_name: String,
    pub mesh_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationAsset {
    pub id: String,
    pub display_name: String,
    pub clip_uri: String,
    pub loop_policy: LoopPolicy,
    #[serde(default = "one")]
    pub default_speed: f32,
    pub blend_duration_seconds: f32,
    #[serde(default)]
    pub category: AnimationCategory,
}

fn one() -> f32 {
    1.0
}

/// Result of [`AssetCatalog::metadata`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssetMetadata<'a> {
    Model(&'a ModelAsset),
    Animation(&'a AnimationAsset),
}

#[derive(Debug, Clone, Copy)]
enum Entry {
    Model(usize),
    Animation(usize),
}

/// Serialized form of a catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub models: Vec<ModelAsset>,
    #[serde(default)]
    pub animations: Vec<AnimationAsset>,
}

/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    models: Vec<ModelAsset>,
    animations: Vec<AnimationAsset>,
    index: FxHashMap<String, Entry>,
}

impl AssetCatalog {
    /// Validates and indexes the given assets. Ids must be unique across
    /// both lists.
    pub fn new(models: Vec<ModelAsset>, animations: Vec<AnimationAsset>) -> Result<Self> {
        let mut index = FxHashMap::default();

        for (i, m) in models.iter().enumerate() {
            if m.mesh_uri.is_empty() {
                return Err(ViewerError::InvalidCatalog(format!("model '{}' has no mesh uri", m.id)));
            }
            if index.insert(m.id.clone(), Entry::Model(i)).is_some() {
                return Err(ViewerError::InvalidCatalog(format!("duplicate id '{}'", m.id)));
            }
        }
        for (i, a) in animations.iter().enumerate() {
            if a.clip_uri.is_empty() {
                return Err(ViewerError::InvalidCatalog(format!("animation '{}' has no clip uri", a.id)));
            }
            if !(a.default_speed.is_finite() && a.default_speed > 0.0) {
                return Err(ViewerError::InvalidCatalog(format!(
                    "animation '{}' has non-positive default speed {}",
                    a.id, a.default_speed
                )));
            }
            if !(a.blend_duration_seconds.is_finite() && a.blend_duration_seconds >= 0.0) {
                return Err(ViewerError::InvalidCatalog(format!(
                    "animation '{}' has negative blend duration {}",
                    a.id, a.blend_duration_seconds
                )));
            }
            if index.insert(a.id.clone(), Entry::Animation(i)).is_some() {
                return Err(ViewerError::InvalidCatalog(format!("duplicate id '{}'", a.id)));
            }
        }

        Ok(Self {
            models,
            animations,
            index,
        })
    }

    pub fn from_file(file: CatalogFile) -> Result<Self> {
        Self::new(file.models, file.animations)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_file(serde_json::from_str(json)?)
    }

    /// The Bushido collection: eight samurai and five shared animations.
    #[must_use]
    pub fn bushido() -> Self {
        let model = |id: &str, name: &str, uri: &str| ModelAsset {
            id: id.to_string(),
            display_name: name.to_string(),
            mesh_uri: uri.to_string(),
        };
        let models = vec![
            model("default-samurai", "Default Samurai", "/models/character.glb"),
            model("shadow-warrior", "Shadow Warrior", "/models/character (1).glb"),
            model("dragon-knight", "Dragon Knight", "/models/character (2).glb"),
            model("storm-blade", "Storm Blade", "/models/character (3).glb"),
            model("flame-master", "Flame Master", "/models/character (4).glb"),
            model("thunder-lord", "Thunder Lord", "/models/character (5).glb"),
            model("wind-walker", "Wind Walker", "/models/character (6).glb"),
            model("void-seeker", "Void Seeker", "/models/character (7).glb"),
        ];

        let animation = |id: &str, name: &str, file: &str, policy, blend, category| AnimationAsset {
            id: id.to_string(),
            display_name: name.to_string(),
            clip_uri: format!("/models/animations/{file}"),
            loop_policy: policy,
            default_speed: 1.0,
            blend_duration_seconds: blend,
            category,
        };
        let animations = vec![
            animation("walk", "Walk", "walk.glb", LoopPolicy::Repeat, 0.5, AnimationCategory::Movement),
            animation("death", "Death", "death.glb", LoopPolicy::PlayOnce, 0.3, AnimationCategory::Action),
            animation("hip-hop-dance", "Hip Hop Dance", "hiphop.glb", LoopPolicy::Repeat, 0.4, AnimationCategory::Dance),
            animation("pray", "Pray", "pray.glb", LoopPolicy::Repeat, 0.5, AnimationCategory::Action),
            animation("dance", "Dance", "dance.glb", LoopPolicy::Repeat, 0.4, AnimationCategory::Dance),
        ];

        let index = models
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), Entry::Model(i)))
            .chain(animations.iter().enumerate().map(|(i, a)| (a.id.clone(), Entry::Animation(i))))
            .collect();
        Self {
            models,
            animations,
            index,
        }
    }

    /// Models in display order.
    #[must_use]
    pub fn models(&self) -> &[ModelAsset] {
        &self.models
    }

    /// Animations in display order.
    #[must_use]
    pub fn animations(&self) -> &[AnimationAsset] {
        &self.animations
    }

    /// Animations of one category, in display order.
    pub fn animations_in(&self, category: AnimationCategory) -> impl Iterator<Item = &AnimationAsset> {
        self.animations.iter().filter(move |a| a.category == category)
    }

    /// URI of the mesh or clip behind `id`.
    pub fn resolve(&self, id: &str) -> Result<&str> {
        Ok(match self.metadata(id)? {
            AssetMetadata::Model(m) => &m.mesh_uri,
            AssetMetadata::Animation(a) => &a.clip_uri,
        })
    }

    pub fn metadata(&self, id: &str) -> Result<AssetMetadata<'_>> {
        match self.index.get(id) {
            Some(Entry::Model(i)) => Ok(AssetMetadata::Model(&self.models[*i])),
            Some(Entry::Animation(i)) => Ok(AssetMetadata::Animation(&self.animations[*i])),
            None => Err(ViewerError::AssetNotFound(id.to_string())),
        }
    }

    pub fn model(&self, id: &str) -> Result<&ModelAsset> {
        match self.metadata(id)? {
            AssetMetadata::Model(m) => Ok(m),
            AssetMetadata::Animation(_) => Err(ViewerError::AssetNotFound(id.to_string())),
        }
    }

    pub fn animation(&self, id: &str) -> Result<&AnimationAsset> {
        match self.metadata(id)? {
            AssetMetadata::Animation(a) => Ok(a),
            AssetMetadata::Model(_) => Err(ViewerError::AssetNotFound(id.to_string())),
        }
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::bushido()
    }
}
