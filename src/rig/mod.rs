//! Character rig: the loaded character model, its animation mixer and its
//! trait overlays.
//!
//! A rig moves through `Empty -> Loading -> Ready -> (Loading) -> Disposed`.
//! While a replacement model loads, the previous one stays in place and keeps
//! animating; it is disposed only once the replacement has arrived.

pub mod traits;

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::animation::AnimationMixer;
use crate::config::{MaterialPreset, ModelPlacement};
use crate::errors::{AssetError, Result, ViewerError};
use crate::resources::{GpuResources, Material, MaterialHandle};
use crate::scene::{DrawItem, ModelScene};

pub use traits::{TraitCategory, TraitOverlay, TraitSlots};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigState {
    Empty,
    Loading,
    Ready,
    Disposed,
}

impl fmt::Display for RigState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RigState::Empty => "empty",
            RigState::Loading => "loading",
            RigState::Ready => "ready",
            RigState::Disposed => "disposed",
        })
    }
}

pub struct CharacterRig {
    state: RigState,
    model: Option<ModelScene>,
    source_uri: Option<String>,
    mixer: AnimationMixer,
    traits: TraitSlots,

    resources: Arc<GpuResources>,
    placement: ModelPlacement,
    material: MaterialPreset,

    models_disposed: u64,
}

impl CharacterRig {
    #[must_use]
    pub fn new(resources: Arc<GpuResources>, placement: ModelPlacement, material: MaterialPreset) -> Self {
        Self {
            state: RigState::Empty,
            model: None,
            source_uri: None,
            mixer: AnimationMixer::new(),
            traits: TraitSlots::default(),
            resources,
            placement,
            material,
            models_disposed: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> RigState {
        self.state
    }

    /// Whether a character model is in place and can be animated. This holds
    /// while a replacement is loading, too.
    #[must_use]
    pub fn has_model(&self) -> bool {
        self.model.is_some() && self.state != RigState::Disposed
    }

    #[must_use]
    pub fn model(&self) -> Option<&ModelScene> {
        self.model.as_ref()
    }

    /// URI of the model currently in place.
    #[must_use]
    pub fn source_uri(&self) -> Option<&str> {
        self.source_uri.as_deref()
    }

    #[must_use]
    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    pub fn mixer_mut(&mut self) -> &mut AnimationMixer {
        &mut self.mixer
    }

    /// Mutable mixer together with the scene it binds against.
    pub(crate) fn animation_target(&mut self) -> Option<(&mut AnimationMixer, &ModelScene)> {
        let model = self.model.as_ref()?;
        Some((&mut self.mixer, model))
    }

    #[must_use]
    pub fn traits(&self) -> &TraitSlots {
        &self.traits
    }

    /// How many superseded character models this rig has released.
    #[must_use]
    pub fn models_disposed(&self) -> u64 {
        self.models_disposed
    }

    /// Marks a model load as in flight.
    pub fn begin_load(&mut self) -> Result<()> {
        match self.state {
            RigState::Disposed => Err(ViewerError::RigDisposed),
            _ => {
                self.state = RigState::Loading;
                Ok(())
            }
        }
    }

    /// Completes a model load.
    ///
    /// On success the new model replaces the old one: the old mixer and its
    /// actions are stopped first, then the old model's resources are
    /// released. On failure the rig falls back to whatever it showed before.
    pub fn finish_load(&mut self, uri: &str, result: std::result::Result<ModelScene, AssetError>) -> Result<()> {
        let mut scene = match result {
            Ok(scene) => scene,
            Err(source) => {
                if self.state != RigState::Disposed {
                    self.state = if self.model.is_some() { RigState::Ready } else { RigState::Empty };
                }
                warn!("Model load failed for {uri}: {source}");
                return Err(ViewerError::AssetLoad {
                    uri: uri.to_string(),
                    source,
                });
            }
        };

        if self.state == RigState::Disposed {
            scene.dispose(&self.resources);
            return Err(ViewerError::RigDisposed);
        }

        apply_material_policy(&mut scene, &self.resources, &self.material, &self.placement);

        self.mixer.stop_all_action();
        self.mixer = AnimationMixer::new();
        if let Some(mut old) = self.model.take() {
            old.dispose(&self.resources);
            self.models_disposed += 1;
        }

        scene.update_world_matrices(&self.placement.matrix());
        info!("Rig ready: '{}' ({} nodes, {} parts)", scene.label, scene.len(), scene.part_count());
        self.model = Some(scene);
        self.source_uri = Some(uri.to_string());
        self.state = RigState::Ready;
        Ok(())
    }

    /// Places an overlay in `category`, disposing the previous occupant.
    pub fn attach_trait(&mut self, category: TraitCategory, uri: &str, mut scene: ModelScene) -> Result<()> {
        if self.state == RigState::Disposed {
            scene.dispose(&self.resources);
            return Err(ViewerError::RigDisposed);
        }

        apply_material_policy(&mut scene, &self.resources, &self.material, &self.placement);
        let mut overlay = TraitOverlay {
            uri: uri.to_string(),
            offset: category.default_offset(),
            scene,
        };
        overlay.update_world(&self.placement.matrix());

        if let Some(mut previous) = self.traits.replace(category, overlay) {
            debug!("Replacing {category} trait {}", previous.uri);
            previous.scene.dispose(&self.resources);
        }
        Ok(())
    }

    /// Removes and disposes the overlay in `category`. Returns whether one
    /// was attached.
    pub fn detach_trait(&mut self, category: TraitCategory) -> bool {
        match self.traits.take(category) {
            Some(mut overlay) => {
                overlay.scene.dispose(&self.resources);
                true
            }
            None => false,
        }
    }

    /// Stops animation and releases every resource the rig holds.
    /// Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.state == RigState::Disposed {
            return;
        }
        self.mixer.stop_all_action();
        if let Some(mut model) = self.model.take() {
            model.dispose(&self.resources);
            self.models_disposed += 1;
        }
        self.traits.dispose_all(&self.resources);
        self.source_uri = None;
        self.state = RigState::Disposed;
        debug!("Rig disposed");
    }

    /// Advances the mixer and refreshes world matrices.
    pub fn update(&mut self, dt: f32) {
        if self.state == RigState::Disposed {
            return;
        }
        let placement = self.placement.matrix();
        if let Some(model) = self.model.as_mut() {
            self.mixer.update(dt, model);
            model.update_world_matrices(&placement);
        }
        for overlay in self.traits.iter_mut() {
            overlay.update_world(&placement);
        }
    }

    /// Appends the visible parts of the character and its overlays.
    pub fn collect_draws(&self, out: &mut Vec<DrawItem>) {
        if let Some(model) = &self.model {
            out.extend(model.draw_items());
        }
        for (_, overlay) in self.traits.iter() {
            out.extend(overlay.scene.draw_items());
        }
    }
}

impl Drop for CharacterRig {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Replaces each distinct source material with a standardized one and
/// releases the source. Shared materials stay shared.
fn apply_material_policy(
    scene: &mut ModelScene,
    resources: &GpuResources,
    preset: &MaterialPreset,
    placement: &ModelPlacement,
) {
    let mut replaced: FxHashMap<MaterialHandle, MaterialHandle> = FxHashMap::default();
    scene.for_each_part_mut(|part| {
        let standard = *replaced.entry(part.material).or_insert_with(|| {
            let source = resources
                .material(part.material)
                .map_or_else(|| Material::imported("default"), |m| (*m).clone());
            resources.add_material(Material::standardized(&source, preset))
        });
        part.material = standard;
        part.cast_shadow = placement.cast_shadow;
        part.receive_shadow = placement.receive_shadow;
    });
    for source in replaced.into_keys() {
        resources.dispose_material(source);
    }
}
