use std::fmt;

use glam::{Affine3A, Vec3};
use serde::{Deserialize, Serialize};

use crate::resources::GpuResources;
use crate::scene::ModelScene;

/// Slot a trait overlay occupies on a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraitCategory {
    Armor,
    Weapon,
    Mask,
}

impl TraitCategory {
    pub const ALL: [TraitCategory; 3] = [TraitCategory::Armor, TraitCategory::Weapon, TraitCategory::Mask];

    /// Offset of the overlay relative to the character root, before placement.
    #[must_use]
    pub fn default_offset(self) -> Vec3 {
        match self {
            TraitCategory::Armor => Vec3::ZERO,
            TraitCategory::Weapon => Vec3::new(0.5, 0.0, 0.0),
            TraitCategory::Mask => Vec3::new(0.0, 1.6, 0.0),
        }
    }

    fn index(self) -> usize {
        match self {
            TraitCategory::Armor => 0,
            TraitCategory::Weapon => 1,
            TraitCategory::Mask => 2,
        }
    }
}

impl fmt::Display for TraitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TraitCategory::Armor => "armor",
            TraitCategory::Weapon => "weapon",
            TraitCategory::Mask => "mask",
        })
    }
}

/// An accessory model layered over the character.
#[derive(Debug)]
pub struct TraitOverlay {
    pub uri: String,
    pub offset: Vec3,
    pub scene: ModelScene,
}

impl TraitOverlay {
    pub(crate) fn update_world(&mut self, placement: &Affine3A) {
        let parent = *placement * Affine3A::from_translation(self.offset);
        self.scene.update_world_matrices(&parent);
    }
}

/// At most one overlay per category.
#[derive(Debug, Default)]
pub struct TraitSlots {
    slots: [Option<TraitOverlay>; 3],
}

impl TraitSlots {
    #[must_use]
    pub fn get(&self, category: TraitCategory) -> Option<&TraitOverlay> {
        self.slots[category.index()].as_ref()
    }

    /// Puts `overlay` into its slot and returns the previous occupant.
    pub(crate) fn replace(&mut self, category: TraitCategory, overlay: TraitOverlay) -> Option<TraitOverlay> {
        self.slots[category.index()].replace(overlay)
    }

    pub(crate) fn take(&mut self, category: TraitCategory) -> Option<TraitOverlay> {
        self.slots[category.index()].take()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TraitCategory, &TraitOverlay)> {
        TraitCategory::ALL
            .into_iter()
            .filter_map(|c| self.get(c).map(|o| (c, o)))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TraitOverlay> {
        self.slots.iter_mut().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Disposes every overlay's resources and empties all slots.
    pub(crate) fn dispose_all(&mut self, resources: &GpuResources) {
        for slot in &mut self.slots {
            if let Some(mut overlay) = slot.take() {
                overlay.scene.dispose(resources);
            }
        }
    }
}
