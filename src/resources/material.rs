use glam::Vec4;

use crate::config::MaterialPreset;
use crate::resources::TextureHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    Double,
}

/// Where a material came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialOrigin {
    /// Authored in the asset file as-is.
    Imported,
    /// Produced by the rig's standard material policy.
    Standard,
}

/// Metallic-roughness PBR material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub label: String,
    pub origin: MaterialOrigin,
    pub base_color: Vec4,
    pub base_color_texture: Option<TextureHandle>,
    pub roughness: f32,
    pub metalness: f32,
    pub env_map_intensity: f32,
    pub side: Side,
    pub shadow_side: Side,
}

impl Material {
    #[must_use]
    pub fn imported(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            origin: MaterialOrigin::Imported,
            base_color: Vec4::ONE,
            base_color_texture: None,
            roughness: 1.0,
            metalness: 1.0,
            env_map_intensity: 1.0,
            side: Side::Front,
            shadow_side: Side::Front,
        }
    }

    /// Derives the standard showcase material from an imported one: the
    /// preset's PBR values, double-sided shadows, and the source's base
    /// colour factor and texture.
    #[must_use]
    pub fn standardized(source: &Material, preset: &MaterialPreset) -> Self {
        Self {
            label: source.label.clone(),
            origin: MaterialOrigin::Standard,
            base_color: source.base_color,
            base_color_texture: source.base_color_texture,
            roughness: preset.roughness,
            metalness: preset.metalness,
            env_map_intensity: preset.env_map_intensity,
            side: source.side,
            shadow_side: Side::Double,
        }
    }
}
