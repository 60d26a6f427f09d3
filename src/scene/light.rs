use glam::Vec3;

use crate::config::{DirectionalLightSettings, LightingSettings};

#[derive(Debug, Clone, PartialEq)]
pub enum LightKind {
    Ambient,
    /// Parallel light shining from `position` toward the origin.
    Directional { position: Vec3 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShadowConfig {
    pub map_size: u32,
    pub bias: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            map_size: 1024,
            bias: -0.0001,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
    pub shadow: Option<ShadowConfig>,
}

impl Light {
    #[must_use]
    pub fn new_ambient(intensity: f32) -> Self {
        Self {
            color: Vec3::ONE,
            intensity,
            kind: LightKind::Ambient,
            shadow: None,
        }
    }

    #[must_use]
    pub fn new_directional(settings: &DirectionalLightSettings) -> Self {
        Self {
            color: Vec3::ONE,
            intensity: settings.intensity,
            kind: LightKind::Directional {
                position: Vec3::from_array(settings.position),
            },
            shadow: settings.cast_shadow.then(|| ShadowConfig {
                map_size: settings.shadow_map_size,
                ..ShadowConfig::default()
            }),
        }
    }

    /// The ambient, key and fill lights of the showcase stage.
    #[must_use]
    pub fn rig_from_settings(settings: &LightingSettings) -> Vec<Light> {
        vec![
            Self::new_ambient(settings.ambient_intensity),
            Self::new_directional(&settings.key),
            Self::new_directional(&settings.fill),
        ]
    }

    /// Unit vector pointing from the surface toward the light, if directional.
    #[must_use]
    pub fn direction_to_light(&self) -> Option<Vec3> {
        match self.kind {
            LightKind::Ambient => None,
            LightKind::Directional { position } => position.try_normalize(),
        }
    }
}
