//! Viewer Configuration
//!
//! [`ViewerConfig`] is an immutable settings object built once at startup and
//! handed to the components that need it. Every field has a default matching
//! the Bushido showcase, and any subset can be overridden from JSON:
//!
//! ```rust,ignore
//! let config = ViewerConfig::from_json_str(r#"{ "camera": { "fov_degrees": 50.0 } }"#)?;
//! ```

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
use std::path::Path;

use glam::{Affine3A, EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ViewerError};

/// Top-level viewer settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub viewport: ViewportSettings,
    pub camera: CameraSettings,
    pub controls: ControlSettings,
    pub lighting: LightingSettings,
    pub environment: EnvironmentSettings,
    pub material: MaterialPreset,
    pub model: ModelPlacement,
    pub animation: AnimationSettings,
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks settings that other components rely on without re-validating.
    pub fn validate(&self) -> Result<()> {
        self.camera.validate()?;
        self.controls.validate()?;
        self.animation.validate()?;
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ViewerError::InvalidCameraSettings(format!(
                "viewport must be non-empty, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub width: u32,
    pub height: u32,
    /// Linear RGBA clear colour.
    pub background: [f32; 4],
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 600,
            background: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: [0.0, 2.0, 5.0],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ViewerError::InvalidCameraSettings(format!(
                "fov must be in (0, 180) degrees, got {}",
                self.fov_degrees
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(ViewerError::InvalidCameraSettings(format!(
                "clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        if Vec3::from_array(self.position) == Vec3::from_array(self.target) {
            return Err(ViewerError::InvalidCameraSettings(
                "camera position coincides with its target".to_string(),
            ));
        }
        Ok(())
    }
}

/// Orbit-control bounds. Angles are polar angles measured from +Y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            min_polar_angle: FRAC_PI_4,
            max_polar_angle: FRAC_PI_2,
            min_distance: 3.0,
            max_distance: 10.0,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 0.5,
            zoom_speed: 0.05,
        }
    }
}

impl ControlSettings {
    /// Rejects bounds that would let the camera dip below the floor plane,
    /// flip over the pole, or pass through the orbit target.
    pub fn validate(&self) -> Result<()> {
        if self.min_polar_angle < 0.0 {
            return Err(ViewerError::InvalidCameraSettings(format!(
                "min polar angle must be >= 0, got {}",
                self.min_polar_angle
            )));
        }
        if self.max_polar_angle > FRAC_PI_2 + 1e-6 {
            return Err(ViewerError::InvalidCameraSettings(format!(
                "max polar angle {} would place the camera below the floor",
                self.max_polar_angle
            )));
        }
        if self.min_polar_angle >= self.max_polar_angle {
            return Err(ViewerError::InvalidCameraSettings(format!(
                "polar range is empty or inverted: [{}, {}]",
                self.min_polar_angle, self.max_polar_angle
            )));
        }
        if !(self.min_distance > 0.0 && self.max_distance >= self.min_distance) {
            return Err(ViewerError::InvalidCameraSettings(format!(
                "zoom range must satisfy 0 < min <= max, got [{}, {}]",
                self.min_distance, self.max_distance
            )));
        }
        if !(0.0..1.0).contains(&self.damping_factor) {
            return Err(ViewerError::InvalidCameraSettings(format!(
                "damping factor must be in [0, 1), got {}",
                self.damping_factor
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalLightSettings {
    pub intensity: f32,
    pub position: [f32; 3],
    pub cast_shadow: bool,
    pub shadow_map_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSettings {
    pub ambient_intensity: f32,
    pub key: DirectionalLightSettings,
    pub fill: DirectionalLightSettings,
}

impl Default for DirectionalLightSettings {
    fn default() -> Self {
        Self {
            intensity: 1.5,
            position: [2.5, 8.0, 5.0],
            cast_shadow: true,
            shadow_map_size: 1024,
        }
    }
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.5,
            key: DirectionalLightSettings::default(),
            fill: DirectionalLightSettings {
                intensity: 0.5,
                position: [-5.0, 5.0, -5.0],
                cast_shadow: false,
                shadow_map_size: 0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    pub preset: String,
    pub blur: f32,
    pub background: bool,
    pub intensity: f32,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            preset: "sunset".to_string(),
            blur: 0.8,
            background: true,
            intensity: 1.0,
        }
    }
}

/// Physically-based parameters applied to every mesh of a loaded rig.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialPreset {
    pub roughness: f32,
    pub metalness: f32,
    pub env_map_intensity: f32,
}

impl MaterialPreset {
    pub const DEFAULT: Self = Self {
        roughness: 0.7,
        metalness: 0.3,
        env_map_intensity: 1.0,
    };
    pub const METAL: Self = Self {
        roughness: 0.2,
        metalness: 0.8,
        env_map_intensity: 1.5,
    };
    pub const MATTE: Self = Self {
        roughness: 0.9,
        metalness: 0.1,
        env_map_intensity: 0.5,
    };
}

impl Default for MaterialPreset {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Where a loaded character sits in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPlacement {
    pub scale: f32,
    pub position: [f32; 3],
    /// Euler XYZ, radians.
    pub rotation: [f32; 3],
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Default for ModelPlacement {
    fn default() -> Self {
        Self {
            scale: 2.0,
            position: [0.0, -1.0, 0.0],
            rotation: [0.0, 0.0, 0.0],
            cast_shadow: true,
            receive_shadow: true,
        }
    }
}

impl ModelPlacement {
    #[must_use]
    pub fn matrix(&self) -> Affine3A {
        let [x, y, z] = self.rotation;
        Affine3A::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_euler(EulerRot::XYZ, x, y, z),
            Vec3::from_array(self.position),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub default_blend_time: f32,
    pub default_speed: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub speed_step: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            default_blend_time: 0.5,
            default_speed: 1.0,
            speed_min: 0.1,
            speed_max: 2.0,
            speed_step: 0.1,
        }
    }
}

impl AnimationSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.speed_min > 0.0 && self.speed_max >= self.speed_min) {
            return Err(ViewerError::InvalidSpeed(self.speed_min));
        }
        if !(self.speed_min..=self.speed_max).contains(&self.default_speed) {
            return Err(ViewerError::InvalidSpeed(self.default_speed));
        }
        Ok(())
    }

    /// Clamps a user-requested speed into the configured range.
    #[must_use]
    pub fn clamp_speed(&self, speed: f32) -> f32 {
        speed.clamp(self.speed_min, self.speed_max)
    }
}
