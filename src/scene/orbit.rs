use glam::{Vec2, Vec3};

use crate::config::ControlSettings;
use crate::errors::Result;
use crate::scene::transform::Transform;

/// Orbit camera around a fixed target, in spherical coordinates.
///
/// `theta` is the azimuth around +Y, `phi` the polar angle from +Y. Rotation
/// requests accumulate into a pending delta that is applied with damping on
/// each [`OrbitControls::update`].
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub settings: ControlSettings,

    pub center: Vec3,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,

    home: (f32, f32, f32),
    rotate_delta: Vec2,
}

impl OrbitControls {
    /// Starts orbiting `center` from `eye`. Fails if the settings would put
    /// the camera below the floor or invert the view.
    pub fn new(eye: Vec3, center: Vec3, settings: ControlSettings) -> Result<Self> {
        settings.validate()?;

        let offset = eye - center;
        let radius = offset.length().clamp(settings.min_distance, settings.max_distance);
        let theta = offset.x.atan2(offset.z);
        let phi = (offset.y / offset.length().max(f32::EPSILON))
            .clamp(-1.0, 1.0)
            .acos()
            .clamp(settings.min_polar_angle, settings.max_polar_angle);

        Ok(Self {
            settings,
            center,
            radius,
            theta,
            phi,
            home: (theta, phi, radius),
            rotate_delta: Vec2::ZERO,
        })
    }

    /// Queues a rotation: `delta.x` around +Y, `delta.y` away from the pole.
    pub fn rotate(&mut self, delta: Vec2) {
        self.rotate_delta += delta;
    }

    /// Zooms by `steps` wheel notches; positive moves closer.
    pub fn zoom(&mut self, steps: f32) {
        let scale = (1.0 - self.settings.zoom_speed).powf(steps.abs());
        if steps > 0.0 {
            self.radius *= scale;
        } else {
            self.radius /= scale;
        }
        self.radius = self.radius.clamp(self.settings.min_distance, self.settings.max_distance);
    }

    /// Returns to the initial pose and drops any pending rotation.
    pub fn reset(&mut self) {
        (self.theta, self.phi, self.radius) = self.home;
        self.rotate_delta = Vec2::ZERO;
    }

    /// Pending rotation not yet applied.
    #[must_use]
    pub fn pending(&self) -> Vec2 {
        self.rotate_delta
    }

    /// Applies pending rotation and writes the camera pose into `transform`.
    pub fn update(&mut self, transform: &mut Transform, dt: f32) {
        if self.settings.enable_damping {
            let retention = (1.0 - self.settings.damping_factor).powf(dt * 60.0);
            let applied = self.rotate_delta * (1.0 - retention);
            self.theta += applied.x;
            self.phi += applied.y;
            self.rotate_delta *= retention;
        } else {
            self.theta += self.rotate_delta.x;
            self.phi += self.rotate_delta.y;
            self.rotate_delta = Vec2::ZERO;
        }

        self.phi = self
            .phi
            .clamp(self.settings.min_polar_angle, self.settings.max_polar_angle)
            .clamp(EPS, std::f32::consts::PI - EPS);

        transform.position = self.center + self.offset();
        transform.look_at(self.center, Vec3::Y);
        transform.mark_dirty();
    }

    /// Camera position relative to the target.
    #[must_use]
    pub fn offset(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta) * self.radius
    }
}

const EPS: f32 = 0.0001;
