use glam::{Affine3A, Mat4};

use crate::config::CameraSettings;

/// Perspective camera. Its pose comes from a separate [`Transform`]
/// (driven by the orbit controls); this struct only holds projection state.
///
/// [`Transform`]: crate::scene::Transform
#[derive(Debug, Clone)]
pub struct Camera {
    /// Vertical field of view, radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    view_matrix: Mat4,
    projection_matrix: Mat4,
    view_projection_matrix: Mat4,
}

impl Camera {
    /// `fov` is in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            fov: fov.to_radians(),
            aspect,
            near,
            far,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        };
        cam.update_projection_matrix();
        cam
    }

    #[must_use]
    pub fn from_settings(settings: &CameraSettings, aspect: f32) -> Self {
        Self::new_perspective(settings.fov_degrees, aspect, settings.near, settings.far)
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection_matrix();
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    /// Recomputes the view matrix from the camera's world transform.
    pub fn update_view_projection(&mut self, world_transform: &Affine3A) {
        self.view_matrix = Mat4::from(world_transform.inverse());
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.view_projection_matrix
    }
}
