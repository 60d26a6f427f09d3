use glam::{Affine3A, Mat3, Quat, Vec3};

/// Local TRS of a node plus its cached matrices.
///
/// The local matrix is only rebuilt when one of the TRS fields changed since
/// the last call to [`Transform::update_local_matrix`].
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    local_matrix: Affine3A,
    world_matrix: Affine3A,

    last_position: Vec3,
    last_rotation: Quat,
    last_scale: Vec3,
    force_update: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self::from_trs(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    }

    #[must_use]
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,
            last_position: position,
            last_rotation: rotation,
            last_scale: scale,
            force_update: true,
        }
    }

    /// Rebuilds the local matrix if the TRS changed. Returns whether it did.
    pub fn update_local_matrix(&mut self) -> bool {
        let changed = self.force_update
            || self.position != self.last_position
            || self.rotation != self.last_rotation
            || self.scale != self.last_scale;

        if changed {
            self.local_matrix = Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position);
            self.last_position = self.position;
            self.last_rotation = self.rotation;
            self.last_scale = self.scale;
            self.force_update = false;
        }
        changed
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    pub fn set_world_matrix(&mut self, mat: Affine3A) {
        self.world_matrix = mat;
    }

    /// Orients the transform so -Z points at `target`. Both vectors are in
    /// the parent's space. Degenerate inputs leave the rotation unchanged.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        if forward.cross(up).length_squared() < 1e-4 {
            return;
        }
        let right = forward.cross(up).normalize();
        let new_up = right.cross(forward).normalize();
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, new_up, -forward));
    }

    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
