use glam::{Affine3A, Vec2, Vec3};

/// Axis-aligned bounds in local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Bounds of a point set; `None` if it is empty.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(Self { min: first, max: first }, |b, &p| Self {
            min: b.min.min(p),
            max: b.max.max(p),
        }))
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ]
        .map(|c| matrix.transform_point3(c));
        // Eight corners, never empty.
        Self::from_points(&corners).unwrap_or(*self)
    }
}

/// CPU-side vertex data of one primitive.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub label: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Option<Vec<u32>>,
    pub bounds: Option<BoundingBox>,
}

impl Geometry {
    #[must_use]
    pub fn new(label: impl Into<String>, positions: Vec<Vec3>) -> Self {
        let bounds = BoundingBox::from_points(&positions);
        Self {
            label: label.into(),
            positions,
            bounds,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    #[must_use]
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = uvs;
        self
    }

    #[must_use]
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Normal of vertex `i`, falling back to +Y for geometry without normals.
    #[must_use]
    pub fn normal(&self, i: usize) -> Vec3 {
        self.normals.get(i).copied().unwrap_or(Vec3::Y)
    }
}
