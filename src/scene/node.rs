use glam::{Quat, Vec3};
use smallvec::SmallVec;

use crate::resources::{GeometryHandle, MaterialHandle};
use crate::scene::NodeKey;
use crate::scene::transform::Transform;

/// The pose a node was authored with. Blends with total weight below one
/// fall back to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestPose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl RestPose {
    #[must_use]
    pub fn of(transform: &Transform) -> Self {
        Self {
            position: transform.position,
            rotation: transform.rotation,
            scale: transform.scale,
        }
    }
}

impl Default for RestPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// One drawable primitive attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshPart {
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    pub transform: Transform,
    pub rest: RestPose,
    pub visible: bool,
    /// Most glTF meshes have a single primitive.
    pub parts: SmallVec<[MeshPart; 1]>,
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_transform(name, Transform::new())
    }

    /// Creates a node whose rest pose is `transform`'s TRS.
    #[must_use]
    pub fn with_transform(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            rest: RestPose::of(&transform),
            transform,
            visible: true,
            parts: SmallVec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}
