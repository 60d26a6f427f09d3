//! GPU-side resources: geometries, materials and textures.
//!
//! All resources live in one [`GpuResources`] pool and are addressed by
//! slotmap handles. Nothing is freed implicitly: owners call the pool's
//! `dispose_*` methods when a resource is superseded.

pub mod geometry;
pub mod material;
pub mod pool;
pub mod storage;
pub mod texture;

use slotmap::new_key_type;

new_key_type! {
    pub struct GeometryHandle;
    pub struct MaterialHandle;
    pub struct TextureHandle;
}

pub use geometry::{BoundingBox, Geometry};
pub use material::{Material, MaterialOrigin, Side};
pub use pool::{GpuResources, ResourceCounts};
pub use texture::Texture;
