use std::sync::atomic::{AtomicU64, Ordering};

use log::trace;

use crate::resources::geometry::Geometry;
use crate::resources::material::Material;
use crate::resources::storage::ResourceStorage;
use crate::resources::texture::Texture;
use crate::resources::{GeometryHandle, MaterialHandle, TextureHandle};

/// Number of resources per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub geometries: u64,
    pub materials: u64,
    pub textures: u64,
}

impl ResourceCounts {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.geometries + self.materials + self.textures
    }
}

/// The GPU-side resource pool shared by the scene host and every rig.
///
/// Resources stay alive until explicitly disposed. Each successful disposal
/// is counted, so leaks and double frees show up in [`GpuResources::disposed`].
#[derive(Default)]
pub struct GpuResources {
    geometries: ResourceStorage<GeometryHandle, Geometry>,
    materials: ResourceStorage<MaterialHandle, Material>,
    textures: ResourceStorage<TextureHandle, Texture>,

    disposed_geometries: AtomicU64,
    disposed_materials: AtomicU64,
    disposed_textures: AtomicU64,
}

impl GpuResources {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&self, geometry: Geometry) -> GeometryHandle {
        self.geometries.add(geometry)
    }

    pub fn add_material(&self, material: Material) -> MaterialHandle {
        self.materials.add(material)
    }

    pub fn add_texture(&self, texture: Texture) -> TextureHandle {
        self.textures.add(texture)
    }

    pub fn geometry(&self, handle: GeometryHandle) -> Option<std::sync::Arc<Geometry>> {
        self.geometries.get(handle)
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<std::sync::Arc<Material>> {
        self.materials.get(handle)
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<std::sync::Arc<Texture>> {
        self.textures.get(handle)
    }

    /// Releases a geometry. Returns `false` if it was already released.
    pub fn dispose_geometry(&self, handle: GeometryHandle) -> bool {
        let removed = self.geometries.remove(handle).is_some();
        if removed {
            self.disposed_geometries.fetch_add(1, Ordering::Relaxed);
            trace!("Disposed geometry {handle:?}");
        }
        removed
    }

    /// Releases a material. Textures it references are not touched.
    pub fn dispose_material(&self, handle: MaterialHandle) -> bool {
        let removed = self.materials.remove(handle).is_some();
        if removed {
            self.disposed_materials.fetch_add(1, Ordering::Relaxed);
            trace!("Disposed material {handle:?}");
        }
        removed
    }

    pub fn dispose_texture(&self, handle: TextureHandle) -> bool {
        let removed = self.textures.remove(handle).is_some();
        if removed {
            self.disposed_textures.fetch_add(1, Ordering::Relaxed);
            trace!("Disposed texture {handle:?}");
        }
        removed
    }

    /// Resources currently alive.
    #[must_use]
    pub fn live(&self) -> ResourceCounts {
        ResourceCounts {
            geometries: self.geometries.len() as u64,
            materials: self.materials.len() as u64,
            textures: self.textures.len() as u64,
        }
    }

    /// Resources released since the pool was created.
    #[must_use]
    pub fn disposed(&self) -> ResourceCounts {
        ResourceCounts {
            geometries: self.disposed_geometries.load(Ordering::Relaxed),
            materials: self.disposed_materials.load(Ordering::Relaxed),
            textures: self.disposed_textures.load(Ordering::Relaxed),
        }
    }
}
