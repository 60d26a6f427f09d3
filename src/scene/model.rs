use glam::Affine3A;
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::resources::{GpuResources, MaterialHandle, ResourceCounts, TextureHandle};
use crate::scene::NodeKey;
use crate::scene::node::{MeshPart, Node};

/// A loaded model: a node hierarchy plus the GPU resources its meshes use.
///
/// The scene owns its resources exclusively. They stay allocated until
/// [`ModelScene::dispose`] is called; dropping a scene without disposing it
/// leaks them in the pool.
#[derive(Debug, Default)]
pub struct ModelScene {
    pub label: String,
    nodes: SlotMap<NodeKey, Node>,
    roots: Vec<NodeKey>,
    names: FxHashMap<String, NodeKey>,
    textures: Vec<TextureHandle>,
}

/// A mesh part with its resolved world matrix.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub world: Affine3A,
    pub part: MeshPart,
}

impl ModelScene {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Adds a root node. When several nodes share a name, lookups resolve to
    /// the first one added.
    pub fn add_node(&mut self, node: Node) -> NodeKey {
        let name = node.name.clone();
        let key = self.nodes.insert(node);
        self.names.entry(name).or_insert(key);
        self.roots.push(key);
        key
    }

    /// Re-parents `child` under `parent`.
    pub fn attach(&mut self, child: NodeKey, parent: NodeKey) {
        if child == parent || !self.nodes.contains_key(parent) {
            return;
        }
        let Some(old_parent) = self.nodes.get(child).map(|n| n.parent) else {
            return;
        };
        match old_parent {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(p) {
                    node.children.retain(|&c| c != child);
                }
            }
            None => self.roots.retain(|&r| r != child),
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Records a texture owned by this scene.
    pub fn register_texture(&mut self, handle: TextureHandle) {
        if !self.textures.contains(&handle) {
            self.textures.push(handle);
        }
    }

    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeKey> {
        self.names.get(name).copied()
    }

    #[must_use]
    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of drawable parts across all nodes.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.nodes.values().map(|n| n.parts.len()).sum()
    }

    /// Applies `f` to every mesh part (material policy, shadow flags).
    pub fn for_each_part_mut(&mut self, mut f: impl FnMut(&mut MeshPart)) {
        for node in self.nodes.values_mut() {
            node.parts.iter_mut().for_each(&mut f);
        }
    }

    /// Propagates world matrices from the roots down, with `parent` as the
    /// matrix above the roots.
    pub fn update_world_matrices(&mut self, parent: &Affine3A) {
        let mut stack: Vec<(NodeKey, Affine3A)> = self.roots.iter().map(|&r| (r, *parent)).collect();
        while let Some((key, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };
            node.transform.update_local_matrix();
            let world = parent_world * *node.transform.local_matrix();
            node.transform.set_world_matrix(world);
            stack.extend(node.children.iter().map(|&c| (c, world)));
        }
    }

    /// Visible mesh parts with their current world matrices.
    pub fn draw_items(&self) -> impl Iterator<Item = DrawItem> + '_ {
        self.nodes.values().filter(|n| n.visible).flat_map(|node| {
            let world = *node.transform.world_matrix();
            node.parts.iter().map(move |&part| DrawItem { world, part })
        })
    }

    /// Distinct materials referenced by this scene.
    #[must_use]
    pub fn materials(&self) -> Vec<MaterialHandle> {
        let mut seen = FxHashSet::default();
        self.nodes
            .values()
            .flat_map(|n| n.parts.iter().map(|p| p.material))
            .filter(|m| seen.insert(*m))
            .collect()
    }

    /// Releases every geometry, material and texture this scene owns, each
    /// exactly once, and strips the mesh parts. Calling it again is a no-op.
    pub fn dispose(&mut self, resources: &GpuResources) -> ResourceCounts {
        let mut geometries = FxHashSet::default();
        let mut materials = FxHashSet::default();
        for node in self.nodes.values_mut() {
            for part in node.parts.drain(..) {
                geometries.insert(part.geometry);
                materials.insert(part.material);
            }
        }

        let mut textures: FxHashSet<TextureHandle> = self.textures.drain(..).collect();
        for &m in &materials {
            if let Some(t) = resources.material(m).and_then(|mat| mat.base_color_texture) {
                textures.insert(t);
            }
        }

        let counts = ResourceCounts {
            geometries: geometries.into_iter().filter(|&g| resources.dispose_geometry(g)).count() as u64,
            materials: materials.into_iter().filter(|&m| resources.dispose_material(m)).count() as u64,
            textures: textures.into_iter().filter(|&t| resources.dispose_texture(t)).count() as u64,
        };
        if counts.total() > 0 {
            debug!(
                "Disposed '{}': {} geometries, {} materials, {} textures",
                self.label, counts.geometries, counts.materials, counts.textures
            );
        }
        counts
    }
}
