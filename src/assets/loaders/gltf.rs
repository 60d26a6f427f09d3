//! GLB / glTF decoding via the `gltf` crate.
//!
//! Only self-contained files are supported: GLB with an embedded binary
//! chunk, or glTF with data URIs. External buffer and image references fail
//! with a glTF error since there is no base path to resolve them against.

use glam::{Quat, Vec2, Vec3, Vec4};
use gltf::animation::util::ReadOutputs;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::animation::{AnimationClip, InterpolationMode, KeyframeTrack, TargetPath, Track, TrackData, TrackMeta};
use crate::assets::loaders::{ClipDecoder, ModelDecoder};
use crate::errors::AssetError;
use crate::resources::{Geometry, GpuResources, Material, MaterialHandle, Side, Texture, TextureHandle};
use crate::scene::{MeshPart, ModelScene, Node, NodeKey, Transform};

/// Built-in decoder for `.glb` and `.gltf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfDecoder;

impl ModelDecoder for GltfDecoder {
    fn decode_model(&self, bytes: &[u8], label: &str, resources: &GpuResources) -> Result<ModelScene, AssetError> {
        let (document, buffers, images) = gltf::import_slice(bytes)?;
        let mut ctx = SceneBuilder {
            resources,
            buffers: &buffers,
            images: &images,
            scene: ModelScene::new(label),
            textures: FxHashMap::default(),
            materials: FxHashMap::default(),
        };

        match ctx.build(&document) {
            Ok(()) => {
                debug!(
                    "Decoded '{label}': {} nodes, {} parts",
                    ctx.scene.len(),
                    ctx.scene.part_count()
                );
                Ok(ctx.scene)
            }
            Err(e) => {
                // Release whatever was allocated before the failure.
                ctx.scene.dispose(resources);
                Err(e)
            }
        }
    }
}

impl ClipDecoder for GltfDecoder {
    fn decode_clips(&self, bytes: &[u8], label: &str) -> Result<Vec<AnimationClip>, AssetError> {
        let (document, buffers, _) = gltf::import_slice(bytes)?;
        let clips = load_animations(&document, &buffers)?;
        debug!("Decoded {} clip(s) from '{label}'", clips.len());
        Ok(clips)
    }
}

struct SceneBuilder<'a> {
    resources: &'a GpuResources,
    buffers: &'a [gltf::buffer::Data],
    images: &'a [gltf::image::Data],
    scene: ModelScene,
    textures: FxHashMap<usize, Option<TextureHandle>>,
    materials: FxHashMap<Option<usize>, MaterialHandle>,
}

impl SceneBuilder<'_> {
    fn build(&mut self, document: &gltf::Document) -> Result<(), AssetError> {
        let mut keys: Vec<NodeKey> = Vec::with_capacity(document.nodes().len());
        for node in document.nodes() {
            let (t, r, s) = node.transform().decomposed();
            let transform = Transform::from_trs(Vec3::from_array(t), Quat::from_array(r), Vec3::from_array(s));
            let mut scene_node = Node::with_transform(node_name(&node), transform);

            let mut failure = None;
            if let Some(mesh) = node.mesh() {
                for primitive in mesh.primitives() {
                    match self.load_primitive(&mesh, &primitive) {
                        Ok(Some(part)) => scene_node.parts.push(part),
                        Ok(None) => {}
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
            }
            // The node joins the scene even on failure so its parts get disposed.
            keys.push(self.scene.add_node(scene_node));
            if let Some(e) = failure {
                return Err(e);
            }
        }

        for node in document.nodes() {
            for child in node.children() {
                self.scene.attach(keys[child.index()], keys[node.index()]);
            }
        }
        Ok(())
    }

    fn load_primitive(
        &mut self,
        mesh: &gltf::Mesh<'_>,
        primitive: &gltf::Primitive<'_>,
    ) -> Result<Option<MeshPart>, AssetError> {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            warn!("Skipping non-triangle primitive in mesh {:?}", mesh.name());
            return Ok(None);
        }

        let buffers = self.buffers;
        let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
        let positions: Vec<Vec3> = reader
            .read_positions()
            .ok_or_else(|| AssetError::Format(format!("mesh {:?} has a primitive without positions", mesh.name())))?
            .map(Vec3::from_array)
            .collect();

        let label = mesh.name().unwrap_or("mesh");
        let mut geometry = Geometry::new(format!("{label}.{}", primitive.index()), positions);
        if let Some(normals) = reader.read_normals() {
            geometry = geometry.with_normals(normals.map(Vec3::from_array).collect());
        }
        if let Some(uvs) = reader.read_tex_coords(0) {
            geometry = geometry.with_uvs(uvs.into_f32().map(Vec2::from_array).collect());
        }
        if let Some(indices) = reader.read_indices() {
            geometry = geometry.with_indices(indices.into_u32().collect());
        }

        let material = self.load_material(&primitive.material());
        Ok(Some(MeshPart {
            geometry: self.resources.add_geometry(geometry),
            material,
            cast_shadow: false,
            receive_shadow: false,
        }))
    }

    fn load_material(&mut self, material: &gltf::Material<'_>) -> MaterialHandle {
        if let Some(&handle) = self.materials.get(&material.index()) {
            return handle;
        }

        let pbr = material.pbr_metallic_roughness();
        let base_color_texture = pbr
            .base_color_texture()
            .and_then(|info| self.load_texture(info.texture().source().index()));

        let imported = Material {
            base_color: Vec4::from_array(pbr.base_color_factor()),
            base_color_texture,
            roughness: pbr.roughness_factor(),
            metalness: pbr.metallic_factor(),
            side: if material.double_sided() { Side::Double } else { Side::Front },
            ..Material::imported(material.name().unwrap_or("material"))
        };
        let handle = self.resources.add_material(imported);
        self.materials.insert(material.index(), handle);
        handle
    }

    fn load_texture(&mut self, image_index: usize) -> Option<TextureHandle> {
        if let Some(&cached) = self.textures.get(&image_index) {
            return cached;
        }
        let images = self.images;
        let handle = images.get(image_index).and_then(|img| {
            let label = format!("image_{image_index}");
            let texture = match img.format {
                gltf::image::Format::R8G8B8A8 => Texture::from_rgba8(label, img.width, img.height, img.pixels.clone()),
                gltf::image::Format::R8G8B8 => Texture::from_rgb8(label, img.width, img.height, &img.pixels),
                other => {
                    warn!("Unsupported texture format {other:?} for image {image_index}");
                    None
                }
            }?;
            let handle = self.resources.add_texture(texture);
            self.scene.register_texture(handle);
            Some(handle)
        });
        self.textures.insert(image_index, handle);
        handle
    }
}

fn node_name(node: &gltf::Node<'_>) -> String {
    node.name()
        .map_or_else(|| format!("Node_{}", node.index()), str::to_string)
}

fn load_animations(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Result<Vec<AnimationClip>, AssetError> {
    let mut clips = Vec::new();

    for (anim_index, anim) in document.animations().enumerate() {
        let mut tracks = Vec::new();

        for channel in anim.channels() {
            let reader = channel.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
            let node_name = node_name(&channel.target().node());

            let times: Vec<f32> = reader
                .read_inputs()
                .ok_or_else(|| AssetError::Format(format!("channel for '{node_name}' has no keyframe times")))?
                .collect();
            let Some(outputs) = reader.read_outputs() else {
                return Err(AssetError::Format(format!("channel for '{node_name}' has no keyframe values")));
            };

            let interpolation = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Linear => InterpolationMode::Linear,
                gltf::animation::Interpolation::Step => InterpolationMode::Step,
                gltf::animation::Interpolation::CubicSpline => InterpolationMode::CubicSpline,
            };

            let (target, data) = match outputs {
                ReadOutputs::Translations(iter) => (
                    TargetPath::Translation,
                    TrackData::Vector3(KeyframeTrack::new(times, iter.map(Vec3::from_array).collect(), interpolation)),
                ),
                ReadOutputs::Rotations(iter) => (
                    TargetPath::Rotation,
                    TrackData::Quaternion(KeyframeTrack::new(
                        times,
                        iter.into_f32().map(Quat::from_array).collect(),
                        interpolation,
                    )),
                ),
                ReadOutputs::Scales(iter) => (
                    TargetPath::Scale,
                    TrackData::Vector3(KeyframeTrack::new(times, iter.map(Vec3::from_array).collect(), interpolation)),
                ),
                ReadOutputs::MorphTargetWeights(_) => {
                    debug!("Skipping morph-target channel on '{node_name}'");
                    continue;
                }
            };

            if !data.is_well_formed() {
                let per_key = if interpolation == InterpolationMode::CubicSpline { 3 } else { 1 };
                return Err(AssetError::Format(format!(
                    "channel for '{node_name}' has {} keyframe values for {} keyframe times (expected {} per key)",
                    data.value_count(),
                    data.key_count(),
                    per_key,
                )));
            }

            tracks.push(Track {
                meta: TrackMeta { node_name, target },
                data,
            });
        }

        let name = anim
            .name()
            .map_or_else(|| format!("Animation_{anim_index}"), str::to_string);
        clips.push(AnimationClip::new(name, tracks));
    }

    Ok(clips)
}
