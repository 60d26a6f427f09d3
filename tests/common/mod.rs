//! Shared fixtures: small GLB files assembled in memory.
//!
//! Every model has two named nodes, `Hips` and `Spine` (child of `Hips`),
//! each carrying one triangle. Clip files carry the same two nodes with a
//! translation track on `Hips` and a rotation track on `Spine`.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, json};

use bushido_viewer::assets::{
    AnimationAsset, AnimationCategory, AssetCatalog, AssetError, AssetReader, LoopPolicy, MemoryAssetReader, ModelAsset,
};
use bushido_viewer::config::ViewerConfig;
use bushido_viewer::viewer::Viewer;

pub const HIPS_REST: [f32; 3] = [0.0, 1.0, 0.0];
pub const SPINE_REST: [f32; 3] = [0.0, 0.5, 0.0];

/// Hips translation keyframes of every fixture clip: start and end.
pub const HIPS_FROM: [f32; 3] = [0.0, 1.0, 0.0];
pub const HIPS_TO: [f32; 3] = [0.0, 2.0, 0.0];

const GLB_MAGIC: &[u8; 4] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

#[derive(Default)]
struct BinaryChunk {
    bytes: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl BinaryChunk {
    fn push_view(&mut self, data: &[u8]) -> usize {
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(data);
        self.views.push(json!({ "buffer": 0, "byteOffset": offset, "byteLength": data.len() }));
        self.views.len() - 1
    }

    fn push_floats(&mut self, data: &[f32], kind: &str, components: usize) -> usize {
        let bytes: Vec<u8> = data.iter().flat_map(|f| f.to_le_bytes()).collect();
        let view = self.push_view(&bytes);
        let count = data.len() / components;

        let mut min = vec![f32::INFINITY; components];
        let mut max = vec![f32::NEG_INFINITY; components];
        for element in data.chunks(components) {
            for (c, &v) in element.iter().enumerate() {
                min[c] = min[c].min(v);
                max[c] = max[c].max(v);
            }
        }
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": 5126,
            "count": count,
            "type": kind,
            "min": min,
            "max": max,
        }));
        self.accessors.len() - 1
    }

    fn finish(mut self, mut document: Value) -> Vec<u8> {
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
        document["asset"] = json!({ "version": "2.0" });
        document["buffers"] = json!([{ "byteLength": self.bytes.len() }]);
        document["bufferViews"] = Value::Array(self.views);
        document["accessors"] = Value::Array(self.accessors);
        encode_glb(&document, &self.bytes)
    }
}

fn encode_glb(document: &Value, bin: &[u8]) -> Vec<u8> {
    let mut json_bytes = serde_json::to_vec(document).unwrap();
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }

    let total = 12 + 8 + json_bytes.len() + 8 + bin.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json_bytes);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    out.extend_from_slice(bin);
    out
}

fn skeleton_nodes(with_meshes: bool) -> Value {
    let mut hips = json!({ "name": "Hips", "translation": HIPS_REST, "children": [1] });
    let mut spine = json!({ "name": "Spine", "translation": SPINE_REST });
    if with_meshes {
        hips["mesh"] = json!(0);
        spine["mesh"] = json!(1);
    }
    json!([hips, spine])
}

fn triangle(chunk: &mut BinaryChunk) -> (usize, usize, usize) {
    let positions = chunk.push_floats(&[-0.5, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 1.0, 0.0], "VEC3", 3);
    let normals = chunk.push_floats(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0], "VEC3", 3);
    let uvs = chunk.push_floats(&[0.0, 0.0, 1.0, 0.0, 0.5, 1.0], "VEC2", 2);
    (positions, normals, uvs)
}

/// Two meshes sharing one untextured material: 2 geometries, 1 material.
#[must_use]
pub fn model_glb() -> Vec<u8> {
    let mut chunk = BinaryChunk::default();
    let (positions, normals, uvs) = triangle(&mut chunk);
    let primitive = json!({
        "attributes": { "POSITION": positions, "NORMAL": normals, "TEXCOORD_0": uvs },
        "material": 0,
    });
    let document = json!({
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": skeleton_nodes(true),
        "meshes": [
            { "name": "Body", "primitives": [primitive.clone()] },
            { "name": "Head", "primitives": [primitive] },
        ],
        "materials": [{
            "name": "Lacquer",
            "pbrMetallicRoughness": { "baseColorFactor": [0.8, 0.2, 0.2, 1.0], "roughnessFactor": 1.0, "metallicFactor": 0.0 },
        }],
    });
    chunk.finish(document)
}

/// Two meshes with distinct materials, one of them textured with an
/// embedded PNG: 2 geometries, 2 materials, 1 texture.
#[must_use]
pub fn textured_model_glb() -> Vec<u8> {
    let mut chunk = BinaryChunk::default();
    let (positions, normals, uvs) = triangle(&mut chunk);
    let png_view = chunk.push_view(&png_2x2([200, 180, 40, 255]));
    let attributes = json!({ "POSITION": positions, "NORMAL": normals, "TEXCOORD_0": uvs });
    let document = json!({
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": skeleton_nodes(true),
        "meshes": [
            { "name": "Body", "primitives": [{ "attributes": attributes.clone(), "material": 0 }] },
            { "name": "Head", "primitives": [{ "attributes": attributes, "material": 1 }] },
        ],
        "materials": [
            { "name": "Gold", "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } } },
            { "name": "Cloth", "pbrMetallicRoughness": { "baseColorFactor": [0.1, 0.1, 0.1, 1.0] } },
        ],
        "textures": [{ "source": 0 }],
        "images": [{ "bufferView": png_view, "mimeType": "image/png" }],
    });
    chunk.finish(document)
}

/// A clip file with one animation named `name` lasting `duration` seconds.
#[must_use]
pub fn clip_glb(name: &str, duration: f32) -> Vec<u8> {
    let (s, c) = std::f32::consts::FRAC_PI_4.sin_cos();
    let mut chunk = BinaryChunk::default();
    let times = chunk.push_floats(&[0.0, duration], "SCALAR", 1);
    let hips = chunk.push_floats(&[HIPS_FROM, HIPS_TO].concat(), "VEC3", 3);
    let spine = chunk.push_floats(&[0.0, 0.0, 0.0, 1.0, 0.0, s, 0.0, c], "VEC4", 4);

    let document = json!({
        "nodes": skeleton_nodes(false),
        "animations": [{
            "name": name,
            "samplers": [
                { "input": times, "output": hips, "interpolation": "LINEAR" },
                { "input": times, "output": spine, "interpolation": "LINEAR" },
            ],
            "channels": [
                { "sampler": 0, "target": { "node": 0, "path": "translation" } },
                { "sampler": 1, "target": { "node": 1, "path": "rotation" } },
            ],
        }],
    });
    chunk.finish(document)
}

/// A clip whose hips sampler has three keyframe times but one VEC3 value.
#[must_use]
pub fn mismatched_clip_glb() -> Vec<u8> {
    let mut chunk = BinaryChunk::default();
    let times = chunk.push_floats(&[0.0, 0.5, 1.0], "SCALAR", 1);
    let hips = chunk.push_floats(&HIPS_TO, "VEC3", 3);

    let document = json!({
        "nodes": skeleton_nodes(false),
        "animations": [{
            "name": "Broken",
            "samplers": [{ "input": times, "output": hips, "interpolation": "LINEAR" }],
            "channels": [{ "sampler": 0, "target": { "node": 0, "path": "translation" } }],
        }],
    });
    chunk.finish(document)
}

/// A valid GLB that contains no animations at all.
#[must_use]
pub fn clip_glb_without_animations() -> Vec<u8> {
    BinaryChunk::default().finish(json!({ "nodes": skeleton_nodes(false) }))
}

fn png_2x2(rgba: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
    bytes.into_inner()
}

// ============================================================================
// Catalog & viewer fixtures
// ============================================================================

pub fn animation_asset(id: &str, loop_policy: LoopPolicy, blend: f32) -> AnimationAsset {
    AnimationAsset {
        id: id.to_string(),
        display_name: id.to_string(),
        clip_uri: format!("/animations/{id}.glb"),
        loop_policy,
        default_speed: 1.0,
        blend_duration_seconds: blend,
        category: AnimationCategory::Other,
    }
}

/// Two models (`hero`, `rival`) and three clips: `walk` (repeat, 0.5 s
/// blend), `death` (play once, 0.3 s blend) and `snap` (repeat, no blend).
pub fn test_catalog() -> AssetCatalog {
    let models = ["hero", "rival"]
        .into_iter()
        .map(|id| ModelAsset {
            id: id.to_string(),
            display_name: id.to_string(),
            mesh_uri: format!("/models/{id}.glb"),
        })
        .collect();
    let animations = vec![
        animation_asset("walk", LoopPolicy::Repeat, 0.5),
        animation_asset("death", LoopPolicy::PlayOnce, 0.3),
        animation_asset("snap", LoopPolicy::Repeat, 0.0),
    ];
    AssetCatalog::new(models, animations).unwrap()
}

/// Reader serving every asset of [`test_catalog`]. Clips last one second.
pub fn test_reader() -> MemoryAssetReader {
    MemoryAssetReader::new()
        .with("/models/hero.glb", model_glb())
        .with("/models/rival.glb", textured_model_glb())
        .with("/animations/walk.glb", clip_glb("Walk", 1.0))
        .with("/animations/death.glb", clip_glb("Death", 1.0))
        .with("/animations/snap.glb", clip_glb("Snap", 1.0))
}

/// A small headless viewer over the test catalog.
pub fn test_viewer() -> Viewer {
    test_viewer_with(Arc::new(test_reader()))
}

pub fn test_viewer_with(reader: Arc<dyn AssetReader>) -> Viewer {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut config = ViewerConfig::default();
    config.viewport.width = 64;
    config.viewport.height = 60;
    Viewer::headless(config, Arc::new(test_catalog()), reader).unwrap()
}

// ============================================================================
// Gated reader
// ============================================================================

/// Wraps a reader so that every read waits until its URI is released,
/// letting tests decide the order in which loads complete.
pub struct GatedReader {
    inner: MemoryAssetReader,
    gates: Mutex<FxHashMap<String, Vec<oneshot::Sender<()>>>>,
}

impl GatedReader {
    pub fn new(inner: MemoryAssetReader) -> Self {
        Self {
            inner,
            gates: Mutex::new(FxHashMap::default()),
        }
    }

    /// Lets every pending read of `uri` complete. Returns how many there were.
    pub fn release(&self, uri: &str) -> usize {
        let senders = self.gates.lock().remove(uri).unwrap_or_default();
        let n = senders.len();
        for tx in senders {
            let _ = tx.send(());
        }
        n
    }
}

impl AssetReader for GatedReader {
    fn read_bytes(&self, uri: &str) -> BoxFuture<'static, Result<Vec<u8>, AssetError>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().entry(uri.to_string()).or_default().push(tx);
        let read = self.inner.read_bytes(uri);
        Box::pin(async move {
            let _ = rx.await;
            read.await
        })
    }
}
