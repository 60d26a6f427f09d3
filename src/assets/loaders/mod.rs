//! Decoders from raw asset bytes to scenes and clips, looked up by file
//! extension.
//!
//! GLB / glTF are built in (feature `gltf`). Other container formats, such
//! as FBX exports, are supported by registering a decoder for their
//! extension:
//!
//! ```rust,ignore
//! let mut decoders = DecoderRegistry::with_defaults();
//! decoders.register_clip_decoder("fbx", Arc::new(MyFbxDecoder));
//! ```

#[cfg(feature = "gltf")]
pub mod gltf;

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::animation::AnimationClip;
use crate::errors::AssetError;
use crate::resources::GpuResources;
use crate::scene::ModelScene;

/// Turns model bytes into a scene, allocating its resources in `resources`.
pub trait ModelDecoder: Send + Sync {
    fn decode_model(&self, bytes: &[u8], label: &str, resources: &GpuResources) -> Result<ModelScene, AssetError>;
}

/// Extracts every animation clip from a file, in file order.
pub trait ClipDecoder: Send + Sync {
    fn decode_clips(&self, bytes: &[u8], label: &str) -> Result<Vec<AnimationClip>, AssetError>;
}

#[derive(Clone, Default)]
pub struct DecoderRegistry {
    models: FxHashMap<String, Arc<dyn ModelDecoder>>,
    clips: FxHashMap<String, Arc<dyn ClipDecoder>>,
}

impl DecoderRegistry {
    /// A registry with no decoders.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with the built-in decoders.
    #[must_use]
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::default();
        #[cfg(feature = "gltf")]
        {
            let decoder = Arc::new(self::gltf::GltfDecoder);
            for ext in ["glb", "gltf"] {
                registry.register_model_decoder(ext, decoder.clone());
                registry.register_clip_decoder(ext, decoder.clone());
            }
        }
        registry
    }

    pub fn register_model_decoder(&mut self, extension: &str, decoder: Arc<dyn ModelDecoder>) {
        self.models.insert(extension.to_ascii_lowercase(), decoder);
    }

    pub fn register_clip_decoder(&mut self, extension: &str, decoder: Arc<dyn ClipDecoder>) {
        self.clips.insert(extension.to_ascii_lowercase(), decoder);
    }

    pub fn model_decoder(&self, extension: &str) -> Result<Arc<dyn ModelDecoder>, AssetError> {
        self.models
            .get(&extension.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| AssetError::UnsupportedFormat(extension.to_string()))
    }

    pub fn clip_decoder(&self, extension: &str) -> Result<Arc<dyn ClipDecoder>, AssetError> {
        self.clips
            .get(&extension.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| AssetError::UnsupportedFormat(extension.to_string()))
    }
}
