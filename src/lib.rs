#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! # Bushido Viewer
//!
//! Core of a 3D character animation viewer: GLB/glTF character rigs,
//! cross-faded animation clips, an orbit camera over a pluggable render
//! backend, and explicit disposal of every geometry, material and texture a
//! superseded model leaves behind.
//!
//! The [`Viewer`] facade is the entry point for UI code; the lower-level
//! pieces ([`SceneHost`], [`CharacterRig`], [`AnimationController`]) are
//! public for hosts that want to drive them directly.

pub mod animation;
pub mod assets;
pub mod config;
pub mod errors;
pub mod resources;
pub mod rig;
pub mod scene;
pub mod utils;
pub mod viewer;

pub use animation::{AnimationAction, AnimationClip, AnimationController, AnimationMixer, Binder, ControllerState, LoopMode, PlayOptions};
pub use assets::{AnimationAsset, AssetCatalog, AssetReader, DecoderRegistry, LoopPolicy, MemoryAssetReader, ModelAsset};
#[cfg(not(target_arch = "wasm32"))]
pub use assets::FileAssetReader;
pub use config::{MaterialPreset, ViewerConfig};
pub use errors::{AssetError, Result, ViewerError};
pub use resources::{GpuResources, ResourceCounts};
pub use rig::{CharacterRig, RigState, TraitCategory};
pub use scene::{Camera, HeadlessBackend, ModelScene, OrbitControls, RenderBackend, SceneHost};
pub use utils::Timer;
pub use viewer::{LoadSlot, ModelSelection, Screenshot, Viewer, ViewerEvent, ViewerState, ViewerStats};
