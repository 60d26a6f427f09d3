//! Asset catalog, byte readers and format decoders.

pub mod catalog;
pub mod io;
pub mod loaders;

pub use catalog::{AnimationAsset, AnimationCategory, AssetCatalog, AssetMetadata, CatalogFile, LoopPolicy, ModelAsset};
#[cfg(not(target_arch = "wasm32"))]
pub use io::FileAssetReader;
pub use io::{AssetReader, MemoryAssetReader, extension_of, file_stem};
pub use loaders::{ClipDecoder, DecoderRegistry, ModelDecoder};

pub use crate::errors::AssetError;
