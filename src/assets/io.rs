use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::AssetError;

/// Asynchronous byte source for assets.
///
/// The returned future must not borrow the reader; the viewer keeps it in
/// its pending-load set and polls it from the frame loop.
pub trait AssetReader: Send + Sync {
    fn read_bytes(&self, uri: &str) -> BoxFuture<'static, Result<Vec<u8>, AssetError>>;
}

/// Reads assets from a directory on disk on a dedicated tokio runtime.
///
/// URIs are resolved relative to the root, so `/models/character.glb` maps
/// to `<root>/models/character.glb`.
#[cfg(not(target_arch = "wasm32"))]
pub struct FileAssetReader {
    root_path: PathBuf,
    runtime: Arc<tokio::runtime::Runtime>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("bushido-asset-io")
            .build()?;
        Ok(Self {
            root_path,
            runtime: Arc::new(runtime),
        })
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AssetReader for FileAssetReader {
    fn read_bytes(&self, uri: &str) -> BoxFuture<'static, Result<Vec<u8>, AssetError>> {
        let path = self.root_path.join(uri.trim_start_matches('/'));
        let label = uri.to_string();
        let task = self.runtime.spawn(async move { tokio::fs::read(&path).await });
        Box::pin(async move {
            match task.await {
                Ok(Ok(bytes)) => Ok(bytes),
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(AssetError::NotFound(label)),
                Ok(Err(e)) => Err(AssetError::Io(e)),
                Err(e) => Err(AssetError::TaskJoin(e.to_string())),
            }
        })
    }
}

/// In-memory asset store. Reads resolve on first poll.
///
/// Holds uploaded blobs and serves as the reader in tests.
#[derive(Default)]
pub struct MemoryAssetReader {
    entries: RwLock<FxHashMap<String, Arc<[u8]>>>,
}

impl MemoryAssetReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(self, uri: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(uri, bytes);
        self
    }

    pub fn insert(&self, uri: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.entries.write().insert(uri.into(), bytes.into());
    }

    /// Drops an entry; later reads of `uri` fail with `NotFound`.
    pub fn remove(&self, uri: &str) -> bool {
        self.entries.write().remove(uri).is_some()
    }

    /// Drops every entry and returns how many there were.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let n = entries.len();
        entries.clear();
        n
    }

    #[must_use]
    pub fn contains(&self, uri: &str) -> bool {
        self.entries.read().contains_key(uri)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl AssetReader for MemoryAssetReader {
    fn read_bytes(&self, uri: &str) -> BoxFuture<'static, Result<Vec<u8>, AssetError>> {
        let result = self
            .entries
            .read()
            .get(uri)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| AssetError::NotFound(uri.to_string()));
        Box::pin(future::ready(result))
    }
}

/// Lower-cased file extension of a URI or file name, ignoring any query or
/// fragment.
#[must_use]
pub fn extension_of(uri: &str) -> Option<String> {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let (stem, ext) = file.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// File name without directories or extension.
#[must_use]
pub fn file_stem(uri: &str) -> &str {
    let file = uri.rsplit(['/', '\\']).next().unwrap_or(uri);
    file.rsplit_once('.').map_or(file, |(stem, _)| stem)
}
