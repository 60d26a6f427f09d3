//! Error Types
//!
//! This module defines the error types used throughout the viewer.
//!
//! # Overview
//!
//! Two layers of errors exist:
//! - [`AssetError`] describes why fetching or decoding a single asset failed
//!   (missing file, malformed container, unsupported format).
//! - [`ViewerError`] is what the public API returns. Load failures wrap the
//!   underlying [`AssetError`] as their reason.
//!
//! Nothing here is fatal: every failure is scoped to one asset-load attempt
//! or one rejected call, and the viewer keeps rendering its previous state.

use thiserror::Error;

/// Failure while fetching or decoding one asset.
#[derive(Error, Debug)]
pub enum AssetError {
    /// The reader has no entry for the requested URI.
    #[error("asset not found: {0}")]
    NotFound(String),

    /// File I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes were fetched but do not form a usable asset.
    #[error("invalid asset data: {0}")]
    Format(String),

    /// No decoder is registered for the asset's extension.
    #[error("unsupported asset format: {0}")]
    UnsupportedFormat(String),

    /// glTF / GLB parsing error.
    #[cfg(feature = "gltf")]
    #[error("glTF error: {0}")]
    Gltf(String),

    /// The background fetch task did not complete.
    #[error("task join error: {0}")]
    TaskJoin(String),
}

#[cfg(feature = "gltf")]
impl From<gltf::Error> for AssetError {
    fn from(err: gltf::Error) -> Self {
        AssetError::Gltf(err.to_string())
    }
}

/// The main error type returned by the viewer API.
#[derive(Error, Debug)]
pub enum ViewerError {
    // ========================================================================
    // Asset Errors
    // ========================================================================
    /// The id is not present in the asset catalog.
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    /// A mesh could not be fetched or parsed.
    #[error("failed to load model {uri}: {source}")]
    AssetLoad {
        uri: String,
        #[source]
        source: AssetError,
    },

    /// A clip could not be fetched or parsed, or the source held no clips.
    #[error("failed to load animation {id}: {reason}")]
    AnimationLoad { id: String, reason: String },

    /// A custom upload carried a file extension that is not a mesh container.
    #[error("unsupported model format: {filename}")]
    UnsupportedFormat { filename: String },

    // ========================================================================
    // State Errors
    // ========================================================================
    /// A screenshot was requested before any frame was rendered.
    #[error("no rendered frame is available for capture")]
    CaptureUnavailable,

    /// An animation was selected while no model is ready.
    #[error("no model is ready")]
    NoModelReady,

    /// The rig was disposed and can no longer load content.
    #[error("character rig has been disposed")]
    RigDisposed,

    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Playback speed must be finite and strictly positive.
    #[error("invalid playback speed: {0}")]
    InvalidSpeed(f32),

    /// Camera or orbit settings would clip through the floor or invert the view.
    #[error("invalid camera settings: {0}")]
    InvalidCameraSettings(String),

    /// The asset catalog failed validation.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    // ========================================================================
    // Rendering & Configuration Errors
    // ========================================================================
    /// The render backend failed to produce or encode a frame.
    #[error("render error: {0}")]
    Render(String),

    /// JSON parsing error for configuration or catalog files.
    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    /// File I/O error while reading configuration.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for ViewerError {
    fn from(err: image::ImageError) -> Self {
        ViewerError::Render(err.to_string())
    }
}

/// Alias for `Result<T, ViewerError>`.
pub type Result<T> = std::result::Result<T, ViewerError>;
