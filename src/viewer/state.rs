use crate::assets::io::file_stem;
use crate::resources::ResourceCounts;
use crate::utils::slugify;

/// Which model the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSelection {
    Catalog(String),
    Uploaded { filename: String, blob_uri: String },
}

impl ModelSelection {
    /// Name used for screenshots and events.
    #[must_use]
    pub fn subject(&self) -> String {
        match self {
            ModelSelection::Catalog(id) => slugify(id),
            ModelSelection::Uploaded { filename, .. } => slugify(file_stem(filename)),
        }
    }

    #[must_use]
    pub fn blob_uri(&self) -> Option<&str> {
        match self {
            ModelSelection::Catalog(_) => None,
            ModelSelection::Uploaded { blob_uri, .. } => Some(blob_uri),
        }
    }
}

/// User-facing viewer state. Selections only change once the matching
/// load has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub selected_model: Option<ModelSelection>,
    pub selected_animation: Option<String>,
    pub is_playing: bool,
    /// Global speed multiplier, always within the configured range.
    pub speed: f32,
    pub loop_enabled: bool,
    /// Accumulated horizontal orbit requested by the user, radians.
    pub camera_yaw: f32,
    /// Message of the most recent load failure.
    pub last_error: Option<String>,
}

impl ViewerState {
    #[must_use]
    pub fn new(default_speed: f32) -> Self {
        Self {
            selected_model: None,
            selected_animation: None,
            is_playing: true,
            speed: default_speed,
            loop_enabled: true,
            camera_yaw: 0.0,
            last_error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewerStats {
    pub loads_issued: u64,
    pub loads_applied: u64,
    pub load_failures: u64,
    pub stale_discarded: u64,
    pub frames_rendered: u64,
    pub models_disposed: u64,
    pub live_resources: ResourceCounts,
    pub disposed_resources: ResourceCounts,
}

/// An encoded frame ready to save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    pub file_name: String,
    pub png: Vec<u8>,
}
