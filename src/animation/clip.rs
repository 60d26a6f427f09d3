use glam::{Quat, Vec3};

use crate::animation::binding::TargetPath;
use crate::animation::tracks::KeyframeTrack;

#[derive(Debug, Clone)]
pub struct TrackMeta {
    /// Name of the bone / node the track drives.
    pub node_name: String,
    pub target: TargetPath,
}

#[derive(Debug, Clone)]
pub enum TrackData {
    Vector3(KeyframeTrack<Vec3>),
    Quaternion(KeyframeTrack<Quat>),
}

impl TrackData {
    #[must_use]
    pub fn end_time(&self) -> f32 {
        match self {
            TrackData::Vector3(t) => t.end_time(),
            TrackData::Quaternion(t) => t.end_time(),
        }
    }

    #[must_use]
    pub fn key_count(&self) -> usize {
        match self {
            TrackData::Vector3(t) => t.times.len(),
            TrackData::Quaternion(t) => t.times.len(),
        }
    }

    #[must_use]
    pub fn value_count(&self) -> usize {
        match self {
            TrackData::Vector3(t) => t.values.len(),
            TrackData::Quaternion(t) => t.values.len(),
        }
    }

    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match self {
            TrackData::Vector3(t) => t.is_well_formed(),
            TrackData::Quaternion(t) => t.is_well_formed(),
        }
    }

    /// Whether this data can drive `target` (vectors for translation and
    /// scale, quaternions for rotation).
    #[must_use]
    pub fn fits(&self, target: TargetPath) -> bool {
        matches!(
            (self, target),
            (TrackData::Vector3(_), TargetPath::Translation | TargetPath::Scale)
                | (TrackData::Quaternion(_), TargetPath::Rotation)
        )
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    pub meta: TrackMeta,
    pub data: TrackData,
}

/// A format-independent animation clip: named keyframe tracks addressed to
/// nodes by name. Immutable once built and shared between actions via `Arc`.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Builds a clip whose duration is the latest keyframe across all tracks.
    #[must_use]
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks
            .iter()
            .map(|t| t.data.end_time())
            .fold(0.0_f32, f32::max);

        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }

    /// A clip with no tracks, no time span or a malformed track cannot be
    /// played.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        !self.tracks.is_empty() && self.duration > 0.0 && self.tracks.iter().all(|t| t.data.is_well_formed())
    }
}
