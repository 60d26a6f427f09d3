use crate::scene::NodeKey;

/// Node property animated by a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
}

/// Maps track `track_index` of a clip onto `target` of a concrete rig node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyBinding {
    pub track_index: usize,
    pub node: NodeKey,
    pub target: TargetPath,
}
