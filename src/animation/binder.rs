use log::debug;

use crate::animation::binding::PropertyBinding;
use crate::animation::clip::AnimationClip;
use crate::scene::ModelScene;

pub struct Binder;

impl Binder {
    /// Resolves every track of `clip` to a node of `scene` by name.
    ///
    /// Tracks whose node is missing, or whose data does not fit the target
    /// property, are skipped. Clips authored for a shared skeleton can be
    /// bound to any character that uses the same bone names.
    #[must_use]
    pub fn bind(scene: &ModelScene, clip: &AnimationClip) -> Vec<PropertyBinding> {
        let mut bindings = Vec::with_capacity(clip.tracks.len());
        let mut missing = 0usize;

        for (track_index, track) in clip.tracks.iter().enumerate() {
            if !track.data.fits(track.meta.target) {
                continue;
            }
            match scene.find_by_name(&track.meta.node_name) {
                Some(node) => bindings.push(PropertyBinding {
                    track_index,
                    node,
                    target: track.meta.target,
                }),
                None => missing += 1,
            }
        }

        if missing > 0 {
            debug!(
                "Clip '{}': {missing} of {} tracks have no matching node",
                clip.name,
                clip.tracks.len()
            );
        }
        bindings
    }
}
