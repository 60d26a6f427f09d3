use std::sync::Arc;

use glam::{Quat, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{SlotMap, new_key_type};

use crate::animation::action::{AnimationAction, TrackValue};
use crate::animation::binder::Binder;
use crate::animation::binding::TargetPath;
use crate::animation::clip::AnimationClip;
use crate::scene::{ModelScene, NodeKey};

new_key_type! {
    /// Handle of an action owned by one [`AnimationMixer`].
    pub struct ActionKey;
}

/// Weighted running blend for one animated property.
#[derive(Debug, Clone, Copy)]
enum Accumulator {
    Vector3 { value: Vec3, weight: f32 },
    Quaternion { value: Quat, weight: f32 },
}

impl Accumulator {
    fn empty(target: TargetPath) -> Self {
        match target {
            TargetPath::Rotation => Accumulator::Quaternion {
                value: Quat::IDENTITY,
                weight: 0.0,
            },
            TargetPath::Translation | TargetPath::Scale => Accumulator::Vector3 {
                value: Vec3::ZERO,
                weight: 0.0,
            },
        }
    }

    /// Folds `sample` in with weight `w`, keeping the result a normalized
    /// weighted average of everything accumulated so far.
    fn add(&mut self, sample: TrackValue, w: f32) {
        if w <= 0.0 {
            return;
        }
        match (self, sample) {
            (Accumulator::Vector3 { value, weight }, TrackValue::Vector3(v)) => {
                *weight += w;
                *value = value.lerp(v, w / *weight);
            }
            (Accumulator::Quaternion { value, weight }, TrackValue::Quaternion(q)) => {
                *weight += w;
                *value = value.slerp(q, w / *weight);
            }
            _ => {}
        }
    }
}

/// Per-rig player of animation actions.
///
/// Every enabled action advances each update; all bound properties are then
/// blended by action weight. When the summed weight of a property is below
/// one, the remainder is taken from the node's rest pose. A property that
/// was driven on the previous update but is bound by no action any more
/// returns to its rest value.
#[derive(Debug, Default)]
pub struct AnimationMixer {
    actions: SlotMap<ActionKey, AnimationAction>,
    time: f32,
    scratch: FxHashMap<(NodeKey, TargetPath), Accumulator>,
    /// Properties written by the previous update.
    driven: FxHashSet<(NodeKey, TargetPath)>,
}

impl AnimationMixer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an action for `clip` bound against `scene`.
    pub fn clip_action(&mut self, clip: Arc<AnimationClip>, scene: &ModelScene) -> ActionKey {
        let bindings = Binder::bind(scene, &clip);
        self.actions.insert(AnimationAction::new(clip, bindings))
    }

    #[must_use]
    pub fn action(&self, key: ActionKey) -> Option<&AnimationAction> {
        self.actions.get(key)
    }

    pub fn action_mut(&mut self, key: ActionKey) -> Option<&mut AnimationAction> {
        self.actions.get_mut(key)
    }

    /// Stops and releases one action. Properties only it was driving go back
    /// to rest on the next update.
    pub fn uncache_action(&mut self, key: ActionKey) -> Option<AnimationAction> {
        self.actions.remove(key)
    }

    /// Stops and releases every action. The next update restores the rest
    /// pose of everything they were driving.
    pub fn stop_all_action(&mut self) {
        self.actions.clear();
        self.scratch.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Total time this mixer has been advanced.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn actions(&self) -> impl Iterator<Item = (ActionKey, &AnimationAction)> {
        self.actions.iter()
    }

    /// Advances every action by `dt` and writes the blended pose into `scene`.
    pub fn update(&mut self, dt: f32, scene: &mut ModelScene) {
        self.time += dt;
        self.scratch.clear();

        for action in self.actions.values_mut() {
            action.update(dt);

            let weight = if action.enabled { action.weight.clamp(0.0, 1.0) } else { 0.0 };
            for i in 0..action.bindings.len() {
                let binding = action.bindings[i];
                let slot = self
                    .scratch
                    .entry((binding.node, binding.target))
                    .or_insert_with(|| Accumulator::empty(binding.target));
                if weight <= 0.0 {
                    continue;
                }
                if let Some(sample) = action.sample_track(binding.track_index) {
                    slot.add(sample, weight);
                }
            }
        }

        for (&(key, target), acc) in &self.scratch {
            let Some(node) = scene.node_mut(key) else {
                continue;
            };
            let rest = node.rest;
            let transform = &mut node.transform;
            match (*acc, target) {
                (Accumulator::Vector3 { value, weight }, TargetPath::Translation) => {
                    transform.position = rest.position.lerp(value, weight.min(1.0));
                }
                (Accumulator::Vector3 { value, weight }, TargetPath::Scale) => {
                    transform.scale = rest.scale.lerp(value, weight.min(1.0));
                }
                (Accumulator::Quaternion { value, weight }, TargetPath::Rotation) => {
                    transform.rotation = rest.rotation.slerp(value, weight.min(1.0));
                }
                _ => continue,
            }
            transform.mark_dirty();
        }

        for &(key, target) in &self.driven {
            if self.scratch.contains_key(&(key, target)) {
                continue;
            }
            let Some(node) = scene.node_mut(key) else {
                continue;
            };
            let rest = node.rest;
            let transform = &mut node.transform;
            match target {
                TargetPath::Translation => transform.position = rest.position,
                TargetPath::Rotation => transform.rotation = rest.rotation,
                TargetPath::Scale => transform.scale = rest.scale,
            }
            transform.mark_dirty();
        }
        self.driven.clear();
        self.driven.extend(self.scratch.keys().copied());
    }
}
