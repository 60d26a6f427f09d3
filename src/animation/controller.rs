//! Cross-fade state machine over a rig's mixer.
//!
//! ```text
//! Idle ──play──▶ Playing(a) ──play──▶ Transitioning(a → b) ──elapsed──▶ Playing(b)
//! ```
//!
//! During a transition both actions advance. Their weights are written in
//! the same step as `1 - t` and `t`, so they always sum to one.

use std::sync::Arc;

use log::{debug, info, warn};
use smallvec::{SmallVec, smallvec};

use crate::animation::action::LoopMode;
use crate::animation::clip::AnimationClip;
use crate::animation::mixer::{ActionKey, AnimationMixer};
use crate::assets::catalog::{AnimationAsset, LoopPolicy};
use crate::errors::{Result, ViewerError};
use crate::rig::CharacterRig;

/// An action owned by the controller, tagged with the asset it plays.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveAction {
    pub key: ActionKey,
    pub animation_id: String,
    pub loop_policy: LoopPolicy,
    pub default_speed: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerState {
    Idle,
    Playing(ActiveAction),
    Transitioning {
        outgoing: ActiveAction,
        incoming: ActiveAction,
        elapsed: f32,
        /// Fixed when the transition starts.
        duration: f32,
    },
}

/// Playback parameters chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayOptions {
    /// Global speed multiplier, applied on top of the asset's default speed.
    pub speed: f32,
    /// When false, every clip plays once. Clips whose asset policy is
    /// `PlayOnce` play once regardless.
    pub loop_enabled: bool,
    /// New actions start paused when false.
    pub playing: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            loop_enabled: true,
            playing: true,
        }
    }
}

#[derive(Debug)]
pub struct AnimationController {
    state: ControllerState,
    options: PlayOptions,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ControllerState::Idle,
            options: PlayOptions::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.options.playing
    }

    #[must_use]
    pub fn options(&self) -> PlayOptions {
        self.options
    }

    /// The animation that is playing or fading in.
    #[must_use]
    pub fn current_animation(&self) -> Option<&str> {
        match &self.state {
            ControllerState::Idle => None,
            ControllerState::Playing(a) | ControllerState::Transitioning { incoming: a, .. } => {
                Some(&a.animation_id)
            }
        }
    }

    /// Starts `clip` on `rig`, cross-fading from whatever is playing.
    ///
    /// The fade length is the asset's `blend_duration_seconds`; zero skips
    /// the fade. Calling this mid-transition keeps only the more visible of
    /// the two current actions as the new outgoing one.
    pub fn play(
        &mut self,
        rig: &mut CharacterRig,
        clip: Arc<AnimationClip>,
        asset: &AnimationAsset,
        options: PlayOptions,
    ) -> Result<()> {
        if !clip.is_playable() {
            return Err(ViewerError::AnimationLoad {
                id: asset.id.clone(),
                reason: format!("clip '{}' has no tracks, zero duration or malformed keyframes", clip.name),
            });
        }
        let Some((mixer, scene)) = rig.animation_target() else {
            return Err(ViewerError::NoModelReady);
        };

        let key = mixer.clip_action(clip, scene);
        let incoming = ActiveAction {
            key,
            animation_id: asset.id.clone(),
            loop_policy: asset.loop_policy,
            default_speed: asset.default_speed,
        };
        if let Some(action) = mixer.action_mut(key) {
            if action.bindings.is_empty() {
                warn!("Animation '{}' matches no nodes of the current model", asset.id);
            }
            let (loop_mode, clamp) = loop_settings(incoming.loop_policy, options.loop_enabled);
            action.set_loop(loop_mode, clamp);
            action.time_scale = options.speed * incoming.default_speed;
            action.paused = !options.playing;
        }
        self.options = options;

        let previous = std::mem::replace(&mut self.state, ControllerState::Idle);
        let outgoing = match previous {
            ControllerState::Idle => None,
            ControllerState::Playing(a) => Some(a),
            ControllerState::Transitioning { outgoing, incoming: pending, .. } => {
                let weight_of = |a: &ActiveAction| mixer.action(a.key).map_or(0.0, |x| x.weight);
                let (keep, release) = if weight_of(&pending) >= weight_of(&outgoing) {
                    (pending, outgoing)
                } else {
                    (outgoing, pending)
                };
                mixer.uncache_action(release.key);
                if let Some(action) = mixer.action_mut(keep.key) {
                    action.weight = 1.0;
                }
                Some(keep)
            }
        };

        let duration = asset.blend_duration_seconds;
        self.state = match outgoing {
            Some(outgoing) if duration > 0.0 => {
                set_weight(mixer, outgoing.key, 1.0);
                set_weight(mixer, incoming.key, 0.0);
                debug!(
                    "Cross-fading '{}' -> '{}' over {duration}s",
                    outgoing.animation_id, incoming.animation_id
                );
                ControllerState::Transitioning {
                    outgoing,
                    incoming,
                    elapsed: 0.0,
                    duration,
                }
            }
            outgoing => {
                if let Some(old) = outgoing {
                    mixer.uncache_action(old.key);
                }
                set_weight(mixer, incoming.key, 1.0);
                ControllerState::Playing(incoming)
            }
        };
        info!("Playing animation '{}'", asset.id);
        Ok(())
    }

    /// Advances the transition. Must run once per tick before the mixer.
    pub fn update(&mut self, rig: &mut CharacterRig, dt: f32) {
        let ControllerState::Transitioning {
            outgoing,
            incoming,
            elapsed,
            duration,
        } = &mut self.state
        else {
            return;
        };

        *elapsed += dt;
        let t = (*elapsed / *duration).clamp(0.0, 1.0);
        let mixer = rig.mixer_mut();
        if *elapsed >= *duration {
            mixer.uncache_action(outgoing.key);
            set_weight(mixer, incoming.key, 1.0);
            debug!("Transition to '{}' complete", incoming.animation_id);
            self.state = ControllerState::Playing(incoming.clone());
        } else {
            set_weight(mixer, outgoing.key, 1.0 - t);
            set_weight(mixer, incoming.key, t);
        }
    }

    /// Pauses or resumes every active action without resetting time.
    pub fn set_playing(&mut self, rig: &mut CharacterRig, playing: bool) {
        self.options.playing = playing;
        let mixer = rig.mixer_mut();
        for active in self.active_actions() {
            if let Some(action) = mixer.action_mut(active.key) {
                action.paused = !playing;
            }
        }
    }

    /// Changes the speed multiplier of the active actions in place.
    pub fn set_speed(&mut self, rig: &mut CharacterRig, speed: f32) -> Result<()> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ViewerError::InvalidSpeed(speed));
        }
        self.options.speed = speed;
        let mixer = rig.mixer_mut();
        for active in self.active_actions() {
            if let Some(action) = mixer.action_mut(active.key) {
                action.time_scale = speed * active.default_speed;
            }
        }
        Ok(())
    }

    /// Switches loop mode and clamp-on-finish on the active actions.
    pub fn set_loop(&mut self, rig: &mut CharacterRig, loop_enabled: bool) {
        self.options.loop_enabled = loop_enabled;
        let mixer = rig.mixer_mut();
        for active in self.active_actions() {
            let (mode, clamp) = loop_settings(active.loop_policy, loop_enabled);
            if let Some(action) = mixer.action_mut(active.key) {
                action.set_loop(mode, clamp);
            }
        }
    }

    /// Releases every action and returns to idle.
    pub fn stop(&mut self, rig: &mut CharacterRig) {
        let mixer = rig.mixer_mut();
        for active in self.active_actions() {
            mixer.uncache_action(active.key);
        }
        self.state = ControllerState::Idle;
    }

    /// Forgets the current actions without touching any mixer. Used when the
    /// rig has swapped its mixer for a new model.
    pub fn detach(&mut self) {
        self.state = ControllerState::Idle;
    }

    fn active_actions(&self) -> SmallVec<[ActiveAction; 2]> {
        match &self.state {
            ControllerState::Idle => SmallVec::new(),
            ControllerState::Playing(a) => smallvec![a.clone()],
            ControllerState::Transitioning { outgoing, incoming, .. } => {
                smallvec![outgoing.clone(), incoming.clone()]
            }
        }
    }
}

fn set_weight(mixer: &mut AnimationMixer, key: ActionKey, weight: f32) {
    if let Some(action) = mixer.action_mut(key) {
        action.weight = weight;
    }
}

/// Repeat assets loop while looping is enabled; everything else plays once
/// and holds its final frame.
fn loop_settings(policy: LoopPolicy, loop_enabled: bool) -> (LoopMode, bool) {
    match policy {
        LoopPolicy::Repeat if loop_enabled => (LoopMode::Repeat, false),
        _ => (LoopMode::Once, true),
    }
}
