use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::animation::{
    binding::PropertyBinding,
    clip::{AnimationClip, TrackData},
    tracks::KeyframeCursor,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Play to the end once.
    Once,
    /// Wrap around at the end.
    Repeat,
}

/// Playback state of one clip on one mixer.
#[derive(Debug, Clone)]
pub struct AnimationAction {
    clip: Arc<AnimationClip>,

    pub time: f32,
    pub time_scale: f32,
    /// Blend weight in `[0, 1]`. Written by the animation controller.
    pub weight: f32,
    pub loop_mode: LoopMode,
    /// For `LoopMode::Once`: hold the final frame instead of releasing the
    /// pose back to rest when the clip ends.
    pub clamp_when_finished: bool,
    pub paused: bool,
    pub enabled: bool,

    pub bindings: Vec<PropertyBinding>,

    finished: bool,
    track_cursors: Vec<KeyframeCursor>,
}

impl AnimationAction {
    #[must_use]
    pub fn new(clip: Arc<AnimationClip>, bindings: Vec<PropertyBinding>) -> Self {
        let track_count = clip.tracks.len();
        Self {
            clip,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            loop_mode: LoopMode::Repeat,
            clamp_when_finished: false,
            paused: false,
            enabled: true,
            bindings,
            finished: false,
            track_cursors: vec![KeyframeCursor::default(); track_count],
        }
    }

    #[must_use]
    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    /// True once a `LoopMode::Once` action has reached its end.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the action currently contributes to the pose.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.enabled && self.weight > 0.0
    }

    /// Rewinds to the start and clears the finished flag.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.finished = false;
        self.enabled = true;
        for cursor in &mut self.track_cursors {
            cursor.last_index = 0;
        }
    }

    /// Switches loop behaviour on a live action. Re-arming a finished
    /// one-shot as a loop resumes it from where it stopped.
    pub fn set_loop(&mut self, loop_mode: LoopMode, clamp_when_finished: bool) {
        self.loop_mode = loop_mode;
        self.clamp_when_finished = clamp_when_finished;
        if loop_mode != LoopMode::Once && self.finished {
            self.finished = false;
            self.enabled = true;
        }
    }

    /// Advances local time by `dt * time_scale`.
    pub fn update(&mut self, dt: f32) {
        if self.paused || !self.enabled || self.finished {
            return;
        }

        let duration = self.clip.duration;
        if duration <= 0.0 {
            return;
        }

        self.time += dt * self.time_scale;

        match self.loop_mode {
            LoopMode::Once => {
                if self.time >= duration || self.time < 0.0 {
                    self.time = self.time.clamp(0.0, duration);
                    self.finished = true;
                    if !self.clamp_when_finished {
                        self.enabled = false;
                    }
                }
            }
            LoopMode::Repeat => {
                self.time = self.time.rem_euclid(duration);
            }
        }
    }

    /// Samples one track at the current time.
    pub fn sample_track(&mut self, track_index: usize) -> Option<TrackValue> {
        let track = self.clip.tracks.get(track_index)?;
        let cursor = self.track_cursors.get_mut(track_index)?;

        Some(match &track.data {
            TrackData::Vector3(t) => TrackValue::Vector3(t.sample_with_cursor(self.time, cursor)),
            TrackData::Quaternion(t) => TrackValue::Quaternion(t.sample_with_cursor(self.time, cursor)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackValue {
    Vector3(Vec3),
    Quaternion(Quat),
}
