//! Animation Controller Tests
//!
//! Tests for:
//! - Idle / Playing / Transitioning state changes
//! - Cross-fade weights summing to one throughout a fade
//! - Outgoing action release when a fade completes
//! - Properties no longer driven by any action returning to rest
//! - Mid-transition replays never holding more than two actions
//! - Loop policy, live speed / loop / pause changes
//! - Rejected plays leaving state untouched

use std::sync::Arc;

use glam::{Quat, Vec3};

use bushido_viewer::animation::{
    AnimationClip, AnimationController, ControllerState, InterpolationMode, KeyframeTrack, LoopMode, PlayOptions,
    TargetPath, Track, TrackData, TrackMeta,
};
use bushido_viewer::assets::{AnimationAsset, AnimationCategory, LoopPolicy};
use bushido_viewer::config::{MaterialPreset, ModelPlacement};
use bushido_viewer::errors::ViewerError;
use bushido_viewer::resources::GpuResources;
use bushido_viewer::rig::CharacterRig;
use bushido_viewer::scene::{ModelScene, Node, Transform};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn asset(id: &str, loop_policy: LoopPolicy, blend: f32) -> AnimationAsset {
    AnimationAsset {
        id: id.to_string(),
        display_name: id.to_string(),
        clip_uri: format!("{id}.glb"),
        loop_policy,
        default_speed: 1.0,
        blend_duration_seconds: blend,
        category: AnimationCategory::Other,
    }
}

fn clip(name: &str, to_y: f32) -> Arc<AnimationClip> {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, to_y, 0.0)],
        InterpolationMode::Linear,
    );
    Arc::new(AnimationClip::new(
        name,
        vec![Track {
            meta: TrackMeta {
                node_name: "Hips".to_string(),
                target: TargetPath::Translation,
            },
            data: TrackData::Vector3(track),
        }],
    ))
}

/// A clip that only turns the spine.
fn spine_clip(name: &str) -> Arc<AnimationClip> {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![Quat::IDENTITY, Quat::from_rotation_y(1.0)],
        InterpolationMode::Linear,
    );
    Arc::new(AnimationClip::new(
        name,
        vec![Track {
            meta: TrackMeta {
                node_name: "Spine".to_string(),
                target: TargetPath::Rotation,
            },
            data: TrackData::Quaternion(track),
        }],
    ))
}

fn ready_rig() -> CharacterRig {
    let mut scene = ModelScene::new("hero");
    let hips = scene.add_node(Node::with_transform(
        "Hips",
        Transform::from_trs(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY, Vec3::ONE),
    ));
    let spine = scene.add_node(Node::new("Spine"));
    scene.attach(spine, hips);
    let mut rig = CharacterRig::new(
        Arc::new(GpuResources::new()),
        ModelPlacement::default(),
        MaterialPreset::DEFAULT,
    );
    rig.begin_load().unwrap();
    rig.finish_load("hero.glb", Ok(scene)).unwrap();
    rig
}

/// One frame in host order: transition weights, then the mixer.
fn step(controller: &mut AnimationController, rig: &mut CharacterRig, dt: f32) {
    controller.update(rig, dt);
    rig.update(dt);
}

fn hips_y(rig: &CharacterRig) -> f32 {
    let model = rig.model().unwrap();
    let key = model.find_by_name("Hips").unwrap();
    model.node(key).unwrap().transform.position.y
}

fn weight(rig: &CharacterRig, state: &ControllerState, incoming: bool) -> f32 {
    let ControllerState::Transitioning { outgoing, incoming: inc, .. } = state else {
        panic!("expected a transition, got {state:?}");
    };
    let key = if incoming { inc.key } else { outgoing.key };
    rig.mixer().action(key).unwrap().weight
}

// ============================================================================
// State machine
// ============================================================================

#[test]
fn first_play_goes_straight_to_playing() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    controller
        .play(&mut rig, clip("walk", 2.0), &asset("walk", LoopPolicy::Repeat, 0.5), PlayOptions::default())
        .unwrap();

    let ControllerState::Playing(active) = controller.state() else {
        panic!("expected Playing");
    };
    assert_eq!(active.animation_id, "walk");
    assert!(approx(rig.mixer().action(active.key).unwrap().weight, 1.0));
    assert_eq!(controller.current_animation(), Some("walk"));
}

#[test]
fn cross_fade_weights_sum_to_one_every_tick() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    let options = PlayOptions::default();
    controller.play(&mut rig, clip("walk", 2.0), &asset("walk", LoopPolicy::Repeat, 0.0), options).unwrap();
    controller.play(&mut rig, clip("dance", 3.0), &asset("dance", LoopPolicy::Repeat, 0.5), options).unwrap();

    assert!(approx(weight(&rig, controller.state(), false), 1.0));
    assert!(approx(weight(&rig, controller.state(), true), 0.0));

    for i in 1..5 {
        step(&mut controller, &mut rig, 0.1);
        let out = weight(&rig, controller.state(), false);
        let inc = weight(&rig, controller.state(), true);
        assert!(approx(out + inc, 1.0), "tick {i}: {out} + {inc}");
        assert!(approx(inc, i as f32 * 0.2), "tick {i}: incoming {inc}");
    }
}

#[test]
fn completed_fade_releases_outgoing_action() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    let options = PlayOptions::default();
    controller.play(&mut rig, clip("walk", 2.0), &asset("walk", LoopPolicy::Repeat, 0.0), options).unwrap();
    controller.play(&mut rig, clip("dance", 3.0), &asset("dance", LoopPolicy::Repeat, 0.5), options).unwrap();
    assert_eq!(rig.mixer().len(), 2);

    for _ in 0..6 {
        step(&mut controller, &mut rig, 0.1);
    }
    let ControllerState::Playing(active) = controller.state() else {
        panic!("fade should have completed");
    };
    assert_eq!(active.animation_id, "dance");
    assert_eq!(rig.mixer().len(), 1);
    assert!(approx(rig.mixer().action(active.key).unwrap().weight, 1.0));
}

#[test]
fn zero_blend_switches_immediately() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    let options = PlayOptions::default();
    controller.play(&mut rig, clip("walk", 2.0), &asset("walk", LoopPolicy::Repeat, 0.5), options).unwrap();
    controller.play(&mut rig, clip("snap", 3.0), &asset("snap", LoopPolicy::Repeat, 0.0), options).unwrap();

    assert!(matches!(controller.state(), ControllerState::Playing(a) if a.animation_id == "snap"));
    assert_eq!(rig.mixer().len(), 1);
}

#[test]
fn replay_mid_transition_keeps_at_most_two_actions() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    let options = PlayOptions::default();
    controller.play(&mut rig, clip("a", 2.0), &asset("a", LoopPolicy::Repeat, 0.0), options).unwrap();
    controller.play(&mut rig, clip("b", 3.0), &asset("b", LoopPolicy::Repeat, 1.0), options).unwrap();
    step(&mut controller, &mut rig, 0.7); // b now dominates

    controller.play(&mut rig, clip("c", 4.0), &asset("c", LoopPolicy::Repeat, 1.0), options).unwrap();
    assert_eq!(rig.mixer().len(), 2);

    let ControllerState::Transitioning { outgoing, incoming, elapsed, .. } = controller.state() else {
        panic!("expected a new transition");
    };
    assert_eq!(outgoing.animation_id, "b");
    assert_eq!(incoming.animation_id, "c");
    assert!(approx(*elapsed, 0.0));
    assert!(approx(weight(&rig, controller.state(), false), 1.0));
}

#[test]
fn transition_duration_is_fixed_at_start() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    let options = PlayOptions::default();
    controller.play(&mut rig, clip("a", 2.0), &asset("a", LoopPolicy::Repeat, 0.0), options).unwrap();
    controller.play(&mut rig, clip("b", 3.0), &asset("b", LoopPolicy::Repeat, 0.3), options).unwrap();
    assert!(matches!(controller.state(), ControllerState::Transitioning { duration, .. } if approx(*duration, 0.3)));
}

#[test]
fn stop_releases_everything() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    let options = PlayOptions::default();
    controller.play(&mut rig, clip("a", 2.0), &asset("a", LoopPolicy::Repeat, 0.0), options).unwrap();
    controller.play(&mut rig, clip("b", 3.0), &asset("b", LoopPolicy::Repeat, 0.5), options).unwrap();

    controller.stop(&mut rig);
    assert_eq!(controller.state(), &ControllerState::Idle);
    assert!(rig.mixer().is_empty());
}

#[test]
fn stop_returns_pose_to_rest() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    controller
        .play(&mut rig, clip("a", 3.0), &asset("a", LoopPolicy::Repeat, 0.0), PlayOptions::default())
        .unwrap();
    step(&mut controller, &mut rig, 0.5);
    assert!(approx(hips_y(&rig), 2.0));

    controller.stop(&mut rig);
    step(&mut controller, &mut rig, 1.0 / 60.0);
    assert!(approx(hips_y(&rig), 1.0));
}

#[test]
fn fade_into_clip_without_hips_track_returns_hips_to_rest() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    let options = PlayOptions::default();
    controller.play(&mut rig, clip("walk", 2.0), &asset("walk", LoopPolicy::Repeat, 0.0), options).unwrap();
    step(&mut controller, &mut rig, 0.5);
    assert!(approx(hips_y(&rig), 1.5));

    controller.play(&mut rig, spine_clip("pray"), &asset("pray", LoopPolicy::Repeat, 0.2), options).unwrap();
    step(&mut controller, &mut rig, 0.1);
    assert!(hips_y(&rig) > 1.0);

    step(&mut controller, &mut rig, 0.2);
    assert!(matches!(controller.state(), ControllerState::Playing(a) if a.animation_id == "pray"));
    assert!(approx(hips_y(&rig), 1.0));
}

// ============================================================================
// Rejected plays
// ============================================================================

#[test]
fn empty_clip_is_rejected_and_state_kept() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    let options = PlayOptions::default();
    controller.play(&mut rig, clip("a", 2.0), &asset("a", LoopPolicy::Repeat, 0.0), options).unwrap();
    let before = controller.state().clone();

    let empty = Arc::new(AnimationClip::new("empty", vec![]));
    let err = controller.play(&mut rig, empty, &asset("empty", LoopPolicy::Repeat, 0.5), options);
    assert!(matches!(err, Err(ViewerError::AnimationLoad { .. })));
    assert_eq!(controller.state(), &before);
    assert_eq!(rig.mixer().len(), 1);
}

#[test]
fn play_without_model_fails() {
    let mut rig = CharacterRig::new(
        Arc::new(GpuResources::new()),
        ModelPlacement::default(),
        MaterialPreset::DEFAULT,
    );
    let mut controller = AnimationController::new();
    let err = controller.play(&mut rig, clip("a", 2.0), &asset("a", LoopPolicy::Repeat, 0.0), PlayOptions::default());
    assert!(matches!(err, Err(ViewerError::NoModelReady)));
    assert_eq!(controller.state(), &ControllerState::Idle);
}

// ============================================================================
// Loop policy & live controls
// ============================================================================

#[test]
fn play_once_holds_final_pose() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    controller
        .play(&mut rig, clip("death", 3.0), &asset("death", LoopPolicy::PlayOnce, 0.3), PlayOptions::default())
        .unwrap();

    for _ in 0..15 {
        step(&mut controller, &mut rig, 0.1);
    }
    let ControllerState::Playing(active) = controller.state() else {
        panic!("expected Playing");
    };
    let action = rig.mixer().action(active.key).unwrap();
    assert!(action.is_finished());
    assert!(approx(action.time, 1.0));
    assert!(approx(hips_y(&rig), 3.0));
}

#[test]
fn play_once_ignores_loop_toggle() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    controller
        .play(&mut rig, clip("death", 3.0), &asset("death", LoopPolicy::PlayOnce, 0.0), PlayOptions::default())
        .unwrap();
    controller.set_loop(&mut rig, true);

    let ControllerState::Playing(active) = controller.state() else {
        panic!("expected Playing");
    };
    let action = rig.mixer().action(active.key).unwrap();
    assert_eq!(action.loop_mode, LoopMode::Once);
    assert!(action.clamp_when_finished);
}

#[test]
fn loop_toggle_applies_live() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    controller
        .play(&mut rig, clip("walk", 2.0), &asset("walk", LoopPolicy::Repeat, 0.0), PlayOptions::default())
        .unwrap();
    let ControllerState::Playing(active) = controller.state().clone() else {
        panic!("expected Playing");
    };
    assert_eq!(rig.mixer().action(active.key).unwrap().loop_mode, LoopMode::Repeat);

    controller.set_loop(&mut rig, false);
    let action = rig.mixer().action(active.key).unwrap();
    assert_eq!(action.loop_mode, LoopMode::Once);
    assert!(action.clamp_when_finished);
}

#[test]
fn speed_changes_apply_without_restart() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    let mut fast = asset("walk", LoopPolicy::Repeat, 0.0);
    fast.default_speed = 1.5;
    controller.play(&mut rig, clip("walk", 2.0), &fast, PlayOptions::default()).unwrap();
    step(&mut controller, &mut rig, 0.1);

    let ControllerState::Playing(active) = controller.state().clone() else {
        panic!("expected Playing");
    };
    let time_before = rig.mixer().action(active.key).unwrap().time;
    controller.set_speed(&mut rig, 2.0).unwrap();

    let action = rig.mixer().action(active.key).unwrap();
    assert!(approx(action.time_scale, 3.0));
    assert!(approx(action.time, time_before));
}

#[test]
fn invalid_speed_is_rejected() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        assert!(matches!(controller.set_speed(&mut rig, bad), Err(ViewerError::InvalidSpeed(_))));
    }
    assert!(approx(controller.options().speed, 1.0));
}

#[test]
fn pause_freezes_time_and_resume_continues() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    controller
        .play(&mut rig, clip("walk", 2.0), &asset("walk", LoopPolicy::Repeat, 0.0), PlayOptions::default())
        .unwrap();
    step(&mut controller, &mut rig, 0.25);
    controller.set_playing(&mut rig, false);
    step(&mut controller, &mut rig, 0.25);
    assert!(approx(hips_y(&rig), 1.25));

    controller.set_playing(&mut rig, true);
    step(&mut controller, &mut rig, 0.25);
    assert!(approx(hips_y(&rig), 1.5));
}

#[test]
fn paused_option_starts_new_actions_paused() {
    let mut rig = ready_rig();
    let mut controller = AnimationController::new();
    let options = PlayOptions {
        playing: false,
        ..PlayOptions::default()
    };
    controller.play(&mut rig, clip("walk", 2.0), &asset("walk", LoopPolicy::Repeat, 0.0), options).unwrap();
    step(&mut controller, &mut rig, 0.5);
    assert!(approx(hips_y(&rig), 1.0));
    assert!(!controller.is_playing());
}
