//! Scene Host Tests
//!
//! Tests for:
//! - Orbit settings validation (floor clipping, inverted ranges)
//! - Camera rotation, zoom bounds and reset
//! - Frame ticking with and without a rig
//! - Frame capture before and after the first render

mod common;

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::Vec2;

use bushido_viewer::animation::{AnimationController, PlayOptions};
use bushido_viewer::assets::loaders::gltf::GltfDecoder;
use bushido_viewer::assets::{ClipDecoder, LoopPolicy, ModelDecoder};
use bushido_viewer::config::{ControlSettings, MaterialPreset, ModelPlacement, ViewerConfig};
use bushido_viewer::errors::ViewerError;
use bushido_viewer::resources::GpuResources;
use bushido_viewer::rig::CharacterRig;
use bushido_viewer::scene::{HeadlessBackend, LightKind, SceneHost};

use common::{animation_asset, clip_glb, model_glb};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn small_config() -> ViewerConfig {
    let mut config = ViewerConfig::default();
    config.viewport.width = 64;
    config.viewport.height = 60;
    config
}

fn host_with(config: &ViewerConfig) -> Result<SceneHost, ViewerError> {
    let backend = HeadlessBackend::new(config.viewport.width, config.viewport.height);
    SceneHost::new(config, Box::new(backend), Arc::new(GpuResources::new()))
}

fn host() -> SceneHost {
    host_with(&small_config()).unwrap()
}

fn loaded_rig(resources: &Arc<GpuResources>) -> CharacterRig {
    let scene = GltfDecoder.decode_model(&model_glb(), "hero", resources).unwrap();
    let mut rig = CharacterRig::new(Arc::clone(resources), ModelPlacement::default(), MaterialPreset::DEFAULT);
    rig.finish_load("hero.glb", Ok(scene)).unwrap();
    rig
}

// ============================================================================
// Settings validation
// ============================================================================

#[test]
fn orbit_below_floor_is_rejected() {
    let mut config = small_config();
    config.controls = ControlSettings {
        max_polar_angle: FRAC_PI_2 + 0.3,
        ..ControlSettings::default()
    };
    assert!(matches!(host_with(&config), Err(ViewerError::InvalidCameraSettings(_))));
}

#[test]
fn inverted_orbit_ranges_are_rejected() {
    for controls in [
        ControlSettings {
            min_polar_angle: 1.2,
            max_polar_angle: 0.4,
            ..ControlSettings::default()
        },
        ControlSettings {
            min_polar_angle: -0.1,
            ..ControlSettings::default()
        },
        ControlSettings {
            min_distance: 0.0,
            ..ControlSettings::default()
        },
        ControlSettings {
            min_distance: 12.0,
            max_distance: 3.0,
            ..ControlSettings::default()
        },
    ] {
        let mut config = small_config();
        config.controls = controls;
        assert!(matches!(host_with(&config), Err(ViewerError::InvalidCameraSettings(_))));
    }
}

#[test]
fn bad_clip_planes_are_rejected() {
    let mut config = small_config();
    config.camera.near = 10.0;
    config.camera.far = 1.0;
    assert!(host_with(&config).is_err());
}

#[test]
fn showcase_lighting_is_ambient_key_and_fill() {
    let host = host();
    let lights = host.lights();
    assert_eq!(lights.len(), 3);
    assert_eq!(lights[0].kind, LightKind::Ambient);
    assert!(approx(lights[0].intensity, 0.5));
    assert!(lights[1].shadow.as_ref().is_some_and(|s| s.map_size == 1024));
    assert!(lights[2].shadow.is_none());
    assert_eq!(host.environment().preset, "sunset");
}

// ============================================================================
// Camera
// ============================================================================

#[test]
fn camera_starts_at_configured_position() {
    let host = host();
    let pos = host.camera_position();
    assert!(approx(pos.x, 0.0) && approx(pos.y, 2.0) && approx(pos.z, 5.0), "{pos:?}");
    assert!(approx(host.camera().fov, 45f32.to_radians()));
}

#[test]
fn rotate_orbits_around_target_at_constant_distance() {
    let mut host = host();
    let mut controller = AnimationController::new();
    let start = host.camera_position();

    host.rotate(FRAC_PI_2);
    for _ in 0..600 {
        host.tick(1.0 / 60.0, &mut controller).unwrap();
    }
    let end = host.camera_position();
    assert!(approx(end.length(), start.length()));
    assert!(approx(end.y, start.y));
    assert!(end.x > 4.0, "camera should have swung to +X, got {end:?}");
}

#[test]
fn camera_never_dips_below_floor() {
    let mut host = host();
    let mut controller = AnimationController::new();
    host.orbit(Vec2::new(0.0, 10.0));
    for _ in 0..300 {
        host.tick(1.0 / 60.0, &mut controller).unwrap();
    }
    assert!(host.camera_position().y >= -EPSILON);
    assert!(host.controls().phi <= FRAC_PI_2 + EPSILON);
}

#[test]
fn zoom_is_bounded() {
    let mut host = host();
    host.zoom(1000.0);
    assert!(approx(host.controls().radius, 3.0));
    host.zoom(-1000.0);
    assert!(approx(host.controls().radius, 10.0));
}

#[test]
fn reset_restores_home_pose() {
    let mut host = host();
    let mut controller = AnimationController::new();
    let home = host.camera_position();
    host.rotate(1.0);
    host.zoom(5.0);
    host.tick(0.5, &mut controller).unwrap();
    assert!(host.camera_position().distance(home) > 0.1);

    host.reset();
    assert!(host.camera_position().distance(home) < EPSILON);
    assert_eq!(host.controls().pending(), Vec2::ZERO);
}

// ============================================================================
// Frame loop & capture
// ============================================================================

#[test]
fn capture_before_first_render_is_unavailable() {
    let host = host();
    assert!(matches!(host.capture_frame(), Err(ViewerError::CaptureUnavailable)));
}

#[test]
fn tick_without_rig_renders_background() {
    let mut host = host();
    let mut controller = AnimationController::new();
    host.tick(0.016, &mut controller).unwrap();
    assert_eq!(host.frames_rendered(), 1);

    let png = host.capture_frame().unwrap();
    let image = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (64, 60));
    assert!(image.pixels().all(|p| p.0 == [0, 0, 0, 255]));
}

#[test]
fn loaded_rig_is_drawn() {
    let resources = Arc::new(GpuResources::new());
    let config = small_config();
    let mut host = SceneHost::new(&config, Box::new(HeadlessBackend::new(64, 60)), Arc::clone(&resources)).unwrap();
    assert!(host.attach_rig(loaded_rig(&resources)).is_none());

    let mut controller = AnimationController::new();
    host.tick(0.016, &mut controller).unwrap();
    let png = host.capture_frame().unwrap();
    let image = image::load_from_memory(&png).unwrap().to_rgba8();
    assert!(image.pixels().any(|p| p.0 != [0, 0, 0, 255]));
}

#[test]
fn tick_advances_the_rig_animation() {
    let resources = Arc::new(GpuResources::new());
    let config = small_config();
    let mut host = SceneHost::new(&config, Box::new(HeadlessBackend::new(64, 60)), Arc::clone(&resources)).unwrap();
    host.attach_rig(loaded_rig(&resources));

    let clip = GltfDecoder.decode_clips(&clip_glb("Walk", 1.0), "walk").unwrap().remove(0);
    let mut controller = AnimationController::new();
    let rig = host.rig_mut().unwrap();
    controller
        .play(rig, Arc::new(clip), &animation_asset("walk", LoopPolicy::Repeat, 0.5), PlayOptions::default())
        .unwrap();

    host.tick(0.5, &mut controller).unwrap();
    let model = host.rig().unwrap().model().unwrap();
    let hips = model.node(model.find_by_name("Hips").unwrap()).unwrap();
    assert!(approx(hips.transform.position.y, 1.5));
    assert_eq!(host.frames_rendered(), 1);
}

#[test]
fn resize_changes_capture_size() {
    let mut host = host();
    let mut controller = AnimationController::new();
    host.resize(32, 16);
    host.tick(0.0, &mut controller).unwrap();
    let png = host.capture_frame().unwrap();
    let image = image::load_from_memory(&png).unwrap();
    assert_eq!((image.width(), image.height()), (32, 16));
    assert!(approx(host.camera().aspect, 2.0));
}

#[test]
fn detached_rig_is_handed_back() {
    let resources = Arc::new(GpuResources::new());
    let mut host = SceneHost::new(
        &small_config(),
        Box::new(HeadlessBackend::new(64, 60)),
        Arc::clone(&resources),
    )
    .unwrap();
    host.attach_rig(loaded_rig(&resources));
    let rig = host.detach_rig().unwrap();
    assert!(host.rig().is_none());
    assert!(rig.has_model());
}
