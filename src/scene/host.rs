//! Scene host: the render surface, camera rig, lights and the master frame
//! tick. Owns at most one active [`CharacterRig`].

use std::io::Cursor;
use std::sync::Arc;

use glam::{Vec2, Vec3, Vec4};
use image::{ImageFormat, RgbaImage};
use log::{debug, trace};

use crate::animation::AnimationController;
use crate::config::{EnvironmentSettings, ViewerConfig};
use crate::errors::{Result, ViewerError};
use crate::resources::GpuResources;
use crate::rig::{CharacterRig, RigState};
use crate::scene::backend::{Frame, RenderBackend};
use crate::scene::camera::Camera;
use crate::scene::light::Light;
use crate::scene::model::DrawItem;
use crate::scene::orbit::OrbitControls;
use crate::scene::transform::Transform;

pub struct SceneHost {
    camera: Camera,
    camera_transform: Transform,
    controls: OrbitControls,
    lights: Vec<Light>,
    environment: EnvironmentSettings,
    clear_color: Vec4,

    backend: Box<dyn RenderBackend>,
    resources: Arc<GpuResources>,
    rig: Option<CharacterRig>,

    frames_rendered: u64,
    draws: Vec<DrawItem>,
}

impl SceneHost {
    /// Builds the stage from `config`. Invalid camera or orbit settings are
    /// rejected before anything is created.
    pub fn new(config: &ViewerConfig, mut backend: Box<dyn RenderBackend>, resources: Arc<GpuResources>) -> Result<Self> {
        config.camera.validate()?;
        let controls = OrbitControls::new(
            Vec3::from_array(config.camera.position),
            Vec3::from_array(config.camera.target),
            config.controls.clone(),
        )?;

        backend.resize(config.viewport.width, config.viewport.height);
        let (w, h) = backend.size();
        let camera = Camera::from_settings(&config.camera, w as f32 / h.max(1) as f32);

        let mut host = Self {
            camera,
            camera_transform: Transform::new(),
            controls,
            lights: Light::rig_from_settings(&config.lighting),
            environment: config.environment.clone(),
            clear_color: Vec4::from_array(config.viewport.background),
            backend,
            resources,
            rig: None,
            frames_rendered: 0,
            draws: Vec::new(),
        };
        host.update_camera(0.0);
        Ok(host)
    }

    // ========================================================================
    // Rig
    // ========================================================================

    /// Makes `rig` the active rig and returns the previous one, if any.
    pub fn attach_rig(&mut self, rig: CharacterRig) -> Option<CharacterRig> {
        self.rig.replace(rig)
    }

    pub fn detach_rig(&mut self) -> Option<CharacterRig> {
        self.rig.take()
    }

    #[must_use]
    pub fn rig(&self) -> Option<&CharacterRig> {
        self.rig.as_ref()
    }

    pub fn rig_mut(&mut self) -> Option<&mut CharacterRig> {
        self.rig.as_mut()
    }

    /// The active rig, replacing a missing or disposed one with `make()`.
    pub fn live_rig_or_insert_with(&mut self, make: impl FnOnce() -> CharacterRig) -> &mut CharacterRig {
        if self.rig.as_ref().is_some_and(|r| r.state() == RigState::Disposed) {
            self.rig = None;
        }
        self.rig.get_or_insert_with(make)
    }

    // ========================================================================
    // Camera
    // ========================================================================

    /// Orbits the camera horizontally by `delta_radians`.
    pub fn rotate(&mut self, delta_radians: f32) {
        self.controls.rotate(Vec2::new(delta_radians, 0.0));
    }

    /// Orbits in both directions; `delta.y` tilts toward the floor.
    pub fn orbit(&mut self, delta: Vec2) {
        self.controls.rotate(delta);
    }

    pub fn zoom(&mut self, steps: f32) {
        self.controls.zoom(steps);
    }

    /// Returns the camera to its configured pose immediately.
    pub fn reset(&mut self) {
        self.controls.reset();
        self.update_camera(0.0);
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[must_use]
    pub fn camera_position(&self) -> Vec3 {
        self.camera_transform.position
    }

    #[must_use]
    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    #[must_use]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    #[must_use]
    pub fn environment(&self) -> &EnvironmentSettings {
        &self.environment
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.backend.resize(width, height);
        let (w, h) = self.backend.size();
        self.camera.set_aspect(w as f32 / h.max(1) as f32);
    }

    fn update_camera(&mut self, dt: f32) {
        self.controls.update(&mut self.camera_transform, dt);
        self.camera_transform.update_local_matrix();
        let world = *self.camera_transform.local_matrix();
        self.camera_transform.set_world_matrix(world);
        self.camera.update_view_projection(&world);
    }

    // ========================================================================
    // Frame loop
    // ========================================================================

    /// One frame: camera, transition weights, mixer, then render. Runs fine
    /// with no rig attached.
    pub fn tick(&mut self, dt: f32, controller: &mut AnimationController) -> Result<()> {
        self.update_camera(dt);
        if let Some(rig) = self.rig.as_mut() {
            controller.update(rig, dt);
            rig.update(dt);
        }
        self.render()
    }

    pub fn render(&mut self) -> Result<()> {
        self.draws.clear();
        if let Some(rig) = &self.rig {
            rig.collect_draws(&mut self.draws);
        }

        let frame = Frame {
            view_projection: self.camera.view_projection_matrix(),
            clear_color: self.clear_color,
            lights: &self.lights,
            environment_intensity: self.environment.intensity,
            draws: &self.draws,
        };
        self.backend.render(&frame, &self.resources)?;
        self.frames_rendered += 1;
        trace!("Frame {} ({} draws)", self.frames_rendered, self.draws.len());
        Ok(())
    }

    #[must_use]
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// PNG-encodes the last rendered frame.
    pub fn capture_frame(&self) -> Result<Vec<u8>> {
        let frame = self.backend.read_pixels().ok_or(ViewerError::CaptureUnavailable)?;
        let image = RgbaImage::from_raw(frame.width, frame.height, frame.pixels)
            .ok_or_else(|| ViewerError::Render("framebuffer size mismatch".to_string()))?;

        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png)?;
        debug!("Captured {}x{} frame", frame.width, frame.height);
        Ok(bytes.into_inner())
    }
}
