//! The viewer facade: the control surface the surrounding UI talks to.
//!
//! All calls are synchronous and cheap. Anything that needs I/O is started
//! as a future and applied on a later [`Viewer::update`], following
//! load-then-swap: the scene keeps showing its previous state until the
//! replacement is ready, and a load superseded in the meantime is disposed
//! rather than applied.
//!
//! ```rust,ignore
//! let mut viewer = Viewer::headless(ViewerConfig::default(), catalog, reader)?;
//! viewer.select_model("default-samurai")?;
//! viewer.update(1.0 / 60.0)?;          // model arrives
//! viewer.select_animation("walk")?;
//! viewer.update(1.0 / 60.0)?;          // clip arrives and starts
//! let shot = viewer.capture_screenshot()?;
//! ```

pub mod events;
pub mod requests;
pub mod state;

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::StreamExt;
use futures::future::BoxFuture;
use log::{debug, info, trace, warn};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::animation::{AnimationClip, AnimationController, ControllerState, PlayOptions};
use crate::assets::io::extension_of;
use crate::assets::{AnimationAsset, AssetCatalog, AssetReader, DecoderRegistry, MemoryAssetReader};
use crate::config::ViewerConfig;
use crate::errors::{AssetError, Result, ViewerError};
use crate::resources::GpuResources;
use crate::rig::{CharacterRig, RigState, TraitCategory};
use crate::scene::{HeadlessBackend, ModelScene, RenderBackend, SceneHost};

pub use events::ViewerEvent;
pub use requests::{LoadSlot, RequestTracker, Ticket};
pub use state::{ModelSelection, Screenshot, ViewerState, ViewerStats};

use requests::{Completion, LoadPayload, PendingLoads};

/// Upload extensions accepted by [`Viewer::upload_custom_model`].
pub const UPLOAD_EXTENSIONS: [&str; 2] = ["glb", "gltf"];

const EVENT_CAPACITY: usize = 256;
const BLOB_SCHEME: &str = "blob:";

pub struct Viewer {
    config: ViewerConfig,
    catalog: Arc<AssetCatalog>,
    reader: Arc<dyn AssetReader>,
    blobs: Arc<MemoryAssetReader>,
    decoders: DecoderRegistry,
    resources: Arc<GpuResources>,

    host: SceneHost,
    controller: AnimationController,

    state: ViewerState,
    stats: ViewerStats,
    requests: RequestTracker,
    pending: PendingLoads,
    clips: FxHashMap<String, Arc<AnimationClip>>,
    /// Clip fetch that starts playing when it arrives.
    clip_request: Option<Ticket>,

    events_tx: flume::Sender<ViewerEvent>,
    events_rx: flume::Receiver<ViewerEvent>,
}

impl Viewer {
    pub fn new(
        config: ViewerConfig,
        catalog: Arc<AssetCatalog>,
        reader: Arc<dyn AssetReader>,
        backend: Box<dyn RenderBackend>,
    ) -> Result<Self> {
        config.validate()?;
        let resources = Arc::new(GpuResources::new());
        let host = SceneHost::new(&config, backend, Arc::clone(&resources))?;
        let (events_tx, events_rx) = flume::bounded(EVENT_CAPACITY);

        info!(
            "Viewer ready: {} models, {} animations",
            catalog.models().len(),
            catalog.animations().len()
        );
        Ok(Self {
            state: ViewerState::new(config.animation.default_speed),
            config,
            catalog,
            reader,
            blobs: Arc::new(MemoryAssetReader::new()),
            decoders: DecoderRegistry::with_defaults(),
            resources,
            host,
            controller: AnimationController::new(),
            stats: ViewerStats::default(),
            requests: RequestTracker::default(),
            pending: PendingLoads::new(),
            clips: FxHashMap::default(),
            clip_request: None,
            events_tx,
            events_rx,
        })
    }

    /// A viewer rendering into an offscreen CPU framebuffer.
    pub fn headless(config: ViewerConfig, catalog: Arc<AssetCatalog>, reader: Arc<dyn AssetReader>) -> Result<Self> {
        let backend = HeadlessBackend::new(config.viewport.width, config.viewport.height);
        Self::new(config, catalog, reader, Box::new(backend))
    }

    /// Replaces the format decoders, e.g. to add an FBX clip decoder.
    #[must_use]
    pub fn with_decoders(mut self, decoders: DecoderRegistry) -> Self {
        self.decoders = decoders;
        self
    }

    // ========================================================================
    // Model selection
    // ========================================================================

    /// Starts loading a catalog model. The current model stays visible until
    /// the new one is ready.
    pub fn select_model(&mut self, id: &str) -> Result<()> {
        let uri = self.catalog.model(id)?.mesh_uri.clone();
        self.request_model(ModelSelection::Catalog(id.to_string()), uri)
    }

    /// Loads a user-supplied model file. Only `.glb` and `.gltf` are
    /// accepted; anything else is rejected without touching the scene.
    pub fn upload_custom_model(&mut self, bytes: Vec<u8>, filename: &str) -> Result<()> {
        let accepted = extension_of(filename).is_some_and(|ext| UPLOAD_EXTENSIONS.contains(&ext.as_str()));
        if !accepted {
            return Err(ViewerError::UnsupportedFormat {
                filename: filename.to_string(),
            });
        }

        let blob_uri = format!("{BLOB_SCHEME}{}", Uuid::new_v4());
        self.blobs.insert(blob_uri.clone(), bytes);
        let selection = ModelSelection::Uploaded {
            filename: filename.to_string(),
            blob_uri: blob_uri.clone(),
        };
        self.request_model(selection, blob_uri.clone()).inspect_err(|_| {
            self.blobs.remove(&blob_uri);
        })
    }

    fn request_model(&mut self, selection: ModelSelection, uri: String) -> Result<()> {
        let extension = match &selection {
            ModelSelection::Uploaded { filename, .. } => extension_of(filename),
            ModelSelection::Catalog(_) => extension_of(&uri),
        };
        let decoder = self
            .decoders
            .model_decoder(extension.as_deref().unwrap_or_default())
            .map_err(|source| ViewerError::AssetLoad {
                uri: uri.clone(),
                source,
            })?;

        self.ensure_rig().begin_load()?;
        let ticket = self.requests.issue(LoadSlot::Model);
        let subject = selection.subject();
        let read = self.fetch(&uri);
        let resources = Arc::clone(&self.resources);
        let label = subject.clone();

        self.spawn(Box::pin(async move {
            let result = match read.await {
                Ok(bytes) => decoder.decode_model(&bytes, &label, &resources),
                Err(e) => Err(e),
            };
            Completion {
                ticket,
                payload: LoadPayload::Model { selection, uri, result },
            }
        }));
        debug!("Requested model '{subject}' (generation {})", ticket.generation);
        self.emit(ViewerEvent::ModelLoading { subject });
        Ok(())
    }

    // ========================================================================
    // Animation
    // ========================================================================

    /// Cross-fades to a catalog animation. Requires a loaded model.
    pub fn select_animation(&mut self, id: &str) -> Result<()> {
        let asset = self.catalog.animation(id)?.clone();
        if !self.host.rig().is_some_and(CharacterRig::has_model) {
            return Err(ViewerError::NoModelReady);
        }

        let ticket = self.requests.issue(LoadSlot::Animation);
        match self.clips.get(id).cloned() {
            Some(clip) => self.play_clip(&asset, clip),
            None => {
                self.request_clip(asset, ticket, true)?;
                self.clip_request = Some(ticket);
                Ok(())
            }
        }
    }

    /// Fetches and caches a clip without playing it.
    pub fn preload_animation(&mut self, id: &str) -> Result<()> {
        let asset = self.catalog.animation(id)?.clone();
        if self.clips.contains_key(id) {
            return Ok(());
        }
        let ticket = self.requests.join(LoadSlot::Preload);
        self.request_clip(asset, ticket, false)
    }

    /// Drops a cached clip. Actions already playing it are unaffected.
    pub fn evict_animation(&mut self, id: &str) -> bool {
        self.clips.remove(id).is_some()
    }

    #[must_use]
    pub fn is_animation_cached(&self, id: &str) -> bool {
        self.clips.contains_key(id)
    }

    fn request_clip(&mut self, asset: AnimationAsset, ticket: Ticket, play: bool) -> Result<()> {
        let id = asset.id;
        let uri = asset.clip_uri;
        let decoder = self
            .decoders
            .clip_decoder(extension_of(&uri).as_deref().unwrap_or_default())
            .map_err(|e| ViewerError::AnimationLoad {
                id: id.clone(),
                reason: e.to_string(),
            })?;

        let read = self.fetch(&uri);
        self.spawn(Box::pin(async move {
            let result = match read.await {
                Ok(bytes) => decoder.decode_clips(&bytes, &id),
                Err(e) => Err(e),
            };
            Completion {
                ticket,
                payload: LoadPayload::Animation { id, uri, play, result },
            }
        }));
        Ok(())
    }

    fn play_clip(&mut self, asset: &AnimationAsset, clip: Arc<AnimationClip>) -> Result<()> {
        let options = PlayOptions {
            speed: self.state.speed,
            loop_enabled: self.state.loop_enabled,
            playing: self.state.is_playing,
        };
        let rig = self.host.rig_mut().ok_or(ViewerError::NoModelReady)?;
        self.controller.play(rig, clip, asset, options)?;
        self.state.selected_animation = Some(asset.id.clone());
        self.emit(ViewerEvent::AnimationStarted { id: asset.id.clone() });
        Ok(())
    }

    /// After a model swap, restarts the selected animation on the new mixer.
    /// A clip still in flight for the latest selection plays on arrival
    /// instead.
    fn reapply_animation(&mut self) {
        if let Some(ticket) = self.clip_request
            && self.requests.is_current(&ticket)
        {
            debug!("Animation starts on the new model once its clip arrives");
            return;
        }
        let Some(id) = self.state.selected_animation.clone() else {
            return;
        };
        let Ok(asset) = self.catalog.animation(&id).cloned() else {
            return;
        };
        let result = match self.clips.get(&id).cloned() {
            Some(clip) => self.play_clip(&asset, clip),
            None => {
                let ticket = self.requests.issue(LoadSlot::Animation);
                let requested = self.request_clip(asset, ticket, true);
                if requested.is_ok() {
                    self.clip_request = Some(ticket);
                }
                requested
            }
        };
        if let Err(e) = result {
            self.report_failure(LoadSlot::Animation, &e);
        }
    }

    // ========================================================================
    // Playback controls
    // ========================================================================

    pub fn set_playing(&mut self, playing: bool) {
        self.state.is_playing = playing;
        if let Some(rig) = self.host.rig_mut() {
            self.controller.set_playing(rig, playing);
        }
    }

    /// Sets the speed multiplier, clamped to the configured range.
    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ViewerError::InvalidSpeed(speed));
        }
        let speed = self.config.animation.clamp_speed(speed);
        self.state.speed = speed;
        if let Some(rig) = self.host.rig_mut() {
            self.controller.set_speed(rig, speed)?;
        }
        Ok(())
    }

    pub fn set_loop(&mut self, loop_enabled: bool) {
        self.state.loop_enabled = loop_enabled;
        if let Some(rig) = self.host.rig_mut() {
            self.controller.set_loop(rig, loop_enabled);
        }
    }

    // ========================================================================
    // Camera & capture
    // ========================================================================

    pub fn rotate_camera(&mut self, delta_radians: f32) {
        self.host.rotate(delta_radians);
        self.state.camera_yaw += delta_radians;
    }

    pub fn reset_camera(&mut self) {
        self.host.reset();
        self.state.camera_yaw = 0.0;
    }

    /// PNG of the last rendered frame, named after the current model.
    pub fn capture_screenshot(&self) -> Result<Screenshot> {
        let png = self.host.capture_frame()?;
        let subject = self
            .state
            .selected_model
            .as_ref()
            .map(ModelSelection::subject)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "scene".to_string());
        Ok(Screenshot {
            file_name: format!("{subject}-model.png"),
            png,
        })
    }

    // ========================================================================
    // Traits
    // ========================================================================

    /// Starts loading an overlay for `category`, superseding any pending one.
    pub fn attach_trait(&mut self, category: TraitCategory, uri: &str) -> Result<()> {
        if !self.host.rig().is_some_and(CharacterRig::has_model) {
            return Err(ViewerError::NoModelReady);
        }
        let decoder = self
            .decoders
            .model_decoder(extension_of(uri).as_deref().unwrap_or_default())
            .map_err(|source| ViewerError::AssetLoad {
                uri: uri.to_string(),
                source,
            })?;

        let ticket = self.requests.issue(LoadSlot::Trait(category));
        let read = self.fetch(uri);
        let resources = Arc::clone(&self.resources);
        let uri = uri.to_string();
        self.spawn(Box::pin(async move {
            let result = match read.await {
                Ok(bytes) => decoder.decode_model(&bytes, &uri, &resources),
                Err(e) => Err(e),
            };
            Completion {
                ticket,
                payload: LoadPayload::Trait { category, uri, result },
            }
        }));
        Ok(())
    }

    /// Removes the overlay in `category` and cancels any pending one.
    pub fn detach_trait(&mut self, category: TraitCategory) -> bool {
        self.requests.invalidate(LoadSlot::Trait(category));
        let removed = self.host.rig_mut().is_some_and(|rig| rig.detach_trait(category));
        if removed {
            self.emit(ViewerEvent::TraitDetached { category });
        }
        removed
    }

    // ========================================================================
    // Frame loop
    // ========================================================================

    /// Applies finished loads, then advances and renders one frame.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        self.poll_loads();
        self.host.tick(dt, &mut self.controller)?;
        self.stats.frames_rendered = self.host.frames_rendered();
        Ok(())
    }

    /// Polls in-flight loads once without blocking and applies the finished
    /// ones. Returns how many completed.
    pub fn poll_loads(&mut self) -> usize {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        let mut done = Vec::new();
        while let Poll::Ready(Some(completion)) = self.pending.poll_next_unpin(&mut cx) {
            done.push(completion);
        }
        let count = done.len();
        for completion in done {
            self.apply(completion);
        }
        count
    }

    /// Number of loads still in flight.
    #[must_use]
    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    fn apply(&mut self, completion: Completion) {
        let Completion { ticket, payload } = completion;
        if !self.requests.is_current(&ticket) {
            self.discard(ticket.slot, payload);
            return;
        }
        if self.clip_request == Some(ticket) {
            self.clip_request = None;
        }

        match payload {
            LoadPayload::Model { selection, uri, result } => self.apply_model(selection, &uri, result),
            LoadPayload::Animation { id, uri, play, result } => self.apply_clip(ticket.slot, &id, &uri, play, result),
            LoadPayload::Trait { category, uri, result } => self.apply_trait(category, &uri, result),
        }
    }

    fn discard(&mut self, slot: LoadSlot, payload: LoadPayload) {
        match payload {
            LoadPayload::Model { selection, result, .. } => {
                if let Ok(mut scene) = result {
                    scene.dispose(&self.resources);
                }
                if let Some(blob) = selection.blob_uri() {
                    self.blobs.remove(blob);
                }
            }
            LoadPayload::Trait { result, .. } => {
                if let Ok(mut scene) = result {
                    scene.dispose(&self.resources);
                }
            }
            LoadPayload::Animation { .. } => {}
        }
        self.stats.stale_discarded += 1;
        debug!("Discarded stale {slot} load");
        self.emit(ViewerEvent::StaleLoadDiscarded { slot });
    }

    fn apply_model(&mut self, selection: ModelSelection, uri: &str, result: std::result::Result<ModelScene, AssetError>) {
        let loaded = result.is_ok();
        if loaded {
            // The old mixer goes away with the old model.
            self.controller.detach();
        }
        let outcome = self.ensure_rig().finish_load(uri, result);
        if let Err(e) = outcome {
            if let Some(blob) = selection.blob_uri() {
                self.blobs.remove(blob);
            }
            self.report_failure(LoadSlot::Model, &e);
            return;
        }

        let previous = self.state.selected_model.replace(selection.clone());
        if let Some(old_blob) = previous.as_ref().and_then(ModelSelection::blob_uri)
            && Some(old_blob) != selection.blob_uri()
        {
            self.blobs.remove(old_blob);
        }
        self.stats.loads_applied += 1;
        self.emit(ViewerEvent::ModelReady {
            subject: selection.subject(),
        });
        self.reapply_animation();
    }

    fn apply_clip(
        &mut self,
        slot: LoadSlot,
        id: &str,
        uri: &str,
        play: bool,
        result: std::result::Result<Vec<AnimationClip>, AssetError>,
    ) {
        let clip = match result {
            Ok(clips) => clips.into_iter().next().ok_or_else(|| ViewerError::AnimationLoad {
                id: id.to_string(),
                reason: format!("no animation clips in {uri}"),
            }),
            Err(e) => Err(ViewerError::AnimationLoad {
                id: id.to_string(),
                reason: e.to_string(),
            }),
        }
        .and_then(|clip| {
            if clip.is_playable() {
                Ok(Arc::new(clip))
            } else {
                Err(ViewerError::AnimationLoad {
                    id: id.to_string(),
                    reason: format!("clip '{}' has no tracks, zero duration or malformed keyframes", clip.name),
                })
            }
        });

        let clip = match clip {
            Ok(clip) => clip,
            Err(e) => {
                self.report_failure(slot, &e);
                return;
            }
        };
        self.clips.insert(id.to_string(), Arc::clone(&clip));
        self.stats.loads_applied += 1;
        if !play {
            trace!("Cached clip '{id}'");
            return;
        }

        let Ok(asset) = self.catalog.animation(id).cloned() else {
            return;
        };
        if let Err(e) = self.play_clip(&asset, clip) {
            self.report_failure(slot, &e);
        }
    }

    fn apply_trait(&mut self, category: TraitCategory, uri: &str, result: std::result::Result<ModelScene, AssetError>) {
        let outcome = match result {
            Ok(scene) => match self.host.rig_mut() {
                Some(rig) => rig.attach_trait(category, uri, scene),
                None => {
                    let mut scene = scene;
                    scene.dispose(&self.resources);
                    Err(ViewerError::NoModelReady)
                }
            },
            Err(source) => Err(ViewerError::AssetLoad {
                uri: uri.to_string(),
                source,
            }),
        };
        match outcome {
            Ok(()) => {
                self.stats.loads_applied += 1;
                self.emit(ViewerEvent::TraitAttached {
                    category,
                    uri: uri.to_string(),
                });
            }
            Err(e) => self.report_failure(LoadSlot::Trait(category), &e),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Tears everything down: pending loads are dropped, the rig and its
    /// resources are disposed and uploaded blobs are revoked. The viewer can
    /// be reused afterwards and starts from an empty scene.
    pub fn shutdown(&mut self) {
        self.requests.invalidate_all();
        let dropped = self.pending.len();
        self.pending = PendingLoads::new();

        if let Some(mut rig) = self.host.detach_rig() {
            rig.dispose();
        }
        self.controller.detach();
        let revoked = self.blobs.clear();
        self.clips.clear();
        self.clip_request = None;
        self.state.selected_model = None;
        self.state.selected_animation = None;
        info!("Viewer shut down ({dropped} pending loads dropped, {revoked} blobs revoked)");
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    #[must_use]
    pub fn rig_state(&self) -> Option<RigState> {
        self.host.rig().map(CharacterRig::state)
    }

    #[must_use]
    pub fn rig(&self) -> Option<&CharacterRig> {
        self.host.rig()
    }

    #[must_use]
    pub fn controller_state(&self) -> &ControllerState {
        self.controller.state()
    }

    #[must_use]
    pub fn controller(&self) -> &AnimationController {
        &self.controller
    }

    #[must_use]
    pub fn host(&self) -> &SceneHost {
        &self.host
    }

    #[must_use]
    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub fn resources(&self) -> &Arc<GpuResources> {
        &self.resources
    }

    /// Whether an uploaded blob is still registered.
    #[must_use]
    pub fn has_blob(&self, blob_uri: &str) -> bool {
        self.blobs.contains(blob_uri)
    }

    #[must_use]
    pub fn stats(&self) -> ViewerStats {
        ViewerStats {
            models_disposed: self.host.rig().map_or(0, CharacterRig::models_disposed),
            live_resources: self.resources.live(),
            disposed_resources: self.resources.disposed(),
            ..self.stats
        }
    }

    /// Receiver for viewer events. Events beyond the channel capacity are
    /// dropped while nobody drains it.
    #[must_use]
    pub fn events(&self) -> flume::Receiver<ViewerEvent> {
        self.events_rx.clone()
    }

    /// Takes every event queued so far.
    pub fn drain_events(&self) -> Vec<ViewerEvent> {
        self.events_rx.try_iter().collect()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ensure_rig(&mut self) -> &mut CharacterRig {
        let resources = &self.resources;
        let config = &self.config;
        self.host.live_rig_or_insert_with(|| {
            CharacterRig::new(Arc::clone(resources), config.model.clone(), config.material)
        })
    }

    fn fetch(&self, uri: &str) -> BoxFuture<'static, std::result::Result<Vec<u8>, AssetError>> {
        if uri.starts_with(BLOB_SCHEME) {
            self.blobs.read_bytes(uri)
        } else {
            self.reader.read_bytes(uri)
        }
    }

    fn spawn(&mut self, load: BoxFuture<'static, Completion>) {
        self.pending.push(load);
        self.stats.loads_issued += 1;
    }

    fn report_failure(&mut self, slot: LoadSlot, error: &ViewerError) {
        let message = error.to_string();
        warn!("{message}");
        self.stats.load_failures += 1;
        self.state.last_error = Some(message.clone());
        self.emit(ViewerEvent::LoadFailed { slot, message });
    }

    fn emit(&self, event: ViewerEvent) {
        if self.events_tx.try_send(event).is_err() {
            trace!("Event queue full, dropping event");
        }
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
