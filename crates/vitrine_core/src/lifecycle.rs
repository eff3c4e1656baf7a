//! Composition root: mount, event routing, per-frame tick and teardown.
//!
//! [`ViewerLifecycle`] owns a [`ViewerContext`] with the engine and host
//! collaborators plus the three state machines. Each piece of shared state
//! has exactly one writer: layout is written here, load state by
//! [`AssetLoadState`], interaction by [`InteractionGate`], and the model
//! rotation by [`RenderLoopController`] through the engine.
//!
//! Teardown is scoped: `unmount` runs on drop, stops the frame loop and
//! releases the resize listener. Load events that arrive afterwards are
//! dropped.

use std::time::Instant;

use crate::config::ViewerConfig;
use crate::engine::{AssetLoader, HostBindings, LoadEvent, RenderEngine};
use crate::error::{ViewerError, ViewerResult};
use crate::interaction::{InteractionGate, InteractionSignal, InteractionState};
use crate::layout::LayoutConfig;
use crate::load::{AssetLoadState, Reveal};
use crate::render_loop::{FrameInputs, FrameReport, RenderLoopController};
use crate::source::SourceSelection;

/// Collaborators owned by one viewer instance.
#[derive(Debug)]
pub struct ViewerContext<E, H> {
    pub engine: E,
    pub host: H,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Unmounted,
    Mounted,
    TornDown,
}

pub struct ViewerLifecycle<E: RenderEngine, H: HostBindings> {
    config: ViewerConfig,
    ctx: ViewerContext<E, H>,
    layout: LayoutConfig,
    load: AssetLoadState<E::Model>,
    gate: InteractionGate,
    render_loop: RenderLoopController,
    phase: LifecyclePhase,
    source: Option<SourceSelection>,
    resize_listener_attached: bool,
    layout_dirty: bool,
}

impl<E: RenderEngine, H: HostBindings> ViewerLifecycle<E, H> {
    pub fn new(config: ViewerConfig, engine: E, host: H) -> Self {
        let layout = config.layout.resolve(0.0, 0.0);
        let load = AssetLoadState::new(config.failure_policy(), config.settle_delay());
        let render_loop = RenderLoopController::new(config.render_mode, config.rotation_per_frame);
        Self {
            config,
            ctx: ViewerContext { engine, host },
            layout,
            load,
            gate: InteractionGate::new(),
            render_loop,
            phase: LifecyclePhase::Unmounted,
            source: None,
            resize_listener_attached: false,
            layout_dirty: false,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn source(&self) -> Option<&SourceSelection> {
        self.source.as_ref()
    }

    pub fn load_state(&self) -> &AssetLoadState<E::Model> {
        &self.load
    }

    pub fn interaction(&self) -> InteractionState {
        self.gate.state()
    }

    pub fn render_loop(&self) -> &RenderLoopController {
        &self.render_loop
    }

    pub fn engine(&self) -> &E {
        &self.ctx.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.ctx.engine
    }

    pub fn host(&self) -> &H {
        &self.ctx.host
    }

    /// Build the scene, start the load and begin ticking.
    ///
    /// Fails only on engine construction or lifecycle misuse; nothing stays
    /// attached on the error path. A loader that refuses the request is
    /// treated like an asset failure.
    pub fn mount(
        &mut self,
        viewport_width: f32,
        viewport_height: f32,
        requested_version: Option<&str>,
        loader: &mut impl AssetLoader,
        now: Instant,
    ) -> ViewerResult<()> {
        if self.phase != LifecyclePhase::Unmounted {
            return Err(ViewerError::InvalidStateTransition("mount called twice"));
        }

        let selection = self.config.sources.resolve(requested_version);
        self.layout = self.config.layout.resolve(viewport_width, viewport_height);
        let surface = self.config.layout.surface_size(viewport_width);
        self.ctx.engine.build_scene(&self.layout, surface)?;
        self.load.begin_load(&selection.source_id)?;

        self.ctx.host.attach_interaction_listeners();
        self.ctx.host.attach_resize_listener();
        self.resize_listener_attached = true;
        self.phase = LifecyclePhase::Mounted;

        log::info!(
            "Viewer mounted: version '{}' -> '{}' ({:?} layout)",
            selection.version,
            selection.source_id,
            self.layout.branch
        );
        if let Err(err) = loader.load(&selection.source_id) {
            self.handle_load_event(LoadEvent::Error(err), now);
        }
        self.source = Some(selection);

        self.render_loop.start(&mut self.ctx.host);
        Ok(())
    }

    pub fn on_resize(&mut self, viewport_width: f32, viewport_height: f32) {
        if !self.resize_listener_attached {
            return;
        }
        self.layout = self.config.layout.resolve(viewport_width, viewport_height);
        self.ctx.engine.apply_layout(&self.layout);
        self.ctx
            .engine
            .resize_surface(self.config.layout.surface_size(viewport_width));
        self.layout_dirty = true;
        log::info!(
            "Viewport resized to {viewport_width}x{viewport_height} ({:?} layout)",
            self.layout.branch
        );
    }

    pub fn on_interaction(&mut self, signal: InteractionSignal) {
        if self.phase != LifecyclePhase::Mounted {
            return;
        }
        match self.gate.apply(signal) {
            Some(InteractionState::Active) => {
                self.render_loop.on_interaction_start(&mut self.ctx.host)
            }
            Some(InteractionState::Idle) => self.render_loop.on_interaction_end(&mut self.ctx.host),
            None => {}
        }
    }

    /// The orbit controls moved the camera.
    pub fn on_controls_change(&mut self) {
        if self.phase == LifecyclePhase::Mounted {
            self.render_loop.on_controls_change(&mut self.ctx.host);
        }
    }

    /// Route one loader callback. Rejected callbacks are logged, never raised.
    pub fn handle_load_event(&mut self, event: LoadEvent<E::Model>, now: Instant) {
        if self.phase != LifecyclePhase::Mounted {
            log::debug!("Ignoring load event after teardown");
            return;
        }
        let result = match event {
            LoadEvent::Progress { loaded, total } => self.load.on_progress(loaded, total),
            LoadEvent::Complete(model) => self.load.on_complete(model, now),
            LoadEvent::Error(err) => self.load.on_error(err, now),
        };
        if let Err(err) = result {
            log::warn!("Ignoring load event: {err}");
        }
    }

    /// Fire a due reveal. Safe to call at any time; also run at the start of every tick.
    pub fn poll(&mut self, now: Instant) {
        if self.phase != LifecyclePhase::Mounted {
            return;
        }
        match self.load.poll(now) {
            Some(Reveal::Attach(model)) => {
                self.ctx.engine.attach_model(model);
                self.render_loop.on_controls_change(&mut self.ctx.host);
            }
            Some(Reveal::HideOnly) => self.render_loop.on_controls_change(&mut self.ctx.host),
            None => {}
        }
    }

    /// When the host must wake up next even without frames.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.phase != LifecyclePhase::Mounted {
            return None;
        }
        self.load.next_deadline()
    }

    pub fn tick(&mut self, now: Instant) -> FrameReport {
        if self.phase != LifecyclePhase::Mounted {
            return FrameReport::default();
        }
        self.poll(now);

        let update = self.load.take_overlay_update();
        if update.is_some() || self.layout_dirty {
            let view = update.unwrap_or_else(|| self.load.overlay().clone());
            self.ctx.engine.publish_overlay(&view, &self.layout);
            self.layout_dirty = false;
        }

        let inputs = FrameInputs {
            content_ready: self.load.is_content_ready(),
            interaction: self.gate.state(),
        };
        self.render_loop.tick(&mut self.ctx.engine, inputs)
    }

    /// Stop the frame loop and release listeners. Idempotent.
    pub fn unmount(&mut self) {
        if self.phase != LifecyclePhase::Mounted {
            return;
        }
        self.render_loop.stop(&mut self.ctx.host);
        if self.resize_listener_attached {
            self.ctx.host.detach_resize_listener();
            self.resize_listener_attached = false;
        }
        self.phase = LifecyclePhase::TornDown;
        log::info!("Viewer unmounted");
    }
}

impl<E: RenderEngine, H: HostBindings> Drop for ViewerLifecycle<E, H> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetLoadError;
    use crate::layout::{LayoutBranch, SurfaceSize};
    use crate::load::{LoadOutcome, OverlayPresentation};
    use crate::render_loop::{LoopState, RenderMode};
    use crate::testing::{FakeModel, RecordingEngine, RecordingHost, RecordingLoader};
    use std::time::Duration;

    type TestViewer = ViewerLifecycle<RecordingEngine, RecordingHost>;

    fn viewer(config: ViewerConfig) -> TestViewer {
        ViewerLifecycle::new(config, RecordingEngine::default(), RecordingHost::default())
    }

    fn mounted(config: ViewerConfig, t0: Instant) -> TestViewer {
        let mut viewer = viewer(config);
        let mut loader = RecordingLoader::default();
        viewer
            .mount(1200.0, 900.0, Some("v3"), &mut loader, t0)
            .expect("mount should succeed");
        assert_eq!(loader.requested, vec!["models/v3/444.gltf".to_string()]);
        viewer
    }

    fn complete_and_reveal(viewer: &mut TestViewer, t0: Instant) -> Instant {
        viewer.handle_load_event(LoadEvent::Progress { loaded: 1, total: 1 }, t0);
        viewer.handle_load_event(LoadEvent::Complete(FakeModel::named("m1")), t0);
        let revealed_at = t0 + Duration::from_millis(500);
        viewer.tick(revealed_at);
        revealed_at
    }

    #[test]
    fn mount_builds_scene_and_acquires_listeners() {
        let t0 = Instant::now();
        let viewer = mounted(ViewerConfig::default(), t0);

        assert_eq!(viewer.phase(), LifecyclePhase::Mounted);
        let (layout, surface) = viewer.engine().built_with.expect("scene was built");
        assert_eq!(layout.branch, LayoutBranch::Compact);
        assert_eq!(surface, SurfaceSize { width: 1200, height: 804 });
        assert!(viewer.host().interaction_listeners);
        assert!(viewer.host().resize_listener);
        assert!(viewer.host().frame_loop_registered);
        assert_eq!(viewer.render_loop().state(), LoopState::Running);
        assert_eq!(viewer.load_state().outcome(), Some(&LoadOutcome::Pending));
    }

    #[test]
    fn unknown_version_mounts_the_default_source() {
        let mut viewer = viewer(ViewerConfig::default());
        let mut loader = RecordingLoader::default();
        viewer
            .mount(800.0, 600.0, Some("nope"), &mut loader, Instant::now())
            .expect("fallback must not fail");
        assert_eq!(loader.requested, vec!["models/v4/666.gltf".to_string()]);
        assert!(viewer.source().expect("source recorded").fell_back);
    }

    #[test]
    fn engine_failure_leaves_nothing_attached() {
        let mut engine = RecordingEngine::default();
        engine.fail_build = true;
        let mut viewer = ViewerLifecycle::new(ViewerConfig::default(), engine, RecordingHost::default());
        let mut loader = RecordingLoader::default();

        let err = viewer
            .mount(1200.0, 900.0, None, &mut loader, Instant::now())
            .expect_err("engine failure propagates");
        assert!(matches!(err, ViewerError::Engine(_)));
        assert_eq!(viewer.phase(), LifecyclePhase::Unmounted);
        assert!(!viewer.host().resize_listener);
        assert!(!viewer.host().frame_loop_registered);
        assert!(loader.requested.is_empty());
    }

    #[test]
    fn input_before_mount_is_ignored() {
        let config = ViewerConfig {
            render_mode: RenderMode::OnDemand,
            ..ViewerConfig::default()
        };
        let mut viewer = viewer(config);

        viewer.on_interaction(InteractionSignal::Start);
        viewer.on_interaction(InteractionSignal::Move);
        viewer.on_controls_change();
        viewer.on_resize(1920.0, 1080.0);
        let report = viewer.tick(Instant::now());

        assert_eq!(viewer.phase(), LifecyclePhase::Unmounted);
        assert_eq!(viewer.interaction(), InteractionState::Idle);
        assert_eq!(viewer.render_loop().state(), LoopState::Stopped);
        assert_eq!(report, FrameReport::default());
        let host = viewer.host();
        assert_eq!(host.registrations, 0);
        assert_eq!(host.cancellations, 0);
        assert_eq!(host.frame_requests, 0);
        assert!(viewer.engine().applied_layouts.is_empty());
        assert_eq!(viewer.engine().draws, 0);
    }

    #[test]
    fn second_mount_is_rejected() {
        let t0 = Instant::now();
        let mut viewer = mounted(ViewerConfig::default(), t0);
        let mut loader = RecordingLoader::default();
        assert!(viewer.mount(1200.0, 900.0, None, &mut loader, t0).is_err());
        assert!(loader.requested.is_empty());
    }

    #[test]
    fn successful_load_attaches_after_settle_and_rotates() {
        let t0 = Instant::now();
        let mut viewer = mounted(ViewerConfig::default(), t0);

        viewer.handle_load_event(LoadEvent::Progress { loaded: 5, total: 10 }, t0);
        assert_eq!(viewer.load_state().progress().fraction, 0.5);
        viewer.handle_load_event(LoadEvent::Progress { loaded: 10, total: 10 }, t0);
        viewer.handle_load_event(LoadEvent::Complete(FakeModel::named("m1")), t0);

        viewer.tick(t0 + Duration::from_millis(100));
        assert!(viewer.engine().attached.is_empty());
        assert_eq!(viewer.engine().rotation(), None);

        viewer.tick(t0 + Duration::from_millis(500));
        assert_eq!(viewer.engine().attached.len(), 1);
        let last_overlay = viewer.engine().overlays.last().expect("overlay published");
        assert_eq!(last_overlay.presentation, OverlayPresentation::Hidden);

        viewer.handle_load_event(LoadEvent::Error(AssetLoadError::new("m1", "late")), t0);
        assert_eq!(viewer.load_state().outcome(), Some(&LoadOutcome::Succeeded));
        assert_eq!(viewer.engine().attached.len(), 1);
    }

    #[test]
    fn hundred_idle_ticks_then_interaction_holds_rotation() {
        let t0 = Instant::now();
        let config = ViewerConfig {
            rotation_per_frame: 0.008,
            ..ViewerConfig::default()
        };
        let mut viewer = mounted(config, t0);
        let now = complete_and_reveal(&mut viewer, t0);
        let start = viewer.engine().rotation().expect("model attached");

        for _ in 0..100 {
            viewer.tick(now);
        }
        let after_idle = viewer.engine().rotation().unwrap();
        assert!((after_idle - start - 100.0 * 0.008).abs() < 1e-4);

        viewer.on_interaction(InteractionSignal::Start);
        let draws_before = viewer.engine().draws;
        for _ in 0..50 {
            viewer.on_interaction(InteractionSignal::Move);
            viewer.tick(now);
        }
        assert_eq!(viewer.engine().rotation(), Some(after_idle));
        assert_eq!(viewer.engine().draws, draws_before + 50);
    }

    #[test]
    fn on_demand_mode_halts_drawing_while_interacting() {
        let t0 = Instant::now();
        let config = ViewerConfig {
            render_mode: RenderMode::OnDemand,
            ..ViewerConfig::default()
        };
        let mut viewer = mounted(config, t0);
        let now = complete_and_reveal(&mut viewer, t0);

        viewer.on_interaction(InteractionSignal::Start);
        assert_eq!(viewer.render_loop().state(), LoopState::Suspended);
        let draws_before = viewer.engine().draws;
        for _ in 0..50 {
            viewer.tick(now);
        }
        assert_eq!(viewer.engine().draws, draws_before);

        viewer.on_controls_change();
        viewer.tick(now);
        assert_eq!(viewer.engine().draws, draws_before + 1);

        viewer.on_interaction(InteractionSignal::End);
        assert_eq!(viewer.render_loop().state(), LoopState::Running);
        assert!(viewer.tick(now).rotated);
    }

    #[test]
    fn immediate_error_soft_fails_without_attaching() {
        let t0 = Instant::now();
        let mut viewer = mounted(ViewerConfig::default(), t0);
        viewer.handle_load_event(LoadEvent::Error(AssetLoadError::new("m1", "404")), t0);

        for i in 0..10 {
            viewer.tick(t0 + Duration::from_millis(200 * i));
        }
        assert!(viewer.engine().attached.is_empty());
        let overlay = viewer.engine().overlays.last().expect("overlay published");
        assert_eq!(overlay.presentation, OverlayPresentation::SoftFail);
        assert!(matches!(viewer.load_state().outcome(), Some(LoadOutcome::Failed(_))));
    }

    #[test]
    fn refused_load_request_is_absorbed_as_failure() {
        let mut viewer = viewer(ViewerConfig::default());
        let mut loader = RecordingLoader {
            refuse: true,
            ..RecordingLoader::default()
        };
        viewer
            .mount(1200.0, 900.0, None, &mut loader, Instant::now())
            .expect("loader refusal is not a mount error");
        assert!(matches!(viewer.load_state().outcome(), Some(LoadOutcome::Failed(_))));
    }

    #[test]
    fn treat_as_success_hides_overlay_with_nothing_attached() {
        let t0 = Instant::now();
        let config = ViewerConfig {
            treat_failure_as_success: true,
            ..ViewerConfig::default()
        };
        let mut viewer = mounted(config, t0);
        viewer.handle_load_event(LoadEvent::Error(AssetLoadError::new("m1", "404")), t0);
        let report = viewer.tick(t0 + Duration::from_millis(500));

        assert!(viewer.engine().attached.is_empty());
        assert!(!report.rotated);
        let overlay = viewer.engine().overlays.last().expect("overlay published");
        assert_eq!(overlay.presentation, OverlayPresentation::Hidden);
    }

    #[test]
    fn resize_pushes_new_layout_and_surface() {
        let t0 = Instant::now();
        let mut viewer = mounted(ViewerConfig::default(), t0);
        viewer.on_resize(1920.0, 1080.0);

        let layout = viewer.engine().applied_layouts.last().expect("layout applied");
        assert_eq!(layout.branch, LayoutBranch::Wide);
        assert_eq!(layout.field_of_view, 60.0);
        assert_eq!(
            viewer.engine().surface_sizes.last(),
            Some(&SurfaceSize { width: 1920, height: 1286 })
        );

        let overlays_before = viewer.engine().overlays.len();
        viewer.tick(t0);
        assert_eq!(viewer.engine().overlays.len(), overlays_before + 1);
    }

    #[test]
    fn overlay_progress_is_published_on_next_tick_only() {
        let t0 = Instant::now();
        let mut viewer = mounted(ViewerConfig::default(), t0);
        viewer.tick(t0);
        let published = viewer.engine().overlays.len();

        viewer.handle_load_event(LoadEvent::Progress { loaded: 1, total: 4 }, t0);
        viewer.handle_load_event(LoadEvent::Progress { loaded: 2, total: 4 }, t0);
        assert_eq!(viewer.engine().overlays.len(), published);

        viewer.tick(t0);
        assert_eq!(viewer.engine().overlays.len(), published + 1);
        assert_eq!(viewer.engine().overlays.last().unwrap().percent_label, "50 %");
    }

    #[test]
    fn unmount_stops_loop_detaches_resize_and_guards_late_callbacks() {
        let t0 = Instant::now();
        let mut viewer = mounted(ViewerConfig::default(), t0);
        viewer.unmount();
        viewer.unmount();

        assert_eq!(viewer.phase(), LifecyclePhase::TornDown);
        assert!(!viewer.host().frame_loop_registered);
        assert!(!viewer.host().resize_listener);
        assert_eq!(viewer.host().cancellations, 1);

        viewer.handle_load_event(LoadEvent::Complete(FakeModel::named("late")), t0);
        viewer.on_resize(1920.0, 1080.0);
        assert!(viewer.engine().applied_layouts.is_empty());
        assert_eq!(viewer.tick(t0 + Duration::from_secs(5)), FrameReport::default());
        assert!(viewer.engine().attached.is_empty());
        assert_eq!(viewer.engine().draws, 0);
        assert_eq!(viewer.next_deadline(), None);
    }
}
