//! Vitrine -- native embedded 3D asset viewer.
//!
//! winit drives the event loop via `ApplicationHandler`. The window hosts a
//! single [`ViewerLifecycle`]: `resumed` mounts it, loader callbacks arrive as
//! [`ViewerEvent`] user events, input is routed to the interaction gate and
//! the orbit controls, and every `RedrawRequested` runs one lifecycle tick.
//!
//! The control flow mirrors the frame scheduler: `Poll` while the frame loop
//! is registered, otherwise `WaitUntil` the next reveal deadline or `Wait`.

mod engine;
mod host;
mod loader;
mod touch;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

use vitrine_core::config::load_config_or_default;
use vitrine_core::source::version_from_query;
use vitrine_core::{InteractionSignal, LoadEvent, ViewerConfig, ViewerLifecycle};
use vitrine_platform::window::{create_window, PlatformConfig};

use engine::WgpuEngine;
use host::WinitHost;
use loader::{GltfLoader, LoadedModel};
use touch::{TouchAction, TouchTracker};

const DEFAULT_CONFIG_PATH: &str = "assets/viewer.json";
const DEFAULT_ASSET_ROOT: &str = "assets";

/// Messages delivered to the UI thread through the event-loop proxy.
#[derive(Debug)]
pub enum ViewerEvent {
    Load(LoadEvent<LoadedModel>),
}

struct ViewerState {
    window: Arc<Window>,
    viewer: ViewerLifecycle<WgpuEngine, WinitHost>,
    cursor: PhysicalPosition<f64>,
    touches: TouchTracker,
}

impl ViewerState {
    fn logical_viewport(&self) -> (f32, f32) {
        let size = self
            .window
            .inner_size()
            .to_logical::<f32>(self.window.scale_factor());
        (size.width, size.height)
    }

    fn begin_interaction(&mut self, position: PhysicalPosition<f64>) {
        self.viewer.engine_mut().begin_drag((position.x, position.y));
        self.viewer.on_interaction(InteractionSignal::Start);
    }

    fn continue_interaction(&mut self, position: PhysicalPosition<f64>) {
        if !self.viewer.engine().is_dragging() {
            return;
        }
        self.viewer.on_interaction(InteractionSignal::Move);
        if self.viewer.engine_mut().drag_to((position.x, position.y)) {
            self.viewer.on_controls_change();
        }
    }

    fn end_interaction(&mut self) {
        self.viewer.engine_mut().end_drag();
        self.viewer.on_interaction(InteractionSignal::End);
    }

    fn route_touch(&mut self, phase: TouchPhase, id: u64, position: PhysicalPosition<f64>) {
        let action = match phase {
            TouchPhase::Started => self.touches.started(id),
            TouchPhase::Moved => self.touches.moved(id),
            TouchPhase::Ended | TouchPhase::Cancelled => self.touches.ended(id),
        };
        if action == TouchAction::Ignore {
            return;
        }

        let position = (position.x, position.y);
        let engine = self.viewer.engine_mut();
        match phase {
            TouchPhase::Started => engine.touch_started(),
            TouchPhase::Ended | TouchPhase::Cancelled => engine.touch_ended(),
            TouchPhase::Moved => {}
        }
        match action {
            TouchAction::Begin | TouchAction::Adopt => engine.begin_drag(position),
            TouchAction::Release | TouchAction::Finish => engine.end_drag(),
            TouchAction::Drag | TouchAction::Hold | TouchAction::Ignore => {}
        }

        if let Some(signal) = action.signal() {
            self.viewer.on_interaction(signal);
        }
        if action == TouchAction::Drag && self.viewer.engine_mut().drag_to(position) {
            self.viewer.on_controls_change();
        }
    }
}

struct App {
    config: ViewerConfig,
    platform: PlatformConfig,
    requested_version: Option<String>,
    asset_root: PathBuf,
    proxy: EventLoopProxy<ViewerEvent>,
    state: Option<ViewerState>,
}

impl App {
    fn new(
        config: ViewerConfig,
        requested_version: Option<String>,
        asset_root: PathBuf,
        proxy: EventLoopProxy<ViewerEvent>,
    ) -> Self {
        let platform = PlatformConfig {
            surface_aspect: config.layout.surface_aspect,
            ..PlatformConfig::default()
        };
        Self {
            config,
            platform,
            requested_version,
            asset_root,
            proxy,
            state: None,
        }
    }

    fn mount(&mut self, event_loop: &ActiveEventLoop) -> Result<ViewerState, String> {
        let window = create_window(event_loop, &self.platform)
            .map_err(|e| format!("Failed to create window: {e}"))?;
        let engine = WgpuEngine::new(window.clone(), &self.config)
            .map_err(|e| format!("Failed to initialise renderer: {e}"))?;
        let host = WinitHost::new(window.clone());

        let mut state = ViewerState {
            window,
            viewer: ViewerLifecycle::new(self.config.clone(), engine, host),
            cursor: PhysicalPosition::new(0.0, 0.0),
            touches: TouchTracker::default(),
        };

        let (width, height) = state.logical_viewport();
        let mut loader = GltfLoader::new(self.asset_root.clone(), self.proxy.clone());
        state
            .viewer
            .mount(
                width,
                height,
                self.requested_version.as_deref(),
                &mut loader,
                Instant::now(),
            )
            .map_err(|e| format!("Failed to mount viewer: {e}"))?;
        Ok(state)
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match self.mount(event_loop) {
            Ok(state) => self.state = Some(state),
            Err(e) => {
                log::error!("{e}");
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        let Some(state) = self.state.as_mut() else {
            log::debug!("Dropping viewer event received before mount");
            return;
        };
        match event {
            ViewerEvent::Load(load_event) => {
                state.viewer.handle_load_event(load_event, Instant::now());
                state.window.request_redraw();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        state.viewer.engine_mut().handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                state.viewer.unmount();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.viewer.engine_mut().resize_gpu(size.width, size.height);
                if state.viewer.host().listens_for_resize() {
                    let (width, height) = state.logical_viewport();
                    state.viewer.on_resize(width, height);
                }
                state.window.request_redraw();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                state.viewer.engine_mut().set_scale_factor(scale_factor);
            }
            WindowEvent::Touch(touch) if state.viewer.host().listens_for_interaction() => {
                state.route_touch(touch.phase, touch.id, touch.location);
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } if state.viewer.host().listens_for_interaction() => match button_state {
                ElementState::Pressed => {
                    let cursor = state.cursor;
                    state.begin_interaction(cursor);
                }
                ElementState::Released => state.end_interaction(),
            },
            WindowEvent::CursorMoved { position, .. } => {
                state.cursor = position;
                if state.viewer.host().listens_for_interaction() {
                    state.continue_interaction(position);
                }
            }
            WindowEvent::RedrawRequested => {
                state.viewer.tick(Instant::now());
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let now = Instant::now();
        state.viewer.poll(now);

        if state.viewer.host().frame_loop_registered() {
            state.window.request_redraw();
            event_loop.set_control_flow(ControlFlow::Poll);
        } else if let Some(deadline) = state.viewer.next_deadline() {
            event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut state) = self.state.take() {
            state.viewer.unmount();
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Vitrine viewer starting...");

    let config_path = std::env::var("VITRINE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let asset_root = std::env::var("VITRINE_ASSET_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_ASSET_ROOT));
    let config = load_config_or_default(&config_path);
    let requested_version = std::env::args().nth(1).and_then(|arg| version_from_query(&arg));

    let event_loop = match EventLoop::<ViewerEvent>::with_user_event().build() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {e}");
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, requested_version, asset_root, event_loop.create_proxy());
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {e}");
    }
}
