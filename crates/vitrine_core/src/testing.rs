//! Recording fakes for the engine, host and loader seams.

use crate::engine::{AssetLoader, FrameScheduler, HostBindings, RenderEngine};
use crate::error::{AssetLoadError, ViewerError, ViewerResult};
use crate::layout::{LayoutConfig, SurfaceSize};
use crate::load::OverlayView;

#[derive(Debug, Clone, PartialEq)]
pub struct FakeModel {
    pub name: &'static str,
    pub rotation_y: f32,
}

impl FakeModel {
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            rotation_y: 0.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub fail_build: bool,
    pub built_with: Option<(LayoutConfig, SurfaceSize)>,
    pub applied_layouts: Vec<LayoutConfig>,
    pub surface_sizes: Vec<SurfaceSize>,
    pub attached: Vec<FakeModel>,
    pub overlays: Vec<OverlayView>,
    pub draws: u32,
}

impl RecordingEngine {
    pub fn attach_model_for_test(&mut self, rotation_y: f32) {
        self.attached.push(FakeModel {
            name: "test",
            rotation_y,
        });
    }

    pub fn rotation(&self) -> Option<f32> {
        self.attached.last().map(|m| m.rotation_y)
    }
}

impl RenderEngine for RecordingEngine {
    type Model = FakeModel;

    fn build_scene(&mut self, layout: &LayoutConfig, surface: SurfaceSize) -> ViewerResult<()> {
        if self.fail_build {
            return Err(ViewerError::Engine("no adapter".to_string()));
        }
        self.built_with = Some((*layout, surface));
        Ok(())
    }

    fn apply_layout(&mut self, layout: &LayoutConfig) {
        self.applied_layouts.push(*layout);
    }

    fn resize_surface(&mut self, surface: SurfaceSize) {
        self.surface_sizes.push(surface);
    }

    fn attach_model(&mut self, model: FakeModel) {
        self.attached.push(model);
    }

    fn model_rotation_mut(&mut self) -> Option<&mut f32> {
        self.attached.last_mut().map(|m| &mut m.rotation_y)
    }

    fn publish_overlay(&mut self, view: &OverlayView, _layout: &LayoutConfig) {
        self.overlays.push(view.clone());
    }

    fn draw(&mut self) {
        self.draws += 1;
    }
}

#[derive(Debug, Default)]
pub struct RecordingHost {
    pub frame_loop_registered: bool,
    pub registrations: u32,
    pub cancellations: u32,
    pub frame_requests: u32,
    pub interaction_listeners: bool,
    pub resize_listener: bool,
}

impl FrameScheduler for RecordingHost {
    fn register_frame_loop(&mut self) {
        self.frame_loop_registered = true;
        self.registrations += 1;
    }

    fn cancel_frame_loop(&mut self) {
        self.frame_loop_registered = false;
        self.cancellations += 1;
    }

    fn request_frame(&mut self) {
        self.frame_requests += 1;
    }
}

impl HostBindings for RecordingHost {
    fn attach_interaction_listeners(&mut self) {
        self.interaction_listeners = true;
    }

    fn attach_resize_listener(&mut self) {
        self.resize_listener = true;
    }

    fn detach_resize_listener(&mut self) {
        self.resize_listener = false;
    }
}

#[derive(Debug, Default)]
pub struct RecordingLoader {
    pub requested: Vec<String>,
    pub refuse: bool,
}

impl AssetLoader for RecordingLoader {
    fn load(&mut self, source_id: &str) -> Result<(), AssetLoadError> {
        self.requested.push(source_id.to_string());
        if self.refuse {
            return Err(AssetLoadError::new(source_id, "loader unavailable"));
        }
        Ok(())
    }
}
