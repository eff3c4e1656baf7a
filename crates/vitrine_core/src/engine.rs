//! Seams to the rendering engine and the host environment.
//!
//! The core never touches GPU or window APIs. It drives these traits, and
//! the binary provides winit/wgpu implementations.

use crate::error::{AssetLoadError, ViewerResult};
use crate::layout::{LayoutConfig, SurfaceSize};
use crate::load::OverlayView;

/// Scene, camera, controls and draw submission.
pub trait RenderEngine {
    /// Loaded scene content handed over by the asset loader.
    type Model;

    /// Construct scene, camera, controls and environment for the first layout.
    fn build_scene(&mut self, layout: &LayoutConfig, surface: SurfaceSize) -> ViewerResult<()>;

    /// Push a new field of view, camera position and orbit target into the live objects.
    fn apply_layout(&mut self, layout: &LayoutConfig);

    fn resize_surface(&mut self, surface: SurfaceSize);

    fn attach_model(&mut self, model: Self::Model);

    /// Y-axis rotation of the attached model, `None` until one is attached.
    fn model_rotation_mut(&mut self) -> Option<&mut f32>;

    fn publish_overlay(&mut self, view: &OverlayView, layout: &LayoutConfig);

    fn draw(&mut self);
}

/// The host's animation scheduler.
pub trait FrameScheduler {
    /// Start delivering a tick every frame.
    fn register_frame_loop(&mut self);

    fn cancel_frame_loop(&mut self);

    /// Deliver exactly one more tick.
    fn request_frame(&mut self);
}

/// Scheduler plus the event listeners the lifecycle acquires at mount and
/// releases at unmount.
pub trait HostBindings: FrameScheduler {
    fn attach_interaction_listeners(&mut self);

    fn attach_resize_listener(&mut self);

    fn detach_resize_listener(&mut self);
}

/// Starts an asynchronous load. Results come back as [`LoadEvent`]s on the
/// UI thread.
pub trait AssetLoader {
    fn load(&mut self, source_id: &str) -> Result<(), AssetLoadError>;
}

#[derive(Debug)]
pub enum LoadEvent<M> {
    Progress { loaded: u32, total: u32 },
    Complete(M),
    Error(AssetLoadError),
}
