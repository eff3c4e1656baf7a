//! Viewer lifecycle core: layout resolution, asset load tracking, interaction
//! gating and render-loop control. Free of GPU and windowing dependencies;
//! the rendering engine and host are reached through the traits in [`engine`].

pub mod config;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod layout;
pub mod lifecycle;
pub mod load;
pub mod render_loop;
pub mod source;
#[cfg(test)]
mod testing;

pub use config::{CameraSettings, ControlSettings, ViewerConfig};
pub use engine::{AssetLoader, FrameScheduler, HostBindings, LoadEvent, RenderEngine};
pub use error::{AssetLoadError, ConfigError, ViewerError, ViewerResult};
pub use interaction::{InteractionGate, InteractionSignal, InteractionState};
pub use layout::{LayoutBranch, LayoutConfig, LayoutPolicy, SurfaceSize};
pub use lifecycle::{LifecyclePhase, ViewerContext, ViewerLifecycle};
pub use load::{AssetLoadState, LoadOutcome, LoadProgress, OverlayPresentation, OverlayView};
pub use render_loop::{LoopState, RenderLoopController, RenderMode};
