pub mod camera;
pub mod controls;
pub mod environment;
pub mod gpu_context;
pub mod proxy;

pub use camera::{PerspectiveCamera, SceneUniform};
pub use controls::OrbitControls;
pub use environment::RoomEnvironment;
pub use gpu_context::{GpuContext, GpuInitError};
pub use proxy::{ModelBounds, ProxyPipeline};
