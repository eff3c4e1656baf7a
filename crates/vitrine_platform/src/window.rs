use std::sync::Arc;
use winit::error::OsError;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    /// Surface height as a fraction of width.
    pub surface_aspect: f32,
    pub transparent: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Vitrine".to_string(),
            width: 1280,
            surface_aspect: 0.67,
            transparent: true,
        }
    }
}

impl PlatformConfig {
    pub fn height(&self) -> u32 {
        (self.width as f32 * self.surface_aspect).round() as u32
    }
}

pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &PlatformConfig,
) -> Result<Arc<Window>, OsError> {
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_transparent(config.transparent)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height()));

    let window = event_loop.create_window(attrs)?;
    log::info!(
        "Window created: {}x{} (transparent: {})",
        config.width,
        config.height(),
        config.transparent
    );
    Ok(Arc::new(window))
}
