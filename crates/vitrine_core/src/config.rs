//! Viewer configuration loaded from JSON.
//!
//! Every key is optional; omitted keys take the production defaults. The
//! per-deployment constants (framing, rotation speed, failure handling)
//! live here rather than in code so one build can serve several models.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::layout::LayoutPolicy;
use crate::load::{FailurePolicy, DEFAULT_SETTLE_DELAY};
use crate::render_loop::{RenderMode, DEFAULT_ROTATION_PER_FRAME};
use crate::source::SourceCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            aspect: 3.0 / 2.0,
            near: 0.25,
            far: 200.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Whether a two-finger touch drives the controls (dolly/pan).
    pub two_finger_gesture: bool,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            min_distance: 3.0,
            max_distance: 3.0,
            two_finger_gesture: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub layout: LayoutPolicy,
    pub sources: SourceCatalog,
    pub rotation_per_frame: f32,
    pub settle_delay_ms: u64,
    pub render_mode: RenderMode,
    pub treat_failure_as_success: bool,
    pub camera: CameraSettings,
    pub controls: ControlSettings,
    pub tone_mapping_exposure: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            layout: LayoutPolicy::default(),
            sources: SourceCatalog::default(),
            rotation_per_frame: DEFAULT_ROTATION_PER_FRAME,
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            render_mode: RenderMode::default(),
            treat_failure_as_success: false,
            camera: CameraSettings::default(),
            controls: ControlSettings::default(),
            tone_mapping_exposure: 1.0,
        }
    }
}

impl ViewerConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::from_flag(self.treat_failure_as_success)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(self.layout.breakpoint > 0.0) {
            return invalid(format!("breakpoint must be positive, got {}", self.layout.breakpoint));
        }
        if !(self.layout.surface_aspect > 0.0) {
            return invalid(format!(
                "surface_aspect must be positive, got {}",
                self.layout.surface_aspect
            ));
        }
        if !self.rotation_per_frame.is_finite() {
            return invalid("rotation_per_frame must be finite".to_string());
        }
        if self.controls.min_distance > self.controls.max_distance {
            return invalid(format!(
                "controls.min_distance {} exceeds max_distance {}",
                self.controls.min_distance, self.controls.max_distance
            ));
        }
        if !(self.camera.near > 0.0 && self.camera.near < self.camera.far) {
            return invalid(format!(
                "camera clip range {}..{} is empty",
                self.camera.near, self.camera.far
            ));
        }
        if !self.sources.versions.contains_key(&self.sources.default_version) {
            return invalid(format!(
                "default version '{}' is not in the source catalog",
                self.sources.default_version
            ));
        }
        Ok(())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<ViewerConfig, ConfigError> {
    let raw = fs::read_to_string(path)?;
    ViewerConfig::from_json(&raw)
}

/// Load `path`, falling back to defaults when it is missing or invalid.
pub fn load_config_or_default(path: &Path) -> ViewerConfig {
    if !path.exists() {
        log::info!("No viewer config at '{}', using defaults", path.display());
        return ViewerConfig::default();
    }
    match load_config_from_path(path) {
        Ok(config) => {
            log::info!("Loaded viewer config '{}'", path.display());
            config
        }
        Err(err) => {
            log::error!("Viewer config '{}' rejected: {err}. Using defaults.", path.display());
            ViewerConfig::default()
        }
    }
}
