//! Viewport-driven layout: camera framing and overlay placement.
//!
//! A single width breakpoint selects between a compact and a wide profile.
//! Resolution is pure; callers recompute on every init and resize.

use glam::Vec3;
use serde::Deserialize;

pub const DEFAULT_BREAKPOINT: f32 = 1600.0;
/// Drawing surface height as a fraction of viewport width.
pub const DEFAULT_SURFACE_ASPECT: f32 = 0.67;
/// Half the overlay progress block height, subtracted when centring on the surface.
pub const DEFAULT_PROGRESS_BAR_INSET: f32 = 50.0;

pub const COMPACT_FIELD_OF_VIEW: f32 = 38.0;
pub const COMPACT_CAMERA_POSITION: Vec3 = Vec3::new(-0.2, -0.6, 2.0);
pub const COMPACT_TARGET_POSITION: Vec3 = Vec3::ZERO;

pub const WIDE_FIELD_OF_VIEW: f32 = 60.0;
pub const WIDE_CAMERA_POSITION: Vec3 = Vec3::new(-0.2, 0.0, 2.0);
pub const WIDE_TARGET_POSITION: Vec3 = Vec3::new(0.0, -0.5, 0.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutBranch {
    Compact,
    Wide,
}

/// Camera framing for one side of the breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LayoutProfile {
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    pub camera_position: Vec3,
    pub target_position: Vec3,
}

impl LayoutProfile {
    pub const COMPACT: Self = Self {
        field_of_view: COMPACT_FIELD_OF_VIEW,
        camera_position: COMPACT_CAMERA_POSITION,
        target_position: COMPACT_TARGET_POSITION,
    };

    pub const WIDE: Self = Self {
        field_of_view: WIDE_FIELD_OF_VIEW,
        camera_position: WIDE_CAMERA_POSITION,
        target_position: WIDE_TARGET_POSITION,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutPolicy {
    pub breakpoint: f32,
    pub surface_aspect: f32,
    pub progress_bar_inset: f32,
    pub compact: LayoutProfile,
    pub wide: LayoutProfile,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            breakpoint: DEFAULT_BREAKPOINT,
            surface_aspect: DEFAULT_SURFACE_ASPECT,
            progress_bar_inset: DEFAULT_PROGRESS_BAR_INSET,
            compact: LayoutProfile::COMPACT,
            wide: LayoutProfile::WIDE,
        }
    }
}

/// Derived layout for one viewport size. Never partially updated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub branch: LayoutBranch,
    pub field_of_view: f32,
    pub camera_position: Vec3,
    pub target_position: Vec3,
    /// Vertical offset of the overlay progress block, in logical pixels.
    pub progress_bar_offset: f32,
}

impl LayoutConfig {
    /// Offset formatted the way the overlay markup expects it, e.g. `"352px"`.
    pub fn progress_bar_offset_css(&self) -> String {
        let rounded = (self.progress_bar_offset * 100.0).round() / 100.0;
        format!("{rounded}px")
    }
}

impl LayoutPolicy {
    pub fn branch_for(&self, viewport_width: f32) -> LayoutBranch {
        if viewport_width < self.breakpoint {
            LayoutBranch::Compact
        } else {
            LayoutBranch::Wide
        }
    }

    pub fn resolve(&self, viewport_width: f32, viewport_height: f32) -> LayoutConfig {
        let branch = self.branch_for(viewport_width);
        let (profile, progress_bar_offset) = match branch {
            LayoutBranch::Compact => (
                &self.compact,
                viewport_width * self.surface_aspect / 2.0 - self.progress_bar_inset,
            ),
            LayoutBranch::Wide => (&self.wide, viewport_height / 2.0),
        };

        LayoutConfig {
            branch,
            field_of_view: profile.field_of_view,
            camera_position: profile.camera_position,
            target_position: profile.target_position,
            progress_bar_offset,
        }
    }

    /// Drawing surface size that tracks the viewport width.
    pub fn surface_size(&self, viewport_width: f32) -> SurfaceSize {
        SurfaceSize::for_viewport(viewport_width, self.surface_aspect)
    }
}

/// Resolve with the built-in production constants.
pub fn resolve(viewport_width: f32, viewport_height: f32) -> LayoutConfig {
    LayoutPolicy::default().resolve(viewport_width, viewport_height)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn for_viewport(viewport_width: f32, aspect: f32) -> Self {
        let width = viewport_width.max(0.0);
        Self {
            width: width.round() as u32,
            height: (width * aspect).round() as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
