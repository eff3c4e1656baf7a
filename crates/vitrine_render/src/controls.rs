//! Orbit-style controls: drag rotates the camera around a fixed target.
//!
//! Distance is clamped to `[min_distance, max_distance]` on every update.
//! Two-finger touch gestures are ignored unless enabled.

use glam::Vec3;
use vitrine_core::ControlSettings;

use crate::camera::PerspectiveCamera;

/// Radians of orbit per logical pixel of drag.
const ROTATE_SPEED: f32 = 0.005;
const POLAR_EPSILON: f32 = 1e-3;
const MOVE_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    pub two_finger_gesture: bool,
    drag_origin: Option<(f64, f64)>,
    active_touches: u32,
}

impl OrbitControls {
    pub fn new(settings: &ControlSettings, target: Vec3) -> Self {
        Self {
            target,
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            two_finger_gesture: settings.two_finger_gesture,
            drag_origin: None,
            active_touches: 0,
        }
    }

    /// Re-aim the camera at the target and enforce the distance limits.
    /// Returns true when the camera moved.
    pub fn update(&self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let distance = offset.length();
        let clamped = distance.clamp(self.min_distance, self.max_distance);
        let direction = if distance > f32::EPSILON {
            offset / distance
        } else {
            Vec3::Z
        };

        let position = self.target + direction * clamped;
        let moved =
            position.distance(camera.position) > MOVE_EPSILON || camera.target != self.target;
        camera.position = position;
        camera.target = self.target;
        moved
    }

    pub fn touch_started(&mut self) {
        self.active_touches += 1;
    }

    pub fn touch_ended(&mut self) {
        self.active_touches = self.active_touches.saturating_sub(1);
        if self.active_touches == 0 {
            self.drag_origin = None;
        }
    }

    fn gesture_allowed(&self) -> bool {
        self.active_touches <= 1 || self.two_finger_gesture
    }

    pub fn begin_drag(&mut self, position: (f64, f64)) {
        self.drag_origin = Some(position);
    }

    pub fn end_drag(&mut self) {
        self.drag_origin = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    /// Orbit by the pointer delta since the last call. Returns true when the
    /// camera moved, i.e. when a "change" should be signalled.
    pub fn drag_to(&mut self, position: (f64, f64), camera: &mut PerspectiveCamera) -> bool {
        let Some(origin) = self.drag_origin else {
            return false;
        };
        self.drag_origin = Some(position);
        if !self.gesture_allowed() {
            return false;
        }

        let dx = (position.0 - origin.0) as f32;
        let dy = (position.1 - origin.1) as f32;
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        self.rotate(camera, -dx * ROTATE_SPEED, -dy * ROTATE_SPEED)
    }

    /// Rotate by azimuth/polar deltas in radians, keeping the polar angle
    /// away from the poles.
    pub fn rotate(&self, camera: &mut PerspectiveCamera, azimuth: f32, polar: f32) -> bool {
        let offset = camera.position - self.target;
        let radius = offset.length().max(f32::EPSILON);
        let theta = offset.x.atan2(offset.z) + azimuth;
        let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() + polar)
            .clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);

        let rotated = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = self.target + rotated;
        self.update(camera);
        true
    }
}
