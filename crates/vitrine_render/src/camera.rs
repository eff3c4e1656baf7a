use glam::{Mat4, Vec3};
use vitrine_core::{CameraSettings, LayoutConfig};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// xyz: camera position, w unused.
    pub eye: [f32; 4],
    /// x: tone-mapping exposure, yzw unused.
    pub params: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl PerspectiveCamera {
    pub fn new(settings: &CameraSettings, layout: &LayoutConfig) -> Self {
        Self {
            fov: layout.field_of_view,
            aspect: settings.aspect,
            near: settings.near,
            far: settings.far,
            position: layout.camera_position,
            target: layout.target_position,
        }
    }

    pub fn apply_layout(&mut self, layout: &LayoutConfig) {
        self.fov = layout.field_of_view;
        self.position = layout.camera_position;
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn build_uniform(&self, model: Mat4, exposure: f32) -> SceneUniform {
        SceneUniform {
            view_proj: (self.projection() * self.view()).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            eye: self.position.extend(1.0).to_array(),
            params: [exposure, 0.0, 0.0, 0.0],
        }
    }
}
