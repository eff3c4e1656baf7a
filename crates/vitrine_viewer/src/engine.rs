//! wgpu-backed rendering engine adapter.
//!
//! Owns the GPU context, perspective camera, orbit controls, room
//! environment, the attached model and the loading overlay. Each draw clears
//! the transparent surface, draws the model's bounding proxy with the current
//! pose and rotation, then composites the overlay on top.

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::dpi::LogicalSize;
use winit::window::Window;

use vitrine_core::{
    CameraSettings, ControlSettings, LayoutConfig, OverlayView, RenderEngine, SurfaceSize,
    ViewerConfig, ViewerError, ViewerResult,
};
use vitrine_overlay::LoadingOverlay;
use vitrine_render::{
    GpuContext, OrbitControls, PerspectiveCamera, ProxyPipeline, RoomEnvironment, SceneUniform,
};

use crate::loader::LoadedModel;

pub struct WgpuEngine {
    window: Arc<Window>,
    gpu: GpuContext,
    overlay: LoadingOverlay,
    camera_settings: CameraSettings,
    control_settings: ControlSettings,
    exposure: f32,
    camera: Option<PerspectiveCamera>,
    controls: Option<OrbitControls>,
    model: Option<LoadedModel>,
    scene_buffer: wgpu::Buffer,
    proxy: ProxyPipeline,
    proxy_bind_group: wgpu::BindGroup,
    // Sampled through `proxy_bind_group`.
    _environment: RoomEnvironment,
}

impl WgpuEngine {
    pub fn new(window: Arc<Window>, config: &ViewerConfig) -> ViewerResult<Self> {
        let gpu =
            GpuContext::new(window.clone()).map_err(|e| ViewerError::Engine(e.to_string()))?;
        let overlay = LoadingOverlay::new(&gpu.device, gpu.surface_format, &window);
        let scene_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Scene Uniform Buffer"),
                contents: bytemuck::cast_slice(&[<SceneUniform as bytemuck::Zeroable>::zeroed()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let environment = RoomEnvironment::build(&gpu.device, &gpu.queue);
        let proxy = ProxyPipeline::new(&gpu.device, gpu.surface_format);
        let proxy_bind_group = proxy.create_bind_group(&gpu.device, &scene_buffer, &environment);

        Ok(Self {
            window,
            gpu,
            overlay,
            camera_settings: config.camera,
            control_settings: config.controls,
            exposure: config.tone_mapping_exposure,
            camera: None,
            controls: None,
            model: None,
            scene_buffer,
            proxy,
            proxy_bind_group,
            _environment: environment,
        })
    }

    pub fn handle_window_event(&mut self, event: &winit::event::WindowEvent) {
        self.overlay.handle_window_event(&self.window, event);
    }

    pub fn resize_gpu(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.gpu.set_scale_factor(scale_factor);
    }

    pub fn touch_started(&mut self) {
        if let Some(controls) = self.controls.as_mut() {
            controls.touch_started();
        }
    }

    pub fn touch_ended(&mut self) {
        if let Some(controls) = self.controls.as_mut() {
            controls.touch_ended();
        }
    }

    pub fn begin_drag(&mut self, position: (f64, f64)) {
        if let Some(controls) = self.controls.as_mut() {
            controls.begin_drag(position);
        }
    }

    pub fn end_drag(&mut self) {
        if let Some(controls) = self.controls.as_mut() {
            controls.end_drag();
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.controls.as_ref().is_some_and(OrbitControls::is_dragging)
    }

    /// Returns true when the camera moved.
    pub fn drag_to(&mut self, position: (f64, f64)) -> bool {
        match (self.controls.as_mut(), self.camera.as_mut()) {
            (Some(controls), Some(camera)) => controls.drag_to(position, camera),
            _ => false,
        }
    }
}

impl RenderEngine for WgpuEngine {
    type Model = LoadedModel;

    fn build_scene(&mut self, layout: &LayoutConfig, surface: SurfaceSize) -> ViewerResult<()> {
        let mut camera = PerspectiveCamera::new(&self.camera_settings, layout);
        let controls = OrbitControls::new(&self.control_settings, layout.target_position);
        controls.update(&mut camera);
        self.camera = Some(camera);
        self.controls = Some(controls);

        self.resize_surface(surface);
        log::info!(
            "Scene built: fov {} at {:?}, exposure {}",
            layout.field_of_view,
            layout.camera_position,
            self.exposure
        );
        Ok(())
    }

    fn apply_layout(&mut self, layout: &LayoutConfig) {
        if let (Some(camera), Some(controls)) = (self.camera.as_mut(), self.controls.as_mut()) {
            camera.apply_layout(layout);
            controls.target = layout.target_position;
            controls.update(camera);
        }
    }

    fn resize_surface(&mut self, surface: SurfaceSize) {
        if surface.is_empty() {
            return;
        }
        let current = self
            .window
            .inner_size()
            .to_logical::<f64>(self.gpu.scale_factor);
        let height_drift = (current.height - surface.height as f64).abs();
        let width_drift = (current.width - surface.width as f64).abs();
        if height_drift > 1.0 || width_drift > 1.0 {
            let _ = self
                .window
                .request_inner_size(LogicalSize::new(surface.width, surface.height));
        }
    }

    fn attach_model(&mut self, model: LoadedModel) {
        log::info!(
            "Attaching '{}' to scene ({} resources, {} bytes)",
            model.source_id,
            model.resource_count,
            model.byte_len
        );
        self.model = Some(model);
    }

    fn model_rotation_mut(&mut self) -> Option<&mut f32> {
        self.model.as_mut().map(|m| &mut m.rotation_y)
    }

    fn publish_overlay(&mut self, view: &OverlayView, layout: &LayoutConfig) {
        self.overlay.set_view(view, layout);
    }

    fn draw(&mut self) {
        if !self.gpu.has_area() {
            return;
        }
        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let draw_proxy = match (&self.camera, &self.model) {
            (Some(camera), Some(model)) => {
                let uniform = camera.build_uniform(model.proxy_transform(), self.exposure);
                self.gpu
                    .queue
                    .write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[uniform]));
                true
            }
            _ => false,
        };

        let (primitives, textures_delta) = self.overlay.prepare(&self.window);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.gpu.scale_factor as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Viewer Encoder"),
            });

        {
            let mut scene_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            if draw_proxy {
                self.proxy.draw(&mut scene_pass, &self.proxy_bind_group);
            }
        }

        self.overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &primitives,
            &textures_delta,
            &screen_descriptor,
        );

        {
            let mut overlay_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Overlay Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.overlay
                .paint(&mut overlay_pass, &primitives, &screen_descriptor);
        }

        self.overlay.cleanup(&textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}
