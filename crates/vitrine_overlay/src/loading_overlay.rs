//! Loading overlay painted with egui on top of the scene.
//!
//! Independently toggled layers: a translucent blur layer over the whole
//! surface, the progress indicator (bar track and fill, horizontal scale =
//! load fraction) and the percent label below it. The block is placed
//! vertically at the layout's progress-bar offset. A soft fail swaps the blur
//! for a faint flat backdrop and keeps only the label.
//!
//! Same three-phase split as any egui-on-wgpu integration: `prepare()` runs
//! the UI and tessellates, `upload()` pushes textures and buffers through the
//! encoder, `paint()` renders into a pass created with `forget_lifetime()`,
//! and `cleanup()` frees textures egui dropped.

use vitrine_core::{LayoutConfig, OverlayPresentation, OverlayView};
use winit::window::Window;

pub const BAR_WIDTH: f32 = 240.0;
pub const BAR_HEIGHT: f32 = 6.0;
const BLUR_TINT: egui::Color32 = egui::Color32::from_rgba_premultiplied(20, 20, 24, 150);
const BAR_TRACK: egui::Color32 = egui::Color32::from_rgba_premultiplied(60, 60, 60, 160);
const BAR_FILL: egui::Color32 = egui::Color32::WHITE;
const SOFT_FAIL_BACKDROP: egui::Color32 = egui::Color32::from_rgba_premultiplied(12, 12, 14, 60);
const SOFT_FAIL_TEXT: egui::Color32 = egui::Color32::from_rgba_premultiplied(180, 180, 180, 200);
const LABEL_GAP: f32 = 8.0;

/// What one overlay state paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLayers {
    pub backdrop: Option<egui::Color32>,
    pub indicator: bool,
    pub label: Option<egui::Color32>,
}

impl OverlayLayers {
    pub const NONE: Self = Self {
        backdrop: None,
        indicator: false,
        label: None,
    };

    pub fn for_view(view: &OverlayView) -> Self {
        match view.presentation {
            OverlayPresentation::Hidden => Self::NONE,
            OverlayPresentation::Loading => Self {
                backdrop: view.blur_visible.then_some(BLUR_TINT),
                indicator: view.indicator_visible,
                label: view.label_visible.then_some(BAR_FILL),
            },
            OverlayPresentation::SoftFail => Self {
                backdrop: Some(if view.blur_visible {
                    BLUR_TINT
                } else {
                    SOFT_FAIL_BACKDROP
                }),
                indicator: view.indicator_visible,
                label: view.label_visible.then_some(SOFT_FAIL_TEXT),
            },
        }
    }

    pub fn paints_anything(&self) -> bool {
        *self != Self::NONE
    }
}

/// Geometry of the progress block for one surface width and state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorGeometry {
    pub left: f32,
    pub top: f32,
    pub fill_width: f32,
}

impl IndicatorGeometry {
    pub fn compute(surface_width: f32, view: &OverlayView, layout: &LayoutConfig) -> Self {
        Self {
            left: ((surface_width - BAR_WIDTH) / 2.0).max(0.0),
            top: layout.progress_bar_offset.max(0.0),
            fill_width: BAR_WIDTH * view.fraction.clamp(0.0, 1.0),
        }
    }
}

pub struct LoadingOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    view: OverlayView,
    layout: Option<LayoutConfig>,
}

impl LoadingOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            view: OverlayView::loading(0.0),
            layout: None,
        }
    }

    pub fn handle_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) {
        let _ = self.egui_winit_state.on_window_event(window, event);
    }

    pub fn set_view(&mut self, view: &OverlayView, layout: &LayoutConfig) {
        if view.presentation != self.view.presentation {
            log::debug!("Overlay: {:?}", view.presentation);
        }
        self.view = view.clone();
        self.layout = Some(*layout);
    }

    pub fn prepare(&mut self, window: &Window) -> (Vec<egui::ClippedPrimitive>, egui::TexturesDelta) {
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let view = &self.view;
        let layout = self.layout;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            let layers = OverlayLayers::for_view(view);
            if !layers.paints_anything() {
                return;
            }
            let screen = ctx.screen_rect();

            if let Some(tint) = layers.backdrop {
                ctx.layer_painter(egui::LayerId::new(
                    egui::Order::Background,
                    egui::Id::new("overlay_backdrop"),
                ))
                .rect_filled(screen, 0.0, tint);
            }

            let Some(layout) = layout else {
                return;
            };
            let geometry = IndicatorGeometry::compute(screen.width(), view, &layout);
            let painter = ctx.layer_painter(egui::LayerId::new(
                egui::Order::Foreground,
                egui::Id::new("overlay_indicator"),
            ));
            let track = egui::Rect::from_min_size(
                egui::pos2(geometry.left, geometry.top),
                egui::vec2(BAR_WIDTH, BAR_HEIGHT),
            );
            if layers.indicator {
                painter.rect_filled(track, 3.0, BAR_TRACK);
                painter.rect_filled(
                    egui::Rect::from_min_size(track.min, egui::vec2(geometry.fill_width, BAR_HEIGHT)),
                    3.0,
                    BAR_FILL,
                );
            }
            if let Some(color) = layers.label {
                painter.text(
                    egui::pos2(track.center().x, track.max.y + LABEL_GAP),
                    egui::Align2::CENTER_TOP,
                    &view.percent_label,
                    egui::FontId::proportional(16.0),
                    color,
                );
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta)
    }

    /// Upload textures and update buffers. Call before creating the overlay render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
