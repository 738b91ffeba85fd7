//! Viewport surface: the egui widget that renders the reference grid, the
//! content raster and the mask overlay, and feeds raw input to the engine.

use std::time::Instant;

use eframe::egui;
use egui::{
    Color32, ColorImage, CursorIcon, Pos2, Rect, Sense, Stroke, TextureFilter, TextureHandle,
    TextureOptions, TouchPhase,
};

use crate::engine::{ViewportConfig, ViewportEngine, ViewportEvent};
use crate::geometry;
use crate::gesture::{GesturePhase, InputEvent};
use crate::mask::DEFAULT_OVERLAY_INTERVAL;
use crate::transform::TransformState;

/// Base period of the major reference grid at 100% zoom.
const MAJOR_GRID_BASE: f32 = 256.0;
/// Minor lines subdivide each major cell.
const MINOR_PER_MAJOR: f32 = 5.0;
/// Skip grid levels denser than this on-screen period.
const MIN_GRID_PERIOD: f32 = 4.0;
/// Display opacity applied to the mask overlay texture (0.6 of 255).
const OVERLAY_DISPLAY_ALPHA: u8 = 153;
/// Time constant in seconds for idle motion smoothing.
const SMOOTHING_TIME: f32 = 0.05;

/// Theme-aware colors for the background reference grid.
#[derive(Clone, Copy, Debug)]
pub struct GridTheme {
    pub background: Color32,
    pub major_line: Color32,
    pub minor_line: Color32,
}

impl GridTheme {
    pub fn for_dark_mode(dark: bool) -> Self {
        if dark {
            Self {
                background: Color32::from_rgb(23, 23, 23),
                major_line: Color32::from_rgb(64, 64, 64),
                minor_line: Color32::from_rgb(38, 38, 38),
            }
        } else {
            Self {
                background: Color32::from_rgb(245, 245, 245),
                major_line: Color32::from_rgb(212, 212, 212),
                minor_line: Color32::from_rgb(229, 229, 229),
            }
        }
    }
}

/// What one frame of the widget hands back to the host.
pub struct ViewportOutput {
    pub response: egui::Response,
    /// Engine events accumulated this frame, in emission order.
    pub events: Vec<ViewportEvent>,
}

/// Pan/zoom viewport with a mask-painting layer over one raster image.
///
/// The widget owns a [`ViewportEngine`] and is purely a surface over it:
/// every state transition happens in the engine, so hosts that need
/// fine-grained control (or tests) can drive the engine directly.
pub struct ViewportWidget {
    engine: ViewportEngine,
    overlay_tex: Option<TextureHandle>,
    overlay_uploaded: Option<Instant>,
    /// Smoothed transform actually used for rendering.
    displayed: Option<TransformState>,
}

impl ViewportWidget {
    pub fn new(config: ViewportConfig) -> Self {
        Self::from_engine(ViewportEngine::new(config))
    }

    pub fn from_engine(engine: ViewportEngine) -> Self {
        Self {
            engine,
            overlay_tex: None,
            overlay_uploaded: None,
            displayed: None,
        }
    }

    pub fn engine(&self) -> &ViewportEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ViewportEngine {
        &mut self.engine
    }

    /// Lay out the viewport in the remaining space and run one frame:
    /// measure, gather input, render grid + content + overlay.
    ///
    /// `content_texture` is the host-owned texture of the content raster; it
    /// is stretched over the content's current screen rect.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        content_texture: Option<&TextureHandle>,
    ) -> ViewportOutput {
        let available = ui.available_size();
        let sense = Sense::click_and_drag().union(Sense::hover());
        let (response, painter) = ui.allocate_painter(available, sense);
        let container = response.rect;

        self.engine.set_container_rect(container);
        self.gather_input(ui, container);
        self.update_cursor(ui, &response);

        let displayed = self.displayed_transform(ui);
        let theme = GridTheme::for_dark_mode(ui.visuals().dark_mode);

        painter.rect_filled(container, 0.0, theme.background);
        self.draw_grid(&painter, container, displayed, theme);

        let content_rect = geometry::content_rect(container, displayed, self.engine.content());
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        if let Some(texture) = content_texture {
            painter.image(texture.id(), content_rect, uv, Color32::WHITE);
        }

        if self.engine.mask_mode() {
            self.update_overlay_texture(ui.ctx());
            if let Some(tex) = &self.overlay_tex {
                painter.image(
                    tex.id(),
                    content_rect,
                    uv,
                    Color32::from_white_alpha(OVERLAY_DISPLAY_ALPHA),
                );
            }

            // Brush outline under the cursor, scaled with the zoom.
            if let Some(pos) = ui.input(|i| i.pointer.hover_pos())
                && container.contains(pos)
            {
                let radius = self.engine.brush_diameter() / 2.0 * displayed.scale;
                let contrast = if ui.visuals().dark_mode {
                    Color32::WHITE
                } else {
                    Color32::BLACK
                };
                painter.circle_stroke(pos, radius, Stroke::new(1.0, contrast));
            }

            // Keep the compositor ticking while paint mode is active, even
            // with no input arriving.
            ui.ctx().request_repaint_after(DEFAULT_OVERLAY_INTERVAL);
        }

        ViewportOutput {
            response,
            events: self.engine.take_events(),
        }
    }

    /// Translate this frame's egui events into engine input.
    fn gather_input(&mut self, ui: &egui::Ui, container: Rect) {
        let mut events: Vec<InputEvent> = Vec::new();

        ui.input_mut(|i| {
            for event in &i.events {
                match event {
                    egui::Event::PointerButton {
                        pos,
                        button: egui::PointerButton::Primary,
                        pressed,
                        ..
                    } => {
                        if *pressed {
                            if container.contains(*pos) {
                                events.push(InputEvent::PointerPressed { pos: *pos });
                            }
                        } else {
                            // Releases count wherever they land, so a drag
                            // that leaves the viewport still ends.
                            events.push(InputEvent::PointerReleased);
                        }
                    }
                    egui::Event::PointerMoved(pos) => {
                        events.push(InputEvent::PointerMoved { pos: *pos });
                    }
                    egui::Event::Touch { id, phase, pos, .. } => match phase {
                        TouchPhase::Start => {
                            if container.contains(*pos) {
                                events.push(InputEvent::TouchStarted { id: id.0, pos: *pos });
                            }
                        }
                        TouchPhase::Move => {
                            events.push(InputEvent::TouchMoved { id: id.0, pos: *pos });
                        }
                        TouchPhase::End | TouchPhase::Cancel => {
                            events.push(InputEvent::TouchEnded { id: id.0 });
                        }
                    },
                    _ => {}
                }
            }

            // Wheel zoom — only when the cursor is over the viewport.  The
            // delta is consumed so outer scroll areas don't also react.
            if i.scroll_delta.y.abs() > 0.1
                && let Some(pos) = i.pointer.hover_pos()
                && container.contains(pos)
            {
                events.push(InputEvent::Wheel {
                    pos,
                    delta: i.scroll_delta.y,
                });
                i.scroll_delta.y = 0.0;
            }

            // Safety net: a release that never reached us as an event (e.g.
            // outside the window) must not leave a gesture stuck.
            if self.engine.gesture_active() && !i.pointer.any_down() {
                events.push(InputEvent::PointerReleased);
            }
        });

        for event in events {
            self.engine.handle_event(event);
        }
    }

    fn update_cursor(&self, ui: &egui::Ui, response: &egui::Response) {
        if !response.hovered() {
            return;
        }
        let icon = if self.engine.mask_mode() {
            CursorIcon::Crosshair
        } else if matches!(self.engine.gesture_phase(), GesturePhase::Panning { .. }) {
            CursorIcon::Grabbing
        } else {
            CursorIcon::Grab
        };
        ui.ctx().output_mut(|o| o.cursor_icon = icon);
    }

    /// Transform used for rendering this frame.
    ///
    /// Idle, internally-owned changes (zoom buttons, fit) ease over a short
    /// time constant; anything interactive — drag, pinch, paint — and all
    /// controlled-mode updates snap, so visual feedback never lags input.
    fn displayed_transform(&mut self, ui: &egui::Ui) -> TransformState {
        let target = self.engine.transform();
        let snap = self.engine.gesture_active() || self.engine.is_controlled();

        let current = match (snap, self.displayed) {
            (false, Some(prev)) if prev != target => {
                let dt = ui.input(|i| i.stable_dt).min(0.1);
                let t = 1.0 - (-dt / SMOOTHING_TIME).exp();
                let eased = TransformState::new(
                    prev.scale + (target.scale - prev.scale) * t,
                    prev.translate_x + (target.translate_x - prev.translate_x) * t,
                    prev.translate_y + (target.translate_y - prev.translate_y) * t,
                );
                let settled = (eased.scale - target.scale).abs() < 1e-3
                    && (eased.translate_x - target.translate_x).abs() < 0.1
                    && (eased.translate_y - target.translate_y).abs() < 0.1;
                if settled {
                    target
                } else {
                    ui.ctx().request_repaint();
                    eased
                }
            }
            _ => target,
        };

        self.displayed = Some(current);
        current
    }

    /// Two-level reference grid whose period scales with the zoom and whose
    /// offset is anchored to the content's top-right corner, so it scrolls
    /// and zooms with the content instead of resetting.
    fn draw_grid(
        &self,
        painter: &egui::Painter,
        container: Rect,
        transform: TransformState,
        theme: GridTheme,
    ) {
        let major = MAJOR_GRID_BASE * transform.scale;
        let minor = major / MINOR_PER_MAJOR;

        let content_rect = geometry::content_rect(container, transform, self.engine.content());
        let anchor = Pos2::new(content_rect.max.x, content_rect.min.y);

        draw_grid_lines(painter, container, anchor, minor, theme.minor_line);
        draw_grid_lines(painter, container, anchor, major, theme.major_line);
    }

    /// Upload the overlay raster whenever the compositor produced a new one.
    fn update_overlay_texture(&mut self, ctx: &egui::Context) {
        self.engine.overlay_if_due(Instant::now());

        let composed_at = self.engine.mask().last_composited_at();
        if self.overlay_tex.is_some() && composed_at == self.overlay_uploaded {
            return;
        }

        let overlay = self.engine.mask().overlay();
        let size = [overlay.width() as usize, overlay.height() as usize];
        let color_image = ColorImage::from_rgba_unmultiplied(size, overlay.as_raw());
        let options = TextureOptions {
            magnification: TextureFilter::Nearest,
            minification: TextureFilter::Linear,
            ..Default::default()
        };

        match &mut self.overlay_tex {
            Some(tex) => tex.set(color_image, options),
            None => {
                self.overlay_tex = Some(ctx.load_texture("mask-overlay", color_image, options));
            }
        }
        self.overlay_uploaded = composed_at;
    }
}

fn draw_grid_lines(
    painter: &egui::Painter,
    container: Rect,
    anchor: Pos2,
    period: f32,
    color: Color32,
) {
    if period < MIN_GRID_PERIOD {
        return;
    }
    let stroke = Stroke::new(1.0, color);

    // First line at or just left of the container, on the anchor's lattice.
    let mut x = anchor.x - ((anchor.x - container.min.x) / period).floor() * period;
    while x <= container.max.x {
        painter.line_segment(
            [Pos2::new(x, container.min.y), Pos2::new(x, container.max.y)],
            stroke,
        );
        x += period;
    }

    let mut y = anchor.y - ((anchor.y - container.min.y) / period).floor() * period;
    while y <= container.max.y {
        painter.line_segment(
            [Pos2::new(container.min.x, y), Pos2::new(container.max.x, y)],
            stroke,
        );
        y += period;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widget_measures_container_and_fits_on_first_frame() {
        let ctx = egui::Context::default();
        let mut widget = ViewportWidget::new(ViewportConfig::new(1024, 1024));

        let _ = ctx.run(Default::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                widget.show(ui, None);
            });
        });

        assert!(widget.engine().container_rect().is_some());
        // Initial fit ran; it never upscales past 1:1.
        assert!(widget.engine().transform().scale <= 1.0);
        assert!(widget.engine().transform().scale > 0.0);
    }

    #[test]
    fn grid_theme_differs_between_modes() {
        let dark = GridTheme::for_dark_mode(true);
        let light = GridTheme::for_dark_mode(false);
        assert_ne!(dark.background, light.background);
    }
}
