//! Demo application: one raster image inside the mask-painting viewport.
//!
//! The toolbar mirrors the owning-collaborator surface the widget exposes:
//! fit / zoom steps / zoom readout, the paint-mode toggle with a brush-size
//! slider, and the imperative clear/export pair.

use eframe::egui;
use image::{Rgba, RgbaImage};

use crate::engine::{ViewportConfig, ViewportEvent};
use crate::viewport::ViewportWidget;

pub struct MaskviewApp {
    viewport: ViewportWidget,
    content: RgbaImage,
    content_tex: Option<egui::TextureHandle>,
    mask_mode: bool,
    brush_diameter: f32,
    has_mask: bool,
    status: String,
}

impl MaskviewApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, content: RgbaImage, config: ViewportConfig) -> Self {
        let brush_diameter = config.brush_diameter;
        Self {
            viewport: ViewportWidget::new(config),
            content,
            content_tex: None,
            mask_mode: false,
            brush_diameter,
            has_mask: false,
            status: String::new(),
        }
    }

    /// Upload the content raster once; the viewport only borrows the handle.
    fn ensure_content_texture(&mut self, ctx: &egui::Context) {
        if self.content_tex.is_some() {
            return;
        }
        let size = [self.content.width() as usize, self.content.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, self.content.as_raw());
        self.content_tex = Some(ctx.load_texture(
            "viewport-content",
            color_image,
            egui::TextureOptions::default(),
        ));
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Fit").on_hover_text("Fit to view (0)").clicked() {
                self.viewport.engine_mut().fit_to_container();
            }
            if ui.button("−").on_hover_text("Zoom out (-)").clicked() {
                self.viewport.engine_mut().zoom_out();
            }
            let percent = (self.viewport.engine().transform().scale * 100.0).round();
            ui.label(format!("{}%", percent));
            if ui.button("+").on_hover_text("Zoom in (+)").clicked() {
                self.viewport.engine_mut().zoom_in();
            }

            ui.separator();

            ui.checkbox(&mut self.mask_mode, "Paint mask");
            ui.add_enabled(
                self.mask_mode,
                egui::Slider::new(&mut self.brush_diameter, 5.0..=100.0)
                    .text("Brush")
                    .suffix("px"),
            );
            if ui
                .add_enabled(self.has_mask, egui::Button::new("Clear"))
                .clicked()
            {
                self.viewport.engine_mut().clear_mask();
            }
            if ui
                .add_enabled(self.has_mask, egui::Button::new("Export"))
                .clicked()
            {
                match self.viewport.engine().mask_base64() {
                    Some(encoded) => {
                        crate::log_info!("Exported mask ({} base64 bytes)", encoded.len());
                        self.status = format!("Exported mask: {} base64 bytes", encoded.len());
                    }
                    None => self.status = "Mask is empty".to_string(),
                }
            }

            if !self.status.is_empty() {
                ui.separator();
                ui.label(&self.status);
            }
        });
    }
}

impl eframe::App for MaskviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_content_texture(ctx);

        // View shortcuts: + / - / 0
        let (zoom_in, zoom_out, fit) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::PlusEquals),
                i.key_pressed(egui::Key::Minus),
                i.key_pressed(egui::Key::Num0),
            )
        });
        if zoom_in {
            self.viewport.engine_mut().zoom_in();
        }
        if zoom_out {
            self.viewport.engine_mut().zoom_out();
        }
        if fit {
            self.viewport.engine_mut().fit_to_container();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar(ui);
        });

        // Owner-driven toggles are pushed down every frame; the engine turns
        // the false->true edge into the mask-clear-on-entry behavior itself.
        self.viewport.engine_mut().set_mask_mode(self.mask_mode);
        self.viewport
            .engine_mut()
            .set_brush_diameter(self.brush_diameter);

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let output = self.viewport.show(ui, self.content_tex.as_ref());
                for event in output.events {
                    match event {
                        ViewportEvent::MaskChanged(has_mask) => {
                            self.has_mask = has_mask;
                            if !has_mask {
                                self.status.clear();
                            }
                        }
                        // The demo runs the engine uncontrolled.
                        ViewportEvent::TransformRequested(_) => {}
                    }
                }
            });
    }
}

/// Placeholder content when no image path is given: a checkerboard test
/// card with an accent border, big enough to exercise pan clamping.
pub fn test_card(width: u32, height: u32) -> RgbaImage {
    const CELL: u32 = 64;
    let mut img = RgbaImage::new(width, height);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let border = x < 4 || y < 4 || x >= width - 4 || y >= height - 4;
        let dark = ((x / CELL) + (y / CELL)) % 2 == 0;
        *px = if border {
            Rgba([255, 87, 34, 255])
        } else if dark {
            Rgba([90, 90, 96, 255])
        } else {
            Rgba([140, 140, 150, 255])
        };
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_has_border_and_checker() {
        let img = test_card(256, 256);
        assert_eq!(img.get_pixel(0, 0).0, [255, 87, 34, 255]);
        let a = img.get_pixel(32, 32).0;
        let b = img.get_pixel(96, 32).0;
        assert_ne!(a, b);
    }
}
