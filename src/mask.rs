//! Region-of-interest mask: coverage raster, brush stamping, overlay
//! compositing and export.
//!
//! The coverage raster is authoritative.  Stamps only ever raise coverage
//! and `clear` resets it; nothing else writes to it.  The display overlay is
//! a throwaway colorized copy rebuilt on a timer, so pointer-move frequency
//! never drives recompositing cost, and export always reads the coverage
//! raster directly instead of waiting on the timer.

use std::time::{Duration, Instant};

use base64::{Engine as _, engine::general_purpose};
use image::codecs::png::PngEncoder;
use image::{GrayImage, Luma, RgbaImage};
use rayon::prelude::*;

/// Highlight color for covered pixels in the display overlay (RGBA).
pub const OVERLAY_COLOR: [u8; 4] = [255, 87, 34, 180];

/// Default recomposite cadence for the display overlay.
pub const DEFAULT_OVERLAY_INTERVAL: Duration = Duration::from_millis(50);

/// Coverage buffer at content resolution plus its derived display overlay.
pub struct MaskLayer {
    coverage: GrayImage,
    overlay: RgbaImage,
    has_mask: bool,
    overlay_interval: Duration,
    last_composite: Option<Instant>,
}

impl MaskLayer {
    /// Create an empty mask sized exactly to the content raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            coverage: GrayImage::new(width, height),
            overlay: RgbaImage::new(width, height),
            has_mask: false,
            overlay_interval: DEFAULT_OVERLAY_INTERVAL,
            last_composite: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.coverage.width()
    }

    pub fn height(&self) -> u32 {
        self.coverage.height()
    }

    /// True once any pixel has non-zero coverage.
    pub fn has_mask(&self) -> bool {
        self.has_mask
    }

    /// Read access to the authoritative coverage raster.
    pub fn coverage(&self) -> &GrayImage {
        &self.coverage
    }

    pub fn set_overlay_interval(&mut self, interval: Duration) {
        self.overlay_interval = interval;
    }

    /// Paint a hard-edged filled circle of `diameter` centered at the
    /// content-space point `(cx, cy)`.
    ///
    /// Returns `true` when this stamp flipped the mask from empty to
    /// non-empty.  A stamp that covers no raster pixel (fully off-image or a
    /// degenerate diameter) leaves the mask state untouched.
    pub fn stamp(&mut self, cx: f32, cy: f32, diameter: f32) -> bool {
        let radius = diameter / 2.0;
        let radius_sq = radius * radius;
        if radius_sq < 0.001 {
            return false;
        }

        let width = self.coverage.width();
        let height = self.coverage.height();
        if width == 0 || height == 0 {
            return false;
        }

        let min_x = (cx - radius).max(0.0) as u32;
        let max_x = ((cx + radius) as u32).min(width - 1);
        let min_y = (cy - radius).max(0.0) as u32;
        let max_y = ((cy + radius) as u32).min(height - 1);
        if min_x > max_x || min_y > max_y {
            return false;
        }

        let mut wrote = false;
        for y in min_y..=max_y {
            let dy = y as f32 - cy;
            for x in min_x..=max_x {
                let dx = x as f32 - cx;
                if dx * dx + dy * dy <= radius_sq {
                    self.coverage.put_pixel(x, y, Luma([255]));
                    wrote = true;
                }
            }
        }

        if wrote && !self.has_mask {
            self.has_mask = true;
            return true;
        }
        false
    }

    /// Reset all coverage to zero.  Returns `true` when the mask was
    /// non-empty before the call; always safe to call.
    pub fn clear(&mut self) -> bool {
        self.coverage.as_mut().fill(0);
        self.overlay.as_mut().fill(0);
        self.last_composite = None;
        std::mem::replace(&mut self.has_mask, false)
    }

    /// Rebuild the display overlay from the coverage raster: covered pixels
    /// become the fixed translucent highlight, uncovered pixels stay fully
    /// transparent.
    pub fn recomposite(&mut self) {
        let width = self.coverage.width() as usize;
        if width == 0 {
            return;
        }
        let src = self.coverage.as_raw();

        self.overlay
            .as_mut()
            .par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                let src_row = &src[y * width..(y + 1) * width];
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    if src_row[x] > 0 {
                        px.copy_from_slice(&OVERLAY_COLOR);
                    } else {
                        px.fill(0);
                    }
                }
            });
    }

    /// Overlay raster for display, recomposited when the cadence interval
    /// has elapsed.  Between ticks the previous overlay is returned as-is;
    /// it may lag the coverage raster by up to one interval.
    pub fn overlay_if_due(&mut self, now: Instant) -> &RgbaImage {
        let due = self
            .last_composite
            .is_none_or(|last| now.duration_since(last) >= self.overlay_interval);
        if due {
            self.recomposite();
            self.last_composite = Some(now);
        }
        &self.overlay
    }

    /// Last composited overlay, without advancing the timer.
    pub fn overlay(&self) -> &RgbaImage {
        &self.overlay
    }

    /// When the overlay was last rebuilt.  Lets display code skip re-uploads
    /// between composite ticks.
    pub fn last_composited_at(&self) -> Option<Instant> {
        self.last_composite
    }

    /// Encode the raw coverage raster as a grayscale PNG.
    pub fn export_png(&self) -> Result<Vec<u8>, String> {
        let mut bytes = Vec::new();
        let encoder = PngEncoder::new(&mut bytes);
        #[allow(deprecated)]
        encoder
            .encode(
                self.coverage.as_raw(),
                self.coverage.width(),
                self.coverage.height(),
                image::ColorType::L8,
            )
            .map_err(|e| format!("PNG encode error: {}", e))?;
        Ok(bytes)
    }

    /// Base64-encoded PNG of the coverage raster, or `None` while the mask
    /// is empty.  Reads the coverage raster directly — never the overlay —
    /// so the result reflects every stamp up to this call.
    pub fn export_base64(&self) -> Option<String> {
        if !self.has_mask {
            return None;
        }
        match self.export_png() {
            Ok(bytes) => Some(general_purpose::STANDARD.encode(bytes)),
            Err(e) => {
                crate::log_err!("Mask export failed: {}", e);
                None
            }
        }
    }
}
