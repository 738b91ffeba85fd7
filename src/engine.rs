//! Viewport engine: UI-free orchestration of transform ownership, gesture
//! interpretation and the mask layer.
//!
//! The engine consumes [`InputEvent`]s and container measurements, routes
//! gesture commands through the geometry module, and emits
//! [`ViewportEvent`]s for the host to drain.  It holds no handle to any
//! window or texture, so every behavior is testable headlessly.

use std::time::Instant;

use egui::{Pos2, Rect, Vec2};
use image::RgbaImage;

use crate::geometry;
use crate::gesture::{GestureCommand, GestureController, GesturePhase, InputEvent};
use crate::mask::MaskLayer;
use crate::transform::{ContentDimensions, ScaleLimits, TransformOwnership, TransformState};

/// Construction-time configuration for one viewport session.
#[derive(Clone, Debug)]
pub struct ViewportConfig {
    pub content_width: u32,
    pub content_height: u32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// When set, the transform is owned by the host: the engine only emits
    /// `TransformRequested` events and mirrors values pushed back via
    /// [`ViewportEngine::sync_transform`].
    pub controlled: Option<TransformState>,
    pub mask_mode: bool,
    pub brush_diameter: f32,
}

impl ViewportConfig {
    pub fn new(content_width: u32, content_height: u32) -> Self {
        let limits = ScaleLimits::default();
        Self {
            content_width,
            content_height,
            min_scale: limits.min,
            max_scale: limits.max,
            controlled: None,
            mask_mode: false,
            brush_diameter: 25.0,
        }
    }

    /// Reject configurations the engine is not built to recover from.
    /// Callers validate once before constructing; the engine itself assumes
    /// a valid configuration and never re-checks per event.
    pub fn validate(&self) -> Result<(), String> {
        if self.content_width == 0 || self.content_height == 0 {
            return Err(format!(
                "content dimensions must be positive, got {}×{}",
                self.content_width, self.content_height
            ));
        }
        if self.min_scale <= 0.0 || self.min_scale >= self.max_scale {
            return Err(format!(
                "scale limits must satisfy 0 < min < max, got {}..{}",
                self.min_scale, self.max_scale
            ));
        }
        if self.brush_diameter <= 0.0 {
            return Err(format!(
                "brush diameter must be positive, got {}",
                self.brush_diameter
            ));
        }
        Ok(())
    }
}

/// Notifications the host drains after feeding input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewportEvent {
    /// Controlled mode: the engine wants this transform applied.  The host
    /// is the sole writer and pushes the result back via `sync_transform`.
    TransformRequested(TransformState),
    /// The mask's non-empty status flipped.
    MaskChanged(bool),
}

pub struct ViewportEngine {
    content: ContentDimensions,
    limits: ScaleLimits,
    owner: TransformOwnership,
    gesture: GestureController,
    mask: MaskLayer,
    container: Option<Rect>,
    mask_mode: bool,
    brush_diameter: f32,
    initial_fit_done: bool,
    events: Vec<ViewportEvent>,
}

impl ViewportEngine {
    pub fn new(config: ViewportConfig) -> Self {
        let owner = match config.controlled {
            Some(initial) => TransformOwnership::controlled(initial),
            None => TransformOwnership::internal(TransformState::default()),
        };
        Self {
            content: ContentDimensions::new(config.content_width, config.content_height),
            limits: ScaleLimits::new(config.min_scale, config.max_scale),
            // A controlled host brings its own transform; the initial fit
            // only applies to internally-owned state.
            initial_fit_done: config.controlled.is_some(),
            owner,
            gesture: GestureController::new(),
            mask: MaskLayer::new(config.content_width, config.content_height),
            container: None,
            mask_mode: config.mask_mode,
            brush_diameter: config.brush_diameter,
            events: Vec::new(),
        }
    }

    pub fn content(&self) -> ContentDimensions {
        self.content
    }

    pub fn limits(&self) -> ScaleLimits {
        self.limits
    }

    pub fn transform(&self) -> TransformState {
        self.owner.current()
    }

    pub fn is_controlled(&self) -> bool {
        self.owner.is_controlled()
    }

    pub fn container_rect(&self) -> Option<Rect> {
        self.container
    }

    pub fn mask_mode(&self) -> bool {
        self.mask_mode
    }

    pub fn brush_diameter(&self) -> f32 {
        self.brush_diameter
    }

    pub fn gesture_phase(&self) -> GesturePhase {
        self.gesture.phase()
    }

    /// True while a drag/pinch/paint gesture is in progress.
    pub fn gesture_active(&self) -> bool {
        self.gesture.is_active()
    }

    pub fn mask(&self) -> &MaskLayer {
        &self.mask
    }

    pub fn mask_mut(&mut self) -> &mut MaskLayer {
        &mut self.mask
    }

    /// Record the viewport's measured screen rect.
    ///
    /// The first valid measurement triggers the one-time fit-to-container
    /// (uncontrolled mode only).  Later size changes keep pan/zoom but
    /// re-clamp the translation so the clamp invariant holds between
    /// gestures; in controlled mode the engine never self-corrects.
    pub fn set_container_rect(&mut self, rect: Rect) {
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return;
        }
        self.container = Some(rect);

        if !self.initial_fit_done {
            self.initial_fit_done = true;
            self.fit_to_container();
            return;
        }

        if !self.owner.is_controlled() {
            let t = self.owner.current();
            let clamped =
                geometry::clamp_translate(self.content, rect.size(), t.scale, t.translation());
            if clamped != t.translation() {
                self.owner.request(t.with_translation(clamped));
            }
        }
    }

    /// Route a transform change through the ownership strategy, emitting the
    /// intent in controlled mode.
    fn request_transform(&mut self, next: TransformState) {
        if self.owner.is_controlled() {
            self.events.push(ViewportEvent::TransformRequested(next));
        }
        self.owner.request(next);
    }

    /// Reset to the scale that fits the content in the container, centered.
    pub fn fit_to_container(&mut self) {
        let Some(container) = self.container else {
            return;
        };
        let scale = geometry::fit_scale(self.content, container.size());
        self.request_transform(TransformState::new(scale, 0.0, 0.0));
    }

    /// Fixed-step zoom anchored at the container center.
    pub fn zoom_in(&mut self) {
        self.zoom_step(geometry::ZOOM_IN_STEP);
    }

    /// Fixed-step zoom-out anchored at the container center.
    pub fn zoom_out(&mut self) {
        self.zoom_step(geometry::ZOOM_OUT_STEP);
    }

    fn zoom_step(&mut self, step: f32) {
        let Some(container) = self.container else {
            return;
        };
        let transform = self.owner.current();
        let new_scale = self.limits.clamp(transform.scale * step);
        let next = geometry::zoom_at_point(
            transform,
            new_scale,
            container.center(),
            container,
            self.content,
            self.limits,
        );
        self.request_transform(next);
    }

    /// Feed one raw input event.  No-ops until a container measurement
    /// exists.
    pub fn handle_event(&mut self, event: InputEvent) {
        let Some(container) = self.container else {
            return;
        };
        let transform = self.owner.current();
        let Some(cmd) = self
            .gesture
            .handle(event, transform, self.limits, self.mask_mode)
        else {
            return;
        };

        match cmd {
            GestureCommand::Pan { translation } => {
                let clamped = geometry::clamp_translate(
                    self.content,
                    container.size(),
                    transform.scale,
                    translation,
                );
                self.request_transform(transform.with_translation(clamped));
            }
            GestureCommand::Zoom { scale, anchor } => {
                let next = geometry::zoom_at_point(
                    transform,
                    scale,
                    anchor,
                    container,
                    self.content,
                    self.limits,
                );
                self.request_transform(next);
            }
            GestureCommand::Paint { pos } => {
                let p = geometry::screen_to_content(pos, container, transform, self.content);
                if self.mask.stamp(p.x, p.y, self.brush_diameter) {
                    self.events.push(ViewportEvent::MaskChanged(true));
                }
            }
        }
    }

    /// Toggle paint mode.  Entering paint mode always discards any mask left
    /// over from a previous operation; this runs once per entry, not per
    /// frame.
    pub fn set_mask_mode(&mut self, enabled: bool) {
        if enabled == self.mask_mode {
            return;
        }
        self.mask_mode = enabled;
        self.gesture.reset();
        if enabled && self.mask.clear() {
            self.events.push(ViewportEvent::MaskChanged(false));
        }
    }

    pub fn set_brush_diameter(&mut self, diameter: f32) {
        self.brush_diameter = diameter;
    }

    /// Imperative clear, exposed to the owning collaborator.
    pub fn clear_mask(&mut self) {
        if self.mask.clear() {
            self.events.push(ViewportEvent::MaskChanged(false));
        }
    }

    /// Base64 PNG of the accumulated coverage, or `None` while empty.
    pub fn mask_base64(&self) -> Option<String> {
        self.mask.export_base64()
    }

    /// Display overlay, recomposited when the cadence interval has elapsed.
    pub fn overlay_if_due(&mut self, now: Instant) -> &RgbaImage {
        self.mask.overlay_if_due(now)
    }

    /// Controlled mode: the external owner pushes the authoritative
    /// transform back in.  Ignored for internally-owned state.
    pub fn sync_transform(&mut self, transform: TransformState) {
        self.owner.sync(transform);
    }

    /// Drain events accumulated since the last call, in emission order.
    pub fn take_events(&mut self) -> Vec<ViewportEvent> {
        std::mem::take(&mut self.events)
    }

    /// Convenience passthrough for hosts that need content coordinates
    /// (e.g. cursor previews).
    pub fn screen_to_content(&self, screen: Pos2) -> Option<Pos2> {
        let container = self.container?;
        Some(geometry::screen_to_content(
            screen,
            container,
            self.owner.current(),
            self.content,
        ))
    }

    /// Current pan bounds, for diagnostics and tests.
    pub fn pan_bounds(&self) -> Option<Vec2> {
        let container = self.container?;
        Some(geometry::clamp_bounds(
            self.content,
            container.size(),
            self.owner.current().scale,
        ))
    }
}
