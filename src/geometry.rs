//! Pure viewport transform math.
//!
//! Everything here is stateless.  The render pipeline places the content's
//! screen rect at the container center offset by the translation, scaled
//! about the content's own center; every conversion below is derived from
//! that placement, so the renderer and the hit-testing code can never
//! disagree about where a content pixel is on screen.

use egui::{Pos2, Rect, Vec2};

use crate::transform::{ContentDimensions, ScaleLimits, TransformState};

/// Multiplicative step for the zoom-in operation.
pub const ZOOM_IN_STEP: f32 = 1.25;
/// Multiplicative step for the zoom-out operation.
pub const ZOOM_OUT_STEP: f32 = 0.8;

/// Maximum pan distance from center on each axis at the given scale.
///
/// When the scaled content fits inside the container on an axis the bound is
/// zero: the content stays centered and cannot be panned on that axis.
/// Otherwise the content may pan until its edge meets the container edge.
pub fn clamp_bounds(content: ContentDimensions, container_size: Vec2, scale: f32) -> Vec2 {
    let scaled = content.size_vec() * scale;

    let max_x = if scaled.x > container_size.x {
        (scaled.x - container_size.x) / 2.0
    } else {
        0.0
    };
    let max_y = if scaled.y > container_size.y {
        (scaled.y - container_size.y) / 2.0
    } else {
        0.0
    };

    Vec2::new(max_x, max_y)
}

/// Clamp a proposed translation to the pan bounds for `scale`.
pub fn clamp_translate(
    content: ContentDimensions,
    container_size: Vec2,
    scale: f32,
    translation: Vec2,
) -> Vec2 {
    let bounds = clamp_bounds(content, container_size, scale);
    Vec2::new(
        translation.x.clamp(-bounds.x, bounds.x),
        translation.y.clamp(-bounds.y, bounds.y),
    )
}

/// Scale that fits the content inside the container, never upscaling past 1:1.
pub fn fit_scale(content: ContentDimensions, container_size: Vec2) -> f32 {
    let scale_x = container_size.x / content.width as f32;
    let scale_y = container_size.y / content.height as f32;
    scale_x.min(scale_y).min(1.0)
}

/// Screen rect occupied by the content under `transform`.
pub fn content_rect(
    container: Rect,
    transform: TransformState,
    content: ContentDimensions,
) -> Rect {
    let center = container.center() + transform.translation();
    Rect::from_center_size(center, content.size_vec() * transform.scale)
}

/// Convert a screen-space point to content-space coordinates.
///
/// Inverts the centering + translate + scale pipeline used for rendering;
/// the result may lie outside `0..content` when the point is off the image.
pub fn screen_to_content(
    screen: Pos2,
    container: Rect,
    transform: TransformState,
    content: ContentDimensions,
) -> Pos2 {
    let rect = content_rect(container, transform, content);
    Pos2::new(
        (screen.x - rect.min.x) / transform.scale,
        (screen.y - rect.min.y) / transform.scale,
    )
}

/// Zoom to `new_scale` while keeping the content point under `anchor` fixed
/// on screen.
///
/// With the anchor offset `p` measured from the container center, the
/// translation that keeps the anchored content point stationary is
/// `t' = p - (p - t) * (s' / s)`.  The result is clamped to the pan bounds
/// at the new scale, so the anchor guarantee holds pre-clamp only.
pub fn zoom_at_point(
    transform: TransformState,
    new_scale: f32,
    anchor: Pos2,
    container: Rect,
    content: ContentDimensions,
    limits: ScaleLimits,
) -> TransformState {
    let new_scale = limits.clamp(new_scale);
    let p = anchor - container.center();
    let ratio = new_scale / transform.scale;

    let translate_x = p.x - (p.x - transform.translate_x) * ratio;
    let translate_y = p.y - (p.y - transform.translate_y) * ratio;
    let clamped = clamp_translate(
        content,
        container.size(),
        new_scale,
        Vec2::new(translate_x, translate_y),
    );

    TransformState::new(new_scale, clamped.x, clamped.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    const EPS: f32 = 1e-3;

    fn container_512() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), Vec2::splat(512.0))
    }

    #[test]
    fn bounds_are_zero_when_scaled_content_fits() {
        let content = ContentDimensions::new(100, 100);
        let bounds = clamp_bounds(content, Vec2::splat(512.0), 1.0);
        assert_eq!(bounds, Vec2::ZERO);

        // A huge requested pan collapses to dead center.
        let t = clamp_translate(content, Vec2::splat(512.0), 1.0, Vec2::new(900.0, -900.0));
        assert_eq!(t, Vec2::ZERO);
    }

    #[test]
    fn bounds_grow_with_overflow() {
        let content = ContentDimensions::new(1024, 1024);
        let bounds = clamp_bounds(content, Vec2::splat(512.0), 1.0);
        assert_eq!(bounds, Vec2::splat(256.0));

        let t = clamp_translate(content, Vec2::splat(512.0), 1.0, Vec2::new(400.0, -100.0));
        assert_eq!(t, Vec2::new(256.0, -100.0));
    }

    #[test]
    fn bounds_are_per_axis() {
        // Wide content in a square container: pannable in x only.
        let content = ContentDimensions::new(2048, 256);
        let bounds = clamp_bounds(content, Vec2::splat(512.0), 1.0);
        assert_eq!(bounds.x, 768.0);
        assert_eq!(bounds.y, 0.0);
    }

    #[test]
    fn fit_scale_is_min_ratio_capped_at_one() {
        let big = ContentDimensions::new(1024, 1024);
        assert!((fit_scale(big, Vec2::splat(512.0)) - 0.5).abs() < EPS);

        let wide = ContentDimensions::new(2048, 512);
        assert!((fit_scale(wide, Vec2::splat(512.0)) - 0.25).abs() < EPS);

        let small = ContentDimensions::new(100, 100);
        assert_eq!(fit_scale(small, Vec2::splat(512.0)), 1.0);
    }

    #[test]
    fn zoom_at_point_keeps_anchor_stationary() {
        let content = ContentDimensions::new(1024, 1024);
        let container = container_512();
        let limits = ScaleLimits::default();
        let start = TransformState::new(0.5, 0.0, 0.0);
        let anchor = pos2(100.0, 200.0);

        let under_anchor = screen_to_content(anchor, container, start, content);
        let zoomed = zoom_at_point(start, 1.0, anchor, container, content, limits);

        // The same content point must still render at the anchor.
        let rect = content_rect(container, zoomed, content);
        let back_x = rect.min.x + under_anchor.x * zoomed.scale;
        let back_y = rect.min.y + under_anchor.y * zoomed.scale;
        assert!((back_x - anchor.x).abs() < EPS);
        assert!((back_y - anchor.y).abs() < EPS);
    }

    #[test]
    fn center_anchored_zoom_keeps_translation_zero() {
        let content = ContentDimensions::new(1024, 1024);
        let container = container_512();
        let start = TransformState::new(0.5, 0.0, 0.0);

        let zoomed = zoom_at_point(
            start,
            1.0,
            container.center(),
            container,
            content,
            ScaleLimits::default(),
        );
        assert_eq!(zoomed.scale, 1.0);
        assert!(zoomed.translate_x.abs() < EPS);
        assert!(zoomed.translate_y.abs() < EPS);
    }

    #[test]
    fn zoom_at_point_respects_scale_limits() {
        let content = ContentDimensions::new(1024, 1024);
        let container = container_512();
        let start = TransformState::new(1.0, 0.0, 0.0);
        let limits = ScaleLimits::default();

        let hi = zoom_at_point(start, 99.0, container.center(), container, content, limits);
        assert_eq!(hi.scale, limits.max);
        let lo = zoom_at_point(start, 0.0001, container.center(), container, content, limits);
        assert_eq!(lo.scale, limits.min);
    }

    #[test]
    fn zoom_out_to_fitting_scale_recenters() {
        let content = ContentDimensions::new(1024, 1024);
        let container = container_512();
        // Panned hard to a corner at 2x, then zoomed out to 0.25 where the
        // content fits: the clamp must pull the translation back to zero.
        let start = TransformState::new(2.0, 700.0, -700.0);
        let zoomed = zoom_at_point(
            start,
            0.25,
            pos2(0.0, 0.0),
            container,
            content,
            ScaleLimits::default(),
        );
        assert_eq!(zoomed.translate_x, 0.0);
        assert_eq!(zoomed.translate_y, 0.0);
    }

    #[test]
    fn screen_to_content_round_trip() {
        let content = ContentDimensions::new(800, 600);
        let container = container_512();
        let transform = TransformState::new(1.5, 40.0, -25.0);

        let screen = pos2(300.0, 200.0);
        let c = screen_to_content(screen, container, transform, content);
        let rect = content_rect(container, transform, content);
        assert!((rect.min.x + c.x * transform.scale - screen.x).abs() < EPS);
        assert!((rect.min.y + c.y * transform.scale - screen.y).abs() < EPS);
    }
}
