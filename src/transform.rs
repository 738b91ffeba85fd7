use egui::Vec2;
use serde::{Deserialize, Serialize};

/// Pan/zoom state of the viewport.
///
/// `scale` is screen pixels per content pixel.  The translation is the offset
/// of the content's center from the container's center, in screen pixels, so
/// the identity transform shows the content centered at 100%.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl TransformState {
    pub fn new(scale: f32, translate_x: f32, translate_y: f32) -> Self {
        Self {
            scale,
            translate_x,
            translate_y,
        }
    }

    /// Translation as a vector.
    pub fn translation(&self) -> Vec2 {
        Vec2::new(self.translate_x, self.translate_y)
    }

    /// Same scale, different translation.
    pub fn with_translation(&self, translation: Vec2) -> Self {
        Self {
            scale: self.scale,
            translate_x: translation.x,
            translate_y: translation.y,
        }
    }
}

/// Intrinsic pixel size of the displayed raster, fixed for the lifetime of
/// one viewport session and independent of zoom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentDimensions {
    pub width: u32,
    pub height: u32,
}

impl ContentDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn size_vec(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// Allowed zoom range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleLimits {
    pub min: f32,
    pub max: f32,
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self { min: 0.25, max: 4.0 }
    }
}

impl ScaleLimits {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, scale: f32) -> f32 {
        scale.clamp(self.min, self.max)
    }
}

/// Who owns the pan/zoom state.
///
/// `Internal` owns the transform and applies requested states directly.
/// `Controlled` mirrors a value supplied by an external owner: requested
/// states are never applied to the mirror — the engine reports them as
/// intents and the owner pushes the authoritative value back via [`sync`].
///
/// [`sync`]: TransformOwnership::sync
#[derive(Clone, Debug, PartialEq)]
pub enum TransformOwnership {
    Internal { state: TransformState },
    Controlled { mirror: TransformState },
}

impl TransformOwnership {
    pub fn internal(initial: TransformState) -> Self {
        Self::Internal { state: initial }
    }

    pub fn controlled(initial: TransformState) -> Self {
        Self::Controlled { mirror: initial }
    }

    pub fn is_controlled(&self) -> bool {
        matches!(self, Self::Controlled { .. })
    }

    pub fn current(&self) -> TransformState {
        match self {
            Self::Internal { state } => *state,
            Self::Controlled { mirror } => *mirror,
        }
    }

    /// Apply a requested next state.  In controlled mode this is a no-op:
    /// the mirror only changes through [`sync`](Self::sync).
    pub fn request(&mut self, next: TransformState) {
        if let Self::Internal { state } = self {
            *state = next;
        }
    }

    /// External-owner push of the authoritative value (controlled mode only).
    pub fn sync(&mut self, value: TransformState) {
        if let Self::Controlled { mirror } = self {
            *mirror = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_owner_applies_requests() {
        let mut owner = TransformOwnership::internal(TransformState::default());
        owner.request(TransformState::new(2.0, 10.0, -5.0));
        assert_eq!(owner.current(), TransformState::new(2.0, 10.0, -5.0));
    }

    #[test]
    fn controlled_owner_ignores_requests_until_synced() {
        let initial = TransformState::new(0.5, 0.0, 0.0);
        let mut owner = TransformOwnership::controlled(initial);
        owner.request(TransformState::new(2.0, 10.0, -5.0));
        assert_eq!(owner.current(), initial);

        owner.sync(TransformState::new(2.0, 10.0, -5.0));
        assert_eq!(owner.current(), TransformState::new(2.0, 10.0, -5.0));
    }

    #[test]
    fn sync_is_a_noop_for_internal_ownership() {
        let mut owner = TransformOwnership::internal(TransformState::default());
        owner.sync(TransformState::new(3.0, 1.0, 1.0));
        assert_eq!(owner.current(), TransformState::default());
    }

    #[test]
    fn scale_limits_clamp() {
        let limits = ScaleLimits::default();
        assert_eq!(limits.clamp(0.01), 0.25);
        assert_eq!(limits.clamp(1.0), 1.0);
        assert_eq!(limits.clamp(100.0), 4.0);
    }
}
