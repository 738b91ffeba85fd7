//! Gesture interpretation: raw pointer/touch/wheel input into viewport
//! commands.
//!
//! The controller is a state machine over `Idle | Panning | Pinching |
//! Painting`.  Per-gesture snapshots (drag anchor, pre-pinch distance and
//! scale) live inside the active variant and are discarded on the
//! transition back to `Idle`.  Wheel input never enters the state machine:
//! each wheel event maps to one bounded zoom step on its own.

use std::collections::BTreeMap;

use egui::{Pos2, Vec2};

use crate::transform::{ScaleLimits, TransformState};

/// Cap on a single wheel event's delta magnitude.
const WHEEL_DELTA_CAP: f32 = 100.0;
/// Zoom factor change per wheel delta unit.
const WHEEL_SENSITIVITY: f32 = 0.002;

/// Raw input fed to the controller.  The surface layer translates host
/// (egui) events into these; tests construct them directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Primary-button press at a screen position.
    PointerPressed { pos: Pos2 },
    PointerMoved { pos: Pos2 },
    /// Primary-button release.  Also delivered by the global safety net when
    /// the release lands outside the viewport, so a drag can never stick.
    PointerReleased,
    TouchStarted { id: u64, pos: Pos2 },
    TouchMoved { id: u64, pos: Pos2 },
    TouchEnded { id: u64 },
    /// Wheel scroll at the cursor position.  Positive delta zooms in.
    Wheel { pos: Pos2, delta: f32 },
}

/// What the viewport should do in response to one input event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureCommand {
    /// Proposed translation while panning (unclamped; the engine clamps).
    Pan { translation: Vec2 },
    /// Zoom to an absolute, already limit-clamped scale, keeping the screen
    /// point `anchor` fixed.
    Zoom { scale: f32, anchor: Pos2 },
    /// Stamp the mask under this screen position.
    Paint { pos: Pos2 },
}

/// Tagged gesture state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GesturePhase {
    Idle,
    Panning { origin: Pos2, start_translate: Vec2 },
    Pinching { start_distance: f32, start_scale: f32 },
    Painting,
}

pub struct GestureController {
    phase: GesturePhase,
    /// Currently-down touch points, keyed by host touch id.
    touches: BTreeMap<u64, Pos2>,
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureController {
    pub fn new() -> Self {
        Self {
            phase: GesturePhase::Idle,
            touches: BTreeMap::new(),
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// True while a drag/pinch/paint gesture is in progress.
    pub fn is_active(&self) -> bool {
        self.phase != GesturePhase::Idle
    }

    /// Abandon any gesture in progress (mode switches, content swaps).
    pub fn reset(&mut self) {
        self.phase = GesturePhase::Idle;
        self.touches.clear();
    }

    /// Feed one input event, returning the command it maps to (if any).
    ///
    /// `transform` is the state at event time: pan and pinch snapshot it on
    /// gesture start.  While `mask_mode` is set, drag-panning and pinching
    /// are disabled and the primary button paints instead; wheel zoom stays
    /// available in either mode.
    pub fn handle(
        &mut self,
        event: InputEvent,
        transform: TransformState,
        limits: ScaleLimits,
        mask_mode: bool,
    ) -> Option<GestureCommand> {
        match event {
            InputEvent::PointerPressed { pos } => {
                if mask_mode {
                    self.phase = GesturePhase::Painting;
                    Some(GestureCommand::Paint { pos })
                } else {
                    self.phase = GesturePhase::Panning {
                        origin: pos,
                        start_translate: transform.translation(),
                    };
                    None
                }
            }

            InputEvent::PointerMoved { pos } => match self.phase {
                GesturePhase::Panning {
                    origin,
                    start_translate,
                } => Some(GestureCommand::Pan {
                    translation: start_translate + (pos - origin),
                }),
                GesturePhase::Painting if mask_mode => Some(GestureCommand::Paint { pos }),
                _ => None,
            },

            InputEvent::PointerReleased => {
                self.phase = GesturePhase::Idle;
                None
            }

            InputEvent::TouchStarted { id, pos } => {
                if mask_mode {
                    return None;
                }
                self.touches.insert(id, pos);
                match self.touches.len() {
                    1 => {
                        self.phase = GesturePhase::Panning {
                            origin: pos,
                            start_translate: transform.translation(),
                        };
                    }
                    2 => {
                        // Second finger upgrades a pan (or idle) to a pinch.
                        self.phase = GesturePhase::Pinching {
                            start_distance: self.touch_distance(),
                            start_scale: transform.scale,
                        };
                    }
                    _ => {}
                }
                None
            }

            InputEvent::TouchMoved { id, pos } => {
                if mask_mode || !self.touches.contains_key(&id) {
                    return None;
                }
                self.touches.insert(id, pos);
                match self.phase {
                    GesturePhase::Pinching {
                        start_distance,
                        start_scale,
                    } if self.touches.len() >= 2 => {
                        if start_distance <= f32::EPSILON {
                            return None;
                        }
                        let factor = self.touch_distance() / start_distance;
                        Some(GestureCommand::Zoom {
                            scale: limits.clamp(start_scale * factor),
                            anchor: self.touch_midpoint(),
                        })
                    }
                    GesturePhase::Panning {
                        origin,
                        start_translate,
                    } if self.touches.len() == 1 => Some(GestureCommand::Pan {
                        translation: start_translate + (pos - origin),
                    }),
                    _ => None,
                }
            }

            InputEvent::TouchEnded { id } => {
                self.touches.remove(&id);
                // Any finger lift ends the gesture; a remaining finger stays
                // inert until its own fresh touch start.
                self.phase = GesturePhase::Idle;
                None
            }

            InputEvent::Wheel { pos, delta } => {
                let capped = delta.signum() * delta.abs().min(WHEEL_DELTA_CAP);
                let factor = 1.0 + capped * WHEEL_SENSITIVITY;
                Some(GestureCommand::Zoom {
                    scale: limits.clamp(transform.scale * factor),
                    anchor: pos,
                })
            }
        }
    }

    fn first_two_touches(&self) -> Option<(Pos2, Pos2)> {
        let mut it = self.touches.values();
        match (it.next(), it.next()) {
            (Some(a), Some(b)) => Some((*a, *b)),
            _ => None,
        }
    }

    fn touch_distance(&self) -> f32 {
        self.first_two_touches()
            .map(|(a, b)| a.distance(b))
            .unwrap_or(0.0)
    }

    fn touch_midpoint(&self) -> Pos2 {
        self.first_two_touches()
            .map(|(a, b)| Pos2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0))
            .unwrap_or(Pos2::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn idle_controller() -> (GestureController, TransformState, ScaleLimits) {
        (
            GestureController::new(),
            TransformState::default(),
            ScaleLimits::default(),
        )
    }

    #[test]
    fn pan_accumulates_from_drag_origin() {
        let (mut g, _, limits) = idle_controller();
        let transform = TransformState::new(1.0, 3.0, 4.0);

        let cmd = g.handle(
            InputEvent::PointerPressed { pos: pos2(10.0, 10.0) },
            transform,
            limits,
            false,
        );
        assert_eq!(cmd, None);
        assert!(matches!(g.phase(), GesturePhase::Panning { .. }));

        let cmd = g.handle(
            InputEvent::PointerMoved { pos: pos2(15.0, 30.0) },
            transform,
            limits,
            false,
        );
        assert_eq!(
            cmd,
            Some(GestureCommand::Pan {
                translation: Vec2::new(8.0, 24.0)
            })
        );
    }

    #[test]
    fn release_returns_to_idle_and_stops_panning() {
        let (mut g, transform, limits) = idle_controller();
        g.handle(InputEvent::PointerPressed { pos: pos2(0.0, 0.0) }, transform, limits, false);
        g.handle(InputEvent::PointerReleased, transform, limits, false);
        assert_eq!(g.phase(), GesturePhase::Idle);

        let cmd = g.handle(
            InputEvent::PointerMoved { pos: pos2(50.0, 50.0) },
            transform,
            limits,
            false,
        );
        assert_eq!(cmd, None);
    }

    #[test]
    fn global_release_recovers_stuck_paint() {
        let (mut g, transform, limits) = idle_controller();
        g.handle(InputEvent::PointerPressed { pos: pos2(5.0, 5.0) }, transform, limits, true);
        assert_eq!(g.phase(), GesturePhase::Painting);

        // Pointer-up arrived from outside the viewport bounds.
        g.handle(InputEvent::PointerReleased, transform, limits, true);
        assert_eq!(g.phase(), GesturePhase::Idle);
        let cmd = g.handle(
            InputEvent::PointerMoved { pos: pos2(6.0, 6.0) },
            transform,
            limits,
            true,
        );
        assert_eq!(cmd, None);
    }

    #[test]
    fn pinch_scales_by_distance_ratio() {
        let (mut g, transform, limits) = idle_controller();
        g.handle(InputEvent::TouchStarted { id: 1, pos: pos2(100.0, 100.0) }, transform, limits, false);
        g.handle(InputEvent::TouchStarted { id: 2, pos: pos2(200.0, 100.0) }, transform, limits, false);
        assert!(matches!(g.phase(), GesturePhase::Pinching { .. }));

        // Distance 100 -> 200: scale doubles, anchored at the midpoint.
        let cmd = g.handle(
            InputEvent::TouchMoved { id: 2, pos: pos2(300.0, 100.0) },
            transform,
            limits,
            false,
        );
        assert_eq!(
            cmd,
            Some(GestureCommand::Zoom {
                scale: 2.0,
                anchor: pos2(200.0, 100.0)
            })
        );
    }

    #[test]
    fn pinch_clips_at_configured_bounds() {
        let (mut g, transform, limits) = idle_controller();
        g.handle(InputEvent::TouchStarted { id: 1, pos: pos2(100.0, 100.0) }, transform, limits, false);
        g.handle(InputEvent::TouchStarted { id: 2, pos: pos2(200.0, 100.0) }, transform, limits, false);

        // Ratio 9x pins at max scale.
        let cmd = g.handle(
            InputEvent::TouchMoved { id: 2, pos: pos2(1000.0, 100.0) },
            transform,
            limits,
            false,
        );
        assert!(matches!(cmd, Some(GestureCommand::Zoom { scale, .. }) if scale == limits.max));

        // Ratio 0.05x pins at min scale.
        let cmd = g.handle(
            InputEvent::TouchMoved { id: 2, pos: pos2(105.0, 100.0) },
            transform,
            limits,
            false,
        );
        assert!(matches!(cmd, Some(GestureCommand::Zoom { scale, .. }) if scale == limits.min));
    }

    #[test]
    fn second_finger_upgrades_pan_to_pinch() {
        let (mut g, transform, limits) = idle_controller();
        g.handle(InputEvent::TouchStarted { id: 1, pos: pos2(50.0, 50.0) }, transform, limits, false);
        assert!(matches!(g.phase(), GesturePhase::Panning { .. }));

        g.handle(InputEvent::TouchStarted { id: 2, pos: pos2(150.0, 50.0) }, transform, limits, false);
        assert!(matches!(g.phase(), GesturePhase::Pinching { .. }));
    }

    #[test]
    fn lifted_finger_ends_gesture_and_leftover_finger_stays_inert() {
        let (mut g, transform, limits) = idle_controller();
        g.handle(InputEvent::TouchStarted { id: 1, pos: pos2(50.0, 50.0) }, transform, limits, false);
        g.handle(InputEvent::TouchStarted { id: 2, pos: pos2(150.0, 50.0) }, transform, limits, false);
        g.handle(InputEvent::TouchEnded { id: 2 }, transform, limits, false);
        assert_eq!(g.phase(), GesturePhase::Idle);

        let cmd = g.handle(
            InputEvent::TouchMoved { id: 1, pos: pos2(80.0, 50.0) },
            transform,
            limits,
            false,
        );
        assert_eq!(cmd, None);
    }

    #[test]
    fn wheel_delta_is_capped_and_sign_preserving() {
        let (mut g, _, limits) = idle_controller();
        let transform = TransformState::default();

        let cmd = g.handle(
            InputEvent::Wheel { pos: pos2(10.0, 10.0), delta: 500.0 },
            transform,
            limits,
            false,
        );
        assert_eq!(
            cmd,
            Some(GestureCommand::Zoom {
                scale: 1.2,
                anchor: pos2(10.0, 10.0)
            })
        );

        let cmd = g.handle(
            InputEvent::Wheel { pos: pos2(10.0, 10.0), delta: -500.0 },
            transform,
            limits,
            false,
        );
        assert_eq!(
            cmd,
            Some(GestureCommand::Zoom {
                scale: 0.8,
                anchor: pos2(10.0, 10.0)
            })
        );
    }

    #[test]
    fn wheel_does_not_disturb_gesture_state() {
        let (mut g, transform, limits) = idle_controller();
        g.handle(InputEvent::PointerPressed { pos: pos2(0.0, 0.0) }, transform, limits, false);
        let before = g.phase();
        g.handle(InputEvent::Wheel { pos: pos2(5.0, 5.0), delta: 40.0 }, transform, limits, false);
        assert_eq!(g.phase(), before);
    }

    #[test]
    fn mask_mode_paints_instead_of_panning() {
        let (mut g, transform, limits) = idle_controller();

        let cmd = g.handle(
            InputEvent::PointerPressed { pos: pos2(30.0, 40.0) },
            transform,
            limits,
            true,
        );
        assert_eq!(cmd, Some(GestureCommand::Paint { pos: pos2(30.0, 40.0) }));

        let cmd = g.handle(
            InputEvent::PointerMoved { pos: pos2(31.0, 41.0) },
            transform,
            limits,
            true,
        );
        assert_eq!(cmd, Some(GestureCommand::Paint { pos: pos2(31.0, 41.0) }));
    }

    #[test]
    fn mask_mode_ignores_touches() {
        let (mut g, transform, limits) = idle_controller();
        let cmd = g.handle(
            InputEvent::TouchStarted { id: 1, pos: pos2(30.0, 40.0) },
            transform,
            limits,
            true,
        );
        assert_eq!(cmd, None);
        assert_eq!(g.phase(), GesturePhase::Idle);
    }

    #[test]
    fn wheel_zoom_stays_available_while_painting() {
        let (mut g, transform, limits) = idle_controller();
        g.handle(InputEvent::PointerPressed { pos: pos2(0.0, 0.0) }, transform, limits, true);
        let cmd = g.handle(
            InputEvent::Wheel { pos: pos2(5.0, 5.0), delta: 100.0 },
            transform,
            limits,
            true,
        );
        assert!(matches!(cmd, Some(GestureCommand::Zoom { .. })));
    }
}
