//! maskview — an interactive pan/zoom viewport with region-of-interest mask
//! painting, built on egui.
//!
//! The crate is organised leaf-first:
//! * [`geometry`] — pure transform math (clamping, fit, zoom-at-point,
//!   coordinate conversion).
//! * [`transform`] — the scale/translation state and its controlled vs.
//!   uncontrolled ownership strategy.
//! * [`gesture`] — the `Idle|Panning|Pinching|Painting` input state machine.
//! * [`mask`] — the coverage raster, brush stamping, the periodic overlay
//!   compositor and PNG/base64 export.
//! * [`engine`] — UI-free orchestration of all of the above.
//! * [`viewport`] — the egui widget surface over the engine.
//!
//! [`app`] and [`cli`] carry the demo binary: an eframe shell embedding the
//! widget, and a headless stamp-replay mode.

pub mod app;
pub mod cli;
pub mod engine;
pub mod geometry;
pub mod gesture;
pub mod logger;
pub mod mask;
pub mod transform;
pub mod viewport;

pub use engine::{ViewportConfig, ViewportEngine, ViewportEvent};
pub use gesture::{GestureCommand, GesturePhase, InputEvent};
pub use mask::MaskLayer;
pub use transform::{ContentDimensions, ScaleLimits, TransformState};
pub use viewport::{GridTheme, ViewportOutput, ViewportWidget};
