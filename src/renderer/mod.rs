//! Orb rendering
//!
//! `visual` maps simulation state to drawable values; `orb_pipeline` puts
//! them on a WebGPU (or WebGL2) surface.

pub mod orb_pipeline;
pub mod visual;

pub use orb_pipeline::OrbRenderState;
pub use visual::{OpacityTransitions, OrbVisual, VisualStyle, orb_visual, orb_visuals, pulse_scale};
