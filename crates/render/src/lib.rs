//! Rendering side of the simulation/view split.
//!
//! # Invariants
//! - The renderer never mutates simulation state; it only reads frames.
//! - Physics tick rate is decoupled from frame rate: poses shown on screen are
//!   interpolated between the two newest frames at the current render time.
//! - Catch-up stepping is bounded per tick.

mod driver;
mod frames;
mod registry;
mod renderer;

pub use driver::{DriverConfig, FixedStepDriver, Stepper, TickReport};
pub use frames::{FrameBuffer, Interpolated, interpolate, interpolation_fraction};
pub use registry::{Renderable, Visual, VisualRegistry};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "boxfall-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
