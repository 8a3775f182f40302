//! The demo's per-frame control flow.
//!
//! Each tick accumulates render time, runs bounded fixed-step catch-up,
//! applies simulation events to the visual registry, interpolates poses at
//! the render time and advances the orbit camera.

mod config;
mod view;

pub use config::{ConfigError, DemoConfig};
pub use view::{FrameStats, INITIAL_FOCAL_POINT, View};

pub fn crate_info() -> &'static str {
    "boxfall-view v0.1.0"
}
