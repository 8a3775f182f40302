//! Input: pointer and touch events driving an orbit camera.
//!
//! # Invariants
//! - Mouse and touch handlers write the same orbit state, always through
//!   `&mut OrbitController`, so writes are serialized by the borrow checker.
//! - Listener teardown is scoped: dropping a `Subscription` unregisters it
//!   exactly once.
//! - Camera motion lives outside the simulation and never feeds back into it.

mod bus;
mod event;
mod mouse;
mod orbit;
mod projector;
mod touch;

pub use bus::{InputBus, Subscription};
pub use event::{InputEvent, MouseButton, MouseEvent, TouchEvent, TouchPhase, TouchPoint};
pub use mouse::MouseController;
pub use orbit::{
    CameraPose, OrbitBinding, OrbitConfig, OrbitController, OrbitState, forward_vector,
    vec_to_azim_elev_distance,
};
pub use projector::{CameraView, Projection, ScreenProjector};
pub use touch::TouchController;

pub fn crate_info() -> &'static str {
    "boxfall-input v0.1.0"
}
