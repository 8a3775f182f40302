//! wgpu render backend for the box demo.
//!
//! Draws the ground slab and one lit cube instance per registered box, seen
//! through the orbit camera.
//!
//! # Invariants
//! - Reads the visual registry only; never touches the simulation.
//! - Draw rate is independent of the physics step rate.

mod gpu;
mod scene;
mod shaders;

pub use gpu::{BoxRenderer, CLEAR_COLOR};
pub use scene::{Ground, InstanceData, Lighting, SceneBuilder};
