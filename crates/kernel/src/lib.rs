//! Simulation kernel: a fixed-step physics world behind a backend seam.
//!
//! # Invariants
//! - Simulation time only advances by the backend's own step size.
//! - Every step produces exactly one `WorldFrame`.
//! - Body creation and removal are reported as discrete events, separate
//!   from the per-step frame stream.

pub mod backend;
#[cfg(feature = "rapier")]
pub mod rapier;
pub mod world;

pub use backend::PhysicsBackend;
#[cfg(feature = "rapier")]
pub use rapier::RapierBackend;
pub use world::{BodyKind, BoxSpawn, SimConfig, SimError, SimEvent, Simulation, WorldFrame};
