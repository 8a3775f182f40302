use boxfall_common::{BodyId, BoxShape, Pose};
use glam::Vec3;

/// The physics engine as seen by the simulation: a black box that steps by
/// a fixed amount and reports body poses.
///
/// Solver internals (broad phase, contacts, integration) stay inside the
/// implementation.
pub trait PhysicsBackend {
    /// Size of one step in seconds. Read back after every step; the
    /// simulation never assumes a value.
    fn dt(&self) -> f64;

    /// Advance the world by exactly one step of `dt()`.
    fn step(&mut self);

    /// Create a dynamic box body with an attached cuboid collider.
    fn create_box_body(&mut self, position: Vec3, shape: BoxShape) -> BodyId;

    /// Create a static box collider not attached to any body.
    fn create_fixed_box(&mut self, position: Vec3, shape: BoxShape);

    /// Remove a body and its colliders. Returns false if the id is unknown.
    fn remove_body(&mut self, id: BodyId) -> bool;

    /// Current pose of a body, if it exists.
    fn pose(&self, id: BodyId) -> Option<Pose>;
}
