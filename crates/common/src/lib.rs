//! Shared types passed between the simulation, the view and the renderers.

mod types;

pub use types::{BodyId, BoxShape, Pose, lerp_quat_components};
