//! Smoothed values: eased transitions between a start and a target.
//!
//! # Invariants
//! - `0 <= timer <= transition_time` at all times.
//! - Once the timer reaches the transition time, `update` copies the target
//!   exactly, so no residual interpolation error survives a finished transition.

mod easing;
mod value;

pub use easing::Easing;
pub use value::{Lerp, SmoothedValue};
