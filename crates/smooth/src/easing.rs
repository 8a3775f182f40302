use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Easing curve applied to normalized transition progress.
///
/// Every curve maps 0 to 0 and 1 to 1 and is non-decreasing in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Easing {
    /// `sin(t * pi / 2)`
    Sinusoidal,
    /// `t * (2 - t)`
    Quadratic,
    /// `1 - (t - 1)^4`
    Quartic,
    /// `(t - 1)^5 + 1`
    #[default]
    Quintic,
}

impl Easing {
    pub const ALL: [Easing; 4] = [
        Easing::Sinusoidal,
        Easing::Quadratic,
        Easing::Quartic,
        Easing::Quintic,
    ];

    /// Map progress `t` in `[0, 1]` through the curve. Inputs outside the
    /// range are clamped first.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Sinusoidal => (t * FRAC_PI_2).sin(),
            Easing::Quadratic => t * (2.0 - t),
            Easing::Quartic => 1.0 - (t - 1.0).powi(4),
            Easing::Quintic => (t - 1.0).powi(5) + 1.0,
        }
    }
}
