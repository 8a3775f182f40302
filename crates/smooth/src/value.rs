use glam::{Vec2, Vec3, Vec4};

use crate::easing::Easing;

/// Linear interpolation between two values of the same type.
///
/// Implementations use the `a * (1 - t) + b * t` form so that `t == 0` and
/// `t == 1` reproduce the endpoints exactly. Easing is applied by the caller.
pub trait Lerp: Clone {
    fn lerp(a: &Self, b: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        a * (1.0 - t) + b * t
    }
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        let t = t as f64;
        a * (1.0 - t) + b * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        *a * (1.0 - t) + *b * t
    }
}

impl Lerp for Vec3 {
    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        *a * (1.0 - t) + *b * t
    }
}

impl Lerp for Vec4 {
    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        *a * (1.0 - t) + *b * t
    }
}

/// A value that eases from where it currently sits toward a target over a
/// fixed transition time.
///
/// `snapto` only moves the target and finishes the timer; `value` keeps its
/// old contents until the next `update` copies the target in. A `goto` issued
/// in between therefore starts from the stale pre-snap value.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedValue<T: Lerp> {
    value: T,
    start: T,
    target: T,
    transition_time: f32,
    timer: f32,
    easing: Easing,
}

impl<T: Lerp> SmoothedValue<T> {
    /// Create a settled value using the quintic ease-out curve.
    pub fn new(value: T, transition_time: f32) -> Self {
        Self::with_easing(value, transition_time, Easing::Quintic)
    }

    pub fn with_easing(value: T, transition_time: f32, easing: Easing) -> Self {
        Self {
            start: value.clone(),
            target: value.clone(),
            value,
            transition_time: transition_time.max(0.0),
            timer: 0.0,
            easing,
        }
    }

    /// Begin a new transition from the current value to `target`.
    pub fn goto(&mut self, target: T) {
        self.timer = 0.0;
        self.start = self.value.clone();
        self.target = target;
    }

    /// Jump the target without easing. The visible value catches up on the
    /// next `update`.
    pub fn snapto(&mut self, value: T) {
        self.timer = self.transition_time;
        self.target = value;
    }

    /// Advance the transition by `dt` seconds. Negative deltas count as zero.
    pub fn update(&mut self, dt: f32) {
        if self.timer < self.transition_time {
            self.timer = (self.timer + dt.max(0.0)).min(self.transition_time);
            let t = self.easing.apply(self.timer / self.transition_time);
            self.value = T::lerp(&self.start, &self.target, t);
        } else {
            self.value = self.target.clone();
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn start(&self) -> &T {
        &self.start
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn transition_time(&self) -> f32 {
        self.transition_time
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    /// True once the timer has run out. The value itself may still be one
    /// update behind after a `snapto`.
    pub fn is_settled(&self) -> bool {
        self.timer >= self.transition_time
    }
}
