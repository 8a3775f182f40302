use boxfall_kernel::{PhysicsBackend, Simulation};
use serde::{Deserialize, Serialize};

/// Anything that advances in fixed steps and reports its own clock.
pub trait Stepper {
    /// Time reached by the last completed step, in seconds.
    fn time(&self) -> f64;
    /// Run exactly one step.
    fn step(&mut self);
}

impl<B: PhysicsBackend> Stepper for Simulation<B> {
    fn time(&self) -> f64 {
        Simulation::time(self)
    }

    fn step(&mut self) {
        Simulation::step(self);
    }
}

/// Bounds on how much catch-up work one render tick may do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Longest frame delta accepted, in seconds. Longer frames (tab switches,
    /// debugger pauses) are clamped.
    pub max_frame_delta: f64,
    /// Most simulation steps run in a single tick.
    pub max_steps_per_tick: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_frame_delta: 0.25,
            max_steps_per_tick: 15,
        }
    }
}

impl DriverConfig {
    /// Steps needed to cover a full `max_frame_delta` at step size `dt`.
    pub fn steps_for(&self, dt: f64) -> u32 {
        if !(dt.is_finite() && dt > 0.0) {
            return self.max_steps_per_tick;
        }
        // tolerance keeps 0.25 / (1/60) at 15 rather than 16
        let steps = (self.max_frame_delta.max(0.0) / dt - 1e-9).ceil();
        steps.clamp(1.0, u32::MAX as f64) as u32
    }

    /// Raise the step cap to [`steps_for`](Self::steps_for) `dt` if it is lower.
    pub fn fitted_to(mut self, dt: f64) -> Self {
        let needed = self.steps_for(dt);
        if needed > self.max_steps_per_tick {
            tracing::debug!(
                from = self.max_steps_per_tick,
                to = needed,
                dt,
                "raising step cap to fit step size"
            );
            self.max_steps_per_tick = needed;
        }
        self
    }
}

/// What one render tick did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    /// Simulation steps run this tick.
    pub steps: u32,
    /// Frame delta after clamping.
    pub frame_delta: f64,
    pub render_time: f64,
    pub sim_time: f64,
    /// Render time discarded because the step cap was hit.
    pub dropped: f64,
}

impl TickReport {
    pub fn hit_step_cap(&self) -> bool {
        self.dropped > 0.0
    }
}

/// Keeps simulation time at or ahead of render time, one fixed step at a time.
///
/// Render time advances by the (clamped) frame delta. The simulation is
/// stepped while it lags behind, up to `max_steps_per_tick`; any lag left
/// after that is dropped so the loop cannot spiral.
#[derive(Debug, Clone)]
pub struct FixedStepDriver {
    pub config: DriverConfig,
    render_time: f64,
    total_steps: u64,
    total_dropped: f64,
}

impl FixedStepDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            render_time: 0.0,
            total_steps: 0,
            total_dropped: 0.0,
        }
    }

    pub fn render_time(&self) -> f64 {
        self.render_time
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn total_dropped(&self) -> f64 {
        self.total_dropped
    }

    /// Advance render time by `frame_delta` and step `sim` until it catches up.
    pub fn tick<S: Stepper + ?Sized>(&mut self, frame_delta: f64, sim: &mut S) -> TickReport {
        let frame_delta = if frame_delta.is_finite() {
            frame_delta.clamp(0.0, self.config.max_frame_delta.max(0.0))
        } else {
            0.0
        };
        self.render_time += frame_delta;

        let mut steps = 0;
        while sim.time() < self.render_time && steps < self.config.max_steps_per_tick {
            let before = sim.time();
            sim.step();
            steps += 1;
            if sim.time() <= before {
                tracing::warn!(time = before, "simulation clock did not advance");
                break;
            }
        }
        self.total_steps += steps as u64;

        let mut dropped = 0.0;
        if sim.time() < self.render_time {
            dropped = self.render_time - sim.time();
            self.render_time = sim.time();
            self.total_dropped += dropped;
            tracing::warn!(
                steps,
                dropped_ms = dropped * 1000.0,
                "simulation fell behind, dropping render time"
            );
        }

        tracing::trace!(
            steps,
            render_time = self.render_time,
            sim_time = sim.time(),
            "driver tick"
        );

        TickReport {
            steps,
            frame_delta,
            render_time: self.render_time,
            sim_time: sim.time(),
            dropped,
        }
    }
}

impl Default for FixedStepDriver {
    fn default() -> Self {
        Self::new(DriverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Clock {
        dt: f64,
        time: f64,
        steps: u32,
    }

    impl Clock {
        fn new(dt: f64) -> Self {
            Self {
                dt,
                time: 0.0,
                steps: 0,
            }
        }
    }

    impl Stepper for Clock {
        fn time(&self) -> f64 {
            self.time
        }

        fn step(&mut self) {
            self.time += self.dt;
            self.steps += 1;
        }
    }

    #[test]
    fn steps_until_sim_leads_render() {
        let mut driver = FixedStepDriver::default();
        let mut clock = Clock::new(0.01);
        let report = driver.tick(0.035, &mut clock);
        assert_eq!(report.steps, 4);
        assert!(clock.time >= driver.render_time());
        assert!(!report.hit_step_cap());
    }

    #[test]
    fn no_step_when_sim_is_ahead() {
        let mut driver = FixedStepDriver::default();
        let mut clock = Clock::new(0.1);
        assert_eq!(driver.tick(0.01, &mut clock).steps, 1);
        assert_eq!(driver.tick(0.01, &mut clock).steps, 0);
    }

    #[test]
    fn long_frame_is_bounded() {
        let dt = 1.0 / 60.0;
        let mut driver = FixedStepDriver::default();
        let mut clock = Clock::new(dt);
        let report = driver.tick(0.5, &mut clock);
        assert!(report.steps as f64 <= (0.5_f64 / dt).ceil());
        assert!(report.steps <= driver.config.max_steps_per_tick);
        assert_eq!(report.frame_delta, 0.25);
    }

    #[test]
    fn step_cap_drops_remaining_lag() {
        let mut driver = FixedStepDriver::new(DriverConfig {
            max_frame_delta: 1.0,
            max_steps_per_tick: 8,
        });
        let mut clock = Clock::new(1.0 / 60.0);
        let report = driver.tick(0.5, &mut clock);
        assert_eq!(report.steps, 8);
        assert!(report.hit_step_cap());
        assert!((report.dropped - (0.5 - 8.0 / 60.0)).abs() < 1e-9);
        assert_eq!(driver.render_time(), clock.time);
        assert_eq!(clock.steps, 8);
    }

    #[test]
    fn cap_fits_small_step_size() {
        let config = DriverConfig::default();
        assert_eq!(config.steps_for(1.0 / 60.0), 15);
        assert_eq!(config.fitted_to(1.0 / 60.0), config);
        assert_eq!(config.fitted_to(f64::NAN), config);

        let fitted = config.fitted_to(0.001);
        assert!(fitted.max_steps_per_tick >= 250);

        let mut driver = FixedStepDriver::new(fitted);
        let mut clock = Clock::new(0.001);
        for _ in 0..60 {
            assert!(!driver.tick(1.0 / 60.0, &mut clock).hit_step_cap());
        }
        assert_eq!(driver.total_dropped(), 0.0);
        assert!(clock.time >= 1.0 - 1e-9);
    }

    #[test]
    fn stalled_clock_does_not_spin() {
        let mut driver = FixedStepDriver::default();
        let mut clock = Clock::new(0.0);
        let report = driver.tick(0.1, &mut clock);
        assert_eq!(report.steps, 1);
        assert!(report.hit_step_cap());
    }

    #[test]
    fn bad_deltas_are_ignored() {
        let mut driver = FixedStepDriver::default();
        let mut clock = Clock::new(0.01);
        assert_eq!(driver.tick(-1.0, &mut clock).steps, 0);
        assert_eq!(driver.tick(f64::NAN, &mut clock).steps, 0);
        assert_eq!(driver.render_time(), 0.0);
    }

    #[test]
    fn drives_a_simulation() {
        use boxfall_kernel::SimConfig;
        use boxfall_kernel::RapierBackend;

        let config = SimConfig::default();
        let mut sim = Simulation::new(RapierBackend::new(config.gravity), config);
        sim.init();
        let mut driver = FixedStepDriver::default();
        for _ in 0..60 {
            driver.tick(1.0 / 60.0, &mut sim);
        }
        assert!(sim.time() >= driver.render_time());
        assert!(sim.step_count() >= 59);
    }
}
