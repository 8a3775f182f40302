use boxfall_common::BoxShape;
use boxfall_input::OrbitConfig;
use boxfall_kernel::SimConfig;
use boxfall_render::DriverConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating a [`DemoConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything the demo can be tuned with. Missing fields take their defaults,
/// so `{}` is a valid config file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub sim: SimConfig,
    pub driver: DriverConfig,
    pub orbit: OrbitConfig,
}

impl DemoConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: DemoConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config: DemoConfig = serde_json::from_reader(std::fs::File::open(path)?)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), boxes = config.sim.boxes.len(), "config loaded");
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        serde_json::to_writer_pretty(std::fs::File::create(path)?, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !self.sim.gravity.is_finite() {
            return invalid(format!("gravity {:?} is not finite", self.sim.gravity));
        }
        if let Some(dt) = self.sim.step_dt {
            if !(dt.is_finite() && dt > 0.0) {
                return invalid(format!("step_dt must be positive, got {dt}"));
            }
        }
        for (i, spawn) in self.sim.boxes.iter().enumerate() {
            if !BoxShape::new(spawn.half_extents).is_valid() || !spawn.position.is_finite() {
                return invalid(format!("box {i} has invalid placement or extents"));
            }
        }

        if !(self.driver.max_frame_delta.is_finite() && self.driver.max_frame_delta > 0.0) {
            return invalid(format!(
                "max_frame_delta must be positive, got {}",
                self.driver.max_frame_delta
            ));
        }
        if self.driver.max_steps_per_tick == 0 {
            return invalid("max_steps_per_tick must be at least 1".into());
        }

        let orbit = &self.orbit;
        if !(orbit.transition_time.is_finite() && orbit.transition_time >= 0.0) {
            return invalid(format!("transition_time {} is negative", orbit.transition_time));
        }
        if !(orbit.min_distance > 0.0 && orbit.min_distance <= orbit.max_distance) {
            return invalid(format!(
                "distance range [{}, {}] is empty",
                orbit.min_distance, orbit.max_distance
            ));
        }
        if !(orbit.min_distance..=orbit.max_distance).contains(&orbit.initial_distance) {
            return invalid(format!(
                "initial_distance {} outside [{}, {}]",
                orbit.initial_distance, orbit.min_distance, orbit.max_distance
            ));
        }
        let p = &orbit.projection;
        if !(p.fov_degrees > 0.0 && p.fov_degrees < 180.0 && p.near > 0.0 && p.far > p.near) {
            return invalid("projection needs 0 < fov < 180 and 0 < near < far".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn empty_object_is_default() {
        let config = DemoConfig::from_json("{}").unwrap();
        assert_eq!(config, DemoConfig::default());
        assert_eq!(config.sim.boxes.len(), 3);
        assert_eq!(config.driver.max_steps_per_tick, 15);
        assert_eq!(config.orbit.transition_time, 0.25);
    }

    #[test]
    fn partial_override() {
        let config = DemoConfig::from_json(
            r#"{
                "sim": { "step_dt": 0.01, "boxes": [
                    { "position": [0.0, 5.0, 0.0], "half_extents": [0.25, 0.25, 0.25] }
                ] },
                "orbit": { "easing": "quadratic", "initial_distance": 6.0 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.sim.step_dt, Some(0.01));
        assert_eq!(config.sim.boxes[0].position, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(config.sim.gravity, Vec3::new(0.0, -9.81, 0.0));
        assert_eq!(config.orbit.initial_distance, 6.0);
        assert_eq!(config.orbit.orbit_sensitivity, 0.3);
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            r#"{ "driver": { "max_steps_per_tick": 0 } }"#,
            r#"{ "driver": { "max_frame_delta": -1.0 } }"#,
            r#"{ "sim": { "step_dt": 0.0 } }"#,
            r#"{ "sim": { "boxes": [ { "position": [0,0,0], "half_extents": [1,0,1] } ] } }"#,
            r#"{ "orbit": { "initial_distance": 0.0 } }"#,
            r#"{ "orbit": { "projection": { "near": 10.0, "far": 1.0 } } }"#,
        ];
        for case in cases {
            let err = DemoConfig::from_json(case).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{case}: {err}");
        }
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(DemoConfig::from_json("{ sim"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("demo.json");
        let mut config = DemoConfig::default();
        config.driver.max_steps_per_tick = 4;
        config.save(&path).unwrap();
        assert_eq!(DemoConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = DemoConfig::load(tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
