use boxfall_common::{BodyId, BoxShape, Pose};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::backend::PhysicsBackend;

/// Immutable record of every body's pose at one simulation step.
///
/// `bodies` is a BTreeMap so iteration order is stable across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldFrame {
    /// Simulation time at the end of the step, in seconds.
    pub time: f64,
    pub bodies: BTreeMap<BodyId, Pose>,
}

/// Shape family of a simulated body, used by the view to pick a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    Cuboid,
}

/// Notifications emitted by the simulation, drained by the view.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A body was created.
    Added {
        id: BodyId,
        kind: BodyKind,
        position: Vec3,
        shape: BoxShape,
    },
    /// A body was destroyed. It will not appear in later frames.
    Removed { id: BodyId },
    /// One step completed.
    Update(WorldFrame),
}

/// Errors from simulation operations.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("body {0} not found")]
    UnknownBody(BodyId),
    #[error("invalid box half extents {0:?}")]
    InvalidShape(Vec3),
    #[error("invalid box position {0:?}")]
    InvalidPosition(Vec3),
}

/// A box placed by the initial scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSpawn {
    pub position: Vec3,
    pub half_extents: Vec3,
}

/// Scene and physics settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub gravity: Vec3,
    /// Step size override in seconds. `None` keeps the backend default.
    pub step_dt: Option<f32>,
    /// Static ground slab centered at the origin.
    pub ground_half_extents: Vec3,
    /// Boxes spawned by `Simulation::init`.
    pub boxes: Vec<BoxSpawn>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            step_dt: None,
            ground_half_extents: Vec3::new(10.0, 0.1, 10.0),
            boxes: vec![
                BoxSpawn {
                    position: Vec3::new(0.0, 2.0, 0.0),
                    half_extents: Vec3::splat(0.5),
                },
                BoxSpawn {
                    position: Vec3::new(1.25, 4.0, -1.25),
                    half_extents: Vec3::ONE,
                },
                BoxSpawn {
                    position: Vec3::new(-1.25, 4.0, -1.25),
                    half_extents: Vec3::ONE,
                },
            ],
        }
    }
}

/// The simulated world: a physics backend, the bodies it tracks, and the
/// queue of events not yet consumed by the view.
pub struct Simulation<B: PhysicsBackend> {
    backend: B,
    config: SimConfig,
    time: f64,
    steps: u64,
    bodies: BTreeMap<BodyId, BoxShape>,
    events: Vec<SimEvent>,
}

impl<B: PhysicsBackend> Simulation<B> {
    /// Wrap a backend and lay down the static ground collider.
    pub fn new(mut backend: B, config: SimConfig) -> Self {
        let ground = BoxShape::new(config.ground_half_extents);
        if ground.is_valid() {
            backend.create_fixed_box(Vec3::ZERO, ground);
        } else {
            tracing::warn!(half_extents = ?config.ground_half_extents, "skipping invalid ground");
        }
        Self {
            backend,
            config,
            time: 0.0,
            steps: 0,
            bodies: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Spawn the configured scene boxes. Invalid entries are logged and skipped.
    pub fn init(&mut self) -> Vec<BodyId> {
        let spawns = self.config.boxes.clone();
        let mut ids = Vec::with_capacity(spawns.len());
        for spawn in spawns {
            match self.create_box(spawn.position, spawn.half_extents) {
                Ok(id) => ids.push(id),
                Err(e) => tracing::warn!("skipping scene box: {e}"),
            }
        }
        ids
    }

    /// Create a dynamic box and emit `Added`.
    pub fn create_box(&mut self, position: Vec3, half_extents: Vec3) -> Result<BodyId, SimError> {
        let shape = BoxShape::new(half_extents);
        if !shape.is_valid() {
            return Err(SimError::InvalidShape(half_extents));
        }
        if !position.is_finite() {
            return Err(SimError::InvalidPosition(position));
        }
        let id = self.backend.create_box_body(position, shape);
        self.bodies.insert(id, shape);
        self.events.push(SimEvent::Added {
            id,
            kind: BodyKind::Cuboid,
            position,
            shape,
        });
        tracing::debug!(%id, ?position, ?half_extents, "box added");
        Ok(id)
    }

    /// Destroy a box and emit `Removed`.
    pub fn remove_box(&mut self, id: BodyId) -> Result<(), SimError> {
        if self.bodies.remove(&id).is_none() {
            return Err(SimError::UnknownBody(id));
        }
        self.backend.remove_body(id);
        self.events.push(SimEvent::Removed { id });
        tracing::debug!(%id, "box removed");
        Ok(())
    }

    /// Advance the backend by one step and emit the resulting frame.
    /// Returns the new simulation time.
    pub fn step(&mut self) -> f64 {
        self.backend.step();
        self.time += self.backend.dt();
        self.steps += 1;

        let bodies: BTreeMap<BodyId, Pose> = self
            .bodies
            .keys()
            .filter_map(|id| self.backend.pose(*id).map(|pose| (*id, pose)))
            .collect();

        tracing::trace!(time = self.time, bodies = bodies.len(), "simulation step");
        self.events.push(SimEvent::Update(WorldFrame {
            time: self.time,
            bodies,
        }));
        self.time
    }

    /// Simulation time in seconds: the sum of every completed step's size.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step_count(&self) -> u64 {
        self.steps
    }

    pub fn dt(&self) -> f64 {
        self.backend.dt()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn bodies(&self) -> &BTreeMap<BodyId, BoxShape> {
        &self.bodies
    }

    pub fn pose(&self, id: BodyId) -> Option<Pose> {
        self.backend.pose(id)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Take every pending event, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Read-only access to pending events.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }
}
