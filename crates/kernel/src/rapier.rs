//! `rapier3d` implementation of [`PhysicsBackend`].
//!
//! We own the pipeline and every set it steps, and translate handles and
//! nalgebra types into `BodyId` and glam at this boundary.

use boxfall_common::{BodyId, BoxShape, Pose};
use glam::{Quat, Vec3};
use rapier3d::prelude::*;

use crate::backend::PhysicsBackend;

pub struct RapierBackend {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl RapierBackend {
    /// Create an empty world with the given gravity and rapier's default
    /// integration parameters (60 Hz).
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: vector![gravity.x, gravity.y, gravity.z],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Override the step size. Non-positive or non-finite values are ignored.
    pub fn with_dt(mut self, dt: f32) -> Self {
        if dt.is_finite() && dt > 0.0 {
            self.integration_parameters.dt = dt;
        }
        self
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    fn handle(id: BodyId) -> RigidBodyHandle {
        RigidBodyHandle::from_raw_parts(id.index(), id.generation())
    }
}

impl PhysicsBackend for RapierBackend {
    fn dt(&self) -> f64 {
        self.integration_parameters.dt as f64
    }

    fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    fn create_box_body(&mut self, position: Vec3, shape: BoxShape) -> BodyId {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position.x, position.y, position.z])
            .build();
        let handle = self.bodies.insert(body);
        let h = shape.half_extents;
        let collider = ColliderBuilder::cuboid(h.x, h.y, h.z).build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        let (index, generation) = handle.into_raw_parts();
        BodyId::from_parts(index, generation)
    }

    fn create_fixed_box(&mut self, position: Vec3, shape: BoxShape) {
        let h = shape.half_extents;
        let collider = ColliderBuilder::cuboid(h.x, h.y, h.z)
            .translation(vector![position.x, position.y, position.z])
            .build();
        self.colliders.insert(collider);
    }

    fn remove_body(&mut self, id: BodyId) -> bool {
        self.bodies
            .remove(
                Self::handle(id),
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    fn pose(&self, id: BodyId) -> Option<Pose> {
        let body = self.bodies.get(Self::handle(id))?;
        let t = body.translation();
        let r = body.rotation();
        Some(Pose::new(
            Vec3::new(t.x, t.y, t.z),
            Quat::from_xyzw(r.i, r.j, r.k, r.w),
        ))
    }
}
