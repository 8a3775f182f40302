use boxfall_common::BodyId;
use boxfall_input::{CameraPose, CameraView, InputBus, OrbitBinding, OrbitController};
use boxfall_kernel::{PhysicsBackend, SimError, SimEvent, Simulation};
use boxfall_render::{FixedStepDriver, FrameBuffer, RenderView, Renderable, VisualRegistry};
use glam::Vec3;
use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::config::DemoConfig;

/// Focal point the camera starts on, roughly the middle of the box stack.
pub const INITIAL_FOCAL_POINT: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Summary of one [`View::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Index of this frame, starting at 1.
    pub frame: u64,
    pub steps: u32,
    pub render_time: f64,
    pub sim_time: f64,
    /// Render time discarded because the step cap was hit.
    pub dropped: f64,
    /// Blend factor used this frame, `None` until two snapshots exist.
    pub fraction: Option<f64>,
    pub bodies: usize,
    pub camera: CameraPose,
}

/// The demo's frame loop: owns the simulation and everything that turns its
/// snapshots into something drawable.
pub struct View<B: PhysicsBackend> {
    sim: Simulation<B>,
    driver: FixedStepDriver,
    frames: FrameBuffer,
    registry: VisualRegistry<Renderable>,
    orbit: Rc<RefCell<OrbitController>>,
    frame: u64,
}

#[cfg(feature = "rapier")]
impl View<boxfall_kernel::RapierBackend> {
    /// Build the demo on the rapier backend, honoring `sim.gravity` and
    /// `sim.step_dt`.
    pub fn with_rapier(config: DemoConfig) -> Self {
        let mut backend = boxfall_kernel::RapierBackend::new(config.sim.gravity);
        if let Some(dt) = config.sim.step_dt {
            backend = backend.with_dt(dt);
        }
        Self::new(backend, config)
    }
}

impl<B: PhysicsBackend> View<B> {
    /// Create the simulation, spawn the configured scene and register a visual
    /// for every box.
    pub fn new(backend: B, config: DemoConfig) -> Self {
        let DemoConfig { sim, driver, orbit } = config;
        let mut sim = Simulation::new(backend, sim);
        let spawned = sim.init();

        let mut orbit = OrbitController::new(orbit);
        orbit.focal_point_mut().snapto(INITIAL_FOCAL_POINT);
        orbit.update(0.0);

        let driver = FixedStepDriver::new(driver.fitted_to(sim.dt()));
        let mut view = Self {
            sim,
            driver,
            frames: FrameBuffer::new(),
            registry: VisualRegistry::new(),
            orbit: Rc::new(RefCell::new(orbit)),
            frame: 0,
        };
        view.drain_events();
        tracing::info!(bodies = spawned.len(), dt = view.sim.dt(), "view ready");
        view
    }

    /// Run one render frame `frame_delta` seconds after the previous one.
    pub fn tick(&mut self, frame_delta: f64) -> FrameStats {
        self.frame += 1;
        let _span = tracing::info_span!("view_tick", frame = self.frame).entered();

        let report = self.driver.tick(frame_delta, &mut self.sim);
        self.drain_events();

        for id in self.frames.vanished() {
            if self.registry.on_removed(id).is_some() {
                tracing::debug!(%id, "pruned body missing from latest frame");
            }
        }

        let fraction = match self.frames.resolve(self.driver.render_time()) {
            Some(interpolated) => {
                self.registry.apply(&interpolated.poses);
                Some(interpolated.fraction)
            }
            None => {
                if let Some(current) = self.frames.current() {
                    self.registry.apply(&current.bodies);
                }
                None
            }
        };

        let camera = self.orbit.borrow_mut().update(report.frame_delta as f32);

        FrameStats {
            frame: self.frame,
            steps: report.steps,
            render_time: report.render_time,
            sim_time: report.sim_time,
            dropped: report.dropped,
            fraction,
            bodies: self.registry.len(),
            camera,
        }
    }

    fn drain_events(&mut self) {
        for event in self.sim.drain_events() {
            match event {
                SimEvent::Added { id, position, shape, .. } => {
                    self.registry.on_added(id, shape, position, Renderable::for_body(id));
                }
                SimEvent::Removed { id } => {
                    self.registry.on_removed(id);
                }
                SimEvent::Update(frame) => self.frames.push(frame),
            }
        }
    }

    /// Spawn a box now. Its visual appears immediately and starts moving on
    /// the next tick.
    pub fn spawn_box(&mut self, position: Vec3, half_extents: Vec3) -> Result<BodyId, SimError> {
        let id = self.sim.create_box(position, half_extents)?;
        self.drain_events();
        Ok(id)
    }

    pub fn remove_box(&mut self, id: BodyId) -> Result<(), SimError> {
        self.sim.remove_box(id)?;
        self.drain_events();
        Ok(())
    }

    /// Register the orbit camera on `bus`. Input stops when the binding is
    /// dropped or destroyed.
    pub fn bind_input(&self, bus: &InputBus) -> OrbitBinding {
        OrbitController::bind(&self.orbit, bus)
    }

    pub fn set_viewport(&self, width: f32, height: f32) {
        self.orbit.borrow_mut().set_viewport(width, height);
    }

    pub fn camera(&self) -> CameraPose {
        self.orbit.borrow().pose()
    }

    pub fn camera_view(&self) -> CameraView {
        self.orbit.borrow().camera_view()
    }

    /// View description for renderers that only need eye, target and lens.
    pub fn render_view(&self) -> RenderView {
        let orbit = self.orbit.borrow();
        let pose = orbit.pose();
        RenderView {
            eye: pose.position,
            target: pose.focal_point,
            fov_degrees: orbit.config().projection.fov_degrees,
        }
    }

    pub fn orbit(&self) -> Ref<'_, OrbitController> {
        self.orbit.borrow()
    }

    pub fn orbit_handle(&self) -> Rc<RefCell<OrbitController>> {
        Rc::clone(&self.orbit)
    }

    pub fn registry(&self) -> &VisualRegistry<Renderable> {
        &self.registry
    }

    pub fn frames(&self) -> &FrameBuffer {
        &self.frames
    }

    pub fn driver(&self) -> &FixedStepDriver {
        &self.driver
    }

    pub fn simulation(&self) -> &Simulation<B> {
        &self.sim
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxfall_common::{BoxShape, Pose};
    use boxfall_input::MouseEvent;
    use boxfall_kernel::{BoxSpawn, SimConfig};
    use boxfall_render::{DebugTextRenderer, Renderer};
    use std::collections::{BTreeMap, BTreeSet};

    /// Backend whose bodies stand still and can be hidden from the frames
    /// without being removed from the simulation.
    #[derive(Default)]
    struct HidingBackend {
        next: u32,
        poses: BTreeMap<BodyId, Pose>,
        hidden: Rc<RefCell<BTreeSet<BodyId>>>,
    }

    impl PhysicsBackend for HidingBackend {
        fn dt(&self) -> f64 {
            1.0 / 60.0
        }

        fn step(&mut self) {}

        fn create_box_body(&mut self, position: Vec3, _shape: BoxShape) -> BodyId {
            let id = BodyId::from_parts(self.next, 0);
            self.next += 1;
            self.poses.insert(id, Pose::from_position(position));
            id
        }

        fn create_fixed_box(&mut self, _position: Vec3, _shape: BoxShape) {}

        fn remove_body(&mut self, id: BodyId) -> bool {
            self.poses.remove(&id).is_some()
        }

        fn pose(&self, id: BodyId) -> Option<Pose> {
            if self.hidden.borrow().contains(&id) {
                return None;
            }
            self.poses.get(&id).copied()
        }
    }

    const FRAME: f64 = 1.0 / 60.0;

    #[cfg(feature = "rapier")]
    fn single_box() -> DemoConfig {
        DemoConfig {
            sim: SimConfig {
                boxes: vec![BoxSpawn {
                    position: Vec3::new(0.0, 3.0, 0.0),
                    half_extents: Vec3::splat(0.5),
                }],
                ..SimConfig::default()
            },
            ..DemoConfig::default()
        }
    }

    #[test]
    fn body_missing_from_frames_is_pruned() {
        let backend = HidingBackend::default();
        let hidden = Rc::clone(&backend.hidden);
        let mut view = View::new(backend, DemoConfig::default());
        view.tick(FRAME);
        view.tick(FRAME);
        assert_eq!(view.registry().len(), 3);

        let id = *view.simulation().bodies().keys().next().unwrap();
        hidden.borrow_mut().insert(id);
        view.tick(FRAME);
        assert!(!view.registry().contains(id));
        assert!(view.simulation().bodies().contains_key(&id));
        assert_eq!(view.registry().len(), 2);
    }

    #[cfg(feature = "rapier")]
    #[test]
    fn small_rapier_step_is_not_throttled() {
        let mut config = DemoConfig::default();
        config.sim.step_dt = Some(0.001);
        let mut view = View::with_rapier(config);
        for _ in 0..60 {
            view.tick(FRAME);
        }
        assert_eq!(view.driver().total_dropped(), 0.0);
        assert!(view.driver().config.max_steps_per_tick >= 250);
        assert!(view.simulation().time() >= 1.0 - 1e-6);
    }

    #[cfg(feature = "rapier")]
    #[test]
    fn construction_registers_scene_and_centers_camera() {
        let view = View::with_rapier(DemoConfig::default());
        assert_eq!(view.registry().len(), 3);
        assert_eq!(*view.orbit().focal_point().value(), INITIAL_FOCAL_POINT);
        let rv = view.render_view();
        assert!(rv.eye.abs_diff_eq(Vec3::new(0.0, 1.0, 2.0), 1e-6));
        assert_eq!(rv.target, INITIAL_FOCAL_POINT);
        assert_eq!(rv.fov_degrees, 75.0);
    }

    #[cfg(feature = "rapier")]
    #[test]
    fn ticking_drops_boxes() {
        let mut view = View::with_rapier(single_box());
        let id = *view.simulation().bodies().keys().next().unwrap();
        for _ in 0..30 {
            view.tick(FRAME);
        }
        let y = view.registry().get(id).unwrap().pose.position.y;
        assert!(y < 3.0, "box did not fall: {y}");
        assert!(view.frames().len() == 2);
    }

    #[cfg(feature = "rapier")]
    #[test]
    fn interpolated_pose_sits_between_snapshots() {
        let mut view = View::with_rapier(single_box());
        let id = *view.simulation().bodies().keys().next().unwrap();
        for _ in 0..20 {
            view.tick(FRAME * 0.5);
        }
        let prev = view.frames().previous().unwrap().bodies[&id].position.y;
        let curr = view.frames().current().unwrap().bodies[&id].position.y;
        let shown = view.registry().get(id).unwrap().pose.position.y;
        let (lo, hi) = if prev < curr { (prev, curr) } else { (curr, prev) };
        assert!(shown >= lo - 1e-5 && shown <= hi + 1e-5, "{lo} <= {shown} <= {hi}");
    }

    #[cfg(feature = "rapier")]
    #[test]
    fn long_frame_is_bounded() {
        let mut view = View::with_rapier(DemoConfig::default());
        let stats = view.tick(0.5);
        assert!(stats.steps <= 15);
        assert!(stats.dropped >= 0.0);
        assert!(stats.render_time <= stats.sim_time + 1e-9);
        assert_eq!(stats.bodies, 3);
    }

    #[cfg(feature = "rapier")]
    #[test]
    fn removed_box_leaves_registry() {
        let mut view = View::with_rapier(DemoConfig::default());
        view.tick(FRAME);
        let id = *view.simulation().bodies().keys().next().unwrap();
        view.remove_box(id).unwrap();
        assert!(!view.registry().contains(id));
        view.tick(FRAME);
        view.tick(FRAME);
        assert!(!view.registry().contains(id));
        assert_eq!(view.registry().len(), 2);
        assert!(matches!(view.remove_box(id), Err(SimError::UnknownBody(_))));
    }

    #[cfg(feature = "rapier")]
    #[test]
    fn spawned_box_is_drawn_at_spawn_point_first() {
        let mut view = View::with_rapier(single_box());
        view.tick(FRAME);
        let id = view
            .spawn_box(Vec3::new(2.0, 5.0, 0.0), Vec3::splat(0.25))
            .unwrap();
        assert_eq!(
            view.registry().get(id).unwrap().pose.position,
            Vec3::new(2.0, 5.0, 0.0)
        );
        view.tick(FRAME);
        assert!(view.registry().contains(id));
    }

    #[cfg(feature = "rapier")]
    #[test]
    fn bound_input_moves_camera() {
        let mut view = View::with_rapier(DemoConfig::default());
        let bus = InputBus::new();
        let binding = view.bind_input(&bus);
        bus.dispatch(&MouseEvent::Wheel { delta: 2.0 }.into());
        for _ in 0..30 {
            view.tick(FRAME);
        }
        let d = view.orbit().azim_elev_distance().value().z;
        assert!(d > 2.0);
        binding.destroy();
        bus.dispatch(&MouseEvent::Wheel { delta: 2.0 }.into());
        assert_eq!(view.orbit().azim_elev_distance().target().z, d);
    }

    #[cfg(feature = "rapier")]
    #[test]
    fn debug_render_lists_boxes() {
        let mut view = View::with_rapier(DemoConfig::default());
        view.tick(FRAME);
        let text = DebugTextRenderer::new().render(view.registry(), &view.render_view());
        assert!(text.contains("3 bodies"));
        assert!(text.contains("[physics-"));
    }
}
