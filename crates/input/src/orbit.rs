use boxfall_smooth::{Easing, SmoothedValue};
use glam::{EulerRot, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::bus::{InputBus, Subscription};
use crate::event::{InputEvent, MouseEvent, TouchEvent};
use crate::mouse::MouseController;
use crate::projector::{CameraView, Projection, ScreenProjector};
use crate::touch::TouchController;

/// Orbit camera tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    /// Seconds for a smoothed value to reach a new target.
    pub transition_time: f32,
    pub easing: Easing,
    /// Degrees of orbit per pixel of drag.
    pub orbit_sensitivity: f32,
    pub distance_sensitivity: f32,
    pub initial_focal_point: Vec3,
    pub initial_distance: f32,
    /// Zoom never brings the target distance outside this range.
    pub min_distance: f32,
    pub max_distance: f32,
    pub projection: Projection,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            transition_time: 0.25,
            easing: Easing::Quintic,
            orbit_sensitivity: 0.3,
            distance_sensitivity: 0.4,
            initial_focal_point: Vec3::ZERO,
            initial_distance: 2.0,
            min_distance: 0.01,
            max_distance: 10_000.0,
            projection: Projection::default(),
        }
    }
}

/// Camera placement produced by [`OrbitController::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    /// Point the camera orbits and looks at.
    pub focal_point: Vec3,
    /// Unit vector from the focal point toward the camera.
    pub forward: Vec3,
    /// (elevation, azimuth, 0) in degrees, un-negated. Not the angles of
    /// `rotation`; renderers should use `rotation`.
    pub euler_degrees: Vec3,
    /// Look rotation: the camera's -Z axis points at the focal point.
    pub rotation: Quat,
}

/// Direction from the focal point to the camera for the given azimuth and
/// elevation, in degrees.
///
/// Azimuth = elevation = 0 gives +Z; elevation = 90 gives +Y.
pub fn forward_vector(azimuth_deg: f32, elevation_deg: f32) -> Vec3 {
    let (sa, ca) = azimuth_deg.to_radians().sin_cos();
    let (se, ce) = elevation_deg.to_radians().sin_cos();
    Vec3::new(-ce * sa, se, ce * ca)
}

/// Inverse of [`forward_vector`] scaled by distance: (azimuth°, elevation°, distance).
pub fn vec_to_azim_elev_distance(v: Vec3) -> Vec3 {
    let distance = v.length();
    if distance <= f32::EPSILON {
        return Vec3::ZERO;
    }
    let azim = (-v.x).atan2(v.z).to_degrees();
    let elev = (v.y / distance).clamp(-1.0, 1.0).asin().to_degrees();
    Vec3::new(azim, elev, distance)
}

/// The two smoothed quantities every input handler writes into.
#[derive(Debug, Clone)]
pub struct OrbitState {
    pub focal_point: SmoothedValue<Vec3>,
    /// x = azimuth (deg), y = elevation (deg), z = distance.
    pub azim_elev_distance: SmoothedValue<Vec3>,
    min_distance: f32,
    max_distance: f32,
}

impl OrbitState {
    pub fn new(config: &OrbitConfig) -> Self {
        let aed = Vec3::new(0.0, 0.0, config.initial_distance);
        Self {
            focal_point: SmoothedValue::with_easing(
                config.initial_focal_point,
                config.transition_time,
                config.easing,
            ),
            azim_elev_distance: SmoothedValue::with_easing(
                aed,
                config.transition_time,
                config.easing,
            ),
            min_distance: config.min_distance,
            max_distance: config.max_distance,
        }
    }

    /// Orbit by a screen-space drag. Dragging right or down decreases the
    /// azimuth or elevation target.
    pub fn orbit(&mut self, delta: Vec2, sensitivity: f32) {
        let mut aed = *self.azim_elev_distance.target();
        aed.x -= delta.x * sensitivity;
        aed.y -= delta.y * sensitivity;
        self.azim_elev_distance.goto(aed);
    }

    /// Change the target distance by `amount`, expressed as a fraction of the
    /// current target distance.
    pub fn zoom(&mut self, amount: f32) {
        let mut aed = *self.azim_elev_distance.target();
        aed.z -= amount * aed.z;
        // NaN or inverted limits from hand-built configs must not panic
        aed.z = aed.z.max(self.min_distance).min(self.max_distance);
        self.azim_elev_distance.goto(aed);
    }

    /// Move the focal target by `world(to) - world(from)`, both screen points
    /// unprojected at `depth`. Passing the current pointer as `from` and the
    /// previous one as `to` drags the scene along with the pointer.
    pub fn pan(&mut self, from: Vec2, to: Vec2, depth: f32, projector: &dyn ScreenProjector) {
        let from_world = projector.screen_to_world(from.x, from.y, depth);
        let to_world = projector.screen_to_world(to.x, to.y, depth);
        let target = *self.focal_point.target() + (to_world - from_world);
        self.focal_point.goto(target);
    }

    pub fn update(&mut self, dt: f32) {
        self.focal_point.update(dt);
        self.azim_elev_distance.update(dt);
    }
}

/// Orbit camera driven by mouse and touch input.
#[derive(Debug, Clone)]
pub struct OrbitController {
    config: OrbitConfig,
    state: OrbitState,
    mouse: MouseController,
    touch: TouchController,
    pose: CameraPose,
}

impl OrbitController {
    pub fn new(config: OrbitConfig) -> Self {
        let state = OrbitState::new(&config);
        let mut controller = Self {
            mouse: MouseController::new(config.orbit_sensitivity, config.distance_sensitivity),
            touch: TouchController::new(config.orbit_sensitivity, config.distance_sensitivity),
            state,
            config,
            pose: CameraPose {
                position: Vec3::ZERO,
                focal_point: Vec3::ZERO,
                forward: Vec3::Z,
                euler_degrees: Vec3::ZERO,
                rotation: Quat::IDENTITY,
            },
        };
        controller.pose = controller.compute_pose();
        controller
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn state(&self) -> &OrbitState {
        &self.state
    }

    pub fn focal_point(&self) -> &SmoothedValue<Vec3> {
        &self.state.focal_point
    }

    pub fn focal_point_mut(&mut self) -> &mut SmoothedValue<Vec3> {
        &mut self.state.focal_point
    }

    pub fn azim_elev_distance(&self) -> &SmoothedValue<Vec3> {
        &self.state.azim_elev_distance
    }

    pub fn azim_elev_distance_mut(&mut self) -> &mut SmoothedValue<Vec3> {
        &mut self.state.azim_elev_distance
    }

    pub fn mouse(&self) -> &MouseController {
        &self.mouse
    }

    pub fn touch(&self) -> &TouchController {
        &self.touch
    }

    /// Pose computed by the last `update`.
    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    /// Ease the camera toward `eye`, keeping the current focal target.
    /// An eye on the focal point leaves the orbit untouched.
    pub fn look_from(&mut self, eye: Vec3) {
        let offset = eye - *self.state.focal_point.target();
        let aed = vec_to_azim_elev_distance(offset);
        if aed.z <= 0.0 {
            return;
        }
        let distance = aed.z.max(self.config.min_distance).min(self.config.max_distance);
        self.state.azim_elev_distance.goto(Vec3::new(aed.x, aed.y, distance));
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.config.projection.viewport = Vec2::new(width, height);
    }

    /// The camera as placed by the last `update`, for unprojection and drawing.
    pub fn camera_view(&self) -> CameraView {
        CameraView {
            position: self.pose.position,
            rotation: self.pose.rotation,
            projection: self.config.projection,
        }
    }

    pub fn handle_mouse(&mut self, event: &MouseEvent) {
        let view = self.camera_view();
        self.mouse.handle(event, &mut self.state, &view);
    }

    pub fn handle_touch(&mut self, event: &TouchEvent) {
        let view = self.camera_view();
        self.touch.handle(event, &mut self.state, &view);
    }

    /// Route an event using a caller-supplied projector instead of the
    /// controller's own camera.
    pub fn handle_with(&mut self, event: &InputEvent, projector: &dyn ScreenProjector) {
        match event {
            InputEvent::Mouse(e) => self.mouse.handle(e, &mut self.state, projector),
            InputEvent::Touch(e) => self.touch.handle(e, &mut self.state, projector),
        }
    }

    pub fn handle(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Mouse(e) => self.handle_mouse(e),
            InputEvent::Touch(e) => self.handle_touch(e),
        }
    }

    /// Advance smoothing by `dt` seconds and recompute the camera pose.
    pub fn update(&mut self, dt: f32) -> CameraPose {
        self.state.update(dt);
        self.pose = self.compute_pose();
        self.pose
    }

    fn compute_pose(&self) -> CameraPose {
        let aed = *self.state.azim_elev_distance.value();
        let focal_point = *self.state.focal_point.value();
        let forward = forward_vector(aed.x, aed.y);
        CameraPose {
            position: focal_point + forward * aed.z,
            focal_point,
            forward,
            euler_degrees: Vec3::new(aed.y, aed.x, 0.0),
            rotation: Quat::from_euler(
                EulerRot::YXZ,
                (-aed.x).to_radians(),
                (-aed.y).to_radians(),
                0.0,
            ),
        }
    }

    /// Register mouse and touch listeners for a shared controller on `bus`.
    pub fn bind(controller: &Rc<RefCell<OrbitController>>, bus: &InputBus) -> OrbitBinding {
        let weak = Rc::downgrade(controller);
        let mouse = bus.subscribe(move |event| {
            let (InputEvent::Mouse(e), Some(c)) = (event, weak.upgrade()) else {
                return;
            };
            match c.try_borrow_mut() {
                Ok(mut c) => c.handle_mouse(e),
                Err(_) => tracing::warn!("orbit controller busy, mouse event dropped"),
            }
        });
        let weak = Rc::downgrade(controller);
        let touch = bus.subscribe(move |event| {
            let (InputEvent::Touch(e), Some(c)) = (event, weak.upgrade()) else {
                return;
            };
            match c.try_borrow_mut() {
                Ok(mut c) => c.handle_touch(e),
                Err(_) => tracing::warn!("orbit controller busy, touch event dropped"),
            }
        });
        OrbitBinding { mouse, touch }
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(OrbitConfig::default())
    }
}

/// Input listeners of a bound [`OrbitController`]. Dropping it unregisters
/// both.
#[derive(Debug)]
pub struct OrbitBinding {
    mouse: Subscription,
    touch: Subscription,
}

impl OrbitBinding {
    /// Unregister every listener.
    pub fn destroy(self) {
        let OrbitBinding { mouse, touch } = self;
        mouse.unsubscribe();
        touch.unsubscribe();
    }
}
