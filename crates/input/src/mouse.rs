use glam::Vec2;

use crate::event::{MouseButton, MouseEvent};
use crate::orbit::OrbitState;
use crate::projector::ScreenProjector;

/// Mouse handling for the orbit camera: left drag orbits, middle or right
/// drag pans, the wheel zooms.
#[derive(Debug, Clone)]
pub struct MouseController {
    pub orbit_sensitivity: f32,
    pub distance_sensitivity: f32,
    look_down: bool,
    pan_down: bool,
    last_point: Vec2,
}

impl MouseController {
    pub fn new(orbit_sensitivity: f32, distance_sensitivity: f32) -> Self {
        Self {
            orbit_sensitivity,
            distance_sensitivity,
            look_down: false,
            pan_down: false,
            last_point: Vec2::ZERO,
        }
    }

    pub fn is_looking(&self) -> bool {
        self.look_down
    }

    pub fn is_panning(&self) -> bool {
        self.pan_down
    }

    pub fn last_point(&self) -> Vec2 {
        self.last_point
    }

    pub fn handle(
        &mut self,
        event: &MouseEvent,
        state: &mut OrbitState,
        projector: &dyn ScreenProjector,
    ) {
        match *event {
            MouseEvent::Down { button, .. } => self.set_button(button, true),
            MouseEvent::Up { button, .. } => self.set_button(button, false),
            MouseEvent::Move { x, y, dx, dy } => {
                let point = Vec2::new(x, y);
                if self.look_down {
                    state.orbit(Vec2::new(dx, dy), self.orbit_sensitivity);
                } else if self.pan_down {
                    let depth = state.azim_elev_distance.value().z;
                    state.pan(point, self.last_point, depth, projector);
                }
                self.last_point = point;
            }
            MouseEvent::Wheel { delta } => {
                state.zoom(delta * -2.0 * self.distance_sensitivity * 0.1);
            }
            MouseEvent::Leave => {
                self.look_down = false;
                self.pan_down = false;
            }
        }
    }

    fn set_button(&mut self, button: MouseButton, down: bool) {
        match button {
            MouseButton::Left => self.look_down = down,
            MouseButton::Middle | MouseButton::Right => self.pan_down = down,
            MouseButton::Other(_) => {}
        }
    }
}
