use glam::Vec2;

use crate::event::{TouchEvent, TouchPhase, TouchPoint};
use crate::orbit::OrbitState;
use crate::projector::ScreenProjector;

/// Touch handling for the orbit camera: one finger orbits, two fingers
/// pinch-zoom and pan together.
///
/// Deltas come straight from consecutive events; smoothing happens only in
/// the orbit state.
#[derive(Debug, Clone)]
pub struct TouchController {
    pub orbit_sensitivity: f32,
    pub distance_sensitivity: f32,
    last_touch_point: Vec2,
    last_pinch_distance: f32,
    last_pinch_mid_point: Vec2,
}

fn pinch_distance(a: &TouchPoint, b: &TouchPoint) -> f32 {
    a.position().distance(b.position())
}

fn mid_point(a: &TouchPoint, b: &TouchPoint) -> Vec2 {
    (a.position() + b.position()) * 0.5
}

impl TouchController {
    pub fn new(orbit_sensitivity: f32, distance_sensitivity: f32) -> Self {
        Self {
            orbit_sensitivity,
            distance_sensitivity,
            last_touch_point: Vec2::ZERO,
            last_pinch_distance: 0.0,
            last_pinch_mid_point: Vec2::ZERO,
        }
    }

    pub fn last_touch_point(&self) -> Vec2 {
        self.last_touch_point
    }

    pub fn last_pinch_distance(&self) -> f32 {
        self.last_pinch_distance
    }

    pub fn last_pinch_mid_point(&self) -> Vec2 {
        self.last_pinch_mid_point
    }

    pub fn handle(
        &mut self,
        event: &TouchEvent,
        state: &mut OrbitState,
        projector: &dyn ScreenProjector,
    ) {
        match event.phase {
            TouchPhase::Start | TouchPhase::End | TouchPhase::Cancel => self.reset(&event.touches),
            TouchPhase::Move => self.moved(&event.touches, state, projector),
        }
    }

    // A change in the number of contacts restarts delta tracking from the
    // contacts that remain.
    fn reset(&mut self, touches: &[TouchPoint]) {
        match touches {
            [only] => self.last_touch_point = only.position(),
            [a, b] => {
                self.last_pinch_distance = pinch_distance(a, b);
                self.last_pinch_mid_point = mid_point(a, b);
            }
            _ => {}
        }
    }

    fn moved(&mut self, touches: &[TouchPoint], state: &mut OrbitState, projector: &dyn ScreenProjector) {
        match touches {
            [only] => {
                let point = only.position();
                state.orbit(point - self.last_touch_point, self.orbit_sensitivity);
                self.last_touch_point = point;
            }
            [a, b] => {
                let distance = pinch_distance(a, b);
                let delta = distance - self.last_pinch_distance;
                self.last_pinch_distance = distance;
                state.zoom(delta * self.distance_sensitivity * 0.1 * 0.1);

                let mid = mid_point(a, b);
                let depth = state.azim_elev_distance.target().z;
                state.pan(mid, self.last_pinch_mid_point, depth, projector);
                self.last_pinch_mid_point = mid;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::OrbitConfig;
    use glam::Vec3;

    struct Flat;

    impl ScreenProjector for Flat {
        fn screen_to_world(&self, x: f32, y: f32, _depth: f32) -> Vec3 {
            Vec3::new(x, -y, 0.0)
        }
    }

    fn setup() -> (TouchController, OrbitState) {
        let config = OrbitConfig::default();
        (
            TouchController::new(config.orbit_sensitivity, config.distance_sensitivity),
            OrbitState::new(&config),
        )
    }

    fn ev(phase: TouchPhase, points: &[(f32, f32)]) -> TouchEvent {
        TouchEvent::new(
            phase,
            points
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| TouchPoint::new(i as u64, x, y))
                .collect(),
        )
    }

    #[test]
    fn single_finger_orbits_from_last_point() {
        let (mut t, mut s) = setup();
        t.handle(&ev(TouchPhase::Start, &[(100.0, 100.0)]), &mut s, &Flat);
        t.handle(&ev(TouchPhase::Move, &[(110.0, 90.0)]), &mut s, &Flat);
        let aed = *s.azim_elev_distance.target();
        assert!((aed.x + 3.0).abs() < 1e-5);
        assert!((aed.y - 3.0).abs() < 1e-5);
        assert_eq!(t.last_touch_point(), Vec2::new(110.0, 90.0));
    }

    #[test]
    fn pinch_out_zooms_in() {
        let (mut t, mut s) = setup();
        t.handle(&ev(TouchPhase::Start, &[(100.0, 100.0), (200.0, 100.0)]), &mut s, &Flat);
        assert_eq!(t.last_pinch_distance(), 100.0);
        assert_eq!(t.last_pinch_mid_point(), Vec2::new(150.0, 100.0));

        t.handle(&ev(TouchPhase::Move, &[(50.0, 100.0), (250.0, 100.0)]), &mut s, &Flat);
        // 100 px spread: z -= 100 * 0.4 * 0.1 * (2 * 0.1)
        assert!((s.azim_elev_distance.target().z - 1.2).abs() < 1e-5);
        assert_eq!(t.last_pinch_distance(), 200.0);
        // Midpoint unchanged, so no pan.
        assert!(s.focal_point.target().abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn two_finger_drag_pans() {
        let (mut t, mut s) = setup();
        t.handle(&ev(TouchPhase::Start, &[(100.0, 100.0), (200.0, 100.0)]), &mut s, &Flat);
        t.handle(&ev(TouchPhase::Move, &[(100.0, 120.0), (200.0, 120.0)]), &mut s, &Flat);
        assert!(s.focal_point.target().abs_diff_eq(Vec3::new(0.0, 20.0, 0.0), 1e-5));
        assert_eq!(t.last_pinch_mid_point(), Vec2::new(150.0, 120.0));
        assert_eq!(s.azim_elev_distance.target().z, 2.0);
    }

    #[test]
    fn lifting_a_finger_rebases_single_touch() {
        let (mut t, mut s) = setup();
        t.handle(&ev(TouchPhase::Start, &[(0.0, 0.0), (50.0, 0.0)]), &mut s, &Flat);
        t.handle(&ev(TouchPhase::End, &[(300.0, 300.0)]), &mut s, &Flat);
        t.handle(&ev(TouchPhase::Move, &[(300.0, 300.0)]), &mut s, &Flat);
        assert_eq!(*s.azim_elev_distance.target(), Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn three_fingers_are_ignored() {
        let (mut t, mut s) = setup();
        let three = [(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)];
        t.handle(&ev(TouchPhase::Start, &three), &mut s, &Flat);
        t.handle(&ev(TouchPhase::Move, &three), &mut s, &Flat);
        assert_eq!(*s.azim_elev_distance.target(), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(*s.focal_point.target(), Vec3::ZERO);
    }
}
