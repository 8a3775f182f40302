use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Screen-to-world unprojection, normally provided by the host renderer.
pub trait ScreenProjector {
    /// World-space point `depth` units from the camera along the ray through
    /// pixel (x, y). Pixel origin is top-left, y grows downward.
    fn screen_to_world(&self, x: f32, y: f32, depth: f32) -> Vec3;
}

/// Perspective lens and viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projection {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Viewport size in pixels.
    pub viewport: Vec2,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            viewport: Vec2::new(1280.0, 720.0),
        }
    }
}

impl Projection {
    pub fn aspect(&self) -> f32 {
        self.viewport.x.max(1.0) / self.viewport.y.max(1.0)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect(), self.near, self.far)
    }
}

/// A camera placed in the world, usable as a [`ScreenProjector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub rotation: Quat,
    pub projection: Projection,
}

impl CameraView {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection.matrix() * self.view_matrix()
    }
}

impl ScreenProjector for CameraView {
    fn screen_to_world(&self, x: f32, y: f32, depth: f32) -> Vec3 {
        let size = self.projection.viewport.max(Vec2::ONE);
        let ndc_x = x / size.x * 2.0 - 1.0;
        let ndc_y = 1.0 - y / size.y * 2.0;

        let inv = self.view_projection().inverse();
        let near = inv.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        let dir = (far - near).normalize_or_zero();
        self.position + dir * depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> CameraView {
        CameraView {
            position: Vec3::new(0.0, 0.0, 5.0),
            rotation: Quat::IDENTITY,
            projection: Projection {
                viewport: Vec2::new(800.0, 600.0),
                ..Projection::default()
            },
        }
    }

    #[test]
    fn center_pixel_projects_straight_ahead() {
        let p = view().screen_to_world(400.0, 300.0, 5.0);
        assert!(p.abs_diff_eq(Vec3::ZERO, 1e-4), "{p:?}");
    }

    #[test]
    fn right_of_center_lands_on_positive_x() {
        let p = view().screen_to_world(700.0, 300.0, 5.0);
        assert!(p.x > 0.0);
        assert!(p.y.abs() < 1e-4);
        let up = view().screen_to_world(400.0, 100.0, 5.0);
        assert!(up.y > 0.0);
    }

    #[test]
    fn depth_is_distance_from_camera() {
        let v = view();
        let p = v.screen_to_world(123.0, 456.0, 7.0);
        assert!(((p - v.position).length() - 7.0).abs() < 1e-3);
    }

    #[test]
    fn degenerate_viewport_does_not_divide_by_zero() {
        let mut v = view();
        v.projection.viewport = Vec2::ZERO;
        assert!(v.projection.aspect().is_finite());
        assert!(v.screen_to_world(0.0, 0.0, 1.0).is_finite());
    }
}
