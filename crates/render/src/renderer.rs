use glam::Vec3;
use std::fmt::Write;

use crate::registry::{Renderable, VisualRegistry};

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 1.0, 2.0),
            target: Vec3::new(0.0, 1.0, 0.0),
            fov_degrees: 75.0,
        }
    }
}

/// Renderer-agnostic interface.
///
/// A renderer reads the visual registry and a view, then produces output. It
/// never touches the simulation.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&self, scene: &VisualRegistry<Renderable>, view: &RenderView) -> Self::Output;
}

/// Text renderer for the CLI, logs and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &VisualRegistry<Renderable>, view: &RenderView) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Scene ({} bodies) ===", scene.len());
        let _ = writeln!(
            out,
            "Camera: eye=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) fov={:.0}",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z,
            view.fov_degrees
        );
        for (_, visual) in scene.iter() {
            let p = visual.pose.position;
            let r = visual.pose.rotation;
            let s = visual.scale();
            let _ = writeln!(
                out,
                "  [{}] pos=({:.3}, {:.3}, {:.3}) rot=({:.3}, {:.3}, {:.3}, {:.3}) size=({:.2}, {:.2}, {:.2})",
                visual.handle.name, p.x, p.y, p.z, r.x, r.y, r.z, r.w, s.x, s.y, s.z
            );
        }
        out
    }
}
