use boxfall_common::Pose;
use boxfall_render::{RenderView, Renderable, Renderer, VisualRegistry};
use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};

/// Per-instance vertex data: model matrix columns and a flat color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub model_0: [f32; 4],
    pub model_1: [f32; 4],
    pub model_2: [f32; 4],
    pub model_3: [f32; 4],
    pub color: [f32; 4],
}

impl InstanceData {
    /// Unit cube scaled to `size` and placed at `pose`.
    pub fn new(pose: &Pose, size: Vec3, color: [f32; 4]) -> Self {
        let model = Mat4::from_scale_rotation_translation(size, pose.rotation, pose.position);
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color,
        }
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&[self.model_0, self.model_1, self.model_2, self.model_3])
    }
}

/// One directional light plus a flat ambient term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    /// Unit vector pointing from the scene toward the light.
    pub to_light: Vec3,
    pub color: Vec3,
    pub ambient: Vec3,
}

impl Lighting {
    /// Light whose local -Y axis, rotated by Euler angles (degrees, applied
    /// X then Y then Z), is the direction it shines in.
    pub fn from_euler_degrees(x: f32, y: f32, z: f32, color: Vec3, ambient: Vec3) -> Self {
        let rotation = Quat::from_euler(
            EulerRot::ZYX,
            z.to_radians(),
            y.to_radians(),
            x.to_radians(),
        );
        Self {
            to_light: (rotation * Vec3::Y).normalize(),
            color,
            ambient,
        }
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self::from_euler_degrees(
            45.0,
            30.0,
            0.0,
            Vec3::new(1.05, 1.0, 0.95),
            Vec3::new(0.1, 0.15, 0.2),
        )
    }
}

/// Flat slab the boxes land on. Drawn only; the physics ground is separate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ground {
    pub size: Vec3,
    /// Height of the top face.
    pub top: f32,
    pub color: [f32; 4],
}

impl Default for Ground {
    fn default() -> Self {
        Self {
            size: Vec3::new(15.0, 0.02, 15.0),
            top: 0.1,
            color: [0.8, 0.8, 0.8, 1.0],
        }
    }
}

impl Ground {
    pub fn instance(&self) -> InstanceData {
        let center = Vec3::new(0.0, self.top - self.size.y * 0.5, 0.0);
        InstanceData::new(&Pose::from_position(center), self.size, self.color)
    }
}

/// Flattens the visual registry into instance data, ground first.
#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    pub ground: Option<Ground>,
    /// Instances beyond this are dropped.
    pub max_instances: usize,
}

impl SceneBuilder {
    pub fn new(max_instances: usize) -> Self {
        Self {
            ground: Some(Ground::default()),
            max_instances,
        }
    }
}

impl Renderer for SceneBuilder {
    type Output = Vec<InstanceData>;

    fn render(&self, scene: &VisualRegistry<Renderable>, _view: &RenderView) -> Vec<InstanceData> {
        let mut instances = Vec::with_capacity(scene.len() + 1);
        if let Some(ground) = &self.ground {
            instances.push(ground.instance());
        }
        for (_, visual) in scene.iter() {
            instances.push(InstanceData::new(&visual.pose, visual.scale(), visual.handle.color));
        }
        if instances.len() > self.max_instances {
            tracing::warn!(
                instances = instances.len(),
                max = self.max_instances,
                "instance buffer full, dropping boxes"
            );
            instances.truncate(self.max_instances);
        }
        instances
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxfall_common::{BodyId, BoxShape};

    #[test]
    fn instance_scales_unit_cube() {
        let pose = Pose::from_position(Vec3::new(1.0, 2.0, 3.0));
        let inst = InstanceData::new(&pose, Vec3::new(2.0, 4.0, 6.0), [1.0; 4]);
        let corner = inst.model().transform_point3(Vec3::splat(0.5));
        assert!(corner.abs_diff_eq(Vec3::new(2.0, 4.0, 6.0), 1e-6));
    }

    #[test]
    fn ground_top_face_height() {
        let ground = Ground::default();
        let top = ground.instance().model().transform_point3(Vec3::new(0.0, 0.5, 0.0));
        assert!((top.y - 0.1).abs() < 1e-6);
    }

    #[test]
    fn default_light_comes_from_above() {
        let light = Lighting::default();
        assert!((light.to_light.length() - 1.0).abs() < 1e-5);
        assert!(light.to_light.y > 0.0);
        assert_eq!(light.ambient, Vec3::new(0.1, 0.15, 0.2));
    }

    #[test]
    fn builds_ground_then_boxes() {
        let mut scene = VisualRegistry::new();
        for i in 0..3 {
            let id = BodyId::from_parts(i, 0);
            scene.on_added(id, BoxShape::cube(0.5), Vec3::ZERO, Renderable::for_body(id));
        }
        let instances = SceneBuilder::new(100).render(&scene, &RenderView::default());
        assert_eq!(instances.len(), 4);
        assert_eq!(instances[0], Ground::default().instance());

        let capped = SceneBuilder::new(2).render(&scene, &RenderView::default());
        assert_eq!(capped.len(), 2);
    }
}
