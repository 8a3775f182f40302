use boxfall_common::{BodyId, BoxShape, Pose};
use glam::Vec3;
use std::collections::BTreeMap;

/// Default handle for a box visual: a label and a flat color.
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    pub name: String,
    pub color: [f32; 4],
}

impl Renderable {
    const PALETTE: [[f32; 4]; 4] = [
        [0.85, 0.45, 0.25, 1.0],
        [0.25, 0.6, 0.9, 1.0],
        [0.45, 0.8, 0.35, 1.0],
        [0.9, 0.8, 0.3, 1.0],
    ];

    /// Renderable named after its body, with a color picked from the body index.
    pub fn for_body(id: BodyId) -> Self {
        Self {
            name: format!("physics-{}", id.index()),
            color: Self::PALETTE[id.index() as usize % Self::PALETTE.len()],
        }
    }
}

/// One visual entity mirroring a simulated body.
#[derive(Debug, Clone, PartialEq)]
pub struct Visual<H> {
    pub handle: H,
    pub shape: BoxShape,
    pub pose: Pose,
}

impl<H> Visual<H> {
    /// Scale applied to a unit cube to match the body's extents.
    pub fn scale(&self) -> Vec3 {
        self.shape.size()
    }
}

/// Visual entities keyed by body id.
///
/// Created on body-added notifications, removed on body-removed
/// notifications, moved by `apply`.
#[derive(Debug, Clone)]
pub struct VisualRegistry<H> {
    visuals: BTreeMap<BodyId, Visual<H>>,
}

impl<H> Default for VisualRegistry<H> {
    fn default() -> Self {
        Self {
            visuals: BTreeMap::new(),
        }
    }
}

impl<H> VisualRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a visual at the body's spawn position. Replaces any previous
    /// visual with the same id and returns its handle.
    pub fn on_added(&mut self, id: BodyId, shape: BoxShape, position: Vec3, handle: H) -> Option<H> {
        tracing::debug!(%id, "visual added");
        self.visuals
            .insert(
                id,
                Visual {
                    handle,
                    shape,
                    pose: Pose::from_position(position),
                },
            )
            .map(|old| old.handle)
    }

    /// Drop the visual for a removed body and hand back its handle.
    pub fn on_removed(&mut self, id: BodyId) -> Option<H> {
        let removed = self.visuals.remove(&id).map(|v| v.handle);
        if removed.is_some() {
            tracing::debug!(%id, "visual removed");
        }
        removed
    }

    /// Move visuals to the given poses. Poses for unknown ids are ignored.
    /// Returns how many visuals were updated.
    pub fn apply(&mut self, poses: &BTreeMap<BodyId, Pose>) -> usize {
        let mut updated = 0;
        for (id, pose) in poses {
            if let Some(visual) = self.visuals.get_mut(id) {
                visual.pose = *pose;
                updated += 1;
            }
        }
        updated
    }

    pub fn get(&self, id: BodyId) -> Option<&Visual<H>> {
        self.visuals.get(&id)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.visuals.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BodyId, &Visual<H>)> {
        self.visuals.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn added_visual_sits_at_spawn_position() {
        let mut reg = VisualRegistry::new();
        let id = BodyId(1);
        reg.on_added(id, BoxShape::cube(0.5), Vec3::new(0.0, 2.0, 0.0), "box");
        let v = reg.get(id).unwrap();
        assert_eq!(v.pose.position, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(v.scale(), Vec3::ONE);
    }

    #[test]
    fn removal_returns_handle() {
        let mut reg = VisualRegistry::new();
        reg.on_added(BodyId(1), BoxShape::cube(1.0), Vec3::ZERO, 7_u32);
        assert_eq!(reg.on_removed(BodyId(1)), Some(7));
        assert_eq!(reg.on_removed(BodyId(1)), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn apply_moves_known_visuals_only() {
        let mut reg = VisualRegistry::new();
        reg.on_added(BodyId(1), BoxShape::cube(1.0), Vec3::ZERO, ());
        let mut poses = BTreeMap::new();
        poses.insert(BodyId(1), Pose::from_position(Vec3::X));
        poses.insert(BodyId(9), Pose::from_position(Vec3::Y));
        assert_eq!(reg.apply(&poses), 1);
        assert_eq!(reg.get(BodyId(1)).unwrap().pose.position, Vec3::X);
        assert!(!reg.contains(BodyId(9)));
    }

    #[test]
    fn re_adding_replaces_handle() {
        let mut reg = VisualRegistry::new();
        reg.on_added(BodyId(1), BoxShape::cube(1.0), Vec3::ZERO, "a");
        let old = reg.on_added(BodyId(1), BoxShape::cube(1.0), Vec3::ZERO, "b");
        assert_eq!(old, Some("a"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn renderable_is_named_after_body() {
        let r = Renderable::for_body(BodyId::from_parts(3, 0));
        assert_eq!(r.name, "physics-3");
        assert_eq!(r.color[3], 1.0);
    }
}
