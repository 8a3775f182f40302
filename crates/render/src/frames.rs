use boxfall_common::{BodyId, Pose};
use boxfall_kernel::WorldFrame;
use std::collections::BTreeMap;

/// The two newest simulation frames: the minimum needed to interpolate.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    previous: Option<WorldFrame>,
    current: Option<WorldFrame>,
}

/// Poses resolved for one render time.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolated {
    /// Blend factor between the previous and current frame.
    pub fraction: f64,
    pub poses: BTreeMap<BodyId, Pose>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new frame, shifting the current one into the previous slot.
    pub fn push(&mut self, frame: WorldFrame) {
        self.previous = self.current.take();
        self.current = Some(frame);
    }

    pub fn previous(&self) -> Option<&WorldFrame> {
        self.previous.as_ref()
    }

    pub fn current(&self) -> Option<&WorldFrame> {
        self.current.as_ref()
    }

    /// Number of frames held (0, 1 or 2).
    pub fn len(&self) -> usize {
        self.previous.is_some() as usize + self.current.is_some() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    pub fn clear(&mut self) {
        self.previous = None;
        self.current = None;
    }

    /// Interpolated poses at `render_time`, or `None` until two frames exist.
    pub fn resolve(&self, render_time: f64) -> Option<Interpolated> {
        let (prev, curr) = (self.previous.as_ref()?, self.current.as_ref()?);
        Some(Interpolated {
            fraction: interpolation_fraction(prev, curr, render_time),
            poses: interpolate(prev, curr, render_time),
        })
    }

    /// Bodies present in the previous frame but missing from the current one.
    pub fn vanished(&self) -> Vec<BodyId> {
        match (&self.previous, &self.current) {
            (Some(prev), Some(curr)) => prev
                .bodies
                .keys()
                .filter(|id| !curr.bodies.contains_key(id))
                .copied()
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// `(render_time - prev.time) / (curr.time - prev.time)`.
///
/// Frames with no time span between them, or any non-finite result, give 1 so
/// the caller snaps to `curr`.
pub fn interpolation_fraction(prev: &WorldFrame, curr: &WorldFrame, render_time: f64) -> f64 {
    let span = curr.time - prev.time;
    if span == 0.0 {
        return 1.0;
    }
    let d = (render_time - prev.time) / span;
    if d.is_finite() { d } else { 1.0 }
}

/// Blend every body in `curr` with its pose in `prev`.
///
/// Bodies that only exist in `curr` are returned at their raw `curr` pose.
/// Rotations are blended per quaternion component, see [`Pose::lerp`].
pub fn interpolate(
    prev: &WorldFrame,
    curr: &WorldFrame,
    render_time: f64,
) -> BTreeMap<BodyId, Pose> {
    let d = interpolation_fraction(prev, curr, render_time) as f32;
    curr.bodies
        .iter()
        .map(|(id, to)| {
            let pose = match prev.bodies.get(id) {
                Some(from) => from.lerp(to, d),
                None => *to,
            };
            (*id, pose)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn frame(time: f64, bodies: &[(u64, Pose)]) -> WorldFrame {
        WorldFrame {
            time,
            bodies: bodies.iter().map(|(id, p)| (BodyId(*id), *p)).collect(),
        }
    }

    #[test]
    fn halfway_between_frames() {
        let prev = frame(0.0, &[(1, Pose::from_position(Vec3::ZERO))]);
        let curr = frame(1.0, &[(1, Pose::from_position(Vec3::new(10.0, 0.0, 0.0)))]);
        let poses = interpolate(&prev, &curr, 0.5);
        assert_eq!(poses[&BodyId(1)].position, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn new_body_uses_current_pose() {
        let raw = Pose::new(Vec3::new(3.0, 4.0, 5.0), Quat::from_rotation_y(1.0));
        let prev = frame(0.0, &[]);
        let curr = frame(1.0, &[(2, raw)]);
        let poses = interpolate(&prev, &curr, 0.25);
        assert_eq!(poses[&BodyId(2)], raw);
    }

    #[test]
    fn zero_span_snaps_to_current() {
        let prev = frame(2.0, &[(1, Pose::from_position(Vec3::ZERO))]);
        let curr = frame(2.0, &[(1, Pose::from_position(Vec3::ONE))]);
        assert_eq!(interpolation_fraction(&prev, &curr, 2.0), 1.0);
        assert_eq!(interpolate(&prev, &curr, 5.0)[&BodyId(1)].position, Vec3::ONE);
    }

    #[test]
    fn rotation_is_component_lerped() {
        let a = Pose::new(Vec3::ZERO, Quat::IDENTITY);
        let b = Pose::new(Vec3::ZERO, Quat::from_xyzw(0.0, 1.0, 0.0, 0.0));
        let prev = frame(0.0, &[(1, a)]);
        let curr = frame(1.0, &[(1, b)]);
        let r = interpolate(&prev, &curr, 0.5)[&BodyId(1)].rotation;
        assert_eq!(r, Quat::from_xyzw(0.0, 0.5, 0.0, 0.5));
    }

    #[test]
    fn bodies_only_in_previous_are_dropped() {
        let prev = frame(0.0, &[(1, Pose::default()), (2, Pose::default())]);
        let curr = frame(1.0, &[(1, Pose::default())]);
        let poses = interpolate(&prev, &curr, 0.5);
        assert_eq!(poses.len(), 1);
        assert!(!poses.contains_key(&BodyId(2)));
    }

    #[test]
    fn buffer_needs_two_frames() {
        let mut buf = FrameBuffer::new();
        assert!(buf.is_empty());
        assert!(buf.resolve(0.0).is_none());
        buf.push(frame(1.0, &[(1, Pose::default())]));
        assert_eq!(buf.len(), 1);
        assert!(buf.resolve(1.0).is_none());
        buf.push(frame(2.0, &[(1, Pose::default())]));
        assert_eq!(buf.len(), 2);
        let resolved = buf.resolve(1.5).unwrap();
        assert_eq!(resolved.fraction, 0.5);
    }

    #[test]
    fn buffer_keeps_only_newest_two() {
        let mut buf = FrameBuffer::new();
        for t in 1..=5 {
            buf.push(frame(t as f64, &[]));
        }
        assert_eq!(buf.previous().unwrap().time, 4.0);
        assert_eq!(buf.current().unwrap().time, 5.0);
        buf.clear();
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn vanished_lists_bodies_missing_from_current() {
        let mut buf = FrameBuffer::new();
        buf.push(frame(1.0, &[(1, Pose::default()), (2, Pose::default())]));
        assert!(buf.vanished().is_empty());
        buf.push(frame(2.0, &[(2, Pose::default()), (3, Pose::default())]));
        assert_eq!(buf.vanished(), vec![BodyId(1)]);
    }
}
