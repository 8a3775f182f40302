use glam::{Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a simulated body.
///
/// Derived from the physics engine's own body handle, so it is only
/// meaningful for the simulation that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u64);

impl BodyId {
    /// Pack a generational handle (index, generation) into one id.
    pub fn from_parts(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | index as u64)
    }

    pub fn index(self) -> u32 {
        self.0 as u32
    }

    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body-{}v{}", self.index(), self.generation())
    }
}

/// Position and orientation of a body at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Blend two poses: component-wise lerp of the position and of the raw
    /// quaternion components.
    ///
    /// The rotation is neither normalized nor slerped, so it is only accurate
    /// for small angular deltas such as those between adjacent physics steps.
    pub fn lerp(&self, other: &Pose, t: f32) -> Pose {
        Pose {
            position: self.position.lerp(other.position, t),
            rotation: lerp_quat_components(self.rotation, other.rotation, t),
        }
    }
}

/// Per-component linear blend of two quaternions, without renormalizing.
pub fn lerp_quat_components(a: Quat, b: Quat, t: f32) -> Quat {
    let v = Vec4::from(a).lerp(Vec4::from(b), t);
    Quat::from_xyzw(v.x, v.y, v.z, v.w)
}

/// Axis-aligned box described by its half extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxShape {
    pub half_extents: Vec3,
}

impl BoxShape {
    pub fn new(half_extents: Vec3) -> Self {
        Self { half_extents }
    }

    pub fn cube(half: f32) -> Self {
        Self::new(Vec3::splat(half))
    }

    /// Full edge lengths, i.e. the scale applied to a unit cube mesh.
    pub fn size(&self) -> Vec3 {
        self.half_extents * 2.0
    }

    /// A box is usable by the physics engine only with strictly positive,
    /// finite half extents.
    pub fn is_valid(&self) -> bool {
        self.half_extents.is_finite() && self.half_extents.min_element() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_id_round_trips_handle_parts() {
        let id = BodyId::from_parts(7, 3);
        assert_eq!(id.index(), 7);
        assert_eq!(id.generation(), 3);
        assert_eq!(id.to_string(), "body-7v3");
    }

    #[test]
    fn pose_default_is_identity() {
        let p = Pose::default();
        assert_eq!(p.position, Vec3::ZERO);
        assert_eq!(p.rotation, Quat::IDENTITY);
    }

    #[test]
    fn pose_lerp_blends_position() {
        let a = Pose::from_position(Vec3::ZERO);
        let b = Pose::from_position(Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(a.lerp(&b, 0.5).position, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn quat_lerp_is_not_normalized() {
        let a = Quat::IDENTITY;
        let b = Quat::from_xyzw(0.0, 1.0, 0.0, 0.0);
        let mid = lerp_quat_components(a, b, 0.5);
        assert_eq!(mid, Quat::from_xyzw(0.0, 0.5, 0.0, 0.5));
        assert!((Vec4::from(mid).length() - 1.0).abs() > 0.1);
    }

    #[test]
    fn box_shape_validity() {
        assert!(BoxShape::cube(0.5).is_valid());
        assert_eq!(BoxShape::cube(0.5).size(), Vec3::ONE);
        assert!(!BoxShape::new(Vec3::new(1.0, 0.0, 1.0)).is_valid());
        assert!(!BoxShape::new(Vec3::new(f32::NAN, 1.0, 1.0)).is_valid());
    }
}
