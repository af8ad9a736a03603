//! Working-plane math utilities
//!
//! Re-exports glam with the plane/rotation helpers the projectors and
//! proxies share. The simulation is 2D; the third axis is carried along
//! so the host scene keeps authority over elevation.

pub use glam::*;

use serde::{Deserialize, Serialize};

/// Which two world axes form the simulation plane.
///
/// The remaining axis is "perpendicular": the solver never writes it, and
/// every projected point has it pinned to the source transform's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisPair {
    /// Simulate on X/Y, Z is perpendicular (2D side-on or top-down-Z scenes).
    #[default]
    XY,
    /// Simulate on X/Z, Y is perpendicular (3D ground-plane scenes).
    XZ,
}

impl AxisPair {
    /// Returns `v` with its perpendicular component replaced by `reference`'s.
    #[inline]
    pub fn pin(&self, v: Vec3, reference: Vec3) -> Vec3 {
        match self {
            AxisPair::XY => Vec3::new(v.x, v.y, reference.z),
            AxisPair::XZ => Vec3::new(v.x, reference.y, v.z),
        }
    }

    /// The perpendicular component of `v` (the obstacle baseline coordinate).
    #[inline]
    pub fn perpendicular(&self, v: Vec3) -> f32 {
        match self {
            AxisPair::XY => v.z,
            AxisPair::XZ => v.y,
        }
    }

    /// Rotation by `angle` radians about the plane normal.
    #[inline]
    pub fn spin(&self, angle: f32) -> Quat {
        match self {
            AxisPair::XY => Quat::from_rotation_z(angle),
            AxisPair::XZ => Quat::from_rotation_y(angle),
        }
    }

    /// Lifts a 2D plane-space point into 3D with a zero perpendicular component.
    #[inline]
    pub fn lift(&self, p: Vec2) -> Vec3 {
        match self {
            AxisPair::XY => Vec3::new(p.x, p.y, 0.0),
            AxisPair::XZ => Vec3::new(p.x, 0.0, p.y),
        }
    }
}

/// Rotates `point` about `pivot` by `rot`.
#[inline]
pub fn rotate_around_pivot(point: Vec3, pivot: Vec3, rot: Quat) -> Vec3 {
    pivot + rot * (point - pivot)
}
