//! Local-space shape descriptions and host transform reads
//!
//! These are the consumed side of the collider interface: the host fills
//! them from whatever collision components it uses. All coordinates are
//! 2D plane-space, local to the owning entity; `offset` shifts the shape
//! relative to the entity pivot.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Circle collider: implied local center plus radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleShape {
    pub radius: f32,
    pub offset: Vec2,
}

impl CircleShape {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            offset: Vec2::ZERO,
        }
    }
}

/// Open polyline collider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeShape {
    pub points: Vec<Vec2>,
    pub offset: Vec2,
}

impl EdgeShape {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self {
            points,
            offset: Vec2::ZERO,
        }
    }
}

/// Polygon collider with one or more paths; paths beyond the first are
/// holes or islands, each an independent closed ring.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolygonShape {
    pub paths: Vec<Vec<Vec2>>,
    pub offset: Vec2,
}

impl PolygonShape {
    pub fn new(path: Vec<Vec2>) -> Self {
        Self {
            paths: vec![path],
            offset: Vec2::ZERO,
        }
    }

    pub fn with_paths(paths: Vec<Vec<Vec2>>) -> Self {
        Self {
            paths,
            offset: Vec2::ZERO,
        }
    }
}

/// One read of the host transform: world position and rotation of the
/// entity driving a source or proxy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Placement {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}
