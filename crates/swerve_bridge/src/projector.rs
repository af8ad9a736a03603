//! Shape projection
//!
//! Pure per-shape functions mapping a local-space shape plus a rigid
//! transform into world-space vertex loops. Each function sizes the loop
//! to the exact point count it needs (reusing existing storage) before
//! overwriting coordinates, so a dynamic shape with a stable vertex count
//! projects with zero allocation.
//!
//! Every projected point has its plane-perpendicular coordinate pinned to
//! the placement position, keeping loops planar under arbitrary 3D
//! rotations of the host transform.

use crate::shape::{CircleShape, EdgeShape, Placement};
use glam::{Vec2, Vec3};
use std::f32::consts::TAU;
use swerve_core::math::AxisPair;
use swerve_core::obstacle::VertexLoop;

/// Circle sampling bounds.
pub const MIN_SAMPLES: usize = 3;
pub const MAX_SAMPLES: usize = 256;

/// Separation applied to the mirrored loop of a double-sided edge so the
/// solver never sees two exactly coincident polylines.
pub const DOUBLE_SIDED_NUDGE: f32 = 1e-5;

/// Projects one local 2D point into world space.
#[inline]
fn project_point(pt: Vec2, offset: Vec2, placement: &Placement, plane: AxisPair) -> Vec3 {
    let local = plane.lift(pt + offset);
    let world = placement.rotation * local + placement.position;
    plane.pin(world, placement.position)
}

/// Samples a circle into a closed loop of exactly `samples` points
/// (clamped to 3..=256), evenly spaced counter-clockwise starting from
/// the local "up" direction of the working plane.
pub fn project_circle(
    vl: &mut VertexLoop,
    shape: &CircleShape,
    samples: usize,
    placement: &Placement,
    plane: AxisPair,
) {
    let samples = samples.clamp(MIN_SAMPLES, MAX_SAMPLES);
    vl.resize_to(samples);
    vl.edge = false;

    let inc = TAU / samples as f32;
    let spoke = plane.lift(Vec2::new(0.0, shape.radius));
    let offset = plane.lift(shape.offset);
    for i in 0..samples {
        let local = plane.spin(inc * i as f32) * spoke + offset;
        let world = placement.rotation * local + placement.position;
        vl.set_point(i, plane.pin(world, placement.position));
    }
}

/// Projects a polyline into an open loop, one point per input point.
pub fn project_edge(vl: &mut VertexLoop, shape: &EdgeShape, placement: &Placement, plane: AxisPair) {
    vl.resize_to(shape.points.len());
    vl.edge = true;
    for (i, pt) in shape.points.iter().enumerate() {
        vl.set_point(i, project_point(*pt, shape.offset, placement, plane));
    }
}

/// Projects the reverse-ordered polyline for the far side of a
/// double-sided edge, every point nudged by [`DOUBLE_SIDED_NUDGE`] on all
/// axes so the pair never degenerates into a single zero-thickness loop.
pub fn project_edge_reversed(
    vl: &mut VertexLoop,
    shape: &EdgeShape,
    placement: &Placement,
    plane: AxisPair,
) {
    vl.resize_to(shape.points.len());
    vl.edge = true;
    let nudge = Vec3::splat(DOUBLE_SIDED_NUDGE);
    let count = shape.points.len();
    for i in 0..count {
        let pt = shape.points[count - (i + 1)];
        vl.set_point(i, project_point(pt, shape.offset, placement, plane) + nudge);
    }
}

/// Projects one polygon path into a closed loop, one point per path point.
pub fn project_polygon_path(
    vl: &mut VertexLoop,
    path: &[Vec2],
    offset: Vec2,
    placement: &Placement,
    plane: AxisPair,
) {
    vl.resize_to(path.len());
    vl.edge = false;
    for (i, pt) in path.iter().enumerate() {
        vl.set_point(i, project_point(*pt, offset, placement, plane));
    }
}
