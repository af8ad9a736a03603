//! Vertex loops
//!
//! One loop is one obstacle ring (closed) or polyline (open) in world
//! space. Loops are pooled and resized in place: a dynamic shape rebuilt
//! every step reuses the same point buffer as long as its vertex count
//! is stable.

use crate::layer::LayerMask;
use crate::pool::{Pool, Recycle};
use glam::Vec3;

/// Pool of reusable vertex loops.
pub type ObstaclePool = Pool<VertexLoop>;

/// An ordered sequence of world-space points plus obstacle flags.
#[derive(Debug, Clone)]
pub struct VertexLoop {
    points: Vec<Vec3>,
    /// Open polyline when true: no implicit segment from last back to first.
    pub edge: bool,
    /// Inert when false: present in a set but ignored by the solver.
    pub collision_enabled: bool,
    /// Layers this obstacle exists on.
    pub layer_occupation: LayerMask,
    /// Perpendicular coordinate of the loop's floor.
    pub baseline: f32,
    /// Vertical rise above the baseline.
    pub height: f32,
    /// Optional inflation applied by the solver on proximity tests.
    pub thickness: f32,
}

impl Default for VertexLoop {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            edge: false,
            collision_enabled: true,
            layer_occupation: LayerMask::ANY,
            baseline: 0.0,
            height: 1.0,
            thickness: 0.0,
        }
    }
}

impl VertexLoop {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    #[inline]
    pub fn point(&self, index: usize) -> Vec3 {
        self.points[index]
    }

    #[inline]
    pub fn set_point(&mut self, index: usize, p: Vec3) {
        self.points[index] = p;
    }

    /// Grows or shrinks the point sequence to exactly `target` entries.
    ///
    /// Appended points are zero and expected to be overwritten by a
    /// projector; shrinking pops from the tail. Never reallocates when
    /// `target` fits the existing capacity.
    pub fn resize_to(&mut self, target: usize) {
        while self.points.len() < target {
            self.points.push(Vec3::ZERO);
        }
        while self.points.len() > target {
            self.points.pop();
        }
    }

    /// Empties the point sequence, keeping its storage.
    pub fn clear_points(&mut self) {
        self.points.clear();
    }

    /// Segments of the loop: consecutive point pairs, plus the closing
    /// pair unless the loop is an open edge.
    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        let closing = (!self.edge && self.points.len() > 1)
            .then(|| (self.points[self.points.len() - 1], self.points[0]));
        self.points
            .windows(2)
            .map(|w| (w[0], w[1]))
            .chain(closing)
    }
}

impl Recycle for VertexLoop {
    fn recycle(&mut self) {
        self.points.clear();
        self.edge = false;
        self.collision_enabled = true;
        self.layer_occupation = LayerMask::ANY;
        self.baseline = 0.0;
        self.height = 1.0;
        self.thickness = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_round_trip_restores_count() {
        let mut vl = VertexLoop::default();
        vl.resize_to(5);
        assert_eq!(vl.len(), 5);
        vl.resize_to(9);
        assert_eq!(vl.len(), 9);
        vl.resize_to(5);
        assert_eq!(vl.len(), 5);
    }

    #[test]
    fn resize_does_not_shed_capacity() {
        let mut vl = VertexLoop::default();
        vl.resize_to(64);
        let cap = vl.points.capacity();
        vl.resize_to(3);
        vl.resize_to(64);
        assert_eq!(vl.points.capacity(), cap);
    }

    #[test]
    fn appended_points_are_zero() {
        let mut vl = VertexLoop::default();
        vl.resize_to(2);
        vl.set_point(0, Vec3::splat(4.0));
        vl.resize_to(3);
        assert_eq!(vl.point(0), Vec3::splat(4.0));
        assert_eq!(vl.point(2), Vec3::ZERO);
    }

    #[test]
    fn segments_close_rings_but_not_edges() {
        let mut vl = VertexLoop::default();
        vl.resize_to(3);
        vl.set_point(0, Vec3::X);
        vl.set_point(1, Vec3::Y);
        vl.set_point(2, Vec3::Z);
        assert_eq!(vl.segments().count(), 3);

        vl.edge = true;
        assert_eq!(vl.segments().count(), 2);
    }

    #[test]
    fn recycle_resets_flags_and_keeps_storage() {
        let mut vl = VertexLoop::default();
        vl.resize_to(16);
        vl.edge = true;
        vl.collision_enabled = false;
        vl.thickness = 2.0;
        let cap = vl.points.capacity();

        vl.recycle();
        assert!(vl.is_empty());
        assert!(!vl.edge);
        assert!(vl.collision_enabled);
        assert_eq!(vl.thickness, 0.0);
        assert_eq!(vl.points.capacity(), cap);
    }
}
