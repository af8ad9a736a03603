//! Obstacle sources
//!
//! One source owns the pooled vertex loops produced from one collider
//! shape: a circle or edge yields one loop (two when double-sided), a
//! polygon one loop per non-empty path. Static sources build once;
//! dynamic sources rebuild while the simulation runs, reconciling loop
//! and point counts through the pool before overwriting coordinates.

use crate::bundle::Bundle;
use crate::projector;
use crate::shape::{CircleShape, EdgeShape, Placement, PolygonShape};
use serde::{Deserialize, Serialize};
use swerve_core::layer::LayerMask;
use swerve_core::math::AxisPair;
use swerve_core::obstacle::{ObstaclePool, VertexLoop};
use swerve_core::pool::Handle;
use tracing::{debug, warn};

/// The collider shape feeding a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle(CircleShape),
    Edge(EdgeShape),
    Polygon(PolygonShape),
}

/// Tuning for one obstacle source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSettings {
    /// Dynamic obstacles join the bundle's dynamic set and may be rebuilt
    /// while the simulation runs.
    pub dynamic: bool,
    /// Rebuild geometry every step (only meaningful when `dynamic`).
    pub always_update: bool,
    /// Stamped onto owned loops on enable.
    pub collision_enabled: bool,
    /// Layers occupied by this obstacle.
    pub layer_occupation: LayerMask,
    /// Obstacle height above its baseline.
    pub height: f32,
    /// Inflation applied by the solver on proximity tests.
    pub thickness: f32,
    /// Working plane of the host scene.
    pub plane: AxisPair,
    /// When true the source registers its loops with the bundle itself;
    /// otherwise the caller manages registration.
    pub self_managed: bool,
    /// Circle only: number of segments the circle is sampled into.
    pub samples: usize,
    /// Edge only: also emit the reverse-ordered loop so the polyline
    /// blocks passage from both sides.
    pub double_sided: bool,
}

impl Default for ObstacleSettings {
    fn default() -> Self {
        Self {
            dynamic: false,
            always_update: false,
            collision_enabled: true,
            layer_occupation: LayerMask::ANY,
            height: 1.0,
            thickness: 0.0,
            plane: AxisPair::XY,
            self_managed: true,
            samples: 32,
            double_sided: false,
        }
    }
}

/// Which bundle set the source's loops are currently registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Registration {
    #[default]
    Unregistered,
    Static,
    Dynamic,
}

/// Owner of the vertex loops derived from one shape.
pub struct ObstacleSource {
    shape: ShapeKind,
    pub settings: ObstacleSettings,
    loops: Vec<Handle<VertexLoop>>,
    registration: Registration,
    built: bool,
}

impl ObstacleSource {
    pub fn new(shape: ShapeKind, settings: ObstacleSettings) -> Self {
        Self {
            shape,
            settings,
            loops: Vec::new(),
            registration: Registration::Unregistered,
            built: false,
        }
    }

    pub fn shape(&self) -> &ShapeKind {
        &self.shape
    }

    /// Mutable shape access for dynamic sources whose geometry changes
    /// between rebuilds.
    pub fn shape_mut(&mut self) -> &mut ShapeKind {
        &mut self.shape
    }

    pub fn loops(&self) -> &[Handle<VertexLoop>] {
        &self.loops
    }

    pub fn registration(&self) -> Registration {
        self.registration
    }

    /// Loops this shape currently projects to. Degenerate shapes (no
    /// usable points) yield zero loops rather than an empty one.
    fn target_loop_count(&self) -> usize {
        match &self.shape {
            ShapeKind::Circle(_) => 1,
            ShapeKind::Edge(e) => {
                if e.points.is_empty() {
                    0
                } else if self.settings.double_sided {
                    2
                } else {
                    1
                }
            }
            ShapeKind::Polygon(p) => p.paths.iter().filter(|path| !path.is_empty()).count(),
        }
    }

    /// Rents or releases loops until exactly `target` are owned.
    ///
    /// Shrinks last-rented-first so earlier loop identities stay stable
    /// across resizes; a released loop leaves any bundle set it was in
    /// before going back to the pool.
    fn set_loop_count(&mut self, pool: &mut ObstaclePool, bundle: &mut Bundle, target: usize) {
        while self.loops.len() < target {
            self.loops.push(pool.rent());
        }
        while self.loops.len() > target {
            let handle = self.loops.pop().expect("len > target >= 0");
            bundle.remove_static_obstacle(handle);
            bundle.remove_dynamic_obstacle(handle);
            if let Err(err) = pool.release(handle) {
                warn!(?handle, %err, "owned loop was already released");
            }
        }
    }

    /// (Re)projects the shape into owned loops, reconciling loop and point
    /// counts first. While registered, flags are re-stamped and any loops
    /// rented by a grow join the bundle set the source is registered in.
    pub fn build(&mut self, pool: &mut ObstaclePool, bundle: &mut Bundle, placement: &Placement) {
        let target = self.target_loop_count();
        if target == 0 && !self.loops.is_empty() {
            debug!("shape became degenerate; releasing all loops");
        }
        self.set_loop_count(pool, bundle, target);

        let plane = self.settings.plane;
        match &self.shape {
            ShapeKind::Circle(c) => {
                if let Some(vl) = Self::loop_mut(pool, &self.loops, 0) {
                    projector::project_circle(vl, c, self.settings.samples, placement, plane);
                }
            }
            ShapeKind::Edge(e) => {
                if let Some(vl) = Self::loop_mut(pool, &self.loops, 0) {
                    projector::project_edge(vl, e, placement, plane);
                }
                if self.settings.double_sided {
                    if let Some(vl) = Self::loop_mut(pool, &self.loops, 1) {
                        projector::project_edge_reversed(vl, e, placement, plane);
                    }
                }
            }
            ShapeKind::Polygon(p) => {
                for (i, path) in p.paths.iter().filter(|path| !path.is_empty()).enumerate() {
                    if let Some(vl) = Self::loop_mut(pool, &self.loops, i) {
                        projector::project_polygon_path(vl, path, p.offset, placement, plane);
                    }
                }
            }
        }

        self.built = true;

        if self.registration != Registration::Unregistered {
            self.stamp(pool, placement);
            self.register(pool, bundle);
        }
    }

    fn loop_mut<'p>(
        pool: &'p mut ObstaclePool,
        loops: &[Handle<VertexLoop>],
        index: usize,
    ) -> Option<&'p mut VertexLoop> {
        let handle = *loops.get(index)?;
        match pool.get_mut(handle) {
            Ok(vl) => Some(vl),
            Err(err) => {
                warn!(?handle, %err, "owned loop handle went stale");
                None
            }
        }
    }

    /// Copies the settings flags and the placement-derived baseline onto
    /// every owned loop.
    fn stamp(&self, pool: &mut ObstaclePool, placement: &Placement) {
        let baseline = self.settings.plane.perpendicular(placement.position);
        for &handle in &self.loops {
            if let Ok(vl) = pool.get_mut(handle) {
                vl.collision_enabled = self.settings.collision_enabled;
                vl.layer_occupation = self.settings.layer_occupation;
                vl.baseline = baseline;
                vl.height = self.settings.height;
                vl.thickness = self.settings.thickness;
            }
        }
    }

    fn register(&mut self, pool: &ObstaclePool, bundle: &mut Bundle) {
        let target = if self.settings.dynamic {
            Registration::Dynamic
        } else {
            Registration::Static
        };
        // The dynamic flag may have been retuned since the last enable;
        // membership moves sets rather than duplicating.
        if self.registration != Registration::Unregistered && self.registration != target {
            self.unregister(bundle);
        }
        for &handle in &self.loops {
            match target {
                Registration::Dynamic => bundle.add_dynamic_obstacle(pool, handle),
                _ => bundle.add_static_obstacle(pool, handle),
            };
        }
        self.registration = target;
    }

    fn unregister(&mut self, bundle: &mut Bundle) {
        for &handle in &self.loops {
            match self.registration {
                Registration::Static => bundle.remove_static_obstacle(handle),
                Registration::Dynamic => bundle.remove_dynamic_obstacle(handle),
                Registration::Unregistered => false,
            };
        }
        self.registration = Registration::Unregistered;
    }

    /// Activates the source: stamps flags and baseline onto owned loops
    /// and, when self-managed, registers them with the bundle. Idempotent;
    /// builds lazily on first call.
    pub fn enable(&mut self, pool: &mut ObstaclePool, bundle: &mut Bundle, placement: &Placement) {
        if !self.built {
            self.build(pool, bundle, placement);
        }
        if self.loops.is_empty() {
            debug!("enable on a source with no loops (degenerate or absent shape)");
            return;
        }
        self.stamp(pool, placement);
        if self.settings.self_managed {
            self.register(pool, bundle);
        }
    }

    /// Deactivates the source: loops become inert and, when self-managed,
    /// leave the bundle. Safe to call when never enabled.
    pub fn disable(&mut self, pool: &mut ObstaclePool, bundle: &mut Bundle) {
        for &handle in &self.loops {
            if let Ok(vl) = pool.get_mut(handle) {
                vl.collision_enabled = false;
            }
        }
        if self.settings.self_managed {
            self.unregister(bundle);
        }
    }

    /// Per-step hook: rebuilds geometry for dynamic sources configured to
    /// refresh every step.
    pub fn update(&mut self, pool: &mut ObstaclePool, bundle: &mut Bundle, placement: &Placement) {
        if self.settings.dynamic && self.settings.always_update && self.settings.collision_enabled {
            self.build(pool, bundle, placement);
        }
    }

    /// Tears the source down: every owned loop leaves whatever bundle set
    /// it was in and returns to the pool, registered or not. Guards
    /// against leaks when `disable` was skipped.
    pub fn destroy(&mut self, pool: &mut ObstaclePool, bundle: &mut Bundle) {
        while let Some(handle) = self.loops.pop() {
            bundle.remove_static_obstacle(handle);
            bundle.remove_dynamic_obstacle(handle);
            if let Err(err) = pool.release(handle) {
                warn!(?handle, %err, "owned loop was already released");
            }
        }
        self.registration = Registration::Unregistered;
        self.built = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    fn polygon_paths(paths: &[&[(f32, f32)]]) -> ShapeKind {
        ShapeKind::Polygon(PolygonShape::with_paths(
            paths
                .iter()
                .map(|p| p.iter().map(|&(x, y)| Vec2::new(x, y)).collect())
                .collect(),
        ))
    }

    fn tri() -> &'static [(f32, f32)] {
        &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]
    }

    fn quad() -> &'static [(f32, f32)] {
        &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]
    }

    #[test]
    fn circle_source_builds_one_loop_of_sample_count() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let mut src = ObstacleSource::new(
            ShapeKind::Circle(CircleShape::new(1.0)),
            ObstacleSettings {
                samples: 12,
                ..Default::default()
            },
        );
        src.build(&mut pool, &mut bundle, &Placement::default());
        assert_eq!(src.loops().len(), 1);
        assert_eq!(pool.get(src.loops()[0]).unwrap().len(), 12);
    }

    #[test]
    fn polygon_paths_become_loops_and_shrink_releases() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let mut src = ObstacleSource::new(
            polygon_paths(&[tri(), quad()]),
            ObstacleSettings {
                dynamic: true,
                ..Default::default()
            },
        );
        let placement = Placement::default();
        src.build(&mut pool, &mut bundle, &placement);
        assert_eq!(src.loops().len(), 2);
        assert_eq!(pool.get(src.loops()[0]).unwrap().len(), 3);
        assert_eq!(pool.get(src.loops()[1]).unwrap().len(), 4);

        // Losing a path releases the last loop back to the pool.
        let first = src.loops()[0];
        if let ShapeKind::Polygon(p) = src.shape_mut() {
            p.paths.truncate(1);
        }
        let available_before = pool.available();
        src.build(&mut pool, &mut bundle, &placement);
        assert_eq!(src.loops().len(), 1);
        assert_eq!(src.loops()[0], first);
        assert_eq!(pool.available(), available_before + 1);
    }

    #[test]
    fn enable_registers_idempotently_and_stamps() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let mut src = ObstacleSource::new(
            polygon_paths(&[quad()]),
            ObstacleSettings {
                layer_occupation: LayerMask::layer(3),
                height: 4.0,
                thickness: 0.25,
                ..Default::default()
            },
        );
        let placement = Placement::at(Vec3::new(0.0, 0.0, 7.5));
        src.enable(&mut pool, &mut bundle, &placement);
        src.enable(&mut pool, &mut bundle, &placement);

        assert_eq!(src.registration(), Registration::Static);
        assert_eq!(bundle.static_obstacles().len(), 1);
        let vl = pool.get(src.loops()[0]).unwrap();
        assert!(vl.collision_enabled);
        assert_eq!(vl.layer_occupation, LayerMask::layer(3));
        assert_eq!(vl.baseline, 7.5);
        assert_eq!(vl.height, 4.0);
        assert_eq!(vl.thickness, 0.25);
    }

    #[test]
    fn dynamic_sources_join_the_dynamic_set() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let mut src = ObstacleSource::new(
            ShapeKind::Circle(CircleShape::new(2.0)),
            ObstacleSettings {
                dynamic: true,
                ..Default::default()
            },
        );
        src.enable(&mut pool, &mut bundle, &Placement::default());
        assert_eq!(src.registration(), Registration::Dynamic);
        assert_eq!(bundle.dynamic_obstacles().len(), 1);
        assert!(bundle.static_obstacles().is_empty());
    }

    #[test]
    fn disable_is_safe_and_makes_loops_inert() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let mut src = ObstacleSource::new(
            polygon_paths(&[tri()]),
            ObstacleSettings::default(),
        );

        // Never enabled: a plain no-op.
        src.disable(&mut pool, &mut bundle);

        let placement = Placement::default();
        src.enable(&mut pool, &mut bundle, &placement);
        src.disable(&mut pool, &mut bundle);
        assert_eq!(src.registration(), Registration::Unregistered);
        assert!(bundle.static_obstacles().is_empty());
        assert!(!pool.get(src.loops()[0]).unwrap().collision_enabled);

        // Re-enable restores membership without duplicating.
        src.enable(&mut pool, &mut bundle, &placement);
        src.enable(&mut pool, &mut bundle, &placement);
        assert_eq!(bundle.static_obstacles().len(), 1);
        assert!(pool.get(src.loops()[0]).unwrap().collision_enabled);
    }

    #[test]
    fn destroy_without_disable_releases_everything() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let mut src = ObstacleSource::new(
            polygon_paths(&[tri(), quad()]),
            ObstacleSettings::default(),
        );
        src.enable(&mut pool, &mut bundle, &Placement::default());
        assert_eq!(bundle.static_obstacles().len(), 2);

        src.destroy(&mut pool, &mut bundle);
        assert!(src.loops().is_empty());
        assert!(bundle.static_obstacles().is_empty());
        assert_eq!(pool.live(), 0);
        assert_eq!(pool.rented_total(), pool.released_total());

        // Destroy again: nothing left to do.
        src.destroy(&mut pool, &mut bundle);
        assert_eq!(pool.released_total(), pool.rented_total());
    }

    #[test]
    fn update_rebuilds_only_when_configured() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let mut src = ObstacleSource::new(
            ShapeKind::Circle(CircleShape::new(1.0)),
            ObstacleSettings {
                dynamic: true,
                always_update: true,
                samples: 8,
                ..Default::default()
            },
        );
        let mut placement = Placement::default();
        src.enable(&mut pool, &mut bundle, &placement);
        let before = pool.get(src.loops()[0]).unwrap().point(0);

        placement.position = Vec3::new(5.0, 0.0, 0.0);
        src.update(&mut pool, &mut bundle, &placement);
        let after = pool.get(src.loops()[0]).unwrap().point(0);
        assert_eq!(after, before + Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(bundle.dynamic_obstacles().len(), 1);

        // A static source ignores update.
        src.settings.dynamic = false;
        src.settings.always_update = false;
        placement.position = Vec3::ZERO;
        src.update(&mut pool, &mut bundle, &placement);
        assert_eq!(pool.get(src.loops()[0]).unwrap().point(0), after);
    }

    #[test]
    fn grow_while_registered_registers_new_loops() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let mut src = ObstacleSource::new(
            polygon_paths(&[tri()]),
            ObstacleSettings {
                dynamic: true,
                ..Default::default()
            },
        );
        let placement = Placement::default();
        src.enable(&mut pool, &mut bundle, &placement);
        assert_eq!(bundle.dynamic_obstacles().len(), 1);

        if let ShapeKind::Polygon(p) = src.shape_mut() {
            p.paths.push(quad().iter().map(|&(x, y)| Vec2::new(x, y)).collect());
        }
        src.build(&mut pool, &mut bundle, &placement);
        assert_eq!(src.loops().len(), 2);
        assert_eq!(bundle.dynamic_obstacles().len(), 2);
    }

    #[test]
    fn shrink_while_registered_unregisters_released_loops() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let mut src = ObstacleSource::new(
            polygon_paths(&[tri(), quad()]),
            ObstacleSettings {
                dynamic: true,
                ..Default::default()
            },
        );
        let placement = Placement::default();
        src.enable(&mut pool, &mut bundle, &placement);
        assert_eq!(bundle.dynamic_obstacles().len(), 2);

        if let ShapeKind::Polygon(p) = src.shape_mut() {
            p.paths.truncate(1);
        }
        src.build(&mut pool, &mut bundle, &placement);
        assert_eq!(bundle.dynamic_obstacles().len(), 1);
        assert_eq!(bundle.dynamic_obstacles()[0], src.loops()[0]);
    }

    #[test]
    fn degenerate_shapes_yield_no_loops_and_no_registration() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let mut src = ObstacleSource::new(
            ShapeKind::Edge(EdgeShape::new(Vec::new())),
            ObstacleSettings::default(),
        );
        src.enable(&mut pool, &mut bundle, &Placement::default());
        assert!(src.loops().is_empty());
        assert!(bundle.static_obstacles().is_empty());
        assert_eq!(pool.live(), 0);
    }

    #[test]
    fn double_sided_edge_owns_two_open_loops() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let mut src = ObstacleSource::new(
            ShapeKind::Edge(EdgeShape::new(vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(4.0, 0.0),
            ])),
            ObstacleSettings {
                double_sided: true,
                ..Default::default()
            },
        );
        src.build(&mut pool, &mut bundle, &Placement::default());
        assert_eq!(src.loops().len(), 2);
        for &h in src.loops() {
            let vl = pool.get(h).unwrap();
            assert!(vl.edge);
            assert_eq!(vl.len(), 2);
        }
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = ObstacleSettings {
            dynamic: true,
            layer_occupation: LayerMask::layer(2),
            samples: 48,
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: ObstacleSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }
}
