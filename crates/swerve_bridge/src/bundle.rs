//! The bundle: agents + obstacle sets + the solver that reads them
//!
//! One bundle per logical world, created explicitly and passed to every
//! source and proxy that targets it. Membership operations are idempotent
//! and validate handle provenance; a bad handle costs a log line, never a
//! corrupted set.

use glam::Vec3;
use swerve_core::agent::AgentRecord;
use swerve_core::obstacle::{ObstaclePool, VertexLoop};
use swerve_core::pool::{Handle, Pool, PoolError};
use swerve_core::solver::{AvoidanceSolver, PassthroughSolver, StepContext};
use tracing::warn;

/// Aggregate the solver consumes each step.
pub struct Bundle {
    agents: Pool<AgentRecord>,
    static_obstacles: Vec<Handle<VertexLoop>>,
    dynamic_obstacles: Vec<Handle<VertexLoop>>,
    solver: Box<dyn AvoidanceSolver>,
}

impl Default for Bundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Bundle {
    /// Bundle backed by the pass-through solver.
    pub fn new() -> Self {
        Self::with_solver(Box::new(PassthroughSolver))
    }

    pub fn with_solver(solver: Box<dyn AvoidanceSolver>) -> Self {
        Self {
            agents: Pool::new(),
            static_obstacles: Vec::new(),
            dynamic_obstacles: Vec::new(),
            solver,
        }
    }

    pub fn set_solver(&mut self, solver: Box<dyn AvoidanceSolver>) {
        self.solver = solver;
    }

    // ------------------------------------------------------------------
    // Agents
    // ------------------------------------------------------------------

    /// Rents a fresh agent record (default template) at `position`.
    pub fn add_agent(&mut self, position: Vec3) -> Handle<AgentRecord> {
        let handle = self.agents.rent();
        // Rented slots are pre-recycled to defaults; only position is ours.
        self.agents
            .get_mut(handle)
            .expect("freshly rented handle is live")
            .position = position;
        handle
    }

    /// Releases an agent record. Unknown or stale handles are rejected.
    pub fn remove_agent(&mut self, handle: Handle<AgentRecord>) -> bool {
        match self.agents.release(handle) {
            Ok(()) => true,
            Err(err) => {
                warn!(?handle, %err, "ignoring remove_agent with invalid handle");
                false
            }
        }
    }

    pub fn agent(&self, handle: Handle<AgentRecord>) -> Result<&AgentRecord, PoolError> {
        self.agents.get(handle)
    }

    pub fn agent_mut(&mut self, handle: Handle<AgentRecord>) -> Result<&mut AgentRecord, PoolError> {
        self.agents.get_mut(handle)
    }

    pub fn contains_agent(&self, handle: Handle<AgentRecord>) -> bool {
        self.agents.contains(handle)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.live()
    }

    /// Rent/release bookkeeping of the underlying agent pool.
    pub fn agent_pool_stats(&self) -> (u64, u64) {
        (self.agents.rented_total(), self.agents.released_total())
    }

    // ------------------------------------------------------------------
    // Obstacles
    // ------------------------------------------------------------------

    /// Adds a loop to the static set. Idempotent; rejects handles that are
    /// not live in `pool`, loops with no points, and loops already in the
    /// dynamic set. Returns whether membership changed.
    pub fn add_static_obstacle(&mut self, pool: &ObstaclePool, handle: Handle<VertexLoop>) -> bool {
        Self::add_obstacle(
            pool,
            handle,
            &mut self.static_obstacles,
            &self.dynamic_obstacles,
            "static",
        )
    }

    /// Adds a loop to the dynamic set; mirror of [`Self::add_static_obstacle`].
    pub fn add_dynamic_obstacle(&mut self, pool: &ObstaclePool, handle: Handle<VertexLoop>) -> bool {
        Self::add_obstacle(
            pool,
            handle,
            &mut self.dynamic_obstacles,
            &self.static_obstacles,
            "dynamic",
        )
    }

    fn add_obstacle(
        pool: &ObstaclePool,
        handle: Handle<VertexLoop>,
        set: &mut Vec<Handle<VertexLoop>>,
        other: &[Handle<VertexLoop>],
        label: &str,
    ) -> bool {
        let vl = match pool.get(handle) {
            Ok(vl) => vl,
            Err(err) => {
                warn!(?handle, %err, "rejecting {label} obstacle with invalid handle");
                return false;
            }
        };
        if vl.is_empty() {
            warn!(?handle, "rejecting {label} obstacle with zero points");
            return false;
        }
        if other.contains(&handle) {
            warn!(?handle, "rejecting {label} obstacle already in the other set");
            return false;
        }
        if set.contains(&handle) {
            return false;
        }
        set.push(handle);
        true
    }

    /// Removes a loop from the static set. Removing an absent member is a
    /// no-op. Returns whether membership changed.
    pub fn remove_static_obstacle(&mut self, handle: Handle<VertexLoop>) -> bool {
        Self::remove_obstacle(&mut self.static_obstacles, handle)
    }

    pub fn remove_dynamic_obstacle(&mut self, handle: Handle<VertexLoop>) -> bool {
        Self::remove_obstacle(&mut self.dynamic_obstacles, handle)
    }

    fn remove_obstacle(set: &mut Vec<Handle<VertexLoop>>, handle: Handle<VertexLoop>) -> bool {
        match set.iter().position(|h| *h == handle) {
            Some(i) => {
                // Preserve registration order for the surviving members.
                set.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn static_obstacles(&self) -> &[Handle<VertexLoop>] {
        &self.static_obstacles
    }

    pub fn dynamic_obstacles(&self) -> &[Handle<VertexLoop>] {
        &self.dynamic_obstacles
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Empties all three member sets.
    ///
    /// With `dispose_members` the agent pool drops its slot storage too
    /// (full teardown); otherwise slots are recycled for reuse across
    /// world loads. Obstacle loop storage belongs to the obstacle pool
    /// and is released by their owning sources.
    pub fn clear(&mut self, dispose_members: bool) {
        self.static_obstacles.clear();
        self.dynamic_obstacles.clear();
        if dispose_members {
            self.agents.dispose();
            self.static_obstacles.shrink_to_fit();
            self.dynamic_obstacles.shrink_to_fit();
        } else {
            self.agents.release_all();
        }
    }

    /// Runs the solver over the current, fully synchronized snapshot.
    ///
    /// All adds/removes/resizes for the step must be finished before this
    /// call; results are read back from agent records after it returns.
    pub fn step(&mut self, pool: &ObstaclePool, delta: f32) {
        self.solver.step(StepContext {
            agents: &mut self.agents,
            obstacles: pool,
            static_obstacles: &self.static_obstacles,
            dynamic_obstacles: &self.dynamic_obstacles,
            delta,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rent_loop(pool: &mut ObstaclePool, points: usize) -> Handle<VertexLoop> {
        let h = pool.rent();
        pool.get_mut(h).unwrap().resize_to(points);
        h
    }

    #[test]
    fn add_is_idempotent() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let h = rent_loop(&mut pool, 3);

        assert!(bundle.add_static_obstacle(&pool, h));
        assert!(!bundle.add_static_obstacle(&pool, h));
        assert_eq!(bundle.static_obstacles().len(), 1);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let h = rent_loop(&mut pool, 3);

        assert!(!bundle.remove_static_obstacle(h));
        bundle.add_static_obstacle(&pool, h);
        assert!(bundle.remove_static_obstacle(h));
        assert!(!bundle.remove_static_obstacle(h));
        assert!(bundle.static_obstacles().is_empty());
    }

    #[test]
    fn empty_and_stale_loops_are_rejected() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();

        let empty = pool.rent();
        assert!(!bundle.add_static_obstacle(&pool, empty));

        let h = rent_loop(&mut pool, 3);
        pool.release(h).unwrap();
        assert!(!bundle.add_dynamic_obstacle(&pool, h));
        assert!(bundle.dynamic_obstacles().is_empty());
    }

    #[test]
    fn a_loop_joins_one_set_only() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let h = rent_loop(&mut pool, 4);

        assert!(bundle.add_dynamic_obstacle(&pool, h));
        assert!(!bundle.add_static_obstacle(&pool, h));
        assert_eq!(bundle.static_obstacles().len(), 0);
        assert_eq!(bundle.dynamic_obstacles().len(), 1);
    }

    #[test]
    fn remove_preserves_order() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let a = rent_loop(&mut pool, 3);
        let b = rent_loop(&mut pool, 3);
        let c = rent_loop(&mut pool, 3);
        bundle.add_static_obstacle(&pool, a);
        bundle.add_static_obstacle(&pool, b);
        bundle.add_static_obstacle(&pool, c);

        bundle.remove_static_obstacle(b);
        assert_eq!(bundle.static_obstacles(), &[a, c]);
    }

    #[test]
    fn agent_lifecycle_and_foreign_handles() {
        let mut bundle = Bundle::new();
        let h = bundle.add_agent(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(bundle.agent(h).unwrap().position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(bundle.agent_count(), 1);

        assert!(bundle.remove_agent(h));
        assert!(!bundle.remove_agent(h));
        assert_eq!(bundle.agent_count(), 0);
        let (rented, released) = bundle.agent_pool_stats();
        assert_eq!(rented, released);
    }

    #[test]
    fn reused_agent_slot_starts_from_defaults() {
        let mut bundle = Bundle::new();
        let h = bundle.add_agent(Vec3::ZERO);
        bundle.agent_mut(h).unwrap().max_neighbors = 1;
        bundle.agent_mut(h).unwrap().pref_velocity = Vec3::ONE;
        bundle.remove_agent(h);

        let h2 = bundle.add_agent(Vec3::X);
        let rec = bundle.agent(h2).unwrap();
        assert_eq!(rec.max_neighbors, 15);
        assert_eq!(rec.pref_velocity, Vec3::ZERO);
        assert_eq!(rec.position, Vec3::X);
    }

    #[test]
    fn clear_empties_all_sets() {
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let h = rent_loop(&mut pool, 3);
        bundle.add_static_obstacle(&pool, h);
        let a = bundle.add_agent(Vec3::ZERO);

        bundle.clear(false);
        assert!(bundle.static_obstacles().is_empty());
        assert_eq!(bundle.agent_count(), 0);
        assert!(!bundle.contains_agent(a));

        // Reusable after a non-disposing clear.
        let _ = bundle.add_agent(Vec3::ZERO);
        assert_eq!(bundle.agent_count(), 1);
    }

    #[test]
    fn step_reaches_the_solver_with_a_full_snapshot() {
        use std::cell::Cell;
        use std::rc::Rc;

        #[derive(Clone, Default)]
        struct Seen {
            agents: Cell<usize>,
            stat: Cell<usize>,
            dynam: Cell<usize>,
        }
        struct CountingSolver(Rc<Seen>);
        impl AvoidanceSolver for CountingSolver {
            fn step(&mut self, ctx: StepContext<'_>) {
                self.0.agents.set(ctx.agents.live());
                self.0.stat.set(ctx.static_obstacles.len());
                self.0.dynam.set(ctx.dynamic_obstacles.len());
                for h in ctx.static_obstacles.iter().chain(ctx.dynamic_obstacles) {
                    assert!(ctx.obstacles.get(*h).unwrap().len() >= 1);
                }
            }
        }

        let seen = Rc::new(Seen::default());
        let mut pool = ObstaclePool::new();
        let mut bundle = Bundle::with_solver(Box::new(CountingSolver(seen.clone())));
        let s = rent_loop(&mut pool, 4);
        let d = rent_loop(&mut pool, 5);
        bundle.add_static_obstacle(&pool, s);
        bundle.add_dynamic_obstacle(&pool, d);
        bundle.add_agent(Vec3::ZERO);
        bundle.add_agent(Vec3::X);

        bundle.step(&pool, 0.016);
        assert_eq!(seen.agents.get(), 2);
        assert_eq!(seen.stat.get(), 1);
        assert_eq!(seen.dynam.get(), 1);
    }

    #[test]
    fn passthrough_step_moves_agents() {
        let pool = ObstaclePool::new();
        let mut bundle = Bundle::new();
        let h = bundle.add_agent(Vec3::ZERO);
        bundle.agent_mut(h).unwrap().pref_velocity = Vec3::new(0.5, 0.0, 0.0);
        bundle.step(&pool, 1.0);
        assert!((bundle.agent(h).unwrap().position.x - 0.5).abs() < 1e-6);
    }
}
