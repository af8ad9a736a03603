//! Solver interface
//!
//! The avoidance solver itself (ORCA or similar) lives outside this
//! workspace; these types define exactly what it reads and writes each
//! step. The bridge finishes every registration, resize, and data push
//! before calling [`AvoidanceSolver::step`], and reads results only after
//! it returns, so the context is always a complete snapshot.

use crate::agent::AgentRecord;
use crate::obstacle::{ObstaclePool, VertexLoop};
use crate::pool::{Handle, Pool};

/// Everything the solver sees for one simulation step.
pub struct StepContext<'a> {
    /// All live agent records; the solver writes `velocity` (and may
    /// advance `position` on the working plane).
    pub agents: &'a mut Pool<AgentRecord>,
    /// Storage behind the obstacle handle sets.
    pub obstacles: &'a ObstaclePool,
    /// Loops built once at source creation.
    pub static_obstacles: &'a [Handle<VertexLoop>],
    /// Loops rebuilt while the simulation runs.
    pub dynamic_obstacles: &'a [Handle<VertexLoop>],
    /// Step duration in seconds.
    pub delta: f32,
}

/// A local collision-avoidance solver.
///
/// Obstacle membership changes take effect on the next `step` call; the
/// bridge never mutates the context's sets while a step is in flight.
pub trait AvoidanceSolver {
    fn step(&mut self, ctx: StepContext<'_>);
}

/// Trivial solver: resolved velocity = preferred velocity, clamped to
/// `max_speed`, position integrated over the step.
///
/// Performs no avoidance; stands in for a real solver in tests and
/// examples, and as a fallback while one is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughSolver;

impl AvoidanceSolver for PassthroughSolver {
    fn step(&mut self, ctx: StepContext<'_>) {
        for (_, agent) in ctx.agents.iter_mut() {
            if !agent.navigation_enabled {
                agent.velocity = glam::Vec3::ZERO;
                continue;
            }
            let mut v = agent.pref_velocity;
            let speed = v.length();
            if speed > agent.max_speed && speed > 0.0 {
                v *= agent.max_speed / speed;
            }
            agent.velocity = v;
            agent.position += v * ctx.delta;
        }
    }
}
