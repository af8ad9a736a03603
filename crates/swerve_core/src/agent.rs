//! Solver-side agent records
//!
//! One record per negotiating entity. The bridge writes position and
//! preferred velocity before the solver steps; the solver writes the
//! resolved velocity (and optionally position) back into the same record.

use crate::layer::LayerMask;
use crate::pool::Recycle;
use glam::Vec3;

/// Mutable agent slot consumed by the solver.
///
/// Default values match the bridge's stock tuning; proxies overwrite them
/// from their template on association and on settings commits.
#[derive(Debug, Clone)]
pub struct AgentRecord {
    /// World position. The plane-perpendicular component is owned by the
    /// host scene, not the solver.
    pub position: Vec3,
    /// Desired velocity for this step (input).
    pub pref_velocity: Vec3,
    /// Collision-free velocity computed by the solver (output).
    pub velocity: Vec3,

    /// Collision radius against other agents.
    pub radius: f32,
    /// Collision radius against obstacles.
    pub radius_obst: f32,
    /// Vertical extent of the agent.
    pub height: f32,
    /// Hard cap on the resolved speed.
    pub max_speed: f32,
    /// Neighbor cap; higher is slower.
    pub max_neighbors: u32,
    /// Neighbor probe distance.
    pub neighbor_dist: f32,
    /// Look-ahead window against agents, in seconds.
    pub time_horizon: f32,
    /// Look-ahead window against obstacles, in seconds.
    pub time_horizon_obst: f32,
    /// Layers this agent exists on.
    pub layer_occupation: LayerMask,
    /// Layers this agent ignores.
    pub layer_ignore: LayerMask,
    /// When false the agent stops negotiating but may remain visible to
    /// others through `collision_enabled`.
    pub navigation_enabled: bool,
    /// When false other agents do not consider this one at all.
    pub collision_enabled: bool,
}

impl Default for AgentRecord {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            pref_velocity: Vec3::ZERO,
            velocity: Vec3::ZERO,
            radius: 0.5,
            radius_obst: 0.5,
            height: 1.0,
            max_speed: 1.0,
            max_neighbors: 15,
            neighbor_dist: 20.0,
            time_horizon: 15.0,
            time_horizon_obst: 1.2,
            layer_occupation: LayerMask::ANY,
            layer_ignore: LayerMask::NONE,
            navigation_enabled: true,
            collision_enabled: true,
        }
    }
}

impl Recycle for AgentRecord {
    fn recycle(&mut self) {
        *self = AgentRecord::default();
    }
}
