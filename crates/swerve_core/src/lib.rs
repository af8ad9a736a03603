//! Swerve Core
//!
//! Solver-facing data model for the avoidance bridge:
//! - Generational pool (rent/release of reusable records)
//! - Vertex loops (obstacle rings and open polylines)
//! - Agent records and their template defaults
//! - Layer masks and working-plane math
//! - The solver interface consumed each simulation step

pub mod agent;
pub mod layer;
pub mod math;
pub mod obstacle;
pub mod pool;
pub mod solver;

pub use agent::AgentRecord;
pub use layer::LayerMask;
pub use math::AxisPair;
pub use obstacle::{ObstaclePool, VertexLoop};
pub use pool::{Handle, Pool, PoolError, Recycle};
pub use solver::{AvoidanceSolver, PassthroughSolver, StepContext};

pub use glam;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
