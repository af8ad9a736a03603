//! Swerve Bridge
//!
//! Keeps an external local-avoidance solver synchronized with a host
//! scene: collider shapes become pooled vertex loops, moving entities
//! become agent records, and a [`Bundle`] aggregates both for the solver
//! to consume once per step.
//!
//! Per-step flow: dynamic [`ObstacleSource`]s rebuild their loops through
//! the projectors (resizing pooled storage in place), proxies push
//! positions and preferred velocities, [`Bundle::step`] hands the solver a
//! complete snapshot, and proxies read the resolved velocities back.

pub mod bundle;
pub mod projector;
pub mod proxy;
pub mod shape;
pub mod source;

pub use bundle::Bundle;
pub use proxy::{AgentProxy, AgentTemplate, BorrowedProxy, OwnedProxy};
pub use shape::{CircleShape, EdgeShape, Placement, PolygonShape};
pub use source::{ObstacleSettings, ObstacleSource, Registration, ShapeKind};
