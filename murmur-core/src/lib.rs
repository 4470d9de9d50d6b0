//! Flocking simulation core: a uniform spatial grid for neighbor queries
//! and a force-based steering update over capability-polymorphic entities.
//!
//! The driver (rendering/input loop) owns the frame clock and calls
//! [`Flock::tick`] once per frame with a fixed `dt`; the engine rebuilds the
//! grid, computes every agent's steering from that snapshot, then applies
//! directions and positions. Entities expose position, optionally a heading
//! for rendering, and the three capability queries on [`Entity`] — nothing
//! more crosses the boundary.

pub mod angles;
pub mod balloon;
pub mod boid;
pub mod engine;
pub mod entity;
pub mod grid;
pub mod vector;

pub use balloon::{Barrier, Cloud};
pub use boid::{Boid, Trail};
pub use engine::{BoundaryPolicy, Flock, FlockConfig, FlockWeights};
pub use entity::{Entity, Position, Repulsion, RepulsionChannel};
pub use grid::{GridCell, SpatialGrid};
pub use vector::{Vector2, VectorError};
