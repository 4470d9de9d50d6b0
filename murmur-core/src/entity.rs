//! The capability surface shared by everything in the simulation.
//!
//! Agents, circular barriers and drifting clouds all steer each other, but
//! none of them share a concrete type. Instead each kind answers whichever
//! of three optional queries it supports; the engine folds the answers into
//! forces without knowing who is answering. A new entity kind participates
//! by implementing [`Entity`] and opting into the queries it cares about.

use crate::vector::Vector2;

/// A point in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Free vector pointing from `self` to `other`.
    pub fn vector_to(&self, other: &Position) -> Vector2 {
        Vector2::new(other.x - self.x, other.y - self.y)
    }
}

/// Which steering weight a repulsion contribution is scaled by.
///
/// Peer agents push through the separation weight, circular barriers through
/// the obstacle weight. The tag keeps the two independently tunable while the
/// query surface stays uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepulsionChannel {
    Separation,
    Obstacle,
}

/// A proximity-scaled push returned by [`Entity::repulsion`].
#[derive(Debug, Clone, Copy)]
pub struct Repulsion {
    pub force: Vector2,
    pub channel: RepulsionChannel,
}

pub trait Entity {
    fn position(&self) -> Position;

    /// Direction vector averaged into a neighbor's alignment target.
    /// Only self-propelled agents expose one.
    fn pointer(&self) -> Option<Vector2> {
        None
    }

    /// Point averaged into a neighbor's cohesion target.
    fn attraction_point(&self) -> Option<Position> {
        None
    }

    /// Push on a querier standing at `from`, or `None` when the querier is
    /// out of this responder's range. Magnitude follows the shared falloff
    /// in [`radial_push`]; direction points from responder toward `from`.
    fn repulsion(&self, from: Position, sight_distance: f64) -> Option<Repulsion> {
        let _ = (from, sight_distance);
        None
    }
}

/// Falloff weight `(sight_distance − d)²` with the net distance clamped to
/// zero first, so overlapping circles (negative net distance) weigh
/// `sight_distance²` instead of blowing up. Smoothly reaches zero at the
/// sight boundary and is finite everywhere.
pub fn falloff_weight(net_distance: f64, sight_distance: f64) -> f64 {
    let gap = sight_distance - net_distance.max(0.0);
    gap * gap
}

/// Push from a responder at `source` on a querier at `from`, with the
/// responder-specific `net_distance` already computed (center distance for
/// points, minus the radius for circles). The caller gates on range; this
/// only shapes the vector. A coincident querier gets the zero vector, since
/// no push direction is defined at distance zero.
pub fn radial_push(source: Position, from: Position, net_distance: f64, sight_distance: f64) -> Vector2 {
    let weight = falloff_weight(net_distance, sight_distance);
    source.vector_to(&from).with_magnitude(weight)
}
