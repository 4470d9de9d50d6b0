//! Circular obstacles and drifters. A barrier is grown under the cursor and
//! repels the flock; a cloud drifts across the world, attracts boids and is
//! gently shoved around by them in return.

use std::f64::consts::TAU;

use crate::entity::{radial_push, Entity, Position, Repulsion, RepulsionChannel};
use crate::vector::Vector2;

/// Radius gained per second while a balloon is being grown.
pub const GROWTH_RATE: f64 = 50.0;

/// A user-grown circular barrier. Radius only increases, capped at
/// `max_radius`; once released, an undersized or pop-marked barrier is
/// eligible for removal.
#[derive(Debug, Clone)]
pub struct Barrier {
    pub position: Position,
    pub radius: f64,
    /// Marked to burst as soon as it is released.
    pub pop: bool,
    min_radius: f64,
    max_radius: f64,
}

impl Barrier {
    pub fn new(position: Position, pop: bool, min_radius: f64, max_radius: f64) -> Self {
        assert!(min_radius > 0.0 && max_radius >= min_radius);
        Self {
            position,
            radius: 0.0,
            pop,
            min_radius,
            max_radius,
        }
    }

    pub fn min_radius(&self) -> f64 {
        self.min_radius
    }

    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    /// Monotonic growth while held, capped at the maximum radius.
    pub fn expand(&mut self, dt: f64) {
        self.radius = (self.radius + GROWTH_RATE * dt).min(self.max_radius);
    }

    /// True once this barrier should be reaped: pop-marked, or released
    /// before reaching the minimum radius.
    pub fn spent(&self) -> bool {
        self.pop || self.radius < self.min_radius
    }

    pub fn intersects(&self, point: Position) -> bool {
        self.position.distance_to(&point) < self.radius
    }
}

impl Entity for Barrier {
    fn position(&self) -> Position {
        self.position
    }

    fn repulsion(&self, from: Position, sight_distance: f64) -> Option<Repulsion> {
        // Net distance is measured from the rim, and goes negative inside.
        let net = self.position.distance_to(&from) - self.radius;
        if net >= sight_distance {
            return None;
        }
        Some(Repulsion {
            force: radial_push(self.position, from, net, sight_distance),
            channel: RepulsionChannel::Obstacle,
        })
    }
}

/// An ambient drifter: constant sideways drift plus a sine-wave bob, shoved
/// by the summed headings of flock members underneath it, wrapping at the
/// world edges. Boids treat it as an attraction point and shelter under it.
#[derive(Debug, Clone)]
pub struct Cloud {
    pub position: Position,
    pub radius: f64,
    pub drift: Vector2,
    min_radius: f64,
    max_radius: f64,
}

impl Cloud {
    /// Vertical bob amplitude, world units.
    pub const BOB_AMPLITUDE: f64 = 1.0;
    /// Seconds per full bob cycle.
    pub const BOB_CYCLE_SECONDS: f64 = 3.0;
    /// Divisor damping the flock's push so clouds lag the birds.
    const PUSH_DAMPING: f64 = 20.0;

    pub fn new(position: Position, drift: Vector2, min_radius: f64, max_radius: f64) -> Self {
        assert!(min_radius > 0.0 && max_radius >= min_radius);
        Self {
            position,
            radius: 0.0,
            drift,
            min_radius,
            max_radius,
        }
    }

    pub fn min_radius(&self) -> f64 {
        self.min_radius
    }

    pub fn expand(&mut self, dt: f64) {
        self.radius = (self.radius + GROWTH_RATE * dt).min(self.max_radius);
    }

    pub fn spent(&self) -> bool {
        self.radius < self.min_radius
    }

    pub fn intersects(&self, point: Position) -> bool {
        self.position.distance_to(&point) < self.radius
    }

    /// One move step: drift, bob, damped flock push, wrap. `push` is the
    /// pointer sum gathered during the read-only phase of the same tick.
    pub(crate) fn advance(
        &mut self,
        push: Vector2,
        dt: f64,
        run_time_seconds: f64,
        width: f64,
        height: f64,
    ) {
        self.position.x += self.drift.dx * dt;
        self.position.y += self.drift.dy * dt;

        let wave = (run_time_seconds * TAU / Self::BOB_CYCLE_SECONDS).sin() * Self::BOB_AMPLITUDE;
        self.position.y += wave * dt;

        let damped = push * (1.0 / Self::PUSH_DAMPING);
        self.position.x += damped.dx * dt;
        self.position.y += damped.dy * dt;

        self.position.x = self.position.x.rem_euclid(width);
        self.position.y = self.position.y.rem_euclid(height);
    }
}

impl Entity for Cloud {
    fn position(&self) -> Position {
        self.position
    }

    fn attraction_point(&self) -> Option<Position> {
        Some(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barrier_growth_is_capped() {
        let mut barrier = Barrier::new(Position::new(0.0, 0.0), false, 10.0, 40.0);
        for _ in 0..100 {
            barrier.expand(0.1);
        }
        assert_eq!(barrier.radius, 40.0);
    }

    #[test]
    fn undersized_or_popped_barriers_are_spent() {
        let mut barrier = Barrier::new(Position::new(0.0, 0.0), false, 10.0, 40.0);
        assert!(barrier.spent());
        barrier.expand(1.0);
        assert!(!barrier.spent());
        barrier.pop = true;
        assert!(barrier.spent());
    }

    #[test]
    fn barrier_repels_on_the_obstacle_channel_from_its_rim() {
        let mut barrier = Barrier::new(Position::new(200.0, 200.0), false, 5.0, 40.0);
        barrier.radius = 10.0;

        // querier inside the circle: net distance is negative, weight clamps
        // to sight squared, push points away from the center
        let push = barrier.repulsion(Position::new(205.0, 200.0), 55.0).unwrap();
        assert_eq!(push.channel, RepulsionChannel::Obstacle);
        assert!(push.force.dx > 0.0);
        assert_eq!(push.force.dy, 0.0);
        assert!((push.force.magnitude() - 55.0 * 55.0).abs() < 1e-6);
    }

    #[test]
    fn barrier_repulsion_stops_past_sight_range() {
        let mut barrier = Barrier::new(Position::new(0.0, 0.0), false, 5.0, 40.0);
        barrier.radius = 10.0;
        assert!(barrier.repulsion(Position::new(66.0, 0.0), 55.0).is_none());
        assert!(barrier.repulsion(Position::new(60.0, 0.0), 55.0).is_some());
    }

    #[test]
    fn cloud_wraps_at_world_edges() {
        let mut cloud = Cloud::new(
            Position::new(799.0, 300.0),
            Vector2::new(20.0, 0.0),
            5.0,
            40.0,
        );
        cloud.advance(Vector2::zero(), 0.1, 0.0, 800.0, 600.0);
        assert!(cloud.position.x < 800.0);
        assert!(cloud.position.x >= 0.0);
    }

    #[test]
    fn cloud_attracts_but_never_repels() {
        let cloud = Cloud::new(Position::new(5.0, 5.0), Vector2::zero(), 5.0, 40.0);
        assert_eq!(cloud.attraction_point(), Some(Position::new(5.0, 5.0)));
        assert!(cloud.pointer().is_none());
        assert!(cloud.repulsion(Position::new(6.0, 5.0), 55.0).is_none());
    }
}
