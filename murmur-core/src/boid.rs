//! The self-propelled agent. Direction is mutated each tick by the flocking
//! engine; position by the separate move step. Everything else here is
//! derived display state a renderer can read (neighbor density, trail).

use std::collections::VecDeque;
use std::f64::consts::TAU;

use rand::Rng;

use crate::entity::{radial_push, Entity, Position, Repulsion, RepulsionChannel};
use crate::vector::Vector2;

/// How long a trail lingers, seconds.
pub const TRAIL_DURATION: f64 = 0.4;
/// Trail sampling rate, points per second.
pub const TRAIL_SAMPLES_PER_SECOND: f64 = 100.0;

/// Capped ring of past positions, sampled at a fixed interval. Purely
/// cosmetic; the simulation never reads it back.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<Position>,
    max_points: usize,
    sample_interval: f64,
    pending_seconds: f64,
}

impl Trail {
    pub fn new(origin: Position) -> Self {
        let mut points = VecDeque::new();
        points.push_back(origin);
        Self {
            points,
            max_points: (TRAIL_DURATION * TRAIL_SAMPLES_PER_SECOND) as usize,
            sample_interval: 1.0 / TRAIL_SAMPLES_PER_SECOND,
            pending_seconds: 0.0,
        }
    }

    /// Accumulates `dt` and records a point once per sample interval,
    /// dropping the oldest beyond the cap.
    pub fn record(&mut self, position: Position, dt: f64) {
        self.pending_seconds += dt;
        if self.pending_seconds >= self.sample_interval {
            self.pending_seconds = 0.0;
            self.points.push_back(position);
        }
        while self.points.len() > self.max_points {
            self.points.pop_front();
        }
    }

    pub fn points(&self) -> impl Iterator<Item = &Position> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A single flocking agent.
#[derive(Debug, Clone)]
pub struct Boid {
    pub position: Position,
    pub direction: Vector2,
    /// Inner radius inside which this boid pushes peers away.
    pub personal_space: f64,
    neighbor_count: usize,
    trail: Trail,
}

impl Boid {
    pub fn new(position: Position, direction: Vector2, personal_space: f64) -> Self {
        Self {
            position,
            direction,
            personal_space,
            neighbor_count: 0,
            trail: Trail::new(position),
        }
    }

    /// Uniform random position and heading, launched at `speed`.
    pub fn random<R: Rng>(
        width: f64,
        height: f64,
        speed: f64,
        personal_space: f64,
        rng: &mut R,
    ) -> Self {
        let position = Position::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height));
        let direction = Vector2::from_polar(speed, rng.gen_range(0.0..TAU));
        Self::new(position, direction, personal_space)
    }

    pub fn heading(&self) -> f64 {
        self.direction.heading()
    }

    /// Alignment contributors seen last tick. Display-only; has no feedback
    /// into the physics.
    pub fn neighbor_count(&self) -> usize {
        self.neighbor_count
    }

    pub(crate) fn set_neighbor_count(&mut self, count: usize) {
        self.neighbor_count = count;
    }

    /// Crowding ratio in `[0, 1]` against a target neighbor count, for
    /// color-by-density rendering.
    pub fn crowding(&self, target_neighbors: usize) -> f64 {
        if target_neighbors == 0 {
            return 1.0;
        }
        (self.neighbor_count as f64 / target_neighbors as f64).min(1.0)
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub(crate) fn record_trail(&mut self, dt: f64) {
        let position = self.position;
        self.trail.record(position, dt);
    }

    /// Hit test against this boid's personal space, used for click removal.
    pub fn intersects(&self, point: Position) -> bool {
        self.position.distance_to(&point) < self.personal_space
    }
}

impl Entity for Boid {
    fn position(&self) -> Position {
        self.position
    }

    fn pointer(&self) -> Option<Vector2> {
        Some(self.direction)
    }

    fn attraction_point(&self) -> Option<Position> {
        Some(self.position)
    }

    fn repulsion(&self, from: Position, sight_distance: f64) -> Option<Repulsion> {
        let distance = self.position.distance_to(&from);
        if distance >= self.personal_space {
            return None;
        }
        Some(Repulsion {
            force: radial_push(self.position, from, distance, sight_distance),
            channel: RepulsionChannel::Separation,
        })
    }
}
