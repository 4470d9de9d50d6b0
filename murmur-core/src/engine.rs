//! The per-tick flocking update.
//!
//! One tick: rebuild the spatial grid from current positions, compute every
//! agent's new direction from that snapshot, then (and only then) write
//! directions and advance positions. Nothing moves until every steering
//! decision is made, so the outcome never depends on entity iteration order.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::balloon::{Barrier, Cloud};
use crate::boid::Boid;
use crate::entity::{radial_push, Entity, Position, RepulsionChannel};
use crate::grid::SpatialGrid;
use crate::vector::Vector2;

/// What happens to an agent at a world edge. One policy per build, applied
/// to every agent uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryPolicy {
    /// Invert the offending direction component and clamp to the edge.
    #[default]
    Bounce,
    /// Re-enter on the opposite side.
    Wrap,
}

/// Relative strength of each steering component.
#[derive(Debug, Clone, Copy)]
pub struct FlockWeights {
    pub alignment: f64,
    pub cohesion: f64,
    pub separation: f64,
    pub obstacle: f64,
    pub wall: f64,
}

impl Default for FlockWeights {
    fn default() -> Self {
        Self {
            alignment: 1.5,
            cohesion: 1.5,
            separation: 5.0,
            obstacle: 100.0,
            wall: 20.0,
        }
    }
}

/// Tunable parameters for one flock. All distances and speeds are in world
/// units (per second where applicable).
#[derive(Debug, Clone, Copy)]
pub struct FlockConfig {
    pub width: f64,
    pub height: f64,
    /// Radius within which other entities count as neighbors.
    pub sight_distance: f64,
    /// Inner radius where peer separation kicks in.
    pub personal_space: f64,
    pub max_force: f64,
    pub max_speed: f64,
    pub min_speed: f64,
    /// Probability per second that an agent takes a random turn.
    pub variation_rate: f64,
    /// Largest random turn, radians either way.
    pub max_variation: f64,
    pub weights: FlockWeights,
    pub boundary: BoundaryPolicy,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            sight_distance: 55.0,
            personal_space: 20.0,
            max_force: 40.0,
            max_speed: 165.0,
            min_speed: 140.0,
            variation_rate: 0.5,
            max_variation: 40f64.to_radians(),
            weights: FlockWeights::default(),
            boundary: BoundaryPolicy::Bounce,
        }
    }
}

/// New steering state for one boid, computed in the read-only phase and
/// written back in the apply phase.
struct Steering {
    direction: Vector2,
    neighbor_count: usize,
}

/// A flock of agents plus the obstacles and drifters they steer around.
///
/// Owns all entity state; the spatial grid holds only indices valid for the
/// duration of one tick.
pub struct Flock {
    pub boids: Vec<Boid>,
    pub barriers: Vec<Barrier>,
    pub clouds: Vec<Cloud>,
    pub config: FlockConfig,
    grid: SpatialGrid,
    rng: SmallRng,
    run_time_seconds: f64,
    tick_count: u64,
}

impl Flock {
    pub fn new(config: FlockConfig) -> Self {
        Self::with_rng(config, SmallRng::from_entropy())
    }

    /// Deterministic variant for tests and reproducible runs.
    pub fn with_seed(config: FlockConfig, seed: u64) -> Self {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(config: FlockConfig, rng: SmallRng) -> Self {
        // Cell size of twice the sight radius guarantees the 3x3 cell
        // neighborhood covers the whole sight circle.
        let grid = SpatialGrid::new(config.sight_distance * 2.0);
        Self {
            boids: Vec::new(),
            barriers: Vec::new(),
            clouds: Vec::new(),
            config,
            grid,
            rng,
            run_time_seconds: 0.0,
            tick_count: 0,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn run_time_seconds(&self) -> f64 {
        self.run_time_seconds
    }

    pub fn spawn_boids(&mut self, count: usize) {
        for _ in 0..count {
            self.boids.push(Boid::random(
                self.config.width,
                self.config.height,
                self.config.max_speed,
                self.config.personal_space,
                &mut self.rng,
            ));
        }
    }

    /// Starts a new barrier at zero radius; grow it with
    /// [`grow_active_barrier`](Self::grow_active_barrier) while held.
    pub fn add_barrier(&mut self, position: Position, pop: bool) {
        let (min_radius, max_radius) = self.balloon_radius_bounds();
        self.barriers.push(Barrier::new(position, pop, min_radius, max_radius));
    }

    pub fn add_cloud(&mut self, position: Position, drift: Vector2) {
        let (min_radius, max_radius) = self.balloon_radius_bounds();
        self.clouds.push(Cloud::new(position, drift, min_radius, max_radius));
    }

    fn balloon_radius_bounds(&self) -> (f64, f64) {
        let extent = self.config.width.min(self.config.height);
        (extent / 80.0, extent / 15.0)
    }

    /// Grows the most recently added barrier (the one being held).
    pub fn grow_active_barrier(&mut self, dt: f64) {
        if let Some(barrier) = self.barriers.last_mut() {
            barrier.expand(dt);
        }
    }

    /// Drags the held barrier along with the cursor.
    pub fn move_active_barrier(&mut self, position: Position) {
        if let Some(barrier) = self.barriers.last_mut() {
            barrier.position = position;
        }
    }

    /// Reaps pop-marked and undersized balloons. Two-phase removal: call
    /// this between ticks, never while iterating, and not while a barrier
    /// is still being held.
    pub fn remove_spent_balloons(&mut self) {
        self.barriers.retain(|barrier| !barrier.spent());
        self.clouds.retain(|cloud| !cloud.spent());
    }

    /// Removes whatever sits under `point`: barriers and clouds by their
    /// circle, boids by their personal space.
    pub fn remove_at(&mut self, point: Position) {
        self.barriers.retain(|barrier| !barrier.intersects(point));
        self.clouds.retain(|cloud| !cloud.intersects(point));
        self.boids.retain(|boid| !boid.intersects(point));
    }

    /// Mean alignment-neighbor count over the flock, from the last tick.
    pub fn mean_neighbor_count(&self) -> f64 {
        if self.boids.is_empty() {
            return 0.0;
        }
        let total: usize = self.boids.iter().map(Boid::neighbor_count).sum();
        total as f64 / self.boids.len() as f64
    }

    pub fn mean_speed(&self) -> f64 {
        if self.boids.is_empty() {
            return 0.0;
        }
        let total: f64 = self.boids.iter().map(|b| b.direction.magnitude()).sum();
        total / self.boids.len() as f64
    }

    /// Advances the simulation by one frame.
    ///
    /// Forces for this tick read everyone's start-of-tick position: all new
    /// directions are computed before any direction or position is written.
    pub fn tick(&mut self, dt: f64) {
        debug_assert!(dt >= 0.0, "negative dt is a driver bug");

        let config = self.config;
        let boid_count = self.boids.len();
        let barrier_count = self.barriers.len();

        // Snapshot of every live entity; boids first so slice indices line
        // up with boid indices.
        let mut entities: Vec<&dyn Entity> =
            Vec::with_capacity(boid_count + barrier_count + self.clouds.len());
        entities.extend(self.boids.iter().map(|b| b as &dyn Entity));
        entities.extend(self.barriers.iter().map(|b| b as &dyn Entity));
        entities.extend(self.clouds.iter().map(|c| c as &dyn Entity));

        self.grid.rebuild(entities.iter().map(|e| e.position()));

        // Compute phase: read-only over all entities.
        let steerings: Vec<Steering> = self
            .boids
            .iter()
            .enumerate()
            .map(|(index, boid)| steer(boid, index, &entities, &self.grid, &config, &mut self.rng, dt))
            .collect();

        let cloud_pushes: Vec<Vector2> = self
            .clouds
            .iter()
            .enumerate()
            .map(|(offset, cloud)| {
                let index = boid_count + barrier_count + offset;
                cloud_push(cloud, index, &entities, &self.grid)
            })
            .collect();

        drop(entities);

        // Apply phase: write directions first, then move everyone.
        for (boid, steering) in self.boids.iter_mut().zip(steerings) {
            boid.direction = steering.direction;
            boid.set_neighbor_count(steering.neighbor_count);
        }
        for boid in &mut self.boids {
            advance_boid(boid, dt, &config);
            boid.record_trail(dt);
        }
        for (cloud, push) in self.clouds.iter_mut().zip(cloud_pushes) {
            cloud.advance(push, dt, self.run_time_seconds, config.width, config.height);
        }

        self.tick_count += 1;
        self.run_time_seconds += dt;
    }
}

/// Reduces one boid's neighborhood into its new direction.
fn steer(
    boid: &Boid,
    self_index: usize,
    entities: &[&dyn Entity],
    grid: &SpatialGrid,
    config: &FlockConfig,
    rng: &mut SmallRng,
    dt: f64,
) -> Steering {
    let mut pointers = Vec::new();
    let mut attraction_points = Vec::new();
    let mut separation = Vector2::zero();
    let mut obstacle = Vector2::zero();

    for index in grid.neighborhood(boid.position, 1) {
        if index == self_index {
            continue;
        }
        let other = entities[index];
        // The grid over-reports; filter by exact distance.
        if boid.position.distance_to(&other.position()) >= config.sight_distance {
            continue;
        }

        if let Some(pointer) = other.pointer() {
            pointers.push(pointer);
        }
        if let Some(point) = other.attraction_point() {
            attraction_points.push(point);
        }
        if let Some(push) = other.repulsion(boid.position, config.sight_distance) {
            match push.channel {
                RepulsionChannel::Separation => separation += push.force,
                RepulsionChannel::Obstacle => obstacle += push.force,
            }
        }
    }

    let neighbor_count = pointers.len();
    let weights = config.weights;
    let mut force = Vector2::zero();

    // Alignment: steer toward the average heading of visible peers. An
    // empty set contributes nothing at all, not a pull toward zero.
    if !pointers.is_empty() {
        force += (Vector2::mean(&pointers) - boid.direction) * weights.alignment;
    }

    // Cohesion: steer toward the mean attraction point.
    if !attraction_points.is_empty() {
        let n = attraction_points.len() as f64;
        let mean = Position::new(
            attraction_points.iter().map(|p| p.x).sum::<f64>() / n,
            attraction_points.iter().map(|p| p.y).sum::<f64>() / n,
        );
        force += (boid.position.vector_to(&mean) - boid.direction) * weights.cohesion;
    }

    // Separation and obstacle avoidance are sums, not means: crowding
    // compounds.
    force += separation * weights.separation;
    force += obstacle * weights.obstacle;
    force += wall_force(boid.position, config) * weights.wall;

    let force = force.clamp_magnitude(0.0, config.max_force);
    let mut direction =
        (boid.direction + force).clamp_magnitude(config.min_speed, config.max_speed);

    // Stochastic heading noise, outside the deterministic force sum.
    if rng.gen::<f64>() < config.variation_rate * dt {
        let angle = rng.gen_range(-config.max_variation..=config.max_variation);
        direction = direction.rotate(angle);
    }

    Steering {
        direction,
        neighbor_count,
    }
}

/// Avoidance against the four world edges: each edge acts as a zero-radius
/// obstacle at the agent's projection onto it, with the same falloff as
/// circular obstacles.
fn wall_force(position: Position, config: &FlockConfig) -> Vector2 {
    let walls = [
        Position::new(0.0, position.y),
        Position::new(config.width, position.y),
        Position::new(position.x, 0.0),
        Position::new(position.x, config.height),
    ];

    let mut force = Vector2::zero();
    for wall in walls {
        let distance = position.distance_to(&wall);
        if distance < config.sight_distance {
            force += radial_push(wall, position, distance, config.sight_distance);
        }
    }
    force
}

fn advance_boid(boid: &mut Boid, dt: f64, config: &FlockConfig) {
    boid.position.x += boid.direction.dx * dt;
    boid.position.y += boid.direction.dy * dt;

    match config.boundary {
        BoundaryPolicy::Bounce => {
            if boid.position.x < 0.0 {
                boid.position.x = 0.0;
                boid.direction.dx = boid.direction.dx.abs();
            } else if boid.position.x > config.width {
                boid.position.x = config.width;
                boid.direction.dx = -boid.direction.dx.abs();
            }
            if boid.position.y < 0.0 {
                boid.position.y = 0.0;
                boid.direction.dy = boid.direction.dy.abs();
            } else if boid.position.y > config.height {
                boid.position.y = config.height;
                boid.direction.dy = -boid.direction.dy.abs();
            }
        }
        BoundaryPolicy::Wrap => {
            boid.position.x = boid.position.x.rem_euclid(config.width);
            boid.position.y = boid.position.y.rem_euclid(config.height);
        }
    }
}

/// Pointer sum of flock members underneath a cloud, gathered read-only.
fn cloud_push(
    cloud: &Cloud,
    self_index: usize,
    entities: &[&dyn Entity],
    grid: &SpatialGrid,
) -> Vector2 {
    let mut push = Vector2::zero();
    for index in grid.neighborhood(cloud.position, 1) {
        if index == self_index {
            continue;
        }
        let other = entities[index];
        if cloud.position.distance_to(&other.position()) >= cloud.radius {
            continue;
        }
        if let Some(pointer) = other.pointer() {
            push += pointer;
        }
    }
    push
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> FlockConfig {
        // No noise, no walls in the way: a large world with every weight
        // zeroed so individual terms can be tested in isolation.
        FlockConfig {
            width: 10_000.0,
            height: 10_000.0,
            min_speed: 0.0,
            variation_rate: 0.0,
            weights: FlockWeights {
                alignment: 0.0,
                cohesion: 0.0,
                separation: 0.0,
                obstacle: 0.0,
                wall: 0.0,
            },
            ..FlockConfig::default()
        }
    }

    #[test]
    fn wall_force_pushes_inward_near_the_left_edge() {
        let config = FlockConfig::default();
        let force = wall_force(Position::new(10.0, 360.0), &config);
        assert!(force.dx > 0.0);
        assert_eq!(force.dy, 0.0);
    }

    #[test]
    fn wall_force_vanishes_in_the_interior() {
        let config = FlockConfig::default();
        let center = Position::new(config.width / 2.0, config.height / 2.0);
        assert_eq!(wall_force(center, &config), Vector2::zero());
    }

    #[test]
    fn corner_feels_both_walls() {
        let config = FlockConfig::default();
        let force = wall_force(Position::new(5.0, 5.0), &config);
        assert!(force.dx > 0.0);
        assert!(force.dy > 0.0);
    }

    #[test]
    fn bounce_inverts_and_clamps() {
        let config = FlockConfig {
            boundary: BoundaryPolicy::Bounce,
            ..quiet_config()
        };
        let mut boid = Boid::new(Position::new(1.0, 50.0), Vector2::new(-100.0, 0.0), 20.0);
        advance_boid(&mut boid, 0.1, &config);
        assert_eq!(boid.position.x, 0.0);
        assert!(boid.direction.dx > 0.0);
    }

    #[test]
    fn wrap_reenters_on_the_far_side() {
        let config = FlockConfig {
            boundary: BoundaryPolicy::Wrap,
            ..quiet_config()
        };
        let mut boid = Boid::new(Position::new(1.0, 50.0), Vector2::new(-100.0, 0.0), 20.0);
        advance_boid(&mut boid, 0.1, &config);
        assert!((0.0..config.width).contains(&boid.position.x));
        assert!(boid.position.x > config.width - 20.0);
        // direction untouched
        assert_eq!(boid.direction, Vector2::new(-100.0, 0.0));
    }

    #[test]
    fn lone_boid_in_open_space_keeps_its_direction() {
        let mut flock = Flock::with_seed(quiet_config(), 1);
        flock.boids.push(Boid::new(
            Position::new(5_000.0, 5_000.0),
            Vector2::new(100.0, 0.0),
            20.0,
        ));
        flock.tick(1.0 / 30.0);
        assert_eq!(flock.boids[0].direction, Vector2::new(100.0, 0.0));
        assert_eq!(flock.boids[0].neighbor_count(), 0);
    }

    #[test]
    fn tick_counts_time() {
        let mut flock = Flock::with_seed(quiet_config(), 1);
        for _ in 0..30 {
            flock.tick(1.0 / 30.0);
        }
        assert_eq!(flock.tick_count(), 30);
        assert!((flock.run_time_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn held_barrier_grows_and_survives_reaping_once_big_enough() {
        let mut flock = Flock::with_seed(FlockConfig::default(), 1);
        flock.add_barrier(Position::new(100.0, 100.0), false);

        // released immediately: undersized, reaped
        flock.remove_spent_balloons();
        assert!(flock.barriers.is_empty());

        flock.add_barrier(Position::new(100.0, 100.0), false);
        for _ in 0..30 {
            flock.grow_active_barrier(1.0 / 30.0);
        }
        flock.remove_spent_balloons();
        assert_eq!(flock.barriers.len(), 1);

        // pop-marked goes regardless of size
        flock.barriers[0].pop = true;
        flock.remove_spent_balloons();
        assert!(flock.barriers.is_empty());
    }

    #[test]
    fn remove_at_clears_everything_under_the_point() {
        let mut flock = Flock::with_seed(FlockConfig::default(), 1);
        flock.boids.push(Boid::new(
            Position::new(100.0, 100.0),
            Vector2::new(1.0, 0.0),
            20.0,
        ));
        flock.add_barrier(Position::new(100.0, 100.0), false);
        flock.grow_active_barrier(1.0);

        flock.remove_at(Position::new(105.0, 100.0));
        assert!(flock.boids.is_empty());
        assert!(flock.barriers.is_empty());
    }

    #[test]
    fn variation_rotates_within_the_configured_cone() {
        let config = FlockConfig {
            variation_rate: 1_000.0, // fire every tick
            ..quiet_config()
        };
        let mut flock = Flock::with_seed(config, 9);
        flock.boids.push(Boid::new(
            Position::new(5_000.0, 5_000.0),
            Vector2::new(100.0, 0.0),
            20.0,
        ));

        let before = flock.boids[0].direction;
        flock.tick(1.0 / 30.0);
        let after = flock.boids[0].direction;

        let turned = crate::angles::signed_difference(before.heading(), after.heading());
        assert!(turned.abs() <= config.max_variation + 1e-9);
        assert!((after.magnitude() - before.magnitude()).abs() < 1e-9);
    }
}
