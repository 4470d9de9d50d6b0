use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use murmur_core::{BoundaryPolicy, Flock, FlockConfig, FlockWeights, Position, Vector2};
use murmur_shared::{Boundary, SimSettings, SimStats};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless flocking simulation driver", long_about = None)]
struct Args {
    /// Number of boids to spawn
    #[arg(short, long, default_value_t = 130)]
    boids: usize,

    /// World width in world units
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// World height in world units
    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Simulation steps per second (dt = 1 / fps)
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 300)]
    ticks: u64,

    /// RNG seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON settings file overriding the defaults
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Number of drifting clouds
    #[arg(long, default_value_t = 2)]
    clouds: usize,

    /// Grow and release a barrier in the middle of the world
    #[arg(long)]
    barrier: bool,
}

fn load_settings(path: &Path) -> Result<SimSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading settings file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing settings file {}", path.display()))
}

fn build_config(settings: &SimSettings, width: f64, height: f64) -> FlockConfig {
    FlockConfig {
        width,
        height,
        sight_distance: settings.sight_distance,
        personal_space: settings.personal_space,
        max_force: settings.max_force,
        max_speed: settings.max_speed,
        min_speed: settings.min_speed,
        variation_rate: settings.variation_rate,
        max_variation: settings.max_variation_degrees.to_radians(),
        weights: FlockWeights {
            alignment: settings.weights.alignment,
            cohesion: settings.weights.cohesion,
            separation: settings.weights.separation,
            obstacle: settings.weights.obstacle,
            wall: settings.weights.wall,
        },
        boundary: match settings.boundary {
            Boundary::Bounce => BoundaryPolicy::Bounce,
            Boundary::Wrap => BoundaryPolicy::Wrap,
        },
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => load_settings(path)?,
        None => SimSettings::default(),
    };
    let config = build_config(&settings, args.width, args.height);

    let mut flock = match args.seed {
        Some(seed) => Flock::with_seed(config, seed),
        None => Flock::new(config),
    };
    flock.spawn_boids(args.boids);

    let dt = 1.0 / f64::from(args.fps);

    for index in 0..args.clouds {
        let x = args.width * (index as f64 + 0.5) / args.clouds as f64;
        flock.add_cloud(Position::new(x, args.height / 4.0), Vector2::new(20.0, 0.0));
    }
    // pre-grow the clouds past their minimum radius so they survive reaping
    for cloud in &mut flock.clouds {
        while cloud.spent() {
            cloud.expand(dt);
        }
    }

    if args.barrier {
        flock.add_barrier(Position::new(args.width / 2.0, args.height / 2.0), false);
    }
    // ticks during which the demo barrier is still "held" and growing
    let hold_ticks = if args.barrier { u64::from(args.fps) } else { 0 };

    log::info!(
        "running {} ticks at {} fps: {} boids, {} clouds{}",
        args.ticks,
        args.fps,
        flock.boids.len(),
        flock.clouds.len(),
        if args.barrier { ", 1 barrier" } else { "" },
    );

    for tick in 0..args.ticks {
        if tick < hold_ticks {
            flock.grow_active_barrier(dt);
        } else {
            if tick == hold_ticks && args.barrier {
                log::info!(
                    "released barrier at radius {:.1}",
                    flock.barriers.last().map_or(0.0, |b| b.radius)
                );
            }
            // reap only once nothing is being held
            flock.remove_spent_balloons();
        }

        flock.tick(dt);

        if tick % u64::from(args.fps) == 0 {
            log::debug!(
                "t={:.1}s mean neighbors {:.2}, mean speed {:.1}",
                flock.run_time_seconds(),
                flock.mean_neighbor_count(),
                flock.mean_speed(),
            );
        }
    }

    let stats = SimStats {
        tick_count: flock.tick_count(),
        boid_count: flock.boids.len(),
        balloon_count: flock.barriers.len() + flock.clouds.len(),
        mean_neighbors: flock.mean_neighbor_count(),
        mean_speed: flock.mean_speed(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&stats).context("serializing final stats")?
    );

    Ok(())
}
