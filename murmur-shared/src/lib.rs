//! Serde-facing types exchanged between the simulation core and a driver:
//! tunable settings (loaded from a config file or a UI slider panel) and a
//! stats snapshot reported back out.

use serde::{Deserialize, Serialize};

/// Relative strength of each steering component.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Weights {
    pub alignment: f64,
    pub cohesion: f64,
    pub separation: f64,
    pub obstacle: f64,
    pub wall: f64,
}

impl Default for Weights {
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

/// World-edge behavior for agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    #[default]
    Bounce,
    Wrap,
}

/// Full tunable simulation settings. Angles are degrees here so config
/// files stay readable; the driver converts to radians for the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    pub weights: Weights,
    pub sight_distance: f64,
    pub personal_space: f64,
    pub max_force: f64,
    pub max_speed: f64,
    pub min_speed: f64,
    pub variation_rate: f64,
    pub max_variation_degrees: f64,
    pub boundary: Boundary,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            sight_distance: 55.0,
            personal_space: 20.0,
            max_force: 40.0,
            max_speed: 165.0,
            min_speed: 140.0,
            variation_rate: 0.5,
            max_variation_degrees: 40.0,
            boundary: Boundary::default(),
        }
    }
}

/// Weights update message from a UI slider panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsUpdate {
    pub weights: Weights,
}

/// Snapshot of a running simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimStats {
    pub tick_count: u64,
    pub boid_count: usize,
    pub balloon_count: usize,
    pub mean_neighbors: f64,
    pub mean_speed: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_through_json() {
        let settings = SimSettings {
            boundary: Boundary::Wrap,
            ..SimSettings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: SimSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.boundary, Boundary::Wrap);
        assert_eq!(back.sight_distance, settings.sight_distance);
    }

    #[test]
    fn partial_settings_fall_back_to_defaults() {
        let settings: SimSettings =
            serde_json::from_str(r#"{"max_speed": 120.0, "boundary": "wrap"}"#).unwrap();
        assert_eq!(settings.max_speed, 120.0);
        assert_eq!(settings.boundary, Boundary::Wrap);
        assert_eq!(settings.sight_distance, 55.0);
    }
}
