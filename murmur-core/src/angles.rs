//! Angle bucketing and differences for orienting visuals. The force math
//! only needs these to keep one consistent angle convention end to end.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Quarter-plane a heading falls in. A renderer uses this to decide whether
/// to flip a right-facing sprite; the simulation itself never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    First,
    Second,
    Third,
    Fourth,
}

impl Quadrant {
    /// Buckets a heading into [0°,90°), [90°,180°), [180°,270°), [270°,360°).
    pub fn of(radians: f64) -> Self {
        let rad = radians.rem_euclid(TAU);
        if rad < FRAC_PI_2 {
            Quadrant::First
        } else if rad < PI {
            Quadrant::Second
        } else if rad < PI + FRAC_PI_2 {
            Quadrant::Third
        } else {
            Quadrant::Fourth
        }
    }

    /// Whether a sprite drawn facing right needs a horizontal flip.
    pub fn faces_left(self) -> bool {
        matches!(self, Quadrant::Second | Quadrant::Third)
    }
}

/// Shortest signed rotation taking `from` to `to`, wrapped into (−π, π].
pub fn signed_difference(from: f64, to: f64) -> f64 {
    let mut diff = (to - from).rem_euclid(TAU);
    if diff > PI {
        diff -= TAU;
    }
    diff
}
