use std::f64::consts::TAU;
use std::fmt;

/// Errors from vector operations that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorError {
    /// Attempted to divide a vector by a zero scalar.
    DivisionByZero,
}

impl fmt::Display for VectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorError::DivisionByZero => write!(f, "cannot divide a vector by zero"),
        }
    }
}

impl std::error::Error for VectorError {}

/// A 2D free vector used for directions, velocities and steering forces.
///
/// Value semantics: every operation returns a new vector. The zero vector
/// has no heading; angle queries on it return the sentinel `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub dx: f64,
    pub dy: f64,
}

impl Vector2 {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    pub fn zero() -> Self {
        Self { dx: 0.0, dy: 0.0 }
    }

    /// Builds a vector of the given length pointing along `radians`.
    pub fn from_polar(magnitude: f64, radians: f64) -> Self {
        Self {
            dx: radians.cos() * magnitude,
            dy: radians.sin() * magnitude,
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.dx.hypot(self.dy)
    }

    /// Heading in `[0, 2π)`. The zero vector reports `0.0`.
    pub fn heading(&self) -> f64 {
        self.dy.atan2(self.dx).rem_euclid(TAU)
    }

    /// Same magnitude, new heading.
    pub fn with_heading(self, radians: f64) -> Self {
        Self::from_polar(self.magnitude(), radians)
    }

    /// Same heading, new magnitude. No-op on the zero vector, whose heading
    /// is undefined; this keeps the per-tick pipeline total instead of
    /// raising on degenerate input.
    pub fn with_magnitude(self, magnitude: f64) -> Self {
        if self.magnitude() == 0.0 {
            return self;
        }
        Self::from_polar(magnitude, self.heading())
    }

    /// Rescales into `[min, max]`: above `max` shrinks to `max`, a nonzero
    /// length below `min` grows to `min` (keeps agents from stalling).
    /// Already-in-range vectors come back unchanged.
    pub fn clamp_magnitude(self, min: f64, max: f64) -> Self {
        let m = self.magnitude();
        if m > max {
            self.with_magnitude(max)
        } else if m > 0.0 && m < min {
            self.with_magnitude(min)
        } else {
            self
        }
    }

    /// Rotates by a signed angle.
    pub fn rotate(self, angle: f64) -> Self {
        self.with_heading((self.heading() + angle).rem_euclid(TAU))
    }

    pub fn opposite(self) -> Self {
        -self
    }

    pub fn try_div(self, scalar: f64) -> Result<Self, VectorError> {
        if scalar == 0.0 {
            return Err(VectorError::DivisionByZero);
        }
        Ok(Self::new(self.dx / scalar, self.dy / scalar))
    }

    pub fn sum<I>(vectors: I) -> Self
    where
        I: IntoIterator<Item = Vector2>,
    {
        vectors.into_iter().fold(Self::zero(), |acc, v| acc + v)
    }

    /// Arithmetic mean. The mean of an empty list is the zero vector, so an
    /// absent force contributor costs nothing instead of being an error.
    pub fn mean(vectors: &[Vector2]) -> Self {
        if vectors.is_empty() {
            return Self::zero();
        }
        let n = vectors.len() as f64;
        let total = Self::sum(vectors.iter().copied());
        Self::new(total.dx / n, total.dy / n)
    }
}

impl std::ops::Add for Vector2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.dx + other.dx, self.dy + other.dy)
    }
}

impl std::ops::AddAssign for Vector2 {
    fn add_assign(&mut self, other: Self) {
        self.dx += other.dx;
        self.dy += other.dy;
    }
}

impl std::ops::Sub for Vector2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.dx - other.dx, self.dy - other.dy)
    }
}

impl std::ops::Neg for Vector2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.dx, -self.dy)
    }
}

impl std::ops::Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self::new(self.dx * scalar, self.dy * scalar)
    }
}
