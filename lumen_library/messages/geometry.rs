use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Vehicle pose in world coordinates.
///
/// `theta` accumulates without wrapping; call [`Pose2D::normalized_theta`]
/// when a value in `[-π, π]` is needed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub theta: f64, // radians
}

impl Pose2D {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    pub fn origin() -> Self {
        Self::default()
    }

    /// Heading wrapped into `[-π, π]`
    pub fn normalized_theta(&self) -> f64 {
        let wrapped = (self.theta + PI).rem_euclid(2.0 * PI) - PI;
        if wrapped == -PI {
            PI
        } else {
            wrapped
        }
    }

    pub fn distance_to(&self, other: &Pose2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.theta.is_finite()
    }
}
