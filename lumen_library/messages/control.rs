use serde::{Deserialize, Serialize};
use std::fmt;

/// Velocity/steering command for the vehicle.
///
/// The unit of `steering` depends on the active motion model: a turn rate in
/// rad/s for tank steering, a wheel angle in degrees for Ackerman steering.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlCommand {
    pub velocity: f64,
    pub steering: f64,
}

impl ControlCommand {
    pub fn new(velocity: f64, steering: f64) -> Self {
        Self { velocity, steering }
    }

    /// Create a zero velocity command (stop)
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.velocity == 0.0 && self.steering == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.velocity.is_finite() && self.steering.is_finite()
    }
}

/// Which control source is authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    #[default]
    Manual,
    Auto,
}

impl DriveMode {
    pub fn toggled(self) -> Self {
        match self {
            DriveMode::Manual => DriveMode::Auto,
            DriveMode::Auto => DriveMode::Manual,
        }
    }
}

impl fmt::Display for DriveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveMode::Manual => write!(f, "MANUAL"),
            DriveMode::Auto => write!(f, "AUTO"),
        }
    }
}
