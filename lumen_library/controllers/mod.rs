//! Autonomous control policies
//!
//! An [`AutoController`] turns the current sensor readings into a
//! [`ControlCommand`]. It runs synchronously inside the simulation tick, so
//! implementations must not block.
//!
//! # Available Policies
//!
//! - **CircleController**: constant command, drives in a circle
//! - **BrightnessFollower**: steers toward the brighter side of the sensor array

use crate::messages::ControlCommand;
use lumen_core::{LumenError, LumenResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors an autonomous policy can report for a tick
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    #[error("no sensor readings")]
    NoReadings,

    #[error("reading {index} is not finite ({value})")]
    InvalidReading { index: usize, value: f64 },

    #[error("{0}")]
    Failed(String),
}

impl From<ControllerError> for LumenError {
    fn from(err: ControllerError) -> Self {
        LumenError::Controller(err.to_string())
    }
}

/// Synchronous policy mapping sensor readings to a command
pub trait AutoController: Send {
    fn name(&self) -> &str;

    /// `readings` are in sensor registration order, each in `[0, 1]`
    fn control(&mut self, readings: &[f64]) -> Result<ControlCommand, ControllerError>;
}

/// Constant command, ignores its inputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleController {
    pub velocity: f64,
    pub steering: f64,
}

impl CircleController {
    pub fn new(velocity: f64, steering: f64) -> Self {
        Self { velocity, steering }
    }
}

impl Default for CircleController {
    fn default() -> Self {
        Self::new(10.0, 30.0)
    }
}

impl AutoController for CircleController {
    fn name(&self) -> &str {
        "circle"
    }

    fn control(&mut self, _readings: &[f64]) -> Result<ControlCommand, ControllerError> {
        Ok(ControlCommand::new(self.velocity, self.steering))
    }
}

/// Proportional steering toward the brighter half of the array.
///
/// Sensors are expected left-to-right in body frame order: the first half
/// is the left side. With an odd count the middle sensor counts for neither.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessFollower {
    pub velocity: f64,
    pub gain: f64,
    pub max_steering: f64,
}

impl BrightnessFollower {
    pub fn new(velocity: f64, gain: f64, max_steering: f64) -> Self {
        Self {
            velocity,
            gain,
            max_steering,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl AutoController for BrightnessFollower {
    fn name(&self) -> &str {
        "brightness_follower"
    }

    fn control(&mut self, readings: &[f64]) -> Result<ControlCommand, ControllerError> {
        if readings.is_empty() {
            return Err(ControllerError::NoReadings);
        }
        if let Some((index, &value)) = readings.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ControllerError::InvalidReading { index, value });
        }

        let half = readings.len() / 2;
        let left = &readings[..half];
        let right = &readings[readings.len() - half..];

        let steering = (self.gain * (mean(left) - mean(right))).clamp(-self.max_steering, self.max_steering);
        Ok(ControlCommand::new(self.velocity, steering))
    }
}

/// Policy selection as it appears in a config file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerConfig {
    Circle {
        velocity: f64,
        steering: f64,
    },
    BrightnessFollower {
        velocity: f64,
        gain: f64,
        max_steering: f64,
    },
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let circle = CircleController::default();
        ControllerConfig::Circle {
            velocity: circle.velocity,
            steering: circle.steering,
        }
    }
}

impl ControllerConfig {
    pub fn build(&self) -> LumenResult<Box<dyn AutoController>> {
        match *self {
            ControllerConfig::Circle { velocity, steering } => {
                if !(velocity.is_finite() && steering.is_finite()) {
                    return Err(LumenError::Config(format!(
                        "circle controller needs finite parameters, got ({}, {})",
                        velocity, steering
                    )));
                }
                Ok(Box::new(CircleController::new(velocity, steering)))
            }
            ControllerConfig::BrightnessFollower {
                velocity,
                gain,
                max_steering,
            } => {
                if !(velocity.is_finite() && gain.is_finite() && max_steering.is_finite() && max_steering >= 0.0) {
                    return Err(LumenError::Config(format!(
                        "invalid brightness follower parameters: velocity={}, gain={}, max_steering={}",
                        velocity, gain, max_steering
                    )));
                }
                Ok(Box::new(BrightnessFollower::new(velocity, gain, max_steering)))
            }
        }
    }
}
