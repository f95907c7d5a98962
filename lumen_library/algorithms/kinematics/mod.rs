//! Vehicle Kinematics
//!
//! Integrates velocity/steering commands into pose updates.
//!
//! # Motion models
//!
//! - **TankSteer**: `steering` is a turn rate (rad/s)
//! - **AckermanSteer**: `steering` is a front-wheel angle (degrees); the turn
//!   rate follows from the wheelbase as `v / L * tan(δ)`
//!
//! Both models use explicit Euler integration and never wrap `theta`.
//!
//! # Example
//!
//! ```rust
//! use lumen_library::algorithms::kinematics::{KinematicsEngine, MotionModel};
//! use lumen_library::{ControlCommand, Pose2D};
//!
//! let model = MotionModel::ackerman(1.2).unwrap();
//! let mut engine = KinematicsEngine::new(model, Pose2D::origin()).unwrap();
//!
//! engine.update(ControlCommand::new(2.0, 15.0), 0.01);  // 2 m/s, 15° wheel angle
//! let pose = engine.pose();
//! ```

use crate::messages::{ControlCommand, Pose2D};
use lumen_core::{LumenError, LumenResult};
use serde::{Deserialize, Serialize};

/// Motion model, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MotionModel {
    TankSteer,
    AckermanSteer { wheelbase: f64 },
}

impl MotionModel {
    pub fn tank() -> Self {
        MotionModel::TankSteer
    }

    /// Ackerman steering with the given wheelbase (meters, must be > 0)
    pub fn ackerman(wheelbase: f64) -> LumenResult<Self> {
        let model = MotionModel::AckermanSteer { wheelbase };
        model.validate()?;
        Ok(model)
    }

    /// Check parameters. Deserialized models must pass through here before use.
    pub fn validate(&self) -> LumenResult<()> {
        match *self {
            MotionModel::TankSteer => Ok(()),
            MotionModel::AckermanSteer { wheelbase } => {
                if wheelbase.is_finite() && wheelbase > 0.0 {
                    Ok(())
                } else {
                    Err(LumenError::InvalidParameter(format!(
                        "Ackerman wheelbase must be positive, got {}",
                        wheelbase
                    )))
                }
            }
        }
    }

    /// Unit of the `steering` field this model expects
    pub fn steering_unit(&self) -> &'static str {
        match self {
            MotionModel::TankSteer => "rad/s",
            MotionModel::AckermanSteer { .. } => "deg",
        }
    }

    /// One Euler step of this model's integration law
    pub fn integrate(&self, pose: &Pose2D, command: &ControlCommand, dt: f64) -> Pose2D {
        let v = command.velocity;
        let omega = match *self {
            MotionModel::TankSteer => command.steering,
            MotionModel::AckermanSteer { wheelbase } => {
                (v / wheelbase) * command.steering.to_radians().tan()
            }
        };

        Pose2D {
            x: pose.x + v * dt * pose.theta.cos(),
            y: pose.y + v * dt * pose.theta.sin(),
            theta: pose.theta + omega * dt,
        }
    }
}

/// Owns the vehicle pose and advances it with the configured motion model
#[derive(Debug, Clone)]
pub struct KinematicsEngine {
    model: MotionModel,
    pose: Pose2D,
}

impl KinematicsEngine {
    /// Create an engine. Fails if the model's parameters are invalid.
    pub fn new(model: MotionModel, initial_pose: Pose2D) -> LumenResult<Self> {
        model.validate()?;
        Ok(Self {
            model,
            pose: initial_pose,
        })
    }

    /// Integrate `command` over `dt` seconds, mutating the pose in place
    pub fn update(&mut self, command: ControlCommand, dt: f64) {
        debug_assert!(dt > 0.0, "dt must be positive, got {}", dt);
        self.pose = self.model.integrate(&self.pose, &command, dt);
    }

    /// Snapshot of the current pose
    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    pub fn model(&self) -> MotionModel {
        self.model
    }

    pub fn set_pose(&mut self, pose: Pose2D) {
        self.pose = pose;
    }

    /// Reset to the origin
    pub fn reset(&mut self) {
        self.pose = Pose2D::origin();
    }
}
