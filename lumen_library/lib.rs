//! # LUMEN Library
//!
//! Messages, algorithms, control policies and nodes for the LUMEN
//! light-sensing vehicle simulator.
//!
//! ## Structure
//!
//! ```text
//! lumen_library/
//! ── messages/       # Pose, commands, drive mode, per-tick frames
//! ── algorithms/     # Kinematics, intensity grid, light sensors, deadzone
//! ── controllers/    # Autonomous policies
//! ── nodes/          # Simulation node, joystick poller, mode arbiter
//! ── sinks/          # Frame consumers (logging, CSV trajectories)
//! ── apps/           # The lumensim binary
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use lumen_core::Scheduler;
//! use lumen_library::prelude::*;
//!
//! let grid = Arc::new(IntensityGrid::filled(250, 250, 0.5, 25.0, 25.0).unwrap());
//! let sensors = SensorArray::from_mounts(&[SensorMount::new(0.5, 0.0, 0.5).unwrap()], grid);
//! let engine = KinematicsEngine::new(MotionModel::tank(), Pose2D::new(5.0, 5.0, 0.0)).unwrap();
//! let arbiter = ModeArbiter::new();
//!
//! let sim = VehicleSimNode::new(
//!     engine,
//!     sensors,
//!     arbiter.clone(),
//!     Box::new(CircleController::default()),
//!     Box::new(LogSink::new(100)),
//!     0.01,
//! )
//! .unwrap();
//!
//! let mut scheduler = Scheduler::new().name("lumen");
//! scheduler.add(Box::new(sim), 0);
//! scheduler.step().unwrap();
//! ```

pub mod algorithms;
pub mod controllers;
pub mod messages;
pub mod nodes;
pub mod sinks;

// Re-export message types at the crate root for convenience
pub use messages::*;

pub use controllers::{AutoController, BrightnessFollower, CircleController, ControllerConfig, ControllerError};
pub use nodes::{JoystickPoller, ModeArbiter, VehicleSimNode};
pub use sinks::{CsvTrajectorySink, FanOutSink, FrameSink, LogSink, SinkError};

/// Everything needed to wire up a simulation
pub mod prelude {
    pub use crate::algorithms::intensity_grid::IntensityGrid;
    pub use crate::algorithms::kinematics::{KinematicsEngine, MotionModel};
    pub use crate::algorithms::light_sensor::{LightSensor, SensorArray, SensorMount};
    pub use crate::controllers::{AutoController, BrightnessFollower, CircleController, ControllerConfig};
    pub use crate::messages::{ControlCommand, DriveMode, Pose2D, SimFrame};
    pub use crate::nodes::{
        ButtonListener, InputDevice, JoystickConfig, JoystickPoller, ModeArbiter, PollerState, ScriptedDevice,
        VehicleSimNode,
    };
    pub use crate::sinks::{CsvTrajectorySink, FanOutSink, FrameSink, LogSink, NullSink};
}
