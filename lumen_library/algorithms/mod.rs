//! Pure computational algorithms for the vehicle simulator
//!
//! No threads and no I/O beyond map loading; every algorithm here can be
//! driven directly from tests or from any node.
//!
//! # Available Algorithms
//!
//! - **kinematics**: TankSteer / AckermanSteer pose integration
//! - **intensity_grid**: raster brightness map with world/pixel conversion
//! - **light_sensor**: circular-footprint brightness sampling
//! - **deadzone**: analog axis deadzone and command mapping

pub mod deadzone;
pub mod intensity_grid;
pub mod kinematics;
pub mod light_sensor;
