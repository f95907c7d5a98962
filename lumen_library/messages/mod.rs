//! Message types shared between LUMEN components
//!
//! - Geometry: `Pose2D`
//! - Control: `ControlCommand`, `DriveMode`
//! - Frames: `SimFrame`, the per-tick hand-off to frame sinks
//!
//! All message types are re-exported at the crate root for convenience.

pub mod control;
pub mod frame;
pub mod geometry;

pub use control::{ControlCommand, DriveMode};
pub use frame::SimFrame;
pub use geometry::Pose2D;
