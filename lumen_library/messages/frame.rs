use super::{DriveMode, Pose2D};
use serde::Serialize;

/// Everything a frame sink needs to draw or record one simulation tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimFrame {
    /// Tick number (1-based: the first integrated tick is 1)
    pub tick: u64,
    /// Simulated time in seconds (`tick * dt`)
    pub time: f64,
    /// Pose after this tick's integration
    pub pose: Pose2D,
    /// Sensor centres in world coordinates, registration order
    pub sensor_positions: Vec<[f64; 2]>,
    /// Readings the command was computed from, registration order
    pub readings: Vec<f64>,
    pub velocity: f64,
    pub steering: f64,
    pub mode: DriveMode,
}
