//! Light Sensor Model
//!
//! Downward-facing brightness sensors mounted at fixed offsets on the vehicle.
//! A reading is the mean intensity of the grid cells inside the sensor's
//! circular view, in `[0, 1]`.
//!
//! # Algorithm
//!
//! 1. Transform the body-frame mount offset to world coordinates
//! 2. Convert the centre to fractional pixel coordinates (y flipped)
//! 3. Convert the view radius to pixels using the horizontal scale
//! 4. Clip the bounding box to the grid, mask cells inside the circle, average
//!
//! A sensor entirely off the map, or one too small to cover any cell centre,
//! reads `0.0`.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use lumen_library::algorithms::intensity_grid::IntensityGrid;
//! use lumen_library::algorithms::light_sensor::{LightSensor, SensorMount};
//! use lumen_library::Pose2D;
//!
//! let grid = Arc::new(IntensityGrid::filled(100, 100, 1.0, 10.0, 10.0).unwrap());
//! let mount = SensorMount::new(0.5, 0.0, 0.4).unwrap();
//! let sensor = LightSensor::new(mount, grid);
//!
//! let value = sensor.read(&Pose2D::new(5.0, 5.0, 0.0));
//! assert_eq!(value, 1.0);
//! ```

use crate::algorithms::intensity_grid::IntensityGrid;
use crate::messages::Pose2D;
use lumen_core::{LumenError, LumenResult};
use nalgebra::{Isometry2, Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Sensor placement in the vehicle body frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMount", into = "RawMount")]
pub struct SensorMount {
    local_x: f64,
    local_y: f64,
    diameter: f64,
}

#[derive(Clone, Serialize, Deserialize)]
struct RawMount {
    x: f64,
    y: f64,
    diameter: f64,
}

impl From<SensorMount> for RawMount {
    fn from(mount: SensorMount) -> Self {
        Self {
            x: mount.local_x,
            y: mount.local_y,
            diameter: mount.diameter,
        }
    }
}

impl TryFrom<RawMount> for SensorMount {
    type Error = LumenError;

    fn try_from(raw: RawMount) -> LumenResult<Self> {
        SensorMount::new(raw.x, raw.y, raw.diameter)
    }
}

impl SensorMount {
    /// `local_x` forward, `local_y` left, `diameter` of the view circle (world units, > 0)
    pub fn new(local_x: f64, local_y: f64, diameter: f64) -> LumenResult<Self> {
        if !(diameter.is_finite() && diameter > 0.0) {
            return Err(LumenError::InvalidParameter(format!(
                "sensor diameter must be positive, got {}",
                diameter
            )));
        }
        if !(local_x.is_finite() && local_y.is_finite()) {
            return Err(LumenError::InvalidParameter(format!(
                "sensor offset must be finite, got ({}, {})",
                local_x, local_y
            )));
        }
        Ok(Self {
            local_x,
            local_y,
            diameter,
        })
    }

    pub fn local_x(&self) -> f64 {
        self.local_x
    }

    pub fn local_y(&self) -> f64 {
        self.local_y
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    /// Sensor centre in world coordinates for the given vehicle pose
    pub fn world_position(&self, pose: &Pose2D) -> [f64; 2] {
        let body = Isometry2::new(Vector2::new(pose.x, pose.y), pose.theta);
        let p = body * Point2::new(self.local_x, self.local_y);
        [p.x, p.y]
    }
}

/// One light sensor bound to a shared map
#[derive(Debug, Clone)]
pub struct LightSensor {
    mount: SensorMount,
    grid: Arc<IntensityGrid>,
}

impl LightSensor {
    pub fn new(mount: SensorMount, grid: Arc<IntensityGrid>) -> Self {
        Self { mount, grid }
    }

    pub fn mount(&self) -> &SensorMount {
        &self.mount
    }

    pub fn world_position(&self, pose: &Pose2D) -> [f64; 2] {
        self.mount.world_position(pose)
    }

    /// Mean intensity inside the view circle, `0.0` when nothing is covered
    pub fn read(&self, pose: &Pose2D) -> f64 {
        let grid = &*self.grid;
        let [xs, ys] = self.mount.world_position(pose);
        let (cx, cy) = grid.world_to_pixel(xs, ys);
        // Pixels are assumed square: the horizontal scale sizes the circle
        let r_px = self.mount.radius() * grid.scale_x();

        let max_col = grid.width() as f64 - 1.0;
        let max_row = grid.height() as f64 - 1.0;
        let col_min = (cx - r_px).floor().max(0.0);
        let col_max = (cx + r_px).ceil().min(max_col);
        let row_min = (cy - r_px).floor().max(0.0);
        let row_max = (cy + r_px).ceil().min(max_row);

        if !(col_min <= col_max && row_min <= row_max) {
            return 0.0;
        }

        let r_sq = r_px * r_px;
        let mut sum = 0.0_f64;
        let mut count = 0_usize;
        for row in row_min as usize..=row_max as usize {
            let dy = row as f64 - cy;
            for col in col_min as usize..=col_max as usize {
                let dx = col as f64 - cx;
                if dx * dx + dy * dy <= r_sq {
                    if let Some(value) = grid.get(row, col) {
                        sum += value as f64;
                        count += 1;
                    }
                }
            }
        }

        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }
}

/// Ordered set of light sensors sharing one map
#[derive(Debug, Clone, Default)]
pub struct SensorArray {
    sensors: Vec<LightSensor>,
}

impl SensorArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every mount to `grid`, keeping registration order
    pub fn from_mounts(mounts: &[SensorMount], grid: Arc<IntensityGrid>) -> Self {
        Self {
            sensors: mounts
                .iter()
                .map(|mount| LightSensor::new(*mount, grid.clone()))
                .collect(),
        }
    }

    pub fn push(&mut self, sensor: LightSensor) {
        self.sensors.push(sensor);
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// One reading per sensor, registration order
    pub fn read_all(&self, pose: &Pose2D) -> Vec<f64> {
        self.sensors.iter().map(|sensor| sensor.read(pose)).collect()
    }

    /// World position of every sensor, registration order
    pub fn positions(&self, pose: &Pose2D) -> Vec<[f64; 2]> {
        self.sensors
            .iter()
            .map(|sensor| sensor.world_position(pose))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    /// 100 x 100 px over a 10 x 10 world: 10 px per unit
    fn split_grid() -> Arc<IntensityGrid> {
        // Left half bright, right half dark
        Arc::new(IntensityGrid::from_fn(100, 100, 10.0, 10.0, |_row, col| if col < 50 { 1.0 } else { 0.0 }).unwrap())
    }

    fn sensor_at_center(diameter: f64, grid: Arc<IntensityGrid>) -> LightSensor {
        LightSensor::new(SensorMount::new(0.0, 0.0, diameter).unwrap(), grid)
    }

    #[test]
    fn test_all_bright_reads_one() {
        let grid = Arc::new(IntensityGrid::filled(100, 100, 1.0, 10.0, 10.0).unwrap());
        let sensor = sensor_at_center(1.0, grid);
        assert_eq!(sensor.read(&Pose2D::new(3.0, 7.0, 1.2)), 1.0);
    }

    #[test]
    fn test_all_dark_reads_zero() {
        let grid = Arc::new(IntensityGrid::filled(100, 100, 0.0, 10.0, 10.0).unwrap());
        let sensor = sensor_at_center(1.0, grid);
        assert_eq!(sensor.read(&Pose2D::new(3.0, 7.0, 1.2)), 0.0);
    }

    #[test]
    fn test_straddling_split_reads_half() {
        let sensor = sensor_at_center(2.0, split_grid());
        // Centre on the boundary between col 49 and col 50
        let value = sensor.read(&Pose2D::new(4.95, 5.0, 0.0));
        assert_relative_eq!(value, 0.5, epsilon = 0.05);
    }

    #[test]
    fn test_fully_off_map_reads_zero() {
        let grid = Arc::new(IntensityGrid::filled(100, 100, 1.0, 10.0, 10.0).unwrap());
        let sensor = sensor_at_center(1.0, grid);
        assert_eq!(sensor.read(&Pose2D::new(-20.0, 5.0, 0.0)), 0.0);
        assert_eq!(sensor.read(&Pose2D::new(5.0, 40.0, 0.0)), 0.0);
        assert_eq!(sensor.read(&Pose2D::new(1e9, -1e9, 0.0)), 0.0);
    }

    #[test]
    fn test_partial_overlap_uses_in_bounds_cells() {
        let grid = Arc::new(IntensityGrid::filled(100, 100, 1.0, 10.0, 10.0).unwrap());
        let sensor = sensor_at_center(2.0, grid);
        // Half the circle hangs off the left edge; the in-bounds part is bright
        assert_eq!(sensor.read(&Pose2D::new(0.0, 5.0, 0.0)), 1.0);
    }

    #[test]
    fn test_degenerate_radius_reads_zero() {
        let grid = Arc::new(IntensityGrid::filled(10, 10, 1.0, 10.0, 10.0).unwrap());
        // r_px = 0.005, centre at (2.5, 7.5) px: no cell centre within reach
        let sensor = sensor_at_center(0.01, grid);
        assert_eq!(sensor.read(&Pose2D::new(2.5, 2.5, 0.0)), 0.0);
    }

    #[test]
    fn test_mount_offset_rotates_with_heading() {
        let mount = SensorMount::new(1.0, 0.5, 0.2).unwrap();

        let [x, y] = mount.world_position(&Pose2D::new(2.0, 3.0, 0.0));
        assert_relative_eq!(x, 3.0);
        assert_relative_eq!(y, 3.5);

        let [x, y] = mount.world_position(&Pose2D::new(2.0, 3.0, PI / 2.0));
        assert_relative_eq!(x, 1.5, epsilon = 1e-12);
        assert_relative_eq!(y, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_offset_sensor_sees_its_own_side() {
        let grid = split_grid();
        let left = LightSensor::new(SensorMount::new(0.0, 2.0, 1.0).unwrap(), grid.clone());
        let right = LightSensor::new(SensorMount::new(0.0, -2.0, 1.0).unwrap(), grid);

        // Facing up (+y): body-left is world -x (bright), body-right is world +x (dark)
        let pose = Pose2D::new(5.0, 5.0, PI / 2.0);
        assert_eq!(left.read(&pose), 1.0);
        assert_eq!(right.read(&pose), 0.0);
    }

    #[test]
    fn test_reading_is_deterministic() {
        let sensor = sensor_at_center(1.3, split_grid());
        let pose = Pose2D::new(4.81, 6.02, 0.4);
        let first = sensor.read(&pose);
        for _ in 0..10 {
            assert_eq!(sensor.read(&pose), first);
        }
    }

    #[test]
    fn test_mount_validation() {
        assert!(SensorMount::new(0.0, 0.0, 0.0).is_err());
        assert!(SensorMount::new(0.0, 0.0, -1.0).is_err());
        assert!(SensorMount::new(f64::INFINITY, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_array_keeps_registration_order() {
        let grid = split_grid();
        let mounts = [
            SensorMount::new(0.0, 2.0, 1.0).unwrap(),
            SensorMount::new(0.0, -2.0, 1.0).unwrap(),
        ];
        let array = SensorArray::from_mounts(&mounts, grid);
        let pose = Pose2D::new(5.0, 5.0, PI / 2.0);

        assert_eq!(array.len(), 2);
        assert_eq!(array.read_all(&pose), vec![1.0, 0.0]);

        let positions = array.positions(&pose);
        assert_relative_eq!(positions[0][0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(positions[1][0], 7.0, epsilon = 1e-12);
    }
}
