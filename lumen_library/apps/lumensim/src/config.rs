use anyhow::{bail, Context, Result};
use lumen_library::algorithms::kinematics::MotionModel;
use lumen_library::algorithms::light_sensor::SensorMount;
use lumen_library::controllers::ControllerConfig;
use lumen_library::nodes::JoystickConfig;
use lumen_library::{DriveMode, Pose2D};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

/// Map image and the world area it covers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    /// Grayscale map image; a uniform grid is used when absent
    pub map: Option<PathBuf>,
    /// Pixels per world unit for the uniform grid
    pub default_resolution: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 25.0,
            height: 25.0,
            map: None,
            default_resolution: 10.0,
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    /// Fixed simulation step (seconds)
    pub dt: f64,
    pub initial_pose: Pose2D,
    pub initial_mode: DriveMode,
    pub motion_model: MotionModel,
    pub sensors: Vec<SensorMount>,
    pub joystick: JoystickConfig,
    pub controller: ControllerConfig,
    /// Log every n-th frame at info level
    pub log_every: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            dt: 0.01,
            initial_pose: Pose2D::new(0.5, 0.1, PI / 6.0),
            initial_mode: DriveMode::Manual,
            motion_model: MotionModel::AckermanSteer { wheelbase: 1.0 },
            sensors: default_sensors(),
            joystick: JoystickConfig::default(),
            controller: ControllerConfig::default(),
            log_every: 100,
        }
    }
}

/// Eight sensors across the front of the vehicle, left to right
fn default_sensors() -> Vec<SensorMount> {
    [1.75, 1.25, 0.75, 0.25, -0.25, -0.75, -1.25, -1.75]
        .iter()
        .filter_map(|&y| SensorMount::new(0.5, y, 0.5).ok())
        .collect()
}

impl SimConfig {
    /// Load from YAML, or TOML when the extension is `.toml`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;

        // Auto-detect format from file extension
        let config: SimConfig = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))?
        } else {
            // Default to YAML for .yaml, .yml, or no extension
            serde_yaml::from_str(&content).with_context(|| format!("invalid YAML in {}", path.display()))?
        };
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            bail!("dt must be positive, got {}", self.dt);
        }
        let world = &self.world;
        if !(world.width.is_finite() && world.width > 0.0 && world.height.is_finite() && world.height > 0.0) {
            bail!("world size must be positive, got {} x {}", world.width, world.height);
        }
        if !(world.default_resolution.is_finite() && world.default_resolution > 0.0) {
            bail!("default_resolution must be positive, got {}", world.default_resolution);
        }
        if !self.initial_pose.is_finite() {
            bail!("initial pose must be finite, got {:?}", self.initial_pose);
        }
        self.motion_model.validate()?;
        self.joystick.validate()?;
        Ok(())
    }
}
