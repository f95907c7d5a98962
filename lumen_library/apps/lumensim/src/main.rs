//! # lumensim - light-sensing vehicle simulator
//!
//! Drives a simulated vehicle over a brightness map, either by gamepad or by
//! an autonomous policy. Press the toggle button (South / A by default) to
//! switch between manual and autonomous control.
//!
//! Usage:
//!   lumensim                                   # Defaults, first gamepad
//!   lumensim --config lumensim.yaml            # Custom configuration
//!   lumensim --map track.png --world-width 25  # Custom map
//!   lumensim --headless-input --mode auto --ticks 1000 --record run.csv

mod config;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use config::SimConfig;
use lumen_core::Scheduler;
use lumen_library::algorithms::intensity_grid::IntensityGrid;
use lumen_library::prelude::*;
use lumen_library::nodes::DeviceFactory;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Manual,
    Auto,
}

impl From<ModeArg> for DriveMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Manual => DriveMode::Manual,
            ModeArg::Auto => DriveMode::Auto,
        }
    }
}

/// CLI arguments
#[derive(Parser)]
#[command(name = "lumensim")]
#[command(about = "Light-sensing ground vehicle simulator")]
struct Args {
    /// Configuration file (YAML, or TOML by extension)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Map image (PNG, JPG), read as grayscale brightness
    #[arg(long)]
    map: Option<PathBuf>,

    /// World width covered by the map
    #[arg(long)]
    world_width: Option<f64>,

    /// World height covered by the map
    #[arg(long)]
    world_height: Option<f64>,

    /// Use a scripted idle input device instead of a gamepad
    #[arg(long)]
    headless_input: bool,

    /// Initial drive mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Stop after this many wall-clock seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Stop after this many simulation ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Record the trajectory to a CSV file
    #[arg(long)]
    record: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// CLI flags override file values
    fn apply(&self, config: &mut SimConfig) {
        if let Some(map) = &self.map {
            config.world.map = Some(map.clone());
        }
        if let Some(width) = self.world_width {
            config.world.width = width;
        }
        if let Some(height) = self.world_height {
            config.world.height = height;
        }
        if let Some(mode) = self.mode {
            config.initial_mode = mode.into();
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

fn load_map(config: &SimConfig) -> Result<IntensityGrid> {
    let world = &config.world;
    match &world.map {
        Some(path) => Ok(IntensityGrid::from_image(path, world.width, world.height)?),
        None => {
            let width_px = (world.width * world.default_resolution).round().max(1.0) as usize;
            let height_px = (world.height * world.default_resolution).round().max(1.0) as usize;
            info!(width_px, height_px, "no map configured, using a uniform dark grid");
            Ok(IntensityGrid::filled(width_px, height_px, 0.0, world.width, world.height)?)
        }
    }
}

fn device_factory(config: &SimConfig, headless: bool) -> DeviceFactory {
    if headless {
        info!("using scripted input device");
        return ScriptedDevice::new(2).factory();
    }

    #[cfg(feature = "gilrs")]
    {
        lumen_library::nodes::GilrsDevice::factory(config.joystick.index)
    }

    #[cfg(not(feature = "gilrs"))]
    {
        warn!(
            index = config.joystick.index,
            "built without gamepad support, falling back to scripted input"
        );
        ScriptedDevice::new(2).factory()
    }
}

fn build_sink(config: &SimConfig, record: Option<&PathBuf>) -> Result<Box<dyn FrameSink>> {
    let mut sink = FanOutSink::new().with(Box::new(LogSink::new(config.log_every)));
    if let Some(path) = record {
        let csv = CsvTrajectorySink::create(path, config.sensors.len())
            .with_context(|| format!("failed to create trajectory file {}", path.display()))?;
        info!(path = %path.display(), "recording trajectory");
        sink.push(Box::new(csv));
    }
    Ok(Box::new(sink))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    // Startup: config, map, engine, sensors, controller, input
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;
    let duration = args
        .duration
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("--duration must be a non-negative number of seconds")?;

    let grid = Arc::new(load_map(&config)?);
    let engine = KinematicsEngine::new(config.motion_model, config.initial_pose)?;
    let sensors = SensorArray::from_mounts(&config.sensors, grid);
    let controller = config.controller.build()?;
    let sink = build_sink(&config, args.record.as_ref())?;

    let arbiter =
        ModeArbiter::with_toggle_button(config.joystick.toggle_button).with_initial_mode(config.initial_mode);
    let mut poller = JoystickPoller::new(config.joystick.clone(), arbiter.clone());
    poller.add_listener(Arc::new(arbiter.clone()));
    poller
        .start(device_factory(&config, args.headless_input))
        .context("failed to start joystick input")?;

    let sim = VehicleSimNode::new(engine, sensors, arbiter, controller, sink, config.dt)?;
    let mut scheduler = Scheduler::new()
        .name("lumensim")
        .with_rate(1.0 / config.dt)
        .handle_ctrl_c();
    scheduler.add(Box::new(sim), 0);

    info!(
        dt = config.dt,
        model = ?config.motion_model,
        sensors = config.sensors.len(),
        mode = %config.initial_mode,
        "starting simulation (Ctrl+C to stop)"
    );

    let result = match (args.ticks, duration) {
        (Some(ticks), _) => scheduler.run_ticks(ticks),
        (None, Some(limit)) => scheduler.run_for(limit),
        (None, None) => scheduler.run(),
    };

    let state = poller.stop();
    if state != PollerState::Stopped {
        warn!(%state, "input poller did not shut down cleanly");
    }

    result.context("simulation failed")?;
    Ok(())
}
