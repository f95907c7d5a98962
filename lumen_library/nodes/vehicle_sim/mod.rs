use crate::algorithms::kinematics::KinematicsEngine;
use crate::algorithms::light_sensor::SensorArray;
use crate::controllers::AutoController;
use crate::messages::{DriveMode, Pose2D, SimFrame};
use crate::nodes::mode_arbiter::ModeArbiter;
use crate::sinks::FrameSink;
use lumen_core::{LumenError, LumenResult, Node, NodeInfo};

/// Vehicle Simulation Node - one fixed-`dt` step of the vehicle per tick
///
/// Each tick reads the sensors at the current pose, picks the active command
/// (autonomous policy or the latest manual command), integrates it and hands
/// the resulting frame to the sink. Simulated time advances by exactly `dt`
/// per tick regardless of wall-clock pacing.
pub struct VehicleSimNode {
    name: String,
    engine: KinematicsEngine,
    sensors: SensorArray,
    arbiter: ModeArbiter,
    controller: Box<dyn AutoController>,
    sink: Box<dyn FrameSink>,
    dt: f64,
    ticks: u64,
    last_mode: DriveMode,
}

impl VehicleSimNode {
    pub fn new(
        engine: KinematicsEngine,
        sensors: SensorArray,
        arbiter: ModeArbiter,
        controller: Box<dyn AutoController>,
        sink: Box<dyn FrameSink>,
        dt: f64,
    ) -> LumenResult<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(LumenError::InvalidParameter(format!(
                "time step must be positive, got {}",
                dt
            )));
        }
        let last_mode = arbiter.mode();
        Ok(Self {
            name: "VehicleSimNode".to_string(),
            engine,
            sensors,
            arbiter,
            controller,
            sink,
            dt,
            ticks: 0,
            last_mode,
        })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn pose(&self) -> Pose2D {
        self.engine.pose()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated seconds since start
    pub fn sim_time(&self) -> f64 {
        self.ticks as f64 * self.dt
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Advance the vehicle by one `dt` and return the frame handed to the sink
    pub fn advance(&mut self) -> LumenResult<SimFrame> {
        let readings = self.sensors.read_all(&self.engine.pose());

        let control = self.arbiter.snapshot();
        let command = match control.mode {
            DriveMode::Auto => self.controller.control(&readings)?,
            DriveMode::Manual => control.manual,
        };

        self.engine.update(command, self.dt);
        self.ticks += 1;

        let pose = self.engine.pose();
        let frame = SimFrame {
            tick: self.ticks,
            time: self.sim_time(),
            pose,
            sensor_positions: self.sensors.positions(&pose),
            readings,
            velocity: command.velocity,
            steering: command.steering,
            mode: control.mode,
        };
        self.sink.present(&frame)?;

        Ok(frame)
    }
}

impl Node for VehicleSimNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, ctx: &mut NodeInfo) -> LumenResult<()> {
        let model = self.engine.model();
        ctx.log_info(&format!(
            "Vehicle ready: {:?} (steering in {}), {} sensor(s), controller '{}', dt = {}s, mode {}",
            model,
            model.steering_unit(),
            self.sensors.len(),
            self.controller.name(),
            self.dt,
            self.last_mode
        ));
        Ok(())
    }

    fn tick(&mut self, ctx: &mut NodeInfo) -> LumenResult<()> {
        match self.advance() {
            Ok(frame) => {
                if frame.mode != self.last_mode {
                    ctx.log_debug(&format!("Now driving in {} mode at tick {}", frame.mode, frame.tick));
                    self.last_mode = frame.mode;
                }
                Ok(())
            }
            Err(e) => {
                ctx.log_error(&format!("Tick {} failed: {}", self.ticks + 1, e));
                Err(e)
            }
        }
    }

    fn shutdown(&mut self, ctx: &mut NodeInfo) -> LumenResult<()> {
        let pose = self.engine.pose();
        ctx.log_info(&format!(
            "Stopped after {} ticks ({:.2}s simulated) at ({:.3}, {:.3}, {:.3})",
            self.ticks,
            self.sim_time(),
            pose.x,
            pose.y,
            pose.theta
        ));
        self.sink.finish()?;
        Ok(())
    }
}
