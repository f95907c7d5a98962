//! Joystick Poller - background manual control source
//!
//! Polls an [`InputDevice`] on its own thread at a fixed rate. Each cycle
//! dispatches button releases to the registered [`ButtonListener`]s, maps the
//! throttle and steering axes to a [`ControlCommand`] and publishes it through
//! the [`ModeArbiter`]. The simulation tick never waits on this thread; it
//! reuses whatever command was published last.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lumen_library::nodes::joystick::{JoystickConfig, JoystickPoller, ScriptedDevice};
//! use lumen_library::nodes::mode_arbiter::ModeArbiter;
//!
//! let arbiter = ModeArbiter::new();
//! let mut poller = JoystickPoller::new(JoystickConfig::default(), arbiter.clone());
//! poller.add_listener(Arc::new(arbiter.clone()));
//!
//! let device = ScriptedDevice::new(2);
//! poller.start(device.factory()).unwrap();
//! // ... run the simulation ...
//! poller.stop();
//! ```

mod device;

pub use device::{DeviceError, DeviceEvent, DeviceFactory, InputDevice, ScriptedDevice};
#[cfg(feature = "gilrs")]
pub use device::GilrsDevice;

use crate::algorithms::deadzone::AxisMapping;
use crate::messages::ControlCommand;
use crate::nodes::mode_arbiter::{ModeArbiter, DEFAULT_TOGGLE_BUTTON};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use lumen_core::{LumenError, LumenResult, RateTimer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Receives button releases on the poller thread. Must not block.
pub trait ButtonListener: Send + Sync {
    fn on_button_release(&self, button: u32);
}

/// Joystick mapping and polling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickConfig {
    /// Which connected gamepad to open
    pub index: usize,
    pub axis_throttle: u32,
    pub axis_steer: u32,
    /// Velocity at full throttle
    pub vmax: f64,
    /// Steering at full deflection (degrees for Ackerman, rad/s for tank)
    pub steer_max: f64,
    pub deadzone: f32,
    pub rate_hz: f64,
    pub toggle_button: u32,
    /// How long `stop()` waits for the thread to exit
    pub join_timeout_secs: f64,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            index: 0,
            axis_throttle: 1,
            axis_steer: 0,
            vmax: 15.0,
            steer_max: 60.0,
            deadzone: 0.10,
            rate_hz: 120.0,
            toggle_button: DEFAULT_TOGGLE_BUTTON,
            join_timeout_secs: 1.0,
        }
    }
}

impl JoystickConfig {
    pub fn validate(&self) -> LumenResult<()> {
        if !(self.rate_hz.is_finite() && self.rate_hz > 0.0) {
            return Err(LumenError::Config(format!(
                "joystick rate_hz must be positive, got {}",
                self.rate_hz
            )));
        }
        if !(0.0..1.0).contains(&self.deadzone) {
            return Err(LumenError::Config(format!(
                "joystick deadzone must be in [0, 1), got {}",
                self.deadzone
            )));
        }
        if !(self.vmax.is_finite() && self.vmax >= 0.0 && self.steer_max.is_finite() && self.steer_max >= 0.0) {
            return Err(LumenError::Config(format!(
                "joystick limits must be non-negative, got vmax={} steer_max={}",
                self.vmax, self.steer_max
            )));
        }
        if !(self.join_timeout_secs.is_finite() && self.join_timeout_secs > 0.0) {
            return Err(LumenError::Config(format!(
                "joystick join_timeout_secs must be positive, got {}",
                self.join_timeout_secs
            )));
        }
        if let Err(e) = Duration::try_from_secs_f64(self.join_timeout_secs) {
            return Err(LumenError::Config(format!(
                "joystick join_timeout_secs out of range ({}): {}",
                self.join_timeout_secs, e
            )));
        }
        if let Err(e) = Duration::try_from_secs_f64(1.0 / self.rate_hz) {
            return Err(LumenError::Config(format!(
                "joystick rate_hz {} has no usable period: {}",
                self.rate_hz, e
            )));
        }
        Ok(())
    }

    /// Stop timeout; values too large to represent wait indefinitely
    pub fn join_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.join_timeout_secs).unwrap_or(Duration::MAX)
    }

    fn throttle_mapping(&self) -> AxisMapping {
        // Pulling back reads positive; forward drives forward
        AxisMapping::new(self.deadzone, self.vmax, true)
    }

    fn steer_mapping(&self) -> AxisMapping {
        AxisMapping::new(self.deadzone, self.steer_max, true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Stopped,
    Running,
    /// `stop()` gave up waiting; the thread may still be finishing its cycle
    StopTimedOut,
}

impl fmt::Display for PollerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollerState::Stopped => write!(f, "stopped"),
            PollerState::Running => write!(f, "running"),
            PollerState::StopTimedOut => write!(f, "stop timed out"),
        }
    }
}

/// One poll cycle's worth of work, owned by the poller thread
pub struct PollCycle {
    throttle: AxisMapping,
    steer: AxisMapping,
    axis_throttle: u32,
    axis_steer: u32,
    arbiter: ModeArbiter,
    listeners: Vec<Arc<dyn ButtonListener>>,
    in_outage: bool,
}

impl PollCycle {
    pub fn new(config: &JoystickConfig, arbiter: ModeArbiter, listeners: Vec<Arc<dyn ButtonListener>>) -> Self {
        Self {
            throttle: config.throttle_mapping(),
            steer: config.steer_mapping(),
            axis_throttle: config.axis_throttle,
            axis_steer: config.axis_steer,
            arbiter,
            listeners,
            in_outage: false,
        }
    }

    /// Drain events, read axes, publish. Returns the published command.
    pub fn run(&mut self, device: &mut dyn InputDevice) -> ControlCommand {
        for event in device.drain_events() {
            match event {
                DeviceEvent::ButtonReleased(button) => {
                    tracing::debug!(button, "button released");
                    for listener in &self.listeners {
                        listener.on_button_release(button);
                    }
                }
                DeviceEvent::ButtonPressed(_) => {}
                DeviceEvent::Disconnected => tracing::warn!("input device disconnected"),
            }
        }

        let command = match (device.axis(self.axis_throttle), device.axis(self.axis_steer)) {
            (Ok(throttle), Ok(steer)) => {
                if self.in_outage {
                    tracing::info!("axis input recovered");
                    self.in_outage = false;
                }
                ControlCommand::new(self.throttle.map(throttle), self.steer.map(steer))
            }
            (Err(e), _) | (_, Err(e)) => {
                if !self.in_outage {
                    tracing::warn!(error = %e, "axis read failed, publishing zero command");
                    self.in_outage = true;
                }
                ControlCommand::zero()
            }
        };

        self.arbiter.publish_manual(command);
        command
    }

    pub fn in_outage(&self) -> bool {
        self.in_outage
    }
}

/// Owns the poller thread and its lifecycle
pub struct JoystickPoller {
    config: JoystickConfig,
    arbiter: ModeArbiter,
    listeners: Vec<Arc<dyn ButtonListener>>,
    running: Arc<AtomicBool>,
    state: PollerState,
    done: Option<Receiver<()>>,
    handle: Option<JoinHandle<()>>,
}

impl JoystickPoller {
    pub fn new(config: JoystickConfig, arbiter: ModeArbiter) -> Self {
        Self {
            config,
            arbiter,
            listeners: Vec::new(),
            running: Arc::new(AtomicBool::new(false)),
            state: PollerState::Stopped,
            done: None,
            handle: None,
        }
    }

    /// Register a listener. Takes effect on the next `start()`.
    pub fn add_listener(&mut self, listener: Arc<dyn ButtonListener>) -> &mut Self {
        self.listeners.push(listener);
        self
    }

    pub fn config(&self) -> &JoystickConfig {
        &self.config
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Open the device on a new polling thread and start publishing.
    ///
    /// Returns the device-open error if the factory fails. Calling this on a
    /// running poller does nothing.
    pub fn start(&mut self, open: DeviceFactory) -> LumenResult<()> {
        let state = self.state;
        match state {
            PollerState::Running => return Ok(()),
            PollerState::StopTimedOut if !self.previous_thread_exited() => {
                return Err(LumenError::Internal(
                    "previous poll thread has not exited".to_string(),
                ));
            }
            _ => {}
        }

        self.config.validate()?;
        let mut timer = RateTimer::new(self.config.rate_hz)?;
        let mut cycle = PollCycle::new(&self.config, self.arbiter.clone(), self.listeners.clone());

        let (ready_tx, ready_rx) = bounded::<LumenResult<()>>(1);
        let (done_tx, done_rx) = bounded::<()>(1);
        // One flag per thread; a detached predecessor keeps its own
        self.running = Arc::new(AtomicBool::new(true));
        let running = self.running.clone();

        let spawned = thread::Builder::new()
            .name("joystick-poller".to_string())
            .spawn(move || {
                let mut device = match open() {
                    Ok(device) => {
                        let _ = ready_tx.send(Ok(()));
                        device
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                timer.reset();
                while running.load(Ordering::SeqCst) {
                    cycle.run(device.as_mut());
                    timer.wait();
                }
                if timer.overruns() > 0 {
                    tracing::debug!(overruns = timer.overruns(), "poller missed its schedule");
                }

                drop(device);
                let _ = done_tx.send(());
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        let opened = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(LumenError::Internal("poll thread exited during startup".to_string())));

        match opened {
            Ok(()) => {
                tracing::info!(rate_hz = self.config.rate_hz, "joystick poller started");
                self.state = PollerState::Running;
                self.done = Some(done_rx);
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                self.state = PollerState::Stopped;
                Err(e)
            }
        }
    }

    /// Signal the thread and wait up to `join_timeout` for it to exit.
    ///
    /// Idempotent: stopping a poller that is not running returns its
    /// current state unchanged.
    pub fn stop(&mut self) -> PollerState {
        if self.state != PollerState::Running {
            return self.state;
        }

        self.running.store(false, Ordering::SeqCst);
        let timeout = self.config.join_timeout();
        let exited = match &self.done {
            Some(done) => match done.recv_timeout(timeout) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
                Err(RecvTimeoutError::Timeout) => false,
            },
            None => true,
        };

        if exited {
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
            self.done = None;
            self.state = PollerState::Stopped;
            tracing::info!("joystick poller stopped");
        } else {
            // Leave the thread detached; it exits after its current cycle
            self.handle = None;
            self.state = PollerState::StopTimedOut;
            tracing::warn!(timeout_secs = timeout.as_secs_f64(), "joystick poller did not stop in time");
        }
        self.state
    }

    fn previous_thread_exited(&mut self) -> bool {
        let exited = match &self.done {
            Some(done) => !matches!(done.try_recv(), Err(crossbeam_channel::TryRecvError::Empty)),
            None => true,
        };
        if exited {
            self.done = None;
        }
        exited
    }
}

impl Drop for JoystickPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::DriveMode;
    use parking_lot::Mutex;

    struct Recorder(Mutex<Vec<u32>>);

    impl ButtonListener for Recorder {
        fn on_button_release(&self, button: u32) {
            self.0.lock().push(button);
        }
    }

    #[test]
    fn test_default_config_matches_demo() {
        let config = JoystickConfig::default();
        assert_eq!(config.axis_throttle, 1);
        assert_eq!(config.axis_steer, 0);
        assert_eq!(config.vmax, 15.0);
        assert_eq!(config.steer_max, 60.0);
        assert_eq!(config.rate_hz, 120.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = JoystickConfig {
            deadzone: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = JoystickConfig {
            rate_hz: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_timings_are_config_errors() {
        let config = JoystickConfig {
            rate_hz: 1e-20,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LumenError::Config(_))));

        let config = JoystickConfig {
            join_timeout_secs: 1e30,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LumenError::Config(_))));
        assert_eq!(config.join_timeout(), Duration::MAX);

        let mut poller = JoystickPoller::new(config, ModeArbiter::new());
        let device = ScriptedDevice::new(2);
        assert!(poller.start(device.factory()).is_err());
        assert_eq!(poller.state(), PollerState::Stopped);
    }

    #[test]
    fn test_cycle_maps_axes() {
        let arbiter = ModeArbiter::new();
        let mut cycle = PollCycle::new(&JoystickConfig::default(), arbiter.clone(), Vec::new());
        let mut device = ScriptedDevice::new(2);

        // Stick fully forward and fully left
        device.set_axis(1, -1.0);
        device.set_axis(0, -1.0);
        let command = cycle.run(&mut device);

        assert_eq!(command, ControlCommand::new(15.0, 60.0));
        assert_eq!(arbiter.manual_command(), command);
    }

    #[test]
    fn test_cycle_applies_deadzone() {
        let arbiter = ModeArbiter::new();
        let mut cycle = PollCycle::new(&JoystickConfig::default(), arbiter, Vec::new());
        let mut device = ScriptedDevice::new(2);

        device.set_axis(1, 0.08);
        device.set_axis(0, -0.1);
        assert!(cycle.run(&mut device).is_zero());
    }

    #[test]
    fn test_cycle_dispatches_releases_once() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let arbiter = ModeArbiter::new();
        let mut cycle = PollCycle::new(
            &JoystickConfig::default(),
            arbiter.clone(),
            vec![
                recorder.clone() as Arc<dyn ButtonListener>,
                Arc::new(arbiter.clone()) as Arc<dyn ButtonListener>,
            ],
        );
        let mut device = ScriptedDevice::new(2);

        device.click(0);
        device.click(5);
        device.push_event(DeviceEvent::ButtonPressed(2));
        cycle.run(&mut device);
        cycle.run(&mut device);

        assert_eq!(*recorder.0.lock(), vec![0, 5]);
        assert_eq!(arbiter.mode(), DriveMode::Auto);
    }

    #[test]
    fn test_axis_failure_publishes_zero() {
        let arbiter = ModeArbiter::new();
        let mut cycle = PollCycle::new(&JoystickConfig::default(), arbiter.clone(), Vec::new());
        let mut device = ScriptedDevice::new(2);

        device.set_axis(1, -1.0);
        cycle.run(&mut device);
        assert!(!arbiter.manual_command().is_zero());

        device.disconnect();
        assert!(cycle.run(&mut device).is_zero());
        assert!(cycle.in_outage());
        assert!(arbiter.manual_command().is_zero());

        device.reconnect();
        assert!(!cycle.run(&mut device).is_zero());
        assert!(!cycle.in_outage());
    }

    #[test]
    fn test_missing_axis_publishes_zero() {
        let config = JoystickConfig {
            axis_steer: 7,
            ..Default::default()
        };
        let mut cycle = PollCycle::new(&config, ModeArbiter::new(), Vec::new());
        let mut device = ScriptedDevice::new(2);
        device.set_axis(1, -1.0);
        assert!(cycle.run(&mut device).is_zero());
    }

    #[test]
    fn test_stop_before_start_is_noop() {
        let mut poller = JoystickPoller::new(JoystickConfig::default(), ModeArbiter::new());
        assert_eq!(poller.stop(), PollerState::Stopped);
        assert_eq!(poller.stop(), PollerState::Stopped);
    }

    #[test]
    fn test_open_failure_is_returned() {
        let mut poller = JoystickPoller::new(JoystickConfig::default(), ModeArbiter::new());
        let err = poller
            .start(Box::new(|| Err(LumenError::DeviceNotFound { index: 0, found: 0 })))
            .unwrap_err();
        assert!(matches!(err, LumenError::DeviceNotFound { index: 0, found: 0 }));
        assert_eq!(poller.state(), PollerState::Stopped);
    }
}
