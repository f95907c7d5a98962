// Manual input path: poller thread, shared control state, mode toggling
use lumen_core::LumenError;
use lumen_library::nodes::{DeviceError, DeviceEvent};
use lumen_library::prelude::*;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Spin until `condition` holds or the deadline passes
fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

fn fast_config() -> JoystickConfig {
    JoystickConfig {
        rate_hz: 500.0,
        ..Default::default()
    }
}

#[test]
fn test_concurrent_publish_never_tears() {
    let arbiter = ModeArbiter::new();
    let barrier = Arc::new(Barrier::new(3));

    // Every published command has steering == -velocity
    let writer = {
        let arbiter = arbiter.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
            barrier.wait();
            for i in 1..=1000 {
                let v = i as f64;
                arbiter.publish_manual(ControlCommand::new(v, -v));
            }
        })
    };

    // Reads until the last command lands, so it overlaps every write
    let reader = {
        let arbiter = arbiter.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
            barrier.wait();
            let mut reads = 0u64;
            loop {
                let state = arbiter.snapshot();
                assert_eq!(state.manual.steering, -state.manual.velocity);
                let command = arbiter.manual_command();
                assert_eq!(command.steering, -command.velocity);
                reads += 1;
                if state.manual.velocity == 1000.0 {
                    return reads;
                }
            }
        })
    };

    barrier.wait();
    writer.join().unwrap();
    let reads = reader.join().unwrap();

    assert!(reads > 0);
    assert_eq!(arbiter.manual_command(), ControlCommand::new(1000.0, -1000.0));
}

#[test]
fn test_poller_publishes_mapped_commands() {
    let arbiter = ModeArbiter::new();
    let device = ScriptedDevice::new(2);
    let mut poller = JoystickPoller::new(fast_config(), arbiter.clone());

    // Full forward, no steering
    device.set_axis(1, -1.0);
    poller.start(device.factory()).unwrap();
    assert_eq!(poller.state(), PollerState::Running);

    assert!(wait_for(Duration::from_secs(2), || arbiter.manual_command()
        == ControlCommand::new(15.0, 0.0)));

    // Full right
    device.set_axis(0, 1.0);
    assert!(wait_for(Duration::from_secs(2), || arbiter.manual_command()
        == ControlCommand::new(15.0, -60.0)));

    assert_eq!(poller.stop(), PollerState::Stopped);
}

#[test]
fn test_poller_dispatches_each_release_once() {
    let arbiter = ModeArbiter::new();
    let device = ScriptedDevice::new(2);
    let mut poller = JoystickPoller::new(fast_config(), arbiter.clone());
    poller.add_listener(Arc::new(arbiter.clone()));
    poller.start(device.factory()).unwrap();

    device.click(0);
    assert!(wait_for(Duration::from_secs(2), || device.pending_events() == 0));
    let polls = device.polls();
    assert!(wait_for(Duration::from_secs(2), || device.polls() > polls + 3));
    assert_eq!(arbiter.mode(), DriveMode::Auto);

    // Non-toggle buttons leave the mode alone
    device.click(3);
    assert!(wait_for(Duration::from_secs(2), || device.pending_events() == 0));
    let polls = device.polls();
    assert!(wait_for(Duration::from_secs(2), || device.polls() > polls + 3));
    assert_eq!(arbiter.mode(), DriveMode::Auto);

    device.click(0);
    assert!(wait_for(Duration::from_secs(2), || arbiter.mode() == DriveMode::Manual));

    poller.stop();
}

#[test]
fn test_poller_survives_disconnect() {
    let arbiter = ModeArbiter::new();
    let device = ScriptedDevice::new(2);
    let mut poller = JoystickPoller::new(fast_config(), arbiter.clone());

    device.set_axis(1, -1.0);
    poller.start(device.factory()).unwrap();
    assert!(wait_for(Duration::from_secs(2), || !arbiter.manual_command().is_zero()));

    device.disconnect();
    assert!(wait_for(Duration::from_secs(2), || arbiter.manual_command().is_zero()));
    assert_eq!(poller.state(), PollerState::Running);

    device.reconnect();
    assert!(wait_for(Duration::from_secs(2), || !arbiter.manual_command().is_zero()));

    poller.stop();
}

#[test]
fn test_start_and_stop_are_idempotent() {
    let arbiter = ModeArbiter::new();
    let device = ScriptedDevice::new(2);
    let mut poller = JoystickPoller::new(fast_config(), arbiter);

    poller.start(device.factory()).unwrap();
    // Second start is a no-op and never calls the factory
    poller
        .start(Box::new(|| Err(LumenError::DeviceNotFound { index: 9, found: 0 })))
        .unwrap();
    assert_eq!(poller.state(), PollerState::Running);

    assert_eq!(poller.stop(), PollerState::Stopped);
    assert_eq!(poller.stop(), PollerState::Stopped);

    // Restart after a clean stop
    poller.start(device.factory()).unwrap();
    assert_eq!(poller.state(), PollerState::Running);
    assert_eq!(poller.stop(), PollerState::Stopped);
}

#[test]
fn test_missing_device_is_startup_error() {
    let mut poller = JoystickPoller::new(JoystickConfig::default(), ModeArbiter::new());
    let err = poller
        .start(Box::new(|| Err(LumenError::DeviceNotFound { index: 0, found: 0 })))
        .unwrap_err();

    assert!(err.is_construction_error());
    assert_eq!(poller.state(), PollerState::Stopped);
}

/// Device whose axis reads block long enough to outlast the join timeout
struct SlowDevice;

impl InputDevice for SlowDevice {
    fn drain_events(&mut self) -> Vec<DeviceEvent> {
        Vec::new()
    }

    fn axis(&mut self, _index: u32) -> Result<f32, DeviceError> {
        thread::sleep(Duration::from_millis(300));
        Ok(0.0)
    }
}

#[test]
fn test_stop_timeout_is_reported() {
    let config = JoystickConfig {
        join_timeout_secs: 0.05,
        ..fast_config()
    };
    let mut poller = JoystickPoller::new(config, ModeArbiter::new());
    poller
        .start(Box::new(|| Ok(Box::new(SlowDevice) as Box<dyn InputDevice>)))
        .unwrap();

    // Let the thread get into its first blocking read
    thread::sleep(Duration::from_millis(20));
    assert_eq!(poller.stop(), PollerState::StopTimedOut);
    assert_eq!(poller.state(), PollerState::StopTimedOut);

    // Stopping again reports the same state
    assert_eq!(poller.stop(), PollerState::StopTimedOut);
}
