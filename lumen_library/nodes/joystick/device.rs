use lumen_core::LumenResult;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

#[cfg(feature = "gilrs")]
use gilrs::{Axis, Button, EventType, GamepadId, Gilrs};
#[cfg(feature = "gilrs")]
use lumen_core::LumenError;

/// Discrete event drained from an input device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    ButtonPressed(u32),
    ButtonReleased(u32),
    Disconnected,
}

/// Per-cycle device failure. The poller recovers from these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("device disconnected")]
    Disconnected,

    #[error("axis {axis} out of range ({available} axes)")]
    AxisOutOfRange { axis: u32, available: u32 },

    #[error("device backend error: {0}")]
    Backend(String),
}

/// Raw joystick access used by the poller thread
pub trait InputDevice {
    /// All events queued since the previous call, oldest first
    fn drain_events(&mut self) -> Vec<DeviceEvent>;

    /// Current axis value in `[-1, 1]`. Stick Y axes read positive when pulled back.
    fn axis(&mut self, index: u32) -> Result<f32, DeviceError>;
}

/// Opens the device on the poller thread
pub type DeviceFactory = Box<dyn FnOnce() -> LumenResult<Box<dyn InputDevice>> + Send>;

#[derive(Debug, Default)]
struct Script {
    events: VecDeque<DeviceEvent>,
    axes: Vec<f32>,
    disconnected: bool,
    polls: u64,
}

/// Scriptable in-memory device for headless runs and tests.
///
/// Clones share the same script, so a test can keep one handle while the
/// poller thread owns another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDevice {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDevice {
    /// Device with `axis_count` centred axes
    pub fn new(axis_count: usize) -> Self {
        let device = Self::default();
        device.script.lock().axes = vec![0.0; axis_count];
        device
    }

    pub fn set_axis(&self, index: usize, value: f32) {
        let mut script = self.script.lock();
        if index >= script.axes.len() {
            script.axes.resize(index + 1, 0.0);
        }
        script.axes[index] = value;
    }

    pub fn push_event(&self, event: DeviceEvent) {
        self.script.lock().events.push_back(event);
    }

    /// Queue a press followed by a release of `button`
    pub fn click(&self, button: u32) {
        let mut script = self.script.lock();
        script.events.push_back(DeviceEvent::ButtonPressed(button));
        script.events.push_back(DeviceEvent::ButtonReleased(button));
    }

    /// Axis reads fail until [`reconnect`](ScriptedDevice::reconnect)
    pub fn disconnect(&self) {
        let mut script = self.script.lock();
        script.disconnected = true;
        script.events.push_back(DeviceEvent::Disconnected);
    }

    pub fn reconnect(&self) {
        self.script.lock().disconnected = false;
    }

    /// Number of completed `drain_events` calls
    pub fn polls(&self) -> u64 {
        self.script.lock().polls
    }

    pub fn pending_events(&self) -> usize {
        self.script.lock().events.len()
    }

    /// Factory that hands a clone of this device to the poller
    pub fn factory(&self) -> DeviceFactory {
        let device = self.clone();
        Box::new(move || Ok(Box::new(device) as Box<dyn InputDevice>))
    }
}

impl InputDevice for ScriptedDevice {
    fn drain_events(&mut self) -> Vec<DeviceEvent> {
        let mut script = self.script.lock();
        script.polls += 1;
        script.events.drain(..).collect()
    }

    fn axis(&mut self, index: u32) -> Result<f32, DeviceError> {
        let script = self.script.lock();
        if script.disconnected {
            return Err(DeviceError::Disconnected);
        }
        script
            .axes
            .get(index as usize)
            .copied()
            .ok_or(DeviceError::AxisOutOfRange {
                axis: index,
                available: script.axes.len() as u32,
            })
    }
}

/// Gamepad read through gilrs
#[cfg(feature = "gilrs")]
pub struct GilrsDevice {
    gilrs: Gilrs,
    id: GamepadId,
}

#[cfg(feature = "gilrs")]
impl GilrsDevice {
    /// Open the `index`-th connected gamepad
    pub fn open(index: usize) -> LumenResult<Self> {
        let gilrs = Gilrs::new()
            .map_err(|e| LumenError::DeviceInit(format!("Failed to initialize gilrs: {}", e)))?;

        let ids: Vec<GamepadId> = gilrs.gamepads().map(|(id, _)| id).collect();
        let id = *ids.get(index).ok_or(LumenError::DeviceNotFound {
            index,
            found: ids.len(),
        })?;

        tracing::info!(index, name = gilrs.gamepad(id).name(), "opened gamepad");
        Ok(Self { gilrs, id })
    }

    /// Factory for [`JoystickPoller::start`](super::JoystickPoller::start)
    pub fn factory(index: usize) -> DeviceFactory {
        Box::new(move || Ok(Box::new(GilrsDevice::open(index)?) as Box<dyn InputDevice>))
    }
}

#[cfg(feature = "gilrs")]
impl InputDevice for GilrsDevice {
    fn drain_events(&mut self) -> Vec<DeviceEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.gilrs.next_event() {
            if event.id != self.id {
                continue;
            }
            match event.event {
                EventType::ButtonPressed(button, _) => {
                    events.push(DeviceEvent::ButtonPressed(button_to_id(button)))
                }
                EventType::ButtonReleased(button, _) => {
                    events.push(DeviceEvent::ButtonReleased(button_to_id(button)))
                }
                EventType::Disconnected => events.push(DeviceEvent::Disconnected),
                _ => {}
            }
        }
        events
    }

    fn axis(&mut self, index: u32) -> Result<f32, DeviceError> {
        let axis = id_to_axis(index).ok_or(DeviceError::AxisOutOfRange {
            axis: index,
            available: AXIS_COUNT,
        })?;
        let gamepad = self
            .gilrs
            .connected_gamepad(self.id)
            .ok_or(DeviceError::Disconnected)?;

        // gilrs reports stick Y up-positive
        let value = gamepad.value(axis);
        match axis {
            Axis::LeftStickY | Axis::RightStickY => Ok(-value),
            _ => Ok(value),
        }
    }
}

#[cfg(feature = "gilrs")]
const AXIS_COUNT: u32 = 8;

#[cfg(feature = "gilrs")]
fn button_to_id(button: Button) -> u32 {
    match button {
        Button::South => 0,
        Button::East => 1,
        Button::North => 2,
        Button::West => 3,
        Button::LeftTrigger => 4,
        Button::LeftTrigger2 => 5,
        Button::RightTrigger => 6,
        Button::RightTrigger2 => 7,
        Button::Select => 8,
        Button::Start => 9,
        Button::Mode => 10,
        Button::LeftThumb => 11,
        Button::RightThumb => 12,
        Button::DPadUp => 13,
        Button::DPadDown => 14,
        Button::DPadLeft => 15,
        Button::DPadRight => 16,
        _ => 255,
    }
}

#[cfg(feature = "gilrs")]
fn id_to_axis(index: u32) -> Option<Axis> {
    match index {
        0 => Some(Axis::LeftStickX),
        1 => Some(Axis::LeftStickY),
        2 => Some(Axis::LeftZ),
        3 => Some(Axis::RightStickX),
        4 => Some(Axis::RightStickY),
        5 => Some(Axis::RightZ),
        6 => Some(Axis::DPadX),
        7 => Some(Axis::DPadY),
        _ => None,
    }
}
