//! LUMEN Library Nodes
//!
//! Runtime pieces of the simulator. Only `VehicleSimNode` is a scheduler
//! [`Node`](lumen_core::Node); the joystick poller runs on its own thread and
//! the mode arbiter is the lock-protected state the two share.
//!
//! - `VehicleSimNode` - fixed-step vehicle simulation tick
//! - `JoystickPoller` - background manual input polling
//! - `ModeArbiter` - drive mode and latest manual command

pub mod joystick;
pub mod mode_arbiter;
pub mod vehicle_sim;

pub use joystick::{
    ButtonListener, DeviceError, DeviceEvent, DeviceFactory, InputDevice, JoystickConfig, JoystickPoller,
    PollCycle, PollerState, ScriptedDevice,
};
#[cfg(feature = "gilrs")]
pub use joystick::GilrsDevice;
pub use mode_arbiter::{ControlState, ModeArbiter};
pub use vehicle_sim::VehicleSimNode;
