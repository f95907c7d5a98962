use crate::messages::{ControlCommand, DriveMode};
use crate::nodes::joystick::ButtonListener;
use parking_lot::Mutex;
use std::sync::Arc;

/// Default toggle button: South / A
pub const DEFAULT_TOGGLE_BUTTON: u32 = 0;

/// Drive mode and the latest manual command, always read and written together
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlState {
    pub mode: DriveMode,
    pub manual: ControlCommand,
}

/// Mode Arbiter - shared drive mode and manual command buffer
///
/// Cloning yields another handle to the same state. The poller thread
/// publishes manual commands and delivers button releases; the simulation
/// thread takes a [`snapshot`](ModeArbiter::snapshot) once per tick.
#[derive(Debug, Clone)]
pub struct ModeArbiter {
    state: Arc<Mutex<ControlState>>,
    toggle_button: u32,
}

impl ModeArbiter {
    /// Start in `Manual` with a zero command, toggled by button 0
    pub fn new() -> Self {
        Self::with_toggle_button(DEFAULT_TOGGLE_BUTTON)
    }

    pub fn with_toggle_button(toggle_button: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(ControlState::default())),
            toggle_button,
        }
    }

    /// Start in `mode` instead of `Manual`
    pub fn with_initial_mode(self, mode: DriveMode) -> Self {
        self.state.lock().mode = mode;
        self
    }

    pub fn mode(&self) -> DriveMode {
        self.state.lock().mode
    }

    pub fn manual_command(&self) -> ControlCommand {
        self.state.lock().manual
    }

    /// Mode and manual command under one lock acquisition
    pub fn snapshot(&self) -> ControlState {
        *self.state.lock()
    }

    pub fn publish_manual(&self, command: ControlCommand) {
        self.state.lock().manual = command;
    }

    /// Flip the mode, returning the new one
    pub fn toggle(&self) -> DriveMode {
        let mode = {
            let mut state = self.state.lock();
            state.mode = state.mode.toggled();
            state.mode
        };
        tracing::info!(%mode, "drive mode changed");
        mode
    }

    pub fn toggle_button(&self) -> u32 {
        self.toggle_button
    }
}

impl Default for ModeArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonListener for ModeArbiter {
    fn on_button_release(&self, button: u32) {
        if button == self.toggle_button {
            self.toggle();
        }
    }
}
