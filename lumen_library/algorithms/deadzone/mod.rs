//! Axis Shaping
//!
//! Deadzone rescaling and axis-to-command mapping for analog sticks.
//!
//! Raw axis values in `[-1, 1]` pass through a deadzone with linear
//! rescale, so the output is continuous at the deadzone edge and still
//! reaches `±1` at full deflection:
//!
//! ```text
//! |v| <= dz  ->  0
//! |v| >  dz  ->  sign(v) * (|v| - dz) / (1 - dz)
//! ```
//!
//! # Example
//!
//! ```rust
//! use lumen_library::algorithms::deadzone::{apply_deadzone, AxisMapping};
//!
//! assert_eq!(apply_deadzone(0.05, 0.1), 0.0);
//! assert_eq!(apply_deadzone(1.0, 0.1), 1.0);
//!
//! // Stick pushed forward reads negative; mapping inverts and scales it
//! let throttle = AxisMapping::new(0.1, 15.0, true);
//! assert_eq!(throttle.map(-1.0), 15.0);
//! ```

/// Deadzone with linear rescale. `deadzone` is expected in `[0, 1)`.
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    let magnitude = value.abs();
    if magnitude <= deadzone {
        return 0.0;
    }
    value.signum() * (magnitude - deadzone) / (1.0 - deadzone)
}

/// Clamp to `[-limit, limit]`
pub fn clamp_symmetric(value: f64, limit: f64) -> f64 {
    value.clamp(-limit, limit)
}

/// Maps one raw axis to a command component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMapping {
    pub deadzone: f32,
    pub limit: f64,
    pub invert: bool,
}

impl AxisMapping {
    pub fn new(deadzone: f32, limit: f64, invert: bool) -> Self {
        Self {
            deadzone,
            limit,
            invert,
        }
    }

    /// Deadzone, optional sign flip, scale by `limit`, clamp to `±limit`
    pub fn map(&self, raw: f32) -> f64 {
        let shaped = apply_deadzone(raw, self.deadzone) as f64;
        let signed = if self.invert { -shaped } else { shaped };
        clamp_symmetric(signed * self.limit, self.limit)
    }
}
