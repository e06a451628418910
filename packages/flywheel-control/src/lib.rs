//! Velocity control for flywheel launchers.
//!
//! A flywheel has to come back to speed quickly after every launch and then hold that speed
//! without oscillating. This crate provides a small PID-style controller tuned for that job:
//!
//! - the correction is added to the *measured* velocity by default, so the controller nudges
//!   the wheel's current speed instead of commanding the target outright,
//! - gains can be scheduled on the size of the error (hard push when far away, gentle settling
//!   when close),
//! - the integral accumulator is protected by an explicit [`AntiWindup`] policy.
//!
//! Everything is configured through [`ControllerConfig`]. Converting the controller's output to
//! volts or motor RPM is left to the caller.
//!
//! ```
//! use flywheel_control::{ControllerConfig, VelocityController};
//!
//! let mut controller = VelocityController::new(ControllerConfig::INTEGRATING).unwrap();
//!
//! let output = controller.update(0.0, 615.0).unwrap();
//! assert!((output.command - 615.615).abs() < 1e-9);
//! ```

#![no_std]

pub mod config;
pub mod controller;
pub mod gains;

pub use config::{AntiWindup, ConfigError, ControllerConfig, IntegralMode, OutputReference};
pub use controller::{
    ControlError, ControlOutput, ControlSample, ControllerState, VelocityController, compute,
};
pub use gains::{BandEdge, ErrorBand, GainMode, GainSchedule, Gains};
