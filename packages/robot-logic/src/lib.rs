//! Competition logic for the flywheel robot.
//!
//! This crate holds everything the robot program does that isn't talking to hardware:
//!
//! - [`session`]: the background task regulating the flywheel, driven by a
//!   [`VelocityController`](flywheel_control::VelocityController),
//! - [`handle`]: the target and completion flag shared between that task and its owner,
//! - [`routine`]: scripted autonomous routines,
//! - [`driver`]: the driver control button map,
//! - [`sim`]: a simulated flywheel for tests and bench runs.
//!
//! Hardware is reached through the traits in [`actuator`] and [`devices`], which the robot
//! program implements on top of the vendor runtime. None of the code here depends on a
//! particular executor; waiting is done through [`Delay`](devices::Delay).

#![no_std]

extern crate alloc;

pub mod actuator;
pub mod config;
pub mod devices;
pub mod driver;
pub mod handle;
pub mod routine;
pub mod session;
pub mod sim;

pub use actuator::{Command, CommandMode, OutputMapping, VelocityActuator};
pub use config::{RobotConfig, RobotConfigError};
pub use driver::{DriverControl, DriverInput, DriverOutput};
pub use handle::{FlywheelHandle, SessionGuard};
pub use routine::{Routine, RoutineReport, RoutineRunner, Step};
pub use session::{FlywheelTask, SessionError, SessionReport};
pub use sim::SimulatedFlywheel;
