//! The rest of the robot, as seen by routines and driver control.
//!
//! Drivetrain motion, the intake and the pneumatics all belong to the vendor runtime. These
//! traits are the narrow slice of it that the scripted routines need.

use core::{fmt::Debug, time::Duration};

/// Something that can pause the current task.
#[allow(async_fn_in_trait)]
pub trait Delay {
    /// Waits for `duration` to elapse, letting other tasks run in the meantime.
    async fn delay(&mut self, duration: Duration);
}

/// A drivetrain that can perform simple relative moves.
#[allow(async_fn_in_trait)]
pub trait Chassis {
    /// The error returned when a move can't be carried out.
    type Error: Debug;

    /// Drives straight by `inches`. Negative distances drive backwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the drive motors can't be commanded.
    async fn move_distance(&mut self, inches: f64) -> Result<(), Self::Error>;

    /// Turns in place by `degrees`. Positive angles turn clockwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the drive motors can't be commanded.
    async fn turn_angle(&mut self, degrees: f64) -> Result<(), Self::Error>;
}

/// The intake rollers.
pub trait Intake {
    /// The error returned when the intake motor can't be reached.
    type Error: Debug;

    /// Drives the intake with a raw voltage. Positive pulls game objects in.
    ///
    /// # Errors
    ///
    /// Returns an error if the motor can't be written.
    fn set_voltage(&mut self, volts: f64) -> Result<(), Self::Error>;

    /// Returns the intake motor temperature in degrees Celsius.
    ///
    /// # Errors
    ///
    /// Returns an error if the motor can't be read.
    fn temperature(&self) -> Result<f64, Self::Error>;
}

/// A single-acting pneumatic piston.
pub trait Piston {
    /// The error returned when the solenoid can't be reached.
    type Error: Debug;

    /// Extends or retracts the piston.
    ///
    /// # Errors
    ///
    /// Returns an error if the solenoid port can't be written.
    fn set_extended(&mut self, extended: bool) -> Result<(), Self::Error>;
}
