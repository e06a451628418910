//! The flywheel polling loop.
//!
//! A [`FlywheelTask`] owns the flywheel actuator and a [`VelocityController`] for the length of
//! one session. Every period it samples the wheel, runs the controller against the target in
//! the session's [`FlywheelHandle`] and writes the result back out. The loop ends when the
//! handle is finished.

use flywheel_control::VelocityController;
use snafu::{Snafu, ensure};

use crate::{
    actuator::{Command, OutputMapping, VelocityActuator},
    devices::Delay,
    handle::FlywheelHandle,
};

/// Counters collected over one session.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct SessionReport {
    /// Number of loop iterations.
    pub ticks: u64,
    /// Number of commands the actuator accepted.
    pub commands: u64,
    /// Number of samples the controller refused (NaN or infinite readings).
    pub rejected_samples: u64,
    /// Number of failed reads or writes.
    pub actuator_faults: u64,
}

/// A background task regulating the flywheel.
#[derive(Debug)]
pub struct FlywheelTask<A, D> {
    actuator: A,
    delay: D,
    controller: VelocityController,
    mapping: OutputMapping,
    handle: FlywheelHandle,
    coasting: bool,
}

impl<A: VelocityActuator, D: Delay> FlywheelTask<A, D> {
    /// Creates a task for the session behind `handle`.
    ///
    /// The controller is reset so that nothing from a previous session leaks into this one.
    ///
    /// # Errors
    ///
    /// A [`SessionError::InvalidMapping`] error is returned if `mapping` can't produce finite
    /// commands.
    pub fn new(
        actuator: A,
        delay: D,
        mut controller: VelocityController,
        mapping: OutputMapping,
        handle: FlywheelHandle,
    ) -> Result<Self, SessionError> {
        ensure!(mapping.is_valid(), InvalidMappingSnafu { mapping });
        controller.reset();

        Ok(Self {
            actuator,
            delay,
            controller,
            mapping,
            handle,
            coasting: false,
        })
    }

    /// Returns the handle this task answers to.
    #[must_use]
    pub const fn handle(&self) -> &FlywheelHandle {
        &self.handle
    }

    /// Returns the controller and its current state.
    #[must_use]
    pub const fn controller(&self) -> &VelocityController {
        &self.controller
    }

    /// Returns the actuator.
    #[must_use]
    pub const fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Runs the loop until the session is finished.
    ///
    /// The completion flag is checked before every tick, so no command is issued once the owning
    /// flow has finished the session. The controller is reset on the way out.
    pub async fn run(&mut self) -> SessionReport {
        let period = self.controller.config().period;
        let mut report = SessionReport::default();

        log::debug!("flywheel session started ({}ms period)", period.as_millis());

        while !self.handle.is_finished() {
            self.tick(&mut report);
            report.ticks += 1;
            self.delay.delay(period).await;
        }

        self.controller.reset();
        log::debug!("flywheel session finished: {report:?}");

        report
    }

    /// Runs a single iteration of the loop without waiting.
    ///
    /// A zero target lets the wheel coast: one zero-voltage command is sent when the target
    /// drops to zero, and nothing after that until a new target arrives.
    #[allow(clippy::float_cmp)]
    pub fn tick(&mut self, report: &mut SessionReport) {
        let target = self.handle.target();

        if target == 0.0 {
            if !self.coasting {
                self.coasting = true;
                self.controller.reset();
                self.write(Command::Voltage(0.0), report);
            }
            return;
        }
        self.coasting = false;

        let measured = match self.actuator.velocity() {
            Ok(velocity) => velocity,
            Err(err) => {
                log::warn!("could not read flywheel velocity: {err:?}");
                report.actuator_faults += 1;
                return;
            }
        };

        match self.controller.update(measured, target) {
            Ok(output) => {
                let command = self.mapping.map(output.command);
                self.write(command, report);
            }
            Err(err) => {
                log::warn!("skipping flywheel update: {err}");
                report.rejected_samples += 1;
            }
        }
    }

    fn write(&mut self, command: Command, report: &mut SessionReport) {
        match self.actuator.set_command(command) {
            Ok(()) => report.commands += 1,
            Err(err) => {
                log::warn!("could not command flywheel: {err:?}");
                report.actuator_faults += 1;
            }
        }
    }

    /// Takes the task apart, returning the actuator and the delay.
    pub fn into_parts(self) -> (A, D) {
        (self.actuator, self.delay)
    }
}

#[derive(Debug, Snafu)]
/// Errors that can occur when setting up a flywheel session.
pub enum SessionError {
    /// The output mapping has a zero or non-finite divisor, or a negative or non-finite limit.
    #[snafu(display("output mapping {mapping:?} cannot produce finite commands"))]
    InvalidMapping {
        /// The offending mapping.
        mapping: OutputMapping,
    },
}
