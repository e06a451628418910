//! A simulated flywheel for tests and bench runs.
//!
//! The wheel is modelled as a first-order system: every command moves its velocity a fraction
//! of the way towards the speed that command would eventually settle at. Launching a game
//! object knocks a fraction of the speed off, which is the disturbance the controller exists to
//! reject.

use core::convert::Infallible;

use crate::actuator::{Command, VelocityActuator};

const AMBIENT_CELSIUS: f64 = 25.0;

/// A first-order flywheel model.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedFlywheel {
    velocity: f64,
    temperature: f64,
    drive: Command,
    free_speed: f64,
    time_constant: f64,
    step: f64,
    commands: u64,
}

impl SimulatedFlywheel {
    /// Creates a stationary flywheel.
    ///
    /// - `free_speed` is the velocity reached at 12 volts, in RPM.
    /// - `time_constant` is how long the wheel takes to cover ~63% of a speed change, in seconds.
    /// - `step` is how much simulated time passes with each command, in seconds.
    #[must_use]
    pub const fn new(free_speed: f64, time_constant: f64, step: f64) -> Self {
        Self {
            velocity: 0.0,
            temperature: AMBIENT_CELSIUS,
            drive: Command::Voltage(0.0),
            free_speed,
            time_constant,
            step,
            commands: 0,
        }
    }

    /// A flywheel on a 600 RPM cartridge, stepped every 10ms.
    #[must_use]
    pub const fn blue() -> Self {
        Self::new(600.0, 0.25, 0.01)
    }

    /// Returns the current velocity in RPM.
    #[must_use]
    pub const fn current_velocity(&self) -> f64 {
        self.velocity
    }

    /// Returns the last command received.
    #[must_use]
    pub const fn drive(&self) -> Command {
        self.drive
    }

    /// Returns the number of commands received.
    #[must_use]
    pub const fn commands(&self) -> u64 {
        self.commands
    }

    /// Launches a game object, removing `fraction` of the wheel's speed.
    pub fn launch(&mut self, fraction: f64) {
        self.velocity *= 1.0 - fraction.clamp(0.0, 1.0);
    }

    /// Lets `seconds` of simulated time pass under the current command.
    pub fn advance(&mut self, seconds: f64) {
        let settle = match self.drive {
            Command::Voltage(volts) => self.free_speed * volts.clamp(-12.0, 12.0) / 12.0,
            Command::Velocity(rpm) => rpm.clamp(-self.free_speed, self.free_speed),
        };
        let alpha = (seconds / self.time_constant).min(1.0);
        self.velocity += (settle - self.velocity) * alpha;

        let load = settle.abs() / self.free_speed;
        let heat = AMBIENT_CELSIUS + 30.0 * load;
        self.temperature += (heat - self.temperature) * (seconds / 120.0).min(1.0);
    }
}

impl VelocityActuator for SimulatedFlywheel {
    type Error = Infallible;

    fn velocity(&self) -> Result<f64, Self::Error> {
        Ok(self.velocity)
    }

    fn temperature(&self) -> Result<f64, Self::Error> {
        Ok(self.temperature)
    }

    fn set_command(&mut self, command: Command) -> Result<(), Self::Error> {
        self.drive = command;
        self.commands += 1;
        self.advance(self.step);
        Ok(())
    }
}
