//! The flywheel actuator and the commands it accepts.

use core::fmt::Debug;

/// A request sent to an actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Drive the motor with a raw voltage, in volts.
    Voltage(f64),

    /// Hold a velocity with the motor's own velocity loop, in RPM.
    Velocity(f64),
}

/// Which kind of [`Command`] the controller output is turned into.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CommandMode {
    /// Controller output is converted to a [`Command::Voltage`].
    Voltage,

    /// Controller output is converted to a [`Command::Velocity`].
    Velocity,
}

/// Converts controller output (in flywheel RPM) to an actuator command.
///
/// The output is divided by `divisor` and then clamped to `±max`. For a voltage-driven blue
/// cartridge motor, 600 RPM corresponds to 12 volts, so the divisor is 50.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputMapping {
    /// The kind of command produced.
    pub mode: CommandMode,
    /// Controller units per command unit.
    pub divisor: f64,
    /// Largest magnitude the command may have.
    pub max: f64,
}

impl OutputMapping {
    /// Velocity commands straight to a 600 RPM cartridge.
    pub const BLUE_VELOCITY: Self = Self {
        mode: CommandMode::Velocity,
        divisor: 1.0,
        max: 600.0,
    };

    /// Voltage commands for a 600 RPM cartridge.
    pub const BLUE_VOLTAGE: Self = Self {
        mode: CommandMode::Voltage,
        divisor: 50.0,
        max: 12.0,
    };

    /// Returns `true` if this mapping can turn every finite output into a finite command.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.divisor.is_finite() && self.divisor != 0.0 && self.max.is_finite() && self.max >= 0.0
    }

    /// Converts one controller output to a command.
    #[must_use]
    pub fn map(&self, output: f64) -> Command {
        let value = (output / self.divisor).clamp(-self.max, self.max);
        match self.mode {
            CommandMode::Voltage => Command::Voltage(value),
            CommandMode::Velocity => Command::Velocity(value),
        }
    }
}

/// A motor whose velocity is being regulated.
///
/// Hardware errors are reported but never treated as fatal by the polling loop.
pub trait VelocityActuator {
    /// The error returned when the device can't be reached.
    type Error: Debug;

    /// Returns the measured velocity in RPM.
    ///
    /// # Errors
    ///
    /// Returns an error if the device can't be read.
    fn velocity(&self) -> Result<f64, Self::Error>;

    /// Returns the motor temperature in degrees Celsius.
    ///
    /// # Errors
    ///
    /// Returns an error if the device can't be read.
    fn temperature(&self) -> Result<f64, Self::Error>;

    /// Sends a command to the motor.
    ///
    /// # Errors
    ///
    /// Returns an error if the device can't be written.
    fn set_command(&mut self, command: Command) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn voltage_mapping_scales_and_clamps() {
        let mapping = OutputMapping::BLUE_VOLTAGE;
        assert_eq!(mapping.map(300.0), Command::Voltage(6.0));
        assert_eq!(mapping.map(900.0), Command::Voltage(12.0));
        assert_eq!(mapping.map(-900.0), Command::Voltage(-12.0));
    }

    #[test]
    fn velocity_mapping_passes_through() {
        assert_eq!(
            OutputMapping::BLUE_VELOCITY.map(416.0),
            Command::Velocity(416.0)
        );
    }

    #[test]
    fn zero_divisor_is_invalid() {
        let mapping = OutputMapping {
            divisor: 0.0,
            ..OutputMapping::BLUE_VOLTAGE
        };
        assert!(!mapping.is_valid());
        assert!(OutputMapping::BLUE_VOLTAGE.is_valid());
    }
}
