//! Driver control mapping.
//!
//! [`DriverControl`] turns one snapshot of the controller (and the intake temperature) into
//! everything the robot should do during that tick. It holds the only state driver control
//! needs across ticks: the current flywheel target and the angle changer position.

use crate::config::DriverConfig;

/// One snapshot of the operator's inputs.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DriverInput {
    /// Left stick vertical axis, from -1.0 to 1.0.
    pub left_y: f64,
    /// Right stick vertical axis, from -1.0 to 1.0.
    pub right_y: f64,
    /// Intake-in button held (R2).
    pub intake_in: bool,
    /// Intake-out button held (R1).
    pub intake_out: bool,
    /// Fast flywheel button held (A).
    pub flywheel_fast: bool,
    /// Slow flywheel button held (B).
    pub flywheel_slow: bool,
    /// Flywheel stop button held (up).
    pub flywheel_stop: bool,
    /// Angle changer button pressed since the last snapshot (Y).
    pub angle_toggle: bool,
    /// Intake motor temperature, if it could be read.
    pub intake_temperature: Option<f64>,
}

/// What the robot should do for one tick of driver control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverOutput {
    /// Voltage for the left side of the drivetrain.
    pub left_voltage: f64,
    /// Voltage for the right side of the drivetrain.
    pub right_voltage: f64,
    /// Voltage for the intake.
    pub intake_voltage: f64,
    /// Target for the flywheel session.
    pub flywheel_target: f64,
    /// New angle changer position, if it changed on this tick.
    pub piston: Option<bool>,
    /// The intake is hotter than the configured limit.
    pub overheated: bool,
}

/// Driver control state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverControl {
    config: DriverConfig,
    flywheel_target: f64,
    angled: bool,
}

impl DriverControl {
    /// Starts driver control with the flywheel stopped and the angle changer retracted.
    #[must_use]
    pub const fn new(config: DriverConfig) -> Self {
        Self {
            config,
            flywheel_target: 0.0,
            angled: false,
        }
    }

    /// Returns the flywheel target chosen so far.
    #[must_use]
    pub const fn flywheel_target(&self) -> f64 {
        self.flywheel_target
    }

    /// Returns `true` if the angle changer is extended.
    #[must_use]
    pub const fn is_angled(&self) -> bool {
        self.angled
    }

    /// Processes one snapshot of inputs.
    ///
    /// The flywheel buttons are checked in priority order (fast, slow, stop) and the chosen
    /// target sticks until another flywheel button is pressed. Intake-in wins over intake-out.
    pub fn update(&mut self, input: &DriverInput) -> DriverOutput {
        let config = &self.config;

        let intake_voltage = if input.intake_in {
            config.intake_voltage
        } else if input.intake_out {
            -config.intake_voltage
        } else {
            0.0
        };

        if input.flywheel_fast {
            self.flywheel_target = config.fast_rpm;
        } else if input.flywheel_slow {
            self.flywheel_target = config.slow_rpm;
        } else if input.flywheel_stop {
            self.flywheel_target = 0.0;
        }

        let piston = if input.angle_toggle {
            self.angled = !self.angled;
            Some(self.angled)
        } else {
            None
        };

        let overheated = input
            .intake_temperature
            .is_some_and(|temperature| temperature > config.overheat_celsius);

        DriverOutput {
            left_voltage: input.left_y.clamp(-1.0, 1.0) * config.drive_voltage,
            right_voltage: input.right_y.clamp(-1.0, 1.0) * config.drive_voltage,
            intake_voltage,
            flywheel_target: self.flywheel_target,
            piston,
            overheated,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn control() -> DriverControl {
        DriverControl::new(DriverConfig::DEFAULT)
    }

    #[test]
    fn tank_drive_scales_sticks() {
        let output = control().update(&DriverInput {
            left_y: 0.5,
            right_y: -1.5,
            ..Default::default()
        });

        assert_eq!(output.left_voltage, 6.0);
        assert_eq!(output.right_voltage, -12.0);
    }

    #[test]
    fn intake_in_wins_over_out() {
        let mut control = control();

        let both = control.update(&DriverInput {
            intake_in: true,
            intake_out: true,
            ..Default::default()
        });
        assert_eq!(both.intake_voltage, 12.0);

        let out = control.update(&DriverInput {
            intake_out: true,
            ..Default::default()
        });
        assert_eq!(out.intake_voltage, -12.0);

        let idle = control.update(&DriverInput::default());
        assert_eq!(idle.intake_voltage, 0.0);
    }

    #[test]
    fn flywheel_target_latches() {
        let mut control = control();

        let output = control.update(&DriverInput {
            flywheel_slow: true,
            ..Default::default()
        });
        assert_eq!(output.flywheel_target, 2500.0 / 6.0);

        let output = control.update(&DriverInput::default());
        assert_eq!(output.flywheel_target, 2500.0 / 6.0);

        let output = control.update(&DriverInput {
            flywheel_fast: true,
            flywheel_stop: true,
            ..Default::default()
        });
        assert_eq!(output.flywheel_target, 600.0);

        let output = control.update(&DriverInput {
            flywheel_stop: true,
            ..Default::default()
        });
        assert_eq!(output.flywheel_target, 0.0);
    }

    #[test]
    fn angle_changer_toggles_on_press() {
        let mut control = control();
        let press = DriverInput {
            angle_toggle: true,
            ..Default::default()
        };

        assert_eq!(control.update(&press).piston, Some(true));
        assert_eq!(control.update(&DriverInput::default()).piston, None);
        assert_eq!(control.update(&press).piston, Some(false));
        assert!(!control.is_angled());
    }

    #[test]
    fn overheat_above_limit() {
        let mut control = control();
        let at = |temperature| DriverInput {
            intake_temperature: Some(temperature),
            ..Default::default()
        };

        assert!(!control.update(&at(70.0)).overheated);
        assert!(control.update(&at(70.5)).overheated);
        assert!(!control.update(&DriverInput::default()).overheated);
    }
}
