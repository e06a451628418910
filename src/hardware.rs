//! vexide devices behind the [`robot_logic`] device traits.

use std::{cell::RefCell, rc::Rc, time::Duration};

use robot_logic::{
    Command, VelocityActuator,
    config::DriveConfig,
    devices::{Chassis, Delay, Intake, Piston},
};
use snafu::{OptionExt, ResultExt, Snafu};
use vexide::{prelude::*, smart::motor::MotorError};
use vexide_devices::PortError;

/// Sleeps on the vexide executor.
#[derive(Debug, Default, Clone, Copy)]
pub struct VexDelay;

impl Delay for VexDelay {
    async fn delay(&mut self, duration: Duration) {
        sleep(duration).await;
    }
}

/// The flywheel motor, shared between the flywheel session and driver control diagnostics.
///
/// Borrows last for a single call and are never held across an await point.
#[derive(Debug, Clone)]
pub struct SharedMotor(Rc<RefCell<Motor>>);

impl SharedMotor {
    pub fn new(motor: Motor) -> Self {
        Self(Rc::new(RefCell::new(motor)))
    }
}

impl VelocityActuator for SharedMotor {
    type Error = MotorError;

    fn velocity(&self) -> Result<f64, MotorError> {
        Ok(f64::from(self.0.borrow().velocity()?))
    }

    fn temperature(&self) -> Result<f64, MotorError> {
        self.0.borrow().temperature()
    }

    fn set_command(&mut self, command: Command) -> Result<(), MotorError> {
        let mut motor = self.0.borrow_mut();
        match command {
            Command::Voltage(volts) => motor.set_voltage(volts),
            Command::Velocity(rpm) => motor.set_velocity(rpm.round() as i32),
        }
    }
}

/// Six-motor tank drivetrain.
///
/// Autonomous moves are timed: both sides run at the configured RPM for as long as the move
/// should take, then stop.
#[derive(Debug)]
pub struct TankDrive {
    left: [Motor; 3],
    right: [Motor; 3],
    config: DriveConfig,
}

impl TankDrive {
    pub const fn new(left: [Motor; 3], right: [Motor; 3], config: DriveConfig) -> Self {
        Self {
            left,
            right,
            config,
        }
    }

    /// Drives each side with a raw voltage. Every motor is written even if one fails.
    pub fn set_voltages(&mut self, left: f64, right: f64) -> Result<(), MotorError> {
        let mut result = Ok(());
        for motor in &mut self.left {
            if let Err(err) = motor.set_voltage(left) {
                result = Err(err);
            }
        }
        for motor in &mut self.right {
            if let Err(err) = motor.set_voltage(right) {
                result = Err(err);
            }
        }
        result
    }

    fn set_velocities(&mut self, left: i32, right: i32) -> Result<(), MotorError> {
        let mut result = Ok(());
        for motor in &mut self.left {
            if let Err(err) = motor.set_velocity(left) {
                result = Err(err);
            }
        }
        for motor in &mut self.right {
            if let Err(err) = motor.set_velocity(right) {
                result = Err(err);
            }
        }
        result
    }

    async fn timed_move(&mut self, left: f64, right: f64) -> Result<(), DriveError> {
        let duration = self
            .config
            .duration_for(left)
            .context(UntimeableSnafu { rotations: left })?;
        let rpm = self.config.auton_rpm.round() as i32;
        let signed = |rotations: f64| if rotations < 0.0 { -rpm } else { rpm };

        let started = self.set_velocities(signed(left), signed(right));
        sleep(duration).await;
        let stopped = self.set_velocities(0, 0);

        started.and(stopped).context(MotorSnafu)
    }
}

/// Errors from an autonomous drivetrain move.
#[derive(Debug, Snafu)]
pub enum DriveError {
    /// The move's length or the configured drive speed can't be turned into a duration.
    #[snafu(display("can't time a move of {rotations} wheel rotations"))]
    Untimeable {
        /// Requested wheel rotations.
        rotations: f64,
    },

    /// A drive motor couldn't be commanded.
    #[snafu(display("{source}"))]
    Motor {
        /// The source of the error.
        source: MotorError,
    },
}

impl Chassis for TankDrive {
    type Error = DriveError;

    async fn move_distance(&mut self, inches: f64) -> Result<(), DriveError> {
        let rotations = self.config.rotations_for_distance(inches);
        self.timed_move(rotations, rotations).await
    }

    async fn turn_angle(&mut self, degrees: f64) -> Result<(), DriveError> {
        let arc = self.config.arc_for_turn(degrees);
        let rotations = self.config.rotations_for_distance(arc);
        self.timed_move(rotations, -rotations).await
    }
}

/// The intake roller motor.
#[derive(Debug)]
pub struct IntakeMotor(Motor);

impl IntakeMotor {
    pub const fn new(motor: Motor) -> Self {
        Self(motor)
    }
}

impl Intake for IntakeMotor {
    type Error = MotorError;

    fn set_voltage(&mut self, volts: f64) -> Result<(), MotorError> {
        self.0.set_voltage(volts)
    }

    fn temperature(&self) -> Result<f64, MotorError> {
        self.0.temperature()
    }
}

/// The solenoid driving the flywheel's angle changer.
#[derive(Debug)]
pub struct AngleChanger(AdiDigitalOut);

impl AngleChanger {
    pub const fn new(solenoid: AdiDigitalOut) -> Self {
        Self(solenoid)
    }
}

impl Piston for AngleChanger {
    type Error = PortError;

    fn set_extended(&mut self, extended: bool) -> Result<(), PortError> {
        if extended {
            self.0.set_high()
        } else {
            self.0.set_low()
        }
    }
}
