//! Robot layout and tuning.

use core::{f64::consts::PI, time::Duration};

use flywheel_control::{ConfigError, ControllerConfig};
use snafu::{ResultExt, Snafu, ensure};

use crate::{actuator::OutputMapping, routine::Routine};

/// Gear cartridge fitted to a smart motor.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Cartridge {
    /// 36:1, 100 RPM.
    Red,
    /// 18:1, 200 RPM.
    Green,
    /// 6:1, 600 RPM.
    Blue,
}

impl Cartridge {
    /// Free speed of the motor's output shaft in RPM.
    #[must_use]
    pub const fn max_rpm(self) -> f64 {
        match self {
            Self::Red => 100.0,
            Self::Green => 200.0,
            Self::Blue => 600.0,
        }
    }
}

/// A smart port number, the cartridge of the motor on it, and whether that motor spins reversed.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MotorPort {
    /// Smart port number, 1 through 21.
    pub port: u8,
    /// Gear cartridge.
    pub cartridge: Cartridge,
    /// Whether the motor is mounted backwards.
    pub reversed: bool,
}

impl MotorPort {
    /// A motor spinning forwards on `port`.
    #[must_use]
    pub const fn forward(port: u8, cartridge: Cartridge) -> Self {
        Self {
            port,
            cartridge,
            reversed: false,
        }
    }

    /// A motor spinning backwards on `port`.
    #[must_use]
    pub const fn reversed(port: u8, cartridge: Cartridge) -> Self {
        Self {
            port,
            cartridge,
            reversed: true,
        }
    }
}

/// Drivetrain layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveConfig {
    /// Left side motors.
    pub left: [MotorPort; 3],
    /// Right side motors.
    pub right: [MotorPort; 3],
    /// Wheel diameter in inches.
    pub wheel_diameter: f64,
    /// Distance between the left and right wheels in inches.
    pub track_width: f64,
    /// Wheel speed used for autonomous moves, in RPM.
    pub auton_rpm: f64,
}

impl DriveConfig {
    /// Wheel rotations needed to travel `inches`.
    #[must_use]
    pub fn rotations_for_distance(&self, inches: f64) -> f64 {
        inches / (PI * self.wheel_diameter)
    }

    /// Distance each side of the drivetrain travels (in opposite directions) to turn in place by
    /// `degrees`.
    #[must_use]
    pub fn arc_for_turn(&self, degrees: f64) -> f64 {
        PI * self.track_width * degrees / 360.0
    }

    /// How long a move of `rotations` wheel rotations takes at [`auton_rpm`](Self::auton_rpm).
    ///
    /// Returns `None` if the move can't be timed: a non-finite distance, a non-positive speed or
    /// a duration too long to represent.
    #[must_use]
    pub fn duration_for(&self, rotations: f64) -> Option<Duration> {
        if self.auton_rpm.is_nan() || self.auton_rpm <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(rotations.abs() * 60.0 / self.auton_rpm).ok()
    }
}

/// Driver control tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverConfig {
    /// Flywheel target for the fast button, in RPM.
    pub fast_rpm: f64,
    /// Flywheel target for the slow button, in RPM.
    pub slow_rpm: f64,
    /// Intake voltage magnitude.
    pub intake_voltage: f64,
    /// Drive voltage at full stick.
    pub drive_voltage: f64,
    /// Intake temperature above which the driver is warned, in degrees Celsius.
    pub overheat_celsius: f64,
}

impl DriverConfig {
    /// Full speed at 600 RPM and a 2500 RPM wheel speed through the 6:1 ratio.
    pub const DEFAULT: Self = Self {
        fast_rpm: 600.0,
        slow_rpm: 2500.0 / 6.0,
        intake_voltage: 12.0,
        drive_voltage: 12.0,
        overheat_celsius: 70.0,
    };
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Flywheel session tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlywheelConfig {
    /// Controller used during autonomous.
    pub autonomous: ControllerConfig,
    /// Controller used during driver control.
    pub driver: ControllerConfig,
    /// How controller output becomes a motor command.
    pub mapping: OutputMapping,
}

/// The routine run during the autonomous period.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum AutonomousRoutine {
    /// [`Routine::square`].
    #[default]
    Square,
    /// [`Routine::shoot_preloads`].
    ShootPreloads,
}

impl AutonomousRoutine {
    /// Builds the routine.
    #[must_use]
    pub fn routine(self) -> Routine {
        match self {
            Self::Square => Routine::square(),
            Self::ShootPreloads => Routine::shoot_preloads(),
        }
    }
}

/// Problems [`RobotConfig::validate`] can find.
#[derive(Debug, Snafu)]
pub enum RobotConfigError {
    /// One of the flywheel controllers is unusable.
    #[snafu(display("{phase} flywheel controller: {source}"))]
    Controller {
        /// Which competition phase the controller belongs to.
        phase: &'static str,
        /// The source of the error.
        source: ConfigError,
    },

    /// The flywheel output mapping can't produce finite commands.
    InvalidMapping,

    /// Autonomous moves need a positive, finite drive speed.
    #[snafu(display("invalid autonomous drive speed {rpm} RPM"))]
    InvalidDriveSpeed {
        /// The configured speed.
        rpm: f64,
    },

    /// Wheel diameter and track width must be positive and finite.
    #[snafu(display("invalid drive geometry: wheel {wheel_diameter} in, track {track_width} in"))]
    InvalidGeometry {
        /// The configured wheel diameter.
        wheel_diameter: f64,
        /// The configured track width.
        track_width: f64,
    },
}

/// Complete robot description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotConfig {
    /// Drivetrain.
    pub drive: DriveConfig,
    /// Intake motor.
    pub intake: MotorPort,
    /// Flywheel motor.
    pub flywheel: MotorPort,
    /// ADI port letter of the angle changer solenoid.
    pub angle_changer: char,
    /// Driver control tuning.
    pub driver: DriverConfig,
    /// Flywheel session tuning.
    pub flywheel_control: FlywheelConfig,
    /// How often driver control logs its status line.
    pub status_interval: Duration,
    /// Routine run during the autonomous period.
    pub autonomous: AutonomousRoutine,
}

impl RobotConfig {
    /// The competition robot.
    pub const DEFAULT: Self = Self {
        drive: DriveConfig {
            left: [
                MotorPort::reversed(12, Cartridge::Green),
                MotorPort::reversed(14, Cartridge::Green),
                MotorPort::forward(8, Cartridge::Green),
            ],
            right: [
                MotorPort::forward(13, Cartridge::Green),
                MotorPort::forward(15, Cartridge::Green),
                MotorPort::reversed(18, Cartridge::Green),
            ],
            wheel_diameter: 3.25,
            track_width: 11.5,
            auton_rpm: 100.0,
        },
        intake: MotorPort::forward(7, Cartridge::Blue),
        flywheel: MotorPort::forward(19, Cartridge::Blue),
        angle_changer: 'h',
        driver: DriverConfig::DEFAULT,
        flywheel_control: FlywheelConfig {
            autonomous: ControllerConfig::SCHEDULED,
            driver: ControllerConfig::PROPORTIONAL,
            mapping: OutputMapping::BLUE_VELOCITY,
        },
        status_interval: Duration::from_secs(1),
        autonomous: AutonomousRoutine::Square,
    };

    /// Checks that every part of the robot can be driven as described.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), RobotConfigError> {
        let control = &self.flywheel_control;
        control.autonomous.validate().context(ControllerSnafu {
            phase: "autonomous",
        })?;
        control
            .driver
            .validate()
            .context(ControllerSnafu { phase: "driver" })?;
        ensure!(control.mapping.is_valid(), InvalidMappingSnafu);

        let drive = &self.drive;
        ensure!(
            drive.auton_rpm.is_finite() && drive.auton_rpm > 0.0,
            InvalidDriveSpeedSnafu {
                rpm: drive.auton_rpm
            }
        );
        ensure!(
            drive.wheel_diameter.is_finite()
                && drive.wheel_diameter > 0.0
                && drive.track_width.is_finite()
                && drive.track_width > 0.0,
            InvalidGeometrySnafu {
                wheel_diameter: drive.wheel_diameter,
                track_width: drive.track_width,
            }
        );

        Ok(())
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
