//! The competition robot.

use flywheel_control::{ControllerConfig, VelocityController};
use robot_logic::{
    DriverControl, DriverInput, FlywheelHandle, FlywheelTask, RobotConfig, RobotConfigError,
    RoutineRunner, SessionReport, VelocityActuator,
    config::{Cartridge, MotorPort},
    devices::{Intake, Piston},
};
use snafu::{OptionExt, Snafu};
use vexide::{peripherals::DynamicPeripherals, prelude::*, smart::motor::BrakeMode, task::Task};

use crate::hardware::{AngleChanger, IntakeMotor, SharedMotor, TankDrive, VexDelay};

/// Errors that can occur while claiming the robot's devices.
#[derive(Debug, Snafu)]
pub enum RobotError {
    /// A smart port is out of range or was assigned to more than one device.
    #[snafu(display("smart port {port} is unavailable"))]
    SmartPortUnavailable {
        /// The port number.
        port: u8,
    },

    /// An ADI port is out of range or was assigned to more than one device.
    #[snafu(display("ADI port '{port}' is unavailable"))]
    AdiPortUnavailable {
        /// The port letter.
        port: char,
    },

    /// The primary controller was already taken.
    ControllerUnavailable,

    /// The robot description itself is unusable.
    #[snafu(display("{source}"), context(false))]
    Config {
        /// The source of the error.
        source: RobotConfigError,
    },
}

fn motor(peripherals: &mut DynamicPeripherals, config: MotorPort) -> Result<Motor, RobotError> {
    let port = (1..=21)
        .contains(&config.port)
        .then(|| peripherals.take_smart_port(config.port))
        .flatten()
        .context(SmartPortUnavailableSnafu { port: config.port })?;
    let direction = if config.reversed {
        Direction::Reverse
    } else {
        Direction::Forward
    };

    let gearset = match config.cartridge {
        Cartridge::Red => Gearset::Red,
        Cartridge::Green => Gearset::Green,
        Cartridge::Blue => Gearset::Blue,
    };

    Ok(Motor::new(port, gearset, direction))
}

fn motors(
    peripherals: &mut DynamicPeripherals,
    [a, b, c]: [MotorPort; 3],
) -> Result<[Motor; 3], RobotError> {
    Ok([
        motor(peripherals, a)?,
        motor(peripherals, b)?,
        motor(peripherals, c)?,
    ])
}

fn adi_number(letter: char) -> Option<u8> {
    match letter.to_ascii_lowercase() {
        letter @ 'a'..='h' => Some(letter as u8 - b'a' + 1),
        _ => None,
    }
}

/// Flywheel launcher robot with a tank drivetrain, an intake and a pneumatic angle changer.
#[derive(Debug)]
pub struct Robot {
    controller: Controller,
    drive: TankDrive,
    intake: IntakeMotor,
    flywheel: SharedMotor,
    angle_changer: AngleChanger,
    config: RobotConfig,
}

impl Robot {
    /// Claims every device `config` names.
    ///
    /// The intake is left holding its position and the flywheel coasting.
    pub fn new(peripherals: Peripherals, config: RobotConfig) -> Result<Self, RobotError> {
        config.validate()?;
        let mut peripherals = DynamicPeripherals::new(peripherals);

        let controller = peripherals
            .take_primary_controller()
            .context(ControllerUnavailableSnafu)?;
        let left = motors(&mut peripherals, config.drive.left)?;
        let right = motors(&mut peripherals, config.drive.right)?;

        let mut intake = motor(&mut peripherals, config.intake)?;
        if let Err(err) = intake.brake(BrakeMode::Hold) {
            log::warn!("couldn't set intake brake mode: {err}");
        }

        let mut flywheel = motor(&mut peripherals, config.flywheel)?;
        if let Err(err) = flywheel.brake(BrakeMode::Coast) {
            log::warn!("couldn't set flywheel brake mode: {err}");
        }

        let solenoid = adi_number(config.angle_changer)
            .and_then(|number| peripherals.take_adi_port(number))
            .context(AdiPortUnavailableSnafu {
                port: config.angle_changer,
            })?;

        Ok(Self {
            controller,
            drive: TankDrive::new(left, right, config.drive),
            intake: IntakeMotor::new(intake),
            flywheel: SharedMotor::new(flywheel),
            angle_changer: AngleChanger::new(AdiDigitalOut::new(solenoid)),
            config,
        })
    }

    /// Spawns a flywheel session answering to `handle`.
    fn start_flywheel(
        &self,
        config: ControllerConfig,
        handle: &FlywheelHandle,
    ) -> Option<Task<SessionReport>> {
        let controller = VelocityController::new(config)
            .inspect_err(|err| log::error!("flywheel controller rejected: {err}"))
            .ok()?;
        let mut task = FlywheelTask::new(
            self.flywheel.clone(),
            VexDelay,
            controller,
            self.config.flywheel_control.mapping,
            handle.clone(),
        )
        .inspect_err(|err| log::error!("flywheel session rejected: {err}"))
        .ok()?;

        Some(spawn(async move { task.run().await }))
    }

    fn log_status(&self, handle: &FlywheelHandle, intake_temperature: Option<f64>) {
        match self.flywheel.velocity() {
            Ok(velocity) => log::info!(
                "flywheel {velocity:.0}/{:.0} RPM, intake {intake_temperature:?} C",
                handle.target()
            ),
            Err(err) => log::info!(
                "flywheel unreadable ({err}), target {:.0} RPM, intake {intake_temperature:?} C",
                handle.target()
            ),
        }
    }
}

impl Compete for Robot {
    async fn connected(&mut self) {
        log::info!("competition connected");
    }

    async fn disconnected(&mut self) {
        log::info!("competition disconnected");
    }

    async fn disabled(&mut self) {
        log::info!("disabled");
    }

    async fn autonomous(&mut self) {
        let handle = FlywheelHandle::new();
        let guard = handle.guard();
        let session = self.start_flywheel(self.config.flywheel_control.autonomous, &handle);

        let routine = self.config.autonomous.routine();
        let mut delay = VexDelay;
        let report = RoutineRunner::new(
            &mut self.drive,
            &mut self.intake,
            &mut self.angle_changer,
            &mut delay,
        )
        .run(&routine, guard.handle())
        .await;
        log::info!("autonomous \"{}\" finished: {report:?}", routine.name());

        if let Some(session) = session {
            log::info!("autonomous flywheel session: {:?}", session.await);
        }
    }

    async fn driver(&mut self) {
        let handle = FlywheelHandle::new();
        let _guard = handle.guard();
        let _session = self.start_flywheel(self.config.flywheel_control.driver, &handle);

        let mut control = DriverControl::new(self.config.driver);
        let status_every = (self.config.status_interval.as_millis()
            / Controller::UPDATE_INTERVAL.as_millis())
        .max(1) as u32;
        let mut overheated = false;
        let mut tick: u32 = 0;

        loop {
            let state = self.controller.state().unwrap_or_default();
            let input = DriverInput {
                left_y: state.left_stick.y(),
                right_y: state.right_stick.y(),
                intake_in: state.back_right_trigger.is_pressed(),
                intake_out: state.front_right_trigger.is_pressed(),
                flywheel_fast: state.button_a.is_pressed(),
                flywheel_slow: state.button_b.is_pressed(),
                flywheel_stop: state.button_up.is_pressed(),
                angle_toggle: state.button_y.is_now_pressed(),
                intake_temperature: self.intake.temperature().ok(),
            };
            let output = control.update(&input);

            self.drive
                .set_voltages(output.left_voltage, output.right_voltage)
                .ok();
            self.intake.set_voltage(output.intake_voltage).ok();
            handle.set_target(output.flywheel_target);

            if let Some(extended) = output.piston {
                if let Err(err) = self.angle_changer.set_extended(extended) {
                    log::warn!("couldn't move the angle changer: {err}");
                }
            }

            if output.overheated && !overheated {
                log::warn!("intake is overheating: {:?} C", input.intake_temperature);
            }
            overheated = output.overheated;

            if tick % status_every == 0 {
                self.log_status(&handle, input.intake_temperature);
            }
            tick = tick.wrapping_add(1);

            sleep(Controller::UPDATE_INTERVAL).await;
        }
    }
}

