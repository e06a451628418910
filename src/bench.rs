//! Bench simulator for tuning the flywheel controller away from the robot.
//!
//! A flywheel session runs against [`SimulatedFlywheel`] exactly as it would against the real
//! motor, paced by a virtual clock instead of the vexide executor.

use std::{cell::RefCell, convert::Infallible, rc::Rc, time::Duration};

use clap::{Parser, ValueEnum};
use flywheel_control::{ConfigError, ControllerConfig, VelocityController};
use futures::executor::block_on;
use robot_logic::{
    Command, FlywheelHandle, FlywheelTask, OutputMapping, SessionError, SessionReport,
    SimulatedFlywheel, VelocityActuator, devices::Delay,
};
use snafu::Snafu;

/// Controller preset to simulate.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum Preset {
    /// Proportional only, as used during driver control.
    Proportional,
    /// Proportional-integral with the integral reset once it exceeds the target.
    Integrating,
    /// Gain-scheduled PID, as used during autonomous.
    Scheduled,
}

impl Preset {
    const fn config(self) -> ControllerConfig {
        match self {
            Self::Proportional => ControllerConfig::PROPORTIONAL,
            Self::Integrating => ControllerConfig::INTEGRATING,
            Self::Scheduled => ControllerConfig::SCHEDULED,
        }
    }
}

/// How controller output is sent to the motor.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum Mapping {
    /// Velocity setpoints, scaled for a 600 RPM cartridge.
    Velocity,
    /// Raw voltage.
    Voltage,
}

impl Mapping {
    const fn output(self) -> OutputMapping {
        match self {
            Self::Velocity => OutputMapping::BLUE_VELOCITY,
            Self::Voltage => OutputMapping::BLUE_VOLTAGE,
        }
    }
}

/// Run a flywheel session against a simulated wheel.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Target velocity in RPM.
    #[arg(short, long, default_value_t = 600.0)]
    pub target: f64,

    /// Number of control ticks to simulate.
    #[arg(short = 'n', long, default_value_t = 1500)]
    pub ticks: u32,

    /// Controller preset.
    #[arg(short, long, value_enum, default_value_t = Preset::Scheduled)]
    pub preset: Preset,

    /// Command type sent to the motor.
    #[arg(short, long, value_enum, default_value_t = Mapping::Velocity)]
    pub mapping: Mapping,

    /// Launch a game object every this many ticks. Zero never launches.
    #[arg(short, long, default_value_t = 0)]
    pub launch_every: u32,

    /// Fraction of the wheel's speed each launch takes away.
    #[arg(long, default_value_t = 0.3)]
    pub launch_loss: f64,

    /// Print the wheel's velocity every this many ticks. Zero prints nothing.
    #[arg(long, default_value_t = 0)]
    pub print_every: u32,
}

/// Errors that can stop a bench run before it starts.
#[derive(Debug, Snafu)]
pub enum BenchError {
    /// The controller configuration was rejected.
    #[snafu(display("{source}"), context(false))]
    Config {
        /// The source of the error.
        source: ConfigError,
    },

    /// The session couldn't be created.
    #[snafu(display("{source}"), context(false))]
    Session {
        /// The source of the error.
        source: SessionError,
    },
}

/// The outcome of a bench run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Counters from the session.
    pub report: SessionReport,
    /// Wheel velocity when the session ended.
    pub velocity: f64,
}

/// The simulated wheel, shared between the session and the clock that disturbs it.
#[derive(Debug, Clone)]
struct BenchWheel(Rc<RefCell<SimulatedFlywheel>>);

impl VelocityActuator for BenchWheel {
    type Error = Infallible;

    fn velocity(&self) -> Result<f64, Infallible> {
        self.0.borrow().velocity()
    }

    fn temperature(&self) -> Result<f64, Infallible> {
        self.0.borrow().temperature()
    }

    fn set_command(&mut self, command: Command) -> Result<(), Infallible> {
        self.0.borrow_mut().set_command(command)
    }
}

/// Counts ticks, applies launches and ends the session after the requested number of ticks.
struct BenchClock {
    wheel: Rc<RefCell<SimulatedFlywheel>>,
    handle: FlywheelHandle,
    elapsed: Duration,
    tick: u32,
    ticks: u32,
    launch_every: u32,
    launch_loss: f64,
    print_every: u32,
}

impl Delay for BenchClock {
    async fn delay(&mut self, duration: Duration) {
        self.tick += 1;
        self.elapsed += duration;

        let mut wheel = self.wheel.borrow_mut();
        if self.print_every != 0 && self.tick % self.print_every == 0 {
            println!(
                "{:>8.2}s {:>8.1} RPM",
                self.elapsed.as_secs_f64(),
                wheel.current_velocity()
            );
        }
        if self.launch_every != 0 && self.tick % self.launch_every == 0 {
            wheel.launch(self.launch_loss);
            log::debug!("launch at tick {}", self.tick);
        }

        if self.tick >= self.ticks {
            self.handle.finish();
        }
    }
}

/// Simulates one session as described by `args`.
///
/// # Errors
///
/// Returns an error if the chosen preset or mapping is unusable.
pub fn run(args: &Args) -> Result<Summary, BenchError> {
    let config = args.preset.config();
    let controller = VelocityController::new(config)?;

    let wheel = Rc::new(RefCell::new(SimulatedFlywheel::new(600.0, 0.25, config.dt())));
    let handle = FlywheelHandle::new();
    handle.set_target(args.target);

    let clock = BenchClock {
        wheel: wheel.clone(),
        handle: handle.clone(),
        elapsed: Duration::ZERO,
        tick: 0,
        ticks: args.ticks,
        launch_every: args.launch_every,
        launch_loss: args.launch_loss,
        print_every: args.print_every,
    };
    let mut task = FlywheelTask::new(
        BenchWheel(wheel.clone()),
        clock,
        controller,
        args.mapping.output(),
        handle,
    )?;

    if args.ticks == 0 {
        task.handle().finish();
    }
    let report = block_on(task.run());
    let velocity = wheel.borrow().current_velocity();

    Ok(Summary { report, velocity })
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let argv: Vec<&str> = std::iter::once("flywheel-bot")
            .chain(extra.iter().copied())
            .collect();
        Args::try_parse_from(argv).unwrap()
    }

    fn off_by(summary: &Summary, target: f64) -> f64 {
        (target - summary.velocity).abs()
    }

    #[test]
    fn defaults() {
        let args = args(&[]);
        assert_eq!(args.target, 600.0);
        assert_eq!(args.preset, Preset::Scheduled);
        assert_eq!(args.mapping, Mapping::Velocity);
        assert_eq!(args.launch_every, 0);
    }

    #[test]
    fn scheduled_settles() {
        let summary = run(&args(&["--ticks", "3000"])).unwrap();

        assert_eq!(summary.report.ticks, 3000);
        assert_eq!(summary.report.commands, 3000);
        assert!(off_by(&summary, 600.0) < 5.0, "{summary:?}");
    }

    #[test]
    fn launch_on_final_tick_shows() {
        let summary = run(&args(&[
            "--ticks",
            "3000",
            "--launch-every",
            "1000",
            "--launch-loss",
            "0.2",
        ]))
        .unwrap();

        // The last launch lands on the final tick.
        assert!(summary.velocity < 600.0 * 0.85, "{summary:?}");
        assert_eq!(summary.report.actuator_faults, 0);
    }

    #[test]
    fn zero_ticks_never_commands() {
        let summary = run(&args(&["--ticks", "0"])).unwrap();
        assert_eq!(summary.report.ticks, 0);
        assert_eq!(summary.velocity, 0.0);
    }

    #[test]
    fn stopped_target_coasts() {
        let summary = run(&args(&["--target", "0", "--ticks", "10"])).unwrap();

        assert_eq!(summary.report.ticks, 10);
        assert_eq!(summary.report.commands, 1);
        assert_eq!(summary.velocity, 0.0);
    }
}
