//! Competition program for the flywheel robot.
//!
//! On the V5 Brain this wires vexide's devices into [`robot_logic`] and competes. Built for any
//! other target it becomes a bench simulator for tuning the flywheel controller against a
//! simulated wheel.

mod logger;

#[cfg(target_os = "vexos")]
mod hardware;
#[cfg(target_os = "vexos")]
mod robot;

#[cfg(not(target_os = "vexos"))]
mod bench;

#[cfg(target_os = "vexos")]
#[vexide::main]
async fn main(peripherals: vexide::prelude::Peripherals) {
    use vexide::prelude::CompeteExt;

    logger::init();

    match robot::Robot::new(peripherals, robot_logic::RobotConfig::DEFAULT) {
        Ok(robot) => robot.compete().await,
        Err(err) => log::error!("couldn't set up the robot: {err}"),
    }
}

#[cfg(not(target_os = "vexos"))]
fn main() -> Result<(), bench::BenchError> {
    use clap::Parser;

    logger::init();

    let args = bench::Args::parse();
    let summary = bench::run(&args)?;

    println!(
        "settled at {:.1} RPM (target {:.1}) after {} ticks",
        summary.velocity, args.target, summary.report.ticks
    );
    println!(
        "{} commands, {} rejected samples, {} actuator faults",
        summary.report.commands, summary.report.rejected_samples, summary.report.actuator_faults
    );

    Ok(())
}
