use std::{
    cell::Cell,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
    time::Duration,
};

use flywheel_control::{ControllerConfig, VelocityController};
use futures::executor::block_on;
use robot_logic::{
    Command, FlywheelHandle, FlywheelTask, OutputMapping, Routine, RoutineRunner,
    SimulatedFlywheel, Step, VelocityActuator,
    devices::{Chassis, Delay, Intake, Piston},
};

/// Completes on the second poll, giving every other future in a `join!` a turn.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Finishes the session after a fixed number of ticks.
struct FinishAfter {
    remaining: u32,
    handle: FlywheelHandle,
}

impl Delay for FinishAfter {
    async fn delay(&mut self, _duration: Duration) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.handle.finish();
        }
    }
}

/// Advances a shared virtual clock by every requested duration.
struct Ticker(Rc<Cell<Duration>>);

impl Delay for Ticker {
    async fn delay(&mut self, duration: Duration) {
        self.0.set(self.0.get() + duration);
        YieldOnce(false).await;
    }
}

/// Waits on the virtual clock driven by a [`Ticker`].
struct Waiter(Rc<Cell<Duration>>);

impl Delay for Waiter {
    async fn delay(&mut self, duration: Duration) {
        let deadline = self.0.get() + duration;
        while self.0.get() < deadline {
            YieldOnce(false).await;
        }
    }
}

struct Inert;

impl Chassis for Inert {
    type Error = ();

    async fn move_distance(&mut self, _inches: f64) -> Result<(), ()> {
        Ok(())
    }

    async fn turn_angle(&mut self, _degrees: f64) -> Result<(), ()> {
        Ok(())
    }
}

impl Intake for Inert {
    type Error = ();

    fn set_voltage(&mut self, _volts: f64) -> Result<(), ()> {
        Ok(())
    }

    fn temperature(&self) -> Result<f64, ()> {
        Ok(25.0)
    }
}

impl Piston for Inert {
    type Error = ();

    fn set_extended(&mut self, _extended: bool) -> Result<(), ()> {
        Ok(())
    }
}

/// Fails every other read.
struct Flaky {
    reads: Cell<u32>,
    writes: u32,
}

impl VelocityActuator for Flaky {
    type Error = &'static str;

    fn velocity(&self) -> Result<f64, Self::Error> {
        let reads = self.reads.get();
        self.reads.set(reads + 1);
        if reads % 2 == 0 {
            Err("port disconnected")
        } else {
            Ok(550.0)
        }
    }

    fn temperature(&self) -> Result<f64, Self::Error> {
        Ok(40.0)
    }

    fn set_command(&mut self, _command: Command) -> Result<(), Self::Error> {
        self.writes += 1;
        Ok(())
    }
}

fn session<A: VelocityActuator, D: Delay>(
    actuator: A,
    delay: D,
    config: ControllerConfig,
    handle: &FlywheelHandle,
) -> FlywheelTask<A, D> {
    FlywheelTask::new(
        actuator,
        delay,
        VelocityController::new(config).unwrap(),
        OutputMapping::BLUE_VELOCITY,
        handle.clone(),
    )
    .unwrap()
}

fn hold(wheel: SimulatedFlywheel, target: f64, ticks: u32) -> SimulatedFlywheel {
    let handle = FlywheelHandle::new();
    handle.set_target(target);

    let delay = FinishAfter {
        remaining: ticks,
        handle: handle.clone(),
    };
    let mut task = session(wheel, delay, ControllerConfig::SCHEDULED, &handle);
    let report = block_on(task.run());
    assert_eq!(report.ticks, u64::from(ticks));

    task.into_parts().0
}

#[test]
fn no_commands_after_finish() {
    let handle = FlywheelHandle::new();
    handle.set_target(600.0);

    let delay = FinishAfter {
        remaining: 5,
        handle: handle.clone(),
    };
    let mut task = session(
        SimulatedFlywheel::blue(),
        delay,
        ControllerConfig::SCHEDULED,
        &handle,
    );

    let report = block_on(task.run());
    assert_eq!(report.ticks, 5);
    assert_eq!(report.commands, 5);
    assert_eq!(task.actuator().commands(), 5);

    // Running a finished session again does nothing.
    let report = block_on(task.run());
    assert_eq!(report.ticks, 0);
    assert_eq!(report.commands, 0);
    assert_eq!(task.actuator().commands(), 5);
}

#[test]
fn finished_before_start_never_commands() {
    let handle = FlywheelHandle::new();
    handle.set_target(600.0);
    handle.finish();

    let clock = Rc::new(Cell::new(Duration::ZERO));
    let mut task = session(
        SimulatedFlywheel::blue(),
        Ticker(clock.clone()),
        ControllerConfig::SCHEDULED,
        &handle,
    );

    let report = block_on(task.run());
    assert_eq!(report.ticks, 0);
    assert_eq!(task.actuator().commands(), 0);
    assert_eq!(clock.get(), Duration::ZERO);
}

#[test]
fn reaches_and_recovers_target() {
    let mut wheel = hold(SimulatedFlywheel::blue(), 600.0, 3000);
    let error = 600.0 - wheel.current_velocity();
    assert!(error.abs() < 5.0, "settled {error} RPM off target");

    wheel.launch(0.3);
    assert!(wheel.current_velocity() < 430.0);

    let wheel = hold(wheel, 600.0, 3000);
    let error = 600.0 - wheel.current_velocity();
    assert!(error.abs() < 5.0, "recovered {error} RPM off target");
}

#[test]
fn routine_drives_session_concurrently() {
    let clock = Rc::new(Cell::new(Duration::ZERO));
    let handle = FlywheelHandle::new();
    let config = ControllerConfig::SCHEDULED;

    let mut task = session(
        SimulatedFlywheel::blue(),
        Ticker(clock.clone()),
        config,
        &handle,
    );

    let routine = Routine::new(
        "spin and stop",
        [
            Step::SpinUp(600.0),
            Step::Wait(Duration::from_secs(1)),
            Step::StopFlywheel,
            Step::Wait(Duration::from_millis(50)),
        ],
    );
    let (mut chassis, mut intake, mut piston) = (Inert, Inert, Inert);
    let mut waiter = Waiter(clock.clone());
    let mut runner = RoutineRunner::new(&mut chassis, &mut intake, &mut piston, &mut waiter);

    let (session_report, routine_report) =
        block_on(async { futures::join!(task.run(), runner.run(&routine, &handle)) });

    assert_eq!(routine_report.faults, 0);
    assert!(handle.is_finished());
    assert!(session_report.ticks >= 100);
    assert_eq!(session_report.rejected_samples, 0);
    assert!(clock.get() >= Duration::from_millis(1050));

    // The stop was seen before the session ended.
    assert_eq!(task.actuator().drive(), Command::Voltage(0.0));
}

#[test]
fn faults_are_counted_not_fatal() {
    let handle = FlywheelHandle::new();
    handle.set_target(600.0);

    let delay = FinishAfter {
        remaining: 10,
        handle: handle.clone(),
    };
    let flaky = Flaky {
        reads: Cell::new(0),
        writes: 0,
    };
    let mut task = session(flaky, delay, ControllerConfig::PROPORTIONAL, &handle);

    let report = block_on(task.run());
    assert_eq!(report.ticks, 10);
    assert_eq!(report.actuator_faults, 5);
    assert_eq!(report.commands, 5);
    assert_eq!(task.actuator().writes, 5);
}

#[test]
fn guard_ends_session_when_owner_is_dropped() {
    let handle = FlywheelHandle::new();
    handle.set_target(600.0);

    let clock = Rc::new(Cell::new(Duration::ZERO));
    let mut task = session(
        SimulatedFlywheel::blue(),
        Ticker(clock.clone()),
        ControllerConfig::SCHEDULED,
        &handle,
    );

    let owner = {
        let guard = handle.guard();
        let clock = clock.clone();
        async move {
            let _guard = guard;
            Waiter(clock).delay(Duration::from_millis(200)).await;
        }
    };

    let report = block_on(async {
        futures::join!(task.run(), owner).0
    });

    assert!(handle.is_finished());
    assert!(report.ticks >= 20);
    assert!(report.ticks <= 22);
}
