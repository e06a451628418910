//! Scripted autonomous routines.
//!
//! A [`Routine`] is a list of [`Step`]s run one after another by a [`RoutineRunner`]. Flywheel
//! steps only change the target of the running session; the session's own polling task does
//! the actual work.

use alloc::vec::Vec;
use core::time::Duration;

use crate::{
    devices::{Chassis, Delay, Intake, Piston},
    handle::FlywheelHandle,
};

/// A single action in a routine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Drive straight by this many inches.
    Drive(f64),

    /// Turn in place by this many degrees.
    Turn(f64),

    /// Set the flywheel target, in RPM.
    SpinUp(f64),

    /// Let the flywheel coast down. Takes effect on the session's next tick.
    StopFlywheel,

    /// Run the intake at `volts` for `duration`, then stop it.
    Intake {
        /// Intake voltage.
        volts: f64,
        /// How long to run it for.
        duration: Duration,
    },

    /// Do nothing for a while.
    Wait(Duration),

    /// Flip the angle changer.
    TogglePiston,
}

/// A named sequence of steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    name: &'static str,
    steps: Vec<Step>,
}

impl Routine {
    /// Creates a routine from its steps.
    pub fn new(name: &'static str, steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            name,
            steps: steps.into_iter().collect(),
        }
    }

    /// Drives a one-foot square.
    #[must_use]
    pub fn square() -> Self {
        Self::new(
            "square",
            (0..4).flat_map(|_| [Step::Drive(12.0), Step::Turn(90.0)]),
        )
    }

    /// Launches the preloads from the starting tile and backs away.
    #[must_use]
    pub fn shoot_preloads() -> Self {
        Self::new(
            "shoot preloads",
            [
                Step::SpinUp(600.0),
                Step::Wait(Duration::from_secs(2)),
                Step::TogglePiston,
                Step::Intake {
                    volts: 12.0,
                    duration: Duration::from_millis(1500),
                },
                Step::StopFlywheel,
                Step::Wait(Duration::from_millis(100)),
                Step::TogglePiston,
                Step::Drive(-12.0),
            ],
        )
    }

    /// Returns the routine's name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the routine's steps in order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// What happened while running a routine.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct RoutineReport {
    /// Steps that were carried out.
    pub steps: usize,
    /// Steps whose device calls failed. The routine carries on regardless.
    pub faults: usize,
}

/// Runs routines against the robot's devices.
#[derive(Debug)]
pub struct RoutineRunner<'a, C, I, P, D> {
    chassis: &'a mut C,
    intake: &'a mut I,
    piston: &'a mut P,
    delay: &'a mut D,
    extended: bool,
}

impl<'a, C, I, P, D> RoutineRunner<'a, C, I, P, D>
where
    C: Chassis,
    I: Intake,
    P: Piston,
    D: Delay,
{
    /// Creates a runner. The piston is assumed to start retracted.
    pub const fn new(
        chassis: &'a mut C,
        intake: &'a mut I,
        piston: &'a mut P,
        delay: &'a mut D,
    ) -> Self {
        Self {
            chassis,
            intake,
            piston,
            delay,
            extended: false,
        }
    }

    /// Returns `true` if the runner last left the piston extended.
    #[must_use]
    pub const fn is_extended(&self) -> bool {
        self.extended
    }

    /// Runs every step of `routine` in order, then finishes the flywheel session.
    pub async fn run(&mut self, routine: &Routine, flywheel: &FlywheelHandle) -> RoutineReport {
        let mut report = RoutineReport::default();
        log::debug!("running routine \"{}\"", routine.name());

        for step in routine.steps() {
            log::trace!("step {}: {step:?}", report.steps);
            if !self.step(*step, flywheel).await {
                report.faults += 1;
            }
            report.steps += 1;
        }

        flywheel.finish();
        log::debug!("routine \"{}\" done: {report:?}", routine.name());

        report
    }

    async fn step(&mut self, step: Step, flywheel: &FlywheelHandle) -> bool {
        match step {
            Step::Drive(inches) => ok(self.chassis.move_distance(inches).await),
            Step::Turn(degrees) => ok(self.chassis.turn_angle(degrees).await),
            Step::SpinUp(rpm) => {
                flywheel.set_target(rpm);
                true
            }
            Step::StopFlywheel => {
                flywheel.set_target(0.0);
                true
            }
            Step::Intake { volts, duration } => {
                let started = ok(self.intake.set_voltage(volts));
                self.delay.delay(duration).await;
                ok(self.intake.set_voltage(0.0)) && started
            }
            Step::Wait(duration) => {
                self.delay.delay(duration).await;
                true
            }
            Step::TogglePiston => {
                let extended = !self.extended;
                let done = ok(self.piston.set_extended(extended));
                if done {
                    self.extended = extended;
                }
                done
            }
        }
    }
}

fn ok<E: core::fmt::Debug>(result: Result<(), E>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            log::warn!("routine step failed: {err:?}");
            false
        }
    }
}

#[cfg(test)]
mod test {
    use alloc::vec::Vec;

    use futures::executor::block_on;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Move(f64),
        Turn(f64),
        Intake(f64),
        Piston(bool),
        Delay(Duration),
    }

    #[derive(Default)]
    struct Log {
        calls: Vec<Call>,
    }

    struct Fake<'a>(&'a core::cell::RefCell<Log>);

    impl Chassis for Fake<'_> {
        type Error = &'static str;

        async fn move_distance(&mut self, inches: f64) -> Result<(), Self::Error> {
            self.0.borrow_mut().calls.push(Call::Move(inches));
            Ok(())
        }

        async fn turn_angle(&mut self, degrees: f64) -> Result<(), Self::Error> {
            self.0.borrow_mut().calls.push(Call::Turn(degrees));
            Ok(())
        }
    }

    impl Intake for Fake<'_> {
        type Error = &'static str;

        fn set_voltage(&mut self, volts: f64) -> Result<(), Self::Error> {
            self.0.borrow_mut().calls.push(Call::Intake(volts));
            Ok(())
        }

        fn temperature(&self) -> Result<f64, Self::Error> {
            Ok(30.0)
        }
    }

    struct Jammed;

    impl Piston for Jammed {
        type Error = &'static str;

        fn set_extended(&mut self, _extended: bool) -> Result<(), Self::Error> {
            Err("solenoid unplugged")
        }
    }

    impl Piston for Fake<'_> {
        type Error = &'static str;

        fn set_extended(&mut self, extended: bool) -> Result<(), Self::Error> {
            self.0.borrow_mut().calls.push(Call::Piston(extended));
            Ok(())
        }
    }

    impl Delay for Fake<'_> {
        async fn delay(&mut self, duration: Duration) {
            self.0.borrow_mut().calls.push(Call::Delay(duration));
        }
    }

    #[test]
    fn square_alternates_drive_and_turn() {
        let log = core::cell::RefCell::new(Log::default());
        let (mut chassis, mut intake, mut piston, mut delay) =
            (Fake(&log), Fake(&log), Fake(&log), Fake(&log));
        let handle = FlywheelHandle::new();

        let report = block_on(
            RoutineRunner::new(&mut chassis, &mut intake, &mut piston, &mut delay)
                .run(&Routine::square(), &handle),
        );

        assert_eq!(report, RoutineReport { steps: 8, faults: 0 });
        let calls = log.into_inner().calls;
        assert_eq!(calls.len(), 8);
        for pair in calls.chunks(2) {
            assert_eq!(pair, [Call::Move(12.0), Call::Turn(90.0)]);
        }
        assert!(handle.is_finished());
    }

    #[test]
    fn shooting_sets_targets_and_times_intake() {
        let log = core::cell::RefCell::new(Log::default());
        let (mut chassis, mut intake, mut piston, mut delay) =
            (Fake(&log), Fake(&log), Fake(&log), Fake(&log));
        let handle = FlywheelHandle::new();

        let routine = Routine::new(
            "feed",
            [
                Step::SpinUp(600.0),
                Step::Intake {
                    volts: 12.0,
                    duration: Duration::from_millis(1500),
                },
            ],
        );
        let mut runner = RoutineRunner::new(&mut chassis, &mut intake, &mut piston, &mut delay);
        block_on(runner.run(&routine, &handle));

        assert_eq!(handle.target(), 600.0);
        assert_eq!(
            log.into_inner().calls,
            [
                Call::Intake(12.0),
                Call::Delay(Duration::from_millis(1500)),
                Call::Intake(0.0),
            ]
        );
    }

    #[test]
    fn piston_toggles_alternate() {
        let log = core::cell::RefCell::new(Log::default());
        let (mut chassis, mut intake, mut piston, mut delay) =
            (Fake(&log), Fake(&log), Fake(&log), Fake(&log));
        let handle = FlywheelHandle::new();

        let routine = Routine::new("flip", [Step::TogglePiston; 3]);
        let mut runner = RoutineRunner::new(&mut chassis, &mut intake, &mut piston, &mut delay);
        block_on(runner.run(&routine, &handle));

        assert!(runner.is_extended());
        assert_eq!(
            log.into_inner().calls,
            [Call::Piston(true), Call::Piston(false), Call::Piston(true)]
        );
    }

    #[test]
    fn failed_steps_are_counted_and_skipped() {
        let log = core::cell::RefCell::new(Log::default());
        let (mut chassis, mut intake, mut delay) = (Fake(&log), Fake(&log), Fake(&log));
        let mut piston = Jammed;
        let handle = FlywheelHandle::new();

        let routine = Routine::new("jam", [Step::TogglePiston, Step::Drive(6.0)]);
        let mut runner = RoutineRunner::new(&mut chassis, &mut intake, &mut piston, &mut delay);
        let report = block_on(runner.run(&routine, &handle));

        assert_eq!(report, RoutineReport { steps: 2, faults: 1 });
        assert!(!runner.is_extended());
        assert_eq!(log.into_inner().calls, [Call::Move(6.0)]);
        assert!(handle.is_finished());
    }

    #[test]
    fn shoot_preloads_stops_before_finishing() {
        let steps = Routine::shoot_preloads();
        let stop = steps
            .steps()
            .iter()
            .position(|step| *step == Step::StopFlywheel)
            .unwrap();
        assert!(matches!(steps.steps()[stop + 1], Step::Wait(_)));
    }
}
