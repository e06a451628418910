//! The velocity controller.
//!
//! [`compute`] is the whole algorithm as a pure function of a configuration, the previous
//! [`ControllerState`] and one [`ControlSample`]. [`VelocityController`] wraps it for callers that
//! would rather keep the state in one place and call [`VelocityController::update`] once per tick.

use snafu::{Snafu, ensure};

use crate::{
    config::{ConfigError, ControllerConfig, IntegralMode},
    gains::Gains,
};

/// One reading taken by the polling loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSample {
    /// The velocity the actuator reports.
    pub measured: f64,
    /// The velocity we want.
    pub target: f64,
    /// Time since the previous sample in seconds.
    pub dt: f64,
}

/// Everything the controller carries from one tick to the next.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ControllerState {
    /// The integral accumulator.
    pub integral: f64,
    /// The error seen on the previous tick.
    pub previous_error: f64,
}

/// The result of one controller update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    /// The command to hand to the actuator, in the same units as the velocities. Converting it to
    /// volts or motor RPM is up to the caller.
    pub command: f64,
    /// `target - measured` for this tick.
    pub error: f64,
    /// The gains that were used for this tick.
    pub gains: Gains,
    /// Whether anti-windup cleared the accumulator on this tick.
    pub integral_reset: bool,
}

/// Runs one controller update.
///
/// The update goes as follows:
///
/// 1. `error = target - measured`
/// 2. the error is folded into the accumulator (scaled by `dt` unless [`IntegralMode::Raw`])
/// 3. the accumulator is cleared if the anti-windup policy asks for it
/// 4. `derivative = (error - previous_error) / dt`
/// 5. `command = base + kp·error + ki·integral + kd·derivative`, where the base comes from the
///    [`OutputReference`](crate::config::OutputReference) and the gains from the (possibly
///    scheduled) [`GainMode`](crate::gains::GainMode)
///
/// The state passed in is never modified; the updated state is returned alongside the output.
///
/// # Errors
///
/// - A [`ControlError::NonFiniteSample`] error is returned if either velocity is NaN or infinite.
/// - A [`ControlError::InvalidTimestep`] error is returned if `dt` is not a positive, finite
///   number.
pub fn compute(
    config: &ControllerConfig,
    state: ControllerState,
    sample: ControlSample,
) -> Result<(ControlOutput, ControllerState), ControlError> {
    let ControlSample {
        measured,
        target,
        dt,
    } = sample;

    ensure!(
        measured.is_finite() && target.is_finite(),
        NonFiniteSampleSnafu { measured, target }
    );
    ensure!(dt.is_finite() && dt > 0.0, InvalidTimestepSnafu { dt });

    let error = target - measured;

    let mut integral = state.integral
        + match config.integral {
            IntegralMode::TimeScaled => error * dt,
            IntegralMode::Raw => error,
        };

    let integral_reset = config.anti_windup.should_reset(error, integral, target);
    if integral_reset {
        integral = 0.0;
    }

    let derivative = (error - state.previous_error) / dt;
    let gains = config.gains.select(error);

    let mut command = config.reference.base(measured, target)
        + gains.kp * error
        + gains.ki * integral
        + gains.kd * derivative;

    if let Some(limit) = config.output_limit {
        command = command.clamp(-limit, limit);
    }

    Ok((
        ControlOutput {
            command,
            error,
            gains,
            integral_reset,
        },
        ControllerState {
            integral,
            previous_error: error,
        },
    ))
}

/// A velocity controller with its state.
///
/// The state lives as long as the controller does. Create one when a control session starts and
/// drop it (or [`reset`](Self::reset) it) when the session ends.
///
/// # Examples
///
/// ```
/// use flywheel_control::{ControllerConfig, VelocityController};
///
/// let mut controller = VelocityController::new(ControllerConfig::SCHEDULED).unwrap();
/// let output = controller.update(540.0, 600.0).unwrap();
/// assert!(output.command > 540.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityController {
    config: ControllerConfig,
    state: ControllerState,
}

impl VelocityController {
    /// Creates a new controller with a cleared state.
    ///
    /// # Errors
    ///
    /// Returns the first problem [`ControllerConfig::validate`] finds.
    pub fn new(config: ControllerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: ControllerState::default(),
        })
    }

    /// Returns the configuration this controller was built with.
    #[must_use]
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Returns the state carried into the next update.
    #[must_use]
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// Builds a sample for this controller using its nominal period.
    #[must_use]
    pub const fn sample(&self, measured: f64, target: f64) -> ControlSample {
        ControlSample {
            measured,
            target,
            dt: self.config.dt(),
        }
    }

    /// Runs one update with the nominal period and keeps the new state.
    ///
    /// On error the state is left untouched, so a bad reading does not disturb the accumulator.
    ///
    /// # Errors
    ///
    /// See [`compute`].
    pub fn update(&mut self, measured: f64, target: f64) -> Result<ControlOutput, ControlError> {
        let (output, state) = compute(&self.config, self.state, self.sample(measured, target))?;

        if output.integral_reset {
            log::trace!("integral cleared at error {}", output.error);
        }

        self.state = state;
        Ok(output)
    }

    /// Clears the accumulator and the remembered error.
    pub fn reset(&mut self) {
        self.state = ControllerState::default();
    }
}

#[derive(Debug, Snafu)]
/// Errors that can occur while updating a controller.
pub enum ControlError {
    /// A velocity reading or target is NaN or infinite.
    #[snafu(display("non-finite sample (measured: {measured}, target: {target})"))]
    NonFiniteSample {
        /// The measured velocity.
        measured: f64,
        /// The target velocity.
        target: f64,
    },

    /// The time step is zero, negative or not finite.
    #[snafu(display("time step {dt} must be a positive finite number of seconds"))]
    InvalidTimestep {
        /// The offending time step.
        dt: f64,
    },
}
