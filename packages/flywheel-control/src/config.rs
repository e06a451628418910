//! Controller configuration.
//!
//! Every knob that differed between the hand-tuned versions of this loop is a field of
//! [`ControllerConfig`]: the gains (fixed or scheduled), the nominal tick period, how the
//! integral is accumulated, the anti-windup policy, and what the correction is added to.

use core::time::Duration;

use snafu::{Snafu, ensure};

use crate::gains::{ErrorBand, GainMode, GainSchedule, Gains};

/// How the error is folded into the integral accumulator each tick.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IntegralMode {
    /// Accumulate `error × dt`, with `dt` in seconds.
    TimeScaled,

    /// Accumulate the raw error, ignoring the tick period.
    Raw,
}

/// When the integral accumulator is cleared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AntiWindup {
    /// Never clear the accumulator.
    Disabled,

    /// Clear the accumulator whenever the error falls outside the band.
    ErrorBand(ErrorBand),

    /// Clear the accumulator whenever it grows past the target velocity.
    IntegralExceedsTarget,

    /// Clear the accumulator when either of the above conditions holds.
    Either(ErrorBand),
}

impl AntiWindup {
    /// Returns `true` if an accumulator of `integral` should be cleared for this error and
    /// target.
    #[must_use]
    pub fn should_reset(&self, error: f64, integral: f64, target: f64) -> bool {
        match self {
            Self::Disabled => false,
            Self::ErrorBand(band) => !band.contains(error),
            Self::IntegralExceedsTarget => integral > target,
            Self::Either(band) => !band.contains(error) || integral > target,
        }
    }

    const fn band(&self) -> Option<&ErrorBand> {
        match self {
            Self::ErrorBand(band) | Self::Either(band) => Some(band),
            Self::Disabled | Self::IntegralExceedsTarget => None,
        }
    }
}

/// What the proportional, integral and derivative terms are added to.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputReference {
    /// The command is a correction on top of the measured velocity.
    Measured,

    /// The command is a correction on top of the target velocity.
    Target,

    /// The command is the bare sum of the terms, like a textbook PID.
    Zero,
}

impl OutputReference {
    /// Returns the value the correction is added to.
    #[must_use]
    pub const fn base(&self, measured: f64, target: f64) -> f64 {
        match self {
            Self::Measured => measured,
            Self::Target => target,
            Self::Zero => 0.0,
        }
    }
}

/// Full description of a velocity controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    /// Gains, possibly scheduled on the error.
    pub gains: GainMode,
    /// Nominal time between two controller updates.
    pub period: Duration,
    /// How the integral is accumulated.
    pub integral: IntegralMode,
    /// When the integral accumulator is cleared.
    pub anti_windup: AntiWindup,
    /// What the correction is added to.
    pub reference: OutputReference,
    /// Symmetric clamp applied to the command, if any.
    pub output_limit: Option<f64>,
}

impl ControllerConfig {
    /// Proportional-only correction on top of the measured velocity, updated every 20ms.
    ///
    /// This is the loop that runs inline with driver control.
    pub const PROPORTIONAL: Self = Self {
        gains: GainMode::Fixed(Gains::new(0.1, 0.0, 0.0)),
        period: Duration::from_millis(20),
        integral: IntegralMode::TimeScaled,
        anti_windup: AntiWindup::Disabled,
        reference: OutputReference::Measured,
        output_limit: None,
    };

    /// PI correction on top of the measured velocity, updated every 10ms. The accumulator is
    /// cleared whenever it grows past the target.
    pub const INTEGRATING: Self = Self {
        gains: GainMode::Fixed(Gains::new(1.0, 0.1, 0.0)),
        period: Duration::from_millis(10),
        integral: IntegralMode::TimeScaled,
        anti_windup: AntiWindup::IntegralExceedsTarget,
        reference: OutputReference::Measured,
        output_limit: None,
    };

    /// Gain-scheduled PID around a ±100 RPM band, updated every 10ms.
    ///
    /// Outside the band the wheel is driven hard with no derivative term and the accumulator is
    /// cleared every tick. Inside the band a gentler `kp` and a small `kd` let it settle.
    pub const SCHEDULED: Self = Self {
        gains: GainMode::Scheduled(GainSchedule {
            band: ErrorBand::new(100.0),
            coarse: Gains::new(1.0, 0.05, 0.0),
            fine: Gains::new(0.35, 0.05, 0.002),
        }),
        period: Duration::from_millis(10),
        integral: IntegralMode::TimeScaled,
        anti_windup: AntiWindup::ErrorBand(ErrorBand::new(100.0)),
        reference: OutputReference::Measured,
        output_limit: None,
    };

    /// Returns the nominal tick period in seconds.
    #[must_use]
    pub const fn dt(&self) -> f64 {
        self.period.as_secs_f64()
    }

    /// Checks that this configuration describes a usable controller.
    ///
    /// # Errors
    ///
    /// - A [`ConfigError::ZeroPeriod`] error is returned if the tick period is zero.
    /// - A [`ConfigError::NonFiniteGains`] error is returned if any gain is NaN or infinite.
    /// - A [`ConfigError::InvalidBand`] error is returned if a band width is negative or not
    ///   finite.
    /// - A [`ConfigError::InvalidOutputLimit`] error is returned if the output limit is
    ///   negative or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(!self.period.is_zero(), ZeroPeriodSnafu);

        match &self.gains {
            GainMode::Fixed(gains) => ensure!(gains.is_finite(), NonFiniteGainsSnafu),
            GainMode::Scheduled(schedule) => {
                ensure!(
                    schedule.coarse.is_finite() && schedule.fine.is_finite(),
                    NonFiniteGainsSnafu
                );
                validate_band(&schedule.band)?;
            }
        }

        if let Some(band) = self.anti_windup.band() {
            validate_band(band)?;
        }

        if let Some(limit) = self.output_limit {
            ensure!(
                limit.is_finite() && limit >= 0.0,
                InvalidOutputLimitSnafu { limit }
            );
        }

        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::SCHEDULED
    }
}

fn validate_band(band: &ErrorBand) -> Result<(), ConfigError> {
    ensure!(
        band.half_width.is_finite() && band.half_width >= 0.0,
        InvalidBandSnafu {
            half_width: band.half_width
        }
    );
    Ok(())
}

#[derive(Debug, Snafu)]
/// Errors that make a [`ControllerConfig`] unusable.
pub enum ConfigError {
    /// The tick period is zero, so the derivative term would divide by zero.
    #[snafu(display("controller period must be greater than zero"))]
    ZeroPeriod,

    /// One of the gains is NaN or infinite.
    #[snafu(display("controller gains must be finite"))]
    NonFiniteGains,

    /// An error band has a negative or non-finite width.
    #[snafu(display("error band half width {half_width} must be finite and non-negative"))]
    InvalidBand {
        /// The offending half width.
        half_width: f64,
    },

    /// The output limit is negative or non-finite.
    #[snafu(display("output limit {limit} must be finite and non-negative"))]
    InvalidOutputLimit {
        /// The offending limit.
        limit: f64,
    },
}
