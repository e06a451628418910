//! Controller gains and gain scheduling.
//!
//! A flywheel spends most of its life in one of two regions: far from its target while spinning
//! up or recovering from a launch, and close to its target while holding speed. [`GainSchedule`]
//! lets each region use its own set of [`Gains`], with the boundary between them described by an
//! [`ErrorBand`].

/// Proportional, integral and derivative constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains {
    /// Proportional constant. This is multiplied by the error to get the
    /// proportional component of the output.
    pub kp: f64,
    /// Integral constant. This is multiplied by the integral accumulator.
    pub ki: f64,
    /// Derivative constant. This is multiplied by the rate of change of the error.
    pub kd: f64,
}

impl Gains {
    /// Gains that produce no correction at all.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new set of gains.
    #[must_use]
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    /// Returns `true` if every constant is a finite number.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

/// Decides which side of an [`ErrorBand`] an error sitting exactly on its edge falls on.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BandEdge {
    /// An error of exactly `±half_width` is inside the band.
    Inside,

    /// An error of exactly `±half_width` is outside the band.
    Outside,
}

/// A symmetric band of errors around zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorBand {
    /// Distance from zero to either edge of the band, in velocity units.
    pub half_width: f64,
    /// How errors on the edge itself are classified.
    pub edge: BandEdge,
}

impl ErrorBand {
    /// Creates a band whose edges count as inside it.
    #[must_use]
    pub const fn new(half_width: f64) -> Self {
        Self {
            half_width,
            edge: BandEdge::Inside,
        }
    }

    /// Returns a copy of this band with a different edge policy.
    #[must_use]
    pub const fn with_edge(mut self, edge: BandEdge) -> Self {
        self.edge = edge;
        self
    }

    /// Returns `true` if `error` lies within the band.
    #[must_use]
    pub fn contains(&self, error: f64) -> bool {
        match self.edge {
            BandEdge::Inside => -self.half_width <= error && error <= self.half_width,
            BandEdge::Outside => -self.half_width < error && error < self.half_width,
        }
    }
}

/// Two sets of gains switched on the size of the error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainSchedule {
    /// Errors inside this band use [`fine`](Self::fine), everything else uses
    /// [`coarse`](Self::coarse).
    pub band: ErrorBand,
    /// Gains used far from the target. Usually a large `kp` and no `kd` so the wheel is driven
    /// hard towards its target.
    pub coarse: Gains,
    /// Gains used near the target. Usually a smaller `kp` with some `kd` for smooth settling.
    pub fine: Gains,
}

impl GainSchedule {
    /// Picks the gains for the given error.
    #[must_use]
    pub fn select(&self, error: f64) -> Gains {
        if self.band.contains(error) {
            self.fine
        } else {
            self.coarse
        }
    }
}

/// How the controller chooses its gains each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainMode {
    /// The same gains are used regardless of the error.
    Fixed(Gains),

    /// Gains are switched on the size of the error.
    Scheduled(GainSchedule),
}

impl GainMode {
    /// Picks the gains for the given error.
    #[must_use]
    pub fn select(&self, error: f64) -> Gains {
        match self {
            Self::Fixed(gains) => *gains,
            Self::Scheduled(schedule) => schedule.select(error),
        }
    }
}
