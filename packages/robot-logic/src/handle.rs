//! State shared between a flywheel session and the flow that owns it.
//!
//! The owning flow (an autonomous routine or the driver loop) and the polling task only ever
//! share two values: the target velocity and a flag that ends the session. Both live behind a
//! [`FlywheelHandle`], which is cheap to clone and safe to read from either side at any time.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Default)]
struct Shared {
    target: AtomicU64,
    finished: AtomicBool,
}

/// A handle to one flywheel control session.
///
/// A session is finished exactly once. Start a new session with a new handle.
#[derive(Debug, Clone, Default)]
pub struct FlywheelHandle {
    shared: Arc<Shared>,
}

impl FlywheelHandle {
    /// Creates a handle for a new session with a target of zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the velocity the session should hold. A target of zero lets the wheel coast.
    pub fn set_target(&self, velocity: f64) {
        self.shared
            .target
            .store(velocity.to_bits(), Ordering::Release);
    }

    /// Returns the velocity the session is currently holding.
    #[must_use]
    pub fn target(&self) -> f64 {
        f64::from_bits(self.shared.target.load(Ordering::Acquire))
    }

    /// Ends the session. The polling task issues no further commands once it sees this.
    pub fn finish(&self) {
        self.shared.finished.store(true, Ordering::Release);
    }

    /// Returns `true` once [`finish`](Self::finish) has been called on any clone of this handle.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }

    /// Returns a guard that finishes the session when dropped.
    ///
    /// Competition phases end by dropping whatever future was running, so the owning flow holds
    /// one of these to make sure its polling task stops with it.
    #[must_use]
    pub fn guard(&self) -> SessionGuard {
        SessionGuard {
            handle: self.clone(),
        }
    }
}

/// Finishes a flywheel session when dropped.
#[derive(Debug)]
#[must_use = "the session is finished as soon as the guard is dropped"]
pub struct SessionGuard {
    handle: FlywheelHandle,
}

impl SessionGuard {
    /// Returns the handle this guard finishes.
    #[must_use]
    pub const fn handle(&self) -> &FlywheelHandle {
        &self.handle
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.handle.finish();
    }
}
