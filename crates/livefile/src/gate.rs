//! Debounce gate deciding which change notifications cause a re-read.
//!
//! The watch mechanism may emit several notifications for one logical edit
//! (a metadata change plus a content change, an editor writing a temp file
//! and renaming it, a formatter rewriting the file twice). The gate lets
//! one trigger through per window and drops the rest.
//!
//! The window is measured from the *acceptance* of a trigger, not from the
//! completion of the read it caused. A read that takes longer than the
//! window therefore does not hold the gate closed.

use std::time::{Duration, Instant};

/// Minimum-interval gate over trigger timestamps.
///
/// A trigger at `now` is accepted iff `now - last_update > delay`. Only
/// accepted, touching checks move `last_update`.
///
/// All methods take the current instant explicitly so the policy can be
/// exercised without a real clock; [`LiveFile`](crate::LiveFile) passes
/// [`Instant::now`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceGate {
    delay: Duration,

    /// `None` only when `created - delay` is not representable, which
    /// leaves the gate open for the first trigger just the same.
    last_update: Option<Instant>,
}

impl DebounceGate {
    /// Create a gate whose baseline is pre-dated by `delay`, so the first
    /// trigger after `created` is eligible immediately.
    #[must_use]
    pub fn new(delay: Duration, created: Instant) -> Self {
        Self {
            delay,
            last_update: created.checked_sub(delay),
        }
    }

    /// The configured minimum interval.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Timestamp of the most recently accepted trigger.
    #[must_use]
    pub const fn last_update(&self) -> Option<Instant> {
        self.last_update
    }

    /// Time elapsed at `now` since the last accepted trigger.
    #[must_use]
    pub fn elapsed_at(&self, now: Instant) -> Option<Duration> {
        self.last_update
            .map(|last| now.saturating_duration_since(last))
    }

    /// Evaluate a trigger arriving at `now`.
    ///
    /// Returns `true` if the gate is open. When open and `touch` is set,
    /// the gate closes at `now` as part of the check.
    pub fn should_accept_at(&mut self, now: Instant, touch: bool) -> bool {
        let open = self
            .elapsed_at(now)
            .is_none_or(|elapsed| elapsed > self.delay);

        if open && touch {
            self.last_update = Some(now);
        }

        open
    }

    /// [`should_accept_at`](Self::should_accept_at) with the current instant.
    pub fn should_accept(&mut self, touch: bool) -> bool {
        self.should_accept_at(Instant::now(), touch)
    }
}
