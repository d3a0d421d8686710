//! Reconnect bookkeeping.
//!
//! Tracks the attempt counter, the current backoff delay, and whether
//! reconnection is permitted at all. The delay starts at the configured
//! initial value and doubles per scheduled attempt; both counter and delay
//! reset only on a successful open. Once the attempt counter reaches the
//! maximum, no further attempts are scheduled until a manual session
//! selection starts a fresh connection.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default delay before the first reconnect attempt.
pub(crate) const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(1000);

/// Default maximum number of consecutive reconnect attempts.
pub(crate) const DEFAULT_MAX_ATTEMPTS: u32 = 7;

// ============================================================================
// ScheduledAttempt
// ============================================================================

/// One scheduled reconnect attempt.
///
/// Carries the values observed BEFORE the counters advance: the wait uses
/// this delay, and diagnostics log this attempt number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScheduledAttempt {
    /// Zero-based attempt number.
    pub attempt: u32,

    /// Delay to wait before redialing.
    pub delay: Duration,
}

// ============================================================================
// ReconnectState
// ============================================================================

/// Reconnect state for the active connection.
#[derive(Debug)]
pub(crate) struct ReconnectState {
    /// Consecutive failed attempts since the last successful open.
    attempts: u32,

    /// Delay for the next scheduled attempt.
    delay: Duration,

    /// Whether a close may schedule a reconnect at all.
    permitted: bool,

    /// Configured initial delay, restored on successful open.
    initial_delay: Duration,

    /// Configured attempt ceiling.
    max_attempts: u32,
}

impl ReconnectState {
    /// Creates reconnect state with the given policy.
    pub(crate) fn new(initial_delay: Duration, max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            delay: initial_delay,
            permitted: true,
            initial_delay,
            max_attempts,
        }
    }

    /// Resets counters after a successful open.
    pub(crate) fn on_open(&mut self) {
        self.attempts = 0;
        self.delay = self.initial_delay;
        self.permitted = true;
    }

    /// Forbids reconnection for the next close.
    ///
    /// Used when an open transport is superseded by a session switch or an
    /// explicit close, so its close cannot schedule a duplicate reconnect.
    pub(crate) fn forbid(&mut self) {
        self.permitted = false;
    }

    /// Returns whether a close may schedule a reconnect.
    #[inline]
    pub(crate) fn is_permitted(&self) -> bool {
        self.permitted
    }

    /// Returns the consecutive failed attempt count.
    #[inline]
    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Claims the next reconnect attempt, advancing the counters.
    ///
    /// Returns the pre-advance attempt number and delay, or `None` once the
    /// attempt ceiling is reached.
    pub(crate) fn next_attempt(&mut self) -> Option<ScheduledAttempt> {
        if self.attempts >= self.max_attempts {
            return None;
        }

        let scheduled = ScheduledAttempt {
            attempt: self.attempts,
            delay: self.delay,
        };

        self.delay *= 2;
        self.attempts += 1;

        Some(scheduled)
    }
}

// ============================================================================
// Tests
// ============================================================================
