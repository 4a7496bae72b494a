// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounded exponential backoff for rate-limited and failed requests.

use std::time::Duration;

use crate::error::ConnectionError;

/// Retry policy for a single logical request.
///
/// The first wait is `initial_delay`; every following wait doubles, capped at
/// `max_delay`. A `Retry-After` hint longer than the computed delay is waited
/// out in full, even past `max_delay`; the following delay doubles from there
/// and is capped again.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use leakguard_lib::protocol::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts(), 5);
///
/// let fast = RetryPolicy::new()
///     .with_max_attempts(3)
///     .with_initial_delay(Duration::from_millis(20))
///     .with_max_delay(Duration::from_millis(100));
/// assert_eq!(fast.initial_delay(), Duration::from_millis(20));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Default attempt budget.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    /// Default first backoff delay.
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(2);
    /// Default backoff ceiling.
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

    /// Creates a policy with the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total number of attempts, including the first one.
    ///
    /// Values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the first backoff delay.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the backoff ceiling.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Returns the attempt budget.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the first backoff delay.
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Returns the backoff ceiling.
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Starts the retry state for a new request.
    #[must_use]
    pub fn start(&self) -> RetryState {
        RetryState {
            policy: *self,
            attempt: 0,
            delay: self.initial_delay.min(self.max_delay),
            last_error: None,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
        }
    }
}

/// Transient state of one request: attempt count, current delay, last error.
///
/// Created when a request starts and dropped when it ends.
#[derive(Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
    delay: Duration,
    last_error: Option<ConnectionError>,
}

impl RetryState {
    /// Records the start of a new attempt and returns its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    /// Returns the number of attempts made so far.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns `true` if the budget allows another attempt.
    #[must_use]
    pub const fn can_retry(&self) -> bool {
        self.attempt < self.policy.max_attempts
    }

    /// Returns the delay the next wait starts from.
    #[must_use]
    pub const fn current_delay(&self) -> Duration {
        self.delay
    }

    /// Computes the next wait and advances the backoff.
    pub fn next_wait(&mut self, retry_after: Option<Duration>) -> Duration {
        let wait = retry_after.map_or(self.delay, |hint| self.delay.max(hint));
        self.delay = wait.saturating_mul(2).min(self.policy.max_delay);
        wait
    }

    /// Remembers a failed attempt.
    pub fn record_error(&mut self, error: ConnectionError) {
        self.last_error = Some(error);
    }

    /// Returns the error of the last failed attempt, if any.
    pub fn take_error(&mut self) -> Option<ConnectionError> {
        self.last_error.take()
    }
}

/// Parses a `Retry-After` header given in seconds.
///
/// Fractional values are accepted. Negative, non-finite and HTTP-date values
/// yield `None`.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let seconds: f64 = value.trim().parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.initial_delay(), secs(2));
        assert_eq!(policy.max_delay(), secs(30));
    }

    #[test]
    fn waits_double_and_cap() {
        let mut state = RetryPolicy::default().start();
        let waits: Vec<Duration> = (0..6).map(|_| state.next_wait(None)).collect();
        assert_eq!(
            waits,
            [secs(2), secs(4), secs(8), secs(16), secs(30), secs(30)]
        );
    }

    #[test]
    fn retry_after_larger_than_delay_is_honored() {
        let mut state = RetryPolicy::default().start();
        assert_eq!(state.next_wait(Some(secs(5))), secs(5));
        assert_eq!(state.next_wait(None), secs(10));
    }

    #[test]
    fn retry_after_smaller_than_delay_is_ignored() {
        let mut state = RetryPolicy::default().start();
        assert_eq!(state.next_wait(Some(Duration::from_millis(500))), secs(2));
        assert_eq!(state.next_wait(Some(secs(1))), secs(4));
    }

    #[test]
    fn retry_after_beyond_max_delay_is_waited_in_full() {
        let mut state = RetryPolicy::default().start();
        assert_eq!(state.next_wait(Some(secs(45))), secs(45));
        assert_eq!(state.current_delay(), secs(30));
        assert_eq!(state.next_wait(None), secs(30));
    }

    #[test]
    fn waits_never_decrease() {
        let mut state = RetryPolicy::default().start();
        let hints = [None, Some(secs(25)), None, Some(secs(3)), Some(secs(90))];
        let waits: Vec<Duration> = hints.iter().map(|h| state.next_wait(*h)).collect();
        assert!(waits.windows(2).all(|w| w[0] <= w[1]), "{waits:?}");
    }

    #[test]
    fn attempt_budget() {
        let mut state = RetryPolicy::new().with_max_attempts(3).start();
        assert_eq!(state.begin_attempt(), 1);
        assert!(state.can_retry());
        state.begin_attempt();
        state.begin_attempt();
        assert!(!state.can_retry());
        assert_eq!(state.attempt(), 3);
    }

    #[test]
    fn zero_attempts_raised_to_one() {
        assert_eq!(RetryPolicy::new().with_max_attempts(0).max_attempts(), 1);
    }

    #[test]
    fn last_error_is_kept() {
        let mut state = RetryPolicy::default().start();
        assert!(state.take_error().is_none());
        state.record_error(ConnectionError::Closed);
        assert!(matches!(state.take_error(), Some(ConnectionError::Closed)));
    }

    #[test]
    fn parse_retry_after_values() {
        assert_eq!(parse_retry_after("3"), Some(secs(3)));
        assert_eq!(parse_retry_after(" 1.5 "), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after("NaN"), None);
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
