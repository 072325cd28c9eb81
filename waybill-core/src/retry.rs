//! Retry budgets and backoff schedules.
//!
//! Retries are expressed as data ([`RetryPolicy`]) and sleeps go through the
//! [`Pause`] port so callers, and tests, decide how time passes.

use std::time::Duration;

/// Delay schedule between attempts. `attempt` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// The same delay after every attempt.
    Fixed(Duration),
    /// `step × (attempt + 1)`.
    Linear {
        /// Increment per attempt.
        step: Duration,
    },
    /// `base × 2^attempt`.
    Exponential {
        /// Delay after the first attempt.
        base: Duration,
    },
}

impl Backoff {
    /// Delay to wait after the zero-based `attempt` failed.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use waybill_core::Backoff;
    ///
    /// let backoff = Backoff::Exponential { base: Duration::from_secs(2) };
    /// assert_eq!(backoff.delay(0), Duration::from_secs(2));
    /// assert_eq!(backoff.delay(2), Duration::from_secs(8));
    /// ```
    #[must_use]
    pub const fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Linear { step } => step.saturating_mul(attempt.saturating_add(1)),
            Self::Exponential { base } => base.saturating_mul(2_u32.saturating_pow(attempt)),
        }
    }
}

/// A bounded number of attempts with a backoff schedule between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: u32,
    /// Delay between consecutive attempts.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Construct a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Run `operation` until it succeeds or the budget is spent.
    ///
    /// `operation` receives the zero-based attempt number. `on_failure` sees
    /// every error, including the last, before the policy pauses. The final
    /// error is returned when no attempt succeeds.
    ///
    /// # Examples
    /// ```
    /// use std::cell::Cell;
    /// use std::time::Duration;
    /// use waybill_core::{Backoff, Pause, RetryPolicy};
    ///
    /// struct Instant;
    /// impl Pause for Instant {
    ///     fn pause(&self, _: Duration) {}
    /// }
    ///
    /// let policy = RetryPolicy::new(3, Backoff::Fixed(Duration::from_secs(1)));
    /// let calls = Cell::new(0);
    /// let result: Result<u32, &str> = policy.run(&Instant, |attempt| {
    ///     calls.set(calls.get() + 1);
    ///     if attempt < 2 { Err("not yet") } else { Ok(attempt) }
    /// }, |_, _| {});
    /// assert_eq!(result, Ok(2));
    /// assert_eq!(calls.get(), 3);
    /// ```
    pub fn run<T, E>(
        &self,
        pause: &dyn Pause,
        mut operation: impl FnMut(u32) -> Result<T, E>,
        mut on_failure: impl FnMut(u32, &E),
    ) -> Result<T, E> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match operation(attempt) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    on_failure(attempt, &err);
                    if attempt + 1 >= attempts {
                        return Err(err);
                    }
                    pause.pause(self.backoff.delay(attempt));
                    attempt += 1;
                }
            }
        }
    }
}

/// Blocks the current thread for a while.
pub trait Pause: Send + Sync {
    /// Wait for `duration`.
    fn pause(&self, duration: Duration);
}

/// [`Pause`] backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingPause;
    use rstest::rstest;

    #[rstest]
    #[case(Backoff::Fixed(Duration::from_secs(3)), [3, 3, 3])]
    #[case(Backoff::Linear { step: Duration::from_secs(5) }, [5, 10, 15])]
    #[case(Backoff::Exponential { base: Duration::from_secs(1) }, [1, 2, 4])]
    fn schedules_grow_as_documented(#[case] backoff: Backoff, #[case] expected: [u64; 3]) {
        let delays: Vec<u64> = (0..3).map(|a| backoff.delay(a).as_secs()).collect();
        assert_eq!(delays, expected);
    }

    #[rstest]
    fn exponential_backoff_saturates() {
        let backoff = Backoff::Exponential {
            base: Duration::from_secs(1),
        };
        assert_eq!(backoff.delay(200), Duration::from_secs(u64::from(u32::MAX)));
    }

    #[rstest]
    fn run_pauses_between_attempts_but_not_after_the_last() {
        let pause = RecordingPause::default();
        let policy = RetryPolicy::new(
            3,
            Backoff::Exponential {
                base: Duration::from_secs(1),
            },
        );
        let mut seen = Vec::new();
        let result: Result<(), u32> = policy.run(&pause, Err, |attempt, _| seen.push(attempt));
        assert_eq!(result, Err(2));
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(
            pause.recorded(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[rstest]
    fn zero_attempts_still_runs_once() {
        let pause = RecordingPause::default();
        let policy = RetryPolicy::new(0, Backoff::Fixed(Duration::from_secs(1)));
        let result: Result<u32, ()> = policy.run(&pause, |_| Ok(7), |_, _| {});
        assert_eq!(result, Ok(7));
        assert!(pause.recorded().is_empty());
    }
}
