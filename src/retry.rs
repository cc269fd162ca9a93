use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::errors::Error;

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(180);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Source of time for retry loops.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time with blocking sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total time allowed from the first attempt.
    pub deadline: Duration,
    /// Pause between a failed attempt and the next one.
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            deadline: DEFAULT_DEADLINE,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl RetryPolicy {
    /// Build from human readable durations such as `3m` or `1s`.
    ///
    /// Both durations must be non-zero: a zero deadline would never run the
    /// command and a zero interval would spin on a failing one.
    pub fn parse(deadline: &str, interval: &str) -> Result<Self, Error> {
        let policy = RetryPolicy {
            deadline: humanize_rs::duration::parse(deadline)?,
            interval: humanize_rs::duration::parse(interval)?,
        };
        if policy.deadline.is_zero() {
            return Err(Error::Config(format!("retry deadline {deadline:?} must be non-zero")));
        }
        if policy.interval.is_zero() {
            return Err(Error::Config(format!("retry interval {interval:?} must be non-zero")));
        }
        Ok(policy)
    }
}

/// Run `attempt` until it reports success or the deadline passes.
///
/// An `Err` from `attempt` counts as a failed attempt. Returns whether any
/// attempt succeeded.
pub fn persistent_call<C, F>(
    clock: &C,
    policy: &RetryPolicy,
    retry_message: &str,
    mut attempt: F,
) -> bool
where
    C: Clock + ?Sized,
    F: FnMut() -> Result<bool, Error>,
{
    let deadline = clock.now() + policy.deadline;
    while clock.now() < deadline {
        match attempt() {
            Ok(true) => return true,
            Ok(false) => {}
            Err(err) => debug!("attempt failed: {}", err),
        }
        warn!("{}", retry_message);
        clock.sleep(policy.interval);
    }
    false
}
