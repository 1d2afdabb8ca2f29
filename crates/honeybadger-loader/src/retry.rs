//! Fixed-interval retry loop with an interruptible wait.
//!
//! The loop itself is generic: it runs an attempt, asks a predicate whether
//! the result is final, and otherwise waits through a [`Waiter`] before the
//! next attempt. No wait happens after the last attempt.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("wait interrupted")]
pub struct Interrupted;

/// Suspension between attempts.
pub trait Waiter: Send + Sync {
    fn wait(&self, duration: Duration) -> Result<(), Interrupted>;
}

/// Waiter backed by a condition variable. Any clone can call
/// [`interrupt`](Self::interrupt) from another thread; the current wait and
/// every later one return [`Interrupted`] immediately.
#[derive(Clone, Default)]
pub struct Interruptible {
    state: Arc<(Mutex<bool>, Condvar)>,
}

impl Interruptible {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        let (lock, cvar) = &*self.state;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_interrupted(&self) -> bool {
        let (lock, _) = &*self.state;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Waiter for Interruptible {
    fn wait(&self, duration: Duration) -> Result<(), Interrupted> {
        // No representable deadline: only an interrupt ends the wait.
        let deadline = Instant::now().checked_add(duration);
        let (lock, cvar) = &*self.state;
        let mut interrupted = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Loop guards against spurious wakeups.
        while !*interrupted {
            interrupted = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(());
                    }
                    cvar.wait_timeout(interrupted, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => cvar.wait(interrupted).unwrap_or_else(PoisonError::into_inner),
            };
        }
        Err(Interrupted)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    /// The predicate accepted the result of attempt number `attempts`.
    Done { value: T, attempts: u32 },
    /// No attempt was accepted. `last` holds the final rejected result.
    Exhausted {
        last: Option<T>,
        attempts: u32,
        interrupted: bool,
    },
}

/// Run `attempt` until `is_done` accepts its result or the policy runs out.
///
/// Errors returned by `attempt` abort the loop immediately, without waiting.
/// An interrupted wait ends the loop as [`RetryOutcome::Exhausted`].
pub fn run<T, E, F, P>(
    policy: &RetryPolicy,
    waiter: &dyn Waiter,
    mut attempt: F,
    is_done: P,
) -> Result<RetryOutcome<T>, E>
where
    F: FnMut(u32) -> Result<T, E>,
    P: Fn(&T) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last = None;

    for n in 1..=max_attempts {
        let value = attempt(n)?;
        if is_done(&value) {
            return Ok(RetryOutcome::Done { value, attempts: n });
        }
        last = Some(value);

        if n == max_attempts {
            break;
        }
        if waiter.wait(policy.backoff).is_err() {
            return Ok(RetryOutcome::Exhausted {
                last,
                attempts: n,
                interrupted: true,
            });
        }
    }

    Ok(RetryOutcome::Exhausted {
        last,
        attempts: max_attempts,
        interrupted: false,
    })
}
