//! Explicit retry policy for filesystem mutations
//!
//! A write that fails is attempted again a bounded number of times, with a
//! fixed pause and a warning logged for every failed attempt. There is
//! exactly one code path per operation; the policy is the only retry.

use std::cell::Cell;
use std::time::Duration;

use backoff::backoff::Constant;

/// How many times, and how far apart, to attempt a fallible operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    /// One retry after 100ms.
    fn default() -> Self {
        Self {
            attempts: 2,
            delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// Run `op`, retrying on error according to the policy.
    ///
    /// `what` names the operation in log output. The error of the final
    /// attempt is returned when all attempts fail.
    pub fn run<T, E, F>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Result<T, E>,
    {
        let max_attempts = self.attempts.max(1);
        let attempt = Cell::new(0u32);

        let result = backoff::retry_notify(
            Constant::new(self.delay),
            || {
                attempt.set(attempt.get() + 1);
                op().map_err(|err| {
                    if attempt.get() >= max_attempts {
                        backoff::Error::permanent(err)
                    } else {
                        backoff::Error::transient(err)
                    }
                })
            },
            |err: E, wait: Duration| {
                tracing::warn!(
                    operation = what,
                    attempt = attempt.get(),
                    max_attempts,
                    retry_in_ms = wait.as_millis() as u64,
                    error = %err,
                    "operation failed, retrying"
                );
            },
        );

        result.map_err(|err| match err {
            backoff::Error::Permanent(err) => err,
            backoff::Error::Transient { err, .. } => err,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn succeeds_without_retry() {
        let mut calls = 0;
        let result: Result<u32, String> = fast(2).run("noop", || {
            calls += 1;
            Ok(7)
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn retries_once_then_succeeds() {
        let mut calls = 0;
        let result: Result<&str, String> = fast(2).run("flaky", || {
            calls += 1;
            if calls == 1 {
                Err("busy".to_string())
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls, 2);
    }

    #[test]
    fn gives_up_after_configured_attempts() {
        let mut calls = 0;
        let result: Result<(), String> = fast(2).run("broken", || {
            calls += 1;
            Err(format!("failure {calls}"))
        });
        assert_eq!(result.unwrap_err(), "failure 2");
        assert_eq!(calls, 2);
    }

    #[test]
    fn none_policy_attempts_once() {
        let mut calls = 0;
        let result: Result<(), String> = RetryPolicy::none().run("once", || {
            calls += 1;
            Err("nope".to_string())
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
