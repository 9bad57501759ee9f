/*
[INPUT]:  A fallible async operation, attempt bound, backoff function, cancellation token
[OUTPUT]: The first successful result, or the last error once attempts are exhausted
[POS]:    Shared helper - bounded retry with backoff (gateway initialization and future callers)
[UPDATE]: When changing backoff shape or cancellation semantics
*/

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Bounded retry parameters.
///
/// `backoff(n)` is the wait after the `n`-th failed attempt (1-based).
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: fn(u32) -> Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: fn(u32) -> Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// 3 attempts, waiting 2s then 4s (8s would follow a third failure if the bound were higher)
    pub fn exponential() -> Self {
        Self::new(3, exponential_backoff)
    }

    /// One attempt, no waiting
    pub fn single() -> Self {
        Self::new(1, no_backoff)
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        (self.backoff)(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential()
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("first_delay", &self.delay_after(1))
            .finish()
    }
}

/// `2^attempt` seconds, capped at 64s
pub fn exponential_backoff(attempt: u32) -> Duration {
    let exp = attempt.min(6);
    Duration::from_secs(1u64 << exp)
}

pub fn no_backoff(_attempt: u32) -> Duration {
    Duration::ZERO
}

#[derive(Debug)]
pub enum RetryError<E> {
    Exhausted { attempts: u32, last: E },
    Cancelled { attempts: u32 },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted { attempts, last } => {
                write!(f, "gave up after {attempts} attempt(s): {last}")
            }
            RetryError::Cancelled { attempts } => {
                write!(f, "cancelled after {attempts} attempt(s)")
            }
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}

/// Run `op` until it succeeds, `policy.max_attempts` is reached, or `cancel` fires.
///
/// Cancellation is observed before each attempt and during backoff sleeps;
/// an attempt that is already running is awaited to completion.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    label: &str,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled { attempts: attempt });
        }

        attempt += 1;
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(label, attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                if attempt >= policy.max_attempts {
                    warn!(label, attempt, max_attempts = policy.max_attempts, error = %err, "giving up");
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: err,
                    });
                }

                let delay = policy.delay_after(attempt);
                warn!(label, attempt, ?delay, error = %err, "attempt failed; retrying with backoff");

                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(RetryError::Cancelled { attempts: attempt });
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    #[test]
    fn exponential_backoff_doubles_from_two_seconds() {
        assert_eq!(exponential_backoff(1), Duration::from_secs(2));
        assert_eq!(exponential_backoff(2), Duration::from_secs(4));
        assert_eq!(exponential_backoff(3), Duration::from_secs(8));
        assert_eq!(exponential_backoff(20), Duration::from_secs(64));
    }

    #[test]
    fn policy_never_allows_zero_attempts() {
        assert_eq!(RetryPolicy::new(0, no_backoff).max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_stops_at_max_attempts_and_waits_between() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();
        let cancel = CancellationToken::new();

        let starts = Arc::new(std::sync::Mutex::new(Vec::new()));
        let result: Result<(), RetryError<String>> = retry_with_backoff(
            RetryPolicy::exponential(),
            &cancel,
            "test",
            |_| {
                let calls = calls.clone();
                let starts = starts.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    starts.lock().unwrap().push(start.elapsed());
                    Err("boom".to_string())
                }
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last, "boom");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let starts = starts.lock().unwrap().clone();
        assert_eq!(starts[1] - starts[0], Duration::from_secs(2));
        assert_eq!(starts[2] - starts[1], Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_returns_first_success() {
        let cancel = CancellationToken::new();
        let result: Result<u32, RetryError<String>> =
            retry_with_backoff(RetryPolicy::exponential(), &cancel, "test", |attempt| async move {
                if attempt < 2 {
                    Err("not yet".to_string())
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_aborts_during_backoff_when_cancelled() {
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            cancel_clone.cancel();
        });

        let result: Result<(), RetryError<String>> =
            retry_with_backoff(RetryPolicy::exponential(), &cancel, "test", |_| async {
                Err("boom".to_string())
            })
            .await;

        assert!(matches!(result, Err(RetryError::Cancelled { attempts: 1 })));
    }
}
