//! Bounded, cancellable retry for dialing fabric dependencies.
//!
//! The directory is a dependency worth waiting for, so the default policy
//! retries without an attempt bound. Callers that cannot block forever cap
//! the loop with `max_attempts` or a `deadline`, and every loop can be torn
//! down through its [`CancellationToken`].

use std::future::Future;
use std::time::Duration;

use shared::FabricError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the second attempt; doubles per failure up to `max_backoff`.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Give up after this many attempts. `None` retries indefinitely.
    pub max_attempts: Option<u32>,
    /// Give up once this much time has passed since the first attempt.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            max_attempts: None,
            deadline: None,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn next_backoff(&self, current: Duration) -> Duration {
        (current * 2).min(self.max_backoff)
    }
}

/// Run `attempt` until it succeeds, the policy gives up, or `cancel` fires.
///
/// Connect-level errors between attempts are logged at debug and otherwise
/// swallowed; only the terminal outcome is surfaced.
pub async fn retry_dial<T, F, Fut>(
    addr: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<T, FabricError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<T>>,
{
    let started = Instant::now();
    let mut backoff = policy.initial_backoff;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                tracing::debug!(%addr, attempts, "dial failed: {err}");

                let out_of_attempts = policy
                    .max_attempts
                    .is_some_and(|max| attempts >= max);
                let out_of_time = policy
                    .deadline
                    .is_some_and(|deadline| started.elapsed() >= deadline);
                if out_of_attempts || out_of_time {
                    return Err(FabricError::DialRetryExhausted {
                        addr: addr.to_string(),
                        attempts,
                    });
                }

                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(FabricError::DialCancelled {
                            addr: addr.to_string(),
                        });
                    }
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = policy.next_backoff(backoff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn refused() -> io::Error {
        io::Error::new(io::ErrorKind::ConnectionRefused, "refused")
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let policy = RetryPolicy {
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(300),
            ..Default::default()
        };
        let second = policy.next_backoff(policy.initial_backoff);
        assert_eq!(second, Duration::from_millis(200));
        assert_eq!(policy.next_backoff(second), Duration::from_millis(300));
        assert_eq!(
            policy.next_backoff(Duration::from_millis(300)),
            Duration::from_millis(300)
        );
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let policy = RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            ..Default::default()
        }
        .with_max_attempts(3);
        let cancel = CancellationToken::new();
        let tries = AtomicU32::new(0);

        let result: Result<(), _> = retry_dial("127.0.0.1:1", &policy, &cancel, || {
            tries.fetch_add(1, Ordering::SeqCst);
            async { Err(refused()) }
        })
        .await;

        assert!(matches!(
            result,
            Err(FabricError::DialRetryExhausted { attempts: 3, .. })
        ));
        assert_eq!(tries.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_once_the_dependency_appears() {
        let policy = RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            ..Default::default()
        };
        let cancel = CancellationToken::new();
        let tries = AtomicU32::new(0);

        let value = retry_dial("127.0.0.1:1", &policy, &cancel, || {
            let n = tries.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(refused())
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(tries.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancellation_stops_an_unbounded_loop() {
        let policy = RetryPolicy::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<(), _> =
            retry_dial("127.0.0.1:1", &policy, &cancel, || async { Err(refused()) }).await;

        assert!(matches!(result, Err(FabricError::DialCancelled { .. })));
    }
}
