//! Retrying operations that fail transiently
//!
//! Used where the remedy for a failure is to wait for someone else to make
//! progress, such as publishing into a full broadcast queue.

use std::future::Future;
use std::time::Duration;

/// How often and how patiently to retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(10),
        }
    }
}

/// Run `operation` until it succeeds, fails permanently or runs out of attempts
///
/// Only errors for which `is_transient` returns true are retried; the last
/// error is returned otherwise.
///
/// # Examples
/// ```rust
/// use reactive::core::retry::{retry_async, RetryPolicy};
///
/// # async fn example() -> Result<u32, String> {
/// let value = retry_async(
///     "fetch",
///     RetryPolicy::default(),
///     |_: &String| true,
///     || async { Ok::<u32, String>(7) },
/// )
/// .await?;
/// # Ok(value)
/// # }
/// ```
pub async fn retry_async<T, E, F, Fut, P>(
    operation_name: &str,
    policy: RetryPolicy,
    is_transient: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.max_attempts && is_transient(&error) => {
                log::trace!(
                    "Operation '{}' failed on attempt {}/{}, retrying in {:?}: {}",
                    operation_name,
                    attempt,
                    policy.max_attempts,
                    policy.delay,
                    error
                );
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let attempts = AtomicUsize::new(0);

        let result = retry_async("test", quick(5), |_: &&str| true, || {
            let attempts = &attempts;
            async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("busy")
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let attempts = AtomicUsize::new(0);

        let result: Result<u32, &str> =
            retry_async("test", quick(5), |e: &&str| *e == "busy", || {
                let attempts = &attempts;
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err("closed")
                }
            })
            .await;

        assert_eq!(result, Err("closed"));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let attempts = AtomicUsize::new(0);

        let result: Result<u32, &str> = retry_async("test", quick(2), |_: &&str| true, || {
            let attempts = &attempts;
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err("busy")
            }
        })
        .await;

        assert_eq!(result, Err("busy"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
