//! Resource waiting with exponential backoff.
//!
//! Provides a generic abstraction for waiting on AWS resources (or any async
//! condition) to become ready, with configurable exponential backoff and jitter.

use anyhow::Result;
use backon::{BackoffBuilder, ExponentialBuilder};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for resource waiting with exponential backoff.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Initial delay between checks
    pub initial_delay: Duration,
    /// Maximum delay between checks (cap for exponential growth)
    pub max_delay: Duration,
    /// Maximum total time to wait before timeout
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Wait for a resource to become ready with exponential backoff.
///
/// `check` returns `Ok(true)` when ready and `Ok(false)` to retry. An error
/// from `check` ends the wait immediately.
///
/// # Example
/// ```ignore
/// wait_for_resource(
///     WaitConfig::default(),
///     || async {
///         let ready = check_if_resource_exists().await;
///         Ok(ready)
///     },
///     "my-resource",
/// ).await?;
/// ```
pub async fn wait_for_resource<F, Fut>(config: WaitConfig, check: F, resource_name: &str) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = std::time::Instant::now();
    let mut attempts = 0u32;

    let mut delays = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_jitter()
        .without_max_times()
        .build();

    loop {
        attempts += 1;

        if start.elapsed() >= config.timeout {
            anyhow::bail!(
                "Timeout waiting for {} after {:?} ({} attempts)",
                resource_name,
                config.timeout,
                attempts - 1
            );
        }

        match check().await {
            Ok(true) => {
                debug!(resource = %resource_name, attempts, "Resource ready");
                return Ok(());
            }
            Ok(false) => {
                let delay = delays.next().unwrap_or(config.max_delay);
                debug!(
                    resource = %resource_name,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Resource not ready, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(resource = %resource_name, error = ?e, "Resource check failed");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> WaitConfig {
        WaitConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_ready_immediately() {
        let calls = AtomicU32::new(0);
        wait_for_resource(
            fast_config(),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(true) }
            },
            "test",
        )
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ready_after_retries() {
        let calls = AtomicU32::new(0);
        wait_for_resource(
            fast_config(),
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n >= 2) }
            },
            "test",
        )
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_check_error_stops_waiting() {
        let calls = AtomicU32::new(0);
        let err = wait_for_resource(
            fast_config(),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(anyhow::anyhow!("describe failed")) }
            },
            "test",
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("describe failed"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout() {
        let config = WaitConfig {
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(10),
            timeout: Duration::from_millis(30),
        };
        let err = wait_for_resource(config, || async { Ok(false) }, "never-ready")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Timeout waiting for never-ready"));
    }
}
