use std::{future::Future, time::Duration};

use common::{
    env_config::JobsConfig,
    error::{AppError, Res},
};

/// Whole-job retry: every attempt gets the same timeout and the same pause before the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub tries: u32,
    pub timeout: Duration,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            tries: 3,
            timeout: Duration::from_secs(120),
            backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &JobsConfig) -> Self {
        Self {
            tries: config.tries.max(1),
            timeout: Duration::from_secs(config.timeout_seconds),
            backoff: Duration::from_secs(config.backoff_seconds),
        }
    }
}

/// Runs `job` until it succeeds or `policy.tries` attempts have failed.
///
/// Validation errors are not retried. The last error is returned once
/// attempts run out.
pub async fn run_with_retry<T, F, Fut>(name: &str, policy: RetryPolicy, mut job: F) -> Res<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Res<T>>,
{
    let tries = policy.tries.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let result = match tokio::time::timeout(policy.timeout, job()).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "{} timed out after {}s",
                name,
                policy.timeout.as_secs_f64()
            ))),
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(err @ AppError::Validation(_)) => {
                log::error!("Job {} rejected: {}", name, err);
                return Err(err);
            }
            Err(err) => err,
        };

        if attempt >= tries {
            log::error!(
                "Job {} failed permanently attempts={}: {}",
                name,
                attempt,
                err
            );
            return Err(err);
        }

        log::warn!(
            "Job {} failed attempt={}/{}, retrying in {}s: {}",
            name,
            attempt,
            tries,
            policy.backoff.as_secs_f64(),
            err
        );
        tokio::time::sleep(policy.backoff).await;
    }
}
