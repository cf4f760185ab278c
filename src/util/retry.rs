use std::error::Error;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Error fragments that mark a failure as a transient connection problem.
const TRANSIENT_MARKERS: [&str; 5] = [
    "ConnectionReset",
    "BrokenPipe",
    "Interrupted",
    "TimedOut",
    "UnexpectedEof",
];

/// Bounded exponential backoff for transient storage failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero means a single attempt.
    pub max_retries: usize,
    /// Delay before the first retry, doubled for each following one.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn with_base_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }

    /// Delay before retry number `attempt` (zero based), capped at 2^10 times the base.
    pub fn backoff_for(&self, attempt: usize) -> Duration {
        self.base_backoff * (1u32 << attempt.min(10))
    }

    /// Run `operation` until it succeeds, fails with a non-transient error,
    /// or the retry budget is exhausted.
    pub async fn run<F, Fut, T, E>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !is_transient(&e) || attempt >= self.max_retries {
                        return Err(e);
                    }

                    warn!(
                        "Retryable error in {} (attempt {}/{}): {:?}",
                        operation_name,
                        attempt + 1,
                        self.max_retries,
                        e
                    );

                    tokio::time::sleep(self.backoff_for(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Whether an error looks like a dropped or timed out connection.
///
/// Matches on the debug rendering so wrapped io errors deep inside a backend
/// error chain are still recognised.
pub fn is_transient<E: Error>(error: &E) -> bool {
    let error_msg = format!("{:?}", error);
    TRANSIENT_MARKERS
        .iter()
        .any(|marker| error_msg.contains(marker))
}

/// Retry `operation` with the default backoff and the given retry budget.
pub async fn retry_with_max_retries<F, Fut, T, E>(
    max_retries: usize,
    operation_name: &str,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + Send + Sync,
{
    RetryPolicy::new(max_retries)
        .run(operation_name, operation)
        .await
}
