use std::future::Future;
use std::time::{Duration, Instant};
use tracing::info;

/// Await `operation`, log its wall time under `metric_name`, and hand back
/// both the result and the elapsed duration.
///
/// `trace_log_fn` renders extra context from a successful result into the log line.
pub async fn measure_dur_async<F, Fut, T, E>(
    metric_name: &str,
    operation: F,
    trace_log_fn: Option<fn(&T) -> String>,
) -> (Result<T, E>, Duration)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let result = operation().await;
    let dur = start.elapsed();
    let log_line = result
        .as_ref()
        .ok()
        .and_then(|r| trace_log_fn.map(|f| f(r)))
        .unwrap_or_default();
    info!("{} | {}, took={}", metric_name, log_line, dur.as_millis());
    (result, dur)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_measure_dur_async_passes_result_through() {
        let (result, dur) = measure_dur_async(
            "upload",
            || async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok::<usize, String>(3)
            },
            Some(|n: &usize| format!("bytes={}", n)),
        )
        .await;

        assert_eq!(result, Ok(3));
        assert!(dur >= Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_measure_dur_async_keeps_errors() {
        let (result, _) =
            measure_dur_async("download", || async { Err::<(), _>("boom") }, None).await;
        assert_eq!(result, Err("boom"));
    }
}
