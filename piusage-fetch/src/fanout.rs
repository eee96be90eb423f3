//! Concurrent fetches with per-call and group timeouts.
//!
//! Every call in a group runs concurrently under its own timeout. The group
//! as a whole is bounded by a ceiling; when it passes, every call still
//! pending is replaced by a fallback value and dropped. One slow provider
//! therefore degrades only its own slot.

use std::future::Future;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::FetchError;

/// Runs `fut` under `timeout`, mapping expiry to [`FetchError::Timeout`].
pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            debug!(timeout_ms = timeout.as_millis(), "Call timed out");
            Err(FetchError::Timeout)
        }
    }
}

/// Awaits all `futures`, substituting `on_timeout(index)` for any still
/// pending when `ceiling` passes. Results keep the input order.
pub async fn join_with_ceiling<T, F>(
    futures: Vec<F>,
    ceiling: Duration,
    on_timeout: impl Fn(usize) -> T,
) -> Vec<T>
where
    F: Future<Output = T>,
{
    let count = futures.len();
    let mut slots: Vec<Option<T>> = (0..count).map(|_| None).collect();
    let mut pending: FuturesUnordered<_> = futures
        .into_iter()
        .enumerate()
        .map(|(index, fut)| async move { (index, fut.await) })
        .collect();

    // Ceilings too large to represent mean no ceiling.
    let deadline = Instant::now().checked_add(ceiling);
    loop {
        let next = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, pending.next()).await,
            None => Ok(pending.next().await),
        };
        match next {
            Ok(Some((index, value))) => slots[index] = Some(value),
            Ok(None) => break,
            Err(_) => {
                warn!(
                    pending = pending.len(),
                    ceiling_ms = ceiling.as_millis(),
                    "Fetch group hit its ceiling"
                );
                break;
            }
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.unwrap_or_else(|| on_timeout(index)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, FetchError>(1)
        };
        assert_eq!(
            with_timeout(Duration::from_millis(20), slow).await,
            Err(FetchError::Timeout)
        );
    }

    #[tokio::test]
    async fn test_with_timeout_passes_result() {
        let fast = async { Err::<u8, _>(FetchError::Status(500)) };
        assert_eq!(
            with_timeout(Duration::from_secs(1), fast).await,
            Err(FetchError::Status(500))
        );
    }

    #[tokio::test]
    async fn test_ceiling_replaces_only_pending() {
        let delays = [10_u64, 10_000, 20];
        let futures: Vec<_> = delays
            .iter()
            .map(|ms| async move {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                format!("done {ms}")
            })
            .collect();

        let results =
            join_with_ceiling(futures, Duration::from_millis(500), |i| format!("timeout {i}"))
                .await;
        assert_eq!(results, vec!["done 10", "timeout 1", "done 20"]);
    }

    #[tokio::test]
    async fn test_unrepresentable_ceiling_waits_for_all() {
        let futures = vec![
            Box::pin(async { 1_u8 }) as std::pin::Pin<Box<dyn Future<Output = u8> + Send>>,
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                2
            }),
        ];
        let results = join_with_ceiling(futures, Duration::from_secs(u64::MAX), |_| 0).await;
        assert_eq!(results, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_empty_group() {
        let futures: Vec<std::future::Ready<u8>> = Vec::new();
        let results = join_with_ceiling(futures, Duration::from_secs(1), |_| 0).await;
        assert!(results.is_empty());
    }
}
