//! Per-key de-duplication of in-flight work.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

/// Collapses concurrent calls for the same key into a single execution.
///
/// The first caller for a key runs the work; callers that arrive while it is
/// running wait and receive a clone of the same output. Once the work finishes
/// the key is released, so later callers start a new flight.
pub struct SingleFlight<K, T> {
    inflight: Mutex<HashMap<K, Arc<OnceCell<T>>>>,
}

impl<K, T> SingleFlight<K, T>
where
    K: Hash + Eq + Clone,
    T: Clone,
{
    /// Create an empty single-flight group.
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Run `work` for `key`, or join a flight already running for it.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let cell = {
            let mut inflight = self.inflight.lock();
            let cell = inflight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()));
            // Finished but not yet released by its leader.
            if cell.initialized() {
                *cell = Arc::new(OnceCell::new());
            }
            cell.clone()
        };

        let output = cell.get_or_init(work).await.clone();

        let mut inflight = self.inflight.lock();
        if inflight
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, &cell))
        {
            inflight.remove(&key);
        }

        output
    }

    /// Number of keys currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inflight.lock().len()
    }
}

impl<K, T> Default for SingleFlight<K, T>
where
    K: Hash + Eq + Clone,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_calls_share_one_execution() {
        let flight = Arc::new(SingleFlight::<String, u32>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks = (0..8).map(|_| {
            let flight = flight.clone();
            let calls = calls.clone();
            async move {
                flight
                    .run("route".to_string(), || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        42
                    })
                    .await
            }
        });

        let results = futures::future::join_all(tasks).await;
        assert!(results.iter().all(|r| *r == 42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let flight = SingleFlight::<&'static str, &'static str>::new();
        let a = flight.run("a", || async { "A" });
        let b = flight.run("b", || async { "B" });
        let (a, b) = futures::join!(a, b);
        assert_eq!((a, b), ("A", "B"));
    }

    #[tokio::test]
    async fn test_sequential_calls_start_new_flights() {
        let flight = SingleFlight::<u8, usize>::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            flight
                .run(1, || async { calls.fetch_add(1, Ordering::SeqCst) })
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_finished_flight_is_not_joined() {
        let flight = SingleFlight::<u8, u8>::new();
        flight
            .inflight
            .lock()
            .insert(1, Arc::new(OnceCell::new_with(Some(1))));

        assert_eq!(flight.run(1, || async { 2 }).await, 2);
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_shared() {
        let flight = Arc::new(SingleFlight::<u8, Result<u8, String>>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks = (0..4).map(|_| {
            let flight = flight.clone();
            let calls = calls.clone();
            async move {
                flight
                    .run(7, || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Err("boom".to_string())
                    })
                    .await
            }
        });

        let results = futures::future::join_all(tasks).await;
        assert!(results.iter().all(|r| r.as_ref().unwrap_err() == "boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
