//! Trailing-edge debouncing.

use std::hash::Hash;
use std::time::{Duration, Instant};

use indexmap::IndexMap;

/// Collects keyed updates until the stream goes quiet for `window`.
///
/// Every push moves the deadline to `now + window`; a later value for the
/// same key replaces the earlier one but keeps its position. Callers pass
/// the current instant explicitly.
#[derive(Debug)]
pub struct Debouncer<K, V> {
    window: Duration,
    pending: IndexMap<K, V>,
    deadline: Option<Instant>,
}

impl<K: Hash + Eq, V> Debouncer<K, V> {
    /// Create a debouncer with the given quiet window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: IndexMap::new(),
            deadline: None,
        }
    }

    /// Record an update and restart the window.
    pub fn push(&mut self, key: K, value: V, now: Instant) {
        self.pending.insert(key, value);
        self.deadline = Some(now + self.window);
    }

    /// Pending value for `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.pending.get(key)
    }

    /// When the pending batch becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Number of pending keys.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take the batch if the window has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<Vec<(K, V)>> {
        match self.deadline {
            Some(deadline) if now >= deadline => Some(self.flush()),
            _ => None,
        }
    }

    /// Take the batch regardless of the window.
    pub fn flush(&mut self) -> Vec<(K, V)> {
        self.deadline = None;
        self.pending.drain(..).collect()
    }

    /// Drop everything pending.
    pub fn clear(&mut self) {
        self.deadline = None;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(100);

    #[test]
    fn test_not_due_inside_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.push("a", 1, start);

        assert!(debouncer.take_due(start + Duration::from_millis(99)).is_none());
        assert_eq!(debouncer.len(), 1);
        assert_eq!(debouncer.take_due(start + WINDOW), Some(vec![("a", 1)]));
        assert!(debouncer.is_empty());
        assert!(debouncer.deadline().is_none());
    }

    #[test]
    fn test_push_restarts_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.push("a", 1, start);
        debouncer.push("b", 2, start + Duration::from_millis(80));

        assert!(debouncer.take_due(start + Duration::from_millis(150)).is_none());
        let batch = debouncer.take_due(start + Duration::from_millis(180)).unwrap();
        assert_eq!(batch, vec![("a", 1), ("b", 2)]);
    }

    #[test]
    fn test_repeated_key_coalesces() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.push("a", 1, start);
        debouncer.push("b", 2, start);
        debouncer.push("a", 3, start);

        assert_eq!(debouncer.flush(), vec![("a", 3), ("b", 2)]);
    }

    #[test]
    fn test_empty_is_never_due() {
        let mut debouncer: Debouncer<&str, u8> = Debouncer::new(WINDOW);
        assert!(debouncer.take_due(Instant::now() + WINDOW * 10).is_none());
    }
}
