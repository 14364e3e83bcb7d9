//! Bounded, time-ordered history of stored readings

use std::sync::{Arc, PoisonError, RwLock};

use crate::clock::Clock;
use crate::error::Result;
use crate::history::backend::HistoryBackend;
use crate::history::window::TimeWindow;
use crate::reading::{Reading, StoredReading};

/// Default maximum number of readings kept
pub const DEFAULT_MAX_HISTORY: usize = 500;

/// Append-only history log with FIFO eviction and write-through persistence
///
/// The log is loaded once when the store is opened and kept in memory; every
/// append or clear is written through to the backend before the in-memory
/// copy is swapped, so readers see either the old or the new log in full.
pub struct HistoryStore {
    backend: Box<dyn HistoryBackend>,
    clock: Arc<dyn Clock>,
    capacity: usize,
    cache: RwLock<Vec<StoredReading>>,
}

impl HistoryStore {
    /// Open a store over `backend`, keeping at most `capacity` readings
    ///
    /// Unreadable persisted state is logged and treated as an empty history.
    pub fn open(backend: Box<dyn HistoryBackend>, clock: Arc<dyn Clock>, capacity: usize) -> Self {
        let capacity = capacity.max(1);

        let mut entries = match backend.load() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Ignoring unreadable history, starting empty: {}", e);
                Vec::new()
            }
        };
        truncate_front(&mut entries, capacity);

        tracing::debug!("Opened history with {} readings (capacity {})", entries.len(), capacity);

        Self {
            backend,
            clock,
            capacity,
            cache: RwLock::new(entries),
        }
    }

    /// Stamp `reading` with the current time, append it and persist the log
    pub fn append(&self, reading: Reading) -> Result<StoredReading> {
        let stored = StoredReading::stamp(reading, self.clock.now_millis());

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Vec::with_capacity((cache.len() + 1).min(self.capacity));
        next.extend_from_slice(&cache);
        next.push(stored.clone());

        let evicted = truncate_front(&mut next, self.capacity);
        if evicted > 0 {
            tracing::debug!("Evicted {} oldest readings", evicted);
        }

        self.backend.save(&next)?;
        *cache = next;

        tracing::debug!("Stored reading at {}", stored.date);
        Ok(stored)
    }

    /// Full log, oldest first
    pub fn get_all(&self) -> Vec<StoredReading> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Readings inside `window`, measured back from the clock's current time
    pub fn filter_by_window(&self, window: TimeWindow) -> Vec<StoredReading> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        window.filter(&cache, self.clock.now_millis())
    }

    /// Empty the log, persisted state included
    pub fn clear(&self) -> Result<()> {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        self.backend.clear()?;
        cache.clear();
        tracing::info!("History cleared");
        Ok(())
    }

    /// Number of readings held
    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of readings kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current time according to the store's clock
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }
}

/// Drop entries from the front until at most `capacity` remain
fn truncate_front(entries: &mut Vec<StoredReading>, capacity: usize) -> usize {
    if entries.len() > capacity {
        let drain_count = entries.len() - capacity;
        entries.drain(0..drain_count);
        drain_count
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::history::backend::{JsonFileBackend, MemoryBackend};
    use crate::reading::Parameter;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn memory_store(capacity: usize) -> (HistoryStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = HistoryStore::open(Box::new(MemoryBackend::new()), clock.clone(), capacity);
        (store, clock)
    }

    #[test]
    fn test_append_assigns_timestamp() {
        let (store, clock) = memory_store(10);
        clock.set(1_700_000_123_000);

        let stored = store.append(Reading::new().with(Parameter::Ph, 6.6)).unwrap();
        assert_eq!(stored.timestamp, 1_700_000_123_000);

        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].reading.ph, Some(6.6));
        assert_eq!(all[0].timestamp, 1_700_000_123_000);
    }

    #[test]
    fn test_caller_timestamp_is_ignored() {
        let (store, clock) = memory_store(10);
        let parsed =
            Reading::parse_batch(r#"{"ph": 6.5, "timestamp": 5, "date": "1970-01-01"}"#).unwrap();

        let stored = store.append(parsed[0].clone()).unwrap();
        assert_eq!(stored.timestamp, clock.now_millis());
        assert_ne!(stored.timestamp, 5);
    }

    #[test]
    fn test_fifo_eviction() {
        let (store, clock) = memory_store(3);
        for i in 0..5 {
            clock.advance(1_000);
            store.append(Reading::new().with(Parameter::Tds, i as f64)).unwrap();
        }

        let values: Vec<f64> = store.get_all().iter().filter_map(|r| r.reading.tds).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let clock = Arc::new(ManualClock::new(1_000));

        {
            let backend = JsonFileBackend::new(&path).unwrap();
            let store = HistoryStore::open(Box::new(backend), clock.clone(), 5);
            store.append(Reading::new().with(Parameter::Gas, 101.25)).unwrap();
            store.append(Reading::new().with(Parameter::Gas, 99.75)).unwrap();
        }

        let reopened = HistoryStore::open(Box::new(JsonFileBackend::new(&path).unwrap()), clock, 5);
        let gas: Vec<f64> = reopened.get_all().iter().filter_map(|r| r.reading.gas).collect();
        assert_eq!(gas, vec![101.25, 99.75]);
    }

    #[test]
    fn test_corrupt_state_is_empty() {
        let clock = Arc::new(ManualClock::new(0));
        let store = HistoryStore::open(Box::new(MemoryBackend::with_raw("garbage")), clock, 10);
        assert!(store.is_empty());

        // The store stays usable and overwrites the bad document
        store.append(Reading::new().with(Parameter::Ph, 6.8)).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_oversized_persisted_log_is_truncated() {
        let backend = MemoryBackend::new();
        let entries: Vec<StoredReading> = (0..8)
            .map(|i| StoredReading::stamp(Reading::new().with(Parameter::Ph, i as f64), i))
            .collect();
        backend.save(&entries).unwrap();

        let store = HistoryStore::open(Box::new(backend), Arc::new(ManualClock::new(100)), 5);
        let all = store.get_all();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].timestamp, 3);
    }

    #[test]
    fn test_clear() {
        let (store, _) = memory_store(10);
        store.append(Reading::new().with(Parameter::Ph, 6.6)).unwrap();
        store.clear().unwrap();
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn test_filter_by_window_uses_clock() {
        let (store, clock) = memory_store(10);
        store.append(Reading::new().with(Parameter::Ph, 6.5)).unwrap();
        clock.advance(2 * 60 * 60 * 1000);
        store.append(Reading::new().with(Parameter::Ph, 6.7)).unwrap();

        assert_eq!(store.filter_by_window(TimeWindow::OneHour).len(), 1);
        assert_eq!(store.filter_by_window(TimeWindow::SixHours).len(), 2);
        assert_eq!(store.filter_by_window(TimeWindow::All).len(), 2);
    }

    proptest! {
        #[test]
        fn prop_history_is_bounded(capacity in 1usize..20, appends in 0usize..60) {
            let (store, clock) = memory_store(capacity);
            for i in 0..appends {
                clock.advance(1);
                store.append(Reading::new().with(Parameter::Temperature, i as f64)).unwrap();
            }

            let all = store.get_all();
            prop_assert!(all.len() <= capacity);
            prop_assert_eq!(all.len(), appends.min(capacity));

            // Exactly the most recent entries, oldest first
            let expected: Vec<f64> = (appends.saturating_sub(capacity)..appends)
                .map(|i| i as f64)
                .collect();
            let actual: Vec<f64> = all.iter().filter_map(|r| r.reading.temperature).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
