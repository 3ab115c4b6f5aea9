//! Missing-key tracking and batched telemetry reporting

use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::locale::LocaleCode;

/// Sink for missing-translation reports
///
/// Fire-and-forget: implementations swallow their own failures; a lost
/// report only delays the authoring team noticing a gap.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn report_missing_keys(&self, keys: Vec<String>, locale: LocaleCode, app_version: &str);
}

/// Sink that drops every report (standalone/offline use)
pub struct NoopTelemetry;

#[async_trait]
impl TelemetrySink for NoopTelemetry {
    async fn report_missing_keys(
        &self,
        keys: Vec<String>,
        locale: LocaleCode,
        _app_version: &str,
    ) {
        debug!(count = keys.len(), %locale, "dropping missing-key report (noop sink)");
    }
}

struct TrackerState {
    keys: HashSet<String>,
    last_report: Instant,
}

/// Deduplicated set of keys requested but unresolved this session
///
/// A batch becomes due once `batch_size` keys accumulate or
/// `flush_interval` has passed since the last report while any keys are
/// pending. The coordinator's background flusher drains due batches and
/// hands them to the [`TelemetrySink`]; recording itself is synchronous
/// and lock-cheap so `lookup` never suspends.
pub struct MissingKeyTracker {
    state: Mutex<TrackerState>,
    batch_size: usize,
    flush_interval: Duration,
}

impl MissingKeyTracker {
    pub fn new(batch_size: usize, flush_interval: Duration) -> Self {
        Self {
            state: Mutex::new(TrackerState {
                keys: HashSet::new(),
                last_report: Instant::now(),
            }),
            batch_size,
            flush_interval,
        }
    }

    /// Record a key that failed every lookup fallback; returns true when
    /// the key was newly recorded.
    pub fn record(&self, key: &str) -> bool {
        self.state.lock().keys.insert(key.to_string())
    }

    /// Number of pending keys
    pub fn pending(&self) -> usize {
        self.state.lock().keys.len()
    }

    /// Drain the pending set if a batch is due, resetting the timer
    pub fn take_batch_if_due(&self) -> Option<Vec<String>> {
        let mut state = self.state.lock();
        if state.keys.is_empty() {
            return None;
        }
        let due = state.keys.len() >= self.batch_size
            || state.last_report.elapsed() >= self.flush_interval;
        if !due {
            return None;
        }
        state.last_report = Instant::now();
        Some(state.keys.drain().collect())
    }

    /// Drain everything regardless of thresholds (used at shutdown)
    pub fn take_all(&self) -> Vec<String> {
        let mut state = self.state.lock();
        state.last_report = Instant::now();
        state.keys.drain().collect()
    }

    /// Forget every pending key (locale change)
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.keys.clear();
        state.last_report = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deduplicates() {
        let tracker = MissingKeyTracker::new(10, Duration::from_secs(30));
        assert!(tracker.record("common.missing"));
        assert!(!tracker.record("common.missing"));
        assert_eq!(tracker.pending(), 1);
    }

    #[test]
    fn test_batch_due_on_size_threshold() {
        let tracker = MissingKeyTracker::new(3, Duration::from_secs(3600));
        tracker.record("a");
        tracker.record("b");
        assert!(tracker.take_batch_if_due().is_none());
        tracker.record("c");
        let batch = tracker.take_batch_if_due().unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn test_batch_due_on_time_threshold() {
        let tracker = MissingKeyTracker::new(100, Duration::from_millis(0));
        tracker.record("a");
        let batch = tracker.take_batch_if_due().unwrap();
        assert_eq!(batch, vec!["a".to_string()]);
    }

    #[test]
    fn test_empty_set_is_never_due() {
        let tracker = MissingKeyTracker::new(1, Duration::from_millis(0));
        assert!(tracker.take_batch_if_due().is_none());
    }

    #[test]
    fn test_clear_on_locale_change() {
        let tracker = MissingKeyTracker::new(1, Duration::from_secs(30));
        tracker.record("a");
        tracker.clear();
        assert_eq!(tracker.pending(), 0);
    }
}
