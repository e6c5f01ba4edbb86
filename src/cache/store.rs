// In-memory snapshot store for K-index readings.
// Readers load an immutable snapshot; the refresh path swaps in a new one.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::FetchError;
use crate::meteoagent::{Day, KIndex, Readings};

/// Slack allowed when a scheduler tick lands marginally early.
pub const SCHEDULE_JITTER: Duration = Duration::from_secs(5);

/// Lifecycle phase derived from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePhase {
    /// Never fetched successfully.
    Empty,
    /// Readings younger than the refresh interval and last attempt succeeded.
    Fresh,
    /// Readings are due for refresh or the last attempt failed.
    Stale,
}

/// One immutable generation of cached state.
#[derive(Debug, Clone, Default)]
pub struct CacheState {
    /// Last successful readings. Both values always come from one fetch.
    pub readings: Option<Arc<Readings>>,
    /// When the last attempt started, successful or not.
    pub last_attempt: Option<Instant>,
    /// Error from the last attempt, cleared on success.
    pub last_error: Option<FetchError>,
    /// Failed attempts since the last success.
    pub consecutive_failures: u32,
}

impl CacheState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn reading(&self, day: Day) -> Option<KIndex> {
        self.readings.as_ref().map(|r| r.get(day))
    }

    /// Snapshot after a successful attempt.
    pub fn succeeded(&self, readings: Arc<Readings>, attempted_at: Instant) -> Self {
        Self {
            readings: Some(readings),
            last_attempt: Some(attempted_at),
            last_error: None,
            consecutive_failures: 0,
        }
    }

    /// Snapshot after a failed attempt. Previous readings are carried over.
    pub fn failed(&self, error: FetchError, attempted_at: Instant) -> Self {
        Self {
            readings: self.readings.clone(),
            last_attempt: Some(attempted_at),
            last_error: Some(error),
            consecutive_failures: self.consecutive_failures.saturating_add(1),
        }
    }

    /// Age of the readings at `now`, if any.
    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.readings
            .as_ref()
            .map(|r| now.saturating_duration_since(r.received))
    }

    pub fn phase(&self, now: Instant, interval: Duration) -> CachePhase {
        match self.age(now) {
            None => CachePhase::Empty,
            Some(age) if age < interval && self.last_error.is_none() => CachePhase::Fresh,
            Some(_) => CachePhase::Stale,
        }
    }

    /// Whether a new attempt is due. Measured from the last attempt, not the
    /// last success, so failures wait a full interval too.
    pub fn is_due(&self, now: Instant, interval: Duration) -> bool {
        match self.last_attempt {
            None => true,
            Some(at) => now.saturating_duration_since(at) + SCHEDULE_JITTER >= interval,
        }
    }
}

/// Shared holder of the current [`CacheState`].
#[derive(Debug)]
pub struct SnapshotStore {
    current: ArcSwap<CacheState>,
    notify: watch::Sender<Arc<CacheState>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        let initial = Arc::new(CacheState::empty());
        let (notify, _) = watch::channel(Arc::clone(&initial));
        Self {
            current: ArcSwap::new(initial),
            notify,
        }
    }

    /// Current snapshot. Never blocks.
    pub fn load(&self) -> Arc<CacheState> {
        self.current.load_full()
    }

    /// Replace the snapshot as a unit and notify subscribers.
    pub fn publish(&self, state: CacheState) -> Arc<CacheState> {
        let state = Arc::new(state);
        self.current.store(Arc::clone(&state));
        self.notify.send_replace(Arc::clone(&state));
        state
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<CacheState>> {
        self.notify.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    const INTERVAL: Duration = Duration::from_secs(30 * 60);

    fn readings(today: u8, tomorrow: u8) -> Arc<Readings> {
        Arc::new(Readings::new(
            KIndex::new(today).unwrap(),
            KIndex::new(tomorrow).unwrap(),
        ))
    }

    #[test]
    fn test_empty_state() {
        let state = CacheState::empty();
        assert_eq!(state.reading(Day::Today), None);
        assert_eq!(state.reading(Day::Tomorrow), None);
        assert_eq!(state.phase(Instant::now(), INTERVAL), CachePhase::Empty);
        assert!(state.is_due(Instant::now(), INTERVAL));
    }

    #[test]
    fn test_failure_preserves_readings() {
        let now = Instant::now();
        let ok = CacheState::empty().succeeded(readings(3, 5), now);
        let failed = ok.failed(TransportError::Timeout.into(), now);

        assert!(Arc::ptr_eq(
            ok.readings.as_ref().unwrap(),
            failed.readings.as_ref().unwrap()
        ));
        assert_eq!(failed.reading(Day::Today).map(KIndex::value), Some(3));
        assert_eq!(failed.consecutive_failures, 1);
        assert_eq!(failed.phase(now, INTERVAL), CachePhase::Stale);
    }

    #[test]
    fn test_success_clears_error() {
        let now = Instant::now();
        let failed = CacheState::empty().failed(TransportError::Timeout.into(), now);
        assert_eq!(failed.phase(now, INTERVAL), CachePhase::Empty);

        let ok = failed.succeeded(readings(4, 2), now);
        assert!(ok.last_error.is_none());
        assert_eq!(ok.consecutive_failures, 0);
        assert_eq!(ok.phase(now, INTERVAL), CachePhase::Fresh);
    }

    #[test]
    fn test_readings_go_stale_after_interval() {
        let now = Instant::now();
        let state = CacheState::empty().succeeded(readings(3, 5), now);
        let later = state.readings.as_ref().unwrap().received + INTERVAL;
        assert_eq!(state.phase(later, INTERVAL), CachePhase::Stale);
    }

    #[test]
    fn test_due_measured_from_last_attempt() {
        let start = Instant::now();
        let state = CacheState::empty().failed(TransportError::Timeout.into(), start);

        assert!(!state.is_due(start + Duration::from_secs(60), INTERVAL));
        assert!(state.is_due(start + INTERVAL, INTERVAL));
        assert!(state.is_due(start + INTERVAL - Duration::from_secs(1), INTERVAL));
    }

    #[test]
    fn test_store_publish_swaps_snapshot() {
        let store = SnapshotStore::new();
        let before = store.load();
        assert!(Arc::ptr_eq(&before, &store.load()));

        let published = store.publish(before.succeeded(readings(3, 5), Instant::now()));
        let after = store.load();

        assert!(Arc::ptr_eq(&published, &after));
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(before.readings.is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_published_snapshot() {
        let store = SnapshotStore::new();
        let mut rx = store.subscribe();

        store.publish(CacheState::empty().succeeded(readings(6, 7), Instant::now()));
        rx.changed().await.unwrap();

        assert_eq!(
            rx.borrow().reading(Day::Tomorrow).map(KIndex::value),
            Some(7)
        );
    }
}
