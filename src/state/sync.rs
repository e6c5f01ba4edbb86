// Background refresh scheduling and metrics.
// Drives the coordinator on a fixed cadence and counts attempt outcomes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::error::FetchError;

use super::refresh::{RefreshCoordinator, RefreshOutcome};

/// Counters collected by the coordinator.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
    attempts: AtomicU64,
    successes: AtomicU64,
    transport_failures: AtomicU64,
    parse_failures: AtomicU64,
    internal_failures: AtomicU64,
    skipped_in_flight: AtomicU64,
}

/// Point-in-time copy of [`RefreshMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub attempts: u64,
    pub successes: u64,
    pub transport_failures: u64,
    pub parse_failures: u64,
    pub internal_failures: u64,
    pub skipped_in_flight: u64,
}

impl MetricsSnapshot {
    pub fn failures(&self) -> u64 {
        self.transport_failures + self.parse_failures + self.internal_failures
    }
}

impl RefreshMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self, error: &FetchError) {
        let counter = match error {
            FetchError::Transport(_) => &self.transport_failures,
            FetchError::Parse(_) => &self.parse_failures,
            FetchError::Internal(_) => &self.internal_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped(&self) {
        self.skipped_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            internal_failures: self.internal_failures.load(Ordering::Relaxed),
            skipped_in_flight: self.skipped_in_flight.load(Ordering::Relaxed),
        }
    }
}

/// Handle to the periodic refresh task.
#[derive(Debug)]
pub struct RefreshTask {
    handle: JoinHandle<()>,
}

impl RefreshTask {
    /// Stop the loop. An in-flight fetch is dropped without touching the cache.
    pub fn shutdown(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawn a task calling `refresh_if_due` on the coordinator's cadence.
/// The first tick fires immediately.
pub fn spawn_refresh_loop(coordinator: Arc<RefreshCoordinator>) -> RefreshTask {
    let period = coordinator.interval();

    let handle = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = period.as_secs(), "K-index refresh loop started");

        loop {
            ticker.tick().await;
            match coordinator.refresh_if_due(Instant::now()).await {
                RefreshOutcome::NotDue => debug!("K-index refresh not due yet"),
                RefreshOutcome::SkippedInFlight => debug!("K-index refresh already running"),
                // Updated and Failed are logged by the coordinator.
                _ => {}
            }
        }
    });

    RefreshTask { handle }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::{ParseError, TransportError};
    use crate::meteoagent::{Day, KIndex};
    use crate::state::refresh::tests::{INTERVAL, ScriptedSource};

    #[test]
    fn test_metrics_count_by_kind() {
        let metrics = RefreshMetrics::new();
        metrics.record_attempt();
        metrics.record_attempt();
        metrics.record_attempt();
        metrics.record_success();
        metrics.record_failure(&TransportError::Timeout.into());
        metrics.record_failure(&ParseError::MissingMarker(Day::Today).into());
        metrics.record_skipped();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.attempts, 3);
        assert_eq!(snapshot.successes, 1);
        assert_eq!(snapshot.transport_failures, 1);
        assert_eq!(snapshot.parse_failures, 1);
        assert_eq!(snapshot.failures(), 2);
        assert_eq!(snapshot.skipped_in_flight, 1);
    }

    #[test]
    fn test_metrics_snapshot_serializes() {
        let json = serde_json::to_value(MetricsSnapshot::default()).unwrap();
        assert_eq!(json["attempts"], 0);
        assert_eq!(json["skipped_in_flight"], 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_refreshes_on_cadence() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok((3, 5)),
            Err(TransportError::Timeout.into()),
            Ok((4, 2)),
        ]));
        let coordinator = Arc::new(RefreshCoordinator::new(source.clone(), INTERVAL));
        let today = || coordinator.reading(Day::Today).map(KIndex::value);

        let task = spawn_refresh_loop(Arc::clone(&coordinator));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(today(), Some(3));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 1);

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(today(), Some(3));
        assert!(coordinator.last_error().is_some());

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(source.calls(), 3);
        assert_eq!(today(), Some(4));

        task.shutdown();
    }
}
