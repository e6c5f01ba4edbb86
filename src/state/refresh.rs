// Refresh coordinator for the cached K-index readings.
// Serializes fetch attempts and publishes each outcome as a new snapshot.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::cache::{CachePhase, CacheState, SnapshotStore};
use crate::error::FetchError;
use crate::meteoagent::{Day, KIndex, KIndexSource, Readings};

use super::sync::{MetricsSnapshot, RefreshMetrics};

/// Consecutive failures after which failures are logged at error level.
const ESCALATE_AFTER: u32 = 3;

/// Result of a refresh request.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A fetch succeeded and its readings were published.
    Updated(Arc<Readings>),
    /// A fetch failed; previous readings were kept.
    Failed(FetchError),
    /// The last attempt is younger than the refresh interval.
    NotDue,
    /// Another refresh was already running.
    SkippedInFlight,
}

/// Clears the in-flight flag when the attempt ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the cached readings and the only path that mutates them.
pub struct RefreshCoordinator {
    source: Arc<dyn KIndexSource>,
    store: SnapshotStore,
    in_flight: AtomicBool,
    interval: Duration,
    metrics: RefreshMetrics,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("source", &self.source.name())
            .field("interval", &self.interval)
            .field("in_flight", &self.is_refreshing())
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new(source: Arc<dyn KIndexSource>, interval: Duration) -> Self {
        Self {
            source,
            store: SnapshotStore::new(),
            in_flight: AtomicBool::new(false),
            interval,
            metrics: RefreshMetrics::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Cached value for `day`, `None` until the first successful fetch.
    pub fn reading(&self, day: Day) -> Option<KIndex> {
        self.store.load().reading(day)
    }

    pub fn today(&self) -> Option<KIndex> {
        self.reading(Day::Today)
    }

    pub fn tomorrow(&self) -> Option<KIndex> {
        self.reading(Day::Tomorrow)
    }

    /// Current snapshot; identical `Arc` until the next completed attempt.
    pub fn snapshot(&self) -> Arc<CacheState> {
        self.store.load()
    }

    pub fn phase(&self, now: Instant) -> CachePhase {
        self.store.load().phase(now, self.interval)
    }

    pub fn last_error(&self) -> Option<FetchError> {
        self.store.load().last_error.clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Receive every snapshot published after a completed attempt.
    pub fn subscribe(&self) -> watch::Receiver<Arc<CacheState>> {
        self.store.subscribe()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Fetch if an interval has passed since the last attempt and no fetch is running.
    pub async fn refresh_if_due(&self, now: Instant) -> RefreshOutcome {
        self.run(Some(now)).await
    }

    /// Fetch regardless of the cadence, unless a fetch is already running.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        self.run(None).await
    }

    /// Initial refresh at setup. Fails if no readings could be obtained.
    pub async fn first_refresh(&self) -> Result<Arc<Readings>, FetchError> {
        match self.refresh_now().await {
            RefreshOutcome::Updated(readings) => Ok(readings),
            RefreshOutcome::Failed(err) => Err(err),
            RefreshOutcome::NotDue | RefreshOutcome::SkippedInFlight => {
                self.snapshot().readings.clone().ok_or_else(|| {
                    FetchError::Internal("initial refresh already in progress".to_string())
                })
            }
        }
    }

    async fn run(&self, due_at: Option<Instant>) -> RefreshOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            self.metrics.record_skipped();
            return RefreshOutcome::SkippedInFlight;
        };

        // Only this path publishes, and the guard is held, so `current` stays
        // the latest snapshot until we replace it.
        let current = self.store.load();
        if let Some(now) = due_at {
            if !current.is_due(now, self.interval) {
                return RefreshOutcome::NotDue;
            }
        }

        let attempted_at = due_at.unwrap_or_else(Instant::now);
        self.metrics.record_attempt();

        let result = AssertUnwindSafe(self.source.fetch_latest())
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(FetchError::Internal(panic_message(payload))));

        match result {
            Ok((today, tomorrow)) => {
                let readings = Arc::new(Readings::new(today, tomorrow));
                self.store
                    .publish(current.succeeded(Arc::clone(&readings), attempted_at));
                self.metrics.record_success();

                info!(
                    source = self.source.name(),
                    today = today.value(),
                    tomorrow = tomorrow.value(),
                    "K-index readings updated"
                );
                RefreshOutcome::Updated(readings)
            }
            Err(err) => {
                let state = self
                    .store
                    .publish(current.failed(err.clone(), attempted_at));
                self.metrics.record_failure(&err);
                self.log_failure(&err, &state);
                RefreshOutcome::Failed(err)
            }
        }
    }

    fn log_failure(&self, err: &FetchError, state: &CacheState) {
        let failures = state.consecutive_failures;
        let kept = state.readings.is_some();

        if failures >= ESCALATE_AFTER {
            error!(
                source = self.source.name(),
                kind = err.kind(),
                error = %err,
                consecutive_failures = failures,
                stale_readings_kept = kept,
                "K-index refresh keeps failing"
            );
        } else {
            warn!(
                source = self.source.name(),
                kind = err.kind(),
                error = %err,
                consecutive_failures = failures,
                stale_readings_kept = kept,
                "K-index refresh failed, retrying next cycle"
            );
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "fetch panicked".to_string())
}
