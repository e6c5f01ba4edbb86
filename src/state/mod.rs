// Refresh state management.
// Coordinates fetch attempts against the shared snapshot and drives them on a cadence.

pub mod refresh;
pub mod sync;

pub use refresh::{RefreshCoordinator, RefreshOutcome};
pub use sync::{MetricsSnapshot, RefreshMetrics, RefreshTask, spawn_refresh_loop};
