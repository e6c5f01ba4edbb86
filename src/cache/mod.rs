// Cache module for the latest K-index readings.
// Holds immutable snapshots that are replaced as a unit after every refresh attempt.

pub mod store;

pub use store::{CachePhase, CacheState, SCHEDULE_JITTER, SnapshotStore};
