//! Geomagnetic K-index readings for today and tomorrow, scraped from the
//! MeteoAgent widget and kept in a shared, periodically refreshed cache.
//!
//! Readers call [`RefreshCoordinator::reading`] at any time; a scheduler calls
//! [`RefreshCoordinator::refresh_if_due`] every 30 minutes, or
//! [`spawn_refresh_loop`] does it on a tokio task.

pub mod cache;
pub mod config;
pub mod error;
pub mod meteoagent;
pub mod sensor;
pub mod state;

pub use cache::{CachePhase, CacheState};
pub use config::Config;
pub use error::{FetchError, KIndexError, ParseError, Result, TransportError};
pub use meteoagent::{Day, KIndex, KIndexSource, MeteoAgentClient, Readings};
pub use sensor::{KIndexSensor, SensorState, Severity};
pub use state::{RefreshCoordinator, RefreshOutcome, RefreshTask, spawn_refresh_loop};
