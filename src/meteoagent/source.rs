// Source abstraction for K-index readings.
// The refresh coordinator depends on this trait, not on the HTTP client.

use async_trait::async_trait;

use crate::error::FetchError;

use super::types::KIndex;

/// Something that can produce a fresh `(today, tomorrow)` pair.
#[async_trait]
pub trait KIndexSource: Send + Sync {
    /// Perform exactly one fetch attempt. Implementations must not retry.
    async fn fetch_latest(&self) -> Result<(KIndex, KIndex), FetchError>;

    /// Name used in log fields.
    fn name(&self) -> &'static str {
        "kindex"
    }
}
