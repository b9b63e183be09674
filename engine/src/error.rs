use thiserror::Error;

use wxplace_sources::FetchError;

#[derive(Debug, Error)]
pub enum EngineStatus {
    /// Fatal, the daemon is expected to stop and be restarted by whoever supervises it.
    #[error("Can not get alerts from {0}: {1}")]
    Fetch(String, #[source] FetchError),
}
