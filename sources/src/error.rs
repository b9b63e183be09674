use thiserror::Error;

/// Errors talking to the feed.  An empty feed is not one of them.
///
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Bad parameter {0}")]
    BadParam(String),
    #[error("HTTP transport error: {0}")]
    Transport(String),
    #[error("HTTP status {0} from {1}")]
    Status(u16, String),
    #[error("Can not decode payload: {0}")]
    Decode(String),
}

/// Errors reading or writing the raw snapshot.
///
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Can not read snapshot {0}: {1}")]
    Read(String, String),
    #[error("Can not write snapshot {0}: {1}")]
    Write(String, String),
}
