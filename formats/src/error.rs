use thiserror::Error;

/// Errors found while reading the alert feed.
///
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Malformed geometry in {0}: {1}")]
    MalformedGeometry(String, String),
    #[error("Can not decode alert feed: {0}")]
    Decode(#[from] serde_json::Error),
}
