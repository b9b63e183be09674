//! Module to deal with the collaborators of the refresh engine:
//!
//! - the feed we fetch alerts from (`Fetchable`),
//! - the place we keep the last raw payload in (`Snapshot`).
//!

use std::fmt::Debug;

use async_trait::async_trait;

// Re-export these modules for a shorted import path.
//
pub use error::*;
pub use nws::*;
pub use snapshot::*;

mod error;
mod nws;
mod snapshot;

/// This trait hides how we connect to the feed and get the raw payload.
///
#[async_trait]
pub trait Fetchable: Debug + Send + Sync {
    /// Return source's name
    fn name(&self) -> String;
    /// Fetch actual data, transport and HTTP errors are reported as such
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// Persistence of the last raw payload.
///
#[async_trait]
pub trait Snapshot: Debug + Send + Sync {
    /// Replace the stored payload
    async fn save(&self, raw: &str) -> Result<(), SnapshotError>;
    /// Return the stored payload, `None` if there is none yet
    async fn load(&self) -> Result<Option<String>, SnapshotError>;
}

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
