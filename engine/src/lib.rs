//! Refresh engine for wxplace
//!
//! The `Scheduler` owns the feed and the snapshot store and keeps the shared `RefreshState`
//! up to date; anyone serving the document only reads from that state.
//!

pub use error::*;
pub use mode::*;
pub use scheduler::*;
pub use state::*;

mod error;
mod mode;
mod scheduler;
mod state;

const NAME: &str = env!("CARGO_PKG_NAME");
const EVERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> String {
    format!("{}/{}", NAME, EVERSION)
}
