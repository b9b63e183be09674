//! Data formats for wxplace
//!
//! - the input side: active alerts from the NWS API (`alert`),
//! - the output side: the placefile text format (`placefile`),
//! - and what sits in between: drawing rules (`style`) and the conversion itself (`builder`).
//!

// Re-export for convenience
//
pub use alert::*;
pub use builder::*;
pub use error::*;
pub use placefile::*;
pub use point::*;
pub use style::*;

mod alert;
mod builder;
mod error;
mod placefile;
mod point;
mod style;

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
