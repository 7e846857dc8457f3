//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the SDK.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data Model
//! - [`Signal`] and [`Trace`] are immutable records built by the client
//! - [`Record`] is the `Signal | Trace` sum type stored in a [`Batch`]
//! - [`Value`] carries arbitrary payloads, including bytes and timestamps
//!
//! ## Time Model
//! - Batch creation time is a millisecond reading taken from the accumulator clock
//! - Record timestamps (`time` property) are wall-clock UTC

mod batch;
mod config;
mod error;
mod headers;
mod record;
mod transport;
mod value;

pub use batch::*;
pub use config::*;
pub use error::*;
pub use headers::*;
pub use record::*;
pub use transport::*;
pub use value::*;
