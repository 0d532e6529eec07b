//! # Built-in subscribers
//!
//! - [`LogWriter`]: forwards events to `tracing` with structured fields.

mod log;

pub use log::LogWriter;
