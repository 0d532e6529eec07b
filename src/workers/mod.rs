//! # Worker abstractions.
//!
//! - [`Worker`] - trait for implementing async cancelable worker bodies
//! - [`WorkerFn`] - function-based worker implementation
//! - [`WorkerRef`] - shared reference to a worker (`Arc<dyn Worker>`)

mod worker;
mod worker_fn;

pub use worker::{Worker, WorkerRef};
pub use worker_fn::WorkerFn;
