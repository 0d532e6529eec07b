//! Runtime core: worker lifecycle and its supervisor.
//!
//! Public API from this module is [`Supervisor`], [`SupervisorBuilder`],
//! [`SingleWorker`], [`Config`] and the state enums.
//!
//! Internal modules:
//! - [`lifecycle`]: start/stop state machine of one worker instance;
//! - [`runner`]: runs one detached body with failure containment and event publishing;
//! - [`state`]: atomic lifecycle state;
//! - [`supervisor`]: creates workers, owns the bus and subscriber fan-out;
//! - [`builder`]: assembles a supervisor.

mod builder;
mod config;
mod lifecycle;
mod runner;
mod state;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::{Config, StopMode};
pub use lifecycle::SingleWorker;
pub use state::WorkerState;
pub use supervisor::Supervisor;
