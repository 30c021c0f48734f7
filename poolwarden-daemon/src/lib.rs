#![forbid(unsafe_code)]
//! Poolwarden daemon library: probes, supervision and orchestration of the pool engine.

pub mod api;
pub mod controller;
pub mod errors;
pub mod probe;
pub mod settings_store;
pub mod status;
pub mod supervisor;

pub use controller::{OperationOutcome, OrchestrationController};
pub use errors::{DaemonError, Result};
pub use status::{StatusAggregator, StatusSnapshot};
pub use supervisor::{ExitRecord, ProcessSupervisor};
