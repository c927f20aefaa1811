// src/exec/mod.rs

//! Remote task execution.
//!
//! - [`task`] resolves which script to run from the build mode.
//! - [`executor`] runs it inside the runtime container through the
//!   [`crate::cluster::ClusterClient`] exec capability.

pub mod executor;
pub mod task;

pub use executor::TaskExecutor;
pub use task::TaskCommand;
