//! Orchestration layer for the neuroevolution platform: configuration
//! loading, the worker pool, species registry, evolutionary loop, and the
//! task runner that ties them together across `conf.task.runs`
//! repetitions.
//!
//! `evo-core` is the pure data model and algorithms (networks, genomes,
//! mutation, evaluation); this crate is everything that needs threads,
//! shared mutable state, or I/O to drive that model through a whole
//! experiment. Grounded on `shnn-runtime::simulation`'s epoch/run stepping
//! and `examples/original_source/src/lib/cortex/{Task.cpp,Env.*}` for the
//! orchestration itself.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod env;
pub mod error;
pub mod history;
pub mod pool;
pub mod species;
pub mod task;

pub use config::Config;
pub use env::{Env, Evaluator, NetId};
pub use error::{Result, RuntimeError};
pub use history::{History, Stat};
pub use pool::WorkerPool;
pub use species::{SpeciesEntry, SpeciesId, SpeciesRegistry};
pub use task::{RunOutcome, Task};

/// Runtime crate version, for reporting in history/champion dumps.
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");
