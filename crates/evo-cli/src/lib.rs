//! `evo` — the command-line front-end for the neuroevolution platform.
//!
//! Wraps [`evo_runtime::Task`] with the three subcommands described in the
//! external-interfaces section of the project specification:
//!
//! - `evo init` writes a default experiment configuration document.
//! - `evo inspect` validates a configuration document without running it.
//! - `evo run` runs a configuration document to completion and reports
//!   the resulting [`evo_runtime::History`].
//!
//! The experiment configuration document itself (`evo_runtime::Config`)
//! is this crate's only mutable external state; the CLI's own
//! preferences file ([`config::CliConfig`]) is a separate, much smaller
//! concern.

pub mod commands;
pub mod config;
pub mod error;

pub use commands::Cli;
pub use error::{CliError, CliResult};
