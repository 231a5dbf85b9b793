//! Error handling for the `evo` CLI binary.
//!
//! Grounded on `shnn-cli::error`'s `thiserror`-enum shape (named variants,
//! constructor helpers, a crate-local `Result<T>` alias); `evo-cli` keeps
//! `shnn-cli`'s use of `anyhow` for top-level glue (SPEC_FULL.md §1), while
//! `evo-core`/`evo-runtime` stay `anyhow`-free.

use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors surfaced at the CLI edge.
#[derive(Error, Debug)]
pub enum CliError {
    /// The configuration document failed validation; every failed check is
    /// collected before reporting, per spec.md §7.
    #[error("configuration error(s):\n{}", .reasons.join("\n"))]
    Configuration {
        /// One message per failed validation check.
        reasons: Vec<String>,
    },

    /// The selected `task.type` has no built-in evaluator wired into this
    /// binary (spec.md §1 treats the evaluator itself as an external
    /// collaborator; `evo run` only ships the literal XOR scenario from
    /// spec.md §8.10 out of the box).
    #[error("unsupported task: {0}")]
    UnsupportedTask(String),

    /// A lower-layer runtime error (configuration, initialisation, core
    /// data-model) propagated up uninterpreted.
    #[error(transparent)]
    Runtime(#[from] evo_runtime::RuntimeError),

    /// Filesystem I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CLI's own preferences file failed to parse.
    #[error("preferences file error: {0}")]
    Preferences(#[from] toml::de::Error),

    /// Could not determine a default preferences-file location.
    #[error("{0}")]
    NoConfigDir(String),

    /// Catch-all for top-level glue code, matching `shnn-cli`'s use of
    /// `anyhow::Error` for the same purpose.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Build a [`CliError::Configuration`] from a non-empty list of failed
    /// checks.
    pub fn configuration(reasons: Vec<String>) -> Self {
        Self::Configuration { reasons }
    }

    /// Build a [`CliError::UnsupportedTask`].
    pub fn unsupported_task(reason: impl Into<String>) -> Self {
        Self::UnsupportedTask(reason.into())
    }
}
