//! Error types for the evolutionary loop, task runner and configuration
//! loader.
//!
//! Grounded on `shnn-runtime::error`'s `thiserror`-enum shape (named
//! variants, constructor helpers, a crate-local `Result<T>` alias); the
//! variants themselves map onto spec.md §7's error kinds rather than the
//! teacher's neuromorphic-storage ones.

use thiserror::Error;

/// Result type for `evo-runtime` operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors surfaced by the evolutionary loop and task runner.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The configuration document failed validation. Carries every failed
    /// check, not just the first (§7: "reported en masse").
    #[error("configuration error(s):\n{}", .reasons.join("\n"))]
    Configuration {
        /// One message per failed validation check.
        reasons: Vec<String>,
    },

    /// The initial population could not be built (e.g. the species count
    /// could not be satisfied without duplicate genomes). Fatal for the
    /// current run only; the run is abandoned and recorded as zero
    /// successes.
    #[error("run initialisation failed: {reason}")]
    InitialisationFailed {
        /// Why the initial population could not be built.
        reason: String,
    },

    /// A lower-layer data-model error propagated up uninterpreted.
    #[error(transparent)]
    Core(#[from] evo_core::CoreError),

    /// The worker pool was asked to enqueue a task after `stop()`.
    #[error("worker pool has been stopped")]
    PoolStopped,

    /// A species/genome lookup failed in a place the registry's own
    /// invariants should have prevented (referential integrity violation —
    /// see spec.md §8 invariant 4). Indicates a logic bug if ever observed.
    #[error("registry integrity violation: {reason}")]
    RegistryIntegrity {
        /// Description of the violated invariant.
        reason: String,
    },
}

impl RuntimeError {
    /// Build a [`RuntimeError::Configuration`] from a non-empty list of
    /// failed checks.
    pub fn configuration(reasons: Vec<String>) -> Self {
        Self::Configuration { reasons }
    }

    /// Build a [`RuntimeError::InitialisationFailed`].
    pub fn initialisation_failed(reason: impl Into<String>) -> Self {
        Self::InitialisationFailed {
            reason: reason.into(),
        }
    }

    /// Build a [`RuntimeError::RegistryIntegrity`].
    pub fn registry_integrity(reason: impl Into<String>) -> Self {
        Self::RegistryIntegrity {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_joins_every_reason() {
        let err = RuntimeError::configuration(vec!["a".into(), "b".into()]);
        let msg = format!("{err}");
        assert!(msg.contains('a') && msg.contains('b'));
    }

    #[test]
    fn core_error_wraps_transparently() {
        let core = evo_core::CoreError::structural_rejection("cycle");
        let err: RuntimeError = core.into();
        assert!(format!("{err}").contains("structural rejection"));
    }
}
