//! Error types for the data model and evaluation engine.

use thiserror::Error;

/// Result type for `evo-core` operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors surfaced by the data model and evaluation engine.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A structural mutation (add/erase link or node) was rejected.
    ///
    /// Non-fatal: callers retry the mutation with another random choice.
    #[error("structural rejection: {reason}")]
    StructuralRejection {
        /// Why the mutation was rejected.
        reason: String,
    },

    /// A parameter definition or value violated its declared bounds.
    #[error("invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name.
        parameter: String,
        /// Offending value, formatted.
        value: String,
        /// Constraint description.
        constraint: String,
    },

    /// A genome or layer definition could not be realized as a network.
    #[error("invalid topology: {reason}")]
    InvalidTopology {
        /// Reason the topology could not be built or evaluated.
        reason: String,
    },

    /// `evaluate` was called with an input vector of the wrong length.
    #[error("sample has {got} input(s), network expects {expected}")]
    SampleShapeMismatch {
        /// Length the network's input layer expects.
        expected: usize,
        /// Length actually supplied.
        got: usize,
    },

    /// A numerical computation produced a non-finite value.
    #[error("numerical error: {reason}")]
    NumericalError {
        /// Description of the offending computation.
        reason: String,
    },
}

impl CoreError {
    /// Build a [`CoreError::StructuralRejection`].
    pub fn structural_rejection(reason: impl Into<String>) -> Self {
        Self::StructuralRejection {
            reason: reason.into(),
        }
    }

    /// Build a [`CoreError::InvalidParameter`].
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Build a [`CoreError::InvalidTopology`].
    pub fn invalid_topology(reason: impl Into<String>) -> Self {
        Self::InvalidTopology {
            reason: reason.into(),
        }
    }

    /// Build a [`CoreError::NumericalError`].
    pub fn numerical_error(reason: impl Into<String>) -> Self {
        Self::NumericalError {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_produce_expected_variants() {
        let err = CoreError::structural_rejection("cycle");
        assert!(matches!(err, CoreError::StructuralRejection { .. }));

        let err = CoreError::invalid_parameter("tau", "-1.0", "> 0.0");
        assert!(matches!(err, CoreError::InvalidParameter { .. }));
    }

    #[test]
    fn display_includes_context() {
        let err = CoreError::SampleShapeMismatch {
            expected: 4,
            got: 2,
        };
        let msg = format!("{err}");
        assert!(msg.contains('4') && msg.contains('2'));
    }
}
