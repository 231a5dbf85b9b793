//! Outcome bookkeeping for a single mutation attempt.
//!
//! Grounded on `examples/original_source/src/lib/core/Mutation.hpp`: the
//! original threads a small value type back up to the caller describing
//! which operator ran and whether it was accepted, so the evolutionary
//! loop's retry-on-rejection logic (spec.md §7) has something concrete to
//! match on and log.

use std::fmt;

/// The seven structural/parameter mutation operators a [`crate::network::Network`]
/// may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MutationKind {
    /// Append a node to a non-fixed layer.
    AddNode,
    /// Remove a node from a non-fixed layer.
    EraseNode,
    /// Create a new link.
    AddLink,
    /// Remove an existing link.
    EraseLink,
    /// Perturb a link's weight.
    Weight,
    /// Perturb a node's membrane time constant (spiking only).
    Tau,
    /// Re-select a node's transfer function (classical only).
    TransferFunction,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationKind::AddNode => "add_node",
            MutationKind::EraseNode => "erase_node",
            MutationKind::AddLink => "add_link",
            MutationKind::EraseLink => "erase_link",
            MutationKind::Weight => "weight",
            MutationKind::Tau => "tau",
            MutationKind::TransferFunction => "transfer_function",
        };
        f.write_str(name)
    }
}

/// Result of a `Network::mutate` call: either an operator was applied, or
/// every retry attempt was rejected (structural constraint violation) and
/// the generation proceeds without the mutation, per spec.md §7.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The operator named was applied successfully.
    Applied(MutationKind),
    /// Every attempt was rejected; the network is unchanged.
    Rejected {
        /// The operator that was attempted last.
        kind: MutationKind,
        /// Why the final attempt was rejected.
        reason: String,
    },
}

impl MutationOutcome {
    /// Whether a mutation actually changed the network.
    pub fn applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_snake_case_operator_names() {
        assert_eq!(MutationKind::AddNode.to_string(), "add_node");
        assert_eq!(MutationKind::TransferFunction.to_string(), "transfer_function");
    }

    #[test]
    fn applied_reports_correctly() {
        assert!(MutationOutcome::Applied(MutationKind::Weight).applied());
        assert!(!MutationOutcome::Rejected {
            kind: MutationKind::AddLink,
            reason: "x".into()
        }
        .applied());
    }
}
