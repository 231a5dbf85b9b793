//! Data model and evaluation engine for evolved classical and spiking
//! neural networks.
//!
//! A [`Network`](network::Network) owns a vector of [`Layer`](layer::Layer)s,
//! each owning a vector of [`Node`](node::Node)s; links reference other nodes
//! by `(layer_idx, node_idx)` pair rather than by pointer, so the whole
//! structure is cycle-free by construction and trivially deep-cloned. Nothing
//! in this crate is global: the process-wide pieces callers would expect to
//! find as statics (the PRNG) are the only exception, and even that is
//! reachable only through the free functions in [`rng`].

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod genome;
pub mod layer;
pub mod link;
pub mod mutation;
pub mod network;
pub mod node;
pub mod param;
pub mod rng;
pub mod stats;
pub mod transfer;

pub use error::{CoreError, Result};
pub use genome::{Genome, LayerDef};
pub use layer::{Layer, LayerKind};
pub use link::{Link, LinkDef, LinkType};
pub use network::{Network, NetworkKind, NetworkParams, Stage};
pub use node::{Node, NodeDef, NodeId, NodeRole};
pub use param::{Distribution, ParamDef, Parameter};
pub use stats::{EmaStat, SimpleStat, Statistics};
pub use transfer::TransferFunction;

/// Crate version, for reporting in history/champion dumps.
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
