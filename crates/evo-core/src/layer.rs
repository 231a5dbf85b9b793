//! Ordered containers of same-kind nodes.
//!
//! Grounded on `examples/original_source/src/lib/core/Layer.{hpp,cpp}`.
//! The arena re-architecture noted in `DESIGN.md` means a `Layer` here is a
//! plain `Vec<Node>` with no back-pointer to its owning network; the
//! cross-layer connectivity queries the original exposes as `Layer`
//! methods (`get_free_targets`, `get_free_sources`, `connect`) need the
//! full set of layers to resolve `(layer_idx, node_idx)` addresses and so
//! live on [`crate::network::Network`] instead. This module owns only what
//! a single layer can answer about itself.

use crate::genome::LayerDef;
use crate::node::Node;

/// The two layer kinds the specification's `LayerDef.type` recognizes.
/// `Convolutional` layers use the same node-wiring machinery as `Regular`
/// ones; only the per-node `dim` (interpreted by a front-end for
/// receptive-field windowing) differs in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LayerKind {
    /// Plain, densely-addressable nodes.
    Regular,
    /// Nodes interpreted as a receptive-field grid by the front-end.
    Convolutional,
}

/// An ordered sequence of nodes of one kind.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layer {
    kind: LayerKind,
    /// Fixed layers (input/output) never add or remove nodes.
    fixed: bool,
    nodes: Vec<Node>,
}

impl Layer {
    /// An empty layer of the given kind.
    pub fn new(kind: LayerKind, fixed: bool) -> Self {
        Self {
            kind,
            fixed,
            nodes: Vec::new(),
        }
    }

    /// This layer's kind.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Whether this layer may add or remove nodes.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the layer holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Read-only node slice.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mutable node slice.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Append a node, returning its index within the layer.
    pub fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Remove and return the node at `index`. The caller is responsible
    /// for disconnecting every link that referenced it before or after
    /// removal, and for re-indexing any `NodeId` that pointed past it
    /// (`Network::erase_node` does both).
    pub fn remove(&mut self, index: usize) -> Node {
        self.nodes.remove(index)
    }

    /// This layer's declarative shape, for deriving a genome from a
    /// concrete network.
    pub fn to_def(&self) -> LayerDef {
        LayerDef {
            kind: self.kind,
            nodes: self.nodes.iter().map(Node::to_def).collect(),
            fixed: self.fixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeDef, NodeRole};

    #[test]
    fn push_and_remove_round_trip() {
        let mut layer = Layer::new(LayerKind::Regular, false);
        let idx = layer.push(Node::new(NodeRole::Hidden, &NodeDef::default(), None));
        assert_eq!(idx, 0);
        assert_eq!(layer.len(), 1);
        layer.remove(0);
        assert!(layer.is_empty());
    }

    #[test]
    fn fixed_flag_is_preserved() {
        let layer = Layer::new(LayerKind::Regular, true);
        assert!(layer.is_fixed());
    }
}
