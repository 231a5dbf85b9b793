//! The abstract "shape" shared by every network realizing it.
//!
//! Grounded on `examples/original_source/src/lib/core/Genome.{hpp,cpp}`: a
//! genome is nothing but a sequence of layer definitions plus a fitness
//! distribution summarizing the networks built from it. Two genomes are
//! the same genome iff their layer definitions compare equal element-wise.

use crate::layer::LayerKind;
use crate::node::NodeDef;
use crate::stats::{SimpleStat, StatPack};

/// Declarative definition of one layer's shape, carried inside a
/// [`Genome`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerDef {
    /// Layer kind.
    pub kind: LayerKind,
    /// Per-node definitions; the layer's node count is `nodes.len()`.
    pub nodes: Vec<NodeDef>,
    /// Whether the layer may add/remove nodes under mutation.
    pub fixed: bool,
}

/// An equivalence class of networks sharing the same layer-by-layer shape.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Genome {
    layers: Vec<LayerDef>,
    fitness: StatPack<SimpleStat>,
}

impl Genome {
    /// Build a genome from its layer shape, with no fitness history yet.
    pub fn new(layers: Vec<LayerDef>) -> Self {
        Self {
            layers,
            fitness: StatPack::default(),
        }
    }

    /// This genome's layer shape.
    pub fn layers(&self) -> &[LayerDef] {
        &self.layers
    }

    /// Fitness distribution across the networks realizing this genome.
    pub fn fitness(&self) -> &StatPack<SimpleStat> {
        &self.fitness
    }

    /// Mutable access to the fitness distribution, updated by the
    /// evolutionary loop each epoch (mean of realizing networks' absolute
    /// fitness, then the genome's own relative offset within the
    /// population).
    pub fn fitness_mut(&mut self) -> &mut StatPack<SimpleStat> {
        &mut self.fitness
    }

    /// Whether `other` has the same layer shape as this genome —
    /// genome identity is purely structural.
    pub fn same_shape(&self, other: &[LayerDef]) -> bool {
        self.layers == other
    }
}

impl PartialEq for Genome {
    fn eq(&self, other: &Self) -> bool {
        self.layers == other.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeDef;

    fn shape(n: usize) -> Vec<LayerDef> {
        vec![LayerDef {
            kind: LayerKind::Regular,
            nodes: vec![NodeDef::default(); n],
            fixed: false,
        }]
    }

    #[test]
    fn genomes_are_equal_iff_shapes_match() {
        let a = Genome::new(shape(2));
        let b = Genome::new(shape(2));
        let c = Genome::new(shape(3));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn same_shape_compares_against_raw_layer_defs() {
        let g = Genome::new(shape(2));
        assert!(g.same_shape(&shape(2)));
        assert!(!g.same_shape(&shape(5)));
    }
}
