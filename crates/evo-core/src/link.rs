//! Weighted directed connections between nodes.
//!
//! Grounded on `examples/original_source/src/lib/core/Link.{hpp,cpp}`: a
//! link is owned by its target node and keyed by its source, carries a
//! [`LinkType`] fixed at construction and a mutable [`Parameter`] weight,
//! and exposes the two STDP update rules used by spiking evaluation.

use crate::param::{ParamDef, Parameter};

/// The four link kinds a [`crate::node::Node`] may hold, each bound to a
/// different layer-index relationship (see `Network`'s connectivity
/// policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LinkType {
    /// Source layer index `s`, target layer index `s + 1`.
    Forward,
    /// Any source/target layer index; must close a cycle through the
    /// existing forward subgraph.
    Recurrent,
    /// Source and target in the same layer.
    Lateral,
    /// Source layer index `s`, target layer index `>= s + 2`.
    Skip,
}

impl LinkType {
    /// Whether this link kind participates in the acyclic "forward
    /// subgraph" that cycle detection is defined over (`Forward` and
    /// `Skip`, both of which move strictly toward later layers).
    pub fn is_forward_subgraph(self) -> bool {
        matches!(self, LinkType::Forward | LinkType::Skip)
    }
}

/// Declarative definition a [`Link`] is constructed from.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkDef {
    /// Link kind.
    pub link_type: LinkType,
    /// Weight distribution; `None` falls back to the configuration's
    /// default weight definition (`link.weight` in the config document).
    pub weight: Option<ParamDef>,
}

/// A directed edge, owned by its target node and keyed by its source.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link {
    link_type: LinkType,
    weight: Parameter,
    age: u64,
}

impl Link {
    /// Build a link from a definition, falling back to `default_weight`
    /// when the definition leaves the weight distribution unspecified.
    pub fn new(def: &LinkDef, default_weight: &ParamDef) -> Self {
        let weight_def = def.weight.unwrap_or(*default_weight);
        Self {
            link_type: def.link_type,
            weight: Parameter::new(&weight_def),
            age: 0,
        }
    }

    /// Copy another link's type and weight (used when cloning a network;
    /// link age resets, matching a fresh edge in the clone).
    pub fn clone_from(other: &Link) -> Self {
        Self {
            link_type: other.link_type,
            weight: other.weight,
            age: 0,
        }
    }

    /// This link's kind.
    pub fn link_type(&self) -> LinkType {
        self.link_type
    }

    /// Current weight.
    pub fn weight(&self) -> &Parameter {
        &self.weight
    }

    /// Mutable access to the weight, for structural mutation.
    pub fn weight_mut(&mut self) -> &mut Parameter {
        &mut self.weight
    }

    /// Generations since this link was created.
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Advance the age counter by one epoch.
    pub fn tick(&mut self) {
        self.age += 1;
    }

    /// Long-term potentiation: both excitatory and inhibitory weights move
    /// toward their respective saturating bound.
    pub fn ltp(&mut self, dw: f64) {
        let w = self.weight.value();
        let (min, max) = self.weight.bounds();
        let delta = if w >= 0.0 { dw * (max - w) } else { dw * (min - w) };
        self.weight.adjust(delta);
    }

    /// Long-term depression: excitatory weights decay toward zero at a
    /// rate scaled by `dp_ratio`; inhibitory weights are potentiated
    /// toward their lower bound (the same direction `ltp` would move
    /// them), matching the original's symmetric treatment.
    pub fn ltd(&mut self, dw: f64, dp_ratio: f64) {
        let w = self.weight.value();
        let (min, _max) = self.weight.bounds();
        let delta = if w >= 0.0 {
            dw * (-dp_ratio * w)
        } else {
            dw * (min - w)
        };
        self.weight.adjust(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Distribution;
    use crate::rng;

    fn weight_def(min: f64, max: f64) -> ParamDef {
        ParamDef {
            dist: Distribution::Uniform,
            mean: 0.0,
            sd: 0.2,
            min,
            max,
        }
    }

    fn link_with_weight(value: f64, min: f64, max: f64) -> Link {
        rng::seed(7);
        let mut link = Link::new(
            &LinkDef {
                link_type: LinkType::Forward,
                weight: None,
            },
            &weight_def(min, max),
        );
        // Force a known starting weight for deterministic assertions.
        link.weight.adjust(value - link.weight.value());
        link
    }

    #[test]
    fn ltp_moves_excitatory_weight_toward_max() {
        let mut link = link_with_weight(0.2, -1.0, 1.0);
        let before = link.weight().value();
        link.ltp(0.5);
        let after = link.weight().value();
        assert!(after > before);
        assert!((1.0 - after).abs() < (1.0 - before).abs());
    }

    #[test]
    fn ltp_moves_inhibitory_weight_toward_min() {
        let mut link = link_with_weight(-0.2, -1.0, 1.0);
        let before = link.weight().value();
        link.ltp(0.5);
        let after = link.weight().value();
        assert!(after < before);
        assert!((after - (-1.0)).abs() < (before - (-1.0)).abs());
    }

    #[test]
    fn ltd_moves_excitatory_weight_toward_zero() {
        let mut link = link_with_weight(0.5, -1.0, 1.0);
        let before = link.weight().value();
        link.ltd(0.5, 1.0);
        let after = link.weight().value();
        assert!(after.abs() < before.abs());
    }

    #[test]
    fn ltd_moves_inhibitory_weight_toward_min() {
        let mut link = link_with_weight(-0.5, -1.0, 1.0);
        let before = link.weight().value();
        link.ltd(0.5, 1.0);
        let after = link.weight().value();
        assert!(after < before);
    }

    #[test]
    fn weight_stays_within_bounds_under_repeated_stdp() {
        let mut link = link_with_weight(0.9, -1.0, 1.0);
        for _ in 0..100 {
            link.ltp(0.9);
        }
        let (min, max) = link.weight().bounds();
        assert!(link.weight().value() >= min && link.weight().value() <= max);
    }

    #[test]
    fn tick_increments_age() {
        let mut link = link_with_weight(0.0, -1.0, 1.0);
        assert_eq!(link.age(), 0);
        link.tick();
        link.tick();
        assert_eq!(link.age(), 2);
    }
}
