//! Units inside a layer: own their incoming links, perform spike/activation
//! transfer, and participate in mutation and crossover.
//!
//! Grounded on `examples/original_source/src/lib/core/Node.{hpp,cpp}`. The
//! original keys a node's sources by raw `Node*`; here a [`NodeId`] (layer
//! index, node index) plays the same role without pointers, per the arena
//! re-architecture noted in `DESIGN.md`.

use std::collections::{BTreeMap, BTreeSet};

use crate::link::Link;
use crate::param::{ParamDef, Parameter};
use crate::rng;
use crate::stats::{SimpleStat, StatPack};
use crate::transfer::TransferFunction;

/// Address of a node: its layer's index within the network, and its own
/// index within that layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId {
    /// Index of the owning layer.
    pub layer: usize,
    /// Index of the node within that layer.
    pub node: usize,
}

impl NodeId {
    /// Build an id from its parts.
    pub fn new(layer: usize, node: usize) -> Self {
        Self { layer, node }
    }
}

/// The role a node plays, which constrains the links it may hold: bias and
/// input nodes never receive forward links, output nodes never send them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NodeRole {
    /// Constant-output unit feeding the next layer.
    Bias,
    /// Reads directly from an evaluation sample.
    Input,
    /// Its output is read back by the evaluator.
    Output,
    /// Neither input nor output.
    Hidden,
}

impl NodeRole {
    /// Whether a node of this role may be the target of a forward link.
    pub fn accepts_forward_target(self) -> bool {
        !matches!(self, NodeRole::Bias | NodeRole::Input)
    }

    /// Whether a node of this role may be the source of a forward link.
    pub fn accepts_forward_source(self) -> bool {
        !matches!(self, NodeRole::Output)
    }

    /// Transfer functions a node of this role may select. Bias nodes are
    /// always the `Constant` function; every other role may use the full
    /// set, re-sampled by the `TransferFunction` mutation operator.
    pub fn permitted_transfer_functions(self) -> &'static [TransferFunction] {
        const BIAS: [TransferFunction; 1] = [TransferFunction::Constant];
        match self {
            NodeRole::Bias => &BIAS,
            _ => &TransferFunction::ALL,
        }
    }
}

/// Declarative definition of a node's dimensions and (for spiking
/// networks) membrane time constant, carried inside a [`crate::genome::LayerDef`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeDef {
    /// `(depth, height, width)`; a front-end interpreting `Convolutional`
    /// layers reads this for receptive-field windowing. Opaque to the
    /// evolution engine otherwise.
    pub dim: (usize, usize, usize),
    /// Membrane time constant seed (spiking networks only).
    pub tau: f64,
}

impl Default for NodeDef {
    fn default() -> Self {
        Self {
            dim: (1, 1, 1),
            tau: 1.0,
        }
    }
}

/// A unit inside a [`crate::layer::Layer`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    role: NodeRole,
    dim: (usize, usize, usize),
    transfer: TransferFunction,
    tau: Option<Parameter>,
    incoming: BTreeMap<NodeId, Link>,
    targets: BTreeSet<NodeId>,
    age: u64,

    // Classical evaluation state.
    output: f64,
    input_stats: StatPack<SimpleStat>,

    // Spiking evaluation state.
    potential: f64,
    t_last_in: f64,
    t_last_out: f64,
}

impl Node {
    /// A freshly created node with a random transfer function (drawn from
    /// the role's permitted set) and, if `tau_def` is given, a random
    /// membrane time constant.
    pub fn new(role: NodeRole, def: &NodeDef, tau_def: Option<&ParamDef>) -> Self {
        let permitted = role.permitted_transfer_functions();
        let idx = rng::rnd_int(0, permitted.len());
        Self {
            role,
            dim: def.dim,
            transfer: permitted[idx],
            tau: tau_def.map(Parameter::new),
            incoming: BTreeMap::new(),
            targets: BTreeSet::new(),
            age: 0,
            output: 0.0,
            input_stats: StatPack::default(),
            potential: 0.0,
            t_last_in: 0.0,
            t_last_out: 0.0,
        }
    }

    /// Clone another node's transfer function and time constant — *not*
    /// its links, which the owning layer reattaches once every node in the
    /// new network exists.
    pub fn clone_shape_from(other: &Node, role: NodeRole) -> Self {
        Self {
            role,
            dim: other.dim,
            transfer: other.transfer,
            tau: other.tau,
            incoming: BTreeMap::new(),
            targets: BTreeSet::new(),
            age: 0,
            output: 0.0,
            input_stats: StatPack::default(),
            potential: 0.0,
            t_last_in: 0.0,
            t_last_out: 0.0,
        }
    }

    /// This node's role.
    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// Dimensions, as handed to the front-end for `Convolutional` layers.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.dim
    }

    /// Current transfer function.
    pub fn transfer(&self) -> TransferFunction {
        self.transfer
    }

    /// Re-select the transfer function (the `TransferFunction` structural
    /// mutation operator), uniformly from the role's permitted set.
    pub fn mutate_transfer(&mut self) {
        let permitted = self.role.permitted_transfer_functions();
        if permitted.len() <= 1 {
            return;
        }
        let idx = rng::rnd_int(0, permitted.len());
        self.transfer = permitted[idx];
    }

    /// Membrane time constant (spiking networks only).
    pub fn tau(&self) -> Option<&Parameter> {
        self.tau.as_ref()
    }

    /// Mutable access to the time constant, for the `Tau` structural
    /// mutation operator.
    pub fn tau_mut(&mut self) -> Option<&mut Parameter> {
        self.tau.as_mut()
    }

    /// Generations since this node was created.
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Advance the age counter by one epoch.
    pub fn tick(&mut self) {
        self.age += 1;
    }

    /// Read-only view of this node's incoming links, keyed by source.
    pub fn incoming(&self) -> &BTreeMap<NodeId, Link> {
        &self.incoming
    }

    /// Mutable view of this node's incoming links.
    pub fn incoming_mut(&mut self) -> &mut BTreeMap<NodeId, Link> {
        &mut self.incoming
    }

    /// Back-references to nodes this node sends links to; bookkeeping only,
    /// consulted on disconnect.
    pub fn targets(&self) -> &BTreeSet<NodeId> {
        &self.targets
    }

    /// Whether a link from `source` already exists.
    pub fn has_source(&self, source: NodeId) -> bool {
        self.incoming.contains_key(&source)
    }

    /// Register an incoming link from `source`. The caller (the owning
    /// network) is responsible for having already validated the link
    /// policy and cycle constraints.
    pub fn add_source(&mut self, source: NodeId, link: Link) {
        self.incoming.insert(source, link);
    }

    /// Remove and return the incoming link from `source`, if any.
    pub fn remove_source(&mut self, source: NodeId) -> Option<Link> {
        self.incoming.remove(&source)
    }

    /// Record that this node sends a link to `target`.
    pub fn add_target(&mut self, target: NodeId) {
        self.targets.insert(target);
    }

    /// Forget that this node sends a link to `target`.
    pub fn remove_target(&mut self, target: NodeId) {
        self.targets.remove(&target);
    }

    /// Whether this node would be left with no forward link at all
    /// (neither incoming nor outgoing) if `candidate` incoming link were
    /// removed — used to enforce the "never fully disconnect from the
    /// forward spine" rule in `EraseLink`.
    pub fn would_be_forward_isolated(&self, candidate: NodeId, has_other_forward: bool) -> bool {
        let _ = candidate;
        !has_other_forward
    }

    /// Last recorded output (classical networks) — the value downstream
    /// nodes read as `source.output` when summing their own inputs.
    pub fn output(&self) -> f64 {
        self.output
    }

    /// Run the node's transfer function over pre-weighted incoming signals
    /// (`link.weight * source.output` for every incoming link), record the
    /// pre-activation sum in the input statistics, cache and return the
    /// output.
    pub fn activate(&mut self, weighted_inputs: &[f64]) -> f64 {
        let (pre_activation, out) = self.transfer.evaluate(weighted_inputs);
        self.input_stats.update(pre_activation);
        self.output = out;
        out
    }

    /// Directly set the output (used to seed input-layer nodes from a
    /// sample).
    pub fn set_output(&mut self, value: f64) {
        self.output = value;
    }

    /// Input statistics accumulated across evaluations.
    pub fn input_stats(&self) -> &StatPack<SimpleStat> {
        &self.input_stats
    }

    /// Current membrane potential (spiking networks only).
    pub fn potential(&self) -> f64 {
        self.potential
    }

    /// Time of the last spike this node emitted (`0.0` if it has not
    /// fired yet).
    pub fn last_output_time(&self) -> f64 {
        self.t_last_out
    }

    /// Time of the last spike this node received (`0.0` if none yet).
    pub fn last_input_time(&self) -> f64 {
        self.t_last_in
    }

    /// Replace the full target set in one go — used when reindexing
    /// `NodeId`s elsewhere in the network after a node removal shifts
    /// indices within its layer.
    pub fn set_targets(&mut self, targets: BTreeSet<NodeId>) {
        self.targets = targets;
    }

    /// Seed this node as having just fired at `t` with no preceding
    /// potential — used to inject input-layer spikes at the start of a
    /// spiking evaluation.
    pub fn force_fire(&mut self, t: f64) {
        self.t_last_out = t;
        self.t_last_in = t;
        self.potential = 0.0;
    }

    /// This node's declarative shape, for deriving a genome from a
    /// concrete network.
    pub fn to_def(&self) -> NodeDef {
        NodeDef {
            dim: self.dim,
            tau: self.tau.as_ref().map(Parameter::value).unwrap_or(1.0),
        }
    }

    /// Integrate one incoming spike arriving at `t_src` through a link of
    /// the given `weight`. When `leaky` the membrane decays by
    /// `exp(-(t_src - t_last_in) / tau)` before integration; `tau` is
    /// required whenever `leaky` is set (spiking nodes always carry one).
    /// Returns the firing time if the membrane crosses threshold (and
    /// resets the potential to zero, with no refractory period), else
    /// `None`.
    pub fn integrate_spike(&mut self, t_src: f64, weight: f64, leaky: bool, max_delay: f64) -> Option<f64> {
        if leaky {
            if let Some(tau) = self.tau.as_ref().map(Parameter::value).filter(|t| *t > 0.0) {
                let dt = t_src - self.t_last_in;
                self.potential *= (-dt / tau).exp();
            }
        }
        self.potential += weight;
        self.t_last_in = t_src;

        if self.potential >= 1.0 {
            let delay = rng::rnd_real(0.0, max_delay.max(f64::MIN_POSITIVE));
            let t_out = self.t_last_in + delay;
            self.t_last_out = t_out;
            self.potential = 0.0;
            Some(t_out)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Distribution;

    fn tau_def() -> ParamDef {
        ParamDef {
            dist: Distribution::Fixed,
            mean: 2.0,
            sd: 0.1,
            min: 0.1,
            max: 10.0,
        }
    }

    #[test]
    fn bias_role_is_always_constant() {
        rng::seed(1);
        for _ in 0..20 {
            let node = Node::new(NodeRole::Bias, &NodeDef::default(), None);
            assert_eq!(node.transfer(), TransferFunction::Constant);
        }
    }

    #[test]
    fn integrate_spike_fires_once_threshold_crossed() {
        rng::seed(2);
        let mut node = Node::new(NodeRole::Hidden, &NodeDef::default(), Some(&tau_def()));
        assert!(node.integrate_spike(1.0, 0.5, true, 0.1).is_none());
        let fired = node.integrate_spike(1.5, 0.6, true, 0.1);
        assert!(fired.is_some());
        assert_eq!(node.potential(), 0.0);
    }

    #[test]
    fn integrate_spike_without_leak_does_not_decay() {
        rng::seed(3);
        let mut node = Node::new(NodeRole::Hidden, &NodeDef::default(), Some(&tau_def()));
        node.integrate_spike(1.0, 0.4, false, 0.1);
        node.integrate_spike(100.0, 0.4, false, 0.1);
        assert!((node.potential() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn activate_records_input_stats_and_output() {
        let mut node = Node::new(NodeRole::Hidden, &NodeDef::default(), None);
        node.transfer = TransferFunction::Identity;
        let out = node.activate(&[0.3, 0.4]);
        assert!((out - 0.7).abs() < 1e-9);
        assert_eq!(node.output(), out);
    }

    #[test]
    fn clone_shape_from_copies_transfer_and_tau_not_links() {
        rng::seed(4);
        let mut original = Node::new(NodeRole::Hidden, &NodeDef::default(), Some(&tau_def()));
        original.add_source(NodeId::new(0, 0), Link::new(
            &crate::link::LinkDef { link_type: crate::link::LinkType::Forward, weight: None },
            &ParamDef { dist: Distribution::Fixed, mean: 0.1, sd: 0.1, min: -1.0, max: 1.0 },
        ));
        let clone = Node::clone_shape_from(&original, NodeRole::Hidden);
        assert_eq!(clone.transfer(), original.transfer());
        assert!(clone.incoming().is_empty());
    }
}
