//! The phenotype: an ordered sequence of layers, a cached evaluation order,
//! and the operations — construction, mutation, crossover, evaluation —
//! that drive one network through the evolutionary loop.
//!
//! Grounded on `examples/original_source/src/lib/core/Net.{hpp,cpp}`,
//! `Node.cpp`'s `on_emission` (spiking STDP), and
//! `examples/shnn-runtime/src/simulation.rs`'s event-stepping style for the
//! spike scheduler shape. The back-pointer graph the original builds with
//! raw pointers is replaced by the arena-index scheme from `DESIGN.md`:
//! links store `NodeId { layer, node }` pairs, so cloning a network is a
//! plain derived `Clone` with no pointer-rewriting pass.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::genome::{Genome, LayerDef};
use crate::layer::{Layer, LayerKind};
use crate::link::{Link, LinkDef, LinkType};
use crate::mutation::{MutationKind, MutationOutcome};
use crate::node::{Node, NodeDef, NodeId, NodeRole};
use crate::param::{Direction, ParamDef};
use crate::rng;
use crate::stats::{EmaStat, SimpleStat, Statistics};

/// The two network families the specification covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NetworkKind {
    /// Layered feed-forward/recurrent network with continuous activations.
    Classical,
    /// Event-driven leaky integrate-and-fire network with STDP.
    Spiking,
}

/// Input-sample-to-spike-time coding scheme for spiking networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpikeEncoding {
    /// The sample value itself is the spike emission time.
    Time,
    /// Spike times are assigned by the sample values' relative rank
    /// (largest value fires first).
    RankOrder,
}

/// STDP learning-rate parameters (`learning.stdp.*` in the configuration
/// document).
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StdpParams {
    /// Base learning rate applied to both LTP and LTD.
    pub rate: f64,
    /// Ratio scaling LTD strength relative to LTP.
    pub dp_ratio: f64,
}

/// Relative weights for the seven mutation operators
/// (`mutation.prob.*` in the configuration document).
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MutationWeights {
    /// Weight for `AddNode`.
    pub add_node: f64,
    /// Weight for `EraseNode`.
    pub erase_node: f64,
    /// Weight for `AddLink`.
    pub add_link: f64,
    /// Weight for `EraseLink`.
    pub erase_link: f64,
    /// Weight for `Weight`.
    pub weight: f64,
    /// Weight for `Tau` (spiking only).
    pub tau: f64,
    /// Weight for `TransferFunction` (classical only).
    pub transfer_function: f64,
    /// Whether node-operator weights scale by network saturation.
    pub adaptive: bool,
}

/// Everything a [`Network`] needs to construct, mutate, and evaluate
/// itself that is not part of its own evolving state — the runtime's
/// already-validated mirror of the relevant slices of the configuration
/// document (§6). `evo-core` never parses the document itself; a caller
/// (`evo-runtime::config`) builds this from JSON.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkParams {
    /// Classical or spiking.
    pub kind: NetworkKind,
    /// Link kinds structural mutation is allowed to create. `Forward` is
    /// always implicitly included regardless of this list.
    pub allowed_link_types: Vec<LinkType>,
    /// Default weight distribution for new links.
    pub default_weight: ParamDef,
    /// Membrane time constant distribution for new nodes (spiking only).
    pub tau_def: ParamDef,
    /// Mutation operator weights.
    pub mutation: MutationWeights,
    /// STDP learning parameters.
    pub stdp: StdpParams,
    /// Whether the membrane decays between inputs (spiking only).
    pub spike_lif: bool,
    /// Input-sample spike-coding scheme (spiking only).
    pub spike_encoding: SpikeEncoding,
    /// Upper bound for a spike's emission delay (spiking only).
    pub spike_max_delay: f64,
    /// `Some(alpha)` selects exponential-moving-average fitness tracking;
    /// `None` selects simple (Welford) tracking.
    pub fitness_alpha: Option<f64>,
}

impl NetworkParams {
    fn link_types_for_add(&self) -> Vec<LinkType> {
        let mut types = self.allowed_link_types.clone();
        if !types.contains(&LinkType::Forward) {
            types.push(LinkType::Forward);
        }
        types
    }
}

/// A three-position ratchet gating when a network is declared to have
/// solved the task. Advances on every threshold crossing; reaching the
/// end from `Test` is "solved".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Stage {
    /// Initial stage.
    Train,
    /// Second stage.
    Dev,
    /// Final stage; crossing again here means "solved".
    Test,
}

/// The absolute/relative fitness a network or genome carries, backed by
/// either simple or exponential-moving-average statistics depending on
/// `fitness.stat.alpha` in the configuration (§6).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fitness {
    abs_value: f64,
    abs_stat: FitnessStat,
    /// Offset of this fitness within its enclosing genome/population,
    /// recomputed by the evolutionary loop each epoch.
    pub rel: f64,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum FitnessStat {
    Simple(SimpleStat),
    Ema(EmaStat),
}

impl FitnessStat {
    fn update(&mut self, x: f64) {
        match self {
            FitnessStat::Simple(s) => s.update(x),
            FitnessStat::Ema(s) => s.update(x),
        }
    }

    fn mean(&self) -> f64 {
        match self {
            FitnessStat::Simple(s) => s.mean(),
            FitnessStat::Ema(s) => s.mean(),
        }
    }

    fn offset(&self, x: f64) -> f64 {
        match self {
            FitnessStat::Simple(s) => s.offset(x),
            FitnessStat::Ema(s) => s.offset(x),
        }
    }
}

impl Fitness {
    /// A fresh fitness tracker, backed by simple or EMA statistics
    /// depending on `alpha`.
    pub fn new(alpha: Option<f64>) -> Self {
        Self {
            abs_value: 0.0,
            abs_stat: match alpha {
                Some(a) => FitnessStat::Ema(EmaStat::new(a)),
                None => FitnessStat::Simple(SimpleStat::new()),
            },
            rel: 0.0,
        }
    }

    /// Fold a new absolute fitness observation in.
    pub fn update(&mut self, value: f64) {
        self.abs_value = value;
        self.abs_stat.update(value);
    }

    /// Current absolute fitness value.
    pub fn value(&self) -> f64 {
        self.abs_value
    }

    /// Mean absolute fitness observed so far.
    pub fn mean(&self) -> f64 {
        self.abs_stat.mean()
    }

    /// Offset of the current value within the tracked distribution.
    pub fn offset(&self) -> f64 {
        self.abs_stat.offset(self.abs_value)
    }

    /// Offset of an arbitrary value within the tracked distribution (used
    /// to compute a network's relative fitness within its genome, or a
    /// genome's relative fitness within the population).
    pub fn offset_of(&self, x: f64) -> f64 {
        self.abs_stat.offset(x)
    }
}

/// Outcome of `Network::set_fitness`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessUpdate {
    /// Whether the network has now solved the task (reached and crossed
    /// threshold again at `Stage::Test`).
    pub solved: bool,
    /// Whether a learning-phase retry mutation was applied.
    pub retried: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SpikeEvent {
    time: f64,
    seq: u64,
    node: NodeId,
}

impl Eq for SpikeEvent {}

impl Ord for SpikeEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.time
            .partial_cmp(&other.time)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for SpikeEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// An ordered sequence of layers realizing one [`Genome`], plus the
/// mutable state (fitness, age, stage, cached evaluation order) that
/// belongs to this concrete phenotype rather than its shape. Not
/// `serde`-serializable directly (it holds a live `Arc<NetworkParams>`
/// shared across a population) — persistence goes through [`Network::shape`]
/// plus [`Network::fitness`], matching the champion-dump shape described in
/// `SPEC_FULL.md`.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    params: Arc<NetworkParams>,
    age: u64,
    stage: Stage,
    fitness: Fitness,
    eval_order: Vec<NodeId>,
    last_weight_mutation: Option<(NodeId, NodeId)>,
    solved: bool,
}

impl Network {
    /// Build a network realizing `genome`'s shape: every layer's nodes are
    /// created fresh, then wired with at least one legal forward
    /// source/target per node (input nodes get targets only, output nodes
    /// get sources only).
    pub fn from_genome(genome: &Genome, params: Arc<NetworkParams>) -> Self {
        let n_layers = genome.layers().len();
        let mut layers = Vec::with_capacity(n_layers);
        for (li, def) in genome.layers().iter().enumerate() {
            let role = Self::role_for_layer(li, n_layers);
            let mut layer = Layer::new(def.kind, def.fixed);
            for node_def in &def.nodes {
                let tau_def = matches!(params.kind, NetworkKind::Spiking).then_some(&params.tau_def);
                layer.push(Node::new(role, node_def, tau_def));
            }
            layers.push(layer);
        }
        let mut net = Self {
            layers,
            fitness: Fitness::new(params.fitness_alpha),
            params,
            age: 0,
            stage: Stage::Train,
            eval_order: Vec::new(),
            last_weight_mutation: None,
            solved: false,
        };
        net.wire_forward_spine();
        net.refresh_eval_order();
        net
    }

    fn role_for_layer(index: usize, total: usize) -> NodeRole {
        if index == 0 {
            NodeRole::Input
        } else if index + 1 == total {
            NodeRole::Output
        } else {
            NodeRole::Hidden
        }
    }

    /// Deep-copy this network. Because links address nodes by
    /// `(layer, node)` index rather than by pointer, a structural clone
    /// needs no remapping pass — indices stay valid verbatim. The clone's
    /// age resets to zero (a newly created phenotype).
    pub fn deep_clone(&self) -> Self {
        Self {
            layers: self.layers.clone(),
            params: Arc::clone(&self.params),
            age: 0,
            stage: self.stage,
            fitness: self.fitness.clone(),
            eval_order: self.eval_order.clone(),
            last_weight_mutation: None,
            solved: false,
        }
    }

    /// Produce an offspring by interleaving `p1` and `p2`'s layers
    /// (chromosomes) and, within type-matching layers, their nodes
    /// (genes), each choice biased by a fitness-weighted coin. See
    /// spec.md §4.6 point 3.
    pub fn crossover(p1: &Network, p2: &Network, params: Arc<NetworkParams>) -> Self {
        let aligned = p1.layers.len().min(p2.layers.len());
        let p1_favoured = p1.fitness.rel >= p2.fitness.rel;
        let pick_p1_weight = {
            let total = p1.fitness.rel + p2.fitness.rel;
            if total > 0.0 {
                (p1.fitness.rel / total).clamp(0.05, 0.95)
            } else {
                0.5
            }
        };

        let mut layer_defs: Vec<LayerDef> = Vec::new();
        for i in 0..aligned {
            let l1 = &p1.layers[i];
            let l2 = &p2.layers[i];
            if l1.kind() == l2.kind() {
                let node_count = l1.len().max(l2.len());
                let mut nodes = Vec::with_capacity(node_count);
                for ni in 0..node_count {
                    let from_p1 = rng::rnd_chance(pick_p1_weight);
                    let chosen = if from_p1 && ni < l1.len() {
                        l1.nodes()[ni].clone()
                    } else if ni < l2.len() {
                        l2.nodes()[ni].clone()
                    } else {
                        l1.nodes()[ni.min(l1.len() - 1)].clone()
                    };
                    nodes.push(chosen.to_def());
                }
                layer_defs.push(LayerDef {
                    kind: l1.kind(),
                    nodes,
                    fixed: l1.is_fixed() && l2.is_fixed(),
                });
            } else {
                let picked = if rng::rnd_chance(if p1_favoured { 0.7 } else { 0.3 }) {
                    l1
                } else {
                    l2
                };
                layer_defs.push(picked.to_def());
            }
        }

        if p1.layers.len() != p2.layers.len() {
            let longer = if p1.layers.len() > p2.layers.len() {
                &p1.layers
            } else {
                &p2.layers
            };
            let favour_longer = (p1.layers.len() > p2.layers.len()) == p1_favoured;
            for extra in &longer[aligned..] {
                if rng::rnd_chance(if favour_longer { 0.6 } else { 0.4 }) {
                    layer_defs.push(extra.to_def());
                } else {
                    break;
                }
            }
        }

        let n_layers = layer_defs.len();
        let mut layers = Vec::with_capacity(n_layers);
        for (li, def) in layer_defs.iter().enumerate() {
            let role = Self::role_for_layer(li, n_layers);
            let mut layer = Layer::new(def.kind, def.fixed);
            for node_def in &def.nodes {
                let tau_def = matches!(params.kind, NetworkKind::Spiking).then_some(&params.tau_def);
                layer.push(Node::new(role, node_def, tau_def));
            }
            layers.push(layer);
        }
        let mut child = Self {
            layers,
            fitness: Fitness::new(params.fitness_alpha),
            params,
            age: 0,
            stage: Stage::Train,
            eval_order: Vec::new(),
            last_weight_mutation: None,
            solved: false,
        };
        child.wire_forward_spine();
        child.refresh_eval_order();
        child
    }

    /// This network's layer shape, for genome lookup/registration.
    pub fn shape(&self) -> Vec<LayerDef> {
        self.layers.iter().map(Layer::to_def).collect()
    }

    /// Read-only layer slice.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Total node count across all layers.
    pub fn node_count(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    /// Total link count across all layers.
    pub fn link_count(&self) -> usize {
        self.layers
            .iter()
            .flat_map(Layer::nodes)
            .map(|n| n.incoming().len())
            .sum()
    }

    /// Generations since this network was created.
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Current stage of the solved-detection ratchet.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Whether the most recent `set_fitness` call reported this network as
    /// having solved the task (crossed the target again at `Stage::Test`).
    /// The evolutionary loop polls this after the evaluator returns, since
    /// the evaluator itself only has access to `set_fitness`'s return value
    /// at the call site, not from outside the closure.
    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// Current fitness state.
    pub fn fitness(&self) -> &Fitness {
        &self.fitness
    }

    /// Mutable fitness state (the evolutionary loop writes `rel` here
    /// during calibration).
    pub fn fitness_mut(&mut self) -> &mut Fitness {
        &mut self.fitness
    }

    /// Advance this network's age, and every owned node's and link's age,
    /// by one epoch.
    pub fn tick_age(&mut self) {
        self.age += 1;
        for layer in &mut self.layers {
            for node in layer.nodes_mut() {
                node.tick();
                for link in node.incoming_mut().values_mut() {
                    link.tick();
                }
            }
        }
    }

    /// Saturation `S = 2|E| / (|V|(|V|-1))`, the ratio of existing links
    /// to the maximum possible given the node count.
    pub fn saturation(&self) -> f64 {
        let v = self.node_count();
        if v < 2 {
            return 0.0;
        }
        let e = self.link_count();
        (2.0 * e as f64) / (v as f64 * (v as f64 - 1.0))
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.layers[id.layer].nodes()[id.node]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.layers[id.layer].nodes_mut()[id.node]
    }

    // ---------------------------------------------------------------
    // Evaluation
    // ---------------------------------------------------------------

    /// Feed `sample` to the input layer and evaluate the network,
    /// returning the output layer's readings (activations for classical
    /// networks, spike emission times — `0.0` if silent — for spiking
    /// ones).
    pub fn evaluate(&mut self, sample: &[f64]) -> Result<Vec<f64>> {
        let input_len = self.layers.first().map(Layer::len).unwrap_or(0);
        if sample.len() != input_len {
            return Err(CoreError::SampleShapeMismatch {
                expected: input_len,
                got: sample.len(),
            });
        }
        match self.params.kind {
            NetworkKind::Classical => self.evaluate_classical(sample),
            NetworkKind::Spiking => self.evaluate_spiking(sample),
        }
    }

    /// Read the output layer's last-computed values without re-evaluating.
    pub fn output(&self) -> Vec<f64> {
        match self.layers.last() {
            Some(layer) => match self.params.kind {
                NetworkKind::Classical => layer.nodes().iter().map(Node::output).collect(),
                NetworkKind::Spiking => layer.nodes().iter().map(Node::last_output_time).collect(),
            },
            None => Vec::new(),
        }
    }

    fn evaluate_classical(&mut self, sample: &[f64]) -> Result<Vec<f64>> {
        for (ni, &v) in sample.iter().enumerate() {
            self.layers[0].nodes_mut()[ni].set_output(v);
        }
        let order = self.eval_order.clone();
        for id in order {
            if id.layer == 0 {
                continue;
            }
            let incoming: Vec<(NodeId, f64)> = self
                .node(id)
                .incoming()
                .iter()
                .map(|(src, link)| (*src, link.weight().value()))
                .collect();
            let inputs: Vec<f64> = incoming
                .iter()
                .map(|(src, w)| w * self.node(*src).output())
                .collect();
            self.node_mut(id).activate(&inputs);
        }
        Ok(self.output())
    }

    fn evaluate_spiking(&mut self, sample: &[f64]) -> Result<Vec<f64>> {
        let times = self.input_spike_times(sample);
        let mut heap: BinaryHeap<Reverse<SpikeEvent>> = BinaryHeap::new();
        let mut seq: u64 = 0;
        for (ni, &t) in times.iter().enumerate() {
            let id = NodeId::new(0, ni);
            self.node_mut(id).force_fire(t);
            heap.push(Reverse(SpikeEvent { time: t, seq, node: id }));
            seq += 1;
        }

        const MAX_EVENTS: usize = 200_000;
        let mut processed = 0usize;
        while let Some(Reverse(ev)) = heap.pop() {
            processed += 1;
            if processed > MAX_EVENTS {
                log::warn!("spiking evaluation exceeded {MAX_EVENTS} events, truncating");
                break;
            }
            let targets: Vec<NodeId> = self.node(ev.node).targets().iter().copied().collect();
            for tgt in targets {
                let weight = match self.node(tgt).incoming().get(&ev.node) {
                    Some(link) => link.weight().value(),
                    None => continue,
                };
                let fired = self.node_mut(tgt).integrate_spike(
                    ev.time,
                    weight,
                    self.params.spike_lif,
                    self.params.spike_max_delay,
                );
                if let Some(t_out) = fired {
                    self.apply_stdp_on_emission(tgt, ev.node, t_out);
                    heap.push(Reverse(SpikeEvent { time: t_out, seq, node: tgt }));
                    seq += 1;
                }
            }
        }
        Ok(self.output())
    }

    fn input_spike_times(&self, sample: &[f64]) -> Vec<f64> {
        match self.params.spike_encoding {
            SpikeEncoding::Time => sample.to_vec(),
            SpikeEncoding::RankOrder => {
                let mut order: Vec<usize> = (0..sample.len()).collect();
                order.sort_by(|&a, &b| sample[b].partial_cmp(&sample[a]).unwrap_or(std::cmp::Ordering::Equal));
                let mut times = vec![0.0; sample.len()];
                for (rank, idx) in order.into_iter().enumerate() {
                    times[idx] = rank as f64;
                }
                times
            }
        }
    }

    /// Apply STDP following an emission at `target`: the forward source
    /// that triggered the spike is potentiated; every other forward
    /// source is depressed symmetrically. Only forward incoming sources
    /// participate (see `DESIGN.md`'s open-question resolution).
    fn apply_stdp_on_emission(&mut self, target: NodeId, triggering_source: NodeId, t_out: f64) {
        let tau = self.node(target).tau().map(|p| p.value()).unwrap_or(1.0).max(f64::MIN_POSITIVE);
        let rate = self.params.stdp.rate;
        let dp_ratio = self.params.stdp.dp_ratio;
        let sources: Vec<NodeId> = self
            .node(target)
            .incoming()
            .iter()
            .filter(|(_, link)| link.link_type() == LinkType::Forward)
            .map(|(id, _)| *id)
            .collect();
        for src in sources {
            let s_last_out = self.node(src).last_output_time();
            let factor = rate * (-(t_out - s_last_out) / tau).exp();
            let node = self.node_mut(target);
            let link = match node.incoming_mut().get_mut(&src) {
                Some(l) => l,
                None => continue,
            };
            if src == triggering_source {
                link.ltp(factor);
            } else {
                link.ltd(factor, dp_ratio);
            }
        }
    }

    // ---------------------------------------------------------------
    // Fitness / stage
    // ---------------------------------------------------------------

    /// Record an absolute fitness observation, advance the solved-stage
    /// ratchet when `value` crosses `target`, reinforce the last weight
    /// mutation's direction via the fitness delta it produced, and — if
    /// not solved — possibly perform one learning-phase retry mutation
    /// with probability `fitness.offset()`.
    pub fn set_fitness(&mut self, value: f64, target: f64) -> FitnessUpdate {
        let direction = if value > self.fitness.abs_value {
            Direction::Inc
        } else if value < self.fitness.abs_value {
            Direction::Dec
        } else {
            Direction::Undef
        };
        if let Some((tgt, src)) = self.last_weight_mutation.take() {
            if tgt.layer < self.layers.len() && tgt.node < self.layers[tgt.layer].len() {
                if let Some(link) = self.node_mut(tgt).incoming_mut().get_mut(&src) {
                    link.weight_mut().optimise(direction);
                }
            }
        }

        self.fitness.update(value);

        let mut solved = false;
        if value >= target {
            self.stage = match self.stage {
                Stage::Train => Stage::Dev,
                Stage::Dev => Stage::Test,
                Stage::Test => {
                    solved = true;
                    Stage::Test
                }
            };
        }

        self.solved = solved;

        let retried = if !solved && rng::rnd_chance(self.fitness.offset()) {
            let params = Arc::clone(&self.params);
            self.mutate(&params).applied()
        } else {
            false
        };

        FitnessUpdate { solved, retried }
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Select one of the permitted mutation operators by weight (scaled by
    /// saturation when `mutation.adaptive` is set) and apply it, retrying
    /// with another random choice up to 5 times on structural rejection.
    pub fn mutate(&mut self, params: &NetworkParams) -> MutationOutcome {
        let candidates = self.candidate_mutation_kinds(params);
        if candidates.is_empty() {
            return MutationOutcome::Rejected {
                kind: MutationKind::Weight,
                reason: "no eligible mutation operators".into(),
            };
        }
        let weights: Vec<f64> = candidates.iter().map(|(_, w)| *w).collect();

        const MAX_ATTEMPTS: u32 = 5;
        let mut last_kind = candidates[0].0;
        let mut last_reason = String::from("exhausted retry attempts");
        for _ in 0..MAX_ATTEMPTS {
            let idx = rng::roulette(&weights).unwrap_or_else(|| rng::rnd_int(0, candidates.len()));
            let kind = candidates[idx].0;
            last_kind = kind;
            let outcome = match kind {
                MutationKind::AddNode => self.try_add_node(params),
                MutationKind::EraseNode => self.try_erase_node(),
                MutationKind::AddLink => self.try_add_link(params),
                MutationKind::EraseLink => self.try_erase_link(),
                MutationKind::Weight => self.try_mutate_weight(),
                MutationKind::Tau => self.try_mutate_tau(),
                MutationKind::TransferFunction => self.try_mutate_transfer(),
            };
            match outcome {
                Ok(()) => return MutationOutcome::Applied(kind),
                Err(e) => last_reason = e.to_string(),
            }
        }
        MutationOutcome::Rejected {
            kind: last_kind,
            reason: last_reason,
        }
    }

    fn candidate_mutation_kinds(&self, params: &NetworkParams) -> Vec<(MutationKind, f64)> {
        let mut out = vec![
            (MutationKind::AddNode, params.mutation.add_node),
            (MutationKind::EraseNode, params.mutation.erase_node),
            (MutationKind::AddLink, params.mutation.add_link),
            (MutationKind::EraseLink, params.mutation.erase_link),
            (MutationKind::Weight, params.mutation.weight),
        ];
        match self.params.kind {
            NetworkKind::Spiking => out.push((MutationKind::Tau, params.mutation.tau)),
            NetworkKind::Classical => out.push((MutationKind::TransferFunction, params.mutation.transfer_function)),
        }
        if params.mutation.adaptive {
            let s = self.saturation();
            for (kind, w) in out.iter_mut() {
                match kind {
                    MutationKind::AddNode | MutationKind::EraseNode | MutationKind::EraseLink => *w *= s,
                    MutationKind::AddLink => *w *= 1.0 - s,
                    _ => {}
                }
            }
        }
        out.retain(|(_, w)| *w > 0.0);
        out
    }

    fn random_node_addr(&self) -> NodeId {
        let total = self.node_count().max(1);
        let mut pick = rng::rnd_int(0, total);
        for (li, layer) in self.layers.iter().enumerate() {
            if pick < layer.len() {
                return NodeId::new(li, pick);
            }
            pick -= layer.len();
        }
        NodeId::new(0, 0)
    }

    fn try_add_node(&mut self, params: &NetworkParams) -> Result<()> {
        let candidates: Vec<usize> = (0..self.layers.len()).filter(|&i| !self.layers[i].is_fixed()).collect();
        if candidates.is_empty() {
            return Err(CoreError::structural_rejection("no mutable layers"));
        }
        let li = candidates[rng::rnd_int(0, candidates.len())];
        let n_layers = self.layers.len();
        let role = Self::role_for_layer(li, n_layers);
        let tau_def = matches!(params.kind, NetworkKind::Spiking).then_some(&params.tau_def);
        let node = Node::new(role, &NodeDef::default(), tau_def);
        let node_idx = self.layers[li].push(node);
        let new_id = NodeId::new(li, node_idx);

        if li > 0 && role.accepts_forward_target() {
            let sources_len = self.layers[li - 1].len();
            if sources_len > 0 {
                let src_idx = rng::rnd_int(0, sources_len);
                let _ = self.add_link(NodeId::new(li - 1, src_idx), new_id, LinkType::Forward, params);
            }
        }
        if li + 1 < self.layers.len() && role.accepts_forward_source() {
            let targets_len = self.layers[li + 1].len();
            if targets_len > 0 {
                let tgt_idx = rng::rnd_int(0, targets_len);
                let _ = self.add_link(new_id, NodeId::new(li + 1, tgt_idx), LinkType::Forward, params);
            }
        }
        self.refresh_eval_order();
        Ok(())
    }

    fn try_erase_node(&mut self) -> Result<()> {
        let candidates: Vec<usize> = (0..self.layers.len())
            .filter(|&i| !self.layers[i].is_fixed() && !self.layers[i].is_empty())
            .collect();
        if candidates.is_empty() {
            return Err(CoreError::structural_rejection("no mutable, non-empty layers"));
        }
        let li = candidates[rng::rnd_int(0, candidates.len())];
        let deletion_weights: Vec<f64> = self.layers[li]
            .nodes()
            .iter()
            .map(|n| 1.0 / (1.0 + n.age() as f64))
            .collect();
        let idx = rng::roulette(&deletion_weights).ok_or_else(|| CoreError::structural_rejection("empty layer"))?;
        let id = NodeId::new(li, idx);
        self.disconnect_node(id);
        self.layers[li].remove(idx);
        self.reindex_after_removal(li, idx);
        self.refresh_eval_order();
        Ok(())
    }

    fn try_add_link(&mut self, params: &NetworkParams) -> Result<()> {
        if self.node_count() == 0 {
            return Err(CoreError::structural_rejection("network has no nodes"));
        }
        let src = self.random_node_addr();
        let allowed = params.link_types_for_add();
        let lt = allowed[rng::rnd_int(0, allowed.len())];
        let candidates = self.free_targets(src, lt);
        if candidates.is_empty() {
            return Err(CoreError::structural_rejection("no free targets for link type"));
        }
        let tgt = candidates[rng::rnd_int(0, candidates.len())];
        self.add_link(src, tgt, lt, params)
    }

    fn try_erase_link(&mut self) -> Result<()> {
        let tgt = self.random_node_addr();
        let incoming: Vec<(NodeId, f64)> = self
            .node(tgt)
            .incoming()
            .iter()
            .map(|(id, link)| (*id, 1.0 / (1.0 + link.weight().value().abs())))
            .collect();
        if incoming.is_empty() {
            return Err(CoreError::structural_rejection("node has no incoming links"));
        }
        let weights: Vec<f64> = incoming.iter().map(|(_, w)| *w).collect();
        let pick = rng::roulette(&weights).unwrap_or(0);
        let (src, _) = incoming[pick];
        let link_type = self.node(tgt).incoming().get(&src).expect("just selected").link_type();

        if link_type.is_forward_subgraph() {
            let tgt_role = self.node(tgt).role();
            let other_forward_sources = self
                .node(tgt)
                .incoming()
                .iter()
                .filter(|(id, l)| **id != src && l.link_type().is_forward_subgraph())
                .count();
            if matches!(tgt_role, NodeRole::Hidden | NodeRole::Output) && other_forward_sources == 0 {
                return Err(CoreError::structural_rejection(
                    "would leave node without a forward source",
                ));
            }
            let src_role = self.node(src).role();
            let other_forward_targets = self.node(src).targets().iter().filter(|t| **t != tgt).count();
            if matches!(src_role, NodeRole::Input | NodeRole::Hidden) && other_forward_targets == 0 {
                return Err(CoreError::structural_rejection(
                    "would leave node without a forward target",
                ));
            }
        }

        self.remove_link(src, tgt);
        if link_type.is_forward_subgraph() {
            self.refresh_eval_order();
        }
        Ok(())
    }

    fn try_mutate_weight(&mut self) -> Result<()> {
        let mut candidates = Vec::new();
        let mut weights = Vec::new();
        for (li, layer) in self.layers.iter().enumerate() {
            for (ni, node) in layer.nodes().iter().enumerate() {
                for src in node.incoming().keys() {
                    candidates.push((NodeId::new(li, ni), *src));
                    weights.push(node.age() as f64 + 1.0);
                }
            }
        }
        if candidates.is_empty() {
            return Err(CoreError::structural_rejection("network has no links"));
        }
        let idx = rng::roulette(&weights).unwrap_or(0);
        let (tgt, src) = candidates[idx];
        self.last_weight_mutation = Some((tgt, src));
        let changed = self
            .node_mut(tgt)
            .incoming_mut()
            .get_mut(&src)
            .expect("just selected")
            .weight_mut()
            .mutate();
        if changed {
            Ok(())
        } else {
            Err(CoreError::structural_rejection("weight mutation produced no change"))
        }
    }

    fn try_mutate_tau(&mut self) -> Result<()> {
        if self.params.kind != NetworkKind::Spiking {
            return Err(CoreError::structural_rejection("tau only applies to spiking networks"));
        }
        let candidates: Vec<NodeId> = self
            .layers
            .iter()
            .enumerate()
            .flat_map(|(li, l)| (0..l.len()).map(move |ni| NodeId::new(li, ni)))
            .filter(|id| self.node(*id).tau().is_some())
            .collect();
        if candidates.is_empty() {
            return Err(CoreError::structural_rejection("no node carries a tau parameter"));
        }
        let id = candidates[rng::rnd_int(0, candidates.len())];
        self.node_mut(id).tau_mut().expect("filtered above").mutate();
        Ok(())
    }

    fn try_mutate_transfer(&mut self) -> Result<()> {
        if self.params.kind != NetworkKind::Classical {
            return Err(CoreError::structural_rejection(
                "transfer function mutation only applies to classical networks",
            ));
        }
        if self.node_count() == 0 {
            return Err(CoreError::structural_rejection("network has no nodes"));
        }
        let id = self.random_node_addr();
        self.node_mut(id).mutate_transfer();
        Ok(())
    }

    // ---------------------------------------------------------------
    // Connectivity machinery
    // ---------------------------------------------------------------

    fn layer_relation_ok(lt: LinkType, source_layer: usize, target_layer: usize) -> bool {
        match lt {
            LinkType::Forward => target_layer == source_layer + 1,
            LinkType::Skip => target_layer >= source_layer + 2,
            LinkType::Lateral => target_layer == source_layer,
            LinkType::Recurrent => true,
        }
    }

    fn forward_adjacency(&self) -> HashMap<NodeId, Vec<NodeId>> {
        let mut adj: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for (li, layer) in self.layers.iter().enumerate() {
            for (ni, node) in layer.nodes().iter().enumerate() {
                let tgt = NodeId::new(li, ni);
                for (src, link) in node.incoming() {
                    if link.link_type().is_forward_subgraph() {
                        adj.entry(*src).or_default().push(tgt);
                    }
                }
            }
        }
        adj
    }

    fn forward_path_exists(&self, from: NodeId, to: NodeId) -> bool {
        let adj = self.forward_adjacency();
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(cur) = stack.pop() {
            if cur == to {
                return true;
            }
            if !seen.insert(cur) {
                continue;
            }
            if let Some(neighbors) = adj.get(&cur) {
                stack.extend(neighbors.iter().copied());
            }
        }
        false
    }

    /// Candidate targets a node at `src` may legally connect to with a
    /// link of type `lt`: correct layer relation, role-compatible,
    /// not already linked, and (for `Forward`/`Skip`) cycle-free or (for
    /// `Recurrent`) cycle-closing.
    fn free_targets(&self, src: NodeId, lt: LinkType) -> Vec<NodeId> {
        if matches!(lt, LinkType::Forward | LinkType::Skip) && !self.node(src).role().accepts_forward_source() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for (li, layer) in self.layers.iter().enumerate() {
            if !Self::layer_relation_ok(lt, src.layer, li) {
                continue;
            }
            for (ni, node) in layer.nodes().iter().enumerate() {
                let tgt = NodeId::new(li, ni);
                if tgt == src || node.has_source(src) {
                    continue;
                }
                if matches!(lt, LinkType::Forward | LinkType::Skip) && !node.role().accepts_forward_target() {
                    continue;
                }
                let legal = match lt {
                    LinkType::Forward | LinkType::Skip => !self.forward_path_exists(tgt, src),
                    LinkType::Recurrent => self.forward_path_exists(tgt, src),
                    LinkType::Lateral => true,
                };
                if legal {
                    out.push(tgt);
                }
            }
        }
        out
    }

    fn add_link(&mut self, src: NodeId, tgt: NodeId, lt: LinkType, params: &NetworkParams) -> Result<()> {
        if src == tgt {
            return Err(CoreError::structural_rejection("a node cannot link to itself"));
        }
        if !Self::layer_relation_ok(lt, src.layer, tgt.layer) {
            return Err(CoreError::structural_rejection("layer relation violates link policy"));
        }
        if self.node(tgt).has_source(src) {
            return Err(CoreError::structural_rejection("link already exists"));
        }
        match lt {
            LinkType::Forward | LinkType::Skip => {
                if !self.node(src).role().accepts_forward_source() || !self.node(tgt).role().accepts_forward_target() {
                    return Err(CoreError::structural_rejection("role forbids this link"));
                }
                if self.forward_path_exists(tgt, src) {
                    return Err(CoreError::structural_rejection("would create a cycle"));
                }
            }
            LinkType::Recurrent => {
                if !self.forward_path_exists(tgt, src) {
                    return Err(CoreError::structural_rejection("recurrent link would not close a cycle"));
                }
            }
            LinkType::Lateral => {}
        }

        let link = Link::new(&LinkDef { link_type: lt, weight: None }, &params.default_weight);
        self.node_mut(tgt).add_source(src, link);
        self.node_mut(src).add_target(tgt);
        if lt.is_forward_subgraph() {
            self.refresh_eval_order();
        }
        Ok(())
    }

    fn remove_link(&mut self, src: NodeId, tgt: NodeId) {
        self.node_mut(tgt).remove_source(src);
        self.node_mut(src).remove_target(tgt);
    }

    fn disconnect_node(&mut self, id: NodeId) {
        let sources: Vec<NodeId> = self.node(id).incoming().keys().copied().collect();
        let targets: Vec<NodeId> = self.node(id).targets().iter().copied().collect();
        for s in sources {
            self.remove_link(s, id);
        }
        for t in targets {
            self.remove_link(id, t);
        }
    }

    /// After `Vec::remove` shifts every later node in `layer` down by one
    /// index, every `NodeId` elsewhere in the network that pointed past
    /// the removed index must be decremented to stay valid.
    fn reindex_after_removal(&mut self, layer: usize, removed_index: usize) {
        let remap = |id: NodeId| -> NodeId {
            if id.layer == layer && id.node > removed_index {
                NodeId::new(id.layer, id.node - 1)
            } else {
                id
            }
        };
        for l in self.layers.iter_mut() {
            for node in l.nodes_mut() {
                let old = std::mem::take(node.incoming_mut());
                let remapped = old.into_iter().map(|(k, v)| (remap(k), v)).collect();
                *node.incoming_mut() = remapped;
                let old_targets = node.targets().clone();
                node.set_targets(old_targets.into_iter().map(remap).collect());
            }
        }
    }

    fn wire_forward_spine(&mut self) {
        for li in 0..self.layers.len().saturating_sub(1) {
            let sources_len = self.layers[li].len();
            let targets_len = self.layers[li + 1].len();
            if sources_len == 0 || targets_len == 0 {
                continue;
            }
            let params = Arc::clone(&self.params);
            for ni in 0..sources_len {
                if !self.layers[li].nodes()[ni].role().accepts_forward_source() {
                    continue;
                }
                let tgt_idx = rng::rnd_int(0, targets_len);
                let _ = self.add_link(NodeId::new(li, ni), NodeId::new(li + 1, tgt_idx), LinkType::Forward, &params);
            }
            for nj in 0..targets_len {
                if !self.layers[li + 1].nodes()[nj].role().accepts_forward_target() {
                    continue;
                }
                if self.layers[li + 1].nodes()[nj].incoming().is_empty() {
                    let src_idx = rng::rnd_int(0, sources_len);
                    let _ = self.add_link(NodeId::new(li, src_idx), NodeId::new(li + 1, nj), LinkType::Forward, &params);
                }
            }
        }
    }

    fn topo_order(&self) -> Vec<NodeId> {
        let adj = self.forward_adjacency();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut on_stack: HashSet<NodeId> = HashSet::new();
        let mut order = Vec::new();

        fn visit(
            id: NodeId,
            adj: &HashMap<NodeId, Vec<NodeId>>,
            visited: &mut HashSet<NodeId>,
            on_stack: &mut HashSet<NodeId>,
            order: &mut Vec<NodeId>,
        ) {
            if visited.contains(&id) {
                return;
            }
            if !on_stack.insert(id) {
                // Cycle through the forward subgraph; should not happen
                // given the DAG invariant, but evaluation must still
                // terminate if mutation logic ever has a bug.
                return;
            }
            if let Some(neighbors) = adj.get(&id) {
                for &next in neighbors {
                    visit(next, adj, visited, on_stack, order);
                }
            }
            on_stack.remove(&id);
            visited.insert(id);
            order.push(id);
        }

        for (li, layer) in self.layers.iter().enumerate() {
            for ni in 0..layer.len() {
                visit(NodeId::new(li, ni), &adj, &mut visited, &mut on_stack, &mut order);
            }
        }
        order.reverse();
        order
    }

    fn refresh_eval_order(&mut self) {
        if self.params.kind == NetworkKind::Classical {
            self.eval_order = self.topo_order();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::LayerDef;
    use crate::node::NodeDef;
    use crate::param::Distribution;

    fn default_params(kind: NetworkKind) -> Arc<NetworkParams> {
        Arc::new(NetworkParams {
            kind,
            allowed_link_types: vec![LinkType::Forward, LinkType::Recurrent, LinkType::Lateral, LinkType::Skip],
            default_weight: ParamDef {
                dist: Distribution::Uniform,
                mean: 0.0,
                sd: 0.3,
                min: -1.0,
                max: 1.0,
            },
            tau_def: ParamDef {
                dist: Distribution::Fixed,
                mean: 5.0,
                sd: 0.5,
                min: 0.1,
                max: 20.0,
            },
            mutation: MutationWeights {
                add_node: 0.1,
                erase_node: 0.1,
                add_link: 0.2,
                erase_link: 0.1,
                weight: 0.4,
                tau: 0.05,
                transfer_function: 0.05,
                adaptive: false,
            },
            stdp: StdpParams { rate: 0.05, dp_ratio: 1.2 },
            spike_lif: true,
            spike_encoding: SpikeEncoding::Time,
            spike_max_delay: 0.5,
            fitness_alpha: None,
        })
    }

    fn xor_genome() -> Genome {
        Genome::new(vec![
            LayerDef {
                kind: LayerKind::Regular,
                nodes: vec![NodeDef::default(); 2],
                fixed: true,
            },
            LayerDef {
                kind: LayerKind::Regular,
                nodes: vec![NodeDef::default(); 1],
                fixed: true,
            },
        ])
    }

    #[test]
    fn from_genome_wires_every_node_into_the_forward_spine() {
        rng::seed(42);
        let genome = xor_genome();
        let net = Network::from_genome(&genome, default_params(NetworkKind::Classical));
        assert_eq!(net.layers().len(), 2);
        assert!(!net.layers()[1].nodes()[0].incoming().is_empty());
    }

    #[test]
    fn classical_evaluate_respects_sample_shape() {
        rng::seed(1);
        let genome = xor_genome();
        let mut net = Network::from_genome(&genome, default_params(NetworkKind::Classical));
        assert!(net.evaluate(&[0.0]).is_err());
        assert!(net.evaluate(&[0.0, 1.0]).is_ok());
    }

    #[test]
    fn classical_evaluate_is_deterministic_given_fixed_weights() {
        rng::seed(5);
        let genome = xor_genome();
        let mut net = Network::from_genome(&genome, default_params(NetworkKind::Classical));
        let out1 = net.evaluate(&[0.3, 0.7]).unwrap();
        let out2 = net.evaluate(&[0.3, 0.7]).unwrap();
        assert_eq!(out1, out2);
    }

    #[test]
    fn deep_clone_preserves_topology_and_resets_age() {
        rng::seed(6);
        let genome = xor_genome();
        let mut net = Network::from_genome(&genome, default_params(NetworkKind::Classical));
        net.tick_age();
        net.tick_age();
        let clone = net.deep_clone();
        assert_eq!(clone.age(), 0);
        assert_eq!(clone.node_count(), net.node_count());
        assert_eq!(clone.link_count(), net.link_count());
    }

    #[test]
    fn recurrent_link_requires_existing_forward_path() {
        rng::seed(7);
        let genome = xor_genome();
        let params = default_params(NetworkKind::Classical);
        let mut net = Network::from_genome(&genome, Arc::clone(&params));
        // output -> input is legal only because input already forward-reaches output.
        let result = net.add_link(NodeId::new(1, 0), NodeId::new(0, 0), LinkType::Recurrent, &params);
        assert!(result.is_ok());
    }

    #[test]
    fn forward_link_rejected_when_layer_relation_is_violated() {
        rng::seed(8);
        let genome = xor_genome();
        let params = default_params(NetworkKind::Classical);
        let mut net = Network::from_genome(&genome, Arc::clone(&params));
        // input already forward-reaches output (confirming the forward
        // spine wired up). With only two layers there is no legal `Skip`
        // layer pair (`target >= source + 2`), so `add_link` must reject
        // it at the layer-relation check before cycle detection even runs.
        assert!(net.forward_path_exists(NodeId::new(0, 0), NodeId::new(1, 0)));
        let result = net.add_link(NodeId::new(0, 0), NodeId::new(1, 0), LinkType::Skip, &params);
        assert!(result.is_err());
    }

    #[test]
    fn mutate_idempotent_on_repeated_rejection_is_a_noop() {
        rng::seed(9);
        let genome = Genome::new(vec![LayerDef {
            kind: LayerKind::Regular,
            nodes: vec![NodeDef::default()],
            fixed: true,
        }]);
        let mut params = (*default_params(NetworkKind::Classical)).clone();
        params.mutation = MutationWeights {
            add_node: 0.0,
            erase_node: 0.0,
            add_link: 0.0,
            erase_link: 0.0,
            weight: 0.0,
            tau: 0.0,
            transfer_function: 1.0,
            adaptive: false,
        };
        let mut net = Network::from_genome(&genome, Arc::new(params.clone()));
        // Single-node network: transfer mutation is the only enabled
        // operator and it always succeeds (one node to pick), so this
        // exercises the "operator applies" path rather than rejection,
        // but confirms `mutate` never panics with a maximally constrained
        // operator set.
        let outcome = net.mutate(&params);
        assert!(outcome.applied() || matches!(outcome, MutationOutcome::Rejected { .. }));
    }

    #[test]
    fn saturation_is_zero_for_trivial_networks() {
        let genome = Genome::new(vec![LayerDef {
            kind: LayerKind::Regular,
            nodes: vec![NodeDef::default()],
            fixed: true,
        }]);
        let net = Network::from_genome(&genome, default_params(NetworkKind::Classical));
        assert_eq!(net.saturation(), 0.0);
    }

    #[test]
    fn spiking_network_produces_output_times() {
        rng::seed(10);
        let genome = xor_genome();
        let mut net = Network::from_genome(&genome, default_params(NetworkKind::Spiking));
        let out = net.evaluate(&[1.0, 2.0]).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn crossover_of_equal_length_parents_keeps_layer_count() {
        rng::seed(12);
        let params = default_params(NetworkKind::Classical);
        let mut p1 = Network::from_genome(&xor_genome(), Arc::clone(&params));
        let mut p2 = Network::from_genome(&xor_genome(), Arc::clone(&params));
        p1.fitness_mut().rel = 0.8;
        p2.fitness_mut().rel = 0.2;
        let child = Network::crossover(&p1, &p2, Arc::clone(&params));
        assert_eq!(child.layers().len(), 2);
    }

    #[test]
    fn crossover_of_mismatched_length_parents_lands_within_expected_range() {
        // A 3-layer and a 5-layer parent must produce a child with
        // somewhere between 3 and 5 layers (invariant: never shorter than
        // the shorter parent, never longer than the longer one).
        rng::seed(13);
        let params = default_params(NetworkKind::Classical);
        let short = Genome::new(vec![
            LayerDef { kind: LayerKind::Regular, nodes: vec![NodeDef::default(); 2], fixed: true },
            LayerDef { kind: LayerKind::Regular, nodes: vec![NodeDef::default(); 2], fixed: false },
            LayerDef { kind: LayerKind::Regular, nodes: vec![NodeDef::default(); 1], fixed: true },
        ]);
        let long = Genome::new(vec![
            LayerDef { kind: LayerKind::Regular, nodes: vec![NodeDef::default(); 2], fixed: true },
            LayerDef { kind: LayerKind::Regular, nodes: vec![NodeDef::default(); 3], fixed: false },
            LayerDef { kind: LayerKind::Regular, nodes: vec![NodeDef::default(); 3], fixed: false },
            LayerDef { kind: LayerKind::Regular, nodes: vec![NodeDef::default(); 2], fixed: false },
            LayerDef { kind: LayerKind::Regular, nodes: vec![NodeDef::default(); 1], fixed: true },
        ]);
        let mut p1 = Network::from_genome(&short, Arc::clone(&params));
        let mut p2 = Network::from_genome(&long, Arc::clone(&params));
        p1.fitness_mut().rel = 0.5;
        p2.fitness_mut().rel = 0.5;
        for _ in 0..20 {
            let child = Network::crossover(&p1, &p2, Arc::clone(&params));
            assert!((3..=5).contains(&child.layers().len()));
        }
    }

    #[test]
    fn set_fitness_advances_stage_on_crossing_and_reports_solved_at_test() {
        rng::seed(11);
        let genome = xor_genome();
        let mut net = Network::from_genome(&genome, default_params(NetworkKind::Classical));
        assert_eq!(net.stage(), Stage::Train);
        net.set_fitness(1.0, 0.5);
        assert_eq!(net.stage(), Stage::Dev);
        net.set_fitness(1.0, 0.5);
        assert_eq!(net.stage(), Stage::Test);
        let update = net.set_fitness(1.0, 0.5);
        assert!(update.solved);
    }
}
