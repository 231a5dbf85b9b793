//! The experiment configuration document (spec.md §6) and its
//! translation into the validated, `evo-core`-facing [`evo_core::NetworkParams`].
//!
//! Grounded on `examples/original_source/src/lib/global/conf/*.hpp` for the
//! section layout (`NetConf`, `LinkConf`, `MutConf`, `DataConf`, `FitConf`) —
//! `evo-core` never parses JSON itself; this module is the "configuration
//! loader" external collaborator spec.md's data model treats as given.

use std::collections::HashSet;

use evo_core::{Distribution, LinkType, NetworkKind};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuntimeError};

/// Initial-value/perturbation distribution for a scalar parameter — the
/// JSON-facing twin of [`evo_core::ParamDef`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistKind {
    /// Always the mean.
    Fixed,
    /// Uniform over `[min, max]`.
    Uniform,
    /// Normal around `mean` with spread `sd`.
    Normal,
    /// `mean + |Normal(0, sd)|`.
    PosNormal,
    /// `mean - |Normal(0, sd)|`.
    NegNormal,
}

impl From<DistKind> for Distribution {
    fn from(value: DistKind) -> Self {
        match value {
            DistKind::Fixed => Distribution::Fixed,
            DistKind::Uniform => Distribution::Uniform,
            DistKind::Normal => Distribution::Normal,
            DistKind::PosNormal => Distribution::PosNormal,
            DistKind::NegNormal => Distribution::NegNormal,
        }
    }
}

/// JSON-facing mirror of [`evo_core::ParamDef`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamDefDoc {
    /// Sampling distribution.
    pub dist: DistKind,
    /// Distribution mean.
    pub mean: f64,
    /// Initial/floor perturbation standard deviation.
    pub sd: f64,
    /// Inclusive lower bound.
    pub min: f64,
    /// Inclusive upper bound.
    pub max: f64,
}

impl ParamDefDoc {
    fn to_core(self) -> evo_core::ParamDef {
        evo_core::ParamDef {
            dist: self.dist.into(),
            mean: self.mean,
            sd: self.sd,
            min: self.min,
            max: self.max,
        }
    }

    fn validate(&self, name: &str, errs: &mut Vec<String>) {
        if self.min > self.max {
            errs.push(format!("{name}: min ({}) > max ({})", self.min, self.max));
        }
        if self.sd <= 0.0 {
            errs.push(format!("{name}: sd must be > 0, got {}", self.sd));
        }
    }
}

/// Layer kind as it appears in the configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKindDoc {
    /// Densely-addressable nodes.
    Regular,
    /// Nodes interpreted as a receptive-field grid by a front-end.
    Convolutional,
}

impl From<LayerKindDoc> for evo_core::LayerKind {
    fn from(value: LayerKindDoc) -> Self {
        match value {
            LayerKindDoc::Regular => evo_core::LayerKind::Regular,
            LayerKindDoc::Convolutional => evo_core::LayerKind::Convolutional,
        }
    }
}

/// JSON-facing mirror of [`evo_core::NodeDef`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeDefDoc {
    /// `(depth, height, width)`.
    pub dim: (usize, usize, usize),
    /// Membrane time constant seed (spiking networks only).
    #[serde(default = "default_tau")]
    pub tau: f64,
}

fn default_tau() -> f64 {
    1.0
}

/// JSON-facing mirror of [`evo_core::LayerDef`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDefDoc {
    /// Layer kind.
    #[serde(rename = "type")]
    pub kind: LayerKindDoc,
    /// Per-node definitions.
    pub nodes: Vec<NodeDefDoc>,
    /// Whether the layer may add/remove nodes under mutation.
    pub fixed: bool,
}

impl LayerDefDoc {
    fn to_core(&self) -> evo_core::LayerDef {
        evo_core::LayerDef {
            kind: self.kind.into(),
            nodes: self
                .nodes
                .iter()
                .map(|n| evo_core::NodeDef { dim: n.dim, tau: n.tau })
                .collect(),
            fixed: self.fixed,
        }
    }
}

/// Network family (`net.type`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetTypeDoc {
    /// Continuous-activation feed-forward/recurrent networks.
    Classical,
    /// Event-driven leaky integrate-and-fire networks.
    Spiking,
    /// Classical networks using `Convolutional` input layers.
    Convolutional,
}

impl NetTypeDoc {
    fn to_core(self) -> NetworkKind {
        match self {
            NetTypeDoc::Classical | NetTypeDoc::Convolutional => NetworkKind::Classical,
            NetTypeDoc::Spiking => NetworkKind::Spiking,
        }
    }
}

/// Spike-coding scheme (`net.spike.enc`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpikeEncDoc {
    /// Sample value is the spike emission time.
    Time,
    /// Spike times assigned by relative rank.
    RankOrder,
}

impl From<SpikeEncDoc> for evo_core::network::SpikeEncoding {
    fn from(value: SpikeEncDoc) -> Self {
        match value {
            SpikeEncDoc::Time => evo_core::network::SpikeEncoding::Time,
            SpikeEncDoc::RankOrder => evo_core::network::SpikeEncoding::RankOrder,
        }
    }
}

/// `net.init.*`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetInit {
    /// Initial population size.
    pub count: usize,
    /// Initial layer shape (must hold at least 2 layers).
    pub layers: Vec<LayerDefDoc>,
}

/// `net.max.*`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NetMax {
    /// Population cap.
    pub count: usize,
    /// Age cap (`0` disables forced retirement).
    pub age: u64,
}

/// `net.spike.*`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NetSpike {
    /// Decay the membrane between inputs.
    pub lif: bool,
    /// Spike-coding scheme.
    pub enc: SpikeEncDoc,
    /// Upper bound for a spike's emission delay.
    pub max_delay: f64,
}

/// `net.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetSection {
    /// Network family.
    #[serde(rename = "type")]
    pub kind: NetTypeDoc,
    /// Initial-population options.
    pub init: NetInit,
    /// Population/age caps.
    pub max: NetMax,
    /// Spiking-network options; ignored for `classical`/`convolutional`.
    pub spike: NetSpike,
}

/// `node.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSection {
    /// Membrane time constant distribution.
    pub tau: ParamDefDoc,
}

/// `link.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSection {
    /// Allowed structural link kinds (`forward` is always implicitly
    /// included).
    pub types: HashSet<LinkTypeDoc>,
    /// Default weight distribution.
    pub weight: ParamDefDoc,
}

/// Link kind as it appears in the configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTypeDoc {
    /// `s -> s+1`.
    Forward,
    /// Any `s`, `t`, must close a cycle.
    Recurrent,
    /// `s -> s`.
    Lateral,
    /// `s -> t >= s+2`.
    Skip,
}

impl From<LinkTypeDoc> for LinkType {
    fn from(value: LinkTypeDoc) -> Self {
        match value {
            LinkTypeDoc::Forward => LinkType::Forward,
            LinkTypeDoc::Recurrent => LinkType::Recurrent,
            LinkTypeDoc::Lateral => LinkType::Lateral,
            LinkTypeDoc::Skip => LinkType::Skip,
        }
    }
}

/// `species.init.*`/`species.max.*`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpeciesCount {
    /// Count.
    pub count: usize,
}

/// `species.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesSection {
    /// Whether speciation is active; when `false` one global genome is used.
    pub enabled: bool,
    /// Initial species count.
    pub init: SpeciesCount,
    /// Species cap.
    pub max: SpeciesCount,
}

/// Parameter-optimisation method (`learning.mode`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningModeDoc {
    /// Self-tuning `Parameter::mutate`/`optimise`.
    Mutation,
    /// Spike-timing-dependent plasticity (spiking networks only).
    Stdp,
}

/// `learning.mutation.*`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LearningMutation {
    /// SD scaling step applied by `Parameter::optimise`.
    pub scale: f64,
}

/// `learning.stdp.*`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LearningStdp {
    /// Base STDP learning rate.
    pub rate: f64,
    /// LTD/LTP strength ratio.
    pub dp_ratio: f64,
}

/// Per-operator structural mutation weights (`learning.mutation.prob.*`,
/// named `conf.mutation.prob` in spec.md §4.6). Grounded on
/// `original_source/src/lib/global/conf/MutConf.hpp`'s `prob` map.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MutationProb {
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
}

/// `learning.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningSection {
    /// Parameter-optimisation method.
    pub mode: LearningModeDoc,
    /// Whether node-operator weights scale by network saturation.
    pub adaptive: bool,
    /// Structural mutation operator weights.
    pub prob: MutationProb,
    /// Self-tuning mutation options.
    pub mutation: LearningMutation,
    /// STDP options.
    pub stdp: LearningStdp,
}

/// `fitness.*` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FitnessSection {
    /// The fitness value networks strive towards; crossing it advances the
    /// `Train -> Dev -> Test` stage ratchet. Grounded on
    /// `original_source/src/lib/global/conf/FitConf.hpp`'s `tgt` field —
    /// named in spec.md §4.6 ("promote stage when target crossed") but
    /// absent from the §6 option table, which this section supplements.
    pub target: f64,
    /// `Some(alpha)` selects EMA fitness tracking; `None` selects simple
    /// (Welford) tracking.
    pub stat: FitnessStat,
}

/// `fitness.stat.*`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FitnessStat {
    /// `EMA` forgetting factor; `0.0` selects simple statistics.
    pub alpha: f64,
}

/// Task family (`task.type`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskTypeDoc {
    /// Discrete-label classification.
    Classification,
    /// Continuous-valued regression.
    Regression,
    /// Sequence/time-series prediction.
    Prediction,
    /// Closed-loop control (e.g. pole-balance).
    Control,
}

/// `task.*` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaskSection {
    /// Task family.
    #[serde(rename = "type")]
    pub kind: TaskTypeDoc,
    /// Experiment repetitions.
    pub runs: u32,
    /// Per-run epoch cap.
    pub epochs: u32,
    /// Worker pool size.
    pub threads: usize,
}

/// Input shape (`data.type`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataTypeDoc {
    /// Fixed-length real vectors.
    RealValued,
    /// Ordered real-valued sequences.
    TimeSeries,
    /// Image-shaped samples (paired with `Convolutional` layers).
    Image,
}

/// `data.sets.*`: relative partition weights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DataSets {
    /// Training-set weight.
    pub train: f64,
    /// Development-set weight.
    pub dev: f64,
    /// Test-set weight.
    pub test: f64,
}

/// `data.*` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DataSection {
    /// Input shape.
    #[serde(rename = "type")]
    pub kind: DataTypeDoc,
    /// Subset size (`0` uses every available sample).
    pub samples: usize,
    /// Train/dev/test partition weights.
    pub sets: DataSets,
}

/// The full experiment configuration document (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// `net.*`.
    pub net: NetSection,
    /// `node.*`.
    pub node: NodeSection,
    /// `link.*`.
    pub link: LinkSection,
    /// `species.*`.
    pub species: SpeciesSection,
    /// `learning.*`.
    pub learning: LearningSection,
    /// `fitness.*`.
    pub fitness: FitnessSection,
    /// `task.*`.
    pub task: TaskSection,
    /// `data.*`.
    pub data: DataSection,
}

impl Config {
    /// A complete, valid default configuration — the document `evo init -g`
    /// writes out. Values are chosen to match the original's defaults
    /// (`original_source/src/lib/global/conf/*::set_defaults`) where named,
    /// and otherwise a conservative XOR-sized classical network.
    pub fn defaults() -> Self {
        Self {
            net: NetSection {
                kind: NetTypeDoc::Classical,
                init: NetInit {
                    count: 100,
                    layers: vec![
                        LayerDefDoc {
                            kind: LayerKindDoc::Regular,
                            nodes: vec![NodeDefDoc { dim: (1, 1, 1), tau: 1.0 }; 2],
                            fixed: true,
                        },
                        LayerDefDoc {
                            kind: LayerKindDoc::Regular,
                            nodes: vec![NodeDefDoc { dim: (1, 1, 1), tau: 1.0 }],
                            fixed: true,
                        },
                    ],
                },
                max: NetMax { count: 500, age: 0 },
                spike: NetSpike {
                    lif: true,
                    enc: SpikeEncDoc::Time,
                    max_delay: 0.5,
                },
            },
            node: NodeSection {
                tau: ParamDefDoc {
                    dist: DistKind::Uniform,
                    mean: 5.0,
                    sd: 0.5,
                    min: 0.1,
                    max: 20.0,
                },
            },
            link: LinkSection {
                types: [LinkTypeDoc::Forward].into_iter().collect(),
                weight: ParamDefDoc {
                    dist: DistKind::Uniform,
                    mean: 0.0,
                    sd: 0.3,
                    min: -1.0,
                    max: 1.0,
                },
            },
            species: SpeciesSection {
                enabled: false,
                init: SpeciesCount { count: 1 },
                max: SpeciesCount { count: 20 },
            },
            learning: LearningSection {
                mode: LearningModeDoc::Mutation,
                adaptive: false,
                prob: MutationProb {
                    add_node: 5.0,
                    erase_node: 5.0,
                    add_link: 30.0,
                    erase_link: 30.0,
                    weight: 1000.0,
                    tau: 10.0,
                    transfer_function: 0.0,
                },
                mutation: LearningMutation { scale: 0.05 },
                stdp: LearningStdp { rate: 0.05, dp_ratio: 1.2 },
            },
            fitness: FitnessSection {
                target: 3.9,
                stat: FitnessStat { alpha: 0.0 },
            },
            task: TaskSection {
                kind: TaskTypeDoc::Classification,
                runs: 5,
                epochs: 500,
                threads: 4,
            },
            data: DataSection {
                kind: DataTypeDoc::RealValued,
                samples: 0,
                sets: DataSets { train: 0.6, dev: 0.2, test: 0.2 },
            },
        }
    }

    /// Parse a configuration document from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| RuntimeError::configuration(vec![format!("could not parse configuration: {e}")]))
    }

    /// Serialize to pretty-printed JSON, for `evo init -g`.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("Config always serializes")
    }

    /// Collect every validation failure rather than stopping at the first
    /// (spec.md §7: "reported en masse at the end of validation").
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errs = Vec::new();

        if self.net.init.layers.len() < 2 {
            errs.push(format!(
                "net.init.layers must hold at least 2 layers, got {}",
                self.net.init.layers.len()
            ));
        }
        if self.net.init.count == 0 {
            errs.push("net.init.count must be > 0".into());
        }
        if self.net.spike.max_delay <= 0.0 {
            errs.push(format!(
                "net.spike.max.delay must be > 0, got {}",
                self.net.spike.max_delay
            ));
        }
        self.node.tau.validate("node.tau", &mut errs);
        self.link.weight.validate("link.weight", &mut errs);

        if self.species.init.count == 0 {
            errs.push("species.init.count must be > 0".into());
        }
        if self.species.enabled && self.species.init.count > self.species.max.count {
            errs.push(format!(
                "species.init.count ({}) exceeds species.max.count ({})",
                self.species.init.count, self.species.max.count
            ));
        }
        if !self.species.enabled && self.species.init.count != 1 {
            errs.push("species.init.count must be 1 when species.enabled is false".into());
        }

        if !(0.0..1.0).contains(&self.learning.mutation.scale) {
            errs.push(format!(
                "learning.mutation.scale must be in (0, 1), got {}",
                self.learning.mutation.scale
            ));
        }
        if !(0.0..1.0).contains(&self.learning.stdp.rate) {
            errs.push(format!(
                "learning.stdp.rate must be in (0, 1), got {}",
                self.learning.stdp.rate
            ));
        }
        let prob = &self.learning.prob;
        let prob_sum = prob.add_node
            + prob.erase_node
            + prob.add_link
            + prob.erase_link
            + prob.weight
            + prob.tau
            + prob.transfer_function;
        if prob_sum <= 0.0 {
            errs.push("learning.prob weights must sum to a positive value".into());
        }

        if self.fitness.stat.alpha < 0.0 || self.fitness.stat.alpha >= 1.0 {
            errs.push(format!(
                "fitness.stat.alpha must be in [0, 1), got {}",
                self.fitness.stat.alpha
            ));
        }

        if self.task.runs == 0 {
            errs.push("task.runs must be > 0".into());
        }
        if self.task.epochs == 0 {
            errs.push("task.epochs must be > 0".into());
        }
        if self.task.threads == 0 {
            errs.push("task.threads must be > 0".into());
        }

        let weight_total = self.data.sets.train + self.data.sets.dev + self.data.sets.test;
        if weight_total <= 0.0 {
            errs.push("data.sets weights must sum to a positive value".into());
        }

        if errs.is_empty() {
            Ok(())
        } else {
            Err(errs)
        }
    }

    /// Build the validated, `evo-core`-facing network parameters this
    /// configuration describes. Call only after [`Config::validate`]
    /// succeeds.
    pub fn to_network_params(&self) -> evo_core::network::NetworkParams {
        let allowed_link_types: Vec<LinkType> = self.link.types.iter().copied().map(LinkType::from).collect();
        let weight_prob = if self.learning.mode == LearningModeDoc::Stdp {
            0.0
        } else {
            self.learning.prob.weight
        };
        evo_core::network::NetworkParams {
            kind: self.net.kind.to_core(),
            allowed_link_types,
            default_weight: self.link.weight.to_core(),
            tau_def: self.node.tau.to_core(),
            mutation: evo_core::network::MutationWeights {
                add_node: self.learning.prob.add_node,
                erase_node: self.learning.prob.erase_node,
                add_link: self.learning.prob.add_link,
                erase_link: self.learning.prob.erase_link,
                weight: weight_prob,
                tau: self.learning.prob.tau,
                transfer_function: self.learning.prob.transfer_function,
                adaptive: self.learning.adaptive,
            },
            stdp: evo_core::network::StdpParams {
                rate: self.learning.stdp.rate,
                dp_ratio: self.learning.stdp.dp_ratio,
            },
            spike_lif: self.net.spike.lif,
            spike_encoding: self.net.spike.enc.into(),
            spike_max_delay: self.net.spike.max_delay,
            fitness_alpha: if self.fitness.stat.alpha > 0.0 {
                Some(self.fitness.stat.alpha)
            } else {
                None
            },
        }
    }

    /// This configuration's initial layer shape, translated to `evo-core`'s
    /// representation.
    pub fn initial_layers(&self) -> Vec<evo_core::LayerDef> {
        self.net.init.layers.iter().map(LayerDefDoc::to_core).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_successfully() {
        assert!(Config::defaults().validate().is_ok());
    }

    #[test]
    fn json_round_trip_preserves_shape() {
        let cfg = Config::defaults();
        let json = cfg.to_json();
        let parsed = Config::from_json(&json).unwrap();
        assert_eq!(parsed.net.init.count, cfg.net.init.count);
        assert_eq!(parsed.task.runs, cfg.task.runs);
    }

    #[test]
    fn validate_collects_every_failure_not_just_the_first() {
        let mut cfg = Config::defaults();
        cfg.net.init.count = 0;
        cfg.task.runs = 0;
        cfg.task.epochs = 0;
        let errs = cfg.validate().unwrap_err();
        assert!(errs.len() >= 3);
    }

    #[test]
    fn species_disabled_requires_single_init_genome() {
        let mut cfg = Config::defaults();
        cfg.species.enabled = false;
        cfg.species.init.count = 2;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn to_network_params_zeroes_weight_mutation_under_stdp_mode() {
        let mut cfg = Config::defaults();
        cfg.learning.mode = LearningModeDoc::Stdp;
        let params = cfg.to_network_params();
        assert_eq!(params.mutation.weight, 0.0);
    }

    #[test]
    fn forward_link_type_is_not_required_in_the_document() {
        let cfg = Config::defaults();
        // `link.types` may omit `forward`; `Network::from_genome` always
        // adds it implicitly (see `NetworkParams::link_types_for_add`).
        assert!(!cfg.link.types.contains(&LinkTypeDoc::Skip));
    }
}
