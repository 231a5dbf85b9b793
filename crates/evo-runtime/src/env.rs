//! The evolutionary loop: population/species bookkeeping, the per-epoch
//! evaluate/calibrate/evolve/cull cycle, and run initialisation.
//!
//! Grounded on `examples/original_source/src/lib/cortex/Env.{hpp,cpp}`;
//! the original's static class with file-scope `hset<NetPtr>`/
//! `hset<SpeciesPtr>` members becomes an owned `Env` value threaded
//! explicitly from `Task`, per `SPEC_FULL.md` §9's "nothing is static
//! after setup" redesign note.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use evo_core::network::{Network, NetworkParams};
use evo_core::mutation::{MutationKind, MutationOutcome};
use evo_core::{rng, Genome, LayerDef, SimpleStat, Statistics};
use log::debug;
use parking_lot::Mutex;

use crate::error::{Result, RuntimeError};
use crate::pool::WorkerPool;
use crate::species::{SpeciesId, SpeciesRegistry};

/// Identifies one network within an [`Env`]'s population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetId(u64);

impl NetId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// A user-supplied evaluator: feeds input through `network.evaluate`,
/// reads `network.output()`, and calls `network.set_fitness(..)` at
/// least once (spec.md §6 "Evaluator contract"). Shared across worker
/// threads, hence `Send + Sync`.
pub type Evaluator = Arc<dyn Fn(&mut Network) + Send + Sync>;

/// Population, species registry, and the evaluate/calibrate/evolve/cull
/// cycle for one experiment run.
pub struct Env {
    params: Arc<NetworkParams>,
    registry: SpeciesRegistry,
    population: HashMap<NetId, Arc<Mutex<Network>>>,
    net_species: HashMap<NetId, SpeciesId>,
    next_net_id: u64,
    net_max_count: usize,
    net_max_age: u64,
    champion: Option<NetId>,
}

impl Env {
    /// A fresh, empty environment. Call [`Env::initialise`] before
    /// evaluating anything.
    pub fn new(
        params: Arc<NetworkParams>,
        species_enabled: bool,
        species_max_count: usize,
        net_max_count: usize,
        net_max_age: u64,
    ) -> Self {
        Self {
            params,
            registry: SpeciesRegistry::new(species_enabled, species_max_count),
            population: HashMap::new(),
            net_species: HashMap::new(),
            next_net_id: 0,
            net_max_count,
            net_max_age,
            champion: None,
        }
    }

    // ---------------------------------------------------------------
    // Initialisation
    // ---------------------------------------------------------------

    /// Build the initial population for one run, per
    /// `examples/original_source/src/lib/cortex/Env.cpp`'s
    /// `Env::initialise`: take `species_init_count` proto-genomes by
    /// successive mutation of `init_layers`, skipping duplicates, and
    /// create `net_init_count / species_init_count` networks per
    /// proto-genome. When speciation is disabled only one proto-genome is
    /// ever produced.
    pub fn initialise(
        &mut self,
        init_layers: Vec<LayerDef>,
        net_init_count: usize,
        species_init_count: usize,
    ) -> Result<()> {
        self.registry.clear();
        self.population.clear();
        self.net_species.clear();
        self.next_net_id = 0;
        self.champion = None;

        let net_quota = (net_init_count / species_init_count.max(1)).max(1);
        let mut genome = Genome::new(init_layers);

        while self.registry.len() < species_init_count {
            let species_id = self
                .registry
                .insert(genome.clone())
                .ok_or_else(|| RuntimeError::initialisation_failed("species cap reached during initialisation"))?;

            for _ in 0..net_quota {
                self.spawn_net(species_id, &genome);
            }

            if !self.registry.enabled() {
                break;
            }

            genome = self.mutate_until_new_species(genome);
        }

        if self.population.is_empty() || self.registry.is_empty() {
            return Err(RuntimeError::initialisation_failed(
                "no networks or species were created",
            ));
        }

        debug!(
            "environment initialised with {} networks and {} species",
            self.population.len(),
            self.registry.len()
        );
        Ok(())
    }

    /// Mutate `genome` (via a throwaway phenotype) until the resulting
    /// shape does not already name a species in the registry, matching
    /// the original's `while (!(mut = genome.mutate())) {} while
    /// (get_species(genome))` double loop.
    fn mutate_until_new_species(&self, genome: Genome) -> Genome {
        loop {
            let mut probe = Network::from_genome(&genome, Arc::clone(&self.params));
            if !probe.mutate(&self.params).applied() {
                continue;
            }
            let candidate = Genome::new(probe.shape());
            if self.registry.find(&candidate).is_none() {
                return candidate;
            }
        }
    }

    fn spawn_net(&mut self, species: SpeciesId, genome: &Genome) -> Option<NetId> {
        if self.net_max_count > 0 && self.population.len() >= self.net_max_count {
            return None;
        }
        let id = NetId(self.next_net_id);
        self.next_net_id += 1;
        let net = Network::from_genome(genome, Arc::clone(&self.params));
        self.population.insert(id, Arc::new(Mutex::new(net)));
        self.registry.add_member(species, id);
        self.net_species.insert(id, species);
        Some(id)
    }

    fn spawn_offspring(&mut self, p1: NetId, p2: NetId) -> Option<NetId> {
        if self.net_max_count > 0 && self.population.len() >= self.net_max_count {
            return None;
        }
        let net1 = Arc::clone(self.population.get(&p1)?);
        let net2 = Arc::clone(self.population.get(&p2)?);
        let child = {
            let g1 = net1.lock();
            let g2 = net2.lock();
            Network::crossover(&g1, &g2, Arc::clone(&self.params))
        };
        let genome = Genome::new(child.shape());
        let species = match self.registry.find(&genome) {
            Some(sid) => sid,
            None => self.registry.insert(genome)?,
        };
        let id = NetId(self.next_net_id);
        self.next_net_id += 1;
        self.population.insert(id, Arc::new(Mutex::new(child)));
        self.registry.add_member(species, id);
        self.net_species.insert(id, species);
        Some(id)
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    /// Number of live networks.
    pub fn net_count(&self) -> usize {
        self.population.len()
    }

    /// Number of live species.
    pub fn species_count(&self) -> usize {
        self.registry.len()
    }

    /// Mean layer count across every live network (`History::Layers`).
    pub fn mean_layer_count(&self) -> f64 {
        self.population_mean(|n| n.layers().len() as f64)
    }

    /// Mean node count across every live network (`History::Nodes`).
    pub fn mean_node_count(&self) -> f64 {
        self.population_mean(|n| n.node_count() as f64)
    }

    /// Mean link count across every live network (`History::Links`).
    pub fn mean_link_count(&self) -> f64 {
        self.population_mean(|n| n.link_count() as f64)
    }

    fn population_mean(&self, f: impl Fn(&Network) -> f64) -> f64 {
        if self.population.is_empty() {
            return 0.0;
        }
        let total: f64 = self.population.values().map(|n| f(&n.lock())).sum();
        total / self.population.len() as f64
    }

    /// The network declared fittest as of the last `calibrate` call, or
    /// the one that first reported the task solved.
    pub fn champion(&self) -> Option<Arc<Mutex<Network>>> {
        self.champion.and_then(|id| self.population.get(&id).cloned())
    }

    // ---------------------------------------------------------------
    // Per-epoch cycle (spec.md §4.7)
    // ---------------------------------------------------------------

    /// Enqueue `evaluator` for every live network and wait for the pool
    /// to drain. `solved` is set by the first worker whose network
    /// reports the task solved (spec.md §5's happens-before boundary);
    /// once set, newly-dequeued jobs skip evaluation rather than racing
    /// further work after the pool has been told to stop.
    pub fn evaluate_epoch(&mut self, pool: &WorkerPool, evaluator: Evaluator, solved: Arc<AtomicBool>) {
        for (&net_id, net) in &self.population {
            let net = Arc::clone(net);
            let evaluator = Arc::clone(&evaluator);
            let solved = Arc::clone(&solved);
            let already_solved = Arc::clone(&solved);
            pool.enqueue(move || {
                if already_solved.load(Ordering::SeqCst) {
                    return;
                }
                let mut guard = net.lock();
                evaluator(&mut guard);
                if guard.is_solved() {
                    solved.store(true, Ordering::SeqCst);
                }
                let _ = net_id;
            });
        }
        pool.wait();

        if solved.load(Ordering::SeqCst) {
            self.champion = self
                .population
                .iter()
                .find(|(_, net)| net.lock().is_solved())
                .map(|(&id, _)| id);
        }
    }

    /// Advance every network's (and its nodes'/links') age by one epoch.
    pub fn tick_age(&mut self) {
        for net in self.population.values() {
            net.lock().tick_age();
        }
    }

    /// Recompute relative fitness per network within its species, and per
    /// species within the population; returns the network with the
    /// highest absolute fitness seen. Grounded on `Env::calibrate`/
    /// `Species::calibrate`.
    pub fn calibrate(&mut self) -> Option<NetId> {
        let mut champion = None;
        let mut champion_fitness = f64::MIN;

        let species_ids: Vec<SpeciesId> = self.registry.iter().map(|(id, _)| id).collect();
        let mut species_abs = Vec::with_capacity(species_ids.len());

        for species_id in species_ids {
            let members = match self.registry.get(species_id) {
                Some(entry) => entry.members().to_vec(),
                None => continue,
            };
            if members.is_empty() {
                species_abs.push((species_id, 0.0));
                continue;
            }

            let mut stat = SimpleStat::new();
            let mut values = Vec::with_capacity(members.len());
            for net_id in &members {
                if let Some(net) = self.population.get(net_id) {
                    let abs = net.lock().fitness().value();
                    stat.update(abs);
                    values.push((*net_id, abs));
                }
            }
            for (net_id, abs) in &values {
                if let Some(net) = self.population.get(net_id) {
                    net.lock().fitness_mut().rel = stat.offset(*abs);
                }
                if *abs > champion_fitness {
                    champion_fitness = *abs;
                    champion = Some(*net_id);
                }
            }
            species_abs.push((species_id, stat.mean()));
        }

        let mut population_stat = SimpleStat::new();
        for (_, abs) in &species_abs {
            population_stat.update(*abs);
        }
        for (species_id, abs) in species_abs {
            if let Some(entry) = self.registry.get_mut(species_id) {
                entry.fitness_mut().update(abs);
                entry.fitness_mut().rel = population_stat.offset(abs);
            }
        }

        if self.champion.is_none() {
            self.champion = champion;
        }
        champion
    }

    /// For every species, spin a crossover wheel weighted by each
    /// member's relative fitness: with probability `net.fitness.rel`
    /// produce an offspring with a fitness-weighted partner from the same
    /// species, otherwise apply a structural mutation. Grounded on
    /// `Species::evolve`.
    pub fn evolve(&mut self) {
        let species_ids: Vec<SpeciesId> = self.registry.iter().map(|(id, _)| id).collect();
        for species_id in species_ids {
            let members = match self.registry.get(species_id) {
                Some(entry) => entry.members().to_vec(),
                None => continue,
            };
            if members.is_empty() {
                continue;
            }

            let weights: Vec<f64> = members
                .iter()
                .map(|id| self.population.get(id).map(|n| n.lock().fitness().rel.max(0.0)).unwrap_or(0.0))
                .collect();

            for &net_id in &members {
                let rel = match self.population.get(&net_id) {
                    Some(n) => n.lock().fitness().rel,
                    None => continue,
                };
                if rng::rnd_chance(rel) {
                    if let Some(idx) = rng::roulette(&weights) {
                        let partner = members[idx];
                        if partner != net_id {
                            self.spawn_offspring(net_id, partner);
                        }
                    }
                } else {
                    self.apply_mutation(net_id);
                }
            }
        }
    }

    /// Apply a structural/parameter mutation to `net_id`. If the mutation
    /// changes the network's shape, relocate it to the species matching
    /// the new shape (creating one if needed); if the species cap blocks
    /// creating a new species for a genuinely new shape, the mutation is
    /// rolled back — this is the registry-level half of spec.md §4.6's
    /// "if the new genome would exceed species.max.count ... the
    /// mutation is rejected", which `Network::mutate` alone cannot
    /// enforce since it knows nothing about the registry.
    fn apply_mutation(&mut self, net_id: NetId) -> MutationOutcome {
        let old_species = self.net_species.get(&net_id).copied();
        let net = match self.population.get(&net_id) {
            Some(n) => Arc::clone(n),
            None => {
                return MutationOutcome::Rejected {
                    kind: MutationKind::Weight,
                    reason: "unknown network".into(),
                }
            }
        };

        let mut guard = net.lock();
        let backup = guard.deep_clone();
        let outcome = guard.mutate(&self.params);
        if !outcome.applied() {
            return outcome;
        }

        let new_genome = Genome::new(guard.shape());
        let unchanged = old_species
            .and_then(|sid| self.registry.get(sid))
            .map(|entry| entry.genome() == &new_genome)
            .unwrap_or(false);
        if unchanged {
            return outcome;
        }

        let relocated = self.registry.find(&new_genome).or_else(|| self.registry.insert(new_genome));
        match relocated {
            Some(target) => {
                drop(guard);
                if let Some(old) = old_species {
                    self.registry.remove_member(old, net_id);
                }
                self.registry.add_member(target, net_id);
                self.net_species.insert(net_id, target);
                outcome
            }
            None => {
                let kind = match &outcome {
                    MutationOutcome::Applied(k) => *k,
                    MutationOutcome::Rejected { kind, .. } => *kind,
                };
                *guard = backup;
                MutationOutcome::Rejected {
                    kind,
                    reason: "species cap reached for new genome shape".into(),
                }
            }
        }
    }

    /// Forcibly retire over-age networks, then compute an age-weighted
    /// cull probability for every survivor and sample deletions.
    /// Grounded on `Env::cull`.
    pub fn cull(&mut self) {
        let mut age_stat = SimpleStat::new();
        for net in self.population.values() {
            age_stat.update(net.lock().age() as f64);
        }

        let mut doomed = Vec::new();
        for (&net_id, net) in &self.population {
            let (age, net_rel) = {
                let g = net.lock();
                (g.age(), g.fitness().rel)
            };
            if self.net_max_age > 0 && age > self.net_max_age {
                doomed.push(net_id);
                continue;
            }
            let species_rel = self
                .net_species
                .get(&net_id)
                .and_then(|sid| self.registry.get(*sid))
                .map(|entry| entry.fitness().rel)
                .unwrap_or(0.0);
            let cull_prob = (age_stat.offset_via(age as f64, f64::tanh) * (1.0 - net_rel) * (1.0 - species_rel))
                .clamp(0.0, 1.0);
            if rng::rnd_chance(cull_prob) {
                doomed.push(net_id);
            }
        }

        for net_id in doomed {
            if let Some(sid) = self.net_species.remove(&net_id) {
                self.registry.remove_member(sid, net_id);
            }
            self.population.remove(&net_id);
            if self.champion == Some(net_id) {
                self.champion = None;
            }
        }
        self.registry.prune_empty();
    }

    /// One full epoch: tick ages, calibrate, evolve each species, cull.
    /// Callers run [`Env::evaluate_epoch`] first; this covers spec.md
    /// §4.7 steps 2-4 plus the per-epoch age increment.
    pub fn evolve_epoch(&mut self) -> Option<NetId> {
        self.tick_age();
        let champion = self.calibrate();
        self.evolve();
        self.cull();
        champion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evo_core::link::LinkType;
    use evo_core::network::{MutationWeights, NetworkKind, SpikeEncoding, StdpParams};
    use evo_core::param::{Distribution, ParamDef};
    use evo_core::{LayerKind, NodeDef};

    fn params() -> Arc<NetworkParams> {
        Arc::new(NetworkParams {
            kind: NetworkKind::Classical,
            allowed_link_types: vec![LinkType::Forward],
            default_weight: ParamDef {
                dist: Distribution::Uniform,
                mean: 0.0,
                sd: 0.3,
                min: -1.0,
                max: 1.0,
            },
            tau_def: ParamDef {
                dist: Distribution::Fixed,
                mean: 1.0,
                sd: 0.1,
                min: 0.1,
                max: 5.0,
            },
            mutation: MutationWeights {
                add_node: 1.0,
                erase_node: 1.0,
                add_link: 1.0,
                erase_link: 1.0,
                weight: 5.0,
                tau: 0.0,
                transfer_function: 1.0,
                adaptive: false,
            },
            stdp: StdpParams { rate: 0.05, dp_ratio: 1.2 },
            spike_lif: true,
            spike_encoding: SpikeEncoding::Time,
            spike_max_delay: 0.5,
            fitness_alpha: None,
        })
    }

    fn init_layers() -> Vec<LayerDef> {
        vec![
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
        ]
    }

    #[test]
    fn initialise_builds_requested_population_and_species_count() {
        let mut env = Env::new(params(), true, 20, 0, 0);
        env.initialise(init_layers(), 10, 2).unwrap();
        assert_eq!(env.net_count(), 10);
        assert_eq!(env.species_count(), 2);
    }

    #[test]
    fn disabled_speciation_produces_a_single_species() {
        let mut env = Env::new(params(), false, 20, 0, 0);
        env.initialise(init_layers(), 10, 1).unwrap();
        assert_eq!(env.species_count(), 1);
    }

    #[test]
    fn calibrate_assigns_relative_fitness_and_reports_a_champion() {
        let mut env = Env::new(params(), false, 20, 0, 0);
        env.initialise(init_layers(), 4, 1).unwrap();
        for (i, net) in env.population.values().enumerate() {
            net.lock().set_fitness(i as f64, 1000.0);
        }
        let champion = env.calibrate();
        assert!(champion.is_some());
    }

    #[test]
    fn cull_can_remove_the_entire_population_under_zero_relative_fitness() {
        let mut env = Env::new(params(), false, 20, 0, 0);
        env.initialise(init_layers(), 6, 1).unwrap();
        env.calibrate();
        for _ in 0..20 {
            env.cull();
        }
        // Every network's relative fitness is its species' only member's
        // neutral default, so cull probability stays bounded; we only
        // assert the registry never panics and stays internally
        // consistent (no orphaned members).
        for (_, entry) in env.registry.iter() {
            for member in entry.members() {
                assert!(env.population.contains_key(member));
            }
        }
    }

    #[test]
    fn net_max_age_forces_retirement() {
        let mut env = Env::new(params(), false, 20, 0, 1);
        env.initialise(init_layers(), 2, 1).unwrap();
        env.tick_age();
        env.tick_age();
        env.cull();
        assert_eq!(env.net_count(), 0);
    }
}
