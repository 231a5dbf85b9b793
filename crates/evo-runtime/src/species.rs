//! Species registry: networks grouped by structural (layer-shape) equality.
//!
//! Grounded on `examples/original_source/src/lib/cortex/Species.{hpp,cpp}`
//! and `Env::get_species`/`insert_species`/`insert_net`. Lives in
//! `evo-runtime` rather than `evo-core`: like `Env`/`History`/`Task`, it is
//! mutated only by the main thread between epochs (spec.md §5), not by
//! workers evaluating networks concurrently (see `DESIGN.md`'s "open
//! questions resolved").

use evo_core::network::Fitness;
use evo_core::Genome;

use crate::env::NetId;

/// Identifies one species within a [`SpeciesRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeciesId(u64);

/// One structural equivalence class: the genome shared by every member
/// network, plus the species' own absolute/relative fitness.
#[derive(Debug, Clone)]
pub struct SpeciesEntry {
    genome: Genome,
    members: Vec<NetId>,
    fitness: Fitness,
}

impl SpeciesEntry {
    fn new(genome: Genome) -> Self {
        Self {
            genome,
            members: Vec::new(),
            fitness: Fitness::new(None),
        }
    }

    /// The genome shared by every member of this species.
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Networks currently assigned to this species.
    pub fn members(&self) -> &[NetId] {
        &self.members
    }

    /// Whether this species has lost every member (`Env::cull` drops it).
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// This species' absolute/relative fitness.
    pub fn fitness(&self) -> &Fitness {
        &self.fitness
    }

    /// Mutable access, for `Env::calibrate`.
    pub fn fitness_mut(&mut self) -> &mut Fitness {
        &mut self.fitness
    }
}

/// Networks grouped by structural equality (spec.md §3 "Species
/// registry"). Lookup is a linear scan over `species` — the original does
/// the same, and populations are small enough (tens of species) that a
/// hash index would be premature.
#[derive(Debug)]
pub struct SpeciesRegistry {
    enabled: bool,
    max_count: usize,
    next_id: u64,
    species: Vec<(SpeciesId, SpeciesEntry)>,
}

impl SpeciesRegistry {
    /// A fresh, empty registry. `max_count == 0` disables the species cap.
    pub fn new(enabled: bool, max_count: usize) -> Self {
        Self {
            enabled,
            max_count,
            next_id: 0,
            species: Vec::new(),
        }
    }

    /// Whether speciation is active. When disabled the registry holds at
    /// most one species and every genome maps onto it.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Number of species currently tracked.
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// Whether the registry holds no species.
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Every tracked species, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (SpeciesId, &SpeciesEntry)> {
        self.species.iter().map(|(id, s)| (*id, s))
    }

    /// Look up the species matching `genome`'s shape, per
    /// `Env::get_species`: when speciation is disabled, the single
    /// existing species (if any) satisfies every genome; otherwise shape
    /// equality is required.
    pub fn find(&self, genome: &Genome) -> Option<SpeciesId> {
        if !self.enabled {
            return self.species.first().map(|(id, _)| *id);
        }
        self.species
            .iter()
            .find(|(_, s)| &s.genome == genome)
            .map(|(id, _)| *id)
    }

    /// Entry for an existing species.
    pub fn get(&self, id: SpeciesId) -> Option<&SpeciesEntry> {
        self.species.iter().find(|(sid, _)| *sid == id).map(|(_, s)| s)
    }

    /// Mutable entry for an existing species.
    pub fn get_mut(&mut self, id: SpeciesId) -> Option<&mut SpeciesEntry> {
        self.species.iter_mut().find(|(sid, _)| *sid == id).map(|(_, s)| s)
    }

    /// Insert a new species for `genome`, per `Env::insert_species`.
    /// Returns the existing species if speciation is disabled and one
    /// already exists (there is only ever one), or `None` if the species
    /// cap (`0` disables it) has been reached.
    pub fn insert(&mut self, genome: Genome) -> Option<SpeciesId> {
        if !self.enabled && !self.species.is_empty() {
            return self.species.first().map(|(id, _)| *id);
        }
        if self.max_count > 0 && self.species.len() >= self.max_count {
            return None;
        }
        let id = SpeciesId(self.next_id);
        self.next_id += 1;
        self.species.push((id, SpeciesEntry::new(genome)));
        Some(id)
    }

    /// Record that `net` now belongs to `species`.
    pub fn add_member(&mut self, species: SpeciesId, net: NetId) {
        if let Some(entry) = self.get_mut(species) {
            entry.members.push(net);
        }
    }

    /// Remove `net` from `species`'s member list.
    pub fn remove_member(&mut self, species: SpeciesId, net: NetId) {
        if let Some(entry) = self.get_mut(species) {
            entry.members.retain(|&m| m != net);
        }
    }

    /// Drop every species that has lost all its members, per `Env::cull`.
    pub fn prune_empty(&mut self) {
        self.species.retain(|(_, s)| !s.is_empty());
    }

    /// Clear every species (start of a fresh run).
    pub fn clear(&mut self) {
        self.species.clear();
        self.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evo_core::{LayerDef, LayerKind};

    fn shape(n: usize) -> Genome {
        Genome::new(vec![LayerDef {
            kind: LayerKind::Regular,
            nodes: vec![Default::default(); n],
            fixed: false,
        }])
    }

    #[test]
    fn disabled_registry_collapses_every_genome_onto_one_species() {
        let mut reg = SpeciesRegistry::new(false, 0);
        let a = reg.insert(shape(2)).unwrap();
        let b = reg.insert(shape(5)).unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn enabled_registry_keeps_distinct_shapes_separate() {
        let mut reg = SpeciesRegistry::new(true, 0);
        let a = reg.insert(shape(2)).unwrap();
        let b = reg.insert(shape(5)).unwrap();
        assert_ne!(a, b);
        assert_eq!(reg.find(&shape(2)), Some(a));
        assert_eq!(reg.find(&shape(5)), Some(b));
    }

    #[test]
    fn species_cap_rejects_new_shapes_once_reached() {
        let mut reg = SpeciesRegistry::new(true, 1);
        reg.insert(shape(2)).unwrap();
        assert!(reg.insert(shape(5)).is_none());
    }

    #[test]
    fn prune_empty_drops_species_with_no_members() {
        let mut reg = SpeciesRegistry::new(true, 0);
        let a = reg.insert(shape(2)).unwrap();
        reg.add_member(a, NetId::from_raw(0));
        reg.remove_member(a, NetId::from_raw(0));
        assert!(reg.get(a).unwrap().is_empty());
        reg.prune_empty();
        assert!(reg.is_empty());
    }
}
