//! Bounded, self-mutating scalar parameters.
//!
//! Grounded on `examples/original_source/src/lib/core/Param.{hpp,cpp}`: a
//! parameter carries its own perturbation standard deviation and the last
//! direction a mutation moved it in, so that `optimise` can reward or punish
//! that direction once the owning network's fitness delta is known.

use crate::rng;

/// Smallest standard deviation a parameter is allowed to decay to; keeps
/// the "after any mutation `sd > 0`" invariant intact under repeated
/// `optimise(Dec)` calls.
const MIN_SD: f64 = 1e-6;

/// Maximum number of resample attempts `Parameter::mutate` makes before
/// accepting a boundary-clamped value.
const MAX_MUTATE_ATTEMPTS: u32 = 5;

/// Initial-value sampling distribution for a [`Parameter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Distribution {
    /// Always the distribution's mean.
    Fixed,
    /// Uniform over `[min, max]`.
    Uniform,
    /// Normal around `mean` with standard deviation `sd`.
    Normal,
    /// `mean + |Normal(0, sd)|` — always at or above `mean`.
    PosNormal,
    /// `mean - |Normal(0, sd)|` — always at or below `mean`.
    NegNormal,
}

/// The direction a parameter's last mutation moved it, or the effect a
/// fitness delta had on the network that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    /// Increasing.
    Inc,
    /// Decreasing.
    Dec,
    /// No committed direction yet.
    Undef,
}

impl Direction {
    fn of_delta(delta: f64) -> Self {
        if delta > 0.0 {
            Direction::Inc
        } else if delta < 0.0 {
            Direction::Dec
        } else {
            Direction::Undef
        }
    }

    fn flipped(self) -> Self {
        match self {
            Direction::Inc => Direction::Dec,
            Direction::Dec => Direction::Inc,
            Direction::Undef => Direction::Undef,
        }
    }
}

/// Declarative definition a [`Parameter`] is constructed from — the
/// configuration-facing counterpart of the live, mutable `Parameter`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamDef {
    /// Initial-value sampling distribution.
    pub dist: Distribution,
    /// Distribution mean (ignored by `Uniform`).
    pub mean: f64,
    /// Initial and floor perturbation standard deviation.
    pub sd: f64,
    /// Inclusive lower bound.
    pub min: f64,
    /// Inclusive upper bound.
    pub max: f64,
}

impl ParamDef {
    /// A parameter fixed at `value`.
    pub fn fixed(value: f64) -> Self {
        Self {
            dist: Distribution::Fixed,
            mean: value,
            sd: MIN_SD,
            min: value,
            max: value,
        }
    }
}

/// A bounded, mutable scalar with self-tuning perturbation strength.
///
/// Invariant: after construction and after every `mutate`/`optimise` call,
/// `value ∈ [min, max]` and `sd > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    value: f64,
    sd: f64,
    direction: Direction,
    min: f64,
    max: f64,
    /// Step used to grow/shrink `sd`; mirrors `learning.mutation.scale`.
    scale: f64,
}

impl Parameter {
    /// Draw an initial value from `def.dist`, clamped to `[def.min,
    /// def.max]`. Out-of-bounds draws (possible for `Normal`/`PosNormal`/
    /// `NegNormal`) fall back to a uniform draw within bounds.
    pub fn new(def: &ParamDef) -> Self {
        Self::with_scale(def, 0.5)
    }

    /// As [`Parameter::new`], with an explicit `sd` growth/shrink step
    /// (the configured `learning.mutation.scale`).
    pub fn with_scale(def: &ParamDef, scale: f64) -> Self {
        let value = Self::sample_initial(def);
        Self {
            value,
            sd: def.sd.max(MIN_SD),
            direction: Direction::Undef,
            min: def.min,
            max: def.max,
            scale: scale.clamp(MIN_SD, 1.0 - MIN_SD),
        }
    }

    fn sample_initial(def: &ParamDef) -> f64 {
        let candidate = match def.dist {
            Distribution::Fixed => def.mean,
            Distribution::Uniform => return rng::rnd_real(def.min, def.max),
            Distribution::Normal => rng::rnd_nd(def.mean, def.sd),
            Distribution::PosNormal => def.mean + rng::rnd_nd(0.0, def.sd).abs(),
            Distribution::NegNormal => def.mean - rng::rnd_nd(0.0, def.sd).abs(),
        };
        if candidate >= def.min && candidate <= def.max {
            candidate
        } else {
            rng::rnd_real(def.min, def.max)
        }
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Current perturbation standard deviation.
    pub fn sd(&self) -> f64 {
        self.sd
    }

    /// Last committed mutation direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Inclusive bounds.
    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Perturb the value by a draw from `Normal(0, sd)`, oriented by the
    /// current direction. Rejects (and resamples) moves that would leave
    /// `[min, max]`, up to [`MAX_MUTATE_ATTEMPTS`] times; the final attempt
    /// is clamped to the boundary rather than discarded. Returns whether
    /// the value actually changed.
    pub fn mutate(&mut self) -> bool {
        let original = self.value;
        let mut candidate = self.value;
        let mut direction = self.direction;

        for attempt in 0..MAX_MUTATE_ATTEMPTS {
            let delta = rng::rnd_nd(0.0, self.sd);
            let (next, dir) = match self.direction {
                Direction::Inc => (self.value + delta.abs(), Direction::Inc),
                Direction::Dec => (self.value - delta.abs(), Direction::Dec),
                Direction::Undef => (self.value + delta, Direction::of_delta(delta)),
            };
            candidate = next;
            direction = dir;

            if candidate >= self.min && candidate <= self.max {
                break;
            }
            if attempt + 1 == MAX_MUTATE_ATTEMPTS {
                candidate = candidate.clamp(self.min, self.max);
            }
        }

        self.value = candidate;
        self.direction = direction;
        self.value != original
    }

    /// Update the perturbation strength and direction given the effect the
    /// last mutation had on the owning network's fitness. `Inc` (sustained
    /// progress) grows `sd`; `Dec` flips the tracked direction and shrinks
    /// `sd`; `Undef` (a stagnation cue — no progress within the caller's
    /// window) resets the direction and shrinks `sd`.
    pub fn optimise(&mut self, effect: Direction) {
        match effect {
            Direction::Inc => self.grow_sd(),
            Direction::Dec => {
                self.direction = self.direction.flipped();
                self.shrink_sd();
            }
            Direction::Undef => {
                self.direction = Direction::Undef;
                self.shrink_sd();
            }
        }
    }

    /// Add `delta` directly to the value, clamped to bounds. Unlike
    /// [`Parameter::mutate`] this does not touch `sd` or `direction` — it
    /// is the entry point for deterministic updates such as STDP, which
    /// compute their own step size from the link's weight and bounds.
    pub fn adjust(&mut self, delta: f64) {
        self.value = (self.value + delta).clamp(self.min, self.max);
    }

    fn shrink_sd(&mut self) {
        self.sd = (self.sd * self.scale).max(MIN_SD);
    }

    fn grow_sd(&mut self) {
        self.sd = (self.sd / self.scale).max(MIN_SD);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def() -> ParamDef {
        ParamDef {
            dist: Distribution::Uniform,
            mean: 0.0,
            sd: 0.3,
            min: -1.0,
            max: 1.0,
        }
    }

    #[test]
    fn new_respects_bounds() {
        rng::seed(10);
        for _ in 0..200 {
            let p = Parameter::new(&def());
            assert!(p.value() >= -1.0 && p.value() <= 1.0);
            assert!(p.sd() > 0.0);
        }
    }

    #[test]
    fn mutate_keeps_value_in_bounds() {
        rng::seed(11);
        let mut p = Parameter::new(&def());
        for _ in 0..500 {
            p.mutate();
            let (min, max) = p.bounds();
            assert!(p.value() >= min && p.value() <= max);
            assert!(p.sd() > 0.0);
        }
    }

    #[test]
    fn optimise_dec_flips_direction_and_shrinks_sd() {
        rng::seed(12);
        let mut p = Parameter::new(&def());
        // Force a committed direction.
        p.direction = Direction::Inc;
        let sd_before = p.sd();
        p.optimise(Direction::Dec);
        assert_eq!(p.direction(), Direction::Dec);
        assert!(p.sd() < sd_before);
    }

    #[test]
    fn optimise_inc_grows_sd() {
        let mut p = Parameter::new(&def());
        let sd_before = p.sd();
        p.optimise(Direction::Inc);
        assert!(p.sd() > sd_before);
    }

    #[test]
    fn optimise_undef_resets_direction() {
        let mut p = Parameter::new(&def());
        p.direction = Direction::Inc;
        p.optimise(Direction::Undef);
        assert_eq!(p.direction(), Direction::Undef);
    }

    #[test]
    fn adjust_clamps_to_bounds() {
        let mut p = Parameter::new(&def());
        p.adjust(10.0);
        assert_eq!(p.value(), 1.0);
        p.adjust(-10.0);
        assert_eq!(p.value(), -1.0);
    }

    #[test]
    fn fixed_distribution_never_moves_at_construction() {
        let def = ParamDef::fixed(0.5);
        let p = Parameter::new(&def);
        assert_eq!(p.value(), 0.5);
    }
}

#[cfg(test)]
mod bounds_proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Invariant 5: Parameter.value() stays in [min, max] at every
        // observation, across arbitrary (bounded) bounds and mutation counts.
        #[test]
        fn value_stays_in_bounds_across_arbitrary_mutations(
            lo in -1000.0f64..1000.0,
            span in 0.01f64..1000.0,
            init_sd in 0.001f64..50.0,
            steps in 0u32..100,
            seed in 0u64..1_000_000,
        ) {
            let def = ParamDef {
                dist: Distribution::Normal,
                mean: lo + span / 2.0,
                sd: init_sd,
                min: lo,
                max: lo + span,
            };
            rng::seed(seed);
            let mut p = Parameter::new(&def);
            prop_assert!(p.value() >= def.min && p.value() <= def.max);
            prop_assert!(p.sd() > 0.0);
            for _ in 0..steps {
                p.mutate();
                prop_assert!(p.value() >= def.min && p.value() <= def.max);
                prop_assert!(p.sd() > 0.0);
            }
        }
    }
}
