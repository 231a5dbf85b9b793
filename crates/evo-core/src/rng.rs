//! Process-wide random number generation.
//!
//! The specification's shared-resource policy allows either a mutexed
//! global PRNG or a thread-local one per worker — determinism across
//! threads is explicitly not a contract. This module implements the
//! mutexed-global form, matching the single `std::mt19937` the original
//! (`examples/original_source/src/lib/aux/Random.hpp`) keeps behind a
//! mutex; a thread-local `rand::rngs::ThreadRng` at each call site would be
//! an equally valid, and slightly faster, alternative.

use std::sync::OnceLock;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

static GLOBAL_RNG: OnceLock<Mutex<StdRng>> = OnceLock::new();

fn global() -> &'static Mutex<StdRng> {
    GLOBAL_RNG.get_or_init(|| Mutex::new(StdRng::from_entropy()))
}

/// Reseed the process-wide generator. Intended for test determinism; the
/// specification makes no cross-thread determinism guarantee for
/// production runs.
pub fn seed(seed: u64) {
    *global().lock() = StdRng::seed_from_u64(seed);
}

/// Draw a uniform real in `[low, high)`.
pub fn rnd_real(low: f64, high: f64) -> f64 {
    global().lock().gen_range(low..high)
}

/// Draw a uniform integer in `[low, high)`.
pub fn rnd_int(low: usize, high: usize) -> usize {
    global().lock().gen_range(low..high)
}

/// Draw a sample from `Normal(mean, sd)`. Falls back to `mean` if `sd` is
/// not strictly positive (a degenerate normal has no density to sample).
pub fn rnd_nd(mean: f64, sd: f64) -> f64 {
    if sd <= 0.0 {
        return mean;
    }
    let dist = Normal::new(mean, sd).expect("sd already checked positive");
    dist.sample(&mut *global().lock())
}

/// Bernoulli trial with probability `p` (clamped to `[0, 1]`).
pub fn rnd_chance(p: f64) -> bool {
    let p = p.clamp(0.0, 1.0);
    global().lock().gen_bool(p)
}

/// Spin a fitness-weighted roulette wheel over `weights`, returning the
/// index of the chosen entry. All weights are assumed non-negative; if
/// every weight is zero (or the slice is empty) `None` is returned and the
/// caller should fall back to uniform choice.
pub fn roulette(weights: &[f64]) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() || total <= 0.0 {
        return None;
    }
    let mut pick = rnd_real(0.0, total);
    for (idx, w) in weights.iter().enumerate() {
        if pick < *w {
            return Some(idx);
        }
        pick -= *w;
    }
    // Floating point rounding can leave a residual; land on the last entry.
    Some(weights.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rnd_real_respects_bounds() {
        seed(1);
        for _ in 0..1000 {
            let v = rnd_real(-2.0, 3.0);
            assert!((-2.0..3.0).contains(&v));
        }
    }

    #[test]
    fn rnd_int_respects_bounds() {
        seed(2);
        for _ in 0..1000 {
            let v = rnd_int(0, 5);
            assert!(v < 5);
        }
    }

    #[test]
    fn roulette_picks_only_nonzero_weight() {
        seed(3);
        let weights = [0.0, 0.0, 4.0, 0.0];
        for _ in 0..50 {
            assert_eq!(roulette(&weights), Some(2));
        }
    }

    #[test]
    fn roulette_empty_or_zero_is_none() {
        assert_eq!(roulette(&[]), None);
        assert_eq!(roulette(&[0.0, 0.0]), None);
    }

    #[test]
    fn rnd_nd_degenerate_returns_mean() {
        assert_eq!(rnd_nd(2.5, 0.0), 2.5);
    }
}
