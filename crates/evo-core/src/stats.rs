//! Moving mean/variance tracking, in simple (Welford) and exponential
//! (EMA) flavors.
//!
//! Grounded on `examples/original_source/src/lib/aux/Stat.hpp`'s
//! `Statistics<MAType>` template: rather than a Rust const-generic over an
//! enum (which would need unstable specialization to give the two modes
//! different `update` bodies), the two modes are separate types sharing a
//! `Statistics` trait, matching `EMAStat`/`SMAStat` being distinct type
//! aliases in the original.

/// Logistic squashing function, the default `f` in `offset`.
fn logistic(x: f64) -> f64 {
    0.5 * ((0.5 * x).tanh() + 1.0)
}

/// Common interface for a moving mean/variance tracker.
pub trait Statistics {
    /// Fold a new observation into the running mean/variance.
    fn update(&mut self, x: f64);

    /// Current mean.
    fn mean(&self) -> f64;

    /// Current variance.
    fn var(&self) -> f64;

    /// Standard deviation, computed on demand from the variance.
    fn sd(&self) -> f64 {
        self.var().sqrt()
    }

    /// Reset to the zero state.
    fn reset(&mut self);

    /// Normalised, logistic-squashed offset of `x` from the mean:
    /// `logistic((x - mean) / sigma*)`, where `sigma*` falls back from
    /// `sd()` (when positive) to `|x|`, then `|mean|`, then `1.0`, so the
    /// result is always defined even on a constant stream.
    fn offset(&self, x: f64) -> f64 {
        self.offset_via(x, logistic)
    }

    /// As [`Statistics::offset`], with an explicit squashing function in
    /// place of the default logistic (the specification also names `tanh`
    /// as a legal choice).
    fn offset_via(&self, x: f64, squash: fn(f64) -> f64) -> f64 {
        let denom = if self.var() > 0.0 {
            self.sd()
        } else if x != 0.0 {
            x.abs()
        } else if self.mean() != 0.0 {
            self.mean().abs()
        } else {
            1.0
        };
        squash((x - self.mean()) / denom)
    }
}

/// Running mean/variance via Welford's online algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleStat {
    count: u64,
    mean: f64,
    var: f64,
}

impl SimpleStat {
    /// A fresh tracker with no observations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of observations folded in so far.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Statistics for SimpleStat {
    fn update(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.var += delta * (x - self.mean);
    }

    fn mean(&self) -> f64 {
        self.mean
    }

    fn var(&self) -> f64 {
        if self.count > 1 {
            self.var / self.count as f64
        } else {
            0.0
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Running mean/variance via an exponential moving average with
/// forgetting factor `alpha ∈ (0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmaStat {
    alpha: f64,
    mean: f64,
    var: f64,
}

impl EmaStat {
    /// A fresh tracker with the given forgetting factor.
    ///
    /// # Panics
    /// Panics if `alpha` is not in `(0, 1)`.
    pub fn new(alpha: f64) -> Self {
        assert!(
            alpha > 0.0 && alpha < 1.0,
            "EmaStat forgetting factor must be in (0, 1), got {alpha}"
        );
        Self {
            alpha,
            mean: 0.0,
            var: 0.0,
        }
    }
}

impl Statistics for EmaStat {
    fn update(&mut self, x: f64) {
        let delta = x - self.mean;
        let inc = self.alpha * delta;
        self.mean += inc;
        self.var = (1.0 - self.alpha) * (self.var + delta * inc);
    }

    fn mean(&self) -> f64 {
        self.mean
    }

    fn var(&self) -> f64 {
        self.var
    }

    fn reset(&mut self) {
        self.mean = 0.0;
        self.var = 0.0;
    }
}

/// A [`Statistics`] tracker paired with the current value it tracks —
/// convenient when the value itself, not just its distribution, needs to
/// be carried around (e.g. a network's absolute fitness).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatPack<S> {
    /// Current value.
    pub value: f64,
    stats: S,
}

impl<S: Statistics + Default> Default for StatPack<S> {
    fn default() -> Self {
        Self {
            value: 0.0,
            stats: S::default(),
        }
    }
}

impl<S: Statistics> StatPack<S> {
    /// Wrap an existing tracker.
    pub fn new(stats: S) -> Self {
        Self { value: 0.0, stats }
    }

    /// Replace the current value and fold it into the tracker.
    pub fn update(&mut self, new_value: f64) {
        self.value = new_value;
        self.stats.update(self.value);
    }

    /// Add `delta` to the current value and fold the result in.
    pub fn add(&mut self, delta: f64) {
        self.update(self.value + delta);
    }

    /// Offset of the current value, see [`Statistics::offset`].
    pub fn offset(&self) -> f64 {
        self.stats.offset(self.value)
    }

    /// Offset of an arbitrary value against this tracker's distribution.
    pub fn offset_of(&self, x: f64) -> f64 {
        self.stats.offset(x)
    }

    /// Mean of the tracked distribution.
    pub fn mean(&self) -> f64 {
        self.stats.mean()
    }

    /// Standard deviation of the tracked distribution.
    pub fn sd(&self) -> f64 {
        self.stats.sd()
    }

    /// Reset both the value and the tracker.
    pub fn reset(&mut self) {
        self.value = 0.0;
        self.stats.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_mean_var(xs: &[f64]) -> (f64, f64) {
        let n = xs.len() as f64;
        let mean = xs.iter().sum::<f64>() / n;
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        (mean, var)
    }

    #[test]
    fn simple_stat_matches_batch_computation() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut s = SimpleStat::new();
        for &x in &xs {
            s.update(x);
        }
        let (mean, var) = batch_mean_var(&xs);
        assert!((s.mean() - mean).abs() < 1e-9);
        assert!((s.var() - var).abs() < 1e-9);
    }

    #[test]
    fn offset_constant_stream_is_defined() {
        let mut s = SimpleStat::new();
        s.update(0.0);
        s.update(0.0);
        // mean == 0, var == 0, x == 0: falls all the way back to 1.0.
        let o = s.offset(0.0);
        assert!(o.is_finite());
        assert!((o - logistic(0.0)).abs() < 1e-12);
    }

    #[test]
    fn offset_nonzero_constant_stream_uses_value_fallback() {
        let mut s = SimpleStat::new();
        s.update(3.0);
        s.update(3.0);
        let o = s.offset(3.0);
        assert!(o.is_finite());
    }

    #[test]
    fn ema_stat_tracks_recent_values_more_strongly() {
        let mut s = EmaStat::new(0.5);
        for _ in 0..20 {
            s.update(1.0);
        }
        assert!((s.mean() - 1.0).abs() < 1e-6);
        s.update(-1.0);
        assert!(s.mean() < 1.0);
    }

    #[test]
    fn stat_pack_add_updates_value_and_distribution() {
        let mut pack = StatPack::<SimpleStat>::default();
        pack.add(1.0);
        pack.add(1.0);
        assert_eq!(pack.value, 2.0);
        assert!((pack.mean() - 1.5).abs() < 1e-9);
    }
}
