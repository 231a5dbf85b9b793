//! Transfer functions available to classical (non-spiking) nodes.
//!
//! The formulas are taken from
//! `examples/original_source/src/lib/aux/functions/{TransferOps,MathOps}.hpp`
//! rather than transcribed from the distilled specification's prose: the
//! specification's stated ReLU formula, `½(√((x+4)² + x) − 1)`, does not
//! match what the original actually computes — `0.5 * (sqrt(x*x + 4.0) +
//! x) - 1.0`, i.e. `√(x² + 4)`. The original's formula is implemented here.

use std::f64::consts::SQRT_5;

/// `(1 + √5) / 2`, the "golden" constant transfer function.
pub const GOLDEN_RATIO: f64 = (1.0 + SQRT_5) / 2.0;

/// A node's activation function, selected (and re-selected by mutation)
/// from the permitted set for its role.
///
/// Most variants apply a scalar function to the sum of incoming signals
/// (`Σ link.weight · source.output`); `Min`, `Max` and `Avg` instead
/// aggregate the incoming signals directly, bypassing the sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TransferFunction {
    /// `x`.
    Identity,
    /// `tanh(x)`.
    Tanh,
    /// `0.5 * (tanh(0.5x) + 1)`.
    Logistic,
    /// `0.5 * (sqrt(x*x + 4) + x) - 1`: smooth, differentiable, through the
    /// origin.
    Relu,
    /// `exp(-0.5 * x^2)`.
    Gaussian,
    /// `sin(x)`.
    Sine,
    /// `cos(x)`.
    Cosine,
    /// `|x|`.
    Abs,
    /// Minimum of the raw incoming signals (not their sum).
    Min,
    /// Maximum of the raw incoming signals.
    Max,
    /// Arithmetic mean of the raw incoming signals.
    Avg,
    /// Always `1.0`, ignoring inputs — the bias unit.
    Constant,
    /// Always `(1 + √5) / 2`, ignoring inputs.
    Golden,
}

impl TransferFunction {
    /// The complete set of classical transfer functions, in the order the
    /// specification lists them — used by mutation to re-sample uniformly.
    pub const ALL: [TransferFunction; 13] = [
        TransferFunction::Identity,
        TransferFunction::Tanh,
        TransferFunction::Logistic,
        TransferFunction::Relu,
        TransferFunction::Gaussian,
        TransferFunction::Sine,
        TransferFunction::Cosine,
        TransferFunction::Abs,
        TransferFunction::Min,
        TransferFunction::Max,
        TransferFunction::Avg,
        TransferFunction::Constant,
        TransferFunction::Golden,
    ];

    /// Whether this function aggregates the raw incoming signals itself
    /// rather than being applied to their sum.
    pub fn aggregates_inputs(self) -> bool {
        matches!(
            self,
            TransferFunction::Min | TransferFunction::Max | TransferFunction::Avg
        )
    }

    /// Whether this function ignores its inputs entirely.
    pub fn ignores_inputs(self) -> bool {
        matches!(self, TransferFunction::Constant | TransferFunction::Golden)
    }

    /// Evaluate the function over a node's incoming signals (each already
    /// `link.weight * source.output`). Returns `(pre_activation_sum,
    /// output)`: the pre-activation sum is `0.0` for aggregating or
    /// constant functions, since there is no single summed value to record
    /// input statistics against.
    pub fn evaluate(self, inputs: &[f64]) -> (f64, f64) {
        if self.ignores_inputs() {
            return (0.0, self.constant_value());
        }
        if self.aggregates_inputs() {
            return (0.0, self.aggregate(inputs));
        }
        let sum: f64 = inputs.iter().sum();
        (sum, self.scalar(sum))
    }

    fn constant_value(self) -> f64 {
        match self {
            TransferFunction::Constant => 1.0,
            TransferFunction::Golden => GOLDEN_RATIO,
            _ => unreachable!("ignores_inputs() guards this call"),
        }
    }

    fn aggregate(self, inputs: &[f64]) -> f64 {
        if inputs.is_empty() {
            return 0.0;
        }
        match self {
            TransferFunction::Min => inputs.iter().cloned().fold(f64::INFINITY, f64::min),
            TransferFunction::Max => inputs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            TransferFunction::Avg => inputs.iter().sum::<f64>() / inputs.len() as f64,
            _ => unreachable!("aggregates_inputs() guards this call"),
        }
    }

    fn scalar(self, x: f64) -> f64 {
        match self {
            TransferFunction::Identity => x,
            TransferFunction::Tanh => x.tanh(),
            TransferFunction::Logistic => 0.5 * ((0.5 * x).tanh() + 1.0),
            TransferFunction::Relu => 0.5 * ((x * x + 4.0).sqrt() + x) - 1.0,
            TransferFunction::Gaussian => (-0.5 * x * x).exp(),
            TransferFunction::Sine => x.sin(),
            TransferFunction::Cosine => x.cos(),
            TransferFunction::Abs => x.abs(),
            _ => unreachable!("scalar() is only called for scalar variants"),
        }
    }
}
