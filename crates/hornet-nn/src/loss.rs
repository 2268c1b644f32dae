// Loss Functions
//
// A loss compares the network's output vector `a` with the expected vector
// `t`, unit by unit. Both functions return per-unit tensors; the Trainer sums
// the loss for reporting and feeds the derivative straight into backward().
//
// KINDS:
//
// 1. Cross-entropy (binary, per unit):
//      L_i  = -(t_i ln a_i + (1 - t_i) ln(1 - a_i))
//      dL_i = -t_i / a_i + (1 - t_i) / (1 - a_i)
//    For a one-hot target this is -ln a on the true class and -ln(1 - a)
//    elsewhere. `a` is clamped to [ε, 1 - ε] so a saturated softmax output
//    never produces an infinite loss or derivative.
//
// 2. Mean squared error (per unit):
//      L_i  = (a_i - t_i)²
//      dL_i = 2 (a_i - t_i)

use hornet_core::{Error, Result, Tensor};

/// Smallest probability the cross-entropy loss will take a logarithm of.
pub const PROBABILITY_EPSILON: f64 = 1e-7;

/// Supported loss functions, chosen when a Trainer is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LossFunction {
    /// Per-unit binary cross-entropy (default).
    #[default]
    CrossEntropy,
    /// Per-unit squared error.
    MeanSquaredError,
}

impl LossFunction {
    /// Per-unit loss of `actual` against `expected`.
    pub fn loss(&self, expected: &[f64], actual: &[f64]) -> Result<Tensor> {
        self.elementwise(expected, actual, |t, a| match self {
            LossFunction::CrossEntropy => {
                let a = clamp_probability(a);
                -(t * a.ln() + (1.0 - t) * (1.0 - a).ln())
            }
            LossFunction::MeanSquaredError => (a - t).powi(2),
        })
    }

    /// Per-unit derivative of the loss with respect to `actual`.
    pub fn loss_derivative(&self, expected: &[f64], actual: &[f64]) -> Result<Tensor> {
        self.elementwise(expected, actual, |t, a| match self {
            LossFunction::CrossEntropy => {
                let a = clamp_probability(a);
                -t / a + (1.0 - t) / (1.0 - a)
            }
            LossFunction::MeanSquaredError => 2.0 * (a - t),
        })
    }

    /// Sum of the per-unit losses.
    pub fn total(&self, expected: &[f64], actual: &[f64]) -> Result<f64> {
        Ok(self.loss(expected, actual)?.sum())
    }

    fn elementwise(
        &self,
        expected: &[f64],
        actual: &[f64],
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Tensor> {
        if expected.len() != actual.len() {
            return Err(Error::LengthMismatch {
                expected: expected.len(),
                got: actual.len(),
            });
        }
        let values: Vec<f64> = expected.iter().zip(actual).map(|(&t, &a)| f(t, a)).collect();
        Tensor::new(values.len(), values)
    }
}

impl std::fmt::Display for LossFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LossFunction::CrossEntropy => write!(f, "cross-entropy"),
            LossFunction::MeanSquaredError => write!(f, "mean squared error"),
        }
    }
}

fn clamp_probability(a: f64) -> f64 {
    a.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON)
}
