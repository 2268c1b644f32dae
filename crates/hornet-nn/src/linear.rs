// FullyConnected — dense layer over an input of any shape
//
// Every output unit owns one weight tensor with exactly the input's shape, so
// the input never has to be flattened:
//
//   output[i] = <weight_i, input> + bias_i          output dims: [n]
//
// BACKPROP (g = ∂L/∂output, a vector of n values):
//
//   ∂L/∂weight_i = g_i · input
//   ∂L/∂bias     = g
//   ∂L/∂input    = Σ_i g_i · weight_i
//
// The input gradient uses the weights as they were during forward; the
// weights and biases are replaced afterwards.
//
// WEIGHT INITIALIZATION:
//
//   He normal with fan_in = number of input values. Biases start at zero.

use hornet_core::{Error, Result, Shape, Tensor};
use rand::Rng;

use crate::init;
use crate::layer::{check_grad, check_input, Layer};

/// A fully-connected layer: `n` weight tensors shaped like the input, plus
/// `n` biases.
///
/// # Examples
/// ```
/// use hornet_core::{Shape, Tensor};
/// use hornet_nn::{FullyConnected, Layer};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut fc = FullyConnected::new(10, (13, 13, 8), &mut StdRng::seed_from_u64(0))?;
/// assert_eq!(fc.output_dims(), &Shape::from(10));
/// assert_eq!(fc.num_parameters(), 13 * 13 * 8 * 10 + 10);
///
/// let y = fc.forward(&Tensor::zeros((13, 13, 8))?)?;
/// assert_eq!(y.values(), &[0.0; 10]);
/// # Ok::<(), hornet_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct FullyConnected {
    weights: Vec<Tensor>,
    /// One bias per output unit: [n]
    biases: Tensor,
    input_dims: Shape,
    output_dims: Shape,
    recent_input: Option<Tensor>,
}

impl FullyConnected {
    /// Create a layer with `outputs` units for inputs of `input_dims`.
    pub fn new<R: Rng>(outputs: usize, input_dims: impl Into<Shape>, rng: &mut R) -> Result<Self> {
        let input_dims = input_dims.into();
        if outputs == 0 {
            hornet_core::bail!("fully-connected layer needs at least one output");
        }
        let fan_in = input_dims.elem_count();
        let weights = (0..outputs)
            .map(|_| init::he_normal(&input_dims, fan_in, &mut *rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(FullyConnected {
            weights,
            biases: Tensor::zeros(outputs)?,
            output_dims: Shape::from(outputs),
            input_dims,
            recent_input: None,
        })
    }

    /// Create a layer from explicit weights (one per output, all shaped like
    /// the input) and biases (one per output).
    pub fn from_parameters(weights: Vec<Tensor>, biases: Tensor) -> Result<Self> {
        let first = weights
            .first()
            .ok_or_else(|| Error::msg("fully-connected layer needs at least one output"))?;
        let input_dims = first.shape().clone();
        if let Some(bad) = weights.iter().find(|w| w.shape() != &input_dims) {
            return Err(Error::ShapeMismatch {
                expected: input_dims,
                got: bad.shape().clone(),
            });
        }
        if biases.elem_count() != weights.len() {
            return Err(Error::LengthMismatch {
                expected: weights.len(),
                got: biases.elem_count(),
            });
        }
        Ok(FullyConnected {
            output_dims: Shape::from(weights.len()),
            biases: biases.reshape(weights.len())?,
            weights,
            input_dims,
            recent_input: None,
        })
    }

    /// The weight tensor of every output unit.
    pub fn weights(&self) -> &[Tensor] {
        &self.weights
    }

    /// The bias vector.
    pub fn biases(&self) -> &Tensor {
        &self.biases
    }
}

impl Layer for FullyConnected {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        check_input(&self.input_dims, input)?;
        let values = self
            .weights
            .iter()
            .zip(self.biases.values())
            .map(|(w, &b)| w.inner_product(input).map(|p| p + b))
            .collect::<Result<Vec<_>>>()?;
        self.recent_input = Some(input.clone());
        Tensor::new(&self.output_dims, values)
    }

    fn backward(&mut self, output_grad: &Tensor, learning_rate: f64) -> Result<Tensor> {
        check_grad(&self.output_dims, output_grad)?;
        let input = self
            .recent_input
            .take()
            .ok_or(Error::NoForwardPass { layer: self.name() })?;

        let mut input_grad = Tensor::zeros(&self.input_dims)?;
        let mut updated = Vec::with_capacity(self.weights.len());
        for (w, &g) in self.weights.iter().zip(output_grad.values()) {
            input_grad = input_grad.add(w, g)?;
            updated.push(w.add(&input, -learning_rate * g)?);
        }
        self.weights = updated;
        self.biases = self.biases.add(output_grad, -learning_rate)?;
        Ok(input_grad)
    }

    fn input_dims(&self) -> &Shape {
        &self.input_dims
    }

    fn output_dims(&self) -> &Shape {
        &self.output_dims
    }

    fn name(&self) -> &'static str {
        "fully_connected"
    }

    fn num_parameters(&self) -> usize {
        self.weights.iter().map(|w| w.elem_count()).sum::<usize>() + self.biases.elem_count()
    }
}
