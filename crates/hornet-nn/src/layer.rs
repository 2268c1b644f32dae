// Layer trait — The interface every network stage implements
//
// A layer is a small state machine driven by two calls:
//
//   forward(input)              → output      (caches whatever backward needs)
//   backward(output_grad, lr)   → input_grad  (consumes the cache, updates params)
//
// There is no autograd graph: each layer knows its own derivative and applies
// its own gradient-descent step inside `backward`. A training step is exactly
// one `forward` followed by one `backward`; calling `backward` on a layer that
// has not cached an input is reported as `Error::NoForwardPass`.
//
// SHAPES ARE FIXED AT CONSTRUCTION:
//
// Every layer is built for one input shape and reports the output shape it
// will produce. `Network` uses `output_dims()` of the last layer as the input
// shape of the next one, so shape errors surface while the network is being
// assembled instead of halfway through the first sample.
//
// MUTABILITY:
//
// Forward caches the input (pooling also its winning positions) and backward
// replaces the parameter tensors, so both take `&mut self`.

use hornet_core::{Error, Result, Shape, Tensor};

/// The contract shared by every layer and by [`Network`](crate::Network).
///
/// # Example
/// ```
/// use hornet_core::{Shape, Tensor};
/// use hornet_nn::{Layer, ReLU};
///
/// let mut relu = ReLU::new((2, 2));
/// let x = Tensor::new((2, 2), vec![-1.0, 2.0, 0.0, 3.0])?;
/// let y = relu.forward(&x)?;
/// assert_eq!(y.values(), &[0.0, 2.0, 0.0, 3.0]);
///
/// let g = relu.backward(&Tensor::full((2, 2), 1.0)?, 0.1)?;
/// assert_eq!(g.values(), &[0.0, 1.0, 0.0, 1.0]);
/// assert_eq!(relu.output_dims(), &Shape::from((2, 2)));
/// # Ok::<(), hornet_core::Error>(())
/// ```
pub trait Layer {
    /// Compute the output for `input` and cache what `backward` needs.
    fn forward(&mut self, input: &Tensor) -> Result<Tensor>;

    /// Propagate `output_grad` (∂loss/∂output) back through the layer,
    /// applying this layer's parameter update with `learning_rate`, and
    /// return ∂loss/∂input.
    fn backward(&mut self, output_grad: &Tensor, learning_rate: f64) -> Result<Tensor>;

    /// The input shape this layer was built for.
    fn input_dims(&self) -> &Shape;

    /// The shape `forward` produces.
    fn output_dims(&self) -> &Shape;

    /// Short human-readable layer kind, used in logs and summaries.
    fn name(&self) -> &'static str;

    /// Number of trainable scalar parameters.
    fn num_parameters(&self) -> usize {
        0
    }
}

/// Reject an input whose shape differs from the one the layer was built for.
pub(crate) fn check_input(expected: &Shape, input: &Tensor) -> Result<()> {
    if input.shape() != expected {
        return Err(Error::ShapeMismatch {
            expected: expected.clone(),
            got: input.shape().clone(),
        });
    }
    Ok(())
}

/// Reject an upstream gradient that does not line up with the layer output.
///
/// Only the element count is compared: a loss derivative arrives as a flat
/// vector even when the layer's output has more axes.
pub(crate) fn check_grad(expected: &Shape, grad: &Tensor) -> Result<()> {
    if grad.elem_count() != expected.elem_count() {
        return Err(Error::ShapeMismatch {
            expected: expected.clone(),
            got: grad.shape().clone(),
        });
    }
    Ok(())
}
