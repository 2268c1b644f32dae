// Activation layers — parameter-free elementwise stages
//
// ReLU:     y = max(x, 0)            dy/dx = 1 if x > 0 else 0
// Softmax:  y_i = e^{x_i} / Σ_j e^{x_j}
//           dy_i/dx_i = y_i (1 - y_i)
//
// Softmax backward multiplies the upstream gradient by the diagonal of the
// Jacobian only. Paired with cross-entropy on a one-hot target this is the
// update rule the reference network was trained with.
//
// Softmax subtracts the largest input before exponentiating. The result is
// identical and a 28x28 image run through an untrained FC layer no longer
// overflows e^x.

use hornet_core::{Error, Result, Shape, Tensor};

use crate::layer::{check_grad, check_input, Layer};

/// ReLU activation: max(0, x)
#[derive(Debug, Clone)]
pub struct ReLU {
    dims: Shape,
    recent_input: Option<Tensor>,
}

impl ReLU {
    pub fn new(input_dims: impl Into<Shape>) -> Self {
        ReLU {
            dims: input_dims.into(),
            recent_input: None,
        }
    }
}

impl Layer for ReLU {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        check_input(&self.dims, input)?;
        self.recent_input = Some(input.clone());
        Ok(input.map(|x| x.max(0.0)))
    }

    fn backward(&mut self, output_grad: &Tensor, _learning_rate: f64) -> Result<Tensor> {
        check_grad(&self.dims, output_grad)?;
        let input = self
            .recent_input
            .take()
            .ok_or(Error::NoForwardPass { layer: self.name() })?;
        let mask = input.map(|x| if x > 0.0 { 1.0 } else { 0.0 });
        mask.mul(output_grad)
    }

    fn input_dims(&self) -> &Shape {
        &self.dims
    }

    fn output_dims(&self) -> &Shape {
        &self.dims
    }

    fn name(&self) -> &'static str {
        "relu"
    }
}

/// Softmax over every element of the input.
#[derive(Debug, Clone)]
pub struct Softmax {
    dims: Shape,
    recent_input: Option<Tensor>,
}

impl Softmax {
    pub fn new(input_dims: impl Into<Shape>) -> Self {
        Softmax {
            dims: input_dims.into(),
            recent_input: None,
        }
    }

    /// Diagonal of the softmax Jacobian at the most recent input:
    /// `s_i (1 - s_i)` for each element.
    pub fn derivatives(&self) -> Result<Tensor> {
        let input = self
            .recent_input
            .as_ref()
            .ok_or(Error::NoForwardPass { layer: self.name() })?;
        Ok(softmax(input).map(|s| s * (1.0 - s)))
    }
}

/// Numerically stable softmax over all elements of `x`.
pub fn softmax(x: &Tensor) -> Tensor {
    let max = x.max_value();
    let exps = x.map(|v| (v - max).exp());
    let total = exps.sum();
    exps.scale(1.0 / total)
}

impl Layer for Softmax {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        check_input(&self.dims, input)?;
        self.recent_input = Some(input.clone());
        Ok(softmax(input))
    }

    fn backward(&mut self, output_grad: &Tensor, _learning_rate: f64) -> Result<Tensor> {
        check_grad(&self.dims, output_grad)?;
        let derivatives = self.derivatives()?;
        self.recent_input = None;
        derivatives.mul(output_grad)
    }

    fn input_dims(&self) -> &Shape {
        &self.dims
    }

    fn output_dims(&self) -> &Shape {
        &self.dims
    }

    fn name(&self) -> &'static str {
        "softmax"
    }
}
