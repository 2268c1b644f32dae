// Network — an ordered chain of layers that is itself a layer
//
// A Network starts from a declared input shape and grows one layer at a time.
// Each builder method constructs the new layer for the current output shape
// (the input shape while the network is empty), so shapes can never drift
// apart:
//
//   let net = Network::with_seed((28, 28), 42)
//       .conv_square(3, 8)?            // [26, 26, 8]
//       .max_pool(&[2, 2], &[2, 2])?   // [13, 13, 8]
//       .fully_connected(10)?          // [10]
//       .softmax()?;                   // [10]
//
// forward() threads the tensor front to back; backward() threads the gradient
// back to front, and every layer applies its own parameter update on the way.
// Network implements Layer, so networks can be nested or tested like any
// other layer.
//
// The network owns the random generator that initializes its layers, so a
// seed fixes every filter and weight of the finished network.

use std::fmt;

use hornet_core::{Result, Shape, Tensor};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activation::{ReLU, Softmax};
use crate::conv::{Convolutional, MaxPooling};
use crate::layer::{check_grad, check_input, Layer};
use crate::linear::FullyConnected;
use crate::metrics;

/// A sequence of layers applied one after another.
///
/// # Examples
/// ```
/// use hornet_core::{Shape, Tensor};
/// use hornet_nn::{Layer, Network};
///
/// let mut net = Network::with_seed((6, 6), 0)
///     .conv_square(3, 2)?
///     .relu()?
///     .fully_connected(3)?
///     .softmax()?;
/// assert_eq!(net.output_dims(), &Shape::from(3));
///
/// let y = net.forward(&Tensor::zeros((6, 6))?)?;
/// assert!((y.sum() - 1.0).abs() < 1e-12);
/// # Ok::<(), hornet_core::Error>(())
/// ```
pub struct Network {
    input_dims: Shape,
    layers: Vec<Box<dyn Layer>>,
    rng: StdRng,
    forwarded: bool,
}

impl Network {
    /// An empty network for inputs of `input_dims`, initialized from entropy.
    pub fn new(input_dims: impl Into<Shape>) -> Self {
        Network {
            input_dims: input_dims.into(),
            layers: Vec::new(),
            rng: StdRng::from_entropy(),
            forwarded: false,
        }
    }

    /// An empty network whose layer initialization is reproducible.
    pub fn with_seed(input_dims: impl Into<Shape>, seed: u64) -> Self {
        Network {
            input_dims: input_dims.into(),
            layers: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            forwarded: false,
        }
    }

    /// Append a layer. Its input dims must equal the network's current
    /// output dims.
    #[allow(clippy::should_implement_trait)]
    pub fn add<L: Layer + 'static>(mut self, layer: L) -> Result<Self> {
        self.push(Box::new(layer))?;
        Ok(self)
    }

    /// Append a boxed layer in place.
    pub fn push(&mut self, layer: Box<dyn Layer>) -> Result<()> {
        let current = self.output_dims().clone();
        if layer.input_dims() != &current {
            return Err(hornet_core::Error::ShapeMismatch {
                expected: current,
                got: layer.input_dims().clone(),
            });
        }
        tracing::debug!(
            layer = layer.name(),
            index = self.layers.len(),
            input = %layer.input_dims(),
            output = %layer.output_dims(),
            params = layer.num_parameters(),
            "added layer"
        );
        self.layers.push(layer);
        Ok(())
    }

    /// Append a convolutional layer with `depth` filters of `filter_dims`.
    pub fn conv(mut self, filter_dims: impl Into<Shape>, depth: usize) -> Result<Self> {
        let input_dims = self.output_dims().clone();
        let layer = Convolutional::new(filter_dims, depth, input_dims, &mut self.rng)?;
        self.add(layer)
    }

    /// Append a convolutional layer with `depth` square `size`x`size` filters.
    pub fn conv_square(self, size: usize, depth: usize) -> Result<Self> {
        self.conv((size, size), depth)
    }

    /// Append a max-pooling layer.
    pub fn max_pool(self, strides: &[usize], sizes: &[usize]) -> Result<Self> {
        let layer = MaxPooling::new(strides, sizes, self.output_dims())?;
        self.add(layer)
    }

    /// Append a fully-connected layer with `outputs` units.
    pub fn fully_connected(mut self, outputs: usize) -> Result<Self> {
        let input_dims = self.output_dims().clone();
        let layer = FullyConnected::new(outputs, input_dims, &mut self.rng)?;
        self.add(layer)
    }

    /// Append a ReLU activation.
    pub fn relu(self) -> Result<Self> {
        let layer = ReLU::new(self.output_dims());
        self.add(layer)
    }

    /// Append a softmax activation.
    pub fn softmax(self) -> Result<Self> {
        let layer = Softmax::new(self.output_dims());
        self.add(layer)
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the network has no layers yet.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The layers, front to back.
    pub fn layers(&self) -> impl Iterator<Item = &dyn Layer> {
        self.layers.iter().map(|l| l.as_ref())
    }

    /// Forward `input` and return the index of the largest output.
    pub fn predict(&mut self, input: &Tensor) -> Result<usize> {
        let output = self.forward(input)?;
        Ok(metrics::argmax(&output))
    }
}

impl Layer for Network {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        check_input(&self.input_dims, input)?;
        let mut out = input.clone();
        for layer in &mut self.layers {
            out = layer.forward(&out)?;
        }
        self.forwarded = true;
        Ok(out)
    }

    fn backward(&mut self, output_grad: &Tensor, learning_rate: f64) -> Result<Tensor> {
        check_grad(self.output_dims(), output_grad)?;
        if !std::mem::take(&mut self.forwarded) {
            return Err(hornet_core::Error::NoForwardPass { layer: "network" });
        }
        let mut grad = output_grad.clone();
        for layer in self.layers.iter_mut().rev() {
            grad = layer.backward(&grad, learning_rate)?;
        }
        Ok(grad)
    }

    fn input_dims(&self) -> &Shape {
        &self.input_dims
    }

    fn output_dims(&self) -> &Shape {
        self.layers
            .last()
            .map_or(&self.input_dims, |l| l.output_dims())
    }

    fn name(&self) -> &'static str {
        "network"
    }

    fn num_parameters(&self) -> usize {
        self.layers.iter().map(|l| l.num_parameters()).sum()
    }
}

/// One line per layer: index, kind, input → output shape, parameter count.
impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "network: input {}", self.input_dims)?;
        for (i, layer) in self.layers.iter().enumerate() {
            writeln!(
                f,
                "  {:>2}  {:<16} {} -> {}  ({} params)",
                i,
                layer.name(),
                layer.input_dims(),
                layer.output_dims(),
                layer.num_parameters()
            )?;
        }
        write!(f, "total parameters: {}", self.num_parameters())
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("input_dims", &self.input_dims)
            .field("layers", &self.layers.iter().map(|l| l.name()).collect::<Vec<_>>())
            .finish()
    }
}
