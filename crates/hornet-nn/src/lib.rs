//! # hornet-nn
//!
//! Layers, the `Network` composite, and loss functions for hornet.
//!
//! Every stage implements the [`Layer`] trait:
//!
//! 1. **Layer trait**: `forward()` caches, `backward()` returns the input
//!    gradient and updates the layer's own parameters
//! 2. **Convolutional**: a bank of filters cross-correlated with the input
//! 3. **MaxPooling**: strided window maxima with argmax routing
//! 4. **FullyConnected**: one weight tensor per output unit, plus biases
//! 5. **Activations**: ReLU and Softmax
//! 6. **Network**: an ordered, shape-checked chain of layers
//! 7. **Loss functions**: cross-entropy and mean squared error
//!
//! Layers work on `f64` tensors of any rank and train one sample at a time.

pub mod activation;
pub mod conv;
pub mod init;
pub mod layer;
pub mod linear;
pub mod loss;
pub mod metrics;
pub mod network;

pub use activation::{softmax, ReLU, Softmax};
pub use conv::{Convolutional, MaxPooling};
pub use layer::Layer;
pub use linear::FullyConnected;
pub use loss::LossFunction;
pub use metrics::{accuracy, argmax, argmax_classes};
pub use network::Network;
