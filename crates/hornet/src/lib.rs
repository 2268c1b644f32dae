//! # Hornet
//!
//! A convolutional neural network library built from first principles in Rust.
//!
//! This is the top-level facade crate that re-exports everything you need.
//!
//! ## Usage
//!
//! ```rust
//! use hornet::prelude::*;
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|----------|
//! | `hornet-core` | Tensor, Shape, Horner indexing, region iteration, cross-correlation |
//! | `hornet-nn` | Layers (Convolutional, MaxPooling, FullyConnected, ReLU, Softmax), Network, losses |
//! | `hornet-data` | IDX (MNIST-format) datasets, synthetic data |
//!
//! ## Modules
//!
//! - [`train`]: per-sample SGD trainer with learning-rate decay
//! - [`config`]: trainer configuration

/// Re-export core types.
pub use hornet_core::{
    bail, coords_to_horner, cross_correlate, horner_to_coords, window_origins, CoordIter, Error,
    RegionsIter, Result, Shape, StridingCoordIter, Tensor,
};

/// Re-export neural network layers and losses.
pub mod nn {
    pub use hornet_nn::*;
}

/// Re-export datasets.
pub mod data {
    pub use hornet_data::*;
}

/// Trainer configuration.
pub mod config;

/// Training loop: epochs, evaluation, progress reports.
pub mod train;

/// Prelude: import this for the most common types.
pub mod prelude {
    pub use crate::config::TrainerConfig;
    pub use crate::data::{IdxDataset, IdxError, IdxSplit};
    pub use crate::nn::{
        accuracy, argmax, Convolutional, FullyConnected, Layer, LossFunction, MaxPooling,
        Network, ReLU, Softmax,
    };
    pub use crate::train::{EpochLog, Evaluation, TrainResult, Trainer};
    pub use crate::{cross_correlate, Error, Result, Shape, Tensor};
}
