//! # hornet-core
//!
//! Dense N-dimensional tensors for hornet.
//!
//! This crate provides:
//! - [`Tensor`]: an N-dimensional `f64` array stored in one flat buffer
//! - [`Shape`]: axis lengths plus Horner (first-axis-fastest) indexing
//! - [`CoordIter`] / [`StridingCoordIter`]: odometer walks over coordinates
//! - [`RegionsIter`]: every placement of a window over a tensor, with padding
//! - [`cross_correlate`]: the sliding inner product that convolution is built on

pub mod correlate;
pub mod error;
pub mod iter;
pub mod shape;
pub mod tensor;

pub use correlate::cross_correlate;
pub use error::{Error, Result};
pub use iter::{window_origins, CoordIter, RegionsIter, StridingCoordIter};
pub use shape::{coords_to_horner, horner_to_coords, Shape};
pub use tensor::Tensor;
