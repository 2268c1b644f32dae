//! # hornet-data
//!
//! Dataset loading for hornet.
//!
//! - [`IdxDataset`]: MNIST-format (IDX) images and labels as ready-to-train
//!   tensors, with one-hot targets
//! - [`IdxDataset::synthetic`]: a small seeded dataset for demos and tests
//! - IDX byte builders for writing fixtures in tests

pub mod idx;

pub use idx::{
    build_idx1_bytes, build_idx3_bytes, labels_to_one_hot, pixel_value, IdxDataset, IdxError,
    IdxSplit,
};
