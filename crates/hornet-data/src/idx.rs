// IDX datasets — MNIST-format image and label files
//
// MNIST and Kuzushiji-MNIST ship as 4 files:
//   - train-images-idx3-ubyte  (60,000  28×28 images)
//   - train-labels-idx1-ubyte  (60,000  labels)
//   - t10k-images-idx3-ubyte   (10,000  28×28 images)
//   - t10k-labels-idx1-ubyte   (10,000  labels)
//
// IDX format (all header values big-endian u32):
//   images: magic(2051) | count | rows | cols | pixel_data(u8...)
//   labels: magic(2049) | count | label_data(u8...)
//
// SAMPLE ENCODING:
//
//   Pixels are stored row by row. Each image becomes a Tensor of dims
//   [cols, rows], so with the first axis varying fastest the pixel buffer maps
//   onto the tensor without any reordering. A pixel byte p becomes
//
//     (128 - p) / 255        (ink is negative, background ≈ +0.5)
//
//   Labels become one-hot tensors of dims [k], where k is the number of
//   distinct labels present and the 1.0 sits at the label's rank among them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hornet_core::{Shape, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

/// Errors from IDX loading.
#[derive(Debug, thiserror::Error)]
pub enum IdxError {
    #[error("IDX I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("IDX invalid magic: expected {expected}, got {got}")]
    InvalidMagic { expected: u32, got: u32 },

    #[error("IDX {what} truncated: expected {expected} bytes, got {got}")]
    Truncated {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("IDX count mismatch: {images} images vs {labels} labels")]
    CountMismatch { images: usize, labels: usize },

    #[error("IDX file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("label {0} is not one of the known classes")]
    UnknownLabel(u8),

    #[error(transparent)]
    Tensor(#[from] hornet_core::Error),
}

/// Which split of an IDX dataset to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdxSplit {
    Train,
    Test,
}

impl IdxSplit {
    /// Standard (image, label) file names of this split.
    pub fn file_names(self) -> (&'static str, &'static str) {
        match self {
            IdxSplit::Train => ("train-images-idx3-ubyte", "train-labels-idx1-ubyte"),
            IdxSplit::Test => ("t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte"),
        }
    }
}

/// An IDX dataset held in memory as ready-to-train tensors.
#[derive(Debug, Clone)]
pub struct IdxDataset {
    images: Vec<Tensor>,
    targets: Vec<Tensor>,
    labels: Vec<u8>,
    classes: Vec<u8>,
    rows: usize,
    cols: usize,
    split: IdxSplit,
}

impl IdxDataset {
    /// Load a split from `dir`, keeping at most `limit` samples.
    pub fn load(
        dir: impl AsRef<Path>,
        split: IdxSplit,
        limit: Option<usize>,
    ) -> Result<Self, IdxError> {
        let dir = dir.as_ref();
        let (img_name, lbl_name) = split.file_names();
        let img_bytes = read_file(&dir.join(img_name))?;
        let lbl_bytes = read_file(&dir.join(lbl_name))?;
        let ds = Self::from_raw(&img_bytes, &lbl_bytes, split, limit)?;
        tracing::debug!(
            dir = %dir.display(),
            split = ?split,
            samples = ds.len(),
            rows = ds.rows,
            cols = ds.cols,
            classes = ds.classes.len(),
            "loaded IDX dataset"
        );
        Ok(ds)
    }

    /// Build a dataset from raw IDX image and label bytes.
    pub fn from_raw(
        image_bytes: &[u8],
        label_bytes: &[u8],
        split: IdxSplit,
        limit: Option<usize>,
    ) -> Result<Self, IdxError> {
        let (pixels, rows, cols) = parse_idx3_images(image_bytes, limit)?;
        let labels = parse_idx1_labels(label_bytes, limit)?;
        if pixels.len() != labels.len() {
            return Err(IdxError::CountMismatch {
                images: pixels.len(),
                labels: labels.len(),
            });
        }
        let images = pixels
            .iter()
            .map(|p| image_tensor(p, rows, cols))
            .collect::<Result<Vec<_>, _>>()?;
        let (targets, classes) = labels_to_one_hot(&labels)?;
        Ok(IdxDataset {
            images,
            targets,
            labels,
            classes,
            rows,
            cols,
            split,
        })
    }

    /// A small learnable dataset: class `c` draws a bright vertical bar at a
    /// column determined by `c`, over random background noise.
    pub fn synthetic(
        n: usize,
        rows: usize,
        cols: usize,
        classes: u8,
        seed: u64,
    ) -> Result<Self, IdxError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let (rows, cols, classes) = (rows.max(1), cols.max(1), classes.max(1));
        let mut images = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            // cycle through the classes so every one is present
            let label = (i % classes as usize) as u8;
            let bar = (label as usize * cols) / classes as usize;
            let pixels: Vec<u8> = (0..rows * cols)
                .map(|p| if p % cols == bar { 255 } else { rng.gen_range(0..64u8) })
                .collect();
            images.push(image_tensor(&pixels, rows, cols)?);
            labels.push(label);
        }
        let (targets, classes) = labels_to_one_hot(&labels)?;
        Ok(IdxDataset {
            images,
            targets,
            labels,
            classes,
            rows,
            cols,
            split: IdxSplit::Train,
        })
    }

    /// Re-encode the one-hot targets over `classes` (typically the classes
    /// of the training split), so train and test targets line up.
    pub fn relabel(&mut self, classes: &[u8]) -> Result<(), IdxError> {
        self.targets = self
            .labels
            .iter()
            .map(|&l| one_hot(l, classes))
            .collect::<Result<Vec<_>, _>>()?;
        self.classes = classes.to_vec();
        Ok(())
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the dataset has no samples.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Image tensors, dims `[cols, rows]`.
    pub fn images(&self) -> &[Tensor] {
        &self.images
    }

    /// One-hot target tensors, dims `[num_classes]`.
    pub fn targets(&self) -> &[Tensor] {
        &self.targets
    }

    /// Raw label of sample `i`.
    pub fn label(&self, i: usize) -> Option<u8> {
        self.labels.get(i).copied()
    }

    /// The distinct labels, sorted; position = one-hot index.
    pub fn classes(&self) -> &[u8] {
        &self.classes
    }

    /// Shape of every image tensor.
    pub fn input_dims(&self) -> Shape {
        Shape::from((self.cols, self.rows))
    }

    /// Image dimensions: (rows, cols).
    pub fn image_dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Which split this dataset represents.
    pub fn split(&self) -> IdxSplit {
        self.split
    }

    /// Take ownership of the (images, targets) pairs.
    pub fn into_samples(self) -> (Vec<Tensor>, Vec<Tensor>) {
        (self.images, self.targets)
    }
}

/// Turn labels into one-hot tensors over the sorted distinct labels.
/// Returns the tensors and the class list.
pub fn labels_to_one_hot(labels: &[u8]) -> Result<(Vec<Tensor>, Vec<u8>), IdxError> {
    let mut classes = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();
    let targets = labels
        .iter()
        .map(|&l| one_hot(l, &classes))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((targets, classes))
}

fn one_hot(label: u8, classes: &[u8]) -> Result<Tensor, IdxError> {
    let index = classes
        .binary_search(&label)
        .map_err(|_| IdxError::UnknownLabel(label))?;
    let mut values = vec![0.0; classes.len()];
    values[index] = 1.0;
    Ok(Tensor::new(classes.len(), values)?)
}

/// Grey value of one pixel byte.
pub fn pixel_value(p: u8) -> f64 {
    (128.0 - p as f64) / 255.0
}

fn image_tensor(pixels: &[u8], rows: usize, cols: usize) -> Result<Tensor, IdxError> {
    let values = pixels.iter().map(|&p| pixel_value(p)).collect();
    Ok(Tensor::new((cols, rows), values)?)
}

// IDX file format parsing

fn read_file(path: &Path) -> Result<Vec<u8>, IdxError> {
    if !path.exists() {
        return Err(IdxError::MissingFile(path.to_path_buf()));
    }
    Ok(fs::read(path)?)
}

/// Parse an IDX3 file (images): magic=2051, count, rows, cols, data.
/// Returns at most `limit` images.
pub fn parse_idx3_images(
    data: &[u8],
    limit: Option<usize>,
) -> Result<(Vec<Vec<u8>>, usize, usize), IdxError> {
    check_len("IDX3 header", data, 16)?;
    check_magic(data, IMAGES_MAGIC)?;

    let count = read_u32_be(data, 4) as usize;
    let count = limit.map_or(count, |l| l.min(count));
    let rows = read_u32_be(data, 8) as usize;
    let cols = read_u32_be(data, 12) as usize;
    let pixels_per_image = rows
        .checked_mul(cols)
        .ok_or_else(|| overflow("IDX3 image size", data))?;
    let end = count
        .checked_mul(pixels_per_image)
        .and_then(|n| n.checked_add(16))
        .ok_or_else(|| overflow("IDX3 images", data))?;
    check_len("IDX3 images", data, end)?;

    let images = data[16..end]
        .chunks(pixels_per_image.max(1))
        .map(|c| c.to_vec())
        .collect();
    Ok((images, rows, cols))
}

/// Parse an IDX1 file (labels): magic=2049, count, data.
/// Returns at most `limit` labels.
pub fn parse_idx1_labels(data: &[u8], limit: Option<usize>) -> Result<Vec<u8>, IdxError> {
    check_len("IDX1 header", data, 8)?;
    check_magic(data, LABELS_MAGIC)?;

    let count = read_u32_be(data, 4) as usize;
    let count = limit.map_or(count, |l| l.min(count));
    let end = count
        .checked_add(8)
        .ok_or_else(|| overflow("IDX1 labels", data))?;
    check_len("IDX1 labels", data, end)?;
    Ok(data[8..end].to_vec())
}

/// Error for header sizes that overflow `usize`.
fn overflow(what: &'static str, data: &[u8]) -> IdxError {
    IdxError::Truncated {
        what,
        expected: usize::MAX,
        got: data.len(),
    }
}

fn check_len(what: &'static str, data: &[u8], expected: usize) -> Result<(), IdxError> {
    if data.len() < expected {
        return Err(IdxError::Truncated {
            what,
            expected,
            got: data.len(),
        });
    }
    Ok(())
}

fn check_magic(data: &[u8], expected: u32) -> Result<(), IdxError> {
    let got = read_u32_be(data, 0);
    if got != expected {
        return Err(IdxError::InvalidMagic { expected, got });
    }
    Ok(())
}

/// Read a big-endian u32 from `data` at byte offset `off`.
fn read_u32_be(data: &[u8], off: usize) -> u32 {
    u32::from_be_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
}

// Builder helpers

/// Build IDX3 image bytes from raw image data (useful for tests).
pub fn build_idx3_bytes(images: &[&[u8]], rows: u32, cols: u32) -> Vec<u8> {
    let count = images.len() as u32;
    let mut buf = Vec::new();
    buf.extend_from_slice(&IMAGES_MAGIC.to_be_bytes());
    buf.extend_from_slice(&count.to_be_bytes());
    buf.extend_from_slice(&rows.to_be_bytes());
    buf.extend_from_slice(&cols.to_be_bytes());
    for img in images {
        buf.extend_from_slice(img);
    }
    buf
}

/// Build IDX1 label bytes (useful for tests).
pub fn build_idx1_bytes(labels: &[u8]) -> Vec<u8> {
    let count = labels.len() as u32;
    let mut buf = Vec::new();
    buf.extend_from_slice(&LABELS_MAGIC.to_be_bytes());
    buf.extend_from_slice(&count.to_be_bytes());
    buf.extend_from_slice(labels);
    buf
}
