// Tensor — The fundamental data structure
//
// A Tensor is an N-dimensional array of f64 values:
//
//   1. `shape`  — the length of every axis (all positive)
//   2. `values` — one flat buffer holding Π(shape) values
//
// The buffer is addressed with Horner's scheme (see shape.rs): the first axis
// varies fastest. `values.len() == shape.elem_count()` holds for every tensor
// that exists; constructors refuse to build anything else.
//
// VALUE SEMANTICS:
//
//   A Tensor owns its buffer outright. Every arithmetic operation returns a
//   new tensor instead of editing its operands. `set` is the only in-place
//   mutation.
//
// PADDING:
//
//   `get` rejects coordinates outside the tensor. Region extraction and
//   cross-correlation instead read through `get_or_zero`, which treats
//   everything outside the tensor as 0.0. This is the virtual zero-padding
//   that lets a window hang over the edge.

use std::fmt;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::correlate;
use crate::error::{Error, Result};
use crate::iter::{CoordIter, RegionsIter};
use crate::shape::Shape;

/// An N-dimensional array of `f64` values stored in Horner order.
///
/// # Example
/// ```
/// use hornet_core::Tensor;
///
/// let t = Tensor::new((2, 3), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])?;
/// assert_eq!(t.get(&[1, 2])?, 5.0);
/// assert_eq!(t.inner_product(&t)?, 55.0);
/// # Ok::<(), hornet_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    values: Vec<f64>,
}

impl Tensor {
    // Constructors

    /// Create a tensor from a shape and a Horner-ordered value buffer.
    pub fn new(shape: impl Into<Shape>, values: Vec<f64>) -> Result<Self> {
        let shape = shape.into();
        check_shape(&shape)?;
        let expected = shape.elem_count();
        if values.len() != expected {
            return Err(Error::ElementCountMismatch {
                shape,
                expected,
                got: values.len(),
            });
        }
        Ok(Tensor { shape, values })
    }

    /// Create a tensor by copying a slice of values.
    pub fn from_slice(values: &[f64], shape: impl Into<Shape>) -> Result<Self> {
        Self::new(shape, values.to_vec())
    }

    /// A tensor filled with zeros.
    pub fn zeros(shape: impl Into<Shape>) -> Result<Self> {
        Self::full(shape, 0.0)
    }

    /// A tensor filled with `value`.
    pub fn full(shape: impl Into<Shape>, value: f64) -> Result<Self> {
        let shape = shape.into();
        check_shape(&shape)?;
        let values = vec![value; shape.elem_count()];
        Ok(Tensor { shape, values })
    }

    /// A zero tensor with the same shape as `self`.
    pub fn zeros_like(&self) -> Self {
        Tensor {
            shape: self.shape.clone(),
            values: vec![0.0; self.values.len()],
        }
    }

    /// Values drawn uniformly from `[low, high)`.
    pub fn rand_uniform<R: Rng>(
        shape: impl Into<Shape>,
        low: f64,
        high: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let shape = shape.into();
        check_shape(&shape)?;
        let range = high - low;
        let values = (0..shape.elem_count())
            .map(|_| low + rng.gen::<f64>() * range)
            .collect();
        Ok(Tensor { shape, values })
    }

    /// Values drawn from the standard normal distribution N(0, 1).
    pub fn randn<R: Rng>(shape: impl Into<Shape>, rng: &mut R) -> Result<Self> {
        let shape = shape.into();
        check_shape(&shape)?;
        let values = (0..shape.elem_count())
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();
        Ok(Tensor { shape, values })
    }

    // Accessors

    /// The shape of this tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The dimensions as a slice (shortcut for shape().dims()).
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Total number of elements.
    pub fn elem_count(&self) -> usize {
        self.values.len()
    }

    /// The flat value buffer, in Horner order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consume the tensor, returning its value buffer.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    // Element access

    /// The element at `coords`. Out-of-range coordinates are an error.
    pub fn get(&self, coords: &[usize]) -> Result<f64> {
        self.check_coords(coords)?;
        Ok(self.values[self.shape.index_of(coords)])
    }

    /// The element at `coords`, or 0.0 if any component falls outside the
    /// tensor. This is the padding-aware read used by region extraction.
    pub fn get_or_zero(&self, coords: &[isize]) -> f64 {
        let mut index = 0usize;
        let mut product = 1usize;
        for (axis, &d) in self.shape.dims().iter().enumerate() {
            let c = coords.get(axis).copied().unwrap_or(0);
            if c < 0 || c as usize >= d {
                return 0.0;
            }
            index += c as usize * product;
            product *= d;
        }
        // Components beyond the tensor's rank address a virtual axis of length 1.
        if coords.iter().skip(self.rank()).any(|&c| c != 0) {
            return 0.0;
        }
        self.values[index]
    }

    /// Overwrite the element at `coords`.
    pub fn set(&mut self, coords: &[usize], value: f64) -> Result<()> {
        self.check_coords(coords)?;
        let index = self.shape.index_of(coords);
        self.values[index] = value;
        Ok(())
    }

    fn check_coords(&self, coords: &[usize]) -> Result<()> {
        if self.shape.contains(coords) {
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds {
                coords: coords.to_vec(),
                shape: self.shape.clone(),
            })
        }
    }

    // Regions

    /// Iterate every coordinate of this tensor in Horner order.
    pub fn coords(&self) -> CoordIter {
        CoordIter::over(&self.shape)
    }

    /// The sub-tensor with opposite corners `corner1` and `corner2`.
    ///
    /// The region has `|corner2[i] - corner1[i]| + 1` elements along axis `i`.
    /// Corners may lie outside the tensor; those positions read as 0.0.
    pub fn region(&self, corner1: &[isize], corner2: &[isize]) -> Result<Tensor> {
        let coords = CoordIter::new(corner1, corner2)?;
        let shape = Shape::new(coords.extent());
        let values = coords.map(|c| self.get_or_zero(&c)).collect();
        Ok(Tensor { shape, values })
    }

    /// The window of size `window` whose lower corner sits at `origin`.
    pub(crate) fn region_at(&self, origin: &[isize], window: &[usize]) -> Tensor {
        let coords = CoordIter::over(&Shape::from(window));
        let mut values = Vec::with_capacity(coords.total());
        let mut at = vec![0isize; origin.len()];
        for offset in coords {
            for ((a, &o), &k) in at.iter_mut().zip(origin).zip(&offset) {
                *a = o + k;
            }
            values.push(self.get_or_zero(&at));
        }
        Tensor {
            shape: Shape::from(window),
            values,
        }
    }

    /// Every placement of a `window`-sized region over this tensor.
    ///
    /// `padding` lets placements hang `padding[i]` cells off both ends of axis
    /// `i`; `strides` skips placements. All three may be shorter than the
    /// tensor's rank (window axes default to 1, padding to 0, strides to 1).
    pub fn regions(
        &self,
        window: &[usize],
        padding: &[usize],
        strides: &[usize],
    ) -> Result<RegionsIter<'_>> {
        RegionsIter::new(self, window, padding, strides)
    }

    /// Cross-correlation map of `filter` over this tensor.
    /// See [`correlate::cross_correlate`].
    pub fn cross_correlate(&self, filter: &Tensor, padding: &[usize]) -> Result<Tensor> {
        correlate::cross_correlate(self, filter, padding)
    }

    // Elementwise arithmetic

    /// Elementwise `self + other * factor`.
    ///
    /// Used for gradient accumulation (`factor = 1`) and gradient-descent
    /// updates (`factor = -learning_rate`). Both tensors must hold the same
    /// number of values; the result takes `self`'s shape.
    pub fn add(&self, other: &Tensor, factor: f64) -> Result<Tensor> {
        self.check_same_len(other)?;
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(&a, &b)| a + b * factor)
            .collect();
        Ok(Tensor {
            shape: self.shape.clone(),
            values,
        })
    }

    /// Sum of elementwise products.
    pub fn inner_product(&self, other: &Tensor) -> Result<f64> {
        self.check_same_len(other)?;
        Ok(self
            .values
            .iter()
            .zip(&other.values)
            .map(|(&a, &b)| a * b)
            .sum())
    }

    /// Elementwise product.
    pub fn mul(&self, other: &Tensor) -> Result<Tensor> {
        self.check_same_len(other)?;
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(&a, &b)| a * b)
            .collect();
        Ok(Tensor {
            shape: self.shape.clone(),
            values,
        })
    }

    /// Every element multiplied by `factor`.
    pub fn scale(&self, factor: f64) -> Tensor {
        self.map(|v| v * factor)
    }

    /// Apply `f` to every element.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Tensor {
        Tensor {
            shape: self.shape.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Sum of all elements.
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    fn check_same_len(&self, other: &Tensor) -> Result<()> {
        if self.values.len() != other.values.len() {
            return Err(Error::ShapeMismatch {
                expected: self.shape.clone(),
                got: other.shape.clone(),
            });
        }
        Ok(())
    }

    // Reductions

    /// Flat index of the largest value. The first maximum wins on ties.
    pub fn max_value_index(&self) -> usize {
        let mut best = 0;
        for (i, &v) in self.values.iter().enumerate().skip(1) {
            if v > self.values[best] {
                best = i;
            }
        }
        best
    }

    /// The largest value.
    pub fn max_value(&self) -> f64 {
        self.values[self.max_value_index()]
    }

    // Shape manipulation

    /// Reflect every coordinate: `new[c] = old[dims - 1 - c]` on every axis.
    ///
    /// Reflecting every axis at once sends flat index `i` to `len - 1 - i`,
    /// so this is a reversal of the value buffer.
    pub fn flip(&self) -> Tensor {
        let mut values = self.values.clone();
        values.reverse();
        Tensor {
            shape: self.shape.clone(),
            values,
        }
    }

    /// The same values under a different shape with the same element count.
    pub fn reshape(&self, shape: impl Into<Shape>) -> Result<Tensor> {
        let shape = shape.into();
        check_shape(&shape)?;
        if shape.elem_count() != self.values.len() {
            return Err(Error::ElementCountMismatch {
                expected: shape.elem_count(),
                got: self.values.len(),
                shape,
            });
        }
        Ok(Tensor {
            shape,
            values: self.values.clone(),
        })
    }

    /// Concatenate `other`'s values after this tensor's along the trailing
    /// axis of a `result_rank`-axis result.
    ///
    /// This tensor's dims are extended with 1s up to `result_rank`. The
    /// trailing axis then grows by `other`'s trailing length if `other` already
    /// has `result_rank` axes, or by 1 if it has fewer (it becomes one new
    /// slice). All leading axes must agree.
    ///
    /// ```
    /// use hornet_core::Tensor;
    ///
    /// let a = Tensor::new((2, 2), vec![1.0, 2.0, 3.0, 4.0])?;
    /// let b = Tensor::new((2, 2), vec![5.0, 6.0, 7.0, 8.0])?;
    /// let ab = a.append(&b, 3)?;
    /// assert_eq!(ab.dims(), &[2, 2, 2]);
    /// assert_eq!(ab.get(&[0, 1, 1])?, 7.0);
    /// # Ok::<(), hornet_core::Error>(())
    /// ```
    pub fn append(&self, other: &Tensor, result_rank: usize) -> Result<Tensor> {
        for rank in [self.rank(), other.rank()] {
            if result_rank == 0 || rank > result_rank {
                return Err(Error::RankMismatch {
                    expected: result_rank,
                    got: rank,
                });
            }
        }
        let base = self.shape.extend_to_rank(result_rank);
        let leading = base.without_trailing();
        let (other_leading, added) = if other.rank() == result_rank {
            (other.shape.without_trailing(), other.dims()[result_rank - 1])
        } else {
            (other.shape.extend_to_rank(result_rank - 1), 1)
        };
        if other_leading != leading {
            return Err(Error::ShapeMismatch {
                expected: leading,
                got: other_leading,
            });
        }

        let mut dims = base.dims().to_vec();
        dims[result_rank - 1] += added;
        let mut values = Vec::with_capacity(self.values.len() + other.values.len());
        values.extend_from_slice(&self.values);
        values.extend_from_slice(&other.values);
        Ok(Tensor {
            shape: Shape::new(dims),
            values,
        })
    }

    /// Stack equally-shaped tensors along a new trailing axis.
    pub fn stack(tensors: &[Tensor]) -> Result<Tensor> {
        let (first, rest) = tensors
            .split_first()
            .ok_or_else(|| Error::msg("cannot stack an empty list of tensors"))?;
        let rank = first.rank() + 1;
        let mut stacked = first.reshape(first.shape.with_trailing(1))?;
        for t in rest {
            if t.shape != first.shape {
                return Err(Error::ShapeMismatch {
                    expected: first.shape.clone(),
                    got: t.shape.clone(),
                });
            }
            stacked = stacked.append(t, rank)?;
        }
        Ok(stacked)
    }

    /// Split along the trailing axis: the inverse of [`Tensor::stack`].
    ///
    /// Each slice has this tensor's shape without its last axis.
    pub fn unstack(&self) -> Vec<Tensor> {
        let Some(&count) = self.dims().last() else {
            return vec![self.clone()];
        };
        let slice_shape = self.shape.without_trailing();
        let slice_len = self.values.len() / count;
        self.values
            .chunks(slice_len)
            .map(|chunk| Tensor {
                shape: slice_shape.clone(),
                values: chunk.to_vec(),
            })
            .collect()
    }
}

fn check_shape(shape: &Shape) -> Result<()> {
    if shape.is_valid() {
        Ok(())
    } else {
        Err(Error::InvalidShape {
            shape: shape.clone(),
        })
    }
}

/// Prints the values as a sequence of XY planes: axis 0 runs along a line,
/// axis 1 down the lines, and a blank line separates consecutive planes.
impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self.dims();
        let row = dims.first().copied().unwrap_or(1);
        let plane = row * dims.get(1).copied().unwrap_or(1);
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                if self.rank() > 1 && i % row == 0 {
                    writeln!(f)?;
                    if i % plane == 0 {
                        writeln!(f)?;
                    }
                } else {
                    write!(f, " ")?;
                }
            }
            write!(f, "{:.4}", v)?;
        }
        Ok(())
    }
}
