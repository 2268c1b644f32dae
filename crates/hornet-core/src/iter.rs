// Coordinate and region iteration
//
// Three iterators, each built on the previous one:
//
//   CoordIter          — every integer point of a closed hyperrectangle, as an
//                        odometer: axis 0 ticks fastest and carries into axis 1
//                        when it passes its maximum, exactly like the Horner
//                        index order of a tensor.
//   StridingCoordIter  — the same walk, but only every stride[i]-th point on
//                        axis i, measured from the lower corner.
//   RegionsIter        — every placement of a fixed-size window over a tensor,
//                        yielding the sub-tensor under the window. Placements
//                        may hang off the edges by `padding`; reads that land
//                        outside the tensor come back as 0.0.
//
// Coordinates are `isize` here because padded placements start at negative
// offsets.

use std::iter::FusedIterator;

use crate::error::{Error, Result};
use crate::shape::Shape;
use crate::tensor::Tensor;

/// Walks every coordinate of the closed hyperrectangle spanned by two corners.
///
/// Corner order does not matter; the minimum and maximum of each axis are
/// resolved on construction.
///
/// ```
/// use hornet_core::CoordIter;
///
/// let coords: Vec<_> = CoordIter::new(&[0, 0], &[1, 1]).unwrap().collect();
/// assert_eq!(coords, vec![vec![0, 0], vec![1, 0], vec![0, 1], vec![1, 1]]);
/// ```
#[derive(Debug, Clone)]
pub struct CoordIter {
    start: Vec<isize>,
    end: Vec<isize>,
    next: Vec<isize>,
    remaining: usize,
    total: usize,
}

impl CoordIter {
    /// Iterate the hyperrectangle with opposite corners `corner1` and `corner2`.
    pub fn new(corner1: &[isize], corner2: &[isize]) -> Result<Self> {
        if corner1.len() != corner2.len() {
            return Err(Error::RankMismatch {
                expected: corner1.len(),
                got: corner2.len(),
            });
        }
        let start: Vec<isize> = corner1
            .iter()
            .zip(corner2)
            .map(|(&a, &b)| a.min(b))
            .collect();
        let end: Vec<isize> = corner1
            .iter()
            .zip(corner2)
            .map(|(&a, &b)| a.max(b))
            .collect();
        let total = start
            .iter()
            .zip(&end)
            .map(|(&s, &e)| (e - s) as usize + 1)
            .product();
        Ok(CoordIter {
            next: start.clone(),
            start,
            end,
            remaining: total,
            total,
        })
    }

    /// Iterate every coordinate of a tensor with the given shape.
    pub fn over(shape: &Shape) -> Self {
        let rank = shape.rank();
        let start = vec![0isize; rank];
        let end: Vec<isize> = shape.dims().iter().map(|&d| d as isize - 1).collect();
        let total = shape.elem_count();
        CoordIter {
            next: start.clone(),
            start,
            end,
            remaining: total,
            total,
        }
    }

    /// Total number of coordinates this iterator produces.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of coordinates produced so far.
    pub fn position(&self) -> usize {
        self.total - self.remaining
    }

    /// Extent of the walk along each axis.
    pub fn extent(&self) -> Vec<usize> {
        self.start
            .iter()
            .zip(&self.end)
            .map(|(&s, &e)| (e - s) as usize + 1)
            .collect()
    }
}

impl Iterator for CoordIter {
    type Item = Vec<isize>;

    fn next(&mut self) -> Option<Vec<isize>> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next.clone();
        self.remaining -= 1;

        // Odometer step: bump the first axis that still has room, resetting
        // every axis before it.
        for axis in 0..self.next.len() {
            if self.next[axis] < self.end[axis] {
                self.next[axis] += 1;
                break;
            }
            self.next[axis] = self.start[axis];
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for CoordIter {}
impl FusedIterator for CoordIter {}

/// Like [`CoordIter`], but visits only every `strides[i]`-th coordinate along
/// axis `i`, counted from the lower corner.
///
/// Strides shorter than the corner rank are extended with 1s.
#[derive(Debug, Clone)]
pub struct StridingCoordIter {
    origin: Vec<isize>,
    strides: Vec<usize>,
    steps: CoordIter,
}

impl StridingCoordIter {
    pub fn new(corner1: &[isize], corner2: &[isize], strides: &[usize]) -> Result<Self> {
        if corner1.len() != corner2.len() {
            return Err(Error::RankMismatch {
                expected: corner1.len(),
                got: corner2.len(),
            });
        }
        let rank = corner1.len();
        if strides.len() > rank {
            return Err(Error::RankMismatch {
                expected: rank,
                got: strides.len(),
            });
        }
        let mut strides = strides.to_vec();
        strides.resize(rank, 1);
        if strides.iter().any(|&s| s == 0) {
            return Err(Error::InvalidStride { strides });
        }

        let origin: Vec<isize> = corner1
            .iter()
            .zip(corner2)
            .map(|(&a, &b)| a.min(b))
            .collect();
        let last_step: Vec<isize> = corner1
            .iter()
            .zip(corner2)
            .zip(&strides)
            .map(|((&a, &b), &s)| (a - b).abs() / s as isize)
            .collect();
        let steps = CoordIter::new(&vec![0; rank], &last_step)?;

        Ok(StridingCoordIter {
            origin,
            strides,
            steps,
        })
    }

    /// Number of coordinates visited along each axis.
    pub fn grid_dims(&self) -> Vec<usize> {
        self.steps.extent()
    }

    /// Total number of coordinates this iterator produces.
    pub fn total(&self) -> usize {
        self.steps.total()
    }

    /// Number of coordinates produced so far.
    pub fn position(&self) -> usize {
        self.steps.position()
    }
}

impl Iterator for StridingCoordIter {
    type Item = Vec<isize>;

    fn next(&mut self) -> Option<Vec<isize>> {
        let step = self.steps.next()?;
        Some(
            step.iter()
                .zip(&self.strides)
                .zip(&self.origin)
                .map(|((&k, &s), &o)| o + k * s as isize)
                .collect(),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.steps.size_hint()
    }
}

impl ExactSizeIterator for StridingCoordIter {}
impl FusedIterator for StridingCoordIter {}

/// Lower corners of every placement of `window` over a tensor of `shape`.
///
/// `window`, `padding` and `strides` may be shorter than the tensor's rank:
/// missing window axes have length 1, missing padding is 0, missing strides
/// are 1. Corners range from `-padding` to `dims - window + padding` per axis.
pub fn window_origins(
    shape: &Shape,
    window: &[usize],
    padding: &[usize],
    strides: &[usize],
) -> Result<StridingCoordIter> {
    let rank = shape.rank();
    for len in [window.len(), padding.len()] {
        if len > rank {
            return Err(Error::RankMismatch {
                expected: rank,
                got: len,
            });
        }
    }
    let window = Shape::from(window).extend_to_rank(rank);
    let mut padding = padding.to_vec();
    padding.resize(rank, 0);

    let fits = window
        .dims()
        .iter()
        .zip(shape.dims())
        .zip(&padding)
        .all(|((&w, &d), &p)| w > 0 && w <= d + 2 * p);
    if !fits {
        return Err(Error::WindowTooLarge {
            window: window.dims().to_vec(),
            shape: shape.clone(),
            padding,
        });
    }

    let lower: Vec<isize> = padding.iter().map(|&p| -(p as isize)).collect();
    let upper: Vec<isize> = window
        .dims()
        .iter()
        .zip(shape.dims())
        .zip(&padding)
        .map(|((&w, &d), &p)| d as isize - w as isize + p as isize)
        .collect();
    StridingCoordIter::new(&lower, &upper, strides)
}

/// Every placement of a fixed-size window over a tensor, yielding the
/// sub-tensor under the window in placement order.
///
/// Created by [`Tensor::regions`]. Each yielded region has the window's shape
/// (extended with 1s to the tensor's rank).
#[derive(Debug, Clone)]
pub struct RegionsIter<'a> {
    tensor: &'a Tensor,
    window: Vec<usize>,
    origins: StridingCoordIter,
}

impl<'a> RegionsIter<'a> {
    pub(crate) fn new(
        tensor: &'a Tensor,
        window: &[usize],
        padding: &[usize],
        strides: &[usize],
    ) -> Result<Self> {
        let origins = window_origins(tensor.shape(), window, padding, strides)?;
        let window = Shape::from(window)
            .extend_to_rank(tensor.rank())
            .dims()
            .to_vec();
        Ok(RegionsIter {
            tensor,
            window,
            origins,
        })
    }

    /// Shape of the grid of placements, one entry per region.
    pub fn grid_shape(&self) -> Shape {
        Shape::new(self.origins.grid_dims())
    }

    /// Number of regions produced so far.
    pub fn position(&self) -> usize {
        self.origins.position()
    }
}

impl Iterator for RegionsIter<'_> {
    type Item = Tensor;

    fn next(&mut self) -> Option<Tensor> {
        let origin = self.origins.next()?;
        Some(self.tensor.region_at(&origin, &self.window))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.origins.size_hint()
    }
}

impl ExactSizeIterator for RegionsIter<'_> {}
impl FusedIterator for RegionsIter<'_> {}
