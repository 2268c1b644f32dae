// Cross-correlation — sliding inner products
//
// For every placement of the filter over the base tensor, take the inner
// product of the filter with the region underneath:
//
//   out[p] = Σ_k filter[k] · base[p + k]
//
// Placements are visited by `RegionsIter`, so the output is laid out on the
// grid of placements and has `D_i - F_i + 1 + 2·P_i` entries along axis i
// (D = base dims, F = filter dims, P = padding). A filter with fewer axes than
// the base is treated as having trailing axes of length 1.
//
// This is the only numerical kernel the convolutional layer needs. Its forward
// pass, filter gradient and input gradient are all cross-correlations with
// different operands (the input gradient uses a flipped filter and a padding
// of F - 1, which turns the correlation into a full convolution).

use crate::error::{Error, Result};
use crate::tensor::Tensor;

/// Cross-correlation map of `filter` over `base`, with `padding` zeros on
/// both ends of each axis.
///
/// # Example
/// ```
/// use hornet_core::{cross_correlate, Tensor};
///
/// let base = Tensor::new((3, 3), (0..9).map(f64::from).collect())?;
/// let filter = Tensor::full((2, 2), 1.0)?;
/// let out = cross_correlate(&base, &filter, &[])?;
/// assert_eq!(out.dims(), &[2, 2]);
/// assert_eq!(out.values(), &[8.0, 12.0, 20.0, 24.0]);
/// # Ok::<(), hornet_core::Error>(())
/// ```
pub fn cross_correlate(base: &Tensor, filter: &Tensor, padding: &[usize]) -> Result<Tensor> {
    if filter.rank() > base.rank() {
        return Err(Error::RankMismatch {
            expected: base.rank(),
            got: filter.rank(),
        });
    }
    let regions = base.regions(filter.dims(), padding, &[])?;
    let grid = regions.grid_shape();
    let mut values = Vec::with_capacity(grid.elem_count());
    for region in regions {
        values.push(region.inner_product(filter)?);
    }
    Tensor::new(grid, values)
}
