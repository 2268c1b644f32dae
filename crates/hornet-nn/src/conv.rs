// Convolutional & MaxPooling — sliding-window layers
//
// Convolutional holds `depth` learnable filters. Each filter is slid over the
// input and produces one cross-correlation map; the maps are stacked along a
// new trailing axis:
//
//   input [D0, D1, ...]  ──filter [F0, F1, ...] × depth──▶  [D0-F0+1, D1-F1+1, ..., depth]
//
// A filter with fewer axes than the input is treated as having trailing axes
// of length 1, so a 3x3 filter over a [26, 26, 8] input reads one channel.
//
// BACKPROP (per filter k, g_k = slice k of the output gradient):
//
//   ∂L/∂filter_k = corr(input, g_k)
//   ∂L/∂input    = Σ_k corr(g_k, flip(filter_k), padding = F - 1)
//
// The second line is the "full correlation with a flipped kernel" identity:
// padding by F - 1 on both sides grows the map back to the input's shape.
// Input gradients are computed from the filters as they were during forward,
// then every filter is replaced by `filter_k - lr · ∂L/∂filter_k`.
//
// MaxPooling slides a window (with strides) over the input and keeps each
// window's maximum:
//
//   out_i = ceil((D_i - S_i + 1) / stride_i)
//
// It remembers, for every output position, the flat input index that won.
// Backward hands each upstream gradient value to that index and zero to every
// other input position. Overlapping windows that share a winner add up.

use hornet_core::{window_origins, Error, Result, Shape, Tensor};
use rand::Rng;

use crate::init;
use crate::layer::{check_grad, check_input, Layer};

/// Convolutional layer: `depth` learnable filters cross-correlated with the
/// input, stacked along a trailing axis.
///
/// # Examples
/// ```
/// use hornet_core::{Shape, Tensor};
/// use hornet_nn::{Convolutional, Layer};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let mut conv = Convolutional::new((3, 3), 8, (28, 28), &mut rng)?;
/// assert_eq!(conv.output_dims(), &Shape::from((26, 26, 8)));
///
/// let y = conv.forward(&Tensor::zeros((28, 28))?)?;
/// assert_eq!(y.dims(), &[26, 26, 8]);
/// # Ok::<(), hornet_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Convolutional {
    /// One tensor per filter, each with the configured filter dims.
    filters: Vec<Tensor>,
    /// Filter dims extended with 1s to the input's rank.
    window: Vec<usize>,
    input_dims: Shape,
    output_dims: Shape,
    recent_input: Option<Tensor>,
}

impl Convolutional {
    /// Create a layer with `depth` He-initialized filters of `filter_dims`
    /// for inputs of `input_dims`.
    pub fn new<R: Rng>(
        filter_dims: impl Into<Shape>,
        depth: usize,
        input_dims: impl Into<Shape>,
        rng: &mut R,
    ) -> Result<Self> {
        let filter_dims = filter_dims.into();
        let input_dims = input_dims.into();
        if depth == 0 {
            hornet_core::bail!("convolutional layer needs at least one filter");
        }
        if filter_dims.rank() > input_dims.rank() {
            return Err(Error::RankMismatch {
                expected: input_dims.rank(),
                got: filter_dims.rank(),
            });
        }
        // validates the filter fits and yields the map dims
        let grid = window_origins(&input_dims, filter_dims.dims(), &[], &[])?.grid_dims();
        let output_dims = Shape::new(grid).with_trailing(depth);

        let fan_in = filter_dims.elem_count();
        let filters = (0..depth)
            .map(|_| init::he_normal(&filter_dims, fan_in, &mut *rng))
            .collect::<Result<Vec<_>>>()?;

        Ok(Convolutional {
            filters,
            window: filter_dims.extend_to_rank(input_dims.rank()).dims().to_vec(),
            input_dims,
            output_dims,
            recent_input: None,
        })
    }

    /// Create a layer from explicit filters (all with the same dims).
    pub fn from_filters(filters: Vec<Tensor>, input_dims: impl Into<Shape>) -> Result<Self> {
        let input_dims = input_dims.into();
        let first = filters
            .first()
            .ok_or_else(|| Error::msg("convolutional layer needs at least one filter"))?;
        let filter_dims = first.shape().clone();
        if let Some(bad) = filters.iter().find(|f| f.shape() != &filter_dims) {
            return Err(Error::ShapeMismatch {
                expected: filter_dims,
                got: bad.shape().clone(),
            });
        }
        if filter_dims.rank() > input_dims.rank() {
            return Err(Error::RankMismatch {
                expected: input_dims.rank(),
                got: filter_dims.rank(),
            });
        }
        let grid = window_origins(&input_dims, filter_dims.dims(), &[], &[])?.grid_dims();
        Ok(Convolutional {
            output_dims: Shape::new(grid).with_trailing(filters.len()),
            window: filter_dims.extend_to_rank(input_dims.rank()).dims().to_vec(),
            filters,
            input_dims,
            recent_input: None,
        })
    }

    /// The current filters.
    pub fn filters(&self) -> &[Tensor] {
        &self.filters
    }

    /// Number of filters (size of the output's trailing axis).
    pub fn depth(&self) -> usize {
        self.filters.len()
    }
}

impl Layer for Convolutional {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        check_input(&self.input_dims, input)?;
        let maps = self
            .filters
            .iter()
            .map(|f| input.cross_correlate(f, &[]))
            .collect::<Result<Vec<_>>>()?;
        let output = Tensor::stack(&maps)?;
        self.recent_input = Some(input.clone());
        Ok(output)
    }

    fn backward(&mut self, output_grad: &Tensor, learning_rate: f64) -> Result<Tensor> {
        check_grad(&self.output_dims, output_grad)?;
        let input = self
            .recent_input
            .take()
            .ok_or(Error::NoForwardPass { layer: self.name() })?;

        let grad = output_grad.reshape(&self.output_dims)?;
        let full_padding: Vec<usize> = self.window.iter().map(|&w| w - 1).collect();

        let mut input_grad = Tensor::zeros(&self.input_dims)?;
        let mut updated = Vec::with_capacity(self.filters.len());
        for (filter, grad_k) in self.filters.iter().zip(grad.unstack()) {
            let filter_grad = input.cross_correlate(&grad_k, &[])?;
            let back = grad_k.cross_correlate(&filter.flip(), &full_padding)?;
            input_grad = input_grad.add(&back, 1.0)?;
            updated.push(filter.add(&filter_grad, -learning_rate)?);
        }
        self.filters = updated;
        Ok(input_grad)
    }

    fn input_dims(&self) -> &Shape {
        &self.input_dims
    }

    fn output_dims(&self) -> &Shape {
        &self.output_dims
    }

    fn name(&self) -> &'static str {
        "convolutional"
    }

    fn num_parameters(&self) -> usize {
        self.filters.iter().map(|f| f.elem_count()).sum()
    }
}

/// Max-pooling layer: the maximum of each (strided) window.
///
/// `sizes` and `strides` may have fewer axes than the input; missing window
/// axes have length 1 and missing strides are 1.
///
/// # Examples
/// ```
/// use hornet_core::Tensor;
/// use hornet_nn::{Layer, MaxPooling};
///
/// let mut pool = MaxPooling::new(&[2, 2], &[2, 2], (4, 4))?;
/// let x = Tensor::new((4, 4), (0..16).map(f64::from).collect())?;
/// let y = pool.forward(&x)?;
/// assert_eq!(y.values(), &[5.0, 7.0, 13.0, 15.0]);
/// # Ok::<(), hornet_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MaxPooling {
    sizes: Vec<usize>,
    strides: Vec<usize>,
    input_dims: Shape,
    output_dims: Shape,
    /// Flat input index of the winner, per output position.
    winners: Option<Vec<usize>>,
}

impl MaxPooling {
    /// Create a pooling layer with the given `strides` and window `sizes`
    /// for inputs of `input_dims`.
    pub fn new(strides: &[usize], sizes: &[usize], input_dims: impl Into<Shape>) -> Result<Self> {
        let input_dims = input_dims.into();
        let grid = window_origins(&input_dims, sizes, &[], strides)?.grid_dims();
        Ok(MaxPooling {
            sizes: sizes.to_vec(),
            strides: strides.to_vec(),
            output_dims: Shape::new(grid),
            input_dims,
            winners: None,
        })
    }

    /// Window size along each axis, as configured.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Stride along each axis, as configured.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }
}

impl Layer for MaxPooling {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        check_input(&self.input_dims, input)?;
        let origins = window_origins(&self.input_dims, &self.sizes, &[], &self.strides)?;
        let regions = input.regions(&self.sizes, &[], &self.strides)?;

        let mut values = Vec::with_capacity(self.output_dims.elem_count());
        let mut winners = Vec::with_capacity(self.output_dims.elem_count());
        for (origin, region) in origins.zip(regions) {
            let local = region.shape().coords_of(region.max_value_index());
            let coords: Vec<usize> = origin
                .iter()
                .zip(&local)
                .map(|(&o, &l)| (o + l as isize) as usize)
                .collect();
            winners.push(self.input_dims.index_of(&coords));
            values.push(region.max_value());
        }
        self.winners = Some(winners);
        Tensor::new(&self.output_dims, values)
    }

    fn backward(&mut self, output_grad: &Tensor, _learning_rate: f64) -> Result<Tensor> {
        check_grad(&self.output_dims, output_grad)?;
        let winners = self
            .winners
            .take()
            .ok_or(Error::NoForwardPass { layer: self.name() })?;

        let mut values = vec![0.0; self.input_dims.elem_count()];
        for (&index, &g) in winners.iter().zip(output_grad.values()) {
            values[index] += g;
        }
        Tensor::new(&self.input_dims, values)
    }

    fn input_dims(&self) -> &Shape {
        &self.input_dims
    }

    fn output_dims(&self) -> &Shape {
        &self.output_dims
    }

    fn name(&self) -> &'static str {
        "max_pooling"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn consecutive(dims: &[usize]) -> Tensor {
        let n: usize = dims.iter().product();
        Tensor::new(dims, (0..n).map(|i| i as f64).collect()).unwrap()
    }

    #[test]
    fn test_conv_output_dims() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut conv = Convolutional::new((2, 2), 4, (2, 3, 4), &mut rng).unwrap();
        assert_eq!(conv.output_dims(), &Shape::from((1, 2, 4, 4)));
        let y = conv.forward(&consecutive(&[2, 3, 4])).unwrap();
        assert_eq!(y.dims(), &[1, 2, 4, 4]);
        assert_eq!(conv.num_parameters(), 16);
    }

    #[test]
    fn test_conv_depth_one_keeps_trailing_axis() {
        let mut rng = StdRng::seed_from_u64(0);
        let conv = Convolutional::new((3, 3), 1, (5, 5), &mut rng).unwrap();
        assert_eq!(conv.output_dims(), &Shape::from((3, 3, 1)));
    }

    #[test]
    fn test_conv_forward_matches_correlation() {
        let filter = Tensor::new((2, 2, 1), vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let mut conv = Convolutional::from_filters(vec![filter], (2, 3, 4)).unwrap();
        let y = conv.forward(&consecutive(&[2, 3, 4])).unwrap();
        assert_eq!(y.dims(), &[1, 2, 4, 1]);
        let expected = [2.0, 4.0, 8.0, 10.0, 14.0, 16.0, 20.0, 22.0];
        for (g, e) in y.values().iter().zip(expected) {
            assert!((g - e).abs() < 1e-9);
        }
    }

    #[test]
    fn test_conv_backward_shapes_and_update() {
        let filter = Tensor::full((2, 2), 1.0).unwrap();
        let mut conv = Convolutional::from_filters(vec![filter], (3, 3)).unwrap();
        let x = consecutive(&[3, 3]);
        conv.forward(&x).unwrap();
        let g = Tensor::full((2, 2, 1), 1.0).unwrap();
        let dx = conv.backward(&g, 0.1).unwrap();
        assert_eq!(dx.dims(), &[3, 3]);
        // each input cell gets one contribution per window covering it
        assert_eq!(
            dx.values(),
            &[1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0]
        );
        // filter grad = corr(x, ones 2x2) = [8, 12, 20, 24]
        let updated = conv.filters()[0].values().to_vec();
        let expected = [1.0 - 0.8, 1.0 - 1.2, 1.0 - 2.0, 1.0 - 2.4];
        for (u, e) in updated.iter().zip(expected) {
            assert!((u - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_conv_backward_before_forward() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut conv = Convolutional::new((2, 2), 1, (3, 3), &mut rng).unwrap();
        let g = Tensor::zeros((2, 2, 1)).unwrap();
        assert!(matches!(
            conv.backward(&g, 0.1),
            Err(Error::NoForwardPass { .. })
        ));
    }

    #[test]
    fn test_conv_rejects_wrong_input() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut conv = Convolutional::new((2, 2), 1, (3, 3), &mut rng).unwrap();
        assert!(matches!(
            conv.forward(&consecutive(&[3, 4])),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_conv_filter_too_large() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            Convolutional::new((4, 2), 1, (3, 3), &mut rng),
            Err(Error::WindowTooLarge { .. })
        ));
    }

    #[test]
    fn test_maxpool_output_dims() {
        // ceil((26 - 2 + 1) / 2) = 13, trailing axis untouched
        let pool = MaxPooling::new(&[2, 2], &[2, 2], (26, 26, 8)).unwrap();
        assert_eq!(pool.output_dims(), &Shape::from((13, 13, 8)));
        // ceil((5 - 2 + 1) / 3) = 2
        let pool = MaxPooling::new(&[3], &[2], (5, 4)).unwrap();
        assert_eq!(pool.output_dims(), &Shape::from((2, 4)));
    }

    #[test]
    fn test_maxpool_routes_to_winner() {
        let x = Tensor::new(
            (4, 4),
            vec![
                1.0, 5.0, 2.0, 0.0, 3.0, 4.0, 8.0, 1.0, 0.0, 0.0, -1.0, -2.0, 9.0, 0.0, -3.0,
                -2.0,
            ],
        )
        .unwrap();
        let mut pool = MaxPooling::new(&[2, 2], &[2, 2], (4, 4)).unwrap();
        let y = pool.forward(&x).unwrap();
        assert_eq!(y.values(), &[5.0, 8.0, 9.0, -1.0]);

        let g = Tensor::new((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let dx = pool.backward(&g, 0.0).unwrap();
        let mut expected = vec![0.0; 16];
        expected[1] = 1.0;
        expected[6] = 2.0;
        expected[12] = 3.0;
        expected[10] = 4.0;
        assert_eq!(dx.values(), &expected[..]);
    }

    #[test]
    fn test_maxpool_overlap_accumulates() {
        // windows [0,1] and [1,2] both pick index 1
        let x = Tensor::new(3, vec![0.0, 9.0, 1.0]).unwrap();
        let mut pool = MaxPooling::new(&[1], &[2], 3).unwrap();
        pool.forward(&x).unwrap();
        let dx = pool.backward(&Tensor::full(2, 1.0).unwrap(), 0.0).unwrap();
        assert_eq!(dx.values(), &[0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_maxpool_backward_before_forward() {
        let mut pool = MaxPooling::new(&[2], &[2], 4).unwrap();
        assert!(matches!(
            pool.backward(&Tensor::zeros(2).unwrap(), 0.0),
            Err(Error::NoForwardPass { .. })
        ));
    }
}
