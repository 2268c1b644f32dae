// Property tests for hornet-nn
//
// Max pooling is checked against a brute-force scan of every window: the
// input gradient must be the output gradient routed to each window's first
// maximum and zero everywhere else.

use hornet_core::Tensor;
use hornet_nn::{Layer, MaxPooling};
use proptest::prelude::*;

type Case = ([usize; 2], [usize; 2], [usize; 2], Vec<f64>, Vec<f64>);

/// Input dims, window sizes, strides, input values and an output gradient
/// for a rank-2 pooling layer whose windows always fit the input.
fn case_strategy() -> impl Strategy<Value = Case> {
    (2usize..7, 2usize..7)
        .prop_flat_map(|(w, h)| {
            (1..=w, 1..=h, 1usize..4, 1usize..4)
                .prop_map(move |(sx, sy, tx, ty)| ([w, h], [sx, sy], [tx, ty]))
        })
        .prop_flat_map(|(dims, sizes, strides)| {
            let grid = grid_dims(dims, sizes, strides);
            (
                Just(dims),
                Just(sizes),
                Just(strides),
                prop::collection::vec(-10.0f64..10.0, dims[0] * dims[1]),
                prop::collection::vec(-2.0f64..2.0, grid[0] * grid[1]),
            )
        })
}

fn grid_dims(dims: [usize; 2], sizes: [usize; 2], strides: [usize; 2]) -> [usize; 2] {
    [
        (dims[0] - sizes[0]) / strides[0] + 1,
        (dims[1] - sizes[1]) / strides[1] + 1,
    ]
}

/// Gradient routed by scanning each window directly, first axis fastest.
fn routed_gradient(
    dims: [usize; 2],
    sizes: [usize; 2],
    strides: [usize; 2],
    values: &[f64],
    grad: &[f64],
) -> Vec<f64> {
    let grid = grid_dims(dims, sizes, strides);
    let mut routed = vec![0.0; values.len()];
    for gy in 0..grid[1] {
        for gx in 0..grid[0] {
            let (ox, oy) = (gx * strides[0], gy * strides[1]);
            let mut best = ox + dims[0] * oy;
            for wy in 0..sizes[1] {
                for wx in 0..sizes[0] {
                    let i = (ox + wx) + dims[0] * (oy + wy);
                    if values[i] > values[best] {
                        best = i;
                    }
                }
            }
            routed[best] += grad[gx + grid[0] * gy];
        }
    }
    routed
}

proptest! {
    #[test]
    fn maxpool_gradient_lands_on_window_maxima(
        (dims, sizes, strides, values, grad) in case_strategy()
    ) {
        let mut pool = MaxPooling::new(&strides, &sizes, dims.to_vec()).unwrap();
        let grid = grid_dims(dims, sizes, strides);
        prop_assert_eq!(pool.output_dims().dims(), &grid[..]);

        let input = Tensor::new(dims.to_vec(), values.clone()).unwrap();
        let output = pool.forward(&input).unwrap();
        let output_grad = Tensor::new(grid.to_vec(), grad.clone()).unwrap();
        let dx = pool.backward(&output_grad, 0.1).unwrap();

        let expected = routed_gradient(dims, sizes, strides, &values, &grad);
        prop_assert_eq!(dx.dims(), &dims[..]);
        for (i, (g, e)) in dx.values().iter().zip(&expected).enumerate() {
            prop_assert!((g - e).abs() < 1e-12, "index {}: got {} expected {}", i, g, e);
        }

        // every output is one of the inputs
        for v in output.values() {
            prop_assert!(values.contains(v));
        }
    }

    #[test]
    fn maxpool_gradient_total_is_preserved(
        (dims, sizes, strides, values, grad) in case_strategy()
    ) {
        let mut pool = MaxPooling::new(&strides, &sizes, dims.to_vec()).unwrap();
        pool.forward(&Tensor::new(dims.to_vec(), values).unwrap()).unwrap();
        let grid = grid_dims(dims, sizes, strides);
        let output_grad = Tensor::new(grid.to_vec(), grad.clone()).unwrap();
        let dx = pool.backward(&output_grad, 0.1).unwrap();

        let total: f64 = grad.iter().sum();
        let routed: f64 = dx.values().iter().sum();
        prop_assert!((total - routed).abs() < 1e-9);
    }
}
