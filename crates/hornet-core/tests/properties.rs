// Property tests for hornet-core
//
// Shapes are kept small so every case runs in microseconds; the point is to
// cover odd rank/dimension combinations, not big tensors.

use hornet_core::{
    coords_to_horner, cross_correlate, horner_to_coords, window_origins, CoordIter, Shape, Tensor,
};
use proptest::prelude::*;

fn dims_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..5, 1..5)
}

fn tensor_strategy() -> impl Strategy<Value = Tensor> {
    dims_strategy().prop_flat_map(|dims| {
        let n: usize = dims.iter().product();
        prop::collection::vec(-10.0f64..10.0, n)
            .prop_map(move |values| Tensor::new(dims.clone(), values).unwrap())
    })
}

proptest! {
    #[test]
    fn horner_roundtrip(dims in dims_strategy(), seed in any::<usize>()) {
        let count: usize = dims.iter().product();
        let index = seed % count;
        let coords = horner_to_coords(index, &dims);
        prop_assert!(coords.iter().zip(&dims).all(|(c, d)| c < d));
        prop_assert_eq!(coords_to_horner(&coords, &dims), index);
    }

    #[test]
    fn coord_iter_visits_every_index_once(dims in dims_strategy()) {
        let shape = Shape::new(dims);
        let indices: Vec<usize> = CoordIter::over(&shape)
            .map(|c| {
                let c: Vec<usize> = c.iter().map(|&x| x as usize).collect();
                shape.index_of(&c)
            })
            .collect();
        let expected: Vec<usize> = (0..shape.elem_count()).collect();
        prop_assert_eq!(indices, expected);
    }

    #[test]
    fn full_region_is_identity(t in tensor_strategy()) {
        let upper: Vec<isize> = t.dims().iter().map(|&d| d as isize - 1).collect();
        let lower = vec![0isize; t.rank()];
        let region = t.region(&lower, &upper).unwrap();
        prop_assert_eq!(region, t);
    }

    #[test]
    fn flip_is_an_involution(t in tensor_strategy()) {
        prop_assert_eq!(t.flip().flip(), t);
    }

    #[test]
    fn self_inner_product_is_sum_of_squares(t in tensor_strategy()) {
        let expected: f64 = t.values().iter().map(|v| v * v).sum();
        let got = t.inner_product(&t).unwrap();
        prop_assert!((got - expected).abs() < 1e-9);
    }

    #[test]
    fn correlation_output_dims(
        t in tensor_strategy(),
        window_seed in prop::collection::vec(any::<usize>(), 4),
        pad_seed in prop::collection::vec(0usize..2, 4),
    ) {
        let rank = t.rank();
        let window: Vec<usize> = t
            .dims()
            .iter()
            .zip(&window_seed)
            .map(|(&d, &s)| 1 + s % d)
            .collect();
        let padding = &pad_seed[..rank];
        let filter = Tensor::full(window.clone(), 1.0).unwrap();
        let out = cross_correlate(&t, &filter, padding).unwrap();
        let expected: Vec<usize> = t
            .dims()
            .iter()
            .zip(&window)
            .zip(padding)
            .map(|((&d, &w), &p)| d - w + 1 + 2 * p)
            .collect();
        prop_assert_eq!(out.dims(), &expected[..]);
    }

    #[test]
    fn padded_strided_regions_read_zero_outside(
        t in tensor_strategy(),
        window_seed in prop::collection::vec(any::<usize>(), 4),
        pad_seed in prop::collection::vec(0usize..3, 4),
        stride_seed in prop::collection::vec(1usize..4, 4),
    ) {
        let rank = t.rank();
        let window: Vec<usize> = t
            .dims()
            .iter()
            .zip(&window_seed)
            .map(|(&d, &s)| 1 + s % d)
            .collect();
        let padding = &pad_seed[..rank];
        let strides = &stride_seed[..rank];

        let origins: Vec<Vec<isize>> =
            window_origins(t.shape(), &window, padding, strides).unwrap().collect();
        let regions = t.regions(&window, padding, strides).unwrap();
        prop_assert_eq!(regions.grid_shape().elem_count(), origins.len());

        let mut count = 0;
        for (origin, region) in origins.iter().zip(regions) {
            prop_assert_eq!(region.dims(), &window[..]);
            for (i, &v) in region.values().iter().enumerate() {
                let coords: Vec<isize> = region
                    .shape()
                    .coords_of(i)
                    .iter()
                    .zip(origin)
                    .map(|(&l, &o)| o + l as isize)
                    .collect();
                prop_assert_eq!(v, t.get_or_zero(&coords));
            }
            count += 1;
        }
        prop_assert_eq!(count, origins.len());
    }
}

#[test]
fn padded_strided_regions_of_a_3x3() {
    // value at (x, y) is 1 + x + 3y
    let t = Tensor::new((3, 3), (1..=9).map(f64::from).collect()).unwrap();
    let window = [2, 2];
    let padding = [1, 1];
    let strides = [2, 2];

    let origins: Vec<Vec<isize>> = window_origins(t.shape(), &window, &padding, &strides)
        .unwrap()
        .collect();
    assert_eq!(
        origins,
        vec![vec![-1, -1], vec![1, -1], vec![-1, 1], vec![1, 1]]
    );

    let regions = t.regions(&window, &padding, &strides).unwrap();
    assert_eq!(regions.grid_shape(), Shape::from((2, 2)));
    let values: Vec<Vec<f64>> = regions.map(|r| r.values().to_vec()).collect();
    assert_eq!(
        values,
        vec![
            vec![0.0, 0.0, 0.0, 1.0],
            vec![0.0, 0.0, 2.0, 3.0],
            vec![0.0, 4.0, 0.0, 7.0],
            vec![5.0, 6.0, 8.0, 9.0],
        ]
    );
}
