// nn::init — Parameter initialization
//
// Filters and weights start as Gaussian noise scaled by the fan-in:
//
//   w ~ N(0, 1) · sqrt(2 / fan_in)          (He / Kaiming normal)
//
// fan_in is the number of input values a single output reads: the filter's
// element count for a convolution, the whole input's element count for a
// fully-connected unit.
//
// All functions take the random generator explicitly so a seeded `StdRng`
// reproduces the same network.

use hornet_core::{Result, Shape, Tensor};
use rand::Rng;

/// He (Kaiming) normal initialization: N(0, 2 / fan_in).
pub fn he_normal<R: Rng>(shape: impl Into<Shape>, fan_in: usize, rng: &mut R) -> Result<Tensor> {
    let std = (2.0 / fan_in.max(1) as f64).sqrt();
    Ok(Tensor::randn(shape, rng)?.scale(std))
}
