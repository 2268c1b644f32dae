// Evaluation Metrics
//
// Classification only: the network's prediction is the index of its largest
// output, the expected class is the index of the 1.0 in a one-hot label.
// Ties go to the first maximum, like Tensor::max_value_index.

use hornet_core::{Error, Result, Tensor};

/// Index of the largest element of `t` (first maximum wins).
pub fn argmax(t: &Tensor) -> usize {
    t.max_value_index()
}

/// Class indices of a batch of output (or one-hot) tensors.
pub fn argmax_classes(outputs: &[Tensor]) -> Vec<usize> {
    outputs.iter().map(argmax).collect()
}

/// Fraction of `predictions` equal to `targets`, in [0, 1].
pub fn accuracy(predictions: &[usize], targets: &[usize]) -> Result<f64> {
    if predictions.len() != targets.len() {
        return Err(Error::LengthMismatch {
            expected: targets.len(),
            got: predictions.len(),
        });
    }
    if targets.is_empty() {
        return Ok(0.0);
    }
    let correct = predictions
        .iter()
        .zip(targets)
        .filter(|(p, t)| p == t)
        .count();
    Ok(correct as f64 / targets.len() as f64)
}
