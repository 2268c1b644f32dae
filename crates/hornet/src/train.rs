// Trainer — per-sample stochastic gradient descent over a Network
//
// One training step is:
//   1. Forward the sample through the network
//   2. Compute the loss derivative against the one-hot target
//   3. Backward the derivative; every layer updates its own parameters
//
// An epoch visits every sample once in a freshly shuffled order, logs the
// mean loss and accuracy of each block of `report_interval` samples and
// finally multiplies the learning rate by `lr_decay`. Evaluation runs
// forward passes only.

use std::fmt;

use hornet_core::{Error, Result, Tensor};
use hornet_nn::{metrics, Layer, Network};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::TrainerConfig;

// Result types

/// Statistics of one training epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochLog {
    /// Epoch number (0-indexed).
    pub epoch: usize,
    /// Average per-sample loss.
    pub loss: f64,
    /// Fraction of samples whose argmax matched the target.
    pub accuracy: f64,
    /// Learning rate the epoch ran with.
    pub learning_rate: f64,
}

/// Summary of a full training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainResult {
    /// Per-epoch logs.
    pub epochs: Vec<EpochLog>,
    /// Loss of the last epoch.
    pub final_loss: f64,
    /// Accuracy of the last epoch.
    pub final_accuracy: f64,
}

impl fmt::Display for TrainResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "training complete: {} epochs", self.epochs.len())?;
        for log in &self.epochs {
            writeln!(
                f,
                "  epoch {:>2}: loss = {:.6}  accuracy = {:.2}%  lr = {:.6}",
                log.epoch,
                log.loss,
                log.accuracy * 100.0,
                log.learning_rate
            )?;
        }
        write!(
            f,
            "  final loss: {:.6}  final accuracy: {:.2}%",
            self.final_loss,
            self.final_accuracy * 100.0
        )
    }
}

/// Loss and accuracy of a network over a dataset, without training.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Number of samples evaluated.
    pub samples: usize,
    /// Average per-sample loss.
    pub loss: f64,
    /// Fraction of correctly classified samples.
    pub accuracy: f64,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} samples: loss = {:.6}  accuracy = {:.2}%",
            self.samples,
            self.loss,
            self.accuracy * 100.0
        )
    }
}

// Trainer

/// Drives a [`Network`] through epochs of per-sample SGD.
///
/// # Examples
/// ```
/// use hornet::prelude::*;
///
/// let data = IdxDataset::synthetic(20, 6, 6, 2, 1).unwrap();
/// let net = Network::with_seed(data.input_dims(), 1)
///     .fully_connected(2)?
///     .softmax()?;
/// let config = TrainerConfig::default().with_seed(1).with_report_interval(0);
/// let mut trainer = Trainer::new(net, config);
///
/// let result = trainer.fit(data.images(), data.targets(), 2)?;
/// assert_eq!(result.epochs.len(), 2);
/// # Ok::<(), hornet::Error>(())
/// ```
pub struct Trainer {
    network: Network,
    config: TrainerConfig,
    rng: StdRng,
    epoch: usize,
    learning_rate: f64,
}

impl Trainer {
    pub fn new(network: Network, config: TrainerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let learning_rate = config.learning_rate;
        Trainer {
            network,
            config,
            rng,
            epoch: 0,
            learning_rate,
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn into_network(self) -> Network {
        self.network
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Learning rate the next epoch will use.
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Number of epochs completed so far.
    pub fn epochs_done(&self) -> usize {
        self.epoch
    }

    /// Train on one sample at the current learning rate.
    ///
    /// Returns the sample's total loss (measured before the update) and the
    /// network output it was computed from.
    pub fn train_step(&mut self, input: &Tensor, target: &Tensor) -> Result<(f64, Tensor)> {
        let output = self.network.forward(input)?;
        let loss = self.config.loss.total(target.values(), output.values())?;
        let grad = self
            .config
            .loss
            .loss_derivative(target.values(), output.values())?;
        self.network.backward(&grad, self.learning_rate)?;
        Ok((loss, output))
    }

    /// Run one epoch over `images` and `targets`, then decay the learning rate.
    pub fn epoch(&mut self, images: &[Tensor], targets: &[Tensor]) -> Result<EpochLog> {
        check_pairs(images, targets)?;

        let mut order: Vec<usize> = (0..images.len()).collect();
        order.shuffle(&mut self.rng);

        let mut loss_sum = 0.0;
        let mut correct = 0usize;
        let mut window = ProgressWindow::default();
        for (seen, &i) in order.iter().enumerate() {
            let (loss, output) = self.train_step(&images[i], &targets[i])?;
            let hit = metrics::argmax(&output) == metrics::argmax(&targets[i]);
            loss_sum += loss;
            correct += usize::from(hit);
            window.record(loss, hit);

            let seen = seen + 1;
            let interval = self.config.report_interval;
            if interval > 0 && seen % interval == 0 {
                let (loss, accuracy) = window.take();
                tracing::info!(
                    epoch = self.epoch,
                    samples = seen,
                    loss,
                    accuracy,
                    lr = self.learning_rate,
                    "training"
                );
            }
        }

        let log = EpochLog {
            epoch: self.epoch,
            loss: mean(loss_sum, images.len()),
            accuracy: mean(correct as f64, images.len()),
            learning_rate: self.learning_rate,
        };
        tracing::info!(
            epoch = log.epoch,
            samples = images.len(),
            loss = log.loss,
            accuracy = log.accuracy,
            lr = log.learning_rate,
            "epoch complete"
        );

        self.epoch += 1;
        self.learning_rate *= self.config.lr_decay;
        Ok(log)
    }

    /// Run `epochs` epochs and collect their logs.
    pub fn fit(
        &mut self,
        images: &[Tensor],
        targets: &[Tensor],
        epochs: usize,
    ) -> Result<TrainResult> {
        let mut logs = Vec::with_capacity(epochs);
        for _ in 0..epochs {
            logs.push(self.epoch(images, targets)?);
        }
        let (final_loss, final_accuracy) = logs.last().map_or((0.0, 0.0), |l| (l.loss, l.accuracy));
        Ok(TrainResult {
            epochs: logs,
            final_loss,
            final_accuracy,
        })
    }

    /// Loss and accuracy over a dataset. Parameters are left untouched.
    pub fn evaluate(&mut self, images: &[Tensor], targets: &[Tensor]) -> Result<Evaluation> {
        check_pairs(images, targets)?;
        let mut loss_sum = 0.0;
        let mut predictions = Vec::with_capacity(images.len());
        for (image, target) in images.iter().zip(targets) {
            let output = self.network.forward(image)?;
            loss_sum += self.config.loss.total(target.values(), output.values())?;
            predictions.push(metrics::argmax(&output));
        }
        let expected = metrics::argmax_classes(targets);
        let eval = Evaluation {
            samples: images.len(),
            loss: mean(loss_sum, images.len()),
            accuracy: metrics::accuracy(&predictions, &expected)?,
        };
        tracing::info!(
            samples = eval.samples,
            loss = eval.loss,
            accuracy = eval.accuracy,
            "evaluation complete"
        );
        Ok(eval)
    }
}

impl fmt::Debug for Trainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trainer")
            .field("network", &self.network)
            .field("config", &self.config)
            .field("epoch", &self.epoch)
            .field("learning_rate", &self.learning_rate)
            .finish()
    }
}

/// Loss and accuracy accumulated since the last progress report.
#[derive(Debug, Default)]
struct ProgressWindow {
    loss_sum: f64,
    correct: usize,
    len: usize,
}

impl ProgressWindow {
    fn record(&mut self, loss: f64, correct: bool) {
        self.loss_sum += loss;
        self.correct += usize::from(correct);
        self.len += 1;
    }

    /// Mean loss and accuracy of the window, then start a new one.
    fn take(&mut self) -> (f64, f64) {
        let w = std::mem::take(self);
        (mean(w.loss_sum, w.len), mean(w.correct as f64, w.len))
    }
}

fn check_pairs(images: &[Tensor], targets: &[Tensor]) -> Result<()> {
    if images.len() != targets.len() {
        return Err(Error::LengthMismatch {
            expected: images.len(),
            got: targets.len(),
        });
    }
    Ok(())
}

fn mean(sum: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(n: usize, i: usize) -> Tensor {
        let mut t = Tensor::zeros(n).unwrap();
        t.set(&[i], 1.0).unwrap();
        t
    }

    fn tiny() -> (Vec<Tensor>, Vec<Tensor>) {
        let images = vec![
            Tensor::new(2, vec![1.0, 0.0]).unwrap(),
            Tensor::new(2, vec![0.0, 1.0]).unwrap(),
        ];
        let targets = vec![one_hot(2, 0), one_hot(2, 1)];
        (images, targets)
    }

    fn trainer(lr: f64) -> Trainer {
        trainer_with_decay(lr, 0.82)
    }

    fn trainer_with_decay(lr: f64, decay: f64) -> Trainer {
        let net = Network::with_seed(2, 5)
            .fully_connected(2)
            .unwrap()
            .softmax()
            .unwrap();
        let config = TrainerConfig::default()
            .with_learning_rate(lr)
            .with_lr_decay(decay)
            .with_seed(5)
            .with_report_interval(1);
        Trainer::new(net, config)
    }

    #[test]
    fn test_progress_window_resets_after_report() {
        let mut w = ProgressWindow::default();
        w.record(4.0, true);
        w.record(2.0, false);
        assert_eq!(w.take(), (3.0, 0.5));

        // only the samples since the last report count
        w.record(1.0, true);
        assert_eq!(w.take(), (1.0, 1.0));
        assert_eq!(w.take(), (0.0, 0.0));
    }

    #[test]
    fn test_learning_rate_decays_per_epoch() {
        let (images, targets) = tiny();
        let mut t = trainer(0.1);
        let result = t.fit(&images, &targets, 3).unwrap();
        let rates: Vec<f64> = result.epochs.iter().map(|l| l.learning_rate).collect();
        assert!((rates[0] - 0.1).abs() < 1e-12);
        assert!((rates[1] - 0.082).abs() < 1e-12);
        assert!((rates[2] - 0.06724).abs() < 1e-12);
        assert_eq!(t.epochs_done(), 3);
    }

    #[test]
    fn test_loss_decreases() {
        let (images, targets) = tiny();
        let mut t = trainer_with_decay(0.5, 1.0);
        let before = t.evaluate(&images, &targets).unwrap();
        t.fit(&images, &targets, 20).unwrap();
        let after = t.evaluate(&images, &targets).unwrap();
        assert!(after.loss < before.loss);
        assert_eq!(after.accuracy, 1.0);
    }

    #[test]
    fn test_evaluate_leaves_network_unchanged() {
        let (images, targets) = tiny();
        let mut t = trainer(0.5);
        let a = t.evaluate(&images, &targets).unwrap();
        let b = t.evaluate(&images, &targets).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_length_mismatch() {
        let (images, mut targets) = tiny();
        targets.pop();
        let mut t = trainer(0.1);
        assert!(matches!(
            t.epoch(&images, &targets),
            Err(Error::LengthMismatch { .. })
        ));
        assert!(t.evaluate(&images, &targets).is_err());
    }

    #[test]
    fn test_empty_epoch() {
        let mut t = trainer(0.1);
        let log = t.epoch(&[], &[]).unwrap();
        assert_eq!(log.loss, 0.0);
        assert_eq!(log.accuracy, 0.0);
    }

    #[test]
    fn test_display() {
        let (images, targets) = tiny();
        let mut t = trainer(0.1);
        let s = t.fit(&images, &targets, 1).unwrap().to_string();
        assert!(s.starts_with("training complete: 1 epochs"));
        assert!(s.contains("final loss"));
    }
}
