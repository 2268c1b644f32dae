// TrainerConfig — knobs for the per-sample SGD loop
//
// Defaults reproduce the reference run: learning rate 0.005, shrinking by a
// factor of 0.82 after every epoch, a progress report every 100 samples and
// cross-entropy loss.

use hornet_nn::LossFunction;

/// Configuration for a [`Trainer`](crate::train::Trainer).
///
/// # Examples
/// ```
/// use hornet::config::TrainerConfig;
/// use hornet::nn::LossFunction;
///
/// let config = TrainerConfig::default()
///     .with_learning_rate(0.01)
///     .with_loss(LossFunction::MeanSquaredError)
///     .with_seed(7);
/// assert_eq!(config.learning_rate, 0.01);
/// assert_eq!(config.lr_decay, 0.82);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Step size of the first epoch.
    pub learning_rate: f64,
    /// Multiplied into the learning rate after each epoch.
    pub lr_decay: f64,
    /// Samples between progress reports. 0 disables them.
    pub report_interval: usize,
    /// Seed for the shuffling order. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Loss the network is trained against.
    pub loss: LossFunction,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            learning_rate: 0.005,
            lr_decay: 0.82,
            report_interval: 100,
            seed: None,
            loss: LossFunction::CrossEntropy,
        }
    }
}

impl TrainerConfig {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_lr_decay(mut self, lr_decay: f64) -> Self {
        self.lr_decay = lr_decay;
        self
    }

    pub fn with_report_interval(mut self, report_interval: usize) -> Self {
        self.report_interval = report_interval;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_loss(mut self, loss: LossFunction) -> Self {
        self.loss = loss;
        self
    }
}
