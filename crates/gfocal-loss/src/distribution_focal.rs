//! Distribution Focal Loss.
//!
//! Learns a discrete distribution over `reg_max + 1` integer bins for a
//! continuous regression target (for example a box-edge distance). The two
//! bins around the target receive cross-entropy weighted by their distance to
//! it, which concentrates the distribution near the true value:
//!
//! ```text
//! l = floor(y), r = l + 1
//! L = -((r - y) * log(S_l) + (y - l) * log(S_r))
//! ```
//! where `S` is the softmax of the bin logits.

use burn::{
    config::Config,
    module::{Content, DisplaySettings, Ignored, Module, ModuleDisplay},
    tensor::{
        activation::{log_softmax, softmax},
        backend::Backend,
        Int, Tensor,
    },
};

use crate::reduction::{LossOutput, LossReduction};

/// Configuration for creating a [Distribution Focal Loss](DistributionFocalLoss).
#[derive(Config, Debug)]
pub struct DistributionFocalLossConfig {
    /// Largest representable target; predictions carry `reg_max + 1` bins. Default: 16
    #[config(default = 16)]
    pub reg_max: usize,

    /// Targets are clamped to `reg_max - target_eps` so the right bin exists. Default: 0.01
    #[config(default = 0.01)]
    pub target_eps: f64,

    /// Reduction applied by [`DistributionFocalLoss::forward`]. Default: Mean
    #[config(default = "LossReduction::Mean")]
    pub reduction: LossReduction,
}

impl DistributionFocalLossConfig {
    /// Initialize [Distribution Focal Loss](DistributionFocalLoss).
    pub fn init(&self) -> DistributionFocalLoss {
        self.assertions();
        DistributionFocalLoss {
            reg_max: self.reg_max,
            target_eps: self.target_eps,
            reduction: Ignored(self.reduction.clone()),
        }
    }

    fn assertions(&self) {
        assert!(
            self.reg_max > 0,
            "reg_max for DistributionFocalLoss must be at least 1, got {}",
            self.reg_max
        );
        assert!(
            self.target_eps > 0.0 && self.target_eps < 1.0,
            "Target epsilon for DistributionFocalLoss must be in (0, 1), got {}",
            self.target_eps
        );
    }
}

/// Distribution Focal Loss over discretized regression targets.
#[derive(Module, Clone, Debug)]
#[module(custom_display)]
pub struct DistributionFocalLoss {
    /// Largest representable target.
    pub reg_max: usize,
    /// Margin kept below `reg_max` when clamping targets.
    pub target_eps: f64,
    /// Reduction applied by [`forward`](Self::forward).
    pub reduction: Ignored<LossReduction>,
}

impl Default for DistributionFocalLoss {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleDisplay for DistributionFocalLoss {
    fn custom_settings(&self) -> Option<DisplaySettings> {
        DisplaySettings::new()
            .with_new_line_after_attribute(false)
            .optional()
    }

    fn custom_content(&self, content: Content) -> Option<Content> {
        content
            .add("reg_max", &self.reg_max)
            .add("target_eps", &self.target_eps)
            .add("reduction", &self.reduction)
            .optional()
    }
}

impl DistributionFocalLoss {
    /// Create a new distribution focal loss with default configuration.
    pub fn new() -> Self {
        DistributionFocalLossConfig::new().init()
    }

    /// Number of bins each prediction row must carry.
    pub const fn num_bins(&self) -> usize {
        self.reg_max + 1
    }

    /// Compute the criterion with the configured reduction.
    ///
    /// # Shapes
    ///
    /// - predictions: `[num_samples, reg_max + 1]` (bin logits)
    /// - targets: `[num_samples]` (values in `[0, reg_max]`)
    /// - output: `[1]`, or `[num_samples]` when the reduction is `None`
    pub fn forward<B: Backend>(
        &self,
        predictions: Tensor<B, 2>,
        targets: Tensor<B, 1>,
    ) -> LossOutput<B, 1> {
        let loss = self.forward_no_reduction(predictions, targets);
        self.reduction.0.reduce(loss)
    }

    /// Compute the criterion without reduction.
    ///
    /// # Shapes
    ///
    /// - predictions: `[num_samples, reg_max + 1]` (bin logits)
    /// - targets: `[num_samples]`
    /// - output: `[num_samples]`
    pub fn forward_no_reduction<B: Backend>(
        &self,
        predictions: Tensor<B, 2>,
        targets: Tensor<B, 1>,
    ) -> Tensor<B, 1> {
        self.assertions(&predictions, &targets);

        let [num_samples, _] = predictions.dims();
        let targets = targets.clamp(0.0, self.reg_max as f64 - self.target_eps);

        // right <= reg_max even when the clamp bound rounds up to reg_max in f32
        let left: Tensor<B, 1, Int> = targets
            .clone()
            .floor()
            .clamp_max(self.reg_max as f64 - 1.0)
            .int();
        let right = left.clone().add_scalar(1);

        let left_float = left.clone().float();
        let weight_left = left_float.clone().add_scalar(1.0) - targets.clone();
        let weight_right = targets - left_float;

        let log_probs = log_softmax(predictions, 1);
        let ce_left = self.gather_nll(log_probs.clone(), left, num_samples);
        let ce_right = self.gather_nll(log_probs, right, num_samples);

        ce_left * weight_left + ce_right * weight_right
    }

    /// Decode bin logits into the expected continuous value `sum_i softmax(x)_i * i`.
    ///
    /// # Shapes
    ///
    /// - predictions: `[num_samples, reg_max + 1]`
    /// - output: `[num_samples]`
    pub fn project<B: Backend>(&self, predictions: Tensor<B, 2>) -> Tensor<B, 1> {
        let [_, bins] = predictions.dims();
        assert_eq!(
            bins,
            self.num_bins(),
            "Predictions must have reg_max + 1 = {} bins, got {bins}",
            self.num_bins()
        );

        let device = predictions.device();
        let positions = Tensor::<B, 1, Int>::arange(0..bins as i64, &device)
            .float()
            .unsqueeze::<2>();

        (softmax(predictions, 1) * positions).sum_dim(1).squeeze(1)
    }

    /// Negative log-probability of the bin at `indices` for every row.
    fn gather_nll<B: Backend>(
        &self,
        log_probs: Tensor<B, 2>,
        indices: Tensor<B, 1, Int>,
        num_samples: usize,
    ) -> Tensor<B, 1> {
        -log_probs
            .gather(1, indices.reshape([num_samples, 1]))
            .squeeze::<1>(1)
    }

    fn assertions<B: Backend>(&self, predictions: &Tensor<B, 2>, targets: &Tensor<B, 1>) {
        let [num_samples, bins] = predictions.dims();
        let [num_targets] = targets.dims();
        assert_eq!(
            bins,
            self.num_bins(),
            "Predictions must have reg_max + 1 = {} bins, got {bins}",
            self.num_bins()
        );
        assert_eq!(
            num_samples, num_targets,
            "Number of prediction rows ({num_samples}) must match number of targets ({num_targets})"
        );
    }
}
