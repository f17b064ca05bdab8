//! Binary cross-entropy with logits for soft targets.
//!
//! Burn's `BinaryCrossEntropyLoss` only accepts integer targets. The focal
//! criteria are trained against continuous quality scores in `[0, 1]`, so this
//! module provides an elementwise variant over float targets.
//!
//! The unreduced loss is computed in the numerically stable form:
//! ```text
//! l_n = (1 - y_n) * x_n + (1 + (p - 1) * y_n) * (log(1 + exp(-|x_n|)) + max(-x_n, 0))
//! ```
//! where `p` is the positive-class weight. With `p = 1` this is
//! `max(x_n, 0) - x_n * y_n + log(1 + exp(-|x_n|))`.

use burn::{
    config::Config,
    module::{Content, DisplaySettings, Ignored, Module, ModuleDisplay},
    tensor::{backend::Backend, Tensor},
};

use crate::{
    elementwise::ElementwiseLoss,
    reduction::{LossOutput, LossReduction},
};

/// Configuration for creating a [binary cross-entropy with logits loss](BceWithLogitsLoss).
#[derive(Config, Debug)]
pub struct BceWithLogitsLossConfig {
    /// Reduction applied by [`BceWithLogitsLoss::forward`]. Default: Mean
    #[config(default = "LossReduction::Mean")]
    pub reduction: LossReduction,

    /// Weight of the positive term. Default: 1.0
    #[config(default = 1.0)]
    pub pos_weight: f64,
}

impl BceWithLogitsLossConfig {
    /// Initialize [binary cross-entropy with logits loss](BceWithLogitsLoss).
    pub fn init(&self) -> BceWithLogitsLoss {
        self.assertions();
        BceWithLogitsLoss {
            reduction: Ignored(self.reduction.clone()),
            pos_weight: self.pos_weight,
        }
    }

    fn assertions(&self) {
        assert!(
            self.pos_weight > 0.0,
            "Positive weight for BceWithLogitsLoss must be positive, got {}",
            self.pos_weight
        );
    }
}

/// Binary cross-entropy with logits over float targets.
///
/// Accepts predictions and targets of any matching shape.
#[derive(Module, Clone, Debug)]
#[module(custom_display)]
pub struct BceWithLogitsLoss {
    /// Reduction applied by [`forward`](Self::forward).
    pub reduction: Ignored<LossReduction>,
    /// Weight of the positive term.
    pub pos_weight: f64,
}

impl Default for BceWithLogitsLoss {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleDisplay for BceWithLogitsLoss {
    fn custom_settings(&self) -> Option<DisplaySettings> {
        DisplaySettings::new()
            .with_new_line_after_attribute(false)
            .optional()
    }

    fn custom_content(&self, content: Content) -> Option<Content> {
        content
            .add("reduction", &self.reduction)
            .add("pos_weight", &self.pos_weight)
            .optional()
    }
}

impl BceWithLogitsLoss {
    /// Create a new loss with default configuration.
    pub fn new() -> Self {
        BceWithLogitsLossConfig::new().init()
    }

    /// Compute the criterion with the configured reduction.
    ///
    /// # Shapes
    ///
    /// - predictions: `[...dims]` (logits)
    /// - targets: `[...dims]` (same shape as predictions, values in `[0, 1]`)
    /// - output: `[1]`, or `[...dims]` when the reduction is `None`
    pub fn forward<B: Backend, const D: usize>(
        &self,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
    ) -> LossOutput<B, D> {
        let loss = self.forward_no_reduction(predictions, targets);
        self.reduction.0.reduce(loss)
    }

    /// Compute the criterion without reduction.
    ///
    /// # Shapes
    ///
    /// - predictions: `[...dims]` (logits)
    /// - targets: `[...dims]` (same shape as predictions)
    /// - output: `[...dims]`
    pub fn forward_no_reduction<B: Backend, const D: usize>(
        &self,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
    ) -> Tensor<B, D> {
        self.assertions(&predictions, &targets);

        // log(1 + exp(-x)) evaluated without overflow for large |x|
        let softplus_neg =
            (-predictions.clone().abs()).exp().log1p() + (-predictions.clone()).clamp_min(0.0);
        let log_weight = targets
            .clone()
            .mul_scalar(self.pos_weight - 1.0)
            .add_scalar(1.0);

        (targets.ones_like() - targets) * predictions + log_weight * softplus_neg
    }

    fn assertions<B: Backend, const D: usize>(
        &self,
        predictions: &Tensor<B, D>,
        targets: &Tensor<B, D>,
    ) {
        let pred_dims = predictions.dims();
        let target_dims = targets.dims();
        assert_eq!(
            pred_dims, target_dims,
            "Shape of predictions ({pred_dims:?}) must match targets ({target_dims:?})"
        );
    }
}

impl ElementwiseLoss for BceWithLogitsLoss {
    fn reduction(&self) -> LossReduction {
        self.reduction.0.clone()
    }

    fn set_reduction(&mut self, reduction: LossReduction) {
        self.reduction = Ignored(reduction);
    }

    fn forward_no_reduction<B: Backend, const D: usize>(
        &self,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
    ) -> Tensor<B, D> {
        Self::forward_no_reduction(self, predictions, targets)
    }
}
