//! Quality Focal Loss.
//!
//! Wraps an elementwise loss (typically [binary cross-entropy with logits](crate::BceWithLogitsLoss))
//! and reweights every element by how far the predicted probability is from the
//! quality target, and by a positive/negative balance factor:
//!
//! ```text
//! p  = sigmoid(x)
//! a  = y * alpha + (1 - y) * (1 - alpha)
//! m  = |y - p| ^ gamma
//! l  = base(x, y) * a * m
//! ```
//!
//! The reduction of the wrapped loss is taken over by the wrapper at
//! construction time, and the wrapped loss is switched to no reduction.

use burn::{
    config::Config,
    module::{Content, DisplaySettings, Ignored, Module, ModuleDisplay},
    nn::loss::Reduction,
    tensor::{activation::sigmoid, backend::Backend, Tensor},
};

use crate::{
    elementwise::ElementwiseLoss,
    reduction::{LossOutput, LossReduction},
};

/// Configuration for creating a [Quality Focal Loss](QualityFocalLoss).
#[derive(Config, Debug)]
pub struct QualityFocalLossConfig {
    /// Exponent of the modulating factor. Default: 1.5
    #[config(default = 1.5)]
    pub gamma: f64,

    /// Balance between positive and negative elements. Default: 0.25
    #[config(default = 0.25)]
    pub alpha: f64,
}

impl QualityFocalLossConfig {
    /// Initialize [Quality Focal Loss](QualityFocalLoss) around `base_loss`.
    ///
    /// The reduction configured on `base_loss` becomes the reduction of the
    /// returned criterion, and `base_loss` is switched to
    /// [`LossReduction::None`].
    pub fn init<L: ElementwiseLoss>(&self, mut base_loss: L) -> QualityFocalLoss<L> {
        self.check_ranges();

        let reduction = base_loss.reduction();
        base_loss.set_reduction(LossReduction::None);

        tracing::debug!(
            gamma = self.gamma,
            alpha = self.alpha,
            ?reduction,
            "initialized quality focal loss"
        );

        QualityFocalLoss {
            gamma: self.gamma,
            alpha: self.alpha,
            reduction: Ignored(reduction),
            base_loss,
        }
    }

    fn check_ranges(&self) {
        if !(0.0..=1.0).contains(&self.alpha) {
            tracing::warn!(
                alpha = self.alpha,
                "alpha outside [0, 1] inverts or amplifies the positive/negative balance"
            );
        }
        if self.gamma < 0.0 {
            tracing::warn!(
                gamma = self.gamma,
                "negative gamma amplifies well-predicted elements"
            );
        }
    }
}

/// Quality Focal Loss around an elementwise base loss.
///
/// Predictions are logits, targets are quality scores in `[0, 1]`.
#[derive(Module, Clone, Debug)]
#[module(custom_display)]
pub struct QualityFocalLoss<L: ElementwiseLoss> {
    gamma: f64,
    alpha: f64,
    reduction: Ignored<LossReduction>,
    base_loss: L,
}

impl<L: ElementwiseLoss> ModuleDisplay for QualityFocalLoss<L> {
    fn custom_settings(&self) -> Option<DisplaySettings> {
        DisplaySettings::new()
            .with_new_line_after_attribute(false)
            .optional()
    }

    fn custom_content(&self, content: Content) -> Option<Content> {
        content
            .add("gamma", &self.gamma)
            .add("alpha", &self.alpha)
            .add("reduction", &self.reduction)
            .add("base_loss", &self.base_loss)
            .optional()
    }
}

impl<L: ElementwiseLoss> QualityFocalLoss<L> {
    /// Create a new quality focal loss with default configuration.
    pub fn new(base_loss: L) -> Self {
        QualityFocalLossConfig::new().init(base_loss)
    }

    /// Exponent of the modulating factor.
    pub const fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Positive/negative balance factor.
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Reduction captured from the base loss.
    pub const fn reduction(&self) -> &LossReduction {
        &self.reduction.0
    }

    /// The wrapped loss, configured without reduction.
    pub const fn base_loss(&self) -> &L {
        &self.base_loss
    }

    /// Give back the wrapped loss.
    pub fn into_base_loss(self) -> L {
        self.base_loss
    }

    /// Compute the criterion with the reduction captured from the base loss.
    ///
    /// # Shapes
    ///
    /// - predictions: `[...dims]` (logits)
    /// - targets: `[...dims]` (same shape as predictions, values in `[0, 1]`)
    /// - output: `[1]`, or `[...dims]` when the captured reduction is `None`
    pub fn forward<B: Backend, const D: usize>(
        &self,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
    ) -> LossOutput<B, D> {
        let loss = self.forward_no_reduction(predictions, targets);
        self.reduction.0.reduce(loss)
    }

    /// Compute the criterion with an explicit reduction, ignoring the captured one.
    ///
    /// # Shapes
    ///
    /// - predictions: `[...dims]` (logits)
    /// - targets: `[...dims]` (same shape as predictions)
    /// - output: `[1]`
    pub fn forward_with_reduction<B: Backend, const D: usize>(
        &self,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
        reduction: Reduction,
    ) -> Tensor<B, 1> {
        let loss = self.forward_no_reduction(predictions, targets);
        match reduction {
            Reduction::Mean | Reduction::Auto => loss.mean(),
            Reduction::Sum => loss.sum(),
        }
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
        let loss = self
            .base_loss
            .forward_no_reduction(predictions.clone(), targets.clone());

        let pred_prob = sigmoid(predictions);
        let alpha_factor = self.alpha_factor(targets.clone());
        let modulating_factor = self.modulating_factor(pred_prob, targets);

        loss * alpha_factor * modulating_factor
    }

    /// `y * alpha + (1 - y) * (1 - alpha)`
    fn alpha_factor<B: Backend, const D: usize>(&self, targets: Tensor<B, D>) -> Tensor<B, D> {
        let negatives = targets.ones_like() - targets.clone();
        targets.mul_scalar(self.alpha) + negatives.mul_scalar(1.0 - self.alpha)
    }

    /// `|y - p| ^ gamma`, never applied to a negative base.
    fn modulating_factor<B: Backend, const D: usize>(
        &self,
        pred_prob: Tensor<B, D>,
        targets: Tensor<B, D>,
    ) -> Tensor<B, D> {
        (targets - pred_prob).abs().powf_scalar(self.gamma)
    }
}
