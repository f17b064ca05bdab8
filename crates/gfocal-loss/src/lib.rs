//! Generalized focal loss criteria for the Burn deep learning framework.
//!
//! This crate provides the loss functions of the generalized focal loss family
//! used to train dense detectors with joint classification-quality scores and
//! distributional box regression. All criteria are backend-agnostic.
//!
//! ## Loss Functions
//!
//! - **[`QualityFocalLoss`]**: wraps an elementwise loss and reweights it by the
//!   distance between the predicted probability and a soft quality target
//! - **[`DistributionFocalLoss`]**: cross-entropy on the two bins surrounding a
//!   continuous regression target
//! - **[`BceWithLogitsLoss`]**: elementwise binary cross-entropy with logits over
//!   float targets, the usual base loss for [`QualityFocalLoss`]
//!
//! ## Reductions
//!
//! Burn's [`Reduction`](burn::nn::loss::Reduction) has no "keep every element"
//! mode. [`LossReduction`] adds it, and losses whose reduction is chosen at
//! configuration time return a [`LossOutput`].
//!
//! ## Usage Example
//!
//! ```rust
//! use burn::backend::NdArray;
//! use burn::tensor::{Tensor, TensorData};
//! use gfocal_loss::{BceWithLogitsLoss, QualityFocalLossConfig};
//!
//! let device = Default::default();
//! let criterion = QualityFocalLossConfig::new()
//!     .with_gamma(2.0)
//!     .init(BceWithLogitsLoss::new());
//!
//! let logits = Tensor::<NdArray, 2>::from_data(TensorData::from([[0.0, 2.0]]), &device);
//! let quality = Tensor::<NdArray, 2>::from_data(TensorData::from([[1.0, 0.0]]), &device);
//!
//! let loss = criterion
//!     .forward(logits, quality)
//!     .into_reduced()
//!     .expect("mean reduction");
//! assert_eq!(loss.dims(), [1]);
//! ```

mod bce;
mod distribution_focal;
mod elementwise;
mod error;
mod quality_focal;
mod reduction;

pub use bce::{BceWithLogitsLoss, BceWithLogitsLossConfig};
pub use distribution_focal::{DistributionFocalLoss, DistributionFocalLossConfig};
pub use elementwise::ElementwiseLoss;
pub use error::{GFocalLossError, Result};
pub use quality_focal::{QualityFocalLoss, QualityFocalLossConfig};
pub use reduction::{LossOutput, LossReduction};

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    pub type TestBackend = NdArray;
}
