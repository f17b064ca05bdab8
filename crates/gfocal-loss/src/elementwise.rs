use burn::{
    module::ModuleDisplay,
    tensor::{backend::Backend, Tensor},
};

use crate::reduction::LossReduction;

/// A loss that can be evaluated element by element.
///
/// Implementors carry their own reduction mode, which wrappers such as
/// [`QualityFocalLoss`](crate::QualityFocalLoss) read once and then switch to
/// [`LossReduction::None`] so that every element can be reweighted before the
/// final reduction.
///
/// The supertraits let a wrapper holding the loss derive `Module` itself.
pub trait ElementwiseLoss: Clone + Send + core::fmt::Debug + ModuleDisplay {
    /// The reduction this loss applies in its own `forward`.
    fn reduction(&self) -> LossReduction;

    /// Replace the reduction this loss applies in its own `forward`.
    fn set_reduction(&mut self, reduction: LossReduction);

    /// Compute the unreduced loss.
    ///
    /// # Shapes
    ///
    /// - predictions: `[...dims]`
    /// - targets: `[...dims]` (same shape as predictions)
    /// - output: `[...dims]`
    fn forward_no_reduction<B: Backend, const D: usize>(
        &self,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
    ) -> Tensor<B, D>;
}
