//! Reduction modes and the output of a reducible loss.
//!
//! Burn's [`Reduction`] has no way to express "keep every element", which the
//! focal criteria need in order to reweight per-element losses before reducing.
//! [`LossReduction`] adds the `None` mode, and [`LossOutput`] carries either the
//! reduced scalar or the untouched elementwise tensor.

use core::str::FromStr;

use burn::{
    config::Config,
    nn::loss::Reduction,
    tensor::{backend::Backend, Tensor, TensorData},
};

use crate::error::GFocalLossError;

/// How an elementwise loss tensor is collapsed.
#[derive(Config, Debug, PartialEq, Eq, Hash)]
pub enum LossReduction {
    /// Arithmetic mean over all elements.
    Mean,
    /// Sum over all elements.
    Sum,
    /// Keep the elementwise tensor.
    None,
}

impl Default for LossReduction {
    fn default() -> Self {
        Self::Mean
    }
}

impl FromStr for LossReduction {
    type Err = GFocalLossError;

    fn from_str(name: &str) -> core::result::Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            "none" => Ok(Self::None),
            _ => Err(GFocalLossError::UnknownReduction {
                name: name.to_owned(),
            }),
        }
    }
}

impl From<Reduction> for LossReduction {
    fn from(reduction: Reduction) -> Self {
        match reduction {
            Reduction::Mean | Reduction::Auto => Self::Mean,
            Reduction::Sum => Self::Sum,
        }
    }
}

impl LossReduction {
    /// Reduce an elementwise loss tensor according to this mode.
    pub fn reduce<B: Backend, const D: usize>(&self, loss: Tensor<B, D>) -> LossOutput<B, D> {
        match self {
            Self::Mean => LossOutput::Reduced(loss.mean()),
            Self::Sum => LossOutput::Reduced(loss.sum()),
            Self::None => LossOutput::Elementwise(loss),
        }
    }
}

/// Result of a loss whose reduction is only known at runtime.
#[derive(Clone, Debug)]
pub enum LossOutput<B: Backend, const D: usize> {
    /// Scalar loss, shape `[1]`.
    Reduced(Tensor<B, 1>),
    /// Per-element loss with the shape of the inputs.
    Elementwise(Tensor<B, D>),
}

impl<B: Backend, const D: usize> LossOutput<B, D> {
    /// Whether the loss was collapsed to a scalar.
    pub const fn is_reduced(&self) -> bool {
        matches!(self, Self::Reduced(_))
    }

    /// The scalar loss, if a mean or sum reduction was applied.
    pub fn into_reduced(self) -> Option<Tensor<B, 1>> {
        match self {
            Self::Reduced(loss) => Some(loss),
            Self::Elementwise(_) => None,
        }
    }

    /// The elementwise loss, if no reduction was applied.
    pub fn into_elementwise(self) -> Option<Tensor<B, D>> {
        match self {
            Self::Reduced(_) => None,
            Self::Elementwise(loss) => Some(loss),
        }
    }

    /// Shape of the contained tensor.
    pub fn dims(&self) -> Vec<usize> {
        match self {
            Self::Reduced(loss) => loss.dims().to_vec(),
            Self::Elementwise(loss) => loss.dims().to_vec(),
        }
    }

    /// Read the contained tensor back as [`TensorData`].
    pub fn into_tensor_data(self) -> TensorData {
        match self {
            Self::Reduced(loss) => loss.into_data(),
            Self::Elementwise(loss) => loss.into_data(),
        }
    }
}

#[cfg(test)]
mod tests {
    use burn::tensor::{ops::FloatElem, Tolerance};

    use super::*;
    use crate::{bce::BceWithLogitsLossConfig, tests::TestBackend};

    type FT = FloatElem<TestBackend>;

    #[test]
    fn reduction_from_str_accepts_known_names() {
        assert_eq!("mean".parse::<LossReduction>(), Ok(LossReduction::Mean));
        assert_eq!("Sum".parse::<LossReduction>(), Ok(LossReduction::Sum));
        assert_eq!("NONE".parse::<LossReduction>(), Ok(LossReduction::None));
    }

    #[test]
    fn reduction_from_str_rejects_unknown_name() {
        let err = "batchmean".parse::<LossReduction>().unwrap_err();
        assert_eq!(
            err,
            GFocalLossError::UnknownReduction {
                name: "batchmean".to_owned()
            }
        );
        assert!(err.to_string().contains("'batchmean'"));
    }

    #[test]
    fn reduction_from_burn_reduction_maps_auto_to_mean() {
        assert_eq!(LossReduction::from(Reduction::Auto), LossReduction::Mean);
        assert_eq!(LossReduction::from(Reduction::Mean), LossReduction::Mean);
        assert_eq!(LossReduction::from(Reduction::Sum), LossReduction::Sum);
        assert_eq!(LossReduction::default(), LossReduction::Mean);
    }

    #[test]
    fn reduction_reduce_mean_sum_and_none() {
        let device = Default::default();
        let loss = Tensor::<TestBackend, 2>::from_data(
            TensorData::from([[1.0, 2.0], [3.0, 6.0]]),
            &device,
        );

        let mean = LossReduction::Mean.reduce(loss.clone());
        let sum = LossReduction::Sum.reduce(loss.clone());
        let none = LossReduction::None.reduce(loss);

        assert!(mean.is_reduced());
        assert!(sum.is_reduced());
        assert!(!none.is_reduced());
        assert_eq!(none.dims(), vec![2, 2]);

        mean.into_tensor_data()
            .assert_approx_eq::<FT>(&TensorData::from([3.0]), Tolerance::default());
        sum.into_tensor_data()
            .assert_approx_eq::<FT>(&TensorData::from([12.0]), Tolerance::default());
        none.into_elementwise()
            .expect("No reduction keeps the elementwise tensor")
            .into_data()
            .assert_approx_eq::<FT>(
                &TensorData::from([[1.0, 2.0], [3.0, 6.0]]),
                Tolerance::default(),
            );
    }

    #[test]
    fn loss_output_accessors_reject_the_other_variant() {
        let device = Default::default();
        let loss = Tensor::<TestBackend, 1>::from_data(TensorData::from([1.0, 3.0]), &device);

        assert!(LossReduction::Mean
            .reduce(loss.clone())
            .into_elementwise()
            .is_none());
        assert!(LossReduction::None.reduce(loss).into_reduced().is_none());
    }

    #[test]
    fn reduction_survives_config_json_round_trip() {
        let config = BceWithLogitsLossConfig::new().with_reduction(LossReduction::None);

        let json = config.to_string();
        let restored = BceWithLogitsLossConfig::load_binary(json.as_bytes())
            .expect("Config JSON should load back");

        assert_eq!(restored.reduction, LossReduction::None);
        assert_eq!(restored.pos_weight, 1.0);
    }
}
