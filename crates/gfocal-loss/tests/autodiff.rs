use burn::{
    backend::{ndarray::NdArray, Autodiff},
    nn::loss::Reduction,
    tensor::{Tensor, TensorData},
};
use gfocal_loss::{BceWithLogitsLoss, DistributionFocalLossConfig, QualityFocalLossConfig};

type TestBackend = Autodiff<NdArray<f32>>;

#[test]
fn quality_focal_loss_backward_yields_finite_gradients() {
    let device = Default::default();
    let loss = QualityFocalLossConfig::new()
        .with_gamma(2.0)
        .init(BceWithLogitsLoss::new());

    let pred = Tensor::<TestBackend, 2>::from_data(TensorData::from([[0.0, 2.0]]), &device)
        .require_grad();
    let target = Tensor::<TestBackend, 2>::from_data(TensorData::from([[1.0, 0.0]]), &device);

    let result = loss.forward_with_reduction(pred.clone(), target, Reduction::Mean);
    let grads = result.backward();
    let grad = pred.grad(&grads).expect("Gradient for predictions");

    assert_eq!(grad.dims(), [1, 2]);
    let values = grad.into_data().to_vec::<f32>().expect("Float gradient data");
    assert!(values.iter().all(|v| v.is_finite()));

    // Raising the logit of a positive lowers the loss, and the opposite for a negative
    assert!(values[0] < 0.0);
    assert!(values[1] > 0.0);
}

#[test]
fn distribution_focal_loss_backward_pushes_mass_towards_target_bins() {
    let device = Default::default();
    let loss = DistributionFocalLossConfig::new().with_reg_max(3).init();

    let pred = Tensor::<TestBackend, 2>::zeros([1, 4], &device).require_grad();
    let target = Tensor::<TestBackend, 1>::from_data(TensorData::from([1.5]), &device);

    let result = loss
        .forward(pred.clone(), target)
        .into_reduced()
        .expect("Default reduction is mean");
    let grads = result.backward();
    let grad = pred.grad(&grads).expect("Gradient for predictions");

    let values = grad.into_data().to_vec::<f32>().expect("Float gradient data");

    // Bins 1 and 2 surround the target, bins 0 and 3 do not
    assert!(values[1] < 0.0 && values[2] < 0.0);
    assert!(values[0] > 0.0 && values[3] > 0.0);
}
