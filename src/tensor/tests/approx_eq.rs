use approx::{assert_abs_diff_eq, assert_relative_eq, assert_relative_ne};

use crate::tensor::Tensor;

#[test]
fn test_approx_eq_within_tolerance() {
    let a = Tensor::new(&[1.0, 2.0, 3.0], &[3]);
    let b = Tensor::new(&[1.0 + 1e-7, 2.0, 3.0 - 1e-7], &[3]);
    assert_abs_diff_eq!(a, b, epsilon = 1e-6);
    assert_relative_eq!(a, b, max_relative = 1e-6);
}

#[test]
fn test_approx_ne_on_shape_or_value() {
    let a = Tensor::new(&[1.0, 2.0], &[2]);
    assert_relative_ne!(a, Tensor::new(&[1.0, 2.0], &[2, 1]));
    assert_relative_ne!(a, Tensor::new(&[1.0, 2.1], &[2]), max_relative = 1e-3);
}
