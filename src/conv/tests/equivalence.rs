use approx::assert_relative_eq;

use super::{random_tensor, seeded_rng};
use crate::conv::{ConvGeometry, Convolution, DirectConv, FastConv};

/// 遍历 N∈{1,2}，C∈{1,3}，O∈{1,4}，k∈{2,3}，stride∈{1,2}，padding∈{0,1}
fn for_each_config(mut f: impl FnMut([usize; 4], [usize; 4], usize, usize)) {
    for n in [1, 2] {
        for c in [1, 3] {
            for o in [1, 4] {
                for k in [2, 3] {
                    for stride in [1, 2] {
                        for padding in [0, 1] {
                            f([n, c, 5, 6], [o, c, k, k], padding, stride);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_fast_forward_matches_direct() {
    let mut rng = seeded_rng(10);
    for_each_config(|input_shape, kernel_shape, padding, stride| {
        let input = random_tensor(&input_shape, &mut rng);
        let kernel = random_tensor(&kernel_shape, &mut rng);
        let geometry = ConvGeometry::new(&input_shape, &kernel_shape, padding, stride).unwrap();

        let direct = DirectConv.forward(&input, &kernel, &geometry).unwrap();
        let fast = FastConv.forward(&input, &kernel, &geometry).unwrap();
        assert_eq!(direct.shape(), geometry.output_shape());
        assert_relative_eq!(fast, direct, epsilon = 1e-5, max_relative = 1e-5);
    });
}

#[test]
fn test_fast_grads_match_direct() {
    let mut rng = seeded_rng(11);
    for_each_config(|input_shape, kernel_shape, padding, stride| {
        let input = random_tensor(&input_shape, &mut rng);
        let kernel = random_tensor(&kernel_shape, &mut rng);
        let geometry = ConvGeometry::new(&input_shape, &kernel_shape, padding, stride).unwrap();
        let upstream = random_tensor(&geometry.output_shape(), &mut rng);

        let direct = DirectConv.grads(&input, &kernel, &upstream, &geometry).unwrap();
        let fast = FastConv.grads(&input, &kernel, &upstream, &geometry).unwrap();
        assert_relative_eq!(fast.kernel, direct.kernel, epsilon = 1e-5, max_relative = 1e-5);
        assert_relative_eq!(fast.input, direct.input, epsilon = 1e-5, max_relative = 1e-5);
    });
}

#[test]
fn test_non_square_kernel_matches_direct() {
    let mut rng = seeded_rng(12);
    let cases = [
        ([2, 2, 2, 3], 0, 1),
        ([3, 2, 3, 1], 1, 2),
        ([1, 2, 1, 4], 1, 1),
        // padding ≥ 核尺寸：边缘的窗口完全落在零填充区
        ([2, 2, 2, 2], 3, 1),
        ([2, 2, 1, 1], 2, 2),
        ([1, 2, 2, 3], 4, 3),
    ];
    for (kernel_shape, padding, stride) in cases {
        let input_shape = [2, 2, 4, 7];
        let input = random_tensor(&input_shape, &mut rng);
        let kernel = random_tensor(&kernel_shape, &mut rng);
        let geometry = ConvGeometry::new(&input_shape, &kernel_shape, padding, stride).unwrap();
        let upstream = random_tensor(&geometry.output_shape(), &mut rng);

        let direct_out = DirectConv.forward(&input, &kernel, &geometry).unwrap();
        let fast_out = FastConv.forward(&input, &kernel, &geometry).unwrap();
        assert_relative_eq!(fast_out, direct_out, epsilon = 1e-5, max_relative = 1e-5);

        let direct = DirectConv.grads(&input, &kernel, &upstream, &geometry).unwrap();
        let fast = FastConv.grads(&input, &kernel, &upstream, &geometry).unwrap();
        assert_relative_eq!(fast.kernel, direct.kernel, epsilon = 1e-5, max_relative = 1e-5);
        assert_relative_eq!(fast.input, direct.input, epsilon = 1e-5, max_relative = 1e-5);
    }
}

#[test]
fn test_direct_is_deterministic() {
    let mut rng = seeded_rng(13);
    let input = random_tensor(&[4, 3, 6, 6], &mut rng);
    let geometry = ConvGeometry::new(input.shape(), &[2, 3, 3, 3], 1, 1).unwrap();
    let upstream = random_tensor(&geometry.output_shape(), &mut rng);
    let first = DirectConv.kernel_grad(&input, &upstream, &geometry).unwrap();
    for _ in 0..5 {
        assert_eq!(DirectConv.kernel_grad(&input, &upstream, &geometry).unwrap(), first);
    }
}
