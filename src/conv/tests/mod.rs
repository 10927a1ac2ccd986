use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::tensor::Tensor;

mod config;
mod equivalence;

fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

fn random_tensor(shape: &[usize], rng: &mut StdRng) -> Tensor {
    Tensor::new_random_with_rng(-1.0, 1.0, shape, rng)
}

/// 1x1x4x4 的 1..=16
fn fixture_4x4_input() -> Tensor {
    let data: Vec<f32> = (1..=16).map(|x| x as f32).collect();
    Tensor::new(&data, &[1, 1, 4, 4])
}

/// Sobel 核
fn fixture_4x4_kernel() -> Tensor {
    Tensor::new(&[1., 0., -1., 2., 0., -2., 1., 0., -1.], &[1, 1, 3, 3])
}

/// padding=1，stride=1 时的前向结果
fn fixture_4x4_output() -> Tensor {
    Tensor::new(
        &[
            -10., -6., -6., 13., //
            -24., -8., -8., 28., //
            -40., -8., -8., 44., //
            -38., -6., -6., 41.,
        ],
        &[1, 1, 4, 4],
    )
}

/// 4x5 的单通道图像
const SHARPEN_IMAGE: [f32; 20] = [
    3., 1., 7., 2., 5., //
    5., 1., 0., 9., 2., //
    8., 2., 4., 9., 3., //
    4., 3., 1., 1., 4.,
];

/// 锐化核
const SHARPEN_KERNEL: [f32; 9] = [0., -1., 0., -1., 5., -1., 0., -1., 0.];
