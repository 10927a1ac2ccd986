use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::geometry::checked_product;
use crate::errors::{ComparisonOperator, ConvError, TensorError};
use crate::tensor::Tensor;

/// 卷积核的初始化方式
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelInit {
    /// N(0, 1) * sqrt(2 / fan_in)
    HeNormal,
    /// U(-1/sqrt(fan_in), 1/sqrt(fan_in))
    Uniform,
    /// 所有元素取同一个值，便于写确定性的测试
    Constant(f32),
}

impl KernelInit {
    /// 调试用的常数核（所有元素为2.0）
    pub const fn debug() -> Self {
        Self::Constant(2.0)
    }
}

/// 生成形状为 [out_channels, in_channels, kh, kw] 的卷积核（使用指定的RNG）。
/// fan_in = in_channels * kh * kw；任一维度为0或元素个数溢出时返回`ConvError::ShapeError`。
pub fn init_kernel_with_rng(
    in_channels: usize,
    out_channels: usize,
    kh: usize,
    kw: usize,
    mode: KernelInit,
    rng: &mut StdRng,
) -> Result<Tensor, ConvError> {
    let shape = [out_channels, in_channels, kh, kw];
    if shape.contains(&0) {
        let err = ConvError::shape(
            &[],
            &shape,
            TensorError::ValueMustSatisfyComparison {
                value_name: "卷积核的每个维度".to_string(),
                operator: ComparisonOperator::GreaterThan,
                threshold: 0,
            }
            .to_string(),
        );
        log::debug!("{err}");
        return Err(err);
    }
    if checked_product(&shape).is_none() {
        let err = ConvError::shape(&[], &shape, "卷积核的元素个数超出可表示范围");
        log::debug!("{err}");
        return Err(err);
    }

    let fan_in = (in_channels * kh * kw) as f32;
    let kernel = match mode {
        KernelInit::HeNormal => Tensor::new_normal_with_rng(0.0, (2.0 / fan_in).sqrt(), &shape, rng),
        KernelInit::Uniform => {
            let bound = 1.0 / fan_in.sqrt();
            Tensor::new_random_with_rng(-bound, bound, &shape, rng)
        }
        KernelInit::Constant(value) => Tensor::full(value, &shape),
    };
    Ok(kernel)
}

/// 同`init_kernel_with_rng`，使用以系统熵为种子的RNG
pub fn init_kernel(
    in_channels: usize,
    out_channels: usize,
    kh: usize,
    kw: usize,
    mode: KernelInit,
) -> Result<Tensor, ConvError> {
    let mut rng = StdRng::from_entropy();
    init_kernel_with_rng(in_channels, out_channels, kh, kw, mode, &mut rng)
}
