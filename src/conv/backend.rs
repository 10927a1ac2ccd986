use enum_dispatch::enum_dispatch;

use super::direct::DirectConv;
use super::fast::FastConv;
use super::geometry::ConvGeometry;
use crate::errors::ConvError;
use crate::tensor::Tensor;

/// 可选的卷积实现。两者在浮点求和顺序误差内结果一致
#[enum_dispatch]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvBackend {
    /// 逐窗口循环，作为参考实现
    Direct(DirectConv),
    /// im2col + 矩阵乘法
    Fast(FastConv),
}

/// 一次反向传播得到的两个梯度
#[derive(Debug, Clone)]
pub struct ConvGrads {
    /// 对卷积核的梯度，形状同卷积核 [O, C, kH, kW]
    pub kernel: Tensor,
    /// 对输入的梯度，形状同输入 [N, C, H, W]
    pub input: Tensor,
}

/// 卷积实现的公共接口。
/// `geometry`须由同一组输入/卷积核形状构造；各运算数的形状不符时返回`ConvError::ShapeError`，
/// 上游梯度形状不符时返回`ConvError::DimensionMismatch`。
#[enum_dispatch(ConvBackend)]
pub trait Convolution {
    /// 前向：[N, C, H, W] ⋆ [O, C, kH, kW] → [N, O, H', W']
    fn forward(
        &self,
        input: &Tensor,
        kernel: &Tensor,
        geometry: &ConvGeometry,
    ) -> Result<Tensor, ConvError>;

    /// 对卷积核的梯度（跨batch求和）
    fn kernel_grad(
        &self,
        input: &Tensor,
        upstream: &Tensor,
        geometry: &ConvGeometry,
    ) -> Result<Tensor, ConvError>;

    /// 对（未填充）输入的梯度
    fn input_grad(
        &self,
        kernel: &Tensor,
        upstream: &Tensor,
        geometry: &ConvGeometry,
    ) -> Result<Tensor, ConvError>;

    fn grads(
        &self,
        input: &Tensor,
        kernel: &Tensor,
        upstream: &Tensor,
        geometry: &ConvGeometry,
    ) -> Result<ConvGrads, ConvError> {
        Ok(ConvGrads {
            kernel: self.kernel_grad(input, upstream, geometry)?,
            input: self.input_grad(kernel, upstream, geometry)?,
        })
    }
}
