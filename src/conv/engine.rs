use super::backend::{ConvBackend, ConvGrads, Convolution};
use super::config::ConvConfig;
use super::geometry::ConvGeometry;
use crate::errors::ConvError;
use crate::tensor::Tensor;

/// 卷积引擎：持有配置（padding、stride、实现方式），本身无其他状态。
/// 每次调用都是输入张量到输出张量的纯函数，可在多线程间共享。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conv2dEngine {
    config: ConvConfig,
    backend: ConvBackend,
}

impl Default for Conv2dEngine {
    fn default() -> Self {
        Self::new(ConvConfig::default())
    }
}

impl Conv2dEngine {
    pub fn new(config: ConvConfig) -> Self {
        Self {
            backend: config.backend.into(),
            config,
        }
    }

    /// 只做形状推导，不做计算
    pub fn geometry(&self, input_shape: &[usize], kernel_shape: &[usize]) -> Result<ConvGeometry, ConvError> {
        ConvGeometry::new(input_shape, kernel_shape, self.config.padding, self.config.stride)
    }

    /// 前向：[N, C, H, W] ⋆ [O, C, kH, kW] → [N, O, H', W']
    pub fn forward(&self, input: &Tensor, kernel: &Tensor) -> Result<Tensor, ConvError> {
        let geometry = self.geometry(input.shape(), kernel.shape())?;
        log::debug!(
            "conv2d 前向（{:?}）：{:?} ⋆ {:?} → {:?}",
            self.config.backend,
            geometry.input_shape(),
            geometry.kernel_shape(),
            geometry.output_shape()
        );
        self.backend.forward(input, kernel, &geometry)
    }

    /// 反向：返回对卷积核的梯度
    pub fn backward(&self, input: &Tensor, kernel: &Tensor, upstream: &Tensor) -> Result<Tensor, ConvError> {
        let geometry = self.geometry(input.shape(), kernel.shape())?;
        geometry.check_upstream(upstream.shape())?;
        log::debug!(
            "conv2d 反向（{:?}）：上游梯度 {:?} → 卷积核梯度 {:?}",
            self.config.backend,
            upstream.shape(),
            geometry.kernel_shape()
        );
        self.backend.kernel_grad(input, upstream, &geometry)
    }

    /// 反向：同时返回对卷积核与对输入的梯度
    pub fn backward_full(
        &self,
        input: &Tensor,
        kernel: &Tensor,
        upstream: &Tensor,
    ) -> Result<ConvGrads, ConvError> {
        let geometry = self.geometry(input.shape(), kernel.shape())?;
        geometry.check_upstream(upstream.shape())?;
        log::debug!(
            "conv2d 反向（{:?}）：上游梯度 {:?} → 卷积核梯度 {:?}，输入梯度 {:?}",
            self.config.backend,
            upstream.shape(),
            geometry.kernel_shape(),
            geometry.input_shape()
        );
        self.backend.grads(input, kernel, upstream, &geometry)
    }
}

/// 以默认（im2col）实现做前向
pub fn forward(input: &Tensor, kernel: &Tensor, padding: usize, stride: usize) -> Result<Tensor, ConvError> {
    engine_for(padding, stride).forward(input, kernel)
}

/// 以默认（im2col）实现求卷积核梯度
pub fn backward(
    input: &Tensor,
    kernel: &Tensor,
    upstream: &Tensor,
    padding: usize,
    stride: usize,
) -> Result<Tensor, ConvError> {
    engine_for(padding, stride).backward(input, kernel, upstream)
}

fn engine_for(padding: usize, stride: usize) -> Conv2dEngine {
    Conv2dEngine::new(ConvConfig {
        padding,
        stride,
        ..ConvConfig::default()
    })
}

