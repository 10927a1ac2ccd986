/*
 * @Author       : 老董
 * @Date         : 2026-10-17
 * @Description  : 基于 im2col 的卷积：把卷积改写成一次稠密矩阵乘法
 *
 * 记 R = C*kH*kW，P = H'*W'：
 * 前向：  [O, R] × [R, N*P] → [O, N*P] → [N, O, H', W']
 * 反向：  上游梯度重排为 dY: [O, N*P]
 *         dK = dY × colsᵀ → [O, C, kH, kW]
 *         dX = col2im(Kᵀ × dY) → [N, C, H, W]
 */

use super::backend::{ConvGrads, Convolution};
use super::geometry::{ConvGeometry, ensure_shape};
use super::im2col::PatchLayout;
use crate::errors::ConvError;
use crate::tensor::Tensor;

/// im2col + 矩阵乘法实现的卷积
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FastConv;

/// 卷积核 [O, C, kH, kW] → 矩阵 [O, C*kH*kW]
fn kernel_matrix(kernel: &Tensor, geometry: &ConvGeometry) -> Tensor {
    kernel.reshape(&[geometry.out_channels, geometry.patch.patch_rows()])
}

/// 上游梯度 [N, O, H', W'] → [O, N*H'*W']，列的排列与补丁矩阵一致
fn upstream_matrix(upstream: &Tensor, geometry: &ConvGeometry) -> Tensor {
    let [_, total_cols] = geometry.patch.patch_matrix_shape();
    upstream
        .permute(&[1, 0, 2, 3])
        .reshape(&[geometry.out_channels, total_cols])
}

impl FastConv {
    fn kernel_grad_with(
        layout: &PatchLayout,
        input: &Tensor,
        dout: &Tensor,
        geometry: &ConvGeometry,
    ) -> Result<Tensor, ConvError> {
        let cols = layout.im2col(input)?;
        Ok(dout
            .mat_mul(&cols.transpose())
            .reshape(&geometry.kernel_shape()))
    }

    fn input_grad_with(
        layout: &PatchLayout,
        kernel: &Tensor,
        dout: &Tensor,
        geometry: &ConvGeometry,
    ) -> Result<Tensor, ConvError> {
        let dcols = kernel_matrix(kernel, geometry).transpose().mat_mul(dout);
        layout.col2im(&dcols)
    }
}

impl Convolution for FastConv {
    fn forward(
        &self,
        input: &Tensor,
        kernel: &Tensor,
        geometry: &ConvGeometry,
    ) -> Result<Tensor, ConvError> {
        ensure_shape(geometry.kernel_shape(), kernel.shape(), "卷积核")?;
        let layout = PatchLayout::new(geometry.patch);
        let cols = layout.im2col(input)?;

        let [n, o, out_h, out_w] = geometry.output_shape();
        // 第 n 张图像的结果位于第 [n*P, (n+1)*P) 列
        let output = kernel_matrix(kernel, geometry)
            .mat_mul(&cols)
            .reshape(&[o, n, out_h, out_w])
            .permute(&[1, 0, 2, 3]);
        Ok(output)
    }

    fn kernel_grad(
        &self,
        input: &Tensor,
        upstream: &Tensor,
        geometry: &ConvGeometry,
    ) -> Result<Tensor, ConvError> {
        geometry.check_upstream(upstream.shape())?;
        let layout = PatchLayout::new(geometry.patch);
        Self::kernel_grad_with(&layout, input, &upstream_matrix(upstream, geometry), geometry)
    }

    fn input_grad(
        &self,
        kernel: &Tensor,
        upstream: &Tensor,
        geometry: &ConvGeometry,
    ) -> Result<Tensor, ConvError> {
        ensure_shape(geometry.kernel_shape(), kernel.shape(), "卷积核")?;
        geometry.check_upstream(upstream.shape())?;
        let layout = PatchLayout::new(geometry.patch);
        Self::input_grad_with(&layout, kernel, &upstream_matrix(upstream, geometry), geometry)
    }

    /// 两个梯度共用同一份索引与重排后的上游梯度
    fn grads(
        &self,
        input: &Tensor,
        kernel: &Tensor,
        upstream: &Tensor,
        geometry: &ConvGeometry,
    ) -> Result<ConvGrads, ConvError> {
        ensure_shape(geometry.kernel_shape(), kernel.shape(), "卷积核")?;
        geometry.check_upstream(upstream.shape())?;
        let layout = PatchLayout::new(geometry.patch);
        let dout = upstream_matrix(upstream, geometry);
        Ok(ConvGrads {
            kernel: Self::kernel_grad_with(&layout, input, &dout, geometry)?,
            input: Self::input_grad_with(&layout, kernel, &dout, geometry)?,
        })
    }
}
