/*
 * @Author       : 老董
 * @Date         : 2026-10-17
 * @Description  : 直接（逐窗口循环）卷积及其反向传播
 *
 * 与传统做法不同，这里不显式构造填充后的输入：
 * 对每个输出行/列预先算出“窗口中落在真实图像内的核偏移区间”，
 * 填充区对乘积和没有贡献，直接跳过整段区间即可，无需逐元素做越界判断。
 *
 * 使用 Rayon 在 batch 维度并行；卷积核梯度先按图像各自累加，
 * 再按图像顺序依次求和，因此结果与线程调度无关。
 */

use std::ops::Range;

use rayon::prelude::*;

use super::backend::Convolution;
use super::geometry::{ConvGeometry, PatchGeometry, ensure_shape};
use crate::errors::ConvError;
use crate::tensor::Tensor;

/// 直接卷积（参考实现）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectConv;

/// 各输出位置（沿一个空间轴）的有效核偏移区间。
/// 窗口起点（填充坐标系）为`o*stride`，核偏移`k`对应真实坐标`o*stride + k - padding`，
/// 其须落在`[0, extent)`内。
pub(super) fn tap_ranges(
    out_len: usize,
    stride: usize,
    padding: usize,
    extent: usize,
    kernel: usize,
) -> Vec<Range<usize>> {
    (0..out_len)
        .map(|o| {
            let origin = o * stride;
            let start = padding.saturating_sub(origin).min(kernel);
            let end = (padding + extent).saturating_sub(origin).min(kernel);
            start..end.max(start)
        })
        .collect()
}

/// 预先算好的两组区间
struct Taps {
    rows: Vec<Range<usize>>,
    cols: Vec<Range<usize>>,
}

impl Taps {
    fn new(g: &PatchGeometry) -> Self {
        Self {
            rows: tap_ranges(g.out_h, g.stride, g.padding, g.height, g.kernel_h),
            cols: tap_ranges(g.out_w, g.stride, g.padding, g.width, g.kernel_w),
        }
    }
}

impl Convolution for DirectConv {
    fn forward(
        &self,
        input: &Tensor,
        kernel: &Tensor,
        geometry: &ConvGeometry,
    ) -> Result<Tensor, ConvError> {
        ensure_shape(geometry.input_shape(), input.shape(), "输入")?;
        ensure_shape(geometry.kernel_shape(), kernel.shape(), "卷积核")?;

        let g = geometry.patch;
        let out_c = geometry.out_channels;
        let taps = Taps::new(&g);
        let x = input.view4();
        let k = kernel.view4();
        let single_sample_size = out_c * g.out_h * g.out_w;

        let batch_results: Vec<Vec<f32>> = (0..g.batch)
            .into_par_iter()
            .map(|n| {
                let mut sample_data = vec![0.0f32; single_sample_size];
                for oc in 0..out_c {
                    for oh in 0..g.out_h {
                        let h0 = oh * g.stride;
                        for ow in 0..g.out_w {
                            let w0 = ow * g.stride;
                            let mut sum = 0.0f32;
                            for ic in 0..g.channels {
                                for kh in taps.rows[oh].clone() {
                                    let h = h0 + kh - g.padding;
                                    for kw in taps.cols[ow].clone() {
                                        sum += x[[n, ic, h, w0 + kw - g.padding]]
                                            * k[[oc, ic, kh, kw]];
                                    }
                                }
                            }
                            sample_data[(oc * g.out_h + oh) * g.out_w + ow] = sum;
                        }
                    }
                }
                sample_data
            })
            .collect();

        let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
        Ok(Tensor::new(&all_data, &geometry.output_shape()))
    }

    fn kernel_grad(
        &self,
        input: &Tensor,
        upstream: &Tensor,
        geometry: &ConvGeometry,
    ) -> Result<Tensor, ConvError> {
        ensure_shape(geometry.input_shape(), input.shape(), "输入")?;
        geometry.check_upstream(upstream.shape())?;

        let g = geometry.patch;
        let out_c = geometry.out_channels;
        let taps = Taps::new(&g);
        let x = input.view4();
        let dout = upstream.view4();
        let kernel_shape = geometry.kernel_shape();
        let kernel_size: usize = kernel_shape.iter().product();

        // 每张图像各自的部分梯度
        let batch_kernel_grads: Vec<Vec<f32>> = (0..g.batch)
            .into_par_iter()
            .map(|n| {
                let mut sample_kernel_grad = vec![0.0f32; kernel_size];
                for oc in 0..out_c {
                    for oh in 0..g.out_h {
                        let h0 = oh * g.stride;
                        for ow in 0..g.out_w {
                            let w0 = ow * g.stride;
                            let grad_val = dout[[n, oc, oh, ow]];
                            for ic in 0..g.channels {
                                let base = (oc * g.channels + ic) * g.kernel_h;
                                for kh in taps.rows[oh].clone() {
                                    let h = h0 + kh - g.padding;
                                    for kw in taps.cols[ow].clone() {
                                        sample_kernel_grad[(base + kh) * g.kernel_w + kw] +=
                                            grad_val * x[[n, ic, h, w0 + kw - g.padding]];
                                    }
                                }
                            }
                        }
                    }
                }
                sample_kernel_grad
            })
            .collect();

        // 按图像顺序归约
        let mut total_kernel_grad = vec![0.0f32; kernel_size];
        for sample_grad in batch_kernel_grads {
            for (total, value) in total_kernel_grad.iter_mut().zip(sample_grad) {
                *total += value;
            }
        }

        Ok(Tensor::new(&total_kernel_grad, &kernel_shape))
    }

    fn input_grad(
        &self,
        kernel: &Tensor,
        upstream: &Tensor,
        geometry: &ConvGeometry,
    ) -> Result<Tensor, ConvError> {
        ensure_shape(geometry.kernel_shape(), kernel.shape(), "卷积核")?;
        geometry.check_upstream(upstream.shape())?;

        let g = geometry.patch;
        let out_c = geometry.out_channels;
        let taps = Taps::new(&g);
        let k = kernel.view4();
        let dout = upstream.view4();
        let single_sample_size = g.channels * g.height * g.width;

        // 图像之间互不重叠，无需归约
        let batch_results: Vec<Vec<f32>> = (0..g.batch)
            .into_par_iter()
            .map(|n| {
                let mut sample_grad = vec![0.0f32; single_sample_size];
                for oc in 0..out_c {
                    for oh in 0..g.out_h {
                        let h0 = oh * g.stride;
                        for ow in 0..g.out_w {
                            let w0 = ow * g.stride;
                            let grad_val = dout[[n, oc, oh, ow]];
                            for ic in 0..g.channels {
                                for kh in taps.rows[oh].clone() {
                                    let row = (ic * g.height + h0 + kh - g.padding) * g.width;
                                    for kw in taps.cols[ow].clone() {
                                        sample_grad[row + w0 + kw - g.padding] +=
                                            grad_val * k[[oc, ic, kh, kw]];
                                    }
                                }
                            }
                        }
                    }
                }
                sample_grad
            })
            .collect();

        let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
        Ok(Tensor::new(&all_data, &geometry.input_shape()))
    }
}
