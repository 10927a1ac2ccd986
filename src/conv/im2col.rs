/*
 * @Author       : 老董
 * @Date         : 2026-10-17
 * @Description  : im2col / col2im
 *
 * im2col：把每张图像的每个感受野（滑动窗口）展开成补丁矩阵的一列，
 *         各图像的列沿最后一维依次拼接，得到 [C*kH*kW, N*H'*W']。
 * col2im：im2col 的逆变换。对同一填充像素被多个窗口读取的情况，
 *         必须做“累加”（scatter-add）而不是覆盖，否则重叠窗口的梯度会被悄悄丢弃。
 */

use ndarray::{Array2, Array4, ArrayView4, s};

use super::geometry::PatchGeometry;
use super::index::{IndexGenerator, IndexTriple};
use crate::errors::ConvError;
use crate::tensor::Tensor;

/// 对 [N, C, H, W] 的后两维做两侧对称的零填充
pub(crate) fn pad_spatial(input: ArrayView4<'_, f32>, padding: usize) -> Array4<f32> {
    if padding == 0 {
        return input.to_owned();
    }
    let (n, c, h, w) = input.dim();
    let mut padded = Array4::zeros((n, c, h + 2 * padding, w + 2 * padding));
    padded
        .slice_mut(s![.., .., padding..padding + h, padding..padding + w])
        .assign(&input);
    padded
}

/// 去掉 [N, C, H+2p, W+2p] 四周宽为`padding`的边框
pub(crate) fn strip_padding(padded: Array4<f32>, padding: usize) -> Array4<f32> {
    if padding == 0 {
        return padded;
    }
    let (_, _, ph, pw) = padded.dim();
    padded
        .slice(s![.., .., padding..ph - padding, padding..pw - padding])
        .to_owned()
}

/// 几何信息 + 对应的索引矩阵。
/// 同一组参数的前向与反向调用可共用一份，避免重复生成索引。
#[derive(Debug, Clone)]
pub struct PatchLayout {
    geometry: PatchGeometry,
    indices: IndexTriple,
}

impl PatchLayout {
    pub fn new(geometry: PatchGeometry) -> Self {
        Self {
            indices: IndexGenerator::generate(&geometry),
            geometry,
        }
    }

    /// 输入 [N, C, H, W] → 补丁矩阵 [C*kH*kW, N*H'*W']
    pub fn im2col(&self, input: &Tensor) -> Result<Tensor, ConvError> {
        let expected = self.geometry.input_shape();
        if input.shape() != expected {
            return Err(ConvError::shape(
                &expected,
                input.shape(),
                "im2col 的输入形状与几何信息不一致",
            ));
        }

        let padded = pad_spatial(input.view4(), self.geometry.padding);
        let [rows, total_cols] = self.geometry.patch_matrix_shape();
        let positions = self.geometry.positions();
        log::trace!("im2col：补丁矩阵 {rows}x{total_cols}");

        // 第 n 张图像占据第 [n*H'*W', (n+1)*H'*W') 列，等价于先按图像收集再沿最后一维拼接
        let mut cols = Array2::<f32>::zeros((rows, total_cols));
        for n in 0..self.geometry.batch {
            let offset = n * positions;
            for r in 0..rows {
                for p in 0..positions {
                    let (c, h, w) = self.indices.source(r, p);
                    cols[[r, offset + p]] = padded[[n, c, h, w]];
                }
            }
        }

        Ok(Tensor::from_array(cols.into_dyn()))
    }

    /// 补丁矩阵形状的梯度 [C*kH*kW, N*H'*W'] → 原（未填充）输入形状的梯度 [N, C, H, W]
    pub fn col2im(&self, cols: &Tensor) -> Result<Tensor, ConvError> {
        let expected = self.geometry.patch_matrix_shape();
        if cols.shape() != expected {
            return Err(ConvError::shape(
                &expected,
                cols.shape(),
                "col2im 的补丁矩阵形状与几何信息不一致",
            ));
        }

        let [rows, _] = expected;
        let positions = self.geometry.positions();
        let cols = cols.view2();
        let [n_, c_, ph, pw] = self.geometry.padded_shape();
        log::trace!("col2im：累加器 [{n_}, {c_}, {ph}, {pw}]");

        // 累加器只属于本次调用
        let mut accumulator = Array4::<f32>::zeros((n_, c_, ph, pw));
        for n in 0..self.geometry.batch {
            let offset = n * positions;
            for r in 0..rows {
                for p in 0..positions {
                    let (c, h, w) = self.indices.source(r, p);
                    accumulator[[n, c, h, w]] += cols[[r, offset + p]];
                }
            }
        }

        let grad = strip_padding(accumulator, self.geometry.padding);
        Ok(Tensor::from_array(grad.into_dyn()))
    }

    /// 对全1补丁矩阵做 col2im：每个输入位置被多少个感受野覆盖
    pub fn coverage(&self) -> Tensor {
        let ones = Tensor::ones(&self.geometry.patch_matrix_shape());
        self.col2im(&ones)
            .unwrap_or_else(|_| unreachable!("全1补丁矩阵的形状由几何信息本身给出"))
    }
}

/// 输入 [N, C, H, W] → 补丁矩阵 [C*kH*kW, N*H'*W']
pub fn im2col(
    input: &Tensor,
    kernel_h: usize,
    kernel_w: usize,
    stride: usize,
    padding: usize,
) -> Result<Tensor, ConvError> {
    let geometry = PatchGeometry::new(input.shape(), kernel_h, kernel_w, stride, padding)?;
    PatchLayout::new(geometry).im2col(input)
}

/// 补丁矩阵形状的梯度 → 形状为`input_shape`的梯度（重叠处累加）
pub fn col2im(
    cols: &Tensor,
    input_shape: &[usize],
    kernel_h: usize,
    kernel_w: usize,
    stride: usize,
    padding: usize,
) -> Result<Tensor, ConvError> {
    let geometry = PatchGeometry::new(input_shape, kernel_h, kernel_w, stride, padding)?;
    PatchLayout::new(geometry).col2im(cols)
}
