//! 索引矩阵生成：决定补丁矩阵每个元素该从填充后输入的哪个(通道, 行, 列)读取。
//!
//! 行索引矩阵与列索引矩阵的形状均为`[C*kH*kW, H'*W']`，通道索引为`[C*kH*kW, 1]`。
//! 索引只依赖几何信息，与张量内容及batch无关（batch由im2col按图像拼接处理）。

use ndarray::Array2;

use super::geometry::PatchGeometry;
use crate::errors::ConvError;

/// 三个索引矩阵
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTriple {
    /// 行索引：`[C*kH*kW, H'*W']`
    pub rows: Array2<usize>,
    /// 列索引：`[C*kH*kW, H'*W']`
    pub cols: Array2<usize>,
    /// 通道索引：`[C*kH*kW, 1]`
    pub channels: Array2<usize>,
}

impl IndexTriple {
    /// 补丁行`r`、输出位置`p`对应的(通道, 行, 列)
    #[inline]
    pub fn source(&self, r: usize, p: usize) -> (usize, usize, usize) {
        (self.channels[[r, 0]], self.rows[[r, p]], self.cols[[r, p]])
    }
}

/// 索引生成器（无状态）
pub struct IndexGenerator;

impl IndexGenerator {
    /// 对已校验的几何信息生成索引
    pub fn generate(geometry: &PatchGeometry) -> IndexTriple {
        let PatchGeometry {
            channels,
            kernel_h,
            kernel_w,
            stride,
            out_h,
            out_w,
            ..
        } = *geometry;

        // 窗口内偏移：行偏移为 0..kH 各重复 kW 次，列偏移为 0..kW 整体平铺 kH 次，再按通道平铺
        let mut row_offsets = Vec::with_capacity(geometry.patch_rows());
        let mut col_offsets = Vec::with_capacity(geometry.patch_rows());
        let mut channel_ids = Vec::with_capacity(geometry.patch_rows());
        for c in 0..channels {
            for i in 0..kernel_h {
                for j in 0..kernel_w {
                    row_offsets.push(i);
                    col_offsets.push(j);
                    channel_ids.push(c);
                }
            }
        }

        // 窗口起点：行起点为 stride*(0..H') 各重复 W' 次，列起点为 stride*(0..W') 整体平铺 H' 次
        let mut row_origins = Vec::with_capacity(geometry.positions());
        let mut col_origins = Vec::with_capacity(geometry.positions());
        for oh in 0..out_h {
            for ow in 0..out_w {
                row_origins.push(stride * oh);
                col_origins.push(stride * ow);
            }
        }

        // 外和（outer sum）
        let shape = (row_offsets.len(), row_origins.len());
        let mut rows = Array2::zeros(shape);
        let mut cols = Array2::zeros(shape);
        for r in 0..shape.0 {
            for p in 0..shape.1 {
                rows[[r, p]] = row_offsets[r] + row_origins[p];
                cols[[r, p]] = col_offsets[r] + col_origins[p];
            }
        }

        let channels = Array2::from_shape_vec((channel_ids.len(), 1), channel_ids)
            .unwrap_or_else(|_| unreachable!("通道索引长度恒为 C*kH*kW"));

        IndexTriple {
            rows,
            cols,
            channels,
        }
    }
}

/// 由输入形状与滤波器参数直接生成索引
pub fn generate_indices(
    input_shape: &[usize],
    kernel_h: usize,
    kernel_w: usize,
    stride: usize,
    padding: usize,
) -> Result<IndexTriple, ConvError> {
    let geometry = PatchGeometry::new(input_shape, kernel_h, kernel_w, stride, padding)?;
    Ok(IndexGenerator::generate(&geometry))
}
