/*
 * @Author       : 老董
 * @Date         : 2026-10-17
 * @Description  : 卷积的几何信息（纯形状运算）
 *
 * 输出尺寸计算：
 * H' = (H + 2*padding - kH) / stride + 1
 * W' = (W + 2*padding - kW) / stride + 1
 *
 * 注：当 (H + 2*padding - kH) 不能被 stride 整除时，向下取整，
 * 图像末尾多出的那一条像素不会被任何窗口读到（这是预期行为）。
 */

use crate::errors::{ComparisonOperator, ConvError, TensorError};

/// im2col/col2im 所需的几何信息：输入形状 + 滑动窗口参数 + 推导出的输出尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatchGeometry {
    pub batch: usize,
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub kernel_h: usize,
    pub kernel_w: usize,
    pub stride: usize,
    pub padding: usize,
    pub out_h: usize,
    pub out_w: usize,
    // 以下尺寸在校验时用带溢出检查的运算求得
    padded_h: usize,
    padded_w: usize,
    patch_rows: usize,
    positions: usize,
}

/// 各维度之积，溢出时返回None
pub(crate) fn checked_product(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// 尺寸溢出时的统一错误
fn overflow(got: &[usize], what: &str) -> ConvError {
    ConvError::shape(&[], got, format!("{what}超出可表示范围"))
}

impl PatchGeometry {
    /// 校验并推导几何信息
    ///
    /// # 参数
    /// - `input_shape`: [N, C, H, W]
    /// - `kernel_h`/`kernel_w`: 卷积核的空间尺寸
    /// - `stride`: 步长（≥1）
    /// - `padding`: 两侧对称的零填充宽度
    pub fn new(
        input_shape: &[usize],
        kernel_h: usize,
        kernel_w: usize,
        stride: usize,
        padding: usize,
    ) -> Result<Self, ConvError> {
        let result = Self::validate(input_shape, kernel_h, kernel_w, stride, padding);
        if let Err(err) = &result {
            log::debug!("卷积几何校验失败：{err}");
        }
        result
    }

    fn validate(
        input_shape: &[usize],
        kernel_h: usize,
        kernel_w: usize,
        stride: usize,
        padding: usize,
    ) -> Result<Self, ConvError> {
        if input_shape.len() != 4 {
            return Err(ConvError::shape(
                &[0, 0, 0, 0],
                input_shape,
                format!("输入必须是 4D [N, C, H, W]，得到 {input_shape:?}"),
            ));
        }
        if input_shape.contains(&0) {
            return Err(ConvError::shape(
                &[],
                input_shape,
                "输入的每个维度都必须大于0",
            ));
        }
        if stride < 1 {
            return Err(ConvError::shape(
                &[1],
                &[stride],
                TensorError::ValueMustSatisfyComparison {
                    value_name: "stride".to_string(),
                    operator: ComparisonOperator::GreaterOrEqual,
                    threshold: 1,
                }
                .to_string(),
            ));
        }
        if kernel_h == 0 || kernel_w == 0 {
            return Err(ConvError::shape(
                &[],
                &[kernel_h, kernel_w],
                "卷积核的空间尺寸必须大于0",
            ));
        }

        let (batch, channels, height, width) =
            (input_shape[0], input_shape[1], input_shape[2], input_shape[3]);
        let padded = |extent: usize| padding.checked_mul(2).and_then(|p| p.checked_add(extent));
        let (Some(padded_h), Some(padded_w)) = (padded(height), padded(width)) else {
            return Err(overflow(&[height, width, padding], "填充后的输入尺寸"));
        };
        if kernel_h > padded_h || kernel_w > padded_w {
            return Err(ConvError::shape(
                &[padded_h, padded_w],
                &[kernel_h, kernel_w],
                format!(
                    "卷积核 {kernel_h}x{kernel_w} 大于填充后的输入 {padded_h}x{padded_w}"
                ),
            ));
        }

        let out_h = (padded_h - kernel_h) / stride + 1;
        let out_w = (padded_w - kernel_w) / stride + 1;
        // 补丁矩阵与填充后累加器的元素个数也必须可表示
        let sizes = (
            checked_product(&[channels, kernel_h, kernel_w]),
            checked_product(&[out_h, out_w]),
            checked_product(&[batch, channels, kernel_h, kernel_w, out_h, out_w]),
            checked_product(&[batch, channels, padded_h, padded_w]),
        );
        let (Some(patch_rows), Some(positions), Some(_), Some(_)) = sizes else {
            return Err(overflow(
                &[batch, channels, padded_h, padded_w, kernel_h, kernel_w],
                "补丁矩阵或填充后输入的元素个数",
            ));
        };

        Ok(Self {
            batch,
            channels,
            height,
            width,
            kernel_h,
            kernel_w,
            stride,
            padding,
            out_h,
            out_w,
            padded_h,
            padded_w,
            patch_rows,
            positions,
        })
    }

    pub fn input_shape(&self) -> [usize; 4] {
        [self.batch, self.channels, self.height, self.width]
    }

    pub fn padded_shape(&self) -> [usize; 4] {
        [
            self.batch,
            self.channels,
            self.padded_h(),
            self.padded_w(),
        ]
    }

    pub fn padded_h(&self) -> usize {
        self.padded_h
    }

    pub fn padded_w(&self) -> usize {
        self.padded_w
    }

    /// 补丁矩阵的行数：C*kH*kW
    pub fn patch_rows(&self) -> usize {
        self.patch_rows
    }

    /// 单张图像的输出位置数：H'*W'
    pub fn positions(&self) -> usize {
        self.positions
    }

    /// 补丁矩阵的形状：[C*kH*kW, N*H'*W']
    pub fn patch_matrix_shape(&self) -> [usize; 2] {
        [self.patch_rows(), self.batch * self.positions()]
    }
}

/// 一次卷积调用的完整几何信息：在`PatchGeometry`基础上加上输出通道数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConvGeometry {
    pub patch: PatchGeometry,
    pub out_channels: usize,
}

impl ConvGeometry {
    /// 根据输入形状[N, C, H, W]与卷积核形状[O, C, kH, kW]校验并推导几何信息
    pub fn new(
        input_shape: &[usize],
        kernel_shape: &[usize],
        padding: usize,
        stride: usize,
    ) -> Result<Self, ConvError> {
        if kernel_shape.len() != 4 || kernel_shape.contains(&0) {
            let err = ConvError::shape(
                &[0, 0, 0, 0],
                kernel_shape,
                format!("卷积核必须是各维度均大于0的 4D [O, C, kH, kW]，得到 {kernel_shape:?}"),
            );
            log::debug!("卷积几何校验失败：{err}");
            return Err(err);
        }
        let patch = PatchGeometry::new(
            input_shape,
            kernel_shape[2],
            kernel_shape[3],
            stride,
            padding,
        )?;
        if kernel_shape[1] != patch.channels {
            let err = ConvError::shape(
                &[patch.channels],
                &[kernel_shape[1]],
                format!(
                    "输入通道数 {} 与卷积核输入通道数 {} 不匹配",
                    patch.channels, kernel_shape[1]
                ),
            );
            log::debug!("卷积几何校验失败：{err}");
            return Err(err);
        }
        let out_channels = kernel_shape[0];
        let kernel_size = checked_product(&[out_channels, patch.patch_rows()]);
        let output_size = checked_product(&[patch.batch, out_channels, patch.positions()]);
        if kernel_size.is_none() || output_size.is_none() {
            let err = overflow(kernel_shape, "卷积核或输出的元素个数");
            log::debug!("卷积几何校验失败：{err}");
            return Err(err);
        }

        Ok(Self {
            patch,
            out_channels,
        })
    }

    pub fn input_shape(&self) -> [usize; 4] {
        self.patch.input_shape()
    }

    pub fn kernel_shape(&self) -> [usize; 4] {
        [
            self.out_channels,
            self.patch.channels,
            self.patch.kernel_h,
            self.patch.kernel_w,
        ]
    }

    /// 前向输出的形状：[N, O, H', W']
    pub fn output_shape(&self) -> [usize; 4] {
        [
            self.patch.batch,
            self.out_channels,
            self.patch.out_h,
            self.patch.out_w,
        ]
    }

    /// 校验上游梯度的形状与前向输出一致
    pub fn check_upstream(&self, upstream_shape: &[usize]) -> Result<(), ConvError> {
        let expected = self.output_shape();
        if upstream_shape != expected {
            let err = ConvError::DimensionMismatch {
                expected: expected.to_vec(),
                got: upstream_shape.to_vec(),
            };
            log::debug!("{err}");
            return Err(err);
        }
        Ok(())
    }
}

/// 校验某个运算数的形状与几何信息推导出的形状一致
pub(crate) fn ensure_shape(expected: [usize; 4], got: &[usize], what: &str) -> Result<(), ConvError> {
    if got != expected {
        let err = ConvError::shape(&expected, got, format!("{what}的形状与卷积几何信息不一致"));
        log::debug!("{err}");
        return Err(err);
    }
    Ok(())
}
