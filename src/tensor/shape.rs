use super::Tensor;
use crate::errors::TensorError;
use ndarray::{Array, IxDyn};
use std::collections::HashSet;

impl Tensor {
    /// 按行优先顺序重新解释元素，返回新形状的张量（不影响原张量）。
    /// 新旧形状的元素个数必须一致，否则会panic。
    pub fn reshape(&self, shape: &[usize]) -> Self {
        let total_elements: usize = self.data.len();
        let new_total_elements: usize = shape.iter().product();
        assert!(
            total_elements == new_total_elements,
            "{}",
            TensorError::IncompatibleShape
        );
        // 经由逻辑顺序拷贝，转置后的（非连续）张量也能得到正确结果
        let data = Array::from_shape_vec(IxDyn(shape), self.to_vec())
            .unwrap_or_else(|_| panic!("{}", TensorError::IncompatibleShape));
        Self { data }
    }

    /// 交换张量的两个（以上）维度，并将其返回（不影响原张量）。
    /// 结果被物化为标准（行优先、连续）布局。
    pub fn permute(&self, axes: &[usize]) -> Self {
        assert!(axes.len() >= 2, "{}", TensorError::PermuteNeedAtLeast2Dims);
        // 检查axes中的所有元素必须是唯一且在[0, <张量维数>)范围内
        let unique_axes = axes.iter().copied().collect::<HashSet<_>>();
        assert!(
            unique_axes.len() == axes.len()
                && axes.len() == self.dimension()
                && unique_axes.iter().all(|&a| a < self.dimension()),
            "{}",
            TensorError::PermuteNeedUniqueAndInRange
        );

        let permuted = self.data.clone().permuted_axes(axes);
        Self {
            data: permuted.as_standard_layout().into_owned(),
        }
    }

    /// 张量的转置：交换前两个维度。阶数不超过1的张量原样返回
    pub fn transpose(&self) -> Self {
        if self.dimension() <= 1 {
            self.clone()
        } else {
            let mut axes: Vec<usize> = (0..self.dimension()).collect();
            axes.swap(0, 1);
            self.permute(&axes)
        }
    }
}
