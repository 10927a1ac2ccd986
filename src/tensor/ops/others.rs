use crate::tensor::Tensor;
use std::cmp::PartialEq;

impl From<f32> for Tensor {
    /// 实现 From<f32> trait 用于将`f32`类型转换为形状为`[1]`的张量
    fn from(scalar: f32) -> Self {
        Tensor::new(&[scalar], &[1])
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Tensor {
    /// 对张量中的所有元素求和并返回一个形状为[1]的标量。
    pub fn sum(&self) -> Tensor {
        Tensor::from(self.data.sum())
    }

    /// 张量中绝对值最大的元素（空张量返回0）
    pub fn abs_max(&self) -> f32 {
        self.data.iter().fold(0.0_f32, |acc, x| acc.max(x.abs()))
    }
}
