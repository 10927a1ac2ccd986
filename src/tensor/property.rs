/*
 * @Author       : 老董
 * @Date         : 2023-10-21 03:22:26
 * @Description  : 本类仅包含一些属性方法，不包含任何运算方法，所以不会需要用到mut
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-17 10:12:05
 */

use super::Tensor;
use crate::errors::TensorError;
use ndarray::{ArrayView2, ArrayView4, ArrayViewD, Ix2, Ix4};

impl Tensor {
    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓快照/view(_mut)↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    pub fn view(&self) -> ArrayViewD<'_, f32> {
        self.data.view()
    }
    /// 4阶快照，阶数不为4时panic（卷积引擎在调用前已完成形状校验）
    pub(crate) fn view4(&self) -> ArrayView4<'_, f32> {
        self.data
            .view()
            .into_dimensionality::<Ix4>()
            .unwrap_or_else(|_| panic!("{}", TensorError::DimensionMustBe(4)))
    }
    /// 2阶快照，阶数不为2时panic
    pub(crate) fn view2(&self) -> ArrayView2<'_, f32> {
        self.data
            .view()
            .into_dimensionality::<Ix2>()
            .unwrap_or_else(|_| panic!("{}", TensorError::DimensionMustBe(2)))
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑快照/view(_mut)↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；
    /// 若为矩阵，`shape`可以是[n,m]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]。
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 张量的维（dim）数、阶（rank）数
    /// 即`shape()`的元素个数--如：形状为`[]`的标量阶数为0，向量阶数为1，矩阵阶数为2，以此类推
    pub fn dimension(&self) -> usize {
        self.data.ndim()
    }

    /// 计算张量中所有元素的数量
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 判断两个张量的形状是否严格一致。如：形状为 [1, 4]，[1, 4]和[4]是不一致的，会返回false
    pub fn is_same_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }

    /// 判断张量是否为标量
    pub fn is_scalar(&self) -> bool {
        self.shape().is_empty() || self.shape().iter().all(|x| *x == 1)
    }

    /// 转化为纯数（number）。若为标量，则返回Some(number)，否则返回None
    pub fn number(&self) -> Option<f32> {
        if self.is_scalar() {
            self.data.iter().next().copied()
        } else {
            None
        }
    }

    /// 按行优先（逻辑）顺序把所有元素拷贝出来
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }
}
