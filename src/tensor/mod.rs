use ndarray::{Array, IxDyn};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::Rng;

use crate::errors::TensorError;

mod ops {
    pub mod approx_eq;
    pub mod mat_mul;
    pub mod others;
}

mod index;
mod property;
mod shape;

#[cfg(test)]
mod tests;

/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 卷积引擎中最常见的是4阶张量：输入/激活/梯度为`[N, C, H, W]`，卷积核及其梯度为`[O, C, kH, kW]`；
/// im2col得到的“补丁矩阵”则是2阶张量`[C*kH*kW, N*H'*W']`。
/// 数据总是以行优先（batch优先）的连续方式存放。
#[derive(Debug, Clone)]
pub struct Tensor {
    data: Array<f32, IxDyn>,
}

impl Tensor {
    /// 创建一个张量，若为标量，`shape`可以是[]、[1]、[1,1]、[1,1,1]...
    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；
    /// 若为矩阵，`shape`可以是[n,m]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]；
    /// 注：`data`的长度必须和`shape`中所有元素的乘积相等，否则会panic。
    pub fn new(data: &[f32], shape: &[usize]) -> Tensor {
        let data = Array::from_shape_vec(IxDyn(shape), data.to_vec()).unwrap_or_else(|_| {
            panic!(
                "{}",
                TensorError::DataLengthMismatch {
                    data_len: data.len(),
                    shape: shape.to_vec(),
                }
            )
        });
        Tensor { data }
    }

    pub(crate) fn from_array(data: Array<f32, IxDyn>) -> Tensor {
        Tensor { data }
    }

    pub fn zeros(shape: &[usize]) -> Tensor {
        Tensor {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    pub fn ones(shape: &[usize]) -> Tensor {
        Tensor {
            data: Array::ones(IxDyn(shape)),
        }
    }

    /// 创建一个所有元素都为`value`的张量
    pub fn full(value: f32, shape: &[usize]) -> Tensor {
        Tensor {
            data: Array::from_elem(IxDyn(shape), value),
        }
    }

    /// 创建一个随机张量，其值在[min, max]的闭区间（使用指定的RNG，便于复现）
    pub fn new_random_with_rng(min: f32, max: f32, shape: &[usize], rng: &mut StdRng) -> Tensor {
        let uniform = Uniform::from(min..=max);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| uniform.sample(rng))
            .collect::<Vec<_>>();
        Tensor::new(&data, shape)
    }

    /// 创建一个服从正态分布的随机张量（使用指定的RNG）。
    /// 采用Box-Muller变换，每次生成一对相互独立的样本。
    pub fn new_normal_with_rng(mean: f32, std_dev: f32, shape: &[usize], rng: &mut StdRng) -> Tensor {
        let data_len = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(data_len);

        while data.len() < data_len {
            let u1: f32 = rng.r#gen();
            let u2: f32 = rng.r#gen();
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f32::consts::PI * u2;
            let z0 = mean + std_dev * r * theta.cos();
            let z1 = mean + std_dev * r * theta.sin();

            if z0.is_finite() {
                data.push(z0);
            }
            if data.len() < data_len && z1.is_finite() {
                data.push(z1);
            }
        }

        Tensor::new(&data, shape)
    }
}
