//! # Only Conv
//!
//! `only_conv`是一个纯rust实现的2D卷积计算引擎：
//! 既有逐窗口循环的直接实现（作为参考），也有基于im2col把卷积改写成一次矩阵乘法的快速实现，
//! 两者都支持前向、对卷积核的梯度以及对输入的梯度。
//!

pub mod conv;
pub mod errors;
pub mod tensor;
pub mod utils;
