//! 2D 卷积引擎
//!
//! 数据流：
//! `init_kernel` → { `DirectConv` | `IndexGenerator` → `im2col` → `FastConv` } → 前向输出
//! → （外部的损失/反向驱动）→ 上游梯度 → { `DirectConv` | `im2col`/`col2im` → `FastConv` } → 梯度
//!
//! 张量布局：输入/梯度 [N, C, H, W]，卷积核 [O, C, kH, kW]，输出 [N, O, H', W']，
//! 补丁矩阵 [C*kH*kW, N*H'*W']。

mod backend;
mod config;
mod direct;
mod engine;
mod fast;
mod geometry;
mod im2col;
mod index;
mod init;

pub use backend::{ConvBackend, ConvGrads, Convolution};
pub use config::{BackendKind, ConvConfig};
pub use direct::DirectConv;
pub use engine::{Conv2dEngine, backward, forward};
pub use fast::FastConv;
pub use geometry::{ConvGeometry, PatchGeometry};
pub use im2col::{PatchLayout, col2im, im2col};
pub use index::{IndexGenerator, IndexTriple, generate_indices};
pub use init::{KernelInit, init_kernel, init_kernel_with_rng};

#[cfg(test)]
mod tests;
