use super::Tensor;
use std::ops::{Index, IndexMut};

// 引用式索引：`tensor[[n, c, h, w]]`，索引个数须与张量阶数一致，越界时panic
impl<const N: usize> Index<[usize; N]> for Tensor {
    type Output = f32;

    fn index(&self, index: [usize; N]) -> &Self::Output {
        assert!(N == self.dimension(), "索引维度与张量阶数不一致");
        &self.data[&index[..]]
    }
}

impl<const N: usize> IndexMut<[usize; N]> for Tensor {
    fn index_mut(&mut self, index: [usize; N]) -> &mut Self::Output {
        assert!(N == self.dimension(), "索引维度与张量阶数不一致");
        &mut self.data[&index[..]]
    }
}
