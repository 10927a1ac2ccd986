use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;

impl Tensor {
    /// 实现矩阵乘法。只接受2阶张量，否则会触发panic。
    /// 需要保证前一个张量的列数（col）等于后一个张量的行数（row），否则也会触发panic。
    pub fn mat_mul(&self, other: &Tensor) -> Tensor {
        // 检查输入的张量维度
        assert!(self.dimension() == 2, "{}", TensorError::DimensionMustBe(2));
        assert!(other.dimension() == 2, "{}", TensorError::DimensionMustBe(2));
        // 检查前一个张量的列数是否等于后一个张量的行数
        assert!(
            self.shape()[1] == other.shape()[0],
            "{}",
            TensorError::OperatorError {
                operator: Operator::MatMul,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: other.shape().to_vec(),
            }
        );
        // 上面已检查阶数，转为2阶快照不会失败
        let result_data = self.view2().dot(&other.view2());
        Tensor {
            data: result_data.into_dyn(),
        }
    }
}
