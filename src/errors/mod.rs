use thiserror::Error;
mod ops;
pub use self::ops::*;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TensorError {
    // 数字比较用
    #[error("{value_name}须{operator}{threshold}")]
    ValueMustSatisfyComparison {
        value_name: String,
        operator: ComparisonOperator,
        threshold: usize,
    },
    // 张量二元运算
    #[error(
        "形状不一致，故无法{operator}：第一个张量的形状为{tensor1_shape:?}，第二个张量的形状为{tensor2_shape:?}"
    )]
    OperatorError {
        operator: Operator,
        tensor1_shape: Vec<usize>,
        tensor2_shape: Vec<usize>,
    },

    #[error("数据长度{data_len}与形状{shape:?}所需的元素个数不一致")]
    DataLengthMismatch { data_len: usize, shape: Vec<usize> },
    #[error("交换张量时，输入的维度数至少需要2个")]
    PermuteNeedAtLeast2Dims,
    #[error("需要交换的维度必须是唯一且在[0, <张量维数>)范围内，且个数与张量阶数一致")]
    PermuteNeedUniqueAndInRange,
    #[error("张量形状不兼容")]
    IncompatibleShape,
    #[error("输入的张量维度必须为{0}")]
    DimensionMustBe(usize),
}

/// 卷积引擎的错误类型
///
/// 所有错误都在计算开始前（纯形状运算阶段）被检出，调用方拿到错误时没有任何外部可见状态被修改。
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConvError {
    /// 形状错误：阶数不为4、卷积核通道数与输入不符、卷积核大于填充后的输入、步长为0等
    #[error("形状错误：{message}（预期 {expected:?}，实际 {got:?}）")]
    ShapeError {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },
    /// 上游梯度的形状与前向输出的形状不一致
    #[error("上游梯度形状 {got:?} 与前向输出形状 {expected:?} 不一致")]
    DimensionMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    /// 配置文本无法解析
    #[error("卷积配置无效：{0}")]
    InvalidConfig(String),
}

impl ConvError {
    pub(crate) fn shape(expected: &[usize], got: &[usize], message: impl Into<String>) -> Self {
        Self::ShapeError {
            expected: expected.to_vec(),
            got: got.to_vec(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ConvError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
