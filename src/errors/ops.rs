use std::fmt::{self, Display};

/// 张量的二元运算符
#[derive(Debug, PartialEq, Eq)]
pub enum Operator {
    MatMul,
}
impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operation_name = match self {
            Operator::MatMul => "矩阵相乘",
        };
        write!(f, "{}", operation_name)
    }
}

/// 比较运算符
#[derive(Debug, PartialEq, Eq)]
pub enum ComparisonOperator {
    GreaterOrEqual,
    GreaterThan,
}
impl Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operator_name = match self {
            ComparisonOperator::GreaterOrEqual => "≥",
            ComparisonOperator::GreaterThan => ">",
        };
        write!(f, "{}", operator_name)
    }
}
