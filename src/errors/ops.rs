use std::fmt::{self, Display};

/// 定精度数值运算中会失败的运算符（用于数值错误的提示）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericOperator {
    Div,
}
impl Display for NumericOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operation_name = match self {
            NumericOperator::Div => "相除",
        };
        write!(f, "{}", operation_name)
    }
}
