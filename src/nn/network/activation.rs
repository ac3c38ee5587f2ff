/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 神经元激活函数及其（以激活后数值为自变量的）导数
 */

use crate::errors::RannError;
use crate::numeric::{Precision, Real};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// 激活函数标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    #[default]
    Linear,
    Tanh,
    Step,
}

impl Activation {
    /// 前向：由净输入（加权和或乘积）得到神经元的值
    pub fn apply(&self, x: Real, precision: Precision) -> Real {
        match self {
            Self::Relu => x.max(0.0),
            Self::Sigmoid => precision.round(1.0 / (1.0 + (-x).exp())),
            Self::Linear => x,
            Self::Tanh => precision.round(x.tanh()),
            Self::Step => {
                if x >= 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// 反向：导数以神经元**激活后的值**为自变量
    ///
    /// 阶跃函数不可导，按零梯度处理
    pub fn derivative(&self, value: Real, precision: Precision) -> Real {
        match self {
            Self::Relu => {
                if value > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Sigmoid => precision.mul(value, precision.sub(1.0, value)),
            Self::Linear => 1.0,
            Self::Tanh => precision.sub(1.0, precision.powi(value, 2)),
            Self::Step => 0.0,
        }
    }
}

impl FromStr for Activation {
    type Err = RannError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_lowercase().as_str() {
            "relu" => Ok(Self::Relu),
            "sigmoid" | "logistic" => Ok(Self::Sigmoid),
            "linear" | "identity" => Ok(Self::Linear),
            "tanh" => Ok(Self::Tanh),
            "step" | "heaviside" => Ok(Self::Step),
            _ => Err(RannError::UnknownActivation(tag.to_string())),
        }
    }
}

impl Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Relu => "relu",
            Self::Sigmoid => "sigmoid",
            Self::Linear => "linear",
            Self::Tanh => "tanh",
            Self::Step => "step",
        };
        write!(f, "{}", name)
    }
}
