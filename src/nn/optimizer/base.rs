/*
 * @Author       : 老董
 * @Date         : 2026-03-03
 * @Description  : 优化器基础trait、配置与可序列化状态
 */

use super::{AdaGrad, RmsProp};
use crate::errors::{RannError, Result};
use crate::nn::ConnectionId;
use crate::numeric::{Precision, Real};
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 优化器核心 trait
///
/// 按连接逐个给出权重增量，内部维护每条连接的累积状态（跨批次保留）。
///
/// ```ignore
/// for (id, gradient) in gradients.iter() {
///     let delta = optimizer.update(gradient, id)?;
///     network.add_to_weight(id, delta)?;
/// }
/// ```
#[enum_dispatch]
pub trait Optimizer {
    fn kind(&self) -> OptimizerKind;

    /// 由梯度得到权重增量（同时更新该连接的累积状态）
    fn update(&mut self, gradient: Real, connection: ConnectionId) -> Result<Real>;

    /// 当前状态的快照（用于存档）
    fn state(&self) -> OptimizerState;

    /// 从快照恢复；快照属于另一种优化器时报错且不改动当前状态
    fn load_state(&mut self, state: OptimizerState) -> Result<()>;

    /// 清空累积状态
    fn reset(&mut self);
}

#[enum_dispatch(Optimizer)]
#[derive(Debug, Clone)]
pub enum OptimizerEnum {
    AdaGrad(AdaGrad),
    RmsProp(RmsProp),
}

impl OptimizerEnum {
    /// 按名称与配置构建优化器
    pub fn from_config(
        kind: OptimizerKind,
        config: &OptimizerConfig,
        precision: Precision,
    ) -> Result<Self> {
        config.validate()?;
        Ok(match kind {
            OptimizerKind::AdaGrad => AdaGrad::new(config, precision).into(),
            OptimizerKind::RmsProp => RmsProp::new(config, precision).into(),
        })
    }
}

/// 优化器种类（配置中的`optimiser`键，名称不区分大小写）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OptimizerKind {
    AdaGrad,
    #[default]
    RmsProp,
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdaGrad => write!(f, "AdaGrad"),
            Self::RmsProp => write!(f, "RMSProp"),
        }
    }
}

impl FromStr for OptimizerKind {
    type Err = RannError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "adagrad" => Ok(Self::AdaGrad),
            "rmsprop" => Ok(Self::RmsProp),
            _ => Err(RannError::InvalidConfig(format!("未知的优化器：`{s}`"))),
        }
    }
}

impl TryFrom<String> for OptimizerKind {
    type Error = RannError;

    fn try_from(name: String) -> Result<Self> {
        name.parse()
    }
}

impl From<OptimizerKind> for String {
    fn from(kind: OptimizerKind) -> Self {
        kind.to_string()
    }
}

/// 优化器超参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub learning_rate: Real,
    /// RMSProp 的衰减率（AdaGrad 不使用）
    pub decay: Real,
    /// 数值稳定项
    pub epsilon: Real,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            decay: 0.9,
            epsilon: 1e-8,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0) {
            return Err(RannError::InvalidConfig(format!(
                "学习率必须为正数，实际为{}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.decay) {
            return Err(RannError::InvalidConfig(format!(
                "衰减率必须位于[0, 1)，实际为{}",
                self.decay
            )));
        }
        if !(self.epsilon > 0.0) {
            return Err(RannError::InvalidConfig(format!(
                "epsilon必须为正数，实际为{}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// 优化器状态快照：连接 ID（序号）-> 累积量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptimizerState {
    AdaGrad { accumulators: BTreeMap<usize, Real> },
    RmsProp { accumulators: BTreeMap<usize, Real> },
}

impl OptimizerState {
    pub const fn kind(&self) -> OptimizerKind {
        match self {
            Self::AdaGrad { .. } => OptimizerKind::AdaGrad,
            Self::RmsProp { .. } => OptimizerKind::RmsProp,
        }
    }

    pub const fn accumulators(&self) -> &BTreeMap<usize, Real> {
        match self {
            Self::AdaGrad { accumulators } | Self::RmsProp { accumulators } => accumulators,
        }
    }

    /// 取出累积量；种类不符时报`OptimizerStateMismatch`
    pub(crate) fn into_accumulators(self, expected: OptimizerKind) -> Result<BTreeMap<usize, Real>> {
        if self.kind() != expected {
            return Err(RannError::OptimizerStateMismatch {
                expected: expected.to_string(),
                got: self.kind().to_string(),
            });
        }
        match self {
            Self::AdaGrad { accumulators } | Self::RmsProp { accumulators } => Ok(accumulators),
        }
    }
}

/// 两种优化器共用的增量公式：−lr × g / (√acc + ε)
pub(super) fn scaled_step(
    precision: Precision,
    config: &OptimizerConfig,
    gradient: Real,
    accumulator: Real,
) -> Result<Real> {
    let denominator = precision.add(precision.sqrt(accumulator), config.epsilon);
    let numerator = precision.mul(-config.learning_rate, gradient);
    precision.div(numerator, denominator)
}
