/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 全库统一的错误类型
 */

use thiserror::Error;
mod ops;
pub use self::ops::*;

use crate::nn::{ConnectionId, NeuronId};

pub type Result<T> = std::result::Result<T, RannError>;

#[derive(Error, Debug)]
pub enum RannError {
    // 形状/维度类（致命，直接向上传递）
    #[error("{message}：期望长度{expected}，实际长度{got}")]
    ShapeMismatch {
        expected: usize,
        got: usize,
        message: String,
    },
    #[error("第{timestep}个时间步的快照中缺少神经元{neuron:?}的数据")]
    MissingTimestepData { timestep: usize, neuron: NeuronId },
    #[error("样本的输入序列为空")]
    EmptySequence,
    #[error("批次为空")]
    EmptyBatch,

    // 拓扑类
    #[error("找不到神经元{0:?}")]
    NeuronNotFound(NeuronId),
    #[error("找不到连接{0:?}")]
    ConnectionNotFound(ConnectionId),
    #[error("网络拓扑无效：{0}")]
    InvalidTopology(String),
    #[error("未知的激活函数标签：`{0}`")]
    UnknownActivation(String),

    // 数值类
    #[error("{operator}失败：{message}")]
    Numeric {
        operator: NumericOperator,
        message: String,
    },

    // 配置类
    #[error("配置无效：{0}")]
    InvalidConfig(String),
    #[error("优化器状态不匹配：期望{expected}，实际为{got}")]
    OptimizerStateMismatch { expected: String, got: String },

    // 并行与持久化
    #[error("工作线程池失败：{0}")]
    WorkerPool(String),
    #[error("存档读写失败：{0}")]
    Io(#[from] std::io::Error),
    #[error("存档格式无效：{0}")]
    Format(#[from] serde_json::Error),
}

impl RannError {
    pub(crate) fn div_by_zero(context: impl Into<String>) -> Self {
        Self::Numeric {
            operator: NumericOperator::Div,
            message: format!("{}中除数为零", context.into()),
        }
    }
}
