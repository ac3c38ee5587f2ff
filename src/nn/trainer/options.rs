/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : 批次训练选项（可从 JSON 文本或文件加载）
 */

use crate::errors::{RannError, Result};
use crate::nn::optimizer::{OptimizerConfig, OptimizerKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `run_batch`的选项
///
/// ```json
/// { "optimiser": "AdaGrad", "num_groups": 4, "processes": 2, "checking": false,
///   "optimizer": { "learning_rate": 0.05 } }
/// ```
/// 所有键均可省略。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchOptions {
    pub optimiser: OptimizerKind,
    /// 分组数；缺省为 max(1, 进程数) × 10（再截到批大小）
    pub num_groups: Option<usize>,
    /// 工作线程数；缺省为 rayon 的默认线程数
    pub processes: Option<usize>,
    /// 是否做有限差分梯度检查（仅批大小为 1 时执行）
    pub checking: bool,
    pub optimizer: OptimizerConfig,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            optimiser: OptimizerKind::default(),
            num_groups: None,
            processes: None,
            checking: false,
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl BatchOptions {
    pub fn from_json(text: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(text)
            .map_err(|e| RannError::InvalidConfig(format!("无法解析批次选项：{e}")))?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_groups == Some(0) {
            return Err(RannError::InvalidConfig("num_groups必须大于0".to_string()));
        }
        if self.processes == Some(0) {
            return Err(RannError::InvalidConfig("processes必须大于0".to_string()));
        }
        self.optimizer.validate()
    }

    pub fn process_count(&self) -> usize {
        self.processes.unwrap_or_else(rayon::current_num_threads).max(1)
    }

    /// 给定批大小时实际使用的分组数（1..=batch_size）
    pub fn group_count(&self, batch_size: usize) -> usize {
        let requested = self
            .num_groups
            .unwrap_or_else(|| self.process_count().max(1) * 10);
        requested.clamp(1, batch_size.max(1))
    }
}
