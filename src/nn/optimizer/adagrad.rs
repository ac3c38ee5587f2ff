/*
 * @Author       : 老董
 * @Date         : 2026-03-03
 * @Description  : AdaGrad 优化器
 */

use super::base::scaled_step;
use super::{Optimizer, OptimizerConfig, OptimizerKind, OptimizerState};
use crate::errors::Result;
use crate::nn::ConnectionId;
use crate::numeric::{Precision, Real};
use std::collections::BTreeMap;

/// AdaGrad：累积全部历史梯度的平方
/// - acc = acc + g²
/// - Δw = −lr × g / (√acc + ε)
#[derive(Debug, Clone)]
pub struct AdaGrad {
    config: OptimizerConfig,
    precision: Precision,
    /// 按连接序号索引的平方梯度累积量
    accumulators: BTreeMap<usize, Real>,
}

impl AdaGrad {
    pub fn new(config: &OptimizerConfig, precision: Precision) -> Self {
        Self {
            config: *config,
            precision,
            accumulators: BTreeMap::new(),
        }
    }

    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// 某条连接当前的累积量（未更新过时为 0）
    pub fn accumulator(&self, connection: ConnectionId) -> Real {
        self.accumulators.get(&connection.0).copied().unwrap_or(0.0)
    }
}

impl Optimizer for AdaGrad {
    fn kind(&self) -> OptimizerKind {
        OptimizerKind::AdaGrad
    }

    fn update(&mut self, gradient: Real, connection: ConnectionId) -> Result<Real> {
        let p = self.precision;
        let accumulator = self.accumulators.entry(connection.0).or_insert(0.0);
        *accumulator = p.add(*accumulator, p.powi(gradient, 2));
        scaled_step(p, &self.config, gradient, *accumulator)
    }

    fn state(&self) -> OptimizerState {
        OptimizerState::AdaGrad {
            accumulators: self.accumulators.clone(),
        }
    }

    fn load_state(&mut self, state: OptimizerState) -> Result<()> {
        self.accumulators = state.into_accumulators(OptimizerKind::AdaGrad)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.accumulators.clear();
    }
}
