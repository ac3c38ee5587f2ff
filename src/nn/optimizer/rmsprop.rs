/*
 * @Author       : 老董
 * @Date         : 2026-03-03
 * @Description  : RMSProp 优化器
 */

use super::base::scaled_step;
use super::{Optimizer, OptimizerConfig, OptimizerKind, OptimizerState};
use crate::errors::Result;
use crate::nn::ConnectionId;
use crate::numeric::{Precision, Real};
use std::collections::BTreeMap;

/// RMSProp：平方梯度的指数滑动平均
/// - acc = decay × acc + (1 − decay) × g²
/// - Δw = −lr × g / (√acc + ε)
#[derive(Debug, Clone)]
pub struct RmsProp {
    config: OptimizerConfig,
    precision: Precision,
    accumulators: BTreeMap<usize, Real>,
}

impl RmsProp {
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

    pub fn accumulator(&self, connection: ConnectionId) -> Real {
        self.accumulators.get(&connection.0).copied().unwrap_or(0.0)
    }
}

impl Optimizer for RmsProp {
    fn kind(&self) -> OptimizerKind {
        OptimizerKind::RmsProp
    }

    fn update(&mut self, gradient: Real, connection: ConnectionId) -> Result<Real> {
        let p = self.precision;
        let decay = self.config.decay;
        let accumulator = self.accumulators.entry(connection.0).or_insert(0.0);
        *accumulator = p.add(
            p.mul(decay, *accumulator),
            p.mul(p.sub(1.0, decay), p.powi(gradient, 2)),
        );
        scaled_step(p, &self.config, gradient, *accumulator)
    }

    fn state(&self) -> OptimizerState {
        OptimizerState::RmsProp {
            accumulators: self.accumulators.clone(),
        }
    }

    fn load_state(&mut self, state: OptimizerState) -> Result<()> {
        self.accumulators = state.into_accumulators(OptimizerKind::RmsProp)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.accumulators.clear();
    }
}
