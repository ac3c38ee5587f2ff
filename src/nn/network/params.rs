/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : Network 权重的整体读写（params/impose/init_normalised）
 */

use super::Network;
use crate::errors::{RannError, Result};
use crate::numeric::Real;
use rand::Rng;

impl Network {
    /// 全部权重（按连接声明顺序）
    pub fn params(&self) -> Vec<Real> {
        self.connections.iter().map(|c| c.weight).collect()
    }

    /// 按连接声明顺序整体设置权重
    pub fn impose(&mut self, weights: &[Real]) -> Result<()> {
        if weights.len() != self.connections.len() {
            return Err(RannError::ShapeMismatch {
                expected: self.connections.len(),
                got: weights.len(),
                message: "权重数量与连接数量不一致".to_string(),
            });
        }
        for (connection, &weight) in self.connections.iter_mut().zip(weights) {
            connection.weight = self.precision.round(weight);
        }
        Ok(())
    }

    /// 归一化初始化：每条未锁定连接的权重均匀取自 ±1/√fan_in（fan_in 为目标神经元的入度）
    ///
    /// 锁定的连接（如上下文神经元的复制连接）保持原值。
    pub fn init_normalised(&mut self) {
        for index in 0..self.connections.len() {
            if self.connections[index].locked {
                continue;
            }
            let target = self.connections[index].output;
            let fan_in = self.neurons[target.0].incoming.len().max(1);
            let bound = 1.0 / (fan_in as Real).sqrt();
            let weight = self.rng.gen_range(-bound..=bound);
            self.connections[index].weight = self.precision.round(weight);
        }
    }
}
