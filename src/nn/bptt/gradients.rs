/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 梯度累加器（ConnectionId -> 梯度）
 */

use crate::errors::Result;
use crate::nn::{ConnectionId, Network};
use crate::numeric::{Precision, Real};
use std::collections::HashMap;

/// 按连接累加的梯度
///
/// 生命周期：每个样本、每个分组各自从零开始，组内跨样本累加，
/// 归并阶段跨组累加。缺失的键按零处理（`get_or_zero`）。
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    values: HashMap<ConnectionId, Real>,
    precision: Precision,
}

impl Gradients {
    pub fn new(precision: Precision) -> Self {
        Self {
            values: HashMap::new(),
            precision,
        }
    }

    pub fn get(&self, id: ConnectionId) -> Option<Real> {
        self.values.get(&id).copied()
    }

    pub fn get_or_zero(&self, id: ConnectionId) -> Real {
        self.get(id).unwrap_or(0.0)
    }

    /// 把一份梯度贡献加到`id`上
    pub fn add(&mut self, id: ConnectionId, value: Real) {
        let precision = self.precision;
        let entry = self.values.entry(id).or_insert(0.0);
        *entry = precision.add(*entry, value);
    }

    /// 把另一份累加器按键求和并入本累加器
    pub fn merge(&mut self, other: &Self) {
        // 按 ID 顺序归并，保证同一组输入的归并结果与 HashMap 的遍历顺序无关
        let mut ids: Vec<_> = other.values.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            self.add(id, other.values[&id]);
        }
    }

    /// 所有梯度都除以`divisor`（用于按批大小求平均）
    pub fn divided_by(&self, divisor: Real) -> Result<Self> {
        let values = self
            .values
            .iter()
            .map(|(&id, &g)| Ok((id, self.precision.div(g, divisor)?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self {
            values,
            precision: self.precision,
        })
    }

    /// 按网络的连接声明顺序排列（未出现的连接记为 0）
    pub fn ordered(&self, network: &Network) -> Vec<Real> {
        network
            .connections()
            .iter()
            .map(|c| self.get_or_zero(c.id()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConnectionId, Real)> + '_ {
        self.values.iter().map(|(&id, &g)| (id, g))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
