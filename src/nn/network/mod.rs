/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 神经网络图（神经元 + 连接）及其前向求值
 *
 * 各 impl 块分散在子模块中：
 * - builder.rs: 增加神经元/连接、锁定连接
 * - forward.rs: evaluate/reset（逐时间步前向求值与快照）
 * - params.rs: params/impose/init_normalised（权重的整体读写）
 */

mod activation;
mod builder;
mod forward;
mod params;
mod types;

pub use activation::Activation;
pub use types::{Connection, ConnectionId, Neuron, NeuronId, NeuronKind, TimestepSnapshot};

use crate::errors::{RannError, Result};
use crate::numeric::{Precision, Real};
use rand::rngs::StdRng;
use std::collections::HashMap;

/// 网络：拥有全部神经元与连接，按 ID（声明序号）索引
///
/// 批量训练时每个工作线程持有一份独立的克隆，前向/反向期间不共享可变状态。
#[derive(Debug, Clone)]
pub struct Network {
    pub(in crate::nn::network) neurons: Vec<Neuron>,
    pub(in crate::nn::network) connections: Vec<Connection>,
    pub(in crate::nn::network) input_neurons: Vec<NeuronId>,
    pub(in crate::nn::network) output_neurons: Vec<NeuronId>,
    pub(in crate::nn::network) precision: Precision,
    /// 网络级别的随机数生成器（用于 init_normalised）
    pub(in crate::nn::network) rng: StdRng,

    // ========== 逐时间步的瞬时状态 ==========
    /// 当前时间步已求出的神经元值
    pub(in crate::nn::network) values: HashMap<NeuronId, Real>,
    /// 当前时间步乘积神经元的乘积
    pub(in crate::nn::network) intermediates: HashMap<NeuronId, Real>,
    /// 上下文神经元带入本时间步的值（上一时间步产生）
    pub(in crate::nn::network) carried: HashMap<NeuronId, Real>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    // ========== 基础访问器 ==========

    pub const fn precision(&self) -> Precision {
        self.precision
    }

    /// 全部神经元（按声明顺序）
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// 全部连接（按声明顺序）
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// 输入神经元（按声明顺序，与输入向量一一对应）
    pub fn input_neurons(&self) -> &[NeuronId] {
        &self.input_neurons
    }

    /// 输出神经元（按声明顺序，与输出向量一一对应）
    pub fn output_neurons(&self) -> &[NeuronId] {
        &self.output_neurons
    }

    pub fn neuron(&self, id: NeuronId) -> Result<&Neuron> {
        self.neurons.get(id.0).ok_or(RannError::NeuronNotFound(id))
    }

    pub fn connection(&self, id: ConnectionId) -> Result<&Connection> {
        self.connections
            .get(id.0)
            .ok_or(RannError::ConnectionNotFound(id))
    }

    /// 指向`neuron`的全部连接
    pub fn connections_to(&self, neuron: NeuronId) -> Result<impl Iterator<Item = &Connection>> {
        let neuron = self.neuron(neuron)?;
        Ok(neuron
            .incoming
            .iter()
            .map(move |id| &self.connections[id.0]))
    }

    /// 从`neuron`出发的全部连接
    pub fn connections_from(&self, neuron: NeuronId) -> Result<impl Iterator<Item = &Connection>> {
        let neuron = self.neuron(neuron)?;
        Ok(neuron
            .outgoing
            .iter()
            .map(move |id| &self.connections[id.0]))
    }

    /// 按名称查找神经元（名称不要求唯一，返回第一个）
    pub fn find_neuron(&self, name: &str) -> Option<NeuronId> {
        self.neurons.iter().find(|n| n.name == name).map(|n| n.id)
    }
}
