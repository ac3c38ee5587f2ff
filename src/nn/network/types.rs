/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : Network 模块的类型定义（神经元、连接、时间步快照）
 */

use super::activation::Activation;
use crate::numeric::Real;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 神经元 ID（即其在网络中的声明序号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NeuronId(pub usize);

/// 连接 ID（即其在网络中的声明序号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub usize);

/// 神经元角色
///
/// 封闭的变体集合：前向组合方式与 BPTT 的求导规则都按此标签做穷尽匹配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronKind {
    /// 输入神经元：值直接取自输入向量，没有上游梯度路径
    Input,
    /// 输出神经元：按声明顺序组成网络的输出向量
    Output,
    /// 隐藏神经元：加权求和后激活
    Hidden,
    /// 上下文神经元：把第 t 步算出的值带到第 t+1 步
    Context,
    /// 乘积神经元：把各输入连接的值相乘（而非加权求和）后激活
    Product,
}

#[derive(Debug, Clone)]
pub struct Neuron {
    pub(in crate::nn::network) id: NeuronId,
    pub(in crate::nn::network) name: String,
    pub(in crate::nn::network) kind: NeuronKind,
    pub(in crate::nn::network) activation: Activation,
    /// 指向本神经元的连接（按声明顺序）
    pub(in crate::nn::network) incoming: Vec<ConnectionId>,
    /// 从本神经元出发的连接（按声明顺序）
    pub(in crate::nn::network) outgoing: Vec<ConnectionId>,
}

impl Neuron {
    pub const fn id(&self) -> NeuronId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn kind(&self) -> NeuronKind {
        self.kind
    }

    pub const fn activation(&self) -> Activation {
        self.activation
    }

    pub const fn is_input(&self) -> bool {
        matches!(self.kind, NeuronKind::Input)
    }

    pub const fn is_output(&self) -> bool {
        matches!(self.kind, NeuronKind::Output)
    }

    pub const fn is_context(&self) -> bool {
        matches!(self.kind, NeuronKind::Context)
    }

    pub const fn is_product(&self) -> bool {
        matches!(self.kind, NeuronKind::Product)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub(in crate::nn::network) id: ConnectionId,
    pub(in crate::nn::network) input: NeuronId,
    pub(in crate::nn::network) output: NeuronId,
    pub(in crate::nn::network) weight: Real,
    /// 锁定的连接不参与优化器更新
    pub(in crate::nn::network) locked: bool,
}

impl Connection {
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// 连接的源神经元
    pub const fn input(&self) -> NeuronId {
        self.input
    }

    /// 连接的目标神经元
    pub const fn output(&self) -> NeuronId {
        self.output
    }

    pub const fn weight(&self) -> Real {
        self.weight
    }

    pub const fn is_locked(&self) -> bool {
        self.locked
    }
}

/// 一个时间步的快照（由 `Network::reset()` 产生，产生后不再改变）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimestepSnapshot {
    pub(in crate::nn::network) values: HashMap<NeuronId, Real>,
    /// 仅乘积神经元有：激活前的乘积
    pub(in crate::nn::network) intermediates: HashMap<NeuronId, Real>,
}

impl TimestepSnapshot {
    pub fn value(&self, neuron: NeuronId) -> Option<Real> {
        self.values.get(&neuron).copied()
    }

    pub fn intermediate(&self, neuron: NeuronId) -> Option<Real> {
        self.intermediates.get(&neuron).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
