/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : Network 的最小构建接口（new_* / add_neuron / connect / lock）
 */

use super::{Activation, Connection, ConnectionId, Network, Neuron, NeuronId, NeuronKind};
use crate::errors::{RannError, Result};
use crate::numeric::{Precision, Real};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

impl Network {
    // ========== 创建 ==========

    pub fn new() -> Self {
        Self::with_precision(Precision::default())
    }

    /// 创建使用指定数值精度的网络
    pub fn with_precision(precision: Precision) -> Self {
        Self {
            neurons: Vec::new(),
            connections: Vec::new(),
            input_neurons: Vec::new(),
            output_neurons: Vec::new(),
            precision,
            rng: StdRng::from_entropy(),
            values: HashMap::new(),
            intermediates: HashMap::new(),
            carried: HashMap::new(),
        }
    }

    /// 创建一个带固定种子的网络（确保 init_normalised 可重复）
    pub fn with_seed(seed: u64) -> Self {
        let mut network = Self::new();
        network.set_seed(seed);
        network
    }

    /// 设置/重置网络的随机种子
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    // ========== 神经元与连接 ==========

    pub fn add_neuron(&mut self, name: &str, kind: NeuronKind, activation: Activation) -> NeuronId {
        let id = NeuronId(self.neurons.len());
        self.neurons.push(Neuron {
            id,
            name: name.to_string(),
            kind,
            activation,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        });
        match kind {
            NeuronKind::Input => self.input_neurons.push(id),
            NeuronKind::Output => self.output_neurons.push(id),
            NeuronKind::Hidden | NeuronKind::Context | NeuronKind::Product => {}
        }
        id
    }

    /// 新建一条`from → to`的连接
    pub fn connect(&mut self, from: NeuronId, to: NeuronId, weight: Real) -> Result<ConnectionId> {
        self.neuron(from)?;
        if self.neuron(to)?.is_input() {
            return Err(RannError::InvalidTopology(format!(
                "输入神经元`{}`不能作为连接的目标",
                self.neuron(to)?.name()
            )));
        }

        let id = ConnectionId(self.connections.len());
        self.connections.push(Connection {
            id,
            input: from,
            output: to,
            weight: self.precision.round(weight),
            locked: false,
        });
        self.neurons[from.0].outgoing.push(id);
        self.neurons[to.0].incoming.push(id);
        Ok(id)
    }

    /// 锁定连接：其权重不再被优化器更新
    pub fn lock(&mut self, id: ConnectionId) -> Result<()> {
        self.connection_mut(id)?.locked = true;
        Ok(())
    }

    pub fn unlock(&mut self, id: ConnectionId) -> Result<()> {
        self.connection_mut(id)?.locked = false;
        Ok(())
    }

    pub fn set_weight(&mut self, id: ConnectionId, weight: Real) -> Result<()> {
        let weight = self.precision.round(weight);
        self.connection_mut(id)?.weight = weight;
        Ok(())
    }

    /// 在原权重上加上`delta`（优化器更新用）
    pub fn add_to_weight(&mut self, id: ConnectionId, delta: Real) -> Result<()> {
        let precision = self.precision;
        let connection = self.connection_mut(id)?;
        connection.weight = precision.add(connection.weight, delta);
        Ok(())
    }

    fn connection_mut(&mut self, id: ConnectionId) -> Result<&mut Connection> {
        self.connections
            .get_mut(id.0)
            .ok_or(RannError::ConnectionNotFound(id))
    }
}
