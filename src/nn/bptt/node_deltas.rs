use crate::nn::NeuronId;
use crate::numeric::Real;
use std::collections::HashMap;

/// 节点误差项表：(时间步, 神经元) -> delta
///
/// 每个键只写一次（记忆化），读取缺失的键按零处理。
#[derive(Debug, Clone, Default)]
pub struct NodeDeltas {
    deltas: HashMap<(usize, NeuronId), Real>,
}

impl NodeDeltas {
    pub fn contains(&self, timestep: usize, neuron: NeuronId) -> bool {
        self.deltas.contains_key(&(timestep, neuron))
    }

    pub fn get(&self, timestep: usize, neuron: NeuronId) -> Option<Real> {
        self.deltas.get(&(timestep, neuron)).copied()
    }

    pub fn get_or_zero(&self, timestep: usize, neuron: NeuronId) -> Real {
        self.get(timestep, neuron).unwrap_or(0.0)
    }

    pub(crate) fn record(&mut self, timestep: usize, neuron: NeuronId, delta: Real) {
        let previous = self.deltas.insert((timestep, neuron), delta);
        debug_assert!(previous.is_none(), "节点误差项({timestep}, {neuron:?})被重复写入");
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}
