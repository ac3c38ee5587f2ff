/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : Network 逐时间步前向求值（evaluate, reset, reset_context）
 *
 * 一个时间步内的顺序：
 *   1. 输入神经元取输入向量的值
 *   2. 隐藏/输出/乘积神经元按拓扑序求值；读取上下文神经元时取其“带入值”
 *   3. 上下文神经元用本步的值算出新值（记入本步快照，并在 reset() 时带入下一步）
 */

use super::{Network, NeuronId, NeuronKind, TimestepSnapshot};
use crate::errors::{RannError, Result};
use crate::numeric::Real;
use std::collections::VecDeque;

impl Network {
    /// 执行一个时间步的前向传播，返回输出向量（按输出神经元声明顺序）
    ///
    /// 在调用 `reset()` 之前重复调用只会重算同一个时间步。
    pub fn evaluate(&mut self, input: &[Real]) -> Result<Vec<Real>> {
        if input.len() != self.input_neurons.len() {
            return Err(RannError::ShapeMismatch {
                expected: self.input_neurons.len(),
                got: input.len(),
                message: "输入向量长度与输入神经元数量不一致".to_string(),
            });
        }

        self.values.clear();
        self.intermediates.clear();
        for (&id, &x) in self.input_neurons.iter().zip(input) {
            self.values.insert(id, self.precision.round(x));
        }

        for id in self.evaluation_order()? {
            self.compute_neuron(id)?;
        }

        // 上下文神经元必须基于同一份状态求值，先收集再写入
        let produced = self
            .neurons
            .iter()
            .filter(|n| n.is_context())
            .map(|n| {
                let net_input = self.weighted_sum(n.id)?;
                Ok((n.id, n.activation.apply(net_input, self.precision)))
            })
            .collect::<Result<Vec<_>>>()?;
        self.values.extend(produced);

        self.output_neurons
            .iter()
            .map(|&id| self.current_value(id))
            .collect()
    }

    /// 结束当前时间步：返回本步快照并清空瞬时状态，上下文神经元的值被带入下一步
    pub fn reset(&mut self) -> TimestepSnapshot {
        for neuron in self.neurons.iter().filter(|n| n.is_context()) {
            if let Some(&value) = self.values.get(&neuron.id) {
                self.carried.insert(neuron.id, value);
            }
        }
        TimestepSnapshot {
            values: std::mem::take(&mut self.values),
            intermediates: std::mem::take(&mut self.intermediates),
        }
    }

    /// 清零上下文状态（以及尚未 reset 的瞬时状态），用于样本之间
    pub fn reset_context(&mut self) {
        self.carried.clear();
        self.values.clear();
        self.intermediates.clear();
    }

    /// 上下文神经元当前带入的值（序列开始前为 0）
    pub fn carried_value(&self, neuron: NeuronId) -> Real {
        self.carried.get(&neuron).copied().unwrap_or(0.0)
    }

    /// 隐藏/输出/乘积神经元的求值顺序
    ///
    /// 只考虑源神经元不是输入/上下文神经元的连接（这两类的值在求值前已确定），
    /// 这部分子图必须无环。
    fn evaluation_order(&self) -> Result<Vec<NeuronId>> {
        let is_computed = |kind: NeuronKind| {
            matches!(
                kind,
                NeuronKind::Hidden | NeuronKind::Output | NeuronKind::Product
            )
        };

        let mut pending = vec![0usize; self.neurons.len()];
        for connection in &self.connections {
            let source = &self.neurons[connection.input.0];
            if is_computed(source.kind) && is_computed(self.neurons[connection.output.0].kind) {
                pending[connection.output.0] += 1;
            }
        }

        let mut ready: VecDeque<NeuronId> = self
            .neurons
            .iter()
            .filter(|n| is_computed(n.kind) && pending[n.id.0] == 0)
            .map(|n| n.id)
            .collect();
        let total = self.neurons.iter().filter(|n| is_computed(n.kind)).count();

        let mut order = Vec::with_capacity(total);
        while let Some(id) = ready.pop_front() {
            order.push(id);
            for connection_id in &self.neurons[id.0].outgoing {
                let target = self.connections[connection_id.0].output;
                if is_computed(self.neurons[target.0].kind) {
                    pending[target.0] -= 1;
                    if pending[target.0] == 0 {
                        ready.push_back(target);
                    }
                }
            }
        }

        if order.len() != total {
            return Err(RannError::InvalidTopology(
                "前馈部分存在环：环路必须经过上下文神经元".to_string(),
            ));
        }
        Ok(order)
    }

    fn compute_neuron(&mut self, id: NeuronId) -> Result<()> {
        let neuron = &self.neurons[id.0];
        let activation = neuron.activation;
        let value = match neuron.kind {
            NeuronKind::Hidden | NeuronKind::Output => {
                activation.apply(self.weighted_sum(id)?, self.precision)
            }
            NeuronKind::Product => {
                let factors = self
                    .connections_to(id)?
                    .map(|c| Ok(self.precision.mul(c.weight, self.source_value(c.input)?)))
                    .collect::<Result<Vec<_>>>()?;
                let intermediate = self.precision.product(factors).ok_or_else(|| {
                    RannError::InvalidTopology(format!(
                        "乘积神经元`{}`至少需要一个输入连接",
                        neuron.name
                    ))
                })?;
                self.intermediates.insert(id, intermediate);
                activation.apply(intermediate, self.precision)
            }
            // 输入与上下文神经元不在求值顺序中
            NeuronKind::Input | NeuronKind::Context => return Ok(()),
        };
        self.values.insert(id, value);
        Ok(())
    }

    /// Σ weight × 源神经元的值
    fn weighted_sum(&self, id: NeuronId) -> Result<Real> {
        let terms = self
            .connections_to(id)?
            .map(|c| Ok(self.precision.mul(c.weight, self.source_value(c.input)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.precision.sum(terms))
    }

    /// 作为连接源时神经元提供的值：上下文神经元给出带入值，其余给出本步的值
    fn source_value(&self, id: NeuronId) -> Result<Real> {
        if self.neuron(id)?.is_context() {
            Ok(self.carried_value(id))
        } else {
            self.current_value(id)
        }
    }

    fn current_value(&self, id: NeuronId) -> Result<Real> {
        self.values.get(&id).copied().ok_or_else(|| {
            RannError::InvalidTopology(format!(
                "神经元`{}`在本时间步尚未求值",
                self.neurons[id.0].name
            ))
        })
    }
}
