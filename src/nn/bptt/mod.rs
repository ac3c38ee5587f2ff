/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : BPTT（通过时间反向传播）引擎：单个样本的误差与逐连接梯度
 */

mod gradients;
mod node_deltas;

pub use gradients::Gradients;
pub use node_deltas::NodeDeltas;

use crate::errors::{RannError, Result};
use crate::nn::{Network, Neuron, NeuronId, TimestepSnapshot};
use crate::numeric::{Precision, Real};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// 一个样本的输入：单个特征向量（一个时间步），或按时间先后排列的特征向量序列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleInput {
    Step(Vec<Real>),
    Sequence(Vec<Vec<Real>>),
}

impl SampleInput {
    /// 按时间顺序的各步输入
    pub fn timesteps(&self) -> &[Vec<Real>] {
        match self {
            Self::Step(input) => std::slice::from_ref(input),
            Self::Sequence(inputs) => inputs,
        }
    }
}

impl From<Vec<Real>> for SampleInput {
    fn from(input: Vec<Real>) -> Self {
        Self::Step(input)
    }
}

impl From<Vec<Vec<Real>>> for SampleInput {
    fn from(inputs: Vec<Vec<Real>>) -> Self {
        Self::Sequence(inputs)
    }
}

/// 单个样本反向传播的完整记录（梯度之外还保留快照与节点误差项，供检查与测试）
#[derive(Debug, Clone)]
pub struct SampleTrace {
    pub gradients: Gradients,
    pub error: Real,
    pub outputs: Vec<Real>,
    pub snapshots: Vec<TimestepSnapshot>,
    pub deltas: NodeDeltas,
}

/// 计算一个样本的逐连接梯度与误差
///
/// `targets`只对应最后一个时间步的输出。无论成功与否，返回前都会清零网络的上下文状态。
///
/// # 示例
/// ```ignore
/// let (gradients, error) = run_single(&mut network, &SampleInput::Step(vec![3.0]), &[5.0])?;
/// ```
pub fn run_single(
    network: &mut Network,
    inputs: &SampleInput,
    targets: &[Real],
) -> Result<(Gradients, Real)> {
    let trace = trace_single(network, inputs, targets)?;
    Ok((trace.gradients, trace.error))
}

/// 同 `run_single`，但返回完整的反向传播记录
pub fn trace_single(
    network: &mut Network,
    inputs: &SampleInput,
    targets: &[Real],
) -> Result<SampleTrace> {
    let result = unroll_and_backprop(network, inputs, targets);
    network.reset_context();
    result
}

fn unroll_and_backprop(
    network: &mut Network,
    inputs: &SampleInput,
    targets: &[Real],
) -> Result<SampleTrace> {
    let (snapshots, outputs) = forward_unroll(network, inputs)?;
    let error = squared_error(network.precision(), targets, &outputs)?;

    let mut backprop = Backprop::new(network, &snapshots, &outputs, targets);
    backprop.run()?;
    let Backprop {
        deltas, gradients, ..
    } = backprop;

    Ok(SampleTrace {
        gradients,
        error,
        outputs,
        snapshots,
        deltas,
    })
}

/// 前向展开：逐时间步 evaluate + reset，返回各步快照与最后一步的输出向量
pub(crate) fn forward_unroll(
    network: &mut Network,
    inputs: &SampleInput,
) -> Result<(Vec<TimestepSnapshot>, Vec<Real>)> {
    let steps = inputs.timesteps();
    if steps.is_empty() {
        return Err(RannError::EmptySequence);
    }

    let mut snapshots = Vec::with_capacity(steps.len());
    let mut outputs = Vec::new();
    for (t, input) in steps.iter().enumerate() {
        let step_outputs = network.evaluate(input)?;
        if t + 1 == steps.len() {
            outputs = step_outputs;
        }
        snapshots.push(network.reset());
    }
    Ok((snapshots, outputs))
}

/// 误差：Σ (target − output)² / 2
pub(crate) fn squared_error(precision: Precision, targets: &[Real], outputs: &[Real]) -> Result<Real> {
    if targets.len() != outputs.len() {
        return Err(RannError::ShapeMismatch {
            expected: outputs.len(),
            got: targets.len(),
            message: "目标向量长度与网络输出长度不一致".to_string(),
        });
    }
    Ok(precision.sum(targets.iter().zip(outputs).map(|(&target, &output)| {
        precision.mul(precision.powi(precision.sub(target, output), 2), 0.5)
    })))
}

/// BPTT 的前驱：处理`(neuron, timestep)`之前需要入队的`(源神经元, 时间步)`
///
/// - 第 0 步的上下文神经元没有前驱（递归在循环边界处终止）
/// - 源为输入神经元的连接被跳过（输入没有上游梯度路径）
/// - 上下文神经元的源位于上一时间步
pub fn bptt_connecting_to(
    neuron: NeuronId,
    network: &Network,
    timestep: usize,
) -> Result<Vec<(NeuronId, usize)>> {
    let target = network.neuron(neuron)?;
    if target.is_context() && timestep == 0 {
        return Ok(Vec::new());
    }
    let source_timestep = if target.is_context() {
        timestep - 1
    } else {
        timestep
    };

    let mut predecessors = Vec::new();
    for connection in network.connections_to(neuron)? {
        if network.neuron(connection.input())?.is_input() {
            continue;
        }
        predecessors.push((connection.input(), source_timestep));
    }
    Ok(predecessors)
}

/// 一次反向传播的工作状态
struct Backprop<'a> {
    network: &'a Network,
    snapshots: &'a [TimestepSnapshot],
    outputs: &'a [Real],
    targets: &'a [Real],
    precision: Precision,
    /// 输出神经元 -> 其在输出向量中的下标
    output_index: HashMap<NeuronId, usize>,
    deltas: NodeDeltas,
    gradients: Gradients,
}

impl<'a> Backprop<'a> {
    fn new(
        network: &'a Network,
        snapshots: &'a [TimestepSnapshot],
        outputs: &'a [Real],
        targets: &'a [Real],
    ) -> Self {
        let precision = network.precision();
        Self {
            network,
            snapshots,
            outputs,
            targets,
            precision,
            output_index: network
                .output_neurons()
                .iter()
                .enumerate()
                .map(|(i, &id)| (id, i))
                .collect(),
            deltas: NodeDeltas::default(),
            gradients: Gradients::new(precision),
        }
    }

    /// 从最后一个时间步的各输出神经元出发，按 FIFO（广度优先）逆向展开
    fn run(&mut self) -> Result<()> {
        let final_timestep = self.snapshots.len() - 1;
        let mut queue: VecDeque<(NeuronId, usize)> = self
            .network
            .output_neurons()
            .iter()
            .map(|&id| (id, final_timestep))
            .collect();

        let network = self.network;
        while let Some((id, timestep)) = queue.pop_front() {
            if self.deltas.contains(timestep, id) {
                continue;
            }
            queue.extend(bptt_connecting_to(id, network, timestep)?);

            let neuron = network.neuron(id)?;
            let step_one = self.step_one(neuron, timestep)?;
            let value = self.value(id, timestep)?;
            let derivative = neuron.activation().derivative(value, self.precision);
            let delta = self.precision.mul(derivative, step_one);
            self.deltas.record(timestep, id, delta);

            self.accumulate_gradients(neuron, timestep, delta)?;
        }
        Ok(())
    }

    /// 激活函数导数之前的那一项：输出神经元为 (实际 − 目标)，其余为下游误差项的加权和
    fn step_one(&self, neuron: &Neuron, timestep: usize) -> Result<Real> {
        let p = self.precision;
        if let Some(&index) = self.output_index.get(&neuron.id()) {
            return Ok(p.sub(self.outputs[index], self.targets[index]));
        }

        let mut total = 0.0;
        for connection in self.network.connections_from(neuron.id())? {
            let downstream = self.network.neuron(connection.output())?;
            let downstream_timestep = if downstream.is_context() {
                timestep + 1
            } else {
                timestep
            };
            let downstream_delta = self.deltas.get_or_zero(downstream_timestep, downstream.id());
            if downstream_delta == 0.0 {
                continue;
            }

            // 对乘积神经元，“权重”换成 乘积 / 本神经元的值（即其余因子之积）
            let contribution = if downstream.is_product() {
                // 上下文神经元交给乘积的是它携带的值，即上一时间步记录的值；第 0 步携带 0
                let factor = if !neuron.is_context() {
                    self.value(neuron.id(), timestep)?
                } else if timestep == 0 {
                    continue;
                } else {
                    self.value(neuron.id(), timestep - 1)?
                };
                let intermediate = self.intermediate(downstream.id(), downstream_timestep)?;
                p.div(intermediate, factor)?
            } else {
                connection.weight()
            };
            total = p.add(total, p.mul(downstream_delta, contribution));
        }
        Ok(total)
    }

    /// 把本神经元的误差项分摊到每条输入连接的梯度上
    fn accumulate_gradients(&mut self, neuron: &Neuron, timestep: usize, delta: Real) -> Result<()> {
        let p = self.precision;
        let network = self.network;
        for connection in network.connections_to(neuron.id())? {
            let source = network.neuron(connection.input())?;
            let gradient = if delta == 0.0 {
                0.0
            } else if neuron.is_product() {
                // 乘积对某个因子的偏导 = 其余因子之积 = 乘积 / 该因子的权重
                let intermediate = self.intermediate(neuron.id(), timestep)?;
                p.mul(delta, p.div(intermediate, connection.weight())?)
            } else if source.is_context() {
                if timestep == 0 {
                    0.0
                } else {
                    p.mul(delta, self.value(source.id(), timestep - 1)?)
                }
            } else {
                p.mul(delta, self.value(source.id(), timestep)?)
            };
            self.gradients.add(connection.id(), gradient);
        }
        Ok(())
    }

    fn value(&self, neuron: NeuronId, timestep: usize) -> Result<Real> {
        self.snapshots
            .get(timestep)
            .and_then(|s| s.value(neuron))
            .ok_or(RannError::MissingTimestepData { timestep, neuron })
    }

    fn intermediate(&self, neuron: NeuronId, timestep: usize) -> Result<Real> {
        self.snapshots
            .get(timestep)
            .and_then(|s| s.intermediate(neuron))
            .ok_or(RannError::MissingTimestepData { timestep, neuron })
    }
}
