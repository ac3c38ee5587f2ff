/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 负责带上下文/乘积神经元的网络及其 BPTT 训练
 */

mod bptt;
mod gradient_check;
mod network;
pub mod optimizer;
pub mod savepoint;
pub mod trainer;

pub use bptt::{
    Gradients, NodeDeltas, SampleInput, SampleTrace, bptt_connecting_to, run_single, trace_single,
};
pub(crate) use bptt::{forward_unroll, squared_error};
pub use gradient_check::GradientChecker;
pub use network::{
    Activation, Connection, ConnectionId, Network, Neuron, NeuronId, NeuronKind, TimestepSnapshot,
};
pub use optimizer::{
    AdaGrad, Optimizer, OptimizerConfig, OptimizerEnum, OptimizerKind, OptimizerState, RmsProp,
};
pub use savepoint::Restored;
pub use trainer::{BatchOptions, Trainer};

#[cfg(test)]
mod tests;
