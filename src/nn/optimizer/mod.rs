/*
 * @Author       : 老董
 * @Date         : 2026-03-03
 * @Description  : 优化器模块：按连接给出权重增量的有状态更新规则（AdaGrad、RMSProp）
 */

mod adagrad;
mod base;
mod rmsprop;

pub use adagrad::AdaGrad;
pub use base::{Optimizer, OptimizerConfig, OptimizerEnum, OptimizerKind, OptimizerState};
pub use rmsprop::RmsProp;
