//! # Rann
//!
//! `rann`用纯rust实现带**上下文神经元**（context，循环反馈单元）和**乘积神经元**（product，乘法组合单元）的
//! 神经网络训练：逐样本的通过时间反向传播（BPTT）、按组并行的批量梯度计算，以及可插拔的有状态优化器。
//!

pub mod errors;
pub mod nn;
pub mod numeric;
pub mod utils;

pub use errors::{RannError, Result};
pub use numeric::{Precision, Real};
