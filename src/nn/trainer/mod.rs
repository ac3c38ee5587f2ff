/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : 批次编排：分组并行 BPTT、单一归并者、可选梯度检查、优化器更新
 *
 * 一个批次的流程：
 *   1. 把批次切成若干连续分组
 *   2. 固定大小的线程池里每组各持一份网络克隆，逐样本 run_single，
 *      梯度与误差都先除以整个批次的大小再在组内累加
 *   3. 调用线程作为唯一的归并者，从通道里按完成顺序取出各组结果求和
 *   4. （可选）批大小为 1 时做有限差分梯度检查，只记录日志，不阻止更新
 *   5. 按连接声明顺序，对每个累积了梯度的连接应用优化器增量（跳过锁定的连接）
 */

mod options;
mod partition;

pub use options::BatchOptions;
pub use partition::partition;

use crate::errors::{RannError, Result};
use crate::nn::optimizer::{Optimizer, OptimizerEnum};
use crate::nn::savepoint::{self, Restored};
use crate::nn::{GradientChecker, Gradients, Network, SampleInput, run_single};
use crate::numeric::{Precision, Real};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// 一个分组的部分结果
#[derive(Debug, Clone)]
pub struct GroupPartial {
    pub gradients: Gradients,
    pub error: Real,
    pub samples: usize,
}

impl GroupPartial {
    fn new(precision: Precision) -> Self {
        Self {
            gradients: Gradients::new(precision),
            error: 0.0,
            samples: 0,
        }
    }

    fn merge(&mut self, other: &Self, precision: Precision) {
        self.gradients.merge(&other.gradients);
        self.error = precision.add(self.error, other.error);
        self.samples += other.samples;
    }
}

/// 训练器：持有网络与优化器，一次处理一个批次
#[derive(Debug, Clone)]
pub struct Trainer {
    network: Network,
    optimizer: OptimizerEnum,
    checker: GradientChecker,
    /// 最近一次梯度检查发现的不匹配连接下标
    last_mismatches: Vec<usize>,
}

impl Trainer {
    /// 按选项中的`optimiser`与`optimizer`构建优化器
    pub fn new(network: Network, options: &BatchOptions) -> Result<Self> {
        options.validate()?;
        let optimizer =
            OptimizerEnum::from_config(options.optimiser, &options.optimizer, network.precision())?;
        Ok(Self::with_optimizer(network, optimizer))
    }

    pub fn with_optimizer(network: Network, optimizer: OptimizerEnum) -> Self {
        let checker = GradientChecker::new(network.precision());
        Self {
            network,
            optimizer,
            checker,
            last_mismatches: Vec::new(),
        }
    }

    pub fn set_checker(&mut self, checker: GradientChecker) {
        self.checker = checker;
    }

    pub const fn network(&self) -> &Network {
        &self.network
    }

    pub const fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn into_network(self) -> Network {
        self.network
    }

    pub const fn optimizer(&self) -> &OptimizerEnum {
        &self.optimizer
    }

    pub fn last_mismatches(&self) -> &[usize] {
        &self.last_mismatches
    }

    /// 处理一个批次并返回批次平均误差
    ///
    /// 任一样本失败则整个批次失败，网络权重与优化器状态都不改动。
    pub fn run_batch(
        &mut self,
        inputs: &[SampleInput],
        targets: &[Vec<Real>],
        options: &BatchOptions,
    ) -> Result<Real> {
        options.validate()?;
        if inputs.len() != targets.len() {
            return Err(RannError::ShapeMismatch {
                expected: inputs.len(),
                got: targets.len(),
                message: "目标数量与样本数量不一致".to_string(),
            });
        }
        if inputs.is_empty() {
            return Err(RannError::EmptyBatch);
        }
        if options.optimiser != self.optimizer.kind() {
            warn!(
                "批次选项指定的优化器为{}，但训练器已使用{}，沿用后者",
                options.optimiser,
                self.optimizer.kind()
            );
        }

        let reduced = self.compute_batch(inputs, targets, options)?;

        if options.checking {
            self.check_gradients(inputs, targets, &reduced.gradients)?;
        }
        self.apply_updates(&reduced.gradients)?;

        debug!(
            "批次完成：{}个样本，平均误差{}",
            reduced.samples, reduced.error
        );
        Ok(reduced.error)
    }

    /// 并行计算整个批次的平均梯度与平均误差
    fn compute_batch(
        &self,
        inputs: &[SampleInput],
        targets: &[Vec<Real>],
        options: &BatchOptions,
    ) -> Result<GroupPartial> {
        let batch_size = inputs.len();
        let precision = self.network.precision();
        let ranges = partition(batch_size, options.group_count(batch_size));
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.process_count())
            .build()
            .map_err(|e| RannError::WorkerPool(e.to_string()))?;
        debug!(
            "批次大小{batch_size}，分为{}组，{}个工作线程",
            ranges.len(),
            options.process_count()
        );

        let network = &self.network;
        let divisor = batch_size as Real;
        let (sender, receiver) = crossbeam::channel::unbounded::<Result<GroupPartial>>();

        pool.in_place_scope(|scope| {
            for range in ranges {
                let sender = sender.clone();
                let inputs = &inputs[range.clone()];
                let targets = &targets[range];
                scope.spawn(move |_| {
                    // 归并者在所有发送端释放前一直在接收
                    let _ = sender.send(run_group(network, inputs, targets, divisor));
                });
            }
            drop(sender);

            let mut total = GroupPartial::new(precision);
            let mut first_error = None;
            for partial in receiver.iter() {
                match partial {
                    Ok(partial) => total.merge(&partial, precision),
                    Err(e) => {
                        first_error.get_or_insert(e);
                    }
                }
            }
            match first_error {
                Some(e) => Err(e),
                None => Ok(total),
            }
        })
    }

    fn check_gradients(
        &mut self,
        inputs: &[SampleInput],
        targets: &[Vec<Real>],
        gradients: &Gradients,
    ) -> Result<()> {
        if inputs.len() != 1 {
            info!("梯度检查只在批大小为1时执行，本批次{}个样本，跳过", inputs.len());
            self.last_mismatches.clear();
            return Ok(());
        }

        let analytic = gradients.ordered(&self.network);
        let mismatches = self
            .checker
            .check(&self.network, &inputs[0], &targets[0], &analytic)?;
        for &index in &mismatches {
            let connection = &self.network.connections()[index];
            warn!(
                "梯度检查不匹配：连接#{index}（{} -> {}），解析梯度{}",
                self.network.neuron(connection.input())?.name(),
                self.network.neuron(connection.output())?.name(),
                analytic[index]
            );
        }
        self.last_mismatches = mismatches;
        Ok(())
    }

    /// 按连接声明顺序应用优化器增量；锁定的连接与没有累积梯度的连接都不更新
    fn apply_updates(&mut self, gradients: &Gradients) -> Result<()> {
        let updates: Vec<_> = self
            .network
            .connections()
            .iter()
            .filter(|c| !c.is_locked())
            .filter_map(|c| gradients.get(c.id()).map(|gradient| (c.id(), gradient)))
            .collect();
        for (id, gradient) in updates {
            let delta = self.optimizer.update(gradient, id)?;
            self.network.add_to_weight(id, delta)?;
        }
        Ok(())
    }

    // ========== 存档 ==========

    /// 以带时间戳的默认文件名存到`dir`
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        savepoint::save(&self.network, &self.optimizer, dir)
    }

    /// 见 [`savepoint::restore`]
    pub fn restore<P: AsRef<Path>>(&mut self, path: Option<&Path>, dir: P) -> Result<Restored> {
        savepoint::restore(&mut self.network, &mut self.optimizer, path, dir)
    }
}

/// 工作线程里处理一个分组：持有独立的网络克隆，结果已按整个批次的大小归一化
pub fn run_group(
    network: &Network,
    inputs: &[SampleInput],
    targets: &[Vec<Real>],
    batch_size: Real,
) -> Result<GroupPartial> {
    let precision = network.precision();
    let mut network = network.clone();
    network.reset_context();

    let mut partial = GroupPartial::new(precision);
    for (input, target) in inputs.iter().zip(targets) {
        let (gradients, error) = run_single(&mut network, input, target)?;
        partial.gradients.merge(&gradients.divided_by(batch_size)?);
        partial.error = precision.add(partial.error, precision.div(error, batch_size)?);
        partial.samples += 1;
    }
    Ok(partial)
}
