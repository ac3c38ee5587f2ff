/*
 * @Author       : 老董
 * @Date         : 2026-03-03
 * @Description  : 有限差分梯度检查
 */

use crate::errors::{RannError, Result};
use crate::nn::{forward_unroll, squared_error};
use crate::nn::{Network, SampleInput};
use crate::numeric::{Precision, Real};

/// 用中心差分验证解析梯度
///
/// 对每条连接 i（按声明顺序）：在网络克隆上把权重分别扰动 ±h，
/// 数值梯度 = (E₊ − E₋) / 2h。当
/// |解析 − 数值| > tolerance × max(1, |解析|, |数值|) 时判为不匹配。
#[derive(Debug, Clone, Copy)]
pub struct GradientChecker {
    step: Real,
    precision: Precision,
}

impl GradientChecker {
    pub const DEFAULT_STEP: Real = 1e-4;

    pub const fn new(precision: Precision) -> Self {
        Self {
            step: Self::DEFAULT_STEP,
            precision,
        }
    }

    pub fn with_step(precision: Precision, step: Real) -> Result<Self> {
        if !(step > 0.0) {
            return Err(RannError::InvalidConfig(format!(
                "有限差分步长必须为正数，实际为{step}"
            )));
        }
        Ok(Self { step, precision })
    }

    pub const fn step(&self) -> Real {
        self.step
    }

    /// 返回解析梯度与数值梯度不一致的连接下标（按连接声明顺序）
    pub fn check(
        &self,
        network: &Network,
        input: &SampleInput,
        target: &[Real],
        analytic: &[Real],
    ) -> Result<Vec<usize>> {
        let weights = network.params();
        if analytic.len() != weights.len() {
            return Err(RannError::ShapeMismatch {
                expected: weights.len(),
                got: analytic.len(),
                message: "解析梯度数量与连接数量不一致".to_string(),
            });
        }

        let mut scratch = network.clone();
        scratch.reset_context();
        let tolerance = self.precision.tolerance();
        let mut mismatches = Vec::new();

        for (index, &analytic_gradient) in analytic.iter().enumerate() {
            let mut perturbed = weights.clone();

            perturbed[index] = weights[index] + self.step;
            let error_plus = self.error_with(&mut scratch, &perturbed, input, target)?;
            perturbed[index] = weights[index] - self.step;
            let error_minus = self.error_with(&mut scratch, &perturbed, input, target)?;

            let numeric_gradient = (error_plus - error_minus) / (2.0 * self.step);
            let scale = 1.0_f64
                .max(analytic_gradient.abs())
                .max(numeric_gradient.abs());
            if (analytic_gradient - numeric_gradient).abs() > tolerance * scale {
                mismatches.push(index);
            }
        }
        Ok(mismatches)
    }

    fn error_with(
        &self,
        scratch: &mut Network,
        weights: &[Real],
        input: &SampleInput,
        target: &[Real],
    ) -> Result<Real> {
        scratch.impose(weights)?;
        let result = forward_unroll(scratch, input)
            .and_then(|(_, outputs)| squared_error(self.precision, target, &outputs));
        scratch.reset_context();
        result
    }
}
