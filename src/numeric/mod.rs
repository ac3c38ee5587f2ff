/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 定精度数值基座
 *
 * 所有权重、状态、误差、梯度以及优化器状态都经由同一个 `Precision` 计算，
 * 每次乘、除、乘方（以及加减）之后都按有效数字位数舍入，
 * 这样解析梯度与有限差分梯度才能在同一容差内比较。
 */

use crate::errors::{RannError, Result};
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// 全库唯一的标量类型
pub type Real = f64;

/// 定精度（十进制有效数字位数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Precision {
    digits: u32,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            digits: Self::DEFAULT_DIGITS,
        }
    }
}

impl TryFrom<u32> for Precision {
    type Error = RannError;

    fn try_from(digits: u32) -> Result<Self> {
        Self::new(digits)
    }
}

impl From<Precision> for u32 {
    fn from(precision: Precision) -> Self {
        precision.digits
    }
}

impl Precision {
    pub const DEFAULT_DIGITS: u32 = 12;
    /// f64 能可靠表示的最大十进制有效位数
    pub const MAX_DIGITS: u32 = 15;

    pub fn new(digits: u32) -> Result<Self> {
        if digits == 0 || digits > Self::MAX_DIGITS {
            return Err(RannError::InvalidConfig(format!(
                "精度须在[1, {}]范围内，实际为{digits}",
                Self::MAX_DIGITS
            )));
        }
        Ok(Self { digits })
    }

    pub const fn digits(&self) -> u32 {
        self.digits
    }

    /// 比较解析梯度与数值梯度时使用的容差：10^-(digits/2)
    pub fn tolerance(&self) -> Real {
        10f64.powi(-((self.digits / 2) as i32))
    }

    /// 舍入到`digits`位有效数字
    pub fn round(&self, x: Real) -> Real {
        if x == 0.0 || !x.is_finite() {
            return x;
        }
        let magnitude = x.abs().log10().floor() as i32;
        let scale_exp = self.digits as i32 - 1 - magnitude;
        // 极端量级下缩放因子本身会溢出，此时 f64 已经没有多余的位可舍
        if scale_exp.abs() > 290 {
            return x;
        }
        // 缩放因子始终取 10 的正整数次幂，避免 0.01 这类不可精确表示的因子引入误差
        if scale_exp >= 0 {
            let scale = 10f64.powi(scale_exp);
            (x * scale).round() / scale
        } else {
            let scale = 10f64.powi(-scale_exp);
            (x / scale).round() * scale
        }
    }

    pub fn add(&self, a: Real, b: Real) -> Real {
        self.round(a + b)
    }

    pub fn sub(&self, a: Real, b: Real) -> Real {
        self.round(a - b)
    }

    pub fn mul(&self, a: Real, b: Real) -> Real {
        self.round(a * b)
    }

    /// 除法；除数为零属于致命的数值错误
    pub fn div(&self, a: Real, b: Real) -> Result<Real> {
        if b == 0.0 {
            return Err(RannError::div_by_zero(format!("{a} / {b}")));
        }
        Ok(self.round(a / b))
    }

    pub fn powi(&self, a: Real, n: i32) -> Real {
        self.round(a.powi(n))
    }

    pub fn sqrt(&self, a: Real) -> Real {
        self.round(a.sqrt())
    }

    /// 从左到右逐项定精度累加
    pub fn sum<I: IntoIterator<Item = Real>>(&self, values: I) -> Real {
        values.into_iter().fold(0.0, |acc, v| self.add(acc, v))
    }

    /// 从左到右逐项定精度连乘；空序列返回 None
    pub fn product<I: IntoIterator<Item = Real>>(&self, values: I) -> Option<Real> {
        values
            .into_iter()
            .fold(None, |acc, v| Some(acc.map_or(self.round(v), |p| self.mul(p, v))))
    }

    /// 在本精度的容差内判断两个值是否相等
    pub fn approx_eq(&self, a: Real, b: Real) -> bool {
        approx::relative_eq!(
            a,
            b,
            epsilon = self.tolerance(),
            max_relative = self.tolerance()
        )
    }
}
