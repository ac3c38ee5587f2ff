/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : 存档：把网络权重与优化器状态存为 JSON 二元数组 [weights, optimizer_state]
 *
 * 默认文件名为 rann_savepoint_<YYYY-MM-DD-HH-MM-SS>，按字典序即按时间先后排列。
 */

use crate::errors::{RannError, Result};
use crate::nn::Network;
use crate::nn::optimizer::{Optimizer, OptimizerState};
use crate::numeric::Real;
use chrono::{Local, NaiveDateTime};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub const SAVEPOINT_PREFIX: &str = "rann_savepoint_";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// `restore`的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restored {
    /// 从该存档恢复
    Loaded(PathBuf),
    /// 没有可用存档，已用`init_normalised`初始化权重
    Initialised,
}

/// 当前时刻的默认存档文件名
pub fn savepoint_name() -> String {
    format!("{SAVEPOINT_PREFIX}{}", Local::now().format(TIMESTAMP_FORMAT))
}

/// 文件名是否为合法的默认存档名
pub fn is_savepoint_name(name: &str) -> bool {
    name.strip_prefix(SAVEPOINT_PREFIX)
        .is_some_and(|stamp| NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok())
}

/// 以默认文件名存到`dir`（目录不存在时会创建），返回存档路径
pub fn save<O: Optimizer, P: AsRef<Path>>(
    network: &Network,
    optimizer: &O,
    dir: P,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(savepoint_name());
    save_to(network, optimizer, &path)?;
    Ok(path)
}

/// 存到指定路径（覆盖已有文件）
pub fn save_to<O: Optimizer, P: AsRef<Path>>(network: &Network, optimizer: &O, path: P) -> Result<()> {
    let path = path.as_ref();
    let text = serde_json::to_string(&(network.params(), optimizer.state()))?;
    fs::write(path, text)?;
    info!("已保存存档：{}", path.display());
    Ok(())
}

/// 从指定存档恢复
///
/// 先校验权重数量与优化器种类，校验失败时网络与优化器都不改动。
pub fn load_from<O: Optimizer, P: AsRef<Path>>(
    network: &mut Network,
    optimizer: &mut O,
    path: P,
) -> Result<()> {
    let text = fs::read_to_string(path.as_ref())?;
    let (weights, state): (Vec<Real>, OptimizerState) = serde_json::from_str(&text)?;

    if state.kind() != optimizer.kind() {
        return Err(RannError::OptimizerStateMismatch {
            expected: optimizer.kind().to_string(),
            got: state.kind().to_string(),
        });
    }
    if weights.len() != network.connections().len() {
        return Err(RannError::ShapeMismatch {
            expected: network.connections().len(),
            got: weights.len(),
            message: "存档中的权重数量与网络连接数量不一致".to_string(),
        });
    }

    network.impose(&weights)?;
    optimizer.load_state(state)
}

/// `dir`中文件名字典序最大（即最新）的默认存档；目录不存在或没有存档时为`None`
pub fn latest_savepoint<P: AsRef<Path>>(dir: P) -> Result<Option<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut latest: Option<(String, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if !is_savepoint_name(&name) || !entry.path().is_file() {
            continue;
        }
        if latest.as_ref().is_none_or(|(best, _)| name > *best) {
            latest = Some((name, entry.path()));
        }
    }
    Ok(latest.map(|(_, path)| path))
}

/// 恢复权重与优化器状态
///
/// - 给出`path`：从该文件恢复
/// - 未给出：取`dir`中最新的默认存档
///
/// 找不到存档不算错误：记录一条警告，用`init_normalised`初始化权重，返回`Restored::Initialised`。
/// 存档存在但内容无效时报错。
pub fn restore<O: Optimizer, P: AsRef<Path>>(
    network: &mut Network,
    optimizer: &mut O,
    path: Option<&Path>,
    dir: P,
) -> Result<Restored> {
    let candidate = match path {
        Some(path) if path.is_file() => Some(path.to_path_buf()),
        Some(path) => {
            warn!("存档{}不存在", path.display());
            None
        }
        None => latest_savepoint(dir.as_ref())?,
    };

    match candidate {
        Some(path) => {
            load_from(network, optimizer, &path)?;
            info!("已从存档恢复：{}", path.display());
            Ok(Restored::Loaded(path))
        }
        None => {
            warn!(
                "{}中没有可用的存档，改用归一化随机初始化",
                dir.as_ref().display()
            );
            network.init_normalised();
            Ok(Restored::Initialised)
        }
    }
}
