/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : 存档保存/恢复测试
 */

use super::two_layer;
use crate::assert_err;
use crate::errors::RannError;
use crate::nn::savepoint::{
    SAVEPOINT_PREFIX, is_savepoint_name, latest_savepoint, load_from, restore, save, save_to,
};
use crate::nn::{
    Activation, BatchOptions, ConnectionId, Optimizer, OptimizerConfig, OptimizerEnum,
    OptimizerKind, Restored, SampleInput, Trainer,
};
use crate::numeric::Precision;
use std::fs;

fn optimizer(kind: OptimizerKind) -> OptimizerEnum {
    OptimizerEnum::from_config(kind, &OptimizerConfig::default(), Precision::default())
        .expect("创建优化器失败")
}

#[test]
fn test_save_and_restore_round_trip_exactly() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let mut network = two_layer(Activation::Tanh);
    network.init_normalised();
    let mut rmsprop = optimizer(OptimizerKind::RmsProp);
    rmsprop.update(0.123456789, ConnectionId(0)).expect("更新失败");
    rmsprop.update(-2.5, ConnectionId(4)).expect("更新失败");

    let path = save(&network, &rmsprop, dir.path()).expect("保存失败");
    let name = path.file_name().and_then(|n| n.to_str()).expect("文件名无效");
    assert!(name.starts_with(SAVEPOINT_PREFIX));
    assert!(is_savepoint_name(name));

    let mut restored_network = two_layer(Activation::Tanh);
    let mut restored_optimizer = optimizer(OptimizerKind::RmsProp);
    let restored = restore(&mut restored_network, &mut restored_optimizer, None, dir.path())
        .expect("恢复失败");

    assert_eq!(restored, Restored::Loaded(path));
    assert_eq!(restored_network.params(), network.params());
    assert_eq!(restored_optimizer.state(), rmsprop.state());
}

#[test]
fn test_file_format_is_weights_then_state() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let network = two_layer(Activation::Linear);
    let path = dir.path().join("manual.json");
    save_to(&network, &optimizer(OptimizerKind::AdaGrad), &path).expect("保存失败");

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("读取失败")).expect("解析失败");
    let items = json.as_array().expect("存档应为数组");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_array().map(Vec::len), Some(6));
    assert!(items[1].get("AdaGrad").is_some());
}

#[test]
fn test_restore_picks_latest_savepoint() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let adagrad = optimizer(OptimizerKind::AdaGrad);

    let mut older = two_layer(Activation::Linear);
    older.impose(&[1.0; 6]).expect("设置权重失败");
    let mut newer = two_layer(Activation::Linear);
    newer.impose(&[2.0; 6]).expect("设置权重失败");

    let older_path = dir.path().join(format!("{SAVEPOINT_PREFIX}2025-01-31-23-59-59"));
    let newer_path = dir.path().join(format!("{SAVEPOINT_PREFIX}2026-02-01-08-00-00"));
    save_to(&newer, &adagrad, &newer_path).expect("保存失败");
    save_to(&older, &adagrad, &older_path).expect("保存失败");
    // 不符合默认文件名格式的文件被忽略
    fs::write(dir.path().join(format!("{SAVEPOINT_PREFIX}latest")), "[]").expect("写入失败");
    fs::write(dir.path().join("zzz_notes.txt"), "notes").expect("写入失败");

    assert_eq!(
        latest_savepoint(dir.path()).expect("查找失败"),
        Some(newer_path.clone())
    );

    let mut network = two_layer(Activation::Linear);
    let mut target = optimizer(OptimizerKind::AdaGrad);
    let restored = restore(&mut network, &mut target, None, dir.path()).expect("恢复失败");
    assert_eq!(restored, Restored::Loaded(newer_path));
    assert_eq!(network.params(), vec![2.0; 6]);

    // 显式给出路径时用该路径
    let restored = restore(&mut network, &mut target, Some(older_path.as_path()), dir.path())
        .expect("恢复失败");
    assert_eq!(restored, Restored::Loaded(older_path));
    assert_eq!(network.params(), vec![1.0; 6]);
}

#[test]
fn test_missing_savepoint_falls_back_to_init() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let mut network = two_layer(Activation::Linear);
    network.impose(&[0.0; 6]).expect("设置权重失败");
    let mut rmsprop = optimizer(OptimizerKind::RmsProp);

    let restored = restore(&mut network, &mut rmsprop, None, dir.path()).expect("恢复失败");
    assert_eq!(restored, Restored::Initialised);
    assert!(network.params().iter().all(|&w| w != 0.0));

    // 不存在的目录与不存在的显式路径同样回退
    let missing = dir.path().join("nowhere");
    let restored = restore(&mut network, &mut rmsprop, None, &missing).expect("恢复失败");
    assert_eq!(restored, Restored::Initialised);
    let restored = restore(
        &mut network,
        &mut rmsprop,
        Some(missing.join("rann_savepoint_2026-01-01-00-00-00").as_path()),
        dir.path(),
    )
    .expect("恢复失败");
    assert_eq!(restored, Restored::Initialised);
}

#[test]
fn test_load_rejects_mismatched_savepoints() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let network = two_layer(Activation::Linear);
    let path = dir.path().join("adagrad.json");
    save_to(&network, &optimizer(OptimizerKind::AdaGrad), &path).expect("保存失败");

    let mut target = two_layer(Activation::Linear);
    target.impose(&[9.0; 6]).expect("设置权重失败");
    let mut rmsprop = optimizer(OptimizerKind::RmsProp);
    assert_err!(
        load_from(&mut target, &mut rmsprop, &path),
        RannError::OptimizerStateMismatch { .. }
    );
    // 校验失败时不改动网络
    assert_eq!(target.params(), vec![9.0; 6]);

    let (mut small, _) = super::single_link(1.0);
    let mut adagrad = optimizer(OptimizerKind::AdaGrad);
    assert_err!(
        load_from(&mut small, &mut adagrad, &path),
        RannError::ShapeMismatch(1, 6)
    );

    let corrupt = dir.path().join("corrupt.json");
    fs::write(&corrupt, "{ not json").expect("写入失败");
    assert_err!(
        load_from(&mut target, &mut adagrad, &corrupt),
        RannError::Format(_)
    );
}

#[test]
fn test_trainer_save_and_restore() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let options = BatchOptions::default();
    let mut trainer =
        Trainer::new(two_layer(Activation::Sigmoid), &options).expect("创建训练器失败");
    trainer
        .run_batch(
            &[SampleInput::Step(vec![0.4, -0.2])],
            &[vec![0.9]],
            &options,
        )
        .expect("批次失败");
    trainer.save(dir.path()).expect("保存失败");

    let mut other =
        Trainer::new(two_layer(Activation::Sigmoid), &options).expect("创建训练器失败");
    let restored = other.restore(None, dir.path()).expect("恢复失败");
    assert!(matches!(restored, Restored::Loaded(_)));
    assert_eq!(other.network().params(), trainer.network().params());
    assert_eq!(other.optimizer().state(), trainer.optimizer().state());
}
