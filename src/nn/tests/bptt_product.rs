/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : 乘积神经元的 BPTT 规则测试
 */

use super::product_net;
use approx::assert_abs_diff_eq;
use crate::assert_err;
use crate::errors::RannError;
use crate::nn::{
    Activation, GradientChecker, Network, NeuronKind, SampleInput, run_single, trace_single,
};

/// 输入 3 与 5、全部单位权重：每个因子的误差项 = 乘积神经元的误差项 × 另一个因子
#[test]
fn test_product_delta_is_scaled_by_other_factor() {
    let (mut network, [a, b, p, o]) = product_net([1.0; 5]);
    let input = SampleInput::Step(vec![3.0, 5.0]);
    let trace = trace_single(&mut network, &input, &[10.0]).expect("BPTT 失败");

    let delta_o = trace.deltas.get(0, o).expect("缺少 o 的误差项");
    let delta_p = trace.deltas.get(0, p).expect("缺少 p 的误差项");
    assert_eq!(delta_o, 5.0);
    assert_eq!(delta_p, 5.0);
    assert_eq!(trace.deltas.get(0, a), Some(delta_p * 5.0));
    assert_eq!(trace.deltas.get(0, b), Some(delta_p * 3.0));

    // 连接声明顺序：x1->a, x2->b, a->p, b->p, p->o
    let ordered = trace.gradients.ordered(&network);
    assert_eq!(ordered, vec![75.0, 75.0, 75.0, 75.0, 75.0]);
}

#[test]
fn test_product_gradients_match_finite_differences() {
    let (mut network, _) = product_net([0.7, -1.3, 0.4, 0.9, 1.5]);
    let input = SampleInput::Step(vec![0.8, 0.6]);
    let target = [0.1];
    let (gradients, _) = run_single(&mut network, &input, &target).expect("BPTT 失败");

    let checker = GradientChecker::new(network.precision());
    let mismatches = checker
        .check(&network, &input, &target, &gradients.ordered(&network))
        .expect("梯度检查失败");
    assert!(mismatches.is_empty(), "不匹配的连接：{mismatches:?}");
}

#[test]
fn test_zero_factor_value_is_a_numeric_error() {
    let (mut network, _) = product_net([1.0; 5]);
    // a 的值为 0 时，乘积对 a 的偏导需要除以 a 的值
    assert_err!(
        run_single(&mut network, &SampleInput::Step(vec![0.0, 5.0]), &[1.0]),
        RannError::Numeric { .. }
    );
}

#[test]
fn test_zero_delta_skips_product_division() {
    let (mut network, _) = product_net([1.0; 5]);
    // 输出恰好等于目标：所有误差项为 0，不做任何除法
    let (gradients, error) =
        run_single(&mut network, &SampleInput::Step(vec![0.0, 5.0]), &[0.0]).expect("BPTT 失败");
    assert_eq!(error, 0.0);
    assert!(gradients.iter().all(|(_, g)| g == 0.0));
}

/// 上下文神经元作为乘积神经元的因子：x -> h，h -> c（锁定的复制连接），c -> p（以及可选的 y -> p），p -> o
fn context_product_net(with_second_factor: bool) -> Network {
    let mut network = Network::with_seed(13);
    let x = network.add_neuron("x", NeuronKind::Input, Activation::Linear);
    let y = with_second_factor.then(|| network.add_neuron("y", NeuronKind::Input, Activation::Linear));
    let h = network.add_neuron("h", NeuronKind::Hidden, Activation::Linear);
    let c = network.add_neuron("c", NeuronKind::Context, Activation::Linear);
    let p = network.add_neuron("p", NeuronKind::Product, Activation::Linear);
    let o = network.add_neuron("o", NeuronKind::Output, Activation::Linear);
    network.connect(x, h, 0.8).expect("连接 x -> h 失败");
    let copy = network.connect(h, c, 1.0).expect("连接 h -> c 失败");
    network.lock(copy).expect("锁定复制连接失败");
    network.connect(c, p, 0.7).expect("连接 c -> p 失败");
    if let Some(y) = y {
        network.connect(y, p, 0.5).expect("连接 y -> p 失败");
    }
    network.connect(p, o, 1.1).expect("连接 p -> o 失败");
    network
}

fn assert_unlocked_match_finite_differences(network: &Network, input: &SampleInput, target: &[f64]) {
    let mut working = network.clone();
    let (gradients, _) = run_single(&mut working, input, target).expect("BPTT 失败");
    let checker = GradientChecker::new(network.precision());
    let mismatches = checker
        .check(network, input, target, &gradients.ordered(network))
        .expect("梯度检查失败");
    for connection in network.connections().iter().filter(|c| !c.is_locked()) {
        assert!(
            !mismatches.contains(&connection.id().0),
            "连接{:?}的梯度与数值梯度不一致",
            connection.id()
        );
    }
}

/// 最后一步 h 的值为 0，但乘积用到的是 c 携带的上一步的值 0.4
#[test]
fn test_context_factor_uses_carried_value() {
    let network = context_product_net(true);
    let input = SampleInput::Sequence(vec![vec![0.5, 1.0], vec![0.0, 1.0]]);
    let target = [0.2];

    let trace = trace_single(&mut network.clone(), &input, &target).expect("BPTT 失败");
    let [c, p, o] = ["c", "p", "o"].map(|name| {
        network
            .neurons()
            .iter()
            .find(|n| n.name() == name)
            .map(|n| n.id())
            .expect("找不到神经元")
    });
    let delta_o = trace.deltas.get(1, o).expect("缺少 o 的误差项");
    assert_abs_diff_eq!(delta_o, 0.154 - 0.2, epsilon = 1e-12);
    let delta_p = trace.deltas.get(1, p).expect("缺少 p 的误差项");
    // c 的“权重”= 乘积 0.14 / 携带值 0.4 = 0.7 × 0.5
    let delta_c = trace.deltas.get(1, c).expect("缺少 c 的误差项");
    assert_abs_diff_eq!(delta_c, delta_p * 0.35, epsilon = 1e-12);

    assert_unlocked_match_finite_differences(&network, &input, &target);
}

#[test]
fn test_single_context_factor_matches_finite_differences() {
    let network = context_product_net(false);
    let input = SampleInput::Sequence(vec![vec![0.5], vec![-0.3]]);
    assert_unlocked_match_finite_differences(&network, &input, &[0.2]);
}

/// 第 0 步 c 携带的值为 0，不向更早的时间步传递
#[test]
fn test_context_factor_at_first_step_contributes_nothing() {
    let network = context_product_net(false);
    let input = SampleInput::Sequence(vec![vec![0.5]]);
    let (gradients, error) =
        run_single(&mut network.clone(), &input, &[0.2]).expect("BPTT 失败");
    assert_abs_diff_eq!(error, 0.02, epsilon = 1e-12);
    // x -> h 只能经由下一步的 c 影响输出
    assert_eq!(gradients.get_or_zero(network.connections()[0].id()), 0.0);
}
