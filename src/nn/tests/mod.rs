mod bptt_product;
mod save_load;

use crate::nn::{Activation, ConnectionId, Network, NeuronId, NeuronKind};

/// 1 输入 1 输出、单条权重为`weight`的线性网络
pub(super) fn single_link(weight: f64) -> (Network, ConnectionId) {
    let mut network = Network::with_seed(42);
    let x = network.add_neuron("x", NeuronKind::Input, Activation::Linear);
    let y = network.add_neuron("y", NeuronKind::Output, Activation::Linear);
    let link = network.connect(x, y, weight).expect("连接 x -> y 失败");
    (network, link)
}

/// 2-2-1 前馈网络，隐藏层激活为`hidden`
///
/// 连接声明顺序：x1->h1, x2->h1, x1->h2, x2->h2, h1->o, h2->o
pub(super) fn two_layer(hidden: Activation) -> Network {
    let mut network = Network::with_seed(7);
    let x1 = network.add_neuron("x1", NeuronKind::Input, Activation::Linear);
    let x2 = network.add_neuron("x2", NeuronKind::Input, Activation::Linear);
    let h1 = network.add_neuron("h1", NeuronKind::Hidden, hidden);
    let h2 = network.add_neuron("h2", NeuronKind::Hidden, hidden);
    let o = network.add_neuron("o", NeuronKind::Output, Activation::Linear);
    let weights = [
        (x1, h1, 0.3),
        (x2, h1, -0.2),
        (x1, h2, 0.5),
        (x2, h2, 0.1),
        (h1, o, 0.7),
        (h2, o, -0.4),
    ];
    for (from, to, w) in weights {
        network.connect(from, to, w).expect("连接失败");
    }
    network
}

/// Elman 风格的循环网络：x -> h(tanh) -> o，h -> c（锁定的复制连接），c -> h
///
/// 连接声明顺序：x->h, c->h, h->o, h->c
pub(super) struct Elman {
    pub network: Network,
    pub h: NeuronId,
    pub c: NeuronId,
    pub o: NeuronId,
    pub copy: ConnectionId,
}

pub(super) fn elman() -> Elman {
    let mut network = Network::with_seed(3);
    let x = network.add_neuron("x", NeuronKind::Input, Activation::Linear);
    let h = network.add_neuron("h", NeuronKind::Hidden, Activation::Tanh);
    let c = network.add_neuron("c", NeuronKind::Context, Activation::Linear);
    let o = network.add_neuron("o", NeuronKind::Output, Activation::Linear);
    network.connect(x, h, 0.8).expect("连接 x -> h 失败");
    network.connect(c, h, 0.5).expect("连接 c -> h 失败");
    network.connect(h, o, 1.2).expect("连接 h -> o 失败");
    let copy = network.connect(h, c, 1.0).expect("连接 h -> c 失败");
    network.lock(copy).expect("锁定复制连接失败");
    Elman {
        network,
        h,
        c,
        o,
        copy,
    }
}

/// 两路经隐藏神经元汇入一个乘积神经元：x1 -> a, x2 -> b, a·b -> p -> o
///
/// 连接声明顺序：x1->a, x2->b, a->p, b->p, p->o
pub(super) fn product_net(weights: [f64; 5]) -> (Network, [NeuronId; 4]) {
    let mut network = Network::with_seed(11);
    let x1 = network.add_neuron("x1", NeuronKind::Input, Activation::Linear);
    let x2 = network.add_neuron("x2", NeuronKind::Input, Activation::Linear);
    let a = network.add_neuron("a", NeuronKind::Hidden, Activation::Linear);
    let b = network.add_neuron("b", NeuronKind::Hidden, Activation::Linear);
    let p = network.add_neuron("p", NeuronKind::Product, Activation::Linear);
    let o = network.add_neuron("o", NeuronKind::Output, Activation::Linear);
    let links = [(x1, a), (x2, b), (a, p), (b, p), (p, o)];
    for ((from, to), w) in links.into_iter().zip(weights) {
        network.connect(from, to, w).expect("连接失败");
    }
    (network, [a, b, p, o])
}
