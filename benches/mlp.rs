use criterion::{Criterion, black_box, criterion_group, criterion_main};

use digit_mlp::{ActivationFunction, Network, Vector, one_hot};

fn digit_network() -> Network {
    Network::new_with_seed(
        &[784, 30, 10],
        &[ActivationFunction::Sigmoid, ActivationFunction::Sigmoid],
        0,
    )
    .unwrap()
}

fn digit_input() -> Vector {
    Vector::from_vec((0..784).map(|i| (i % 256) as f64).collect())
}

fn forwardprop_bench(c: &mut Criterion) {
    let net = digit_network();
    let input = digit_input();

    c.bench_function("forwardprop_784_30_10", |b| {
        b.iter(|| {
            let record = net.forwardprop(black_box(&input)).unwrap();
            black_box(record);
        })
    });
}

fn backprop_bench(c: &mut Criterion) {
    let net = digit_network();
    let record = net.forwardprop(&digit_input()).unwrap();
    let desired = one_hot(3, 10);

    c.bench_function("backprop_784_30_10", |b| {
        b.iter(|| {
            let update = net.backprop(black_box(&record), black_box(&desired)).unwrap();
            black_box(update);
        })
    });
}

fn update_bench(c: &mut Criterion) {
    let mut net = digit_network();
    let desired = one_hot(3, 10);
    let record = net.forwardprop(&digit_input()).unwrap();
    let updates: Vec<_> = (0..20)
        .map(|_| net.backprop(&record, &desired).unwrap())
        .collect();

    c.bench_function("update_network_batch_20", |b| {
        b.iter(|| net.update_network(black_box(&updates), 1e-9).unwrap())
    });
}

criterion_group!(benches, forwardprop_bench, backprop_bench, update_bench);
criterion_main!(benches);
