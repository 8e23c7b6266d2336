use criterion::{Criterion, black_box, criterion_group, criterion_main};
use vx_rbf::network::{ClusterModel, OutputWeights, RbfNetwork};

fn network(units: usize, dims: usize) -> RbfNetwork {
    let centers = (0..units)
        .map(|j| (0..dims).map(|d| ((j * dims + d) % 7) as f32 / 7.0).collect())
        .collect();
    let clusters = ClusterModel::new(centers, vec![0.4; units]).expect("valid bench model");
    RbfNetwork::from_parts(
        clusters,
        OutputWeights {
            weights: vec![0.1; units],
            bias: 0.2,
        },
    )
    .expect("valid bench network")
}

fn bench_evaluate(c: &mut Criterion) {
    let net = network(17, 17);
    let x = vec![0.5f32; 17];
    c.bench_function("evaluate_17x17", |b| {
        b.iter(|| net.evaluate(black_box(&x)));
    });
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
