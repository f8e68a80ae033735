use pgraph_canon::prelude::*;
use testing::{randomize_labels, NetIter, NetSpec};

use criterion::{BatchSize, black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256Plus;

fn build(net: &NetSpec) -> PeriodicGraph {
    PeriodicGraph::from_edges(net.dim, net.nodes, net.edges.iter().cloned()).unwrap()
}

fn same_keys(nets: impl IntoIterator<Item = (NetSpec, NetSpec)>) -> bool {
    nets.into_iter().all(|(g, h)| {
        build(&g).systre_key().unwrap() == build(&h).systre_key().unwrap()
    })
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = Xoshiro256Plus::seed_from_u64(0);

    let known = [
        testing::hcb(),
        testing::pcu(),
        testing::dia(),
        testing::srs(),
        testing::cds(),
        testing::cds_primitive(),
    ];
    let nets = Vec::from_iter(
        known.iter()
            .map(|net| (net.clone(), randomize_labels(net.clone(), &mut rng)))
    );
    c.bench_function("known nets", move |b| {
        b.iter_batched(|| nets.clone(), |n| same_keys(black_box(n)), BatchSize::SmallInput)
    });

    let nets = Vec::from_iter(
        NetIter::default()
            .filter(|net| {
                let g = build(net);
                g.is_connected().unwrap() && g.is_locally_stable().unwrap()
            })
            .take(100)
            .map(|net| (net.clone(), randomize_labels(net, &mut rng))),
    );
    c.bench_function("random nets", move |b| {
        b.iter_batched(|| nets.clone(), |n| same_keys(black_box(n)), BatchSize::SmallInput)
    });

    // clones would carry the cached group
    c.bench_function("dia symmetries", move |b| {
        b.iter_batched(
            || build(&testing::dia()),
            |g| black_box(g).symmetries().unwrap().len(),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
