//! Benchmarks for the bound engines and the reduction pipeline.
//!
//! Graphs are random layered fragmentation graphs from a fixed seed, so runs
//! are comparable across commits.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use fragprune::bounds::{sebastian_bound, tim_bound, SebastianMode, UpperBounds};
use fragprune::{ColorId, ColoredGraph, ReductionConfig, ReductionScript, ReductionSession};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `layers` colors below the root, `width` vertices per color, and each
/// vertex wired to a random handful of vertices in later layers.
fn layered_graph(layers: u32, width: usize, seed: u64) -> ColoredGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = ColoredGraph::new();
    let root = g.add_vertex(ColorId::new(0));
    let mut by_layer = vec![vec![root]];
    for layer in 1..=layers {
        by_layer.push((0..width).map(|_| g.add_vertex(ColorId::new(layer))).collect());
    }
    for from in 0..by_layer.len() {
        for &u in &by_layer[from] {
            for to in (from + 1)..by_layer.len() {
                for &v in &by_layer[to] {
                    if rng.gen_bool(0.15) || (from == 0 && to == 1) {
                        let w: f64 = rng.gen_range(-4.0..3.0);
                        g.add_edge(u, v, w).expect("generated edge is valid");
                    }
                }
            }
        }
    }
    g.set_root(root).expect("root exists");
    g
}

fn canonical(layers: u32, width: usize) -> ColoredGraph {
    let mut session = ReductionSession::new(layered_graph(layers, width, 7), ReductionConfig::default());
    session.renumber().expect("layered graphs are acyclic");
    session.finish().0
}

/// Tim's bound against both variants of Sebastian's bound.
fn bench_upper_bounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("upper_bounds");
    group.sample_size(10); // smaller sample for speed

    for &(layers, width) in &[(8, 6), (16, 10)] {
        let g = canonical(layers, width);
        let label = format!("{layers}x{width}");
        group.bench_function(BenchmarkId::new("tim", &label), |b| {
            b.iter(|| {
                let mut ub = UpperBounds::unbounded(g.vertex_count());
                tim_bound(black_box(&g), &mut ub).unwrap()
            });
        });
        for (name, mode) in [("sebastian_plain", SebastianMode::Plain), ("sebastian_strong", SebastianMode::Strengthened)] {
            group.bench_function(BenchmarkId::new(name, &label), |b| {
                b.iter(|| {
                    let mut ub = UpperBounds::unbounded(g.vertex_count());
                    sebastian_bound(black_box(&g), &mut ub, mode).unwrap()
                });
            });
        }
    }
    group.finish();
}

/// The fixpoint controller from a fresh copy of the input on every run.
fn bench_default_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    for &(layers, width) in &[(8, 6), (16, 10)] {
        let g = layered_graph(layers, width, 11);
        group.bench_function(BenchmarkId::new("default", format!("{layers}x{width}")), |b| {
            b.iter_batched(
                || g.clone(),
                |g| fragprune::reduce(g, ReductionConfig::default()).unwrap(),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// A script that also runs the lower-bound rules.
fn bench_full_script(c: &mut Criterion) {
    let script = ReductionScript::parse(
        "renumber tim-ubs reduce-vub reduce-unreach * ( clear-ubs seb-ubs tim-ubs reduce-vub \
         reduce-unreach calc-anchor-lbs reduce-colsubtree-adv calc-anchor-lbs calc-slide-lbs \
         reduce-slide-strong calc-implied-edges reduce-unreach )",
    )
    .expect("script parses");
    let g = layered_graph(10, 8, 23);

    c.bench_function("full_script_10x8", |b| {
        b.iter_batched(
            || ReductionSession::new(g.clone(), ReductionConfig::default()),
            |mut session| {
                let deleted = script.run(&mut session).unwrap();
                black_box(deleted)
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10); // smaller sample for speed
    targets = bench_upper_bounds,
              bench_default_pipeline,
              bench_full_script
);
criterion_main!(benches);
