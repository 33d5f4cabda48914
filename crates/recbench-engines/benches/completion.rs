//! Completion throughput of every engine on synthetic rating matrices.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use recbench_core::{prelude::*, test_utils::random_ratings};
use recbench_engines::{Als, AlsConfig, Neighborhood, Popularity, Spectral, SpectralConfig};
use std::time::Duration;

fn bench_engines(c: &mut Criterion) {
    let mut group = c.benchmark_group("completion");
    group.measurement_time(Duration::from_secs(5));

    let engines: Vec<Box<dyn CompletionEngine>> = vec![
        Box::new(Popularity::new()),
        Box::new(Neighborhood::user_based(10)),
        Box::new(Neighborhood::item_based(10)),
        Box::new(Als::new(AlsConfig::new().with_rank(10))),
        Box::new(Spectral::new(SpectralConfig::new().with_rank(10))),
    ];

    for &(n_users, n_items) in &[(50, 40), (200, 100)] {
        let ratings = random_ratings(n_users, n_items, 0.1, 42);
        for engine in &engines {
            group.bench_with_input(
                BenchmarkId::new(engine.name(), format!("{n_users}x{n_items}")),
                &ratings,
                |b, ratings| b.iter(|| engine.complete(black_box(ratings))),
            );
        }
    }

    group.finish();
}

fn bench_single_user(c: &mut Criterion) {
    let ratings = random_ratings(200, 100, 0.1, 7);
    let knn = Neighborhood::user_based(10);

    c.bench_function("knn_user_recommend", |b| {
        b.iter(|| knn.recommend(black_box(&ratings), 17, true))
    });
}

criterion_group!(benches, bench_engines, bench_single_user);
criterion_main!(benches);
