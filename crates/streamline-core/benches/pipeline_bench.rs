//! # Pipeline Benchmarks
//!
//! Sequential vs parallel evaluation for streamline-core pipelines.
//!
//! Run with: `cargo bench -p streamline-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use streamline_core::{ExecMode, collector, source};

const MODES: [ExecMode; 2] = [ExecMode::Sequential, ExecMode::Parallel];

/// Deliberately uneven per-element work so parallel mode has something to split.
fn busy(x: i64) -> i64 {
    (0..(x % 64)).fold(x, |acc, i| acc.wrapping_mul(31).wrapping_add(i))
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_map_filter_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_filter_sum");

    for size in [1_000_i64, 100_000].iter() {
        for mode in MODES {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", mode), size),
                size,
                |b, &size| {
                    b.iter(|| {
                        let total = source::range(0, size)
                            .with_mode(mode)
                            .map(busy)
                            .filter(|x| x % 3 == 0)
                            .sum();
                        black_box(total)
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_sorted(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted");

    for size in [10_000_usize, 200_000].iter() {
        let data: Vec<u64> = (0..*size as u64).map(|i| i.wrapping_mul(2_654_435_761) % 1_000_003).collect();
        for mode in MODES {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", mode), size),
                &data,
                |b, data| {
                    b.iter(|| black_box(source::of(data.clone()).with_mode(mode).sorted().count()));
                },
            );
        }
    }

    group.finish();
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping_by");

    for mode in MODES {
        group.bench_function(format!("{:?}", mode), |b| {
            b.iter(|| {
                let groups = source::range(0, 50_000)
                    .with_mode(mode)
                    .collect(collector::grouping_by_with(|x: &i64| x % 97, collector::counting()));
                black_box(groups.len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_map_filter_sum, bench_sorted, bench_grouping);
criterion_main!(benches);
