//! Criterion benchmarks for the decode transform.
//!
//! Decoding is the only step explorers run outside every lock, so its cost
//! bounds how much parallelism additional explorers can buy.
//!
//! Run with:
//! ```bash
//! cargo bench --package deepspace-core --bench transform_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deepspace_core::{decode, Sha256Transform, Transform};

fn bench_single_digest(c: &mut Criterion) {
    c.bench_function("transform/sha256_single", |b| {
        b.iter(|| Sha256Transform.apply(black_box("frequency-1")));
    });
}

fn bench_decode_rounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform/decode_rounds");
    for rounds in [1u32, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(rounds), &rounds, |b, &rounds| {
            b.iter(|| decode(&Sha256Transform, black_box("frequency-1"), rounds));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_digest, bench_decode_rounds);
criterion_main!(benches);
