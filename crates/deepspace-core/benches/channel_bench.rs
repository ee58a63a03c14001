//! Criterion benchmarks for the pairing channel.
//!
//! Measures the cost of publishing a pair (two posts under the pairing lock)
//! and of claiming and draining it, single-threaded, so regressions in the
//! lock and queue paths show up without scheduler noise.
//!
//! Run with:
//! ```bash
//! cargo bench --package deepspace-core --bench channel_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use deepspace_core::{CancellationToken, Channel, Message};

fn bench_publish_and_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel/publish_and_drain");

    for batch in [1usize, 64, 1024] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            let cancel = CancellationToken::new();
            b.iter(|| {
                // A fresh channel per iteration keeps the completed-origin set small.
                let channel = Channel::new();
                let hq = channel.register_producer();
                for i in 0..batch as i32 {
                    channel.post_from_headquarters(&hq, Message::new(i, i * 2, "context"));
                    channel.post_from_headquarters(&hq, Message::new(i, i * 2 + 1, "work"));
                }
                for _ in 0..batch {
                    channel.wait_for_pair(&cancel).expect("pair published");
                    black_box(channel.take_for_explorer());
                    black_box(channel.take_for_explorer());
                }
            });
        });
    }

    group.finish();
}

fn bench_sentinel_discard(c: &mut Criterion) {
    let channel = Channel::new();
    let hq = channel.register_producer();
    c.bench_function("channel/sentinel_discard", |b| {
        b.iter(|| black_box(channel.post_from_headquarters(&hq, Message::terminate(1, 1))));
    });
}

fn bench_outbound_round_trip(c: &mut Criterion) {
    let channel = Channel::new();
    c.bench_function("channel/outbound_round_trip", |b| {
        b.iter(|| {
            channel.post_from_explorer(Message::new(1, 2, "digest"));
            black_box(channel.take_for_headquarters())
        });
    });
}

criterion_group!(
    benches,
    bench_publish_and_drain,
    bench_sentinel_discard,
    bench_outbound_round_trip
);
criterion_main!(benches);
