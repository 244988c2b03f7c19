// Benchmarks for order book operations
//
// Tests:
// - submit_limit latency (empty book, at depth, crossing)
// - submit_market latency
// - cancel latency
// - snapshot latency

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use book::Book;
use common::Side;

fn bench_submit_limit(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_limit");

    group.bench_function("rest_single_order", |b| {
        let mut order_book = Book::new();
        let mut price = 10_000i64;
        b.iter(|| {
            let result = order_book.submit_limit(black_box(Side::Buy), black_box(price), black_box(100));
            black_box(result.unwrap());
            price += 1;
        });
    });

    for depth in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("rest_at_depth", depth), depth, |b, &depth| {
            let mut order_book = Book::new();
            for i in 0..depth {
                order_book.submit_limit(Side::Buy, 10_000 - i as i64, 100).unwrap();
            }
            b.iter(|| {
                let result = order_book.submit_limit(black_box(Side::Buy), black_box(9_000), black_box(100));
                black_box(result.unwrap());
            });
        });
    }

    group.bench_function("cross_opposite_side", |b| {
        b.iter_batched(
            || {
                let mut order_book = Book::new();
                order_book.submit_limit(Side::Sell, 10_000, 1_000_000).unwrap();
                order_book
            },
            |mut order_book| {
                let result = order_book.submit_limit(black_box(Side::Buy), black_box(10_000), black_box(100));
                black_box(result.unwrap());
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_submit_market(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_market");

    group.bench_function("sweep_single_level", |b| {
        b.iter_batched(
            || {
                let mut order_book = Book::new();
                order_book.submit_limit(Side::Sell, 10_000, 1_000_000).unwrap();
                order_book
            },
            |mut order_book| {
                let filled = order_book.submit_market(black_box(Side::Buy), black_box(100));
                black_box(filled.unwrap());
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_cancel(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancel");

    for depth in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("cancel_at_depth", depth), depth, |b, &depth| {
            b.iter_batched(
                || {
                    let mut order_book = Book::new();
                    let mut ids = Vec::with_capacity(depth);
                    for i in 0..depth {
                        ids.push(order_book.submit_limit(Side::Buy, 10_000 - i as i64, 100).unwrap());
                    }
                    (order_book, ids)
                },
                |(mut order_book, ids)| {
                    for id in ids {
                        order_book.cancel(black_box(id));
                    }
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");

    for depth in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("snapshot_at_depth", depth), depth, |b, &depth| {
            let mut order_book = Book::new();
            for i in 0..depth {
                order_book.submit_limit(Side::Buy, 10_000 - i as i64, 100).unwrap();
                order_book.submit_limit(Side::Sell, 11_000 + i as i64, 100).unwrap();
            }
            b.iter(|| black_box(order_book.snapshot(black_box(10))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_submit_limit, bench_submit_market, bench_cancel, bench_snapshot);
criterion_main!(benches);
