use std::sync::Arc;
use std::thread;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use stockres_core::ProductId;
use stockres_infra::{InMemoryStockStore, ReservationEngine};
use stockres_inventory::{Quantity, ReservationRequest, StockKeys, StockLevels, decide};

/// Stock large enough that no benchmark iteration runs out.
const BOTTOMLESS: i64 = i64::MAX / 4;

fn seeded_engine() -> (ReservationEngine<Arc<InMemoryStockStore>>, StockKeys) {
    let keys = StockKeys::for_product(ProductId::new());
    let store = Arc::new(InMemoryStockStore::new());
    store.seed(&keys, StockLevels::new(BOTTOMLESS, 0)).unwrap();
    (ReservationEngine::new(store), keys)
}

fn bench_decision(c: &mut Criterion) {
    let mut group = c.benchmark_group("decision");
    let amount = Quantity::new(1).unwrap();

    group.bench_function("enough", |b| {
        let levels = Some(StockLevels::new(10, 0));
        b.iter(|| decide(black_box(levels), amount).unwrap());
    });

    group.bench_function("not_enough", |b| {
        let levels = Some(StockLevels::new(0, 10));
        b.iter(|| decide(black_box(levels), amount).unwrap());
    });

    group.finish();
}

fn bench_reserve_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("reserve_latency");
    group.sample_size(1000);

    group.bench_function("raw_keys", |b| {
        let (engine, keys) = seeded_engine();
        let available = keys.available().as_str().to_owned();
        let reserved = keys.reserved().as_str().to_owned();
        b.iter(|| engine.reserve(&available, &reserved, black_box(1)).unwrap());
    });

    group.bench_function("prevalidated_request", |b| {
        let (engine, keys) = seeded_engine();
        let request = ReservationRequest::new(keys, Quantity::new(1).unwrap());
        b.iter(|| engine.reserve_request(black_box(&request)).unwrap());
    });

    group.bench_function("key_not_exist", |b| {
        let engine = ReservationEngine::new(InMemoryStockStore::new());
        b.iter(|| engine.reserve("missing:available", "missing:reserved", 1).unwrap());
    });

    group.finish();
}

fn bench_contended_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_reserve");
    const PER_THREAD: usize = 1_000;

    for threads in [1usize, 4, 16].iter() {
        group.throughput(Throughput::Elements((*threads * PER_THREAD) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(threads), threads, |b, &threads| {
            let (engine, keys) = seeded_engine();
            let engine = Arc::new(engine);
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let engine = engine.clone();
                        let keys = keys.clone();
                        thread::spawn(move || {
                            for _ in 0..PER_THREAD {
                                engine
                                    .reserve(keys.available().as_str(), keys.reserved().as_str(), 1)
                                    .unwrap();
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_decision,
    bench_reserve_latency,
    bench_contended_throughput
);
criterion_main!(benches);
