//! Store query benchmarks
//!
//! Run with: cargo bench

use a3s_calendar::{Event, EventStore, MemoryEventStore};
use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use uuid::Uuid;

fn seeded_store(rt: &tokio::runtime::Runtime, count: i64) -> MemoryEventStore {
    let store = MemoryEventStore::new();
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    rt.block_on(async {
        for i in 0..count {
            let start = base + Duration::minutes(37 * i);
            let event = Event::new(
                format!("event-{i}"),
                "",
                start,
                start + Duration::minutes(30),
                Uuid::new_v4(),
            );
            store.create(&event).await.unwrap();
        }
    });
    store
}

fn bench_window_queries(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let date = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();

    let mut group = c.benchmark_group("window_queries");
    for count in [1_000i64, 10_000] {
        let store = seeded_store(&rt, count);

        group.bench_with_input(BenchmarkId::new("list_by_day", count), &store, |b, store| {
            b.to_async(&rt).iter(|| async move { store.list_by_day(date).await.unwrap() });
        });
        group.bench_with_input(BenchmarkId::new("list_by_month", count), &store, |b, store| {
            b.to_async(&rt).iter(|| async move { store.list_by_month(date).await.unwrap() });
        });
    }
    group.finish();
}

fn bench_list_all(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = seeded_store(&rt, 10_000);
    let store = &store;

    c.bench_function("list_all 10k", |b| {
        b.to_async(&rt).iter(|| async move { store.list_all().await.unwrap() });
    });
}

criterion_group!(benches, bench_window_queries, bench_list_all);
criterion_main!(benches);
