//! Throughput Benchmarks
//!
//! Measures the cache facade's hot paths and the protocol codec. The mixed
//! workload mirrors the classic cache profile of 80% reads / 20% writes.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use embercache::cache::Cache;
use embercache::protocol::{parse_request, Response};

/// Number of distinct keys the benchmarks cycle through.
const KEY_SPACE: usize = 10_000;

fn bench_cache_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("distinct_keys", |b| {
        let cache = Cache::new();
        let mut i = 0usize;
        b.iter(|| {
            let key = format!("key_{}", i % KEY_SPACE);
            cache.set(black_box(key), black_box("value_payload_0123456789".to_string()));
            i += 1;
        });
    });

    group.bench_function("overwrite_same_key", |b| {
        let cache = Cache::new();
        cache.set("hot".to_string(), "initial".to_string());
        b.iter(|| {
            cache.set(
                black_box("hot".to_string()),
                black_box("replacement_value".to_string()),
            );
        });
    });

    group.finish();
}

fn bench_cache_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("hit", |b| {
        let cache = Cache::new();
        for i in 0..KEY_SPACE {
            cache.set(format!("key_{i}"), format!("value_{i}"));
        }
        let mut i = 0usize;
        b.iter(|| {
            let key = format!("key_{}", i % KEY_SPACE);
            black_box(cache.get(black_box(&key)));
            i += 1;
        });
    });

    group.bench_function("miss", |b| {
        let cache = Cache::new();
        b.iter(|| {
            black_box(cache.get(black_box("absent_key")));
        });
    });

    group.finish();
}

fn bench_mixed_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_workload");
    group.throughput(Throughput::Elements(1));

    // 80% reads, 20% writes over a shared key space.
    group.bench_function("read_heavy_80_20", |b| {
        let cache = Cache::new();
        for i in 0..KEY_SPACE {
            cache.set(format!("key_{i}"), format!("value_{i}"));
        }
        let mut i = 0usize;
        b.iter(|| {
            let key = format!("key_{}", (i * 7919) % KEY_SPACE);
            if i % 5 == 0 {
                cache.set(black_box(key), black_box(format!("value_{i}")));
            } else {
                black_box(cache.get(black_box(&key)));
            }
            i += 1;
        });
    });

    group.finish();
}

fn bench_protocol(c: &mut Criterion) {
    let mut group = c.benchmark_group("protocol");
    group.throughput(Throughput::Elements(1));

    group.bench_function("parse_set", |b| {
        b.iter(|| parse_request(black_box("SET session:1234 some session payload here")));
    });

    group.bench_function("parse_get", |b| {
        b.iter(|| parse_request(black_box("GET session:1234")));
    });

    group.bench_function("format_payload_response", |b| {
        let response = Response::with_payload("some session payload here");
        b.iter(|| black_box(&response).to_string());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_cache_set,
    bench_cache_get,
    bench_mixed_workload,
    bench_protocol
);
criterion_main!(benches);
