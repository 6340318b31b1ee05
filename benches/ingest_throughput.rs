use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hotwords::{Aggregator, EngineConfig, IngestPool, WhitespaceTokenizer};
use std::sync::Arc;

fn generate_lines(count: usize) -> Vec<String> {
    let words = [
        "latency", "throughput", "pipeline", "concurrency", "aggregate", "window", "bucket",
        "stream",
    ];
    (0..count)
        .map(|i| {
            let sec = i % 60;
            let w1 = words[i % words.len()];
            let w2 = words[(i * 7 + 3) % words.len()];
            format!("[12:00:{sec:02}] {w1} {w2}")
        })
        .collect()
}

fn run_pool(lines: &[String], num_threads: usize, batch_size: usize) -> Arc<Aggregator> {
    let config = EngineConfig::default()
        .with_batch_size(batch_size)
        .with_num_threads(num_threads);
    let aggregator = Arc::new(Aggregator::new(config.window_ms));
    let pool = IngestPool::new(
        Arc::clone(&aggregator),
        Arc::new(WhitespaceTokenizer),
        &config,
    )
    .expect("pool construction failed");

    pool.start(num_threads);
    for line in lines {
        let _ = pool.push_task(line.clone());
    }
    pool.stop_and_wait().expect("shutdown failed");
    aggregator
}

fn benchmark_single_worker(c: &mut Criterion) {
    let lines = generate_lines(10_000);
    c.bench_function("ingest_10k_lines_1_worker", |b| {
        b.iter(|| {
            let aggregator = run_pool(black_box(&lines), 1, 10);
            black_box(aggregator.global_top_k(10));
        });
    });
}

fn benchmark_worker_pool(c: &mut Criterion) {
    let lines = generate_lines(10_000);
    c.bench_function("ingest_10k_lines_8_workers", |b| {
        b.iter(|| {
            let aggregator = run_pool(black_box(&lines), 8, 10);
            black_box(aggregator.global_top_k(10));
        });
    });
}

fn benchmark_queries_under_load(c: &mut Criterion) {
    let lines = generate_lines(50_000);
    let aggregator = run_pool(&lines, 8, 10);

    c.bench_function("window_top_k_10", |b| {
        b.iter(|| black_box(aggregator.window_top_k(10)));
    });
    c.bench_function("trending_k3", |b| {
        b.iter(|| black_box(aggregator.trending(3, 5)));
    });
}

criterion_group!(
    benches,
    benchmark_single_worker,
    benchmark_worker_pool,
    benchmark_queries_under_load
);
criterion_main!(benches);
