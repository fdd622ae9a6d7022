use std::hint::black_box;
use std::io::Cursor;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use logtally::generator::{generate, GeneratorConfig};
use logtally::parallel::{ParallelConfig, ParallelProcessor};
use logtally::{aggregate_batch, parse_line, BatchReader, MatchCriteria};

fn synthetic_log(bytes: u64) -> Vec<u8> {
    let config = GeneratorConfig {
        target_bytes: bytes,
        seed: Some(1),
        ..Default::default()
    };
    let mut out = Vec::with_capacity(bytes as usize + 256);
    generate(&mut out, &config).expect("in-memory generation cannot fail");
    out
}

fn bench_parse_line(c: &mut Criterion) {
    let line = r#"192.168.0.1 - - [10/Sep/2024:15:03:27] "GET /index.html?q=abcdef&p=12" 500 125"#;
    c.bench_function("parse_line", |b| {
        b.iter(|| {
            black_box(parse_line(black_box(line)));
        });
    });
}

fn bench_aggregate_batch(c: &mut Criterion) {
    let log = synthetic_log(2 * 1024 * 1024);
    let lines: Vec<String> = String::from_utf8_lossy(&log)
        .lines()
        .take(10_000)
        .map(str::to_string)
        .collect();
    let criteria = MatchCriteria::default();

    let mut group = c.benchmark_group("aggregate_batch");
    group.throughput(Throughput::Elements(lines.len() as u64));
    group.bench_function("10k_lines", |b| {
        b.iter(|| black_box(aggregate_batch(black_box(&lines[..]), &criteria)));
    });
    group.finish();
}

fn bench_worker_scaling(c: &mut Criterion) {
    let log = synthetic_log(8 * 1024 * 1024);
    let criteria = MatchCriteria::default();

    let mut group = c.benchmark_group("pipeline_workers");
    group.sample_size(10);
    group.throughput(Throughput::Bytes(log.len() as u64));
    for workers in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            b.iter(|| {
                let reader = BatchReader::from_reader(Cursor::new(log.clone()), "bench", 10_000)
                    .expect("valid batch size");
                let processor = ParallelProcessor::new(ParallelConfig::with_workers(workers));
                black_box(processor.process(reader, &criteria).expect("in-memory run"))
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_parse_line,
    bench_aggregate_batch,
    bench_worker_scaling
);
criterion_main!(benches);
