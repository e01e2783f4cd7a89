//! Decoder and formatter benchmarks over synthetic hours.
//!
//! Run with: `cargo bench --package tickfetch-bench`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tickfetch_bench::{fixture_hour, synthetic_payload, synthetic_records};
use tickfetch_lib::{CsvFormatter, Formatter, decode_ticks, decompress_bi5, parse_ticks};

/// Tick counts of a quiet, typical and busy hour.
const HOUR_SIZES: [usize; 3] = [500, 5_000, 50_000];

fn decode_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for count in HOUR_SIZES {
        let payload = synthetic_payload(count);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("decode_ticks", count), &payload, |b, p| {
            b.iter(|| decode_ticks(black_box(p), "EURUSD", fixture_hour()).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("decompress", count), &payload, |b, p| {
            b.iter(|| decompress_bi5(black_box(p)).unwrap());
        });

        let records = synthetic_records(count);
        group.bench_with_input(BenchmarkId::new("parse", count), &records, |b, r| {
            b.iter(|| parse_ticks(black_box(r)).unwrap().count());
        });
    }

    group.finish();
}

fn format_benchmark(c: &mut Criterion) {
    let ticks = decode_ticks(&synthetic_payload(5_000), "EURUSD", fixture_hour()).unwrap();
    let formatter = CsvFormatter::new().with_delimiter(';');

    let mut group = c.benchmark_group("format");
    group.throughput(Throughput::Elements(ticks.len() as u64));
    group.bench_function("csv", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(ticks.len() * 96);
            formatter.write_ticks(black_box(&ticks), &mut out).unwrap();
            out
        });
    });
    group.finish();
}

criterion_group!(benches, decode_benchmark, format_benchmark);
criterion_main!(benches);
