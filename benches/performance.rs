//! Performance benchmarks for the logbook.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use logbook::{Event, EventKind, ExperienceValue, Logbook, Timestamp};
use tempfile::TempDir;

fn populated(dir: &TempDir, count: i64) -> Logbook {
    let logbook = Logbook::open(dir.path().join("logbook.bin")).unwrap();
    for i in 0..count {
        let mut event = Event::new(EventKind::Flight, Timestamp(i / 3))
            .with_equipment("C172")
            .with_experience("Landings", ExperienceValue::Count(1));
        if i % 4 == 0 {
            event = event.with_experience("Night", ExperienceValue::Flag(true));
        }
        logbook.update(event);
    }
    logbook
}

/// Benchmark relocating events between dates
fn bench_relocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("relocation");

    for size in [1_000, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("events", size), &size, |b, &size| {
            let dir = TempDir::new().unwrap();
            let logbook = populated(&dir, size);
            let event = logbook.events()[0].clone();
            let mut date = 0;

            b.iter(|| {
                date = (date + 7) % size;
                black_box(logbook.update(event.clone().at(Timestamp(date))));
            });
        });
    }

    group.finish();
}

/// Benchmark date range and experience queries
fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");
    let dir = TempDir::new().unwrap();
    let logbook = populated(&dir, 50_000);

    group.bench_function("range_narrow", |b| {
        b.iter(|| black_box(logbook.range(Timestamp(8_000)..Timestamp(8_100))));
    });

    group.bench_function("range_open_start", |b| {
        b.iter(|| black_box(logbook.range(..Timestamp(500))));
    });

    group.bench_function("with_experience", |b| {
        b.iter(|| black_box(logbook.with_experience("Night")));
    });

    group.bench_function("chronological", |b| {
        b.iter(|| black_box(logbook.chronological().count()));
    });

    group.finish();
}

/// Benchmark whole-file save and reopen
fn bench_persistence(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistence");
    group.sample_size(10);

    for size in [1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("save", size), &size, |b, &size| {
            let dir = TempDir::new().unwrap();
            let logbook = populated(&dir, size);
            b.iter(|| logbook.save().unwrap());
        });

        group.bench_with_input(BenchmarkId::new("open", size), &size, |b, &size| {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("logbook.bin");
            {
                let logbook = populated(&dir, size);
                logbook.save().unwrap();
            }
            b.iter(|| black_box(Logbook::open(&path).unwrap().len()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_relocation, bench_queries, bench_persistence);
criterion_main!(benches);
