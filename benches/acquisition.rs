//! Benchmarks for the acquisition path
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use modbus_ai_panel::backend::{
    to_voltage, AcquisitionLoop, ConnectionManager, MockDevice, SampleHistory, SignalEmulator,
};
use modbus_ai_panel::config::AcquisitionConfig;
use modbus_ai_panel::frontend::history_points;
use modbus_ai_panel::types::Mode;

fn bench_history_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_push");

    for capacity in [200, 2_000, 20_000].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            capacity,
            |b, &capacity| {
                let mut history = SampleHistory::new(capacity);
                for i in 0..capacity {
                    history.push(i as f64);
                }
                let mut value = 0.0;
                b.iter(|| {
                    value += 0.001;
                    history.push(black_box(value));
                });
            },
        );
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut history = SampleHistory::default();
    for i in 0..history.capacity() {
        history.push(i as f64);
    }

    c.bench_function("history_snapshot_to_plot_points", |b| {
        b.iter(|| history_points(black_box(&history.snapshot())))
    });
}

fn bench_conversion(c: &mut Criterion) {
    c.bench_function("to_voltage_full_range", |b| {
        b.iter(|| {
            let mut sum = 0.0;
            for raw in 0..=u16::MAX {
                sum += to_voltage(black_box(raw));
            }
            sum
        })
    });
}

fn bench_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    group.throughput(Throughput::Elements(1));

    group.bench_function("emulated", |b| {
        let connection =
            ConnectionManager::with_mode(Box::new(MockDevice::new().factory()), Mode::Emulated);
        let mut acq = AcquisitionLoop::new(connection, &AcquisitionConfig::default())
            .with_emulator(SignalEmulator::with_seed(7));
        b.iter(|| black_box(acq.tick()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_history_push,
    bench_snapshot,
    bench_conversion,
    bench_ticks
);
criterion_main!(benches);
