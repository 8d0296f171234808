//! Criterion benchmarks for the simulation kernels.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use simlab::kernel::{CursorFieldSim, FlowFieldSim, KalmanSim, Viewport};
use simlab::params::ParameterSet;

const DT: f32 = 1.0 / 60.0;

fn viewport() -> Viewport {
    Viewport::new(1280.0, 720.0, 1.0)
}

/// Benchmark the flow-field step at varying particle counts.
fn bench_flow_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("flow_step");

    for count in [120.0_f32, 520.0, 1200.0].iter() {
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(*count as u64),
            count,
            |b, &count| {
                let mut params = ParameterSet::defaults();
                params.set("flow", "particles", count);
                let mut sim = FlowFieldSim::new(&params, 42);

                b.iter(|| {
                    sim.step(&params, 1.0, DT);
                    black_box(sim.time())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark lattice generation for the cursor field at varying spacings.
fn bench_cursor_arrows(c: &mut Criterion) {
    let mut group = c.benchmark_group("cursor_arrows");

    for spacing in [16.0_f32, 28.0, 44.0].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(*spacing as u64),
            spacing,
            |b, &spacing| {
                let mut params = ParameterSet::defaults();
                params.set("cursor", "spacing", spacing);
                let mut sim = CursorFieldSim::new();
                sim.pointer_moved(640.0, 360.0);
                sim.step(1.0, DT);

                b.iter(|| black_box(sim.arrows(&params, viewport(), 1.0).len()));
            },
        );
    }

    group.finish();
}

/// Benchmark one full predict/update cycle of the tracker.
fn bench_kalman_step(c: &mut Criterion) {
    c.bench_function("kalman_step", |b| {
        let params = ParameterSet::defaults();
        let mut sim = KalmanSim::new(viewport(), 42);

        b.iter(|| {
            sim.step(&params, viewport(), 1.0, DT);
            black_box(sim.rmse())
        });
    });
}

criterion_group!(
    benches,
    bench_flow_step,
    bench_cursor_arrows,
    bench_kalman_step
);
criterion_main!(benches);
