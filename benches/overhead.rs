use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cycle_clock::calibration::{Calibration, CalibrationStatus};
use cycle_clock::{read_counter, CompensatedTimer, Config, CycleTimer, PlatformCounter, ProcessTicks};

fn bench_counter(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter");
    group.bench_function("read_counter", |b| b.iter(|| black_box(read_counter())));

    let mut timer = CycleTimer::new();
    group.bench_function("cycle_timer_start_stop", |b| {
        b.iter(|| {
            timer.start();
            black_box(timer.stop())
        });
    });
    group.finish();
}

fn bench_compensated(c: &mut Criterion) {
    let mut group = c.benchmark_group("compensated");
    // A fixed estimate keeps the bench from spending a second calibrating.
    let calibration = Calibration {
        cycles_per_tick: 10_000.0,
        events: 1,
        accepted: 1,
        status: CalibrationStatus::Complete,
        ..Calibration::uncalibrated()
    };
    let mut timer = CompensatedTimer::with_calibration(
        PlatformCounter,
        ProcessTicks::new(),
        Config::default(),
        calibration,
    )
    .expect("default config is valid");

    // Each stop also reads the tick clock, which is a syscall on Unix.
    group.bench_function("start_stop", |b| {
        b.iter(|| {
            timer.start();
            black_box(timer.stop())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_counter, bench_compensated);
criterion_main!(benches);
