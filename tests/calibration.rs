//! Interrupt calibration on the real counter and tick clock.
//!
//! These tests need a tick clock that accounts user time, which every Linux
//! and macOS host provides.

use std::time::Duration;

use cycle_clock::measurement::black_box;
use cycle_clock::output::{format_report, to_json};
use cycle_clock::{probe, CompensatedTimer, Config, ProcessTicks, TickSource};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Spin until the process has used at least `ticks` more ticks of CPU time.
fn burn_ticks(ticks: u64) -> u64 {
    let source = ProcessTicks::new();
    let start = source.user_ticks();
    let mut acc = 0u64;
    let mut i = 0u64;
    while source.user_ticks() < start + ticks {
        for _ in 0..10_000 {
            acc = acc.wrapping_mul(31).wrapping_add(black_box(i));
            i += 1;
        }
    }
    acc
}

/// Quick settings with a record threshold that suits current hardware.
///
/// A tick handler on a modern core costs far less than the historical
/// 3,000-cycle threshold, so the default would reject nearly every candidate.
/// 1,100 cycles still sits above a bare 1,000-cycle poll gap.
fn host_config() -> Config {
    Config::quick()
        .record_threshold_cycles(1_100.0)
        .max_duration(Some(Duration::from_secs(10)))
}

fn calibrated_timer() -> CompensatedTimer {
    let mut timer = CompensatedTimer::with_config(host_config()).unwrap();
    let cal = timer.calibrate();
    assert!(cal.is_complete(), "calibration status: {:?}", cal.status);
    timer
}

#[test]
fn calibration_completes_within_its_event_budget() {
    init_tracing();
    let timer = calibrated_timer();
    let cal = timer.calibration().unwrap();

    assert_eq!(cal.events, timer.config().events);
    assert_eq!(cal.accepted + cal.rejected, cal.events);
    assert!(cal.elapsed < Duration::from_secs(10));
}

#[test]
fn cycles_per_tick_exceeds_record_threshold() {
    init_tracing();
    let timer = calibrated_timer();
    assert!(
        timer.cycles_per_tick() > timer.config().record_threshold_cycles,
        "cycles_per_tick = {}",
        timer.cycles_per_tick()
    );
}

#[test]
fn cycles_per_tick_is_stable_across_measurements() {
    init_tracing();
    let mut timer = calibrated_timer();
    let before = timer.cycles_per_tick();

    for _ in 0..5 {
        timer.start();
        black_box(burn_ticks(1));
        timer.stop();
    }

    assert_eq!(timer.cycles_per_tick(), before);
}

#[test]
fn compensated_never_exceeds_raw_over_ticks() {
    init_tracing();
    let mut timer = calibrated_timer();

    timer.start();
    black_box(burn_ticks(2));
    let m = timer.stop_detailed();

    assert!(m.ticks_elapsed >= 1, "workload did not span a tick");
    assert!(m.compensation_applied);
    assert!(m.compensated_cycles >= 0.0);
    assert!(
        m.compensated_cycles < m.raw_cycles,
        "compensated {} >= raw {}",
        m.compensated_cycles,
        m.raw_cycles
    );
}

#[test]
fn probe_builds_a_report() {
    init_tracing();
    let report = probe(&Config::quick()).unwrap();

    assert!(!report.counter.is_empty());
    assert!(report.timer_overhead_cycles.unwrap() >= 0.0);
    assert!(report.clock_rate.as_ref().unwrap().ghz > 0.0);
    assert!(report.calibration.is_some());

    let json = to_json(&report).unwrap();
    assert!(json.contains("cycles_per_tick"));
    assert!(format_report(&report).contains(&report.counter));
}

#[test]
fn probe_rejects_invalid_config() {
    assert!(probe(&Config::new().threshold_cycles(0)).is_err());
}
