//! Benchmarks for the hot per-sample signal path

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::{UnitQuaternion, Vector3};
use saccade_assessment::motion::MotionProcessor;
use saccade_assessment::safety::{SafetyLimits, SafetyMonitor};
use saccade_assessment::sway::SwayTracker;

/// Synthetic pose stream - a natural head oscillation plus noise
fn synthetic_poses(count: usize) -> Vec<(UnitQuaternion<f64>, Vector3<f64>, f64)> {
    (0..count)
        .map(|i| {
            let t = i as f64 * 0.016;
            let yaw = 10.0 * t.sin() + 0.5 * rand::random::<f64>();
            let pitch = 5.0 * t.cos() + 0.5 * rand::random::<f64>();
            let rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw.to_radians())
                * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), pitch.to_radians());
            let position = Vector3::new((t * 0.9).sin() * 0.02, 0.0, (t * 1.3).cos() * 0.02);
            (rotation, position, t)
        })
        .collect()
}

fn benchmark_motion_processor(c: &mut Criterion) {
    let samples = synthetic_poses(1000);

    c.bench_function("motion_processor_1000_samples", |b| {
        b.iter(|| {
            let mut processor = MotionProcessor::default();
            for (rotation, _, t) in &samples {
                black_box(processor.update(rotation, *t));
            }
        });
    });
}

fn benchmark_sway_tracker(c: &mut Criterion) {
    let samples = synthetic_poses(1000);

    // The RMS recompute cost scales with the retained window
    let mut group = c.benchmark_group("sway_tracker");
    for window in [100, 500, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(window), &window, |b, &window| {
            b.iter(|| {
                let mut tracker = SwayTracker::new(0.1, window);
                tracker.set_origin(Vector3::zeros());
                for (_, position, t) in &samples {
                    black_box(tracker.update(position, *t));
                }
            });
        });
    }
    group.finish();
}

fn benchmark_safety_monitor(c: &mut Criterion) {
    let monitor = SafetyMonitor::new(SafetyLimits::default());
    let origin = Vector3::zeros();
    let samples = synthetic_poses(1000);

    c.bench_function("safety_monitor_1000_checks", |b| {
        b.iter(|| {
            for (_, position, _) in &samples {
                black_box(monitor.check(position, Some(&origin), 120.0));
            }
        });
    });
}

criterion_group!(
    benches,
    benchmark_motion_processor,
    benchmark_sway_tracker,
    benchmark_safety_monitor
);
criterion_main!(benches);
