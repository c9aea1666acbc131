use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lumen_animation::{Animator, Easing, ManualFrameScheduler};
use std::rc::Rc;

fn bench_easing(c: &mut Criterion) {
    let mut group = c.benchmark_group("easing");
    for easing in [
        Easing::Linear,
        Easing::EaseInOutCubic,
        Easing::EaseOutElastic,
        Easing::EaseInOutBack,
        Easing::CubicBezier(0.25, 0.1, 0.25, 1.0),
    ] {
        group.bench_function(easing.name(), |b| {
            b.iter(|| {
                let mut sum = 0.0;
                for i in 0..=100 {
                    sum += easing.apply(black_box(i as f64 / 100.0));
                }
                sum
            })
        });
    }
    group.finish();
}

fn bench_frames(c: &mut Criterion) {
    c.bench_function("hundred_animations_one_second", |b| {
        b.iter(|| {
            let frames = Rc::new(ManualFrameScheduler::new());
            let animator = Animator::new(frames.clone());
            let handles: Vec<_> = (0..100)
                .map(|i| {
                    animator
                        .animate_value(0.0, i as f64, 1000.0, "easeOutCubic", |v| {
                            black_box(v);
                        })
                        .unwrap()
                })
                .collect();
            for frame in 0..=60 {
                frames.run_frame(frame as f64 * 1000.0 / 60.0);
            }
            handles
        })
    });
}

criterion_group!(benches, bench_easing, bench_frames);
criterion_main!(benches);
