//! Benchmarks for the per-frame pipeline

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mimic_core::{EulerAngles, Expression, FrameTime, Vec3};
use mimic_fusion::{FusionEngine, FusionInputs};
use mimic_retarget::{HumanoidRetargeter, PrimitiveAvatar, PrimitiveShape, RecordingRig};
use mimic_runtime::{depth_order, Studio, StudioConfig, IDENTITY_VIEW};
use mimic_signal::{
    AudioSignal, ExpressionOverride, FaceSignal, IdleGenerator, VisemeSignal, VisemeWeights,
};

const FRAME: Duration = Duration::from_millis(16);

fn busy_inputs() -> FusionInputs {
    FusionInputs {
        face: FaceSignal {
            tracked: true,
            head_rotation: EulerAngles::new(0.2, -0.3, 0.1),
            mouth_open: 0.4,
            blink_left: 0.1,
            blink_right: 0.1,
            ..FaceSignal::default()
        },
        audio: AudioSignal { listening: true, volume: 0.6, bass: 0.7, treble: 0.2 },
        audio_reactive: true,
        viseme: VisemeSignal {
            active: true,
            weights: VisemeWeights { aa: 0.5, oh: 0.3, ..VisemeWeights::default() },
            silence: 0.2,
        },
        lip_sync: true,
        expression: ExpressionOverride::new(Expression::Happy, FrameTime::ZERO),
    }
}

fn bench_fusion_idle(c: &mut Criterion) {
    let mut engine = FusionEngine::new();
    let inputs = FusionInputs::idle();

    c.bench_function("fusion_update_idle", |b| {
        b.iter(|| black_box(engine.update(black_box(&inputs), FRAME).mouth_open))
    });
}

fn bench_fusion_tracking(c: &mut Criterion) {
    let mut engine = FusionEngine::new();
    let inputs = busy_inputs();

    c.bench_function("fusion_update_all_sources", |b| {
        b.iter(|| black_box(engine.update(black_box(&inputs), FRAME).mouth_open))
    });
}

fn bench_idle_sample(c: &mut Criterion) {
    let mut idle = IdleGenerator::default();
    let mut t = 0u64;

    c.bench_function("idle_sample", |b| {
        b.iter(|| {
            t += 16_000;
            black_box(idle.sample(FrameTime(t)))
        })
    });
}

fn bench_retarget(c: &mut Criterion) {
    let mut engine = FusionEngine::new();
    let state = *engine.update(&busy_inputs(), FRAME);
    let retargeter = HumanoidRetargeter::default();
    let mut rig = RecordingRig::new();

    c.bench_function("retarget_humanoid", |b| {
        b.iter(|| black_box(retargeter.retarget(black_box(&state), &mut rig, false)))
    });

    let mut cat = PrimitiveAvatar::new(PrimitiveShape::Cat);
    c.bench_function("apply_primitive_cat", |b| {
        b.iter(|| {
            cat.apply(black_box(&state));
            black_box(cat.params().mouth_scale_y)
        })
    });
}

fn bench_studio_frame(c: &mut Criterion) {
    let Ok(mut studio) = Studio::new(StudioConfig::default()) else {
        return;
    };
    let hub = studio.hub();
    let inputs = busy_inputs();
    hub.publish_face(inputs.face.clone());
    hub.publish_audio(inputs.audio);
    hub.publish_viseme(inputs.viseme);
    hub.set_lip_sync(true);

    c.bench_function("studio_frame", |b| {
        b.iter(|| black_box(studio.frame(FRAME).mouth_open))
    });
}

fn bench_depth_order(c: &mut Criterion) {
    let points: Vec<Vec3> = (0..10_000)
        .map(|i| {
            let f = i as f32;
            Vec3::new((f * 0.37).sin(), (f * 0.11).cos(), -(f * 0.013) % 7.0)
        })
        .collect();

    c.bench_function("depth_order_10k", |b| {
        b.iter(|| black_box(depth_order(black_box(&points), &IDENTITY_VIEW)))
    });
}

criterion_group!(
    benches,
    bench_fusion_idle,
    bench_fusion_tracking,
    bench_idle_sample,
    bench_retarget,
    bench_studio_frame,
    bench_depth_order,
);
criterion_main!(benches);
