/// Performance benchmarks for the per-tick pipeline
use arpin_core::ar::{PlacementPipeline, TapEvent};
use arpin_core::config::ArConfig;
use arpin_core::pose::Pose;
use arpin_core::sim::{RecordingBackend, RecordingHost, SimSession, SimSessionFactory, SimWorld};
use arpin_core::three_d::{model_matrix, visible_planes};
use arpin_core::trackable::{Plane, PlaneType, TrackableId, TrackingState};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{Quat, Vec2, Vec3};

fn started_pipeline() -> (PlacementPipeline<SimSession>, RecordingBackend, RecordingHost) {
    let mut pipeline = PlacementPipeline::new(&ArConfig::default()).expect("default config is valid");
    let mut factory = SimSessionFactory::new(SimWorld::floor_scene());
    let mut backend = RecordingBackend::default();
    let mut host = RecordingHost::default();
    pipeline.on_surface_created(&mut backend).expect("surface");
    pipeline.on_surface_changed(480, 960);
    pipeline.on_resume(&mut factory, &mut host).expect("resume");
    (pipeline, backend, host)
}

fn benchmark_tick(c: &mut Criterion) {
    c.bench_function("tick_idle", |b| {
        let (mut pipeline, mut backend, mut host) = started_pipeline();
        b.iter(|| {
            let outcome = pipeline.on_draw_frame(&mut backend, &mut host);
            backend.take_calls();
            black_box(outcome)
        });
    });

    c.bench_function("tick_with_tap", |b| {
        let (mut pipeline, mut backend, mut host) = started_pipeline();
        let sender = pipeline.tap_sender();
        b.iter(|| {
            sender.offer(TapEvent::new(Vec2::new(240.0, 480.0)));
            let outcome = pipeline.on_draw_frame(&mut backend, &mut host);
            backend.take_calls();
            if let Some(session) = pipeline.session() {
                session.take_events();
            }
            black_box(outcome)
        });
    });
}

fn benchmark_geometry(c: &mut Criterion) {
    let planes: Vec<Plane> = (0..64)
        .map(|i| Plane {
            id: TrackableId(i),
            center_pose: Pose::from_translation(Vec3::new(i as f32 * 0.1, (i % 8) as f32 * 0.3, -2.0)),
            polygon: vec![Vec2::new(-0.5, -0.5), Vec2::new(0.5, -0.5), Vec2::new(0.0, 0.5)],
            plane_type: PlaneType::HorizontalUpwardFacing,
            tracking_state: TrackingState::Tracking,
            subsumed_by: None,
        })
        .collect();
    let camera = Pose::from_translation(Vec3::new(0.0, 1.5, 0.0));

    c.bench_function("visible_planes_64", |b| {
        b.iter(|| black_box(visible_planes(black_box(planes.clone()), &camera)))
    });

    let pose = Pose::new(Vec3::new(0.3, 0.0, -1.2), Quat::from_rotation_y(0.7));
    c.bench_function("model_matrix", |b| {
        b.iter(|| black_box(model_matrix(black_box(&pose), black_box(0.5))))
    });
}

criterion_group!(benches, benchmark_tick, benchmark_geometry);
criterion_main!(benches);
