use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use physics::{BodyKind, BodySpec, PhysicsSim, Vec3};

fn pile(count: u32) -> PhysicsSim {
    let mut sim = PhysicsSim::new();
    sim.add_body(&BodySpec::cuboid(0, Vec3::new(100.0, 1.0, 100.0)).with_kind(BodyKind::Static))
        .unwrap();
    let side = (count as f32).sqrt().ceil() as u32;
    for i in 0..count {
        let x = (i % side) as f32 * 1.2 - side as f32 * 0.6;
        let z = (i / side) as f32 * 1.2 - side as f32 * 0.6;
        let spec = if i % 2 == 0 {
            BodySpec::sphere(i + 1, 0.5)
        } else {
            BodySpec::cuboid(i + 1, Vec3::ONE)
        };
        sim.add_body(&spec.with_position(Vec3::new(x, 1.5 + (i % 3) as f32, z)))
            .unwrap();
    }
    sim
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");
    for count in [100_u32, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut sim = pile(count);
            b.iter(|| sim.step(black_box(1.0 / 60.0)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
