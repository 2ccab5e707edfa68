use physics::{BodyId, BodyKind, BodyPatch, BodySpec, PhysicsSim, Settings, Vec3};

fn ground_and_ball(settings: Settings) -> PhysicsSim {
    let mut sim = PhysicsSim::with_settings(settings).unwrap();
    sim.add_body(&BodySpec::cuboid(0, Vec3::new(10.0, 1.0, 10.0)).with_kind(BodyKind::Static))
        .unwrap();
    sim.add_body(&BodySpec::sphere(1, 0.5).with_position(Vec3::new(0.0, 5.0, 0.0)))
        .unwrap();
    sim
}

fn run(sim: &mut PhysicsSim, seconds: f32) {
    let dt = 1.0 / 60.0;
    let steps = (seconds / dt).round() as u32;
    for _ in 0..steps {
        sim.step(dt).unwrap();
    }
}

#[test]
fn resting_ball_falls_asleep() {
    let mut sim = ground_and_ball(Settings::default());
    run(&mut sim, 10.0);
    let ball = sim.body(BodyId(1)).unwrap();
    assert!(ball.sleeping);
    assert_eq!(ball.velocity, Vec3::ZERO);
    assert_eq!(ball.angular_velocity, Vec3::ZERO);

    let stats = sim.statistics();
    assert_eq!(stats.sleeping_count, 1);
    assert_eq!(stats.awake_count, 1);
}

#[test]
fn sleeping_ball_does_not_move() {
    let mut sim = ground_and_ball(Settings::default());
    run(&mut sim, 10.0);
    let before = sim.body(BodyId(1)).unwrap().position;
    run(&mut sim, 1.0);
    assert_eq!(sim.body(BodyId(1)).unwrap().position, before);
}

#[test]
fn patch_wakes_a_sleeping_body() {
    let mut sim = ground_and_ball(Settings::default());
    run(&mut sim, 10.0);
    sim.update_body(
        BodyId(1),
        &BodyPatch {
            velocity: Some(Vec3::new(0.0, 5.0, 0.0)),
            ..BodyPatch::default()
        },
    )
    .unwrap();
    assert!(!sim.body(BodyId(1)).unwrap().sleeping);
    sim.step(1.0 / 60.0).unwrap();
    assert!(sim.body(BodyId(1)).unwrap().position.y > 1.0);
}

#[test]
fn moving_body_wakes_sleeper_on_impact() {
    let mut sim = ground_and_ball(Settings::default());
    run(&mut sim, 10.0);
    assert!(sim.body(BodyId(1)).unwrap().sleeping);

    sim.add_body(
        &BodySpec::sphere(2, 0.5)
            .with_gravity(false)
            .with_position(Vec3::new(-3.0, 1.0, 0.0))
            .with_velocity(Vec3::new(6.0, 0.0, 0.0)),
    )
    .unwrap();
    run(&mut sim, 1.0);
    let ball = sim.body(BodyId(1)).unwrap();
    assert!(ball.position.x > 0.1, "x={}", ball.position.x);
}

#[test]
fn slow_kinematic_pusher_wakes_and_moves_sleeper() {
    let mut sim = PhysicsSim::new();
    sim.add_body(&BodySpec::cuboid(0, Vec3::ONE).with_gravity(false))
        .unwrap();
    run(&mut sim, 2.0);
    assert!(sim.body(BodyId(0)).unwrap().sleeping);

    // Well below the sleep velocity threshold.
    sim.add_body(
        &BodySpec::cuboid(1, Vec3::ONE)
            .with_kind(BodyKind::Kinematic)
            .with_position(Vec3::new(-1.5, 0.0, 0.0))
            .with_velocity(Vec3::new(0.05, 0.0, 0.0)),
    )
    .unwrap();
    run(&mut sim, 15.0);

    let pusher = sim.body(BodyId(1)).unwrap().position.x;
    let pushed = sim.body(BodyId(0)).unwrap().position.x;
    assert!((pusher + 0.75).abs() < 0.01, "pusher x={pusher}");
    assert!(pushed > 0.2, "pushed x={pushed}");
    assert!(pushed - pusher > 0.9, "boxes interpenetrate: {pusher} vs {pushed}");
}

#[test]
fn disabled_sleep_keeps_bodies_awake() {
    let mut sim = ground_and_ball(Settings {
        sleep_enabled: false,
        ..Settings::default()
    });
    run(&mut sim, 10.0);
    assert!(!sim.body(BodyId(1)).unwrap().sleeping);
    assert_eq!(sim.statistics().sleeping_count, 0);
}
