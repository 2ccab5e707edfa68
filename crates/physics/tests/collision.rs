use physics::{BodyKind, BodySpec, PhysicsSim, Settings, Vec3};

fn weightless() -> PhysicsSim {
    PhysicsSim::with_settings(Settings {
        gravity: Vec3::ZERO,
        ..Settings::default()
    })
    .unwrap()
}

#[test]
fn overlapping_spheres_report_half_unit_penetration() {
    let mut sim = weightless();
    sim.add_body(&BodySpec::sphere(0, 1.0)).unwrap();
    sim.add_body(&BodySpec::sphere(1, 1.0).with_position(Vec3::new(1.5, 0.0, 0.0)))
        .unwrap();
    sim.step(1.0 / 60.0).unwrap();

    let contacts = sim.contacts();
    assert_eq!(contacts.len(), 1);
    assert!((contacts[0].penetration - 0.5).abs() < 1e-5);
    assert!((contacts[0].normal - Vec3::X).length() < 1e-5);
    assert_eq!(sim.statistics().contact_count, 1);
}

#[test]
fn overlapping_boxes_separate_along_x() {
    let mut sim = weightless();
    sim.add_body(&BodySpec::cuboid(0, Vec3::ONE)).unwrap();
    sim.add_body(&BodySpec::cuboid(1, Vec3::ONE).with_position(Vec3::new(0.9, 0.0, 0.0)))
        .unwrap();
    sim.step(1.0 / 60.0).unwrap();

    let contact = sim.contacts()[0];
    assert!((contact.penetration - 0.1).abs() < 1e-5);
    assert_eq!(contact.normal, Vec3::X);

    // Positional correction pushed them apart along the normal only.
    let a = sim.body(physics::BodyId(0)).unwrap();
    let b = sim.body(physics::BodyId(1)).unwrap();
    assert!(b.position.x - a.position.x > 0.9);
    assert_eq!(a.position.y, 0.0);
}

#[test]
fn distant_bodies_never_touch() {
    let mut sim = weightless();
    for i in 0..10 {
        sim.add_body(&BodySpec::sphere(i, 0.5).with_position(Vec3::new(i as f32 * 3.0, 0.0, 0.0)))
            .unwrap();
    }
    sim.step(1.0 / 60.0).unwrap();
    assert!(sim.contacts().is_empty());
}

#[test]
fn static_pairs_are_not_tested() {
    let mut sim = weightless();
    sim.add_body(&BodySpec::cuboid(0, Vec3::ONE).with_kind(BodyKind::Static)).unwrap();
    sim.add_body(
        &BodySpec::cuboid(1, Vec3::ONE)
            .with_kind(BodyKind::Static)
            .with_position(Vec3::new(0.5, 0.0, 0.0)),
    )
    .unwrap();
    sim.step(1.0 / 60.0).unwrap();
    assert!(sim.contacts().is_empty());
}

#[test]
fn large_bodies_collide_across_many_cells() {
    let mut sim = weightless();
    sim.settings_mut().grid_cell_size = 0.5;
    sim.add_body(&BodySpec::cuboid(0, Vec3::new(200.0, 1.0, 200.0)).with_kind(BodyKind::Static))
        .unwrap();
    sim.add_body(&BodySpec::sphere(1, 0.5).with_position(Vec3::new(60.0, 0.9, -40.0)))
        .unwrap();
    sim.step(1.0 / 60.0).unwrap();
    assert_eq!(sim.contacts().len(), 1);
    assert!(sim.grid_stats().oversized >= 1);
}
