//! Iterative distance-constraint projection
//!
//! Each iteration moves the two anchors towards the rest length, half the
//! error per movable endpoint scaled by stiffness, and strips the damped
//! share of their relative velocity along the constraint axis. Hinge and
//! slider constraints are skipped and count as satisfied.

use crate::constraint::ConstraintKind;
use crate::registry::BodyRegistry;
use crate::settings::Settings;
use crate::types::Vec3;

/// Separations below this are treated as degenerate (no usable axis).
const MIN_SEPARATION: f32 = 1e-6;

struct Link {
    slot_a: usize,
    slot_b: usize,
    anchor_a: Vec3,
    anchor_b: Vec3,
    rest_length: f32,
    stiffness: f32,
    damping: f32,
}

/// Project every distance constraint. Returns the iterations used, which is
/// 0 when there is nothing to solve.
pub fn solve_constraints(registry: &mut BodyRegistry, settings: &Settings) -> u32 {
    let links: Vec<Link> = registry
        .constraints()
        .filter(|c| c.kind == ConstraintKind::Distance)
        .filter_map(|c| {
            Some(Link {
                slot_a: registry.slot_of(c.body_a)?,
                slot_b: registry.slot_of(c.body_b)?,
                anchor_a: c.anchor_a,
                anchor_b: c.anchor_b,
                rest_length: c.rest_length,
                stiffness: c.stiffness,
                damping: c.damping,
            })
        })
        .collect();
    if links.is_empty() {
        return 0;
    }

    let mut iterations = 0;
    for iteration in 0..settings.solver_iterations {
        iterations = iteration + 1;
        let mut max_error = 0.0_f32;
        for link in &links {
            max_error = max_error.max(project(registry, link, settings.convergence_tolerance));
        }
        if max_error < settings.convergence_tolerance {
            break;
        }
    }
    iterations
}

/// One projection of a single link; returns the length error it found.
fn project(registry: &mut BodyRegistry, link: &Link, tolerance: f32) -> f32 {
    let Some((a, b)) = registry.pair_mut(link.slot_a, link.slot_b) else {
        return 0.0;
    };
    let movable_a = a.is_dynamic();
    let movable_b = b.is_dynamic();
    if !movable_a && !movable_b {
        return 0.0;
    }

    let delta = b.world_point(link.anchor_b) - a.world_point(link.anchor_a);
    let length = delta.length();
    if length < MIN_SEPARATION {
        return 0.0;
    }
    let error = length - link.rest_length;
    if error.abs() < tolerance {
        return 0.0;
    }

    let axis = delta / length;
    let correction = axis * (error * 0.5 * link.stiffness);
    let axial_speed = (b.velocity - a.velocity).dot(axis);
    let velocity_fix = axis * (axial_speed * 0.5 * link.damping);

    if movable_a {
        a.position += correction;
        a.velocity += velocity_fix;
        a.update_aabb();
        a.wake();
    }
    if movable_b {
        b.position -= correction;
        b.velocity -= velocity_fix;
        b.update_aabb();
        b.wake();
    }
    error.abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyId, BodyKind, BodySpec};
    use crate::constraint::{ConstraintId, ConstraintSpec};
    use crate::types::Material;

    fn pair(separation: f32, kind_a: BodyKind) -> BodyRegistry {
        let mut registry = BodyRegistry::new();
        registry
            .add_body(&BodySpec::sphere(0, 0.1).with_kind(kind_a), Material::default())
            .unwrap();
        registry
            .add_body(
                &BodySpec::sphere(1, 0.1).with_position(Vec3::new(separation, 0.0, 0.0)),
                Material::default(),
            )
            .unwrap();
        registry
    }

    fn separation(registry: &BodyRegistry) -> f32 {
        let a = registry.get(BodyId(0)).unwrap();
        let b = registry.get(BodyId(1)).unwrap();
        (b.position - a.position).length()
    }

    #[test]
    fn stretched_link_is_pulled_to_rest_length() {
        let mut registry = pair(3.0, BodyKind::Dynamic);
        registry
            .add_constraint(&ConstraintSpec::distance(1, BodyId(0), BodyId(1), 2.0))
            .unwrap();
        let used = solve_constraints(&mut registry, &Settings::default());
        assert!((separation(&registry) - 2.0).abs() < 1e-4);
        assert!(used >= 1);
        // Equal share for two dynamic bodies.
        assert!((registry.get(BodyId(0)).unwrap().position.x - 0.5).abs() < 1e-4);
    }

    #[test]
    fn static_endpoint_holds_still() {
        let mut registry = pair(3.0, BodyKind::Static);
        registry
            .add_constraint(&ConstraintSpec::distance(1, BodyId(0), BodyId(1), 2.0))
            .unwrap();
        solve_constraints(&mut registry, &Settings::default());
        assert_eq!(registry.get(BodyId(0)).unwrap().position, Vec3::ZERO);
        // Half the error per iteration: converges geometrically.
        assert!((separation(&registry) - 2.0).abs() < 0.01);
    }

    #[test]
    fn coincident_anchors_are_skipped() {
        let mut registry = pair(0.0, BodyKind::Dynamic);
        registry
            .add_constraint(&ConstraintSpec::distance(1, BodyId(0), BodyId(1), 1.0))
            .unwrap();
        solve_constraints(&mut registry, &Settings::default());
        assert_eq!(separation(&registry), 0.0);
    }

    #[test]
    fn hinge_is_reported_solved() {
        let mut registry = pair(3.0, BodyKind::Dynamic);
        registry
            .add_constraint(&ConstraintSpec {
                id: ConstraintId(1),
                kind: ConstraintKind::Hinge,
                body_a: BodyId(0),
                body_b: BodyId(1),
                rest_length: Some(1.0),
                ..ConstraintSpec::default()
            })
            .unwrap();
        assert_eq!(solve_constraints(&mut registry, &Settings::default()), 0);
        assert!((separation(&registry) - 3.0).abs() < 1e-6);
    }
}
