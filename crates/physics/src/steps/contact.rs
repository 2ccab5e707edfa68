//! Sequential-impulse contact solver
//!
//! Impulses are linear only: they change linear velocity, never angular.
//! Residual overlap is removed afterwards by a single Baumgarte-style
//! positional pass, which moves bodies without touching velocity.

use tracing::warn;

use crate::collision::Contact;
use crate::registry::BodyRegistry;
use crate::settings::Settings;

/// Outcome of one contact solve.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactSolveReport {
    /// Velocity iterations actually run before convergence or the cap.
    pub iterations: u32,
    /// Contacts dropped because they produced non-finite impulses.
    pub skipped: usize,
}

/// Resolve `contacts` against the bodies in `registry`.
pub fn solve_contacts(
    registry: &mut BodyRegistry,
    contacts: &[Contact],
    settings: &Settings,
) -> ContactSolveReport {
    let mut report = ContactSolveReport::default();
    if contacts.is_empty() {
        return report;
    }
    let mut faulted = vec![false; contacts.len()];

    for iteration in 0..settings.solver_iterations {
        report.iterations = iteration + 1;
        let mut max_error = 0.0_f32;

        for (contact, faulted) in contacts.iter().zip(faulted.iter_mut()) {
            if *faulted {
                continue;
            }
            match apply_normal_impulse(registry, contact, settings) {
                Some(error) => max_error = max_error.max(error),
                None => {
                    *faulted = true;
                    report.skipped += 1;
                    warn!(a = contact.a, b = contact.b, "skipping contact with non-finite impulse");
                }
            }
        }

        if max_error < settings.convergence_tolerance {
            break;
        }
    }

    for (contact, _) in contacts.iter().zip(&faulted).filter(|(_, f)| !**f) {
        correct_position(registry, contact, settings);
    }
    report
}

/// Apply the normal (and friction) impulse for one contact.
///
/// Returns the approach speed that was resolved (0 for separating or
/// converged contacts), or `None` if the impulse was not finite.
fn apply_normal_impulse(
    registry: &mut BodyRegistry,
    contact: &Contact,
    settings: &Settings,
) -> Option<f32> {
    let Some((a, b)) = registry.pair_mut(contact.a, contact.b) else {
        return Some(0.0);
    };
    let inv_mass_sum = a.inv_mass + b.inv_mass;
    if inv_mass_sum <= 0.0 {
        return Some(0.0);
    }

    let n = contact.normal;
    let relative_velocity = b.velocity - a.velocity;
    let velocity_along_normal = relative_velocity.dot(n);

    // Separating, or already slow enough to count as converged.
    if velocity_along_normal > 0.0 || -velocity_along_normal < settings.convergence_tolerance {
        return Some(0.0);
    }

    let restitution = if -velocity_along_normal > settings.restitution_threshold {
        a.material.combined_restitution(&b.material)
    } else {
        0.0
    };
    let j = -(1.0 + restitution) * velocity_along_normal / inv_mass_sum;
    if !j.is_finite() {
        return None;
    }

    let impulse = n * j;
    a.velocity -= impulse * a.inv_mass;
    b.velocity += impulse * b.inv_mass;

    // Coulomb friction, clamped by the normal impulse.
    let friction = a.material.combined_friction(&b.material);
    let relative_velocity = b.velocity - a.velocity;
    let tangent_velocity = relative_velocity - n * relative_velocity.dot(n);
    let tangent_speed = tangent_velocity.length();
    if friction > 0.0 && tangent_speed > 1e-6 {
        let tangent = tangent_velocity / tangent_speed;
        let jt = (tangent_speed / inv_mass_sum).min(friction * j);
        if jt.is_finite() {
            a.velocity += tangent * (jt * a.inv_mass);
            b.velocity -= tangent * (jt * b.inv_mass);
        }
    }

    Some(-velocity_along_normal)
}

/// Push the pair apart along the normal by a fraction of the penetration
/// beyond the slop, split by inverse mass.
fn correct_position(registry: &mut BodyRegistry, contact: &Contact, settings: &Settings) {
    let Some((a, b)) = registry.pair_mut(contact.a, contact.b) else {
        return;
    };
    let inv_mass_sum = a.inv_mass + b.inv_mass;
    if inv_mass_sum <= 0.0 {
        return;
    }
    let depth = (contact.penetration - settings.penetration_slop).max(0.0);
    if depth <= 0.0 {
        return;
    }
    let correction = contact.normal * (depth / inv_mass_sum * settings.baumgarte);
    if !correction.is_finite() {
        return;
    }
    if a.inv_mass > 0.0 {
        a.position -= correction * a.inv_mass;
        a.update_aabb();
    }
    if b.inv_mass > 0.0 {
        b.position += correction * b.inv_mass;
        b.update_aabb();
    }
}
