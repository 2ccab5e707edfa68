//! # Physics Integration
//!
//! Semi-implicit Euler, split in two halves around the solvers: forces
//! update velocities first, then positions advance with the solved
//! velocities.

use glam::Quat;

use crate::registry::BodyRegistry;
use crate::settings::Settings;
use crate::types::Vec3;

/// Accumulate gravity and external forces and integrate them into the
/// velocities of awake dynamic bodies, then apply damping.
pub fn integrate_forces(registry: &mut BodyRegistry, settings: &Settings, dt: f32) {
    let damping = 1.0 / (1.0 + dt * settings.damping);
    for body in registry.bodies_mut() {
        body.force = Vec3::ZERO;
        body.torque = Vec3::ZERO;
        if !body.is_dynamic() || body.sleeping {
            continue;
        }

        if body.use_gravity {
            body.force += settings.gravity * body.mass;
        }
        for external in &body.external_forces {
            body.force += external.force;
            if let Some(point) = external.point {
                body.torque += (point - body.position).cross(external.force);
            }
        }

        body.velocity += body.force * (body.inv_mass * dt);
        body.velocity *= damping;

        // Inertia is diagonal in the body frame.
        let local_torque = body.orientation.inverse() * glam::Vec3::from(body.torque);
        let local_accel = local_torque * glam::Vec3::from(body.inv_inertia);
        body.angular_velocity += Vec3::from(body.orientation * local_accel) * dt;
        body.angular_velocity *= damping;
    }
}

/// Advance positions and orientations of every awake, non-static body.
/// Kinematic bodies move with whatever velocity they were given.
pub fn integrate_positions(registry: &mut BodyRegistry, dt: f32) {
    for body in registry.bodies_mut() {
        if body.sleeping || body.is_static() {
            continue;
        }
        body.position += body.velocity * dt;

        let w = body.angular_velocity;
        if w.length_squared() > 0.0 {
            let spin = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * body.orientation;
            let next = (body.orientation + spin * (0.5 * dt)).normalize();
            if next.is_finite() {
                body.orientation = next;
            }
        }
        body.update_aabb();
    }
}
