//! Sphere-sphere collision detection

use super::ContactGeometry;
use crate::types::Vec3;

/// Exact test between two spheres.
///
/// Penetration is `radius_a + radius_b - distance`; the normal follows the
/// center line from `a` to `b`. Coincident centers push along +Y.
#[must_use]
pub fn detect_sphere_sphere_collision(
    center_a: Vec3,
    radius_a: f32,
    center_b: Vec3,
    radius_b: f32,
) -> Option<ContactGeometry> {
    let delta = center_b - center_a;
    let distance_squared = delta.length_squared();
    let min_distance = radius_a + radius_b;

    if distance_squared >= min_distance * min_distance {
        return None;
    }

    let distance = distance_squared.sqrt();
    let normal = if distance > 1e-4 {
        delta / distance
    } else {
        Vec3::Y
    };
    let penetration = min_distance - distance;

    Some(ContactGeometry {
        normal,
        penetration,
        point: center_a + normal * (radius_a - penetration * 0.5),
    })
}
