//! Sphere-box collision detection

use super::ContactGeometry;
use crate::types::{BoundingBox, Vec3};

/// Detect collision between a sphere and a box, using the box's
/// world-aligned extents (same approximation as box-box).
///
/// The normal points from the sphere towards the box.
#[must_use]
pub fn detect_sphere_box_collision(
    center: Vec3,
    radius: f32,
    box_bounds: &BoundingBox,
) -> Option<ContactGeometry> {
    let closest = center.max(box_bounds.min).min(box_bounds.max);
    let delta = closest - center;
    let distance_squared = delta.length_squared();

    if distance_squared >= radius * radius {
        return None;
    }

    let distance = distance_squared.sqrt();
    if distance > 1e-4 {
        return Some(ContactGeometry {
            normal: delta / distance,
            penetration: radius - distance,
            point: closest,
        });
    }

    // Center inside the box: leave through the nearest face.
    let (normal, face_distance) = nearest_face(center, box_bounds);
    Some(ContactGeometry {
        normal,
        penetration: radius + face_distance,
        point: center,
    })
}

/// Normal pointing into the box from its nearest face, and the distance from
/// `point` to that face.
fn nearest_face(point: Vec3, bounds: &BoundingBox) -> (Vec3, f32) {
    let local = (point - bounds.center()).to_array();
    let half = bounds.half_extents().to_array();
    let mut axis = 0;
    let mut best = f32::INFINITY;
    for i in 0..3 {
        let d = half[i] - local[i].abs();
        if d < best {
            best = d;
            axis = i;
        }
    }
    let mut normal = [0.0; 3];
    normal[axis] = if local[axis] < 0.0 { 1.0 } else { -1.0 };
    (Vec3::from(normal), best)
}
