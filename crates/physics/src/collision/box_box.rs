//! Box-box collision detection
//!
//! Boxes are compared through their world-axis-aligned extents: only the
//! world X, Y and Z axes are tested. This is exact for unrotated boxes and
//! an approximation for rotated ones, not a full oriented separating-axis
//! test.
//!
//! The dispatcher reuses it for a box against a cylinder, capsule or generic
//! shape, comparing both world AABBs under the same approximation.

use super::ContactGeometry;
use crate::types::{BoundingBox, Vec3};

/// Detect overlap between two world-aligned boxes.
///
/// The contact normal is the world axis with the smallest positive
/// penetration, signed from `a` towards `b`.
#[must_use]
pub fn detect_box_box_collision(a: &BoundingBox, b: &BoundingBox) -> Option<ContactGeometry> {
    let center_diff = b.center() - a.center();
    let combined = a.half_extents() + b.half_extents();

    let overlap = [
        combined.x - center_diff.x.abs(),
        combined.y - center_diff.y.abs(),
        combined.z - center_diff.z.abs(),
    ];
    if overlap.iter().any(|&o| o <= 0.0) {
        return None;
    }

    let mut axis = 0;
    for i in 1..3 {
        if overlap[i] < overlap[axis] {
            axis = i;
        }
    }
    let diff = center_diff.to_array();
    let sign = if diff[axis] < 0.0 { -1.0 } else { 1.0 };
    let mut normal = [0.0; 3];
    normal[axis] = sign;

    // Center of the overlap region.
    let lo = a.min.max(b.min);
    let hi = a.max.min(b.max);

    Some(ContactGeometry {
        normal: Vec3::from(normal),
        penetration: overlap[axis],
        point: (lo + hi) * 0.5,
    })
}
