//! Bounding-sphere fallback for shape pairs without a dedicated test

use super::{detect_sphere_sphere_collision, ContactGeometry};
use crate::shapes::Shape;
use crate::types::Vec3;

/// Treat both shapes as spheres whose radius is their largest half-extent.
#[must_use]
pub fn detect_bounding_sphere_collision(
    center_a: Vec3,
    shape_a: &Shape,
    center_b: Vec3,
    shape_b: &Shape,
) -> Option<ContactGeometry> {
    detect_sphere_sphere_collision(
        center_a,
        shape_a.bounding_radius(),
        center_b,
        shape_b.bounding_radius(),
    )
}
