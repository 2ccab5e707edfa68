//! # Collision Detection
//!
//! Two phases: the broad phase turns grid occupancy into candidate pairs
//! gated by AABB overlap, and the narrow phase runs an exact per-shape-pair
//! test through [`CollisionDispatcher`]. Contacts are rebuilt from scratch
//! every sub-step.

mod bounding_sphere;
mod box_box;
mod broad_phase;
mod dispatcher;
mod sphere_box;
mod sphere_sphere;

pub use bounding_sphere::detect_bounding_sphere_collision;
pub use box_box::detect_box_box_collision;
pub use broad_phase::{find_candidate_pairs, rebuild_grid};
pub use dispatcher::CollisionDispatcher;
pub use sphere_box::detect_sphere_box_collision;
pub use sphere_sphere::detect_sphere_sphere_collision;

use crate::types::Vec3;

/// Geometry of a single overlap, with the normal pointing from the first
/// shape towards the second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactGeometry {
    pub normal: Vec3,
    pub penetration: f32,
    pub point: Vec3,
}

impl ContactGeometry {
    /// The same overlap seen from the other body.
    #[must_use]
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.normal.is_finite() && self.penetration.is_finite() && self.point.is_finite()
    }
}

/// A contact between the bodies in arena slots `a` and `b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: usize,
    pub b: usize,
    /// Unit normal from `a` towards `b`.
    pub normal: Vec3,
    pub penetration: f32,
    pub point: Vec3,
}

impl Contact {
    #[must_use]
    pub fn new(a: usize, b: usize, geometry: ContactGeometry) -> Self {
        Self {
            a,
            b,
            normal: geometry.normal,
            penetration: geometry.penetration,
            point: geometry.point,
        }
    }
}
