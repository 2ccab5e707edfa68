//! Narrow-phase dispatcher that routes shape pairs to detection routines

use std::collections::HashMap;

use tracing::warn;

use super::{
    detect_bounding_sphere_collision, detect_box_box_collision, detect_sphere_box_collision,
    detect_sphere_sphere_collision, Contact, ContactGeometry,
};
use crate::body::Body;
use crate::registry::BodyRegistry;
use crate::shapes::{Shape, ShapeKind};

/// Function type for collision detection between two bodies
type CollisionDetector = fn(&Body, &Body) -> Option<ContactGeometry>;

/// Table of detection routines keyed by shape-kind pair. Pairs without an
/// entry use the bounding-sphere fallback.
pub struct CollisionDispatcher {
    /// Detector plus whether arguments must be swapped for this ordering.
    detectors: HashMap<(ShapeKind, ShapeKind), (CollisionDetector, bool)>,
}

impl CollisionDispatcher {
    #[must_use]
    pub fn new() -> Self {
        let mut dispatcher = Self {
            detectors: HashMap::new(),
        };
        dispatcher.register(ShapeKind::Sphere, ShapeKind::Sphere, sphere_sphere);
        dispatcher.register(ShapeKind::Sphere, ShapeKind::Box, sphere_box);
        // Boxes against any hull shape compare world AABBs, like box-box. A
        // bounding sphere of a wide box reaches far past its faces.
        for other in [
            ShapeKind::Box,
            ShapeKind::Cylinder,
            ShapeKind::Capsule,
            ShapeKind::Generic,
        ] {
            dispatcher.register(ShapeKind::Box, other, aabb_aabb);
        }
        dispatcher
    }

    /// Register a detector for `(a, b)`; the `(b, a)` ordering reuses it with
    /// swapped arguments and a flipped normal.
    fn register(&mut self, a: ShapeKind, b: ShapeKind, detector: CollisionDetector) {
        self.detectors.insert((a, b), (detector, false));
        if a != b {
            self.detectors.insert((b, a), (detector, true));
        }
    }

    /// Run the narrow-phase test for one pair. The normal points from
    /// `body_a` towards `body_b`.
    #[must_use]
    pub fn detect(&self, body_a: &Body, body_b: &Body) -> Option<ContactGeometry> {
        let key = (body_a.shape.kind(), body_b.shape.kind());
        match self.detectors.get(&key) {
            Some(&(detector, false)) => detector(body_a, body_b),
            Some(&(detector, true)) => detector(body_b, body_a).map(ContactGeometry::flipped),
            None => detect_bounding_sphere_collision(
                body_a.position,
                &body_a.shape,
                body_b.position,
                &body_b.shape,
            ),
        }
    }

    /// Narrow phase over all candidate pairs. Pairs whose result is not
    /// finite are skipped and counted in `skipped`.
    #[must_use]
    pub fn detect_all(
        &self,
        registry: &BodyRegistry,
        pairs: &[(usize, usize)],
        skipped: &mut usize,
    ) -> Vec<Contact> {
        let mut contacts = Vec::with_capacity(pairs.len());
        for &(a, b) in pairs {
            let (Some(body_a), Some(body_b)) = (registry.slot(a), registry.slot(b)) else {
                continue;
            };
            let Some(geometry) = self.detect(body_a, body_b) else {
                continue;
            };
            if geometry.is_finite() {
                contacts.push(Contact::new(a, b, geometry));
            } else {
                warn!(a = %body_a.id, b = %body_b.id, "skipping pair with non-finite contact");
                *skipped += 1;
            }
        }
        contacts
    }
}

impl Default for CollisionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn sphere_radius(body: &Body) -> f32 {
    match body.shape {
        Shape::Sphere { radius } => radius,
        _ => body.shape.bounding_radius(),
    }
}

fn sphere_sphere(a: &Body, b: &Body) -> Option<ContactGeometry> {
    detect_sphere_sphere_collision(a.position, sphere_radius(a), b.position, sphere_radius(b))
}

fn aabb_aabb(a: &Body, b: &Body) -> Option<ContactGeometry> {
    detect_box_box_collision(&a.aabb, &b.aabb)
}

fn sphere_box(sphere: &Body, box_body: &Body) -> Option<ContactGeometry> {
    detect_sphere_box_collision(sphere.position, sphere_radius(sphere), &box_body.aabb)
}
