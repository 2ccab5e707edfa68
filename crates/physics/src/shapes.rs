//! # Collision Shapes
//!
//! Shape kinds are a closed set, so every per-shape formula (inertia,
//! extents, bounding boxes) is a `match` over [`Shape`] rather than a trait
//! object.

use glam::{Mat3, Quat};
use serde::{Deserialize, Serialize};

use crate::types::{BoundingBox, Vec3};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Box,
    Sphere,
    Cylinder,
    Capsule,
    Generic,
}

/// Shape dimensions in the body's local frame. Cylinders and capsules are
/// aligned with local Y.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    Cylinder { radius: f32, half_height: f32 },
    Capsule { radius: f32, half_height: f32 },
    Generic { half_extents: Vec3 },
}

impl Shape {
    /// Build a shape from a kind and the size vector carried by body specs.
    ///
    /// Boxes and generic shapes read `size` as full width/height/depth.
    /// Spheres read the radius from `size.x`; cylinders and capsules read the
    /// radius from `size.x` and the length of the straight section from
    /// `size.y`.
    ///
    /// # Errors
    ///
    /// Returns a description of the first dimension that is not a finite,
    /// positive number.
    pub fn from_size(kind: ShapeKind, size: Vec3) -> Result<Self, String> {
        let check = |name: &str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(v)
            } else {
                Err(format!("{name} must be finite and positive, got {v}"))
            }
        };
        let shape = match kind {
            ShapeKind::Box | ShapeKind::Generic => {
                let half_extents = Vec3::new(
                    check("width", size.x)?,
                    check("height", size.y)?,
                    check("depth", size.z)?,
                ) * 0.5;
                if kind == ShapeKind::Box {
                    Self::Box { half_extents }
                } else {
                    Self::Generic { half_extents }
                }
            }
            ShapeKind::Sphere => Self::Sphere {
                radius: check("radius", size.x)?,
            },
            ShapeKind::Cylinder => Self::Cylinder {
                radius: check("radius", size.x)?,
                half_height: check("height", size.y)? * 0.5,
            },
            ShapeKind::Capsule => Self::Capsule {
                radius: check("radius", size.x)?,
                half_height: check("height", size.y)? * 0.5,
            },
        };
        Ok(shape)
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Box { .. } => ShapeKind::Box,
            Self::Sphere { .. } => ShapeKind::Sphere,
            Self::Cylinder { .. } => ShapeKind::Cylinder,
            Self::Capsule { .. } => ShapeKind::Capsule,
            Self::Generic { .. } => ShapeKind::Generic,
        }
    }

    /// Diagonal of the inertia tensor for a solid body of the given mass.
    #[must_use]
    pub fn inertia(&self, mass: f32) -> Vec3 {
        match *self {
            Self::Box { half_extents } | Self::Generic { half_extents } => {
                let s = half_extents * 2.0;
                let (w2, h2, d2) = (s.x * s.x, s.y * s.y, s.z * s.z);
                Vec3::new(h2 + d2, w2 + d2, w2 + h2) * (mass / 12.0)
            }
            Self::Sphere { radius } => Vec3::splat(0.4 * mass * radius * radius),
            Self::Cylinder {
                radius,
                half_height,
            } => cylinder_inertia(mass, radius, half_height * 2.0),
            // Solid cylinder spanning the caps.
            Self::Capsule {
                radius,
                half_height,
            } => cylinder_inertia(mass, radius, half_height * 2.0 + radius * 2.0),
        }
    }

    /// Half extents of the shape's box hull in the local frame.
    #[must_use]
    pub fn local_half_extents(&self) -> Vec3 {
        match *self {
            Self::Box { half_extents } | Self::Generic { half_extents } => half_extents,
            Self::Sphere { radius } => Vec3::splat(radius),
            Self::Cylinder {
                radius,
                half_height,
            } => Vec3::new(radius, half_height, radius),
            Self::Capsule {
                radius,
                half_height,
            } => Vec3::new(radius, half_height + radius, radius),
        }
    }

    /// Approximate radius used by the bounding-sphere narrow phase: the exact
    /// radius for spheres, the largest half-extent otherwise.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Self::Sphere { radius } => radius,
            _ => self.local_half_extents().max_element(),
        }
    }

    /// World-space AABB of the shape placed at `position` with `orientation`.
    #[must_use]
    pub fn aabb(&self, position: Vec3, orientation: Quat) -> BoundingBox {
        let half = match *self {
            Self::Sphere { radius } => Vec3::splat(radius),
            _ => rotated_half_extents(self.local_half_extents(), orientation),
        };
        BoundingBox::from_center_half_extents(position, half)
    }
}

fn cylinder_inertia(mass: f32, radius: f32, height: f32) -> Vec3 {
    let r2 = radius * radius;
    let side = mass * (3.0 * r2 + height * height) / 12.0;
    Vec3::new(side, 0.5 * mass * r2, side)
}

/// Half extents of the world AABB enclosing a rotated local box.
fn rotated_half_extents(half: Vec3, orientation: Quat) -> Vec3 {
    let m = Mat3::from_quat(orientation);
    let x = Vec3::from(m.x_axis.abs());
    let y = Vec3::from(m.y_axis.abs());
    let z = Vec3::from(m.z_axis.abs());
    x * half.x + y * half.y + z * half.z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_inertia_matches_closed_form() {
        let shape = Shape::from_size(ShapeKind::Box, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        let i = shape.inertia(12.0);
        assert!((i.x - (4.0 + 9.0)).abs() < 1e-5);
        assert!((i.y - (1.0 + 9.0)).abs() < 1e-5);
        assert!((i.z - (1.0 + 4.0)).abs() < 1e-5);
    }

    #[test]
    fn sphere_inertia_is_two_fifths_mr2() {
        let shape = Shape::from_size(ShapeKind::Sphere, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        assert!((shape.inertia(5.0).y - 8.0).abs() < 1e-5);
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        assert!(Shape::from_size(ShapeKind::Box, Vec3::new(1.0, 0.0, 1.0)).is_err());
        assert!(Shape::from_size(ShapeKind::Sphere, Vec3::new(f32::NAN, 1.0, 1.0)).is_err());
        assert!(Shape::from_size(ShapeKind::Capsule, Vec3::new(0.5, -1.0, 0.5)).is_err());
    }

    #[test]
    fn rotated_box_aabb_grows() {
        let shape = Shape::from_size(ShapeKind::Box, Vec3::new(2.0, 2.0, 2.0)).unwrap();
        let q = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        let aabb = shape.aabb(Vec3::ZERO, q);
        assert!((aabb.max.x - std::f32::consts::SQRT_2).abs() < 1e-5);
        assert!((aabb.max.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn capsule_bounding_radius_includes_caps() {
        let shape = Shape::from_size(ShapeKind::Capsule, Vec3::new(0.5, 2.0, 0.0)).unwrap();
        assert!((shape.bounding_radius() - 1.5).abs() < 1e-6);
    }
}
