//! # Rigid Bodies
//!
//! [`BodySpec`] and [`BodyPatch`] are the wire-level descriptions accepted by
//! the registry; [`Body`] is the simulation state derived from them.

use std::fmt;

use glam::Quat;
use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;
use crate::shapes::{Shape, ShapeKind};
use crate::transform::{quat_from_euler, quat_to_euler};
use crate::types::{BoundingBox, Material, Vec3};

/// Caller-assigned body identifier, stable for the life of the body.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    Static,
    #[default]
    Dynamic,
    Kinematic,
}

/// A persistent force re-applied every sub-step until replaced.
///
/// With a world-space `point` the force also produces torque about the
/// body's center.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalForce {
    pub force: Vec3,
    #[serde(default)]
    pub point: Option<Vec3>,
}

/// Description of a body to create.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BodySpec {
    pub id: BodyId,
    #[serde(rename = "type")]
    pub kind: BodyKind,
    pub position: Vec3,
    /// Euler angles in radians, XYZ order.
    pub rotation: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub mass: f32,
    /// Falls back to the simulation's default restitution.
    pub restitution: Option<f32>,
    /// Falls back to the simulation's default friction.
    pub friction: Option<f32>,
    pub use_gravity: bool,
    pub shape: ShapeKind,
    pub size: Vec3,
}

impl Default for BodySpec {
    fn default() -> Self {
        Self {
            id: BodyId::default(),
            kind: BodyKind::Dynamic,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: 1.0,
            restitution: None,
            friction: None,
            use_gravity: true,
            shape: ShapeKind::Box,
            size: Vec3::ONE,
        }
    }
}

impl BodySpec {
    /// Dynamic sphere of unit mass.
    #[must_use]
    pub fn sphere(id: u32, radius: f32) -> Self {
        Self {
            id: BodyId(id),
            shape: ShapeKind::Sphere,
            size: Vec3::splat(radius),
            ..Self::default()
        }
    }

    /// Dynamic box of unit mass with full dimensions `size`.
    #[must_use]
    pub fn cuboid(id: u32, size: Vec3) -> Self {
        Self {
            id: BodyId(id),
            shape: ShapeKind::Box,
            size,
            ..Self::default()
        }
    }

    /// Dynamic Y-aligned cylinder of unit mass.
    #[must_use]
    pub fn cylinder(id: u32, radius: f32, height: f32) -> Self {
        Self {
            id: BodyId(id),
            shape: ShapeKind::Cylinder,
            size: Vec3::new(radius, height, radius),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: BodyKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    #[must_use]
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: Material) -> Self {
        self.restitution = Some(material.restitution);
        self.friction = Some(material.friction);
        self
    }

    #[must_use]
    pub fn with_gravity(mut self, use_gravity: bool) -> Self {
        self.use_gravity = use_gravity;
        self
    }
}

/// Partial update merged into an existing body. Absent fields are untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BodyPatch {
    #[serde(rename = "type")]
    pub kind: Option<BodyKind>,
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub velocity: Option<Vec3>,
    pub angular_velocity: Option<Vec3>,
    pub mass: Option<f32>,
    pub restitution: Option<f32>,
    pub friction: Option<f32>,
    pub use_gravity: Option<bool>,
    pub shape: Option<ShapeKind>,
    pub size: Option<Vec3>,
    pub external_forces: Option<Vec<ExternalForce>>,
}

#[derive(Clone, Debug)]
pub struct Body {
    pub id: BodyId,
    pub kind: BodyKind,
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub mass: f32,
    pub inv_mass: f32,
    /// Diagonal of the local inertia tensor.
    pub inertia: Vec3,
    pub inv_inertia: Vec3,
    pub shape: Shape,
    pub size: Vec3,
    pub material: Material,
    pub use_gravity: bool,
    /// Per-step accumulators, cleared at the start of every sub-step.
    pub force: Vec3,
    pub torque: Vec3,
    pub external_forces: Vec<ExternalForce>,
    pub sleeping: bool,
    pub still_time: f32,
    pub aabb: BoundingBox,
}

impl Body {
    /// Validate `spec` and derive the full body state from it.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] for non-finite vectors, negative
    /// mass, out-of-range material coefficients or bad shape dimensions.
    pub fn from_spec(spec: &BodySpec, defaults: Material) -> Result<Self, PhysicsError> {
        let invalid = |reason: String| PhysicsError::InvalidBody {
            id: spec.id,
            reason,
        };
        for (name, v) in [
            ("position", spec.position),
            ("rotation", spec.rotation),
            ("velocity", spec.velocity),
            ("angularVelocity", spec.angular_velocity),
        ] {
            if !v.is_finite() {
                return Err(invalid(format!("{name} is not finite")));
            }
        }
        validate_mass(spec.mass).map_err(invalid)?;
        let material = Material::new(
            spec.restitution.unwrap_or(defaults.restitution),
            spec.friction.unwrap_or(defaults.friction),
        );
        validate_material(material).map_err(invalid)?;
        let shape = Shape::from_size(spec.shape, spec.size).map_err(invalid)?;

        let mut body = Self {
            id: spec.id,
            kind: spec.kind,
            position: spec.position,
            orientation: quat_from_euler(spec.rotation),
            velocity: spec.velocity,
            angular_velocity: spec.angular_velocity,
            mass: spec.mass,
            inv_mass: 0.0,
            inertia: Vec3::ZERO,
            inv_inertia: Vec3::ZERO,
            shape,
            size: spec.size,
            material,
            use_gravity: spec.use_gravity,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            external_forces: Vec::new(),
            sleeping: false,
            still_time: 0.0,
            aabb: BoundingBox::default(),
        };
        body.update_mass_properties();
        if body.is_static() {
            body.velocity = Vec3::ZERO;
            body.angular_velocity = Vec3::ZERO;
        }
        body.update_aabb();
        Ok(body)
    }

    /// Merge `patch` into this body. The patch is applied to a copy first so
    /// a rejected patch leaves the body untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if the merged state is invalid.
    pub fn apply_patch(&mut self, patch: &BodyPatch) -> Result<(), PhysicsError> {
        let invalid = |reason: String| PhysicsError::InvalidBody {
            id: self.id,
            reason,
        };
        let mut next = self.clone();

        for (name, v) in [
            ("position", patch.position),
            ("rotation", patch.rotation),
            ("velocity", patch.velocity),
            ("angularVelocity", patch.angular_velocity),
        ] {
            if v.is_some_and(|v| !v.is_finite()) {
                return Err(invalid(format!("{name} is not finite")));
            }
        }

        if let Some(kind) = patch.kind {
            next.kind = kind;
        }
        if let Some(position) = patch.position {
            next.position = position;
        }
        if let Some(rotation) = patch.rotation {
            next.orientation = quat_from_euler(rotation);
        }
        if let Some(velocity) = patch.velocity {
            next.velocity = velocity;
        }
        if let Some(angular_velocity) = patch.angular_velocity {
            next.angular_velocity = angular_velocity;
        }
        if let Some(mass) = patch.mass {
            validate_mass(mass).map_err(invalid)?;
            next.mass = mass;
        }
        if let Some(restitution) = patch.restitution {
            next.material.restitution = restitution;
        }
        if let Some(friction) = patch.friction {
            next.material.friction = friction;
        }
        validate_material(next.material).map_err(invalid)?;
        if let Some(use_gravity) = patch.use_gravity {
            next.use_gravity = use_gravity;
        }
        if patch.shape.is_some() || patch.size.is_some() {
            let kind = patch.shape.unwrap_or_else(|| next.shape.kind());
            let size = patch.size.unwrap_or(next.size);
            next.shape = Shape::from_size(kind, size).map_err(invalid)?;
            next.size = size;
        }
        if let Some(forces) = &patch.external_forces {
            if forces
                .iter()
                .any(|f| !f.force.is_finite() || f.point.is_some_and(|p| !p.is_finite()))
            {
                return Err(invalid("external force is not finite".into()));
            }
            next.external_forces.clone_from(forces);
        }

        if patch.kind.is_some()
            || patch.mass.is_some()
            || patch.shape.is_some()
            || patch.size.is_some()
        {
            next.update_mass_properties();
        }
        if next.is_static() {
            next.velocity = Vec3::ZERO;
            next.angular_velocity = Vec3::ZERO;
        }
        next.update_aabb();
        next.wake();

        *self = next;
        Ok(())
    }

    /// Recompute inverse mass and inertia from kind, mass and shape.
    pub fn update_mass_properties(&mut self) {
        self.inv_mass = if self.kind == BodyKind::Dynamic && self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        };
        self.inertia = self.shape.inertia(self.mass);
        let inv = |i: f32| if self.inv_mass > 0.0 && i > 0.0 { 1.0 / i } else { 0.0 };
        self.inv_inertia = Vec3::new(inv(self.inertia.x), inv(self.inertia.y), inv(self.inertia.z));
    }

    pub fn update_aabb(&mut self) {
        self.aabb = self.shape.aabb(self.position, self.orientation);
    }

    /// Dynamic with finite mass: integrated, solved and subject to sleeping.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic && self.inv_mass > 0.0
    }

    #[must_use]
    pub fn is_kinematic(&self) -> bool {
        self.kind == BodyKind::Kinematic
    }

    /// Static kind, or a dynamic body with zero mass. Never moves.
    #[must_use]
    pub fn is_static(&self) -> bool {
        !self.is_dynamic() && !self.is_kinematic()
    }

    /// Clear the sleeping flag and restart the still-time counter.
    pub fn wake(&mut self) {
        self.sleeping = false;
        self.still_time = 0.0;
    }

    /// Euler-angle view (XYZ, radians) of the orientation.
    #[must_use]
    pub fn euler(&self) -> Vec3 {
        quat_to_euler(self.orientation)
    }

    /// Transform a point from the body frame to world space.
    #[must_use]
    pub fn world_point(&self, local: Vec3) -> Vec3 {
        self.position + Vec3::from(self.orientation * glam::Vec3::from(local))
    }
}

fn validate_mass(mass: f32) -> Result<(), String> {
    if mass.is_finite() && mass >= 0.0 {
        Ok(())
    } else {
        Err(format!("mass must be finite and non-negative, got {mass}"))
    }
}

fn validate_material(material: Material) -> Result<(), String> {
    if !(material.restitution.is_finite() && (0.0..=1.0).contains(&material.restitution)) {
        return Err(format!(
            "restitution must lie in [0, 1], got {}",
            material.restitution
        ));
    }
    if !(material.friction.is_finite() && material.friction >= 0.0) {
        return Err(format!(
            "friction must be finite and non-negative, got {}",
            material.friction
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_mass_dynamic_is_static() {
        let body = Body::from_spec(&BodySpec::sphere(1, 0.5).with_mass(0.0), Material::default())
            .unwrap();
        assert!(body.is_static());
        assert_eq!(body.inv_mass, 0.0);
        assert_eq!(body.inv_inertia, Vec3::ZERO);
    }

    #[test]
    fn rejected_patch_leaves_body_untouched() {
        let mut body =
            Body::from_spec(&BodySpec::sphere(1, 0.5), Material::default()).unwrap();
        let patch = BodyPatch {
            position: Some(Vec3::new(5.0, 0.0, 0.0)),
            mass: Some(-1.0),
            ..BodyPatch::default()
        };
        assert!(body.apply_patch(&patch).is_err());
        assert_eq!(body.position, Vec3::ZERO);
    }

    #[test]
    fn shape_patch_recomputes_inertia_and_aabb() {
        let mut body =
            Body::from_spec(&BodySpec::sphere(1, 0.5), Material::default()).unwrap();
        body.sleeping = true;
        body.apply_patch(&BodyPatch {
            size: Some(Vec3::splat(2.0)),
            ..BodyPatch::default()
        })
        .unwrap();
        assert!((body.inertia.x - 1.6).abs() < 1e-5);
        assert!((body.aabb.max.x - 2.0).abs() < 1e-5);
        assert!(!body.sleeping);
    }

    #[test]
    fn spec_deserializes_from_camel_case() {
        let json = r#"{"id":7,"type":"static","shape":"sphere","size":{"x":0.5,"y":0.5,"z":0.5},"useGravity":false}"#;
        let spec: BodySpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.id, BodyId(7));
        assert_eq!(spec.kind, BodyKind::Static);
        assert!(!spec.use_gravity);
        assert!((spec.mass - 1.0).abs() < f32::EPSILON);
    }
}
