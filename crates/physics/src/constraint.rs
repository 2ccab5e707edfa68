//! # Constraints
//!
//! Explicit joints between two bodies. Only distance constraints are
//! enforced; hinge and slider are accepted and stored but not solved.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::body::BodyId;
use crate::error::PhysicsError;
use crate::types::Vec3;

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConstraintId(pub u32);

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    #[default]
    Distance,
    Hinge,
    Slider,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintSpec {
    pub id: ConstraintId,
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Anchor in body A's local frame.
    pub anchor_a: Vec3,
    /// Anchor in body B's local frame.
    pub anchor_b: Vec3,
    /// Target anchor separation; `None` keeps the separation at creation.
    pub rest_length: Option<f32>,
    pub stiffness: f32,
    pub damping: f32,
    /// Stored with the constraint; nothing in the solver reads it.
    pub break_force: Option<f32>,
}

impl Default for ConstraintSpec {
    fn default() -> Self {
        Self {
            id: ConstraintId::default(),
            kind: ConstraintKind::Distance,
            body_a: BodyId::default(),
            body_b: BodyId::default(),
            anchor_a: Vec3::ZERO,
            anchor_b: Vec3::ZERO,
            rest_length: None,
            stiffness: 1.0,
            damping: 1.0,
            break_force: None,
        }
    }
}

impl ConstraintSpec {
    #[must_use]
    pub fn distance(id: u32, body_a: BodyId, body_b: BodyId, rest_length: f32) -> Self {
        Self {
            id: ConstraintId(id),
            body_a,
            body_b,
            rest_length: Some(rest_length),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub id: ConstraintId,
    pub kind: ConstraintKind,
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub anchor_a: Vec3,
    pub anchor_b: Vec3,
    pub rest_length: f32,
    pub stiffness: f32,
    pub damping: f32,
    pub break_force: Option<f32>,
}

impl Constraint {
    /// Validate `spec`. `current_length` is the anchor separation at the
    /// time of creation, used when the [`ConstraintSpec`] has no rest length.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidConstraint`] for a self-referencing
    /// constraint or out-of-range parameters.
    pub fn from_spec(spec: &ConstraintSpec, current_length: f32) -> Result<Self, PhysicsError> {
        let invalid = |reason: &str| PhysicsError::InvalidConstraint {
            id: spec.id,
            reason: reason.to_owned(),
        };
        if spec.body_a == spec.body_b {
            return Err(invalid("a constraint needs two distinct bodies"));
        }
        if !spec.anchor_a.is_finite() || !spec.anchor_b.is_finite() {
            return Err(invalid("anchors must be finite"));
        }
        let rest_length = spec.rest_length.unwrap_or(current_length);
        if !(rest_length.is_finite() && rest_length >= 0.0) {
            return Err(invalid("rest length must be finite and non-negative"));
        }
        if !(spec.stiffness.is_finite() && spec.stiffness > 0.0 && spec.stiffness <= 1.0) {
            return Err(invalid("stiffness must lie in (0, 1]"));
        }
        if !(spec.damping.is_finite() && (0.0..=1.0).contains(&spec.damping)) {
            return Err(invalid("damping must lie in [0, 1]"));
        }
        if spec.break_force.is_some_and(f32::is_nan) {
            return Err(invalid("break force must be a number"));
        }
        Ok(Self {
            id: spec.id,
            kind: spec.kind,
            body_a: spec.body_a,
            body_b: spec.body_b,
            anchor_a: spec.anchor_a,
            anchor_b: spec.anchor_b,
            rest_length,
            stiffness: spec.stiffness,
            damping: spec.damping,
            break_force: spec.break_force,
        })
    }
}
