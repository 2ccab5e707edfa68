//! # Body Registry
//!
//! Owns every body and constraint. Bodies live in a slot arena so the
//! per-step phases can address them by a stable `usize` slot without
//! reallocating; caller-facing [`BodyId`]s are mapped onto slots. A
//! body → constraint back-index makes cascading removal direct.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::body::{Body, BodyId, BodyPatch, BodySpec};
use crate::constraint::{Constraint, ConstraintId, ConstraintKind, ConstraintSpec};
use crate::error::PhysicsError;
use crate::types::Material;

#[derive(Debug, Default)]
pub struct BodyRegistry {
    slots: Vec<Option<Body>>,
    free: Vec<usize>,
    index: HashMap<BodyId, usize>,
    constraints: BTreeMap<ConstraintId, Constraint>,
    by_body: HashMap<BodyId, BTreeSet<ConstraintId>>,
}

impl BodyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a body.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::DuplicateBody`] if the id is taken, or the
    /// validation error from [`Body::from_spec`].
    pub fn add_body(
        &mut self,
        spec: &BodySpec,
        defaults: Material,
    ) -> Result<BodyId, PhysicsError> {
        if self.index.contains_key(&spec.id) {
            return Err(PhysicsError::DuplicateBody(spec.id));
        }
        let body = Body::from_spec(spec, defaults)?;
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(body);
                slot
            }
            None => {
                self.slots.push(Some(body));
                self.slots.len() - 1
            }
        };
        self.index.insert(spec.id, slot);
        debug!(id = %spec.id, slot, "body added");
        Ok(spec.id)
    }

    /// Remove a body and every constraint that references it. Returns the
    /// ids of the cascaded constraints, or `None` for an unknown id.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Vec<ConstraintId>> {
        let slot = self.index.remove(&id)?;
        self.slots[slot] = None;
        self.free.push(slot);

        let cascaded: Vec<ConstraintId> = self
            .by_body
            .remove(&id)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for constraint_id in &cascaded {
            self.remove_constraint(*constraint_id);
        }
        debug!(%id, cascaded = cascaded.len(), "body removed");
        Some(cascaded)
    }

    /// Merge a patch into a body and wake it. Returns `Ok(false)` for an
    /// unknown id.
    ///
    /// # Errors
    ///
    /// Propagates validation errors from [`Body::apply_patch`].
    pub fn update_body(&mut self, id: BodyId, patch: &BodyPatch) -> Result<bool, PhysicsError> {
        match self.get_mut(id) {
            Some(body) => body.apply_patch(patch).map(|()| true),
            None => Ok(false),
        }
    }

    /// Validate and insert a constraint between two registered bodies.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::DuplicateConstraint`],
    /// [`PhysicsError::UnknownBody`] or a validation error.
    pub fn add_constraint(&mut self, spec: &ConstraintSpec) -> Result<ConstraintId, PhysicsError> {
        if self.constraints.contains_key(&spec.id) {
            return Err(PhysicsError::DuplicateConstraint(spec.id));
        }
        let unknown = |body| PhysicsError::UnknownBody {
            constraint: spec.id,
            body,
        };
        let a = self.get(spec.body_a).ok_or_else(|| unknown(spec.body_a))?;
        let b = self.get(spec.body_b).ok_or_else(|| unknown(spec.body_b))?;
        let current_length = (b.world_point(spec.anchor_b) - a.world_point(spec.anchor_a)).length();
        let constraint = Constraint::from_spec(spec, current_length)?;
        if constraint.kind != ConstraintKind::Distance {
            warn!(
                id = %spec.id,
                kind = ?constraint.kind,
                "constraint type is stored but not enforced"
            );
        }

        self.by_body.entry(spec.body_a).or_default().insert(spec.id);
        self.by_body.entry(spec.body_b).or_default().insert(spec.id);
        self.constraints.insert(spec.id, constraint);
        Ok(spec.id)
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> Option<Constraint> {
        let constraint = self.constraints.remove(&id)?;
        for body in [constraint.body_a, constraint.body_b] {
            if let Some(set) = self.by_body.get_mut(&body) {
                set.remove(&id);
                if set.is_empty() {
                    self.by_body.remove(&body);
                }
            }
        }
        Some(constraint)
    }

    /// Drop every body and constraint.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.constraints.clear();
        self.by_body.clear();
    }

    #[must_use]
    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.index.get(&id).and_then(|&slot| self.slot(slot))
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        let slot = *self.index.get(&id)?;
        self.slot_mut(slot)
    }

    #[must_use]
    pub fn slot_of(&self, id: BodyId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    #[must_use]
    pub fn slot(&self, slot: usize) -> Option<&Body> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn slot_mut(&mut self, slot: usize) -> Option<&mut Body> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Mutable access to two distinct slots at once.
    pub fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut Body, &mut Body)> {
        if a == b || a.max(b) >= self.slots.len() {
            return None;
        }
        let (lo, hi) = (a.min(b), a.max(b));
        let (before, after) = self.slots.split_at_mut(hi);
        let (lo_body, hi_body) = (before[lo].as_mut()?, after[0].as_mut()?);
        if a < b {
            Some((lo_body, hi_body))
        } else {
            Some((hi_body, lo_body))
        }
    }

    /// Occupied slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Body)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, body)| body.as_ref().map(|b| (slot, b)))
    }

    pub fn bodies_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    /// Constraints in id order.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    #[must_use]
    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(&id)
    }

    #[must_use]
    pub fn constraints_of(&self, body: BodyId) -> Vec<ConstraintId> {
        self.by_body
            .get(&body)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}
