//! # Physics Simulation Core
//!
//! [`PhysicsSim`] owns the body registry, the broad-phase grid, the
//! narrow-phase dispatcher and the settings, and advances them in fixed
//! sub-steps. Every sub-step runs the same pipeline:
//!
//! 1. rebuild the spatial grid and wake sleepers touched by moving bodies
//! 2. integrate forces into velocities
//! 3. broad phase, then narrow phase
//! 4. contact solve, then constraint solve
//! 5. integrate velocities into positions
//! 6. update sleep states
//!
//! Bodies, pairs and constraints are visited in a fixed order, so the same
//! inputs always produce the same snapshot.

use std::time::Instant;

use tracing::{debug, trace};

use crate::body::{Body, BodyId, BodyPatch, BodySpec};
use crate::collision::{find_candidate_pairs, rebuild_grid, CollisionDispatcher, Contact};
use crate::constraint::{Constraint, ConstraintId, ConstraintSpec};
use crate::error::PhysicsError;
use crate::integrator::{integrate_forces, integrate_positions};
use crate::messages::{BodyState, Statistics};
use crate::registry::BodyRegistry;
use crate::settings::{Settings, SettingsPatch};
use crate::sleep::{update_sleep_states, wake_touched};
use crate::spatial_grid::{SpatialGrid, SpatialGridStats};
use crate::steps::{solve_constraints, solve_contacts};

/// Headroom when dividing a delta into sub-steps, so float noise on an
/// exact multiple of the fixed timestep does not add an extra sub-step.
const SUBSTEP_EPSILON: f32 = 1e-4;

#[derive(Copy, Clone, Debug, Default)]
struct StepCounters {
    contact_count: usize,
    contact_iterations: u32,
    constraint_iterations: u32,
    skipped_pairs: usize,
    substeps: u32,
    total_steps: u64,
    step_time_ms: f64,
}

pub struct PhysicsSim {
    registry: BodyRegistry,
    settings: Settings,
    grid: SpatialGrid,
    dispatcher: CollisionDispatcher,
    contacts: Vec<Contact>,
    counters: StepCounters,
}

impl PhysicsSim {
    /// Create an empty simulation with default settings.
    #[must_use]
    pub fn new() -> Self {
        let settings = Settings::default();
        Self {
            registry: BodyRegistry::new(),
            grid: SpatialGrid::new(settings.grid_cell_size),
            settings,
            dispatcher: CollisionDispatcher::new(),
            contacts: Vec::new(),
            counters: StepCounters::default(),
        }
    }

    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidSettings`] if `settings` fail validation.
    pub fn with_settings(settings: Settings) -> Result<Self, PhysicsError> {
        settings.validate()?;
        let mut sim = Self::new();
        sim.grid.set_cell_size(settings.grid_cell_size);
        sim.settings = settings;
        Ok(sim)
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Direct access for hosts that tune settings in place. The next
    /// [`step`](Self::step) validates them before simulating.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Merge a settings patch.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidSettings`]; the current settings are kept.
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<(), PhysicsError> {
        self.settings.apply(patch)?;
        debug!(?patch, "settings updated");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the registry's validation error; nothing is inserted.
    pub fn add_body(&mut self, spec: &BodySpec) -> Result<BodyId, PhysicsError> {
        self.registry.add_body(spec, self.settings.default_material())
    }

    /// Remove a body and its constraints. Returns the cascaded constraint
    /// ids, or `None` for an unknown body.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Vec<ConstraintId>> {
        let cascaded = self.registry.remove_body(id)?;
        // Contacts hold slots, which may be reused.
        self.contacts.clear();
        Some(cascaded)
    }

    /// # Errors
    ///
    /// Returns the validation error; the body is left unchanged.
    pub fn update_body(&mut self, id: BodyId, patch: &BodyPatch) -> Result<bool, PhysicsError> {
        self.registry.update_body(id, patch)
    }

    /// # Errors
    ///
    /// Returns the registry's validation error; nothing is inserted.
    pub fn add_constraint(&mut self, spec: &ConstraintSpec) -> Result<ConstraintId, PhysicsError> {
        self.registry.add_constraint(spec)
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> bool {
        self.registry.remove_constraint(id).is_some()
    }

    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.registry.get(id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.registry.iter().map(|(_, body)| body)
    }

    #[must_use]
    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.registry.constraint(id)
    }

    /// Contacts found in the most recent sub-step.
    #[must_use]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    #[must_use]
    pub fn grid_stats(&self) -> SpatialGridStats {
        self.grid.stats()
    }

    /// Drop all bodies, constraints and counters. Settings are kept.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.grid.clear();
        self.contacts.clear();
        self.counters = StepCounters::default();
        debug!("simulation reset");
    }

    /// Advance the simulation by `delta` seconds.
    ///
    /// The delta is clamped to `fixed_timestep * max_substeps` and split
    /// into equal sub-steps no longer than `fixed_timestep`. A delta of zero
    /// or less simulates nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidSettings`] if the current settings are
    /// invalid, or [`PhysicsError::InvalidTimestep`] for a non-finite delta.
    pub fn step(&mut self, delta: f32) -> Result<(), PhysicsError> {
        self.settings.validate()?;
        if !delta.is_finite() {
            return Err(PhysicsError::InvalidTimestep(delta));
        }

        let start = Instant::now();
        let clamped = delta.min(self.settings.max_delta());
        let substeps = substep_count(clamped, &self.settings);

        let total_steps = self.counters.total_steps + 1;
        self.counters = StepCounters {
            substeps,
            total_steps,
            ..StepCounters::default()
        };
        if substeps > 0 {
            let h = clamped / substeps as f32;
            for _ in 0..substeps {
                self.substep(h);
            }
        }
        self.counters.step_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        debug!(
            delta,
            substeps,
            contacts = self.counters.contact_count,
            time_ms = self.counters.step_time_ms,
            "step complete"
        );
        Ok(())
    }

    fn substep(&mut self, h: f32) {
        if self.grid.cell_size() != self.settings.grid_cell_size {
            self.grid.set_cell_size(self.settings.grid_cell_size);
        }

        // Forces only touch velocities, so the grid can be built first.
        rebuild_grid(&mut self.grid, &self.registry);
        let woken = wake_touched(&mut self.registry, &mut self.grid, &self.settings);

        integrate_forces(&mut self.registry, &self.settings, h);

        let pairs = find_candidate_pairs(&self.grid, &self.registry);
        let mut skipped = 0;
        self.contacts = self.dispatcher.detect_all(&self.registry, &pairs, &mut skipped);

        let contact_report = solve_contacts(&mut self.registry, &self.contacts, &self.settings);
        let constraint_iterations = solve_constraints(&mut self.registry, &self.settings);

        integrate_positions(&mut self.registry, h);
        let fell_asleep = update_sleep_states(&mut self.registry, &self.settings, h);

        let counters = &mut self.counters;
        counters.contact_count = self.contacts.len();
        counters.contact_iterations = counters.contact_iterations.max(contact_report.iterations);
        counters.constraint_iterations = counters.constraint_iterations.max(constraint_iterations);
        counters.skipped_pairs += skipped + contact_report.skipped;

        trace!(
            pairs = pairs.len(),
            contacts = self.contacts.len(),
            woken = woken.len(),
            fell_asleep,
            "sub-step"
        );
    }

    /// Current state of every body, in registry order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BodyState> {
        self.bodies().map(BodyState::from).collect()
    }

    #[must_use]
    pub fn statistics(&self) -> Statistics {
        let sleeping_count = self.bodies().filter(|b| b.sleeping).count();
        let c = self.counters;
        Statistics {
            body_count: self.registry.len(),
            awake_count: self.registry.len() - sleeping_count,
            sleeping_count,
            constraint_count: self.registry.constraint_count(),
            contact_count: c.contact_count,
            contact_iterations: c.contact_iterations,
            constraint_iterations: c.constraint_iterations,
            skipped_pairs: c.skipped_pairs,
            substeps: c.substeps,
            total_steps: c.total_steps,
            step_time_ms: c.step_time_ms,
        }
    }
}

impl Default for PhysicsSim {
    fn default() -> Self {
        Self::new()
    }
}

fn substep_count(delta: f32, settings: &Settings) -> u32 {
    if delta <= 0.0 {
        return 0;
    }
    let n = (delta / settings.fixed_timestep - SUBSTEP_EPSILON).ceil().max(1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = n as u32;
    n.min(settings.max_substeps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyKind;
    use crate::types::Vec3;

    #[test]
    fn delta_is_split_into_fixed_substeps() {
        let settings = Settings::default();
        assert_eq!(substep_count(0.0, &settings), 0);
        assert_eq!(substep_count(1.0 / 60.0, &settings), 1);
        assert_eq!(substep_count(0.02, &settings), 2);
        assert_eq!(substep_count(settings.max_delta(), &settings), 8);
    }

    #[test]
    fn oversized_delta_is_clamped() {
        let mut sim = PhysicsSim::new();
        sim.add_body(&BodySpec::sphere(0, 0.5)).unwrap();
        sim.settings_mut().damping = 0.0;
        sim.step(10.0).unwrap();
        let stats = sim.statistics();
        assert_eq!(stats.substeps, 8);
        let v = sim.body(BodyId(0)).unwrap().velocity.y;
        assert!((v + 9.81 * sim.settings().max_delta()).abs() < 1e-4);
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let mut sim = PhysicsSim::new();
        sim.add_body(&BodySpec::sphere(0, 0.5).with_position(Vec3::new(0.0, 3.0, 0.0)))
            .unwrap();
        sim.step(0.0).unwrap();
        assert_eq!(sim.body(BodyId(0)).unwrap().position.y, 3.0);
        assert_eq!(sim.statistics().total_steps, 1);
    }

    #[test]
    fn non_finite_delta_is_rejected() {
        let mut sim = PhysicsSim::new();
        assert_eq!(
            sim.step(f32::NAN).unwrap_err().to_string(),
            "invalid time step: NaN"
        );
    }

    #[test]
    fn corrupted_settings_fail_the_step() {
        let mut sim = PhysicsSim::new();
        sim.settings_mut().fixed_timestep = -1.0;
        let err = sim.step(0.016).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn reset_keeps_settings() {
        let mut sim = PhysicsSim::new();
        sim.update_settings(&SettingsPatch {
            gravity: Some(Vec3::ZERO),
            ..SettingsPatch::default()
        })
        .unwrap();
        sim.add_body(&BodySpec::cuboid(0, Vec3::ONE).with_kind(BodyKind::Static))
            .unwrap();
        sim.step(0.016).unwrap();
        sim.reset();
        assert!(sim.snapshot().is_empty());
        assert_eq!(sim.statistics(), Statistics::default());
        assert_eq!(sim.settings().gravity, Vec3::ZERO);
    }
}
