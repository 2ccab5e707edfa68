//! # Simulation Settings
//!
//! Global tunables. [`SettingsPatch`] is merged over the current settings
//! and the result is validated before it is accepted.

use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;
use crate::types::{Material, Vec3};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub gravity: Vec3,
    /// Upper bound on contact and constraint solver iterations per sub-step.
    pub solver_iterations: u32,
    /// Normal velocity below which a contact counts as converged.
    pub convergence_tolerance: f32,
    pub default_restitution: f32,
    pub default_friction: f32,
    /// Linear and angular damping rate per second.
    pub damping: f32,
    pub sleep_velocity_threshold: f32,
    pub sleep_enabled: bool,
    /// Largest sub-step the integrator will take.
    pub fixed_timestep: f32,
    /// Sub-steps per call; a delta above `fixed_timestep * max_substeps` is clamped.
    pub max_substeps: u32,
    pub grid_cell_size: f32,
    /// Fraction of penetration removed per sub-step by positional correction.
    pub baumgarte: f32,
    /// Penetration tolerated without positional correction.
    pub penetration_slop: f32,
    /// Approach speed below which contacts do not bounce.
    pub restitution_threshold: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            solver_iterations: 8,
            convergence_tolerance: 1e-4,
            default_restitution: 0.3,
            default_friction: 0.5,
            damping: 0.01,
            sleep_velocity_threshold: 0.1,
            sleep_enabled: true,
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 8,
            grid_cell_size: 4.0,
            baumgarte: 0.8,
            penetration_slop: 0.01,
            restitution_threshold: 0.5,
        }
    }
}

impl Settings {
    #[must_use]
    pub fn default_material(&self) -> Material {
        Material::new(self.default_restitution, self.default_friction)
    }

    /// Largest delta a single step call will simulate.
    #[must_use]
    pub fn max_delta(&self) -> f32 {
        self.fixed_timestep * self.max_substeps as f32
    }

    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidSettings`] naming the first bad field.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let fail = |msg: &str| Err(PhysicsError::InvalidSettings(msg.to_owned()));
        let positive = |v: f32| v.is_finite() && v > 0.0;
        let non_negative = |v: f32| v.is_finite() && v >= 0.0;
        let unit = |v: f32| v.is_finite() && (0.0..=1.0).contains(&v);

        if !self.gravity.is_finite() {
            return fail("gravity must be finite");
        }
        if self.solver_iterations == 0 {
            return fail("solverIterations must be at least 1");
        }
        if !non_negative(self.convergence_tolerance) {
            return fail("convergenceTolerance must be finite and non-negative");
        }
        if !unit(self.default_restitution) {
            return fail("defaultRestitution must lie in [0, 1]");
        }
        if !non_negative(self.default_friction) {
            return fail("defaultFriction must be finite and non-negative");
        }
        if !non_negative(self.damping) {
            return fail("damping must be finite and non-negative");
        }
        if !non_negative(self.sleep_velocity_threshold) {
            return fail("sleepVelocityThreshold must be finite and non-negative");
        }
        if !positive(self.fixed_timestep) {
            return fail("fixedTimestep must be finite and positive");
        }
        if self.max_substeps == 0 {
            return fail("maxSubsteps must be at least 1");
        }
        if !positive(self.grid_cell_size) {
            return fail("gridCellSize must be finite and positive");
        }
        if !unit(self.baumgarte) {
            return fail("baumgarte must lie in [0, 1]");
        }
        if !non_negative(self.penetration_slop) {
            return fail("penetrationSlop must be finite and non-negative");
        }
        if !non_negative(self.restitution_threshold) {
            return fail("restitutionThreshold must be finite and non-negative");
        }
        Ok(())
    }

    /// Merge `patch` and validate. On error `self` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidSettings`] if the merged settings are invalid.
    pub fn apply(&mut self, patch: &SettingsPatch) -> Result<(), PhysicsError> {
        let mut next = self.clone();
        macro_rules! merge {
            ($($field:ident),*) => {
                $(if let Some(v) = patch.$field { next.$field = v; })*
            };
        }
        merge!(
            gravity,
            solver_iterations,
            convergence_tolerance,
            default_restitution,
            default_friction,
            damping,
            sleep_velocity_threshold,
            sleep_enabled,
            fixed_timestep,
            max_substeps,
            grid_cell_size,
            baumgarte,
            penetration_slop,
            restitution_threshold
        );
        next.validate()?;
        *self = next;
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub gravity: Option<Vec3>,
    pub solver_iterations: Option<u32>,
    pub convergence_tolerance: Option<f32>,
    pub default_restitution: Option<f32>,
    pub default_friction: Option<f32>,
    pub damping: Option<f32>,
    pub sleep_velocity_threshold: Option<f32>,
    pub sleep_enabled: Option<bool>,
    pub fixed_timestep: Option<f32>,
    pub max_substeps: Option<u32>,
    pub grid_cell_size: Option<f32>,
    pub baumgarte: Option<f32>,
    pub penetration_slop: Option<f32>,
    pub restitution_threshold: Option<f32>,
}
