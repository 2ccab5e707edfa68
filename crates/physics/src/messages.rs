//! # Worker Protocol
//!
//! Commands flow into the physics worker and events flow back out. Both are
//! internally tagged JSON objects (`{"type": "STEP", "deltaTime": 0.016}`)
//! so a host on the other side of a message port can speak to the worker
//! without sharing Rust types.

use serde::{Deserialize, Serialize};

use crate::body::{Body, BodyId, BodyPatch, BodySpec};
use crate::constraint::{ConstraintId, ConstraintSpec};
use crate::settings::SettingsPatch;
use crate::types::Vec3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Start,
    Stop,
    Step {
        #[serde(rename = "deltaTime")]
        delta_time: f32,
    },
    AddBody {
        spec: BodySpec,
    },
    RemoveBody {
        id: BodyId,
    },
    UpdateBody {
        id: BodyId,
        patch: BodyPatch,
    },
    AddConstraint {
        spec: ConstraintSpec,
    },
    RemoveConstraint {
        id: ConstraintId,
    },
    SetSettings {
        patch: SettingsPatch,
    },
    GetStatistics,
    Reset,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Started,
    Stopped,
    BodyAdded {
        id: BodyId,
    },
    BodyRemoved {
        id: BodyId,
    },
    ConstraintAdded {
        id: ConstraintId,
    },
    ConstraintRemoved {
        id: ConstraintId,
    },
    PhysicsUpdate {
        bodies: Vec<BodyState>,
        statistics: Statistics,
    },
    Statistics(Statistics),
    ResetComplete,
    Error {
        message: String,
    },
}

/// Per-body record in a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyState {
    pub id: BodyId,
    pub position: Vec3,
    /// Euler angles in radians, XYZ order.
    pub rotation: Vec3,
    /// Orientation as `[x, y, z, w]`.
    pub quaternion: [f32; 4],
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub sleeping: bool,
}

impl From<&Body> for BodyState {
    fn from(body: &Body) -> Self {
        Self {
            id: body.id,
            position: body.position,
            rotation: body.euler(),
            quaternion: body.orientation.to_array(),
            velocity: body.velocity,
            angular_velocity: body.angular_velocity,
            sleeping: body.sleeping,
        }
    }
}

/// Counters describing the simulation and its most recent step call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub body_count: usize,
    pub awake_count: usize,
    pub sleeping_count: usize,
    pub constraint_count: usize,
    /// Contacts found in the last sub-step.
    pub contact_count: usize,
    /// Most contact iterations used by any sub-step of the last call.
    pub contact_iterations: u32,
    pub constraint_iterations: u32,
    /// Pairs dropped for non-finite geometry or impulses in the last call.
    pub skipped_pairs: usize,
    pub substeps: u32,
    pub total_steps: u64,
    /// Wall-clock time of the last step call.
    pub step_time_ms: f64,
}
