use thiserror::Error;

use crate::body::BodyId;
use crate::constraint::ConstraintId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("invalid body {id}: {reason}")]
    InvalidBody { id: BodyId, reason: String },
    #[error("body {0} already exists")]
    DuplicateBody(BodyId),
    #[error("invalid constraint {id}: {reason}")]
    InvalidConstraint { id: ConstraintId, reason: String },
    #[error("constraint {0} already exists")]
    DuplicateConstraint(ConstraintId),
    #[error("constraint {constraint} references unknown body {body}")]
    UnknownBody {
        constraint: ConstraintId,
        body: BodyId,
    },
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("invalid time step: {0}")]
    InvalidTimestep(f32),
    #[error("physics worker disconnected")]
    WorkerDisconnected,
    #[error("failed to spawn physics worker: {0}")]
    WorkerSpawn(String),
}

impl PhysicsError {
    /// Errors after which the worker stops instead of carrying on.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidSettings(_))
    }
}
