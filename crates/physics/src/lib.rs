#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::cast_precision_loss)]
//! # Rigid-Body Physics Core
//!
//! A CPU rigid-body simulator driven by a message-based worker.
//!
//! The simulation advances in fixed sub-steps. Each sub-step rebuilds a
//! uniform spatial grid for the broad phase, runs shape-pair tests through a
//! dispatch table, resolves contacts with sequential impulses and projects
//! distance constraints, then integrates and updates sleep states.
//!
//! ## Key Components
//!
//! -   **Bodies:** [`BodySpec`] describes a body to create; the registry in
//!     [`registry`] owns the resulting [`Body`] values and the constraints
//!     between them.
//! -   **Simulation:** [`PhysicsSim`] in the [`simulation`] module is the main
//!     entry point. It owns the settings and steps the world forward.
//! -   **Worker:** [`Orchestrator`] turns [`Command`]s into [`Event`]s;
//!     [`worker::spawn`] runs one on a dedicated thread.
//!
//! ## Usage
//!
//! ```rust
//! use physics::{BodyKind, BodySpec, PhysicsSim, Vec3};
//!
//! let mut sim = PhysicsSim::new();
//! sim.add_body(&BodySpec::cuboid(0, Vec3::new(10.0, 1.0, 10.0)).with_kind(BodyKind::Static))?;
//! sim.add_body(&BodySpec::sphere(1, 0.5).with_position(Vec3::new(0.0, 5.0, 0.0)))?;
//!
//! for _ in 0..60 {
//!     sim.step(1.0 / 60.0)?;
//! }
//! let snapshot = sim.snapshot();
//! assert_eq!(snapshot.len(), 2);
//! # Ok::<(), physics::PhysicsError>(())
//! ```

pub mod body;
pub mod collision;
pub mod constraint;
pub mod error;
pub mod integrator;
pub mod messages;
pub mod registry;
pub mod settings;
pub mod shapes;
pub mod simulation;
pub mod sleep;
pub mod spatial_grid;
pub mod steps;
pub mod transform;
pub mod types;
pub mod worker;

pub use body::{Body, BodyId, BodyKind, BodyPatch, BodySpec, ExternalForce};
pub use collision::{CollisionDispatcher, Contact, ContactGeometry};
pub use constraint::{Constraint, ConstraintId, ConstraintKind, ConstraintSpec};
pub use error::PhysicsError;
pub use messages::{BodyState, Command, Event, Statistics};
pub use registry::BodyRegistry;
pub use settings::{Settings, SettingsPatch};
pub use shapes::{Shape, ShapeKind};
pub use simulation::PhysicsSim;
pub use spatial_grid::{SpatialGrid, SpatialGridStats};
pub use transform::{pack_instances, InstanceTransform};
pub use types::{BoundingBox, Material, Vec3};
pub use worker::{Orchestrator, WorkerHandle, WorkerState};
