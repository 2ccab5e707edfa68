//! Solver passes run inside each sub-step, after the narrow phase.

pub mod contact;
pub mod joint;

pub use contact::{solve_contacts, ContactSolveReport};
pub use joint::solve_constraints;
