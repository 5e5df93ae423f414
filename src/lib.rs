//! Compile declarative deployment bundles into ordered change plans.
//!
//! A bundle describes the desired shape of a deployment: applications and
//! the charms they run, their configuration and exposure, explicit
//! machines, relations between application endpoints, and per-unit
//! placement directives. [`from_bundle`] expands that description into a
//! flat, topologically ordered sequence of primitive [`Change`] operations
//! (`addCharm`, `deploy`, `addMachines`, `addUnit`, ...) that a downstream
//! orchestrator can execute one by one.
//!
//! The planner is pure and deterministic: it mutates no external state,
//! and equal bundles always produce equal plans. The only I/O is reading
//! `metadata.yaml` next to a local charm path when nothing else determines
//! the charm's series.

pub mod bundle;
pub mod change;
pub mod charm;
pub mod plan;

pub use bundle::{ApplicationSpec, Bundle, MachineSpec};
pub use change::{Change, EntityType, Params};
pub use plan::{PlanError, from_bundle};
