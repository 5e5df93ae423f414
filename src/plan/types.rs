//! Planner error types.

use thiserror::Error;

use crate::bundle::InvalidPlacement;
use crate::change::ChangeSetError;
use crate::charm::MetadataError;

/// Errors surfaced while compiling a bundle into a change plan.
///
/// Any of these aborts the whole plan; no partial sequence is ever
/// returned. Bundle-level schema problems (undefined charms, negative
/// unit counts, and the like) are the bundle validator's concern and are
/// assumed absent on entry.
#[derive(Debug, Error)]
pub enum PlanError {
  /// A placement directive could not be parsed.
  #[error(transparent)]
  Placement(#[from] InvalidPlacement),

  /// A placement referenced an application the bundle does not declare.
  #[error("placement {directive:?} references unknown application {application:?}")]
  UnknownApplication { directive: String, application: String },

  /// A placement referenced a machine the bundle does not declare.
  #[error("placement {directive:?} references unknown machine {machine:?}")]
  UnknownMachine { directive: String, machine: String },

  /// An `app/N` placement named a unit the application never produces.
  #[error(
    "placement {directive:?} references unit {unit} of {application:?}, which only has {num_units} units"
  )]
  UnitOutOfRange {
    directive: String,
    application: String,
    unit: usize,
    num_units: usize,
  },

  /// A co-location target has no units to share.
  #[error("placement {directive:?} references {application:?}, which has no units")]
  NoUnits { directive: String, application: String },

  /// A relation endpoint referenced an application the bundle does not
  /// declare.
  #[error("relation endpoint {endpoint:?} references unknown application {application:?}")]
  UnknownEndpoint { endpoint: String, application: String },

  /// A local charm's metadata could not be consulted for series
  /// inference.
  #[error(transparent)]
  Metadata(#[from] MetadataError),

  /// The emitted changes do not form a valid execution order, typically
  /// because placements target each other's units.
  #[error(transparent)]
  ChangeSet(#[from] ChangeSetError),
}
