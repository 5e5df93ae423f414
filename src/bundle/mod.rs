//! Bundle model: the validated input the planner consumes.
//!
//! Reading and schema-validating bundle YAML is the caller's concern; the
//! model derives `Deserialize` so any serde-based reader can produce it.

mod placement;
mod types;

pub use placement::{Directive, InvalidPlacement, Target};
pub use types::*;
