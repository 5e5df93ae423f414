//! Primitive change operations and the set that accumulates them.

mod set;
mod types;

pub use set::{ChangeSet, ChangeSetError};
pub use types::*;
