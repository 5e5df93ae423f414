//! Change accumulation, id allocation, and graph closure.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use thiserror::Error;
use tracing::trace;

use super::types::{Change, Params};

/// The requirement graph cannot be closed into an execution order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeSetError {
  /// A change requires an id that was never emitted.
  #[error("change {id} requires unknown change {requirement}")]
  UnknownRequirement { id: String, requirement: String },

  /// The requirements form a cycle, typically two placements that target
  /// each other's units.
  #[error("requirement cycle through change {id}")]
  Cycle { id: String },
}

/// The growing, insertion-ordered sequence of changes.
///
/// Ids are allocated from a single monotonic counter across all methods,
/// so the numeric suffix records global emission order. Consumers of the
/// finished plan must treat ids as opaque tokens: the closure pass may
/// order a change after a higher-numbered one it requires.
#[derive(Debug, Default)]
pub struct ChangeSet {
  changes: Vec<Change>,
}

impl ChangeSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append a change, allocating the next `<method>-<n>` id.
  ///
  /// Returns the id so the caller can reference the change from later
  /// ones.
  pub fn add(&mut self, params: Params, requires: Vec<String>) -> String {
    let id = format!("{}-{}", params.method(), self.changes.len());
    trace!(id = %id, requires = ?requires, "emit change");
    self.changes.push(Change {
      id: id.clone(),
      requires,
      params,
    });
    id
  }

  pub fn len(&self) -> usize {
    self.changes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.changes.is_empty()
  }

  pub fn changes(&self) -> &[Change] {
    &self.changes
  }

  /// Point the `addUnit` at position `index` at its resolved target,
  /// recording the requirement.
  pub(crate) fn place_unit(&mut self, index: usize, target: &str) {
    let change = &mut self.changes[index];
    debug_assert!(matches!(change.params, Params::AddUnit(_)), "place_unit on {}", change.id);
    change.requires.push(target.to_string());
    if let Params::AddUnit(params) = &mut change.params {
      params.to = Some(format!("${target}"));
    }
  }

  /// Close the graph: verify every requirement exists and the graph is
  /// acyclic, then order the changes so that every requirement precedes
  /// its dependents.
  ///
  /// The order is produced by a stable retry queue over the changes in
  /// emission order: a change whose requirements are all out is emitted,
  /// anything else is pushed to the back and retried. Ties are therefore
  /// broken by emission order, which keeps the output deterministic.
  pub fn into_sorted(self) -> Result<Vec<Change>, ChangeSetError> {
    let mut graph = DiGraph::<usize, ()>::with_capacity(self.changes.len(), self.changes.len());
    let mut nodes = HashMap::with_capacity(self.changes.len());
    for (index, change) in self.changes.iter().enumerate() {
      nodes.insert(change.id.as_str(), graph.add_node(index));
    }
    for change in &self.changes {
      let dependent = nodes[change.id.as_str()];
      for requirement in &change.requires {
        let Some(&dependency) = nodes.get(requirement.as_str()) else {
          return Err(ChangeSetError::UnknownRequirement {
            id: change.id.clone(),
            requirement: requirement.clone(),
          });
        };
        graph.add_edge(dependency, dependent, ());
      }
    }
    if let Err(cycle) = toposort(&graph, None) {
      let id = self.changes[graph[cycle.node_id()]].id.clone();
      return Err(ChangeSetError::Cycle { id });
    }

    let mut emitted: HashSet<String> = HashSet::with_capacity(self.changes.len());
    let mut queue: VecDeque<Change> = self.changes.into();
    let mut sorted = Vec::with_capacity(queue.len());
    while let Some(change) = queue.pop_front() {
      if change.requires.iter().all(|requirement| emitted.contains(requirement)) {
        emitted.insert(change.id.clone());
        sorted.push(change);
      } else {
        queue.push_back(change);
      }
    }
    Ok(sorted)
  }
}
