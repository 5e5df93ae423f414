//! Explicit machine planning.

use std::collections::HashMap;

use tracing::debug;

use crate::bundle::Bundle;
use crate::change::{AddMachineParams, ChangeSet, EntityType, Params, SetAnnotationsParams};

/// Emit `addMachines` (and annotations) for every machine declared under
/// `machines:`, in bundle declaration order.
///
/// Returns machine token to change id, for the placement resolver.
pub(crate) fn plan_machines(cs: &mut ChangeSet, bundle: &Bundle) -> HashMap<String, String> {
  let mut ids = HashMap::with_capacity(bundle.machines.len());

  for (token, spec) in &bundle.machines {
    let series = spec
      .series
      .clone()
      .filter(|series| !series.is_empty())
      .or_else(|| bundle.series.clone())
      .unwrap_or_default();
    let id = cs.add(
      Params::AddMachines(AddMachineParams {
        series,
        constraints: spec.constraints.clone(),
        container_type: String::new(),
        parent_id: None,
      }),
      vec![],
    );
    if !spec.annotations.is_empty() {
      cs.add(
        Params::SetAnnotations(SetAnnotationsParams {
          id: format!("${id}"),
          entity_type: EntityType::Machine,
          annotations: spec.annotations.clone(),
        }),
        vec![id.clone()],
      );
    }

    debug!(machine = %token, change = %id, "planned machine");
    ids.insert(token.clone(), id);
  }

  ids
}
