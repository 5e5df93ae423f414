//! Relation planning.

use std::collections::HashMap;

use crate::bundle::Bundle;
use crate::change::{AddRelationParams, ChangeSet, Params};

use super::apps::PlannedApplication;
use super::types::PlanError;

/// Emit `addRelation` for every declared relation, in bundle order.
///
/// Each endpoint's application is replaced by its deploy id-ref; a
/// `:relname` suffix survives the substitution.
pub(crate) fn plan_relations(
  cs: &mut ChangeSet,
  bundle: &Bundle,
  apps: &HashMap<String, PlannedApplication>,
) -> Result<(), PlanError> {
  for (left, right) in &bundle.relations {
    let (endpoint1, deploy1) = resolve_endpoint(left, apps)?;
    let (endpoint2, deploy2) = resolve_endpoint(right, apps)?;
    cs.add(
      Params::AddRelation(AddRelationParams { endpoint1, endpoint2 }),
      vec![deploy1, deploy2],
    );
  }
  Ok(())
}

fn resolve_endpoint(
  endpoint: &str,
  apps: &HashMap<String, PlannedApplication>,
) -> Result<(String, String), PlanError> {
  let (application, relation) = match endpoint.split_once(':') {
    Some((application, relation)) => (application, Some(relation)),
    None => (endpoint, None),
  };
  let planned = apps.get(application).ok_or_else(|| PlanError::UnknownEndpoint {
    endpoint: endpoint.to_string(),
    application: application.to_string(),
  })?;
  let reference = match relation {
    Some(relation) => format!("${}:{relation}", planned.deploy_id),
    None => format!("${}", planned.deploy_id),
  };
  Ok((reference, planned.deploy_id.clone()))
}
