//! Application planning: charms, deploys, exposure, annotations.

use std::collections::HashMap;

use tracing::debug;

use crate::bundle::Bundle;
use crate::change::{
  AddApplicationParams, AddCharmParams, ChangeSet, EntityType, ExposeParams, Params, SetAnnotationsParams,
};
use crate::charm;

use super::types::PlanError;

/// What the application phase records for the later phases.
#[derive(Debug, Clone)]
pub(crate) struct PlannedApplication {
  /// Id of the application's `deploy` change.
  pub deploy_id: String,
  /// Effective series, empty when undetermined.
  pub series: String,
}

/// Emit `addCharm`/`deploy`/`expose`/`setAnnotations` for every
/// application, in the given enumeration order.
///
/// Applications sharing a `(charm, series)` key share one `addCharm`.
pub(crate) fn plan_applications(
  cs: &mut ChangeSet,
  bundle: &Bundle,
  names: &[&str],
) -> Result<HashMap<String, PlannedApplication>, PlanError> {
  let mut charms: HashMap<(String, String), String> = HashMap::new();
  let mut planned = HashMap::with_capacity(names.len());

  for &name in names {
    let app = &bundle.applications[name];
    let series = charm::application_series(app, bundle.series.as_deref())?;

    let key = (app.charm.clone(), series.clone());
    let charm_id = match charms.get(&key) {
      Some(id) => id.clone(),
      None => {
        let id = cs.add(
          Params::AddCharm(AddCharmParams {
            charm: app.charm.clone(),
            series: series.clone(),
          }),
          vec![],
        );
        charms.insert(key, id.clone());
        id
      }
    };

    let deploy_id = cs.add(
      Params::Deploy(AddApplicationParams {
        charm: format!("${charm_id}"),
        application: name.to_string(),
        series: series.clone(),
        options: app.options.clone(),
        constraints: app.constraints.clone(),
        storage: app.storage.clone(),
        endpoint_bindings: app.endpoint_bindings.clone(),
        resources: app.resources.clone(),
      }),
      vec![charm_id],
    );

    if app.expose {
      cs.add(
        Params::Expose(ExposeParams {
          application: format!("${deploy_id}"),
        }),
        vec![deploy_id.clone()],
      );
    }
    if !app.annotations.is_empty() {
      cs.add(
        Params::SetAnnotations(SetAnnotationsParams {
          id: format!("${deploy_id}"),
          entity_type: EntityType::Application,
          annotations: app.annotations.clone(),
        }),
        vec![deploy_id.clone()],
      );
    }

    debug!(application = name, series = %series, deploy = %deploy_id, "planned application");
    planned.insert(name.to_string(), PlannedApplication { deploy_id, series });
  }

  Ok(planned)
}
