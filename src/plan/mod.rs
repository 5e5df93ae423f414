//! Bundle planning: compiling a bundle model into an ordered change plan.

mod apps;
mod machines;
mod relations;
mod types;
mod units;

pub use types::PlanError;

use tracing::debug;

use crate::bundle::Bundle;
use crate::change::{Change, ChangeSet};

/// Compile a bundle into the ordered list of changes required to deploy
/// it.
///
/// Phases run applications, machines, relations, units; units go last
/// because their placement directives may reference anything the earlier
/// phases produced. Applications are enumerated sorted by name, machines
/// and relations in bundle declaration order. The returned sequence is a
/// valid execution order: every change appears after everything it
/// requires, and equal bundles produce equal sequences.
///
/// # Errors
///
/// Returns a [`PlanError`], and no partial plan, for malformed placement
/// directives, references to applications, units, or machines the bundle
/// does not declare, placements that target each other in a cycle, and
/// local charm metadata that cannot be read.
pub fn from_bundle(bundle: &Bundle) -> Result<Vec<Change>, PlanError> {
  let mut names: Vec<&str> = bundle.applications.keys().map(String::as_str).collect();
  names.sort_unstable();

  let mut cs = ChangeSet::new();
  let apps = apps::plan_applications(&mut cs, bundle, &names)?;
  let machine_ids = machines::plan_machines(&mut cs, bundle);
  relations::plan_relations(&mut cs, bundle, &apps)?;
  units::plan_units(&mut cs, bundle, &names, &apps, &machine_ids)?;
  debug!(changes = cs.len(), "bundle planned");
  Ok(cs.into_sorted()?)
}

#[cfg(test)]
mod tests {
  use crate::bundle::{ApplicationSpec, Bundle};
  use crate::change::ChangeSetError;

  use super::*;

  fn app(charm: &str, num_units: usize, to: &[&str]) -> ApplicationSpec {
    ApplicationSpec {
      charm: charm.to_string(),
      num_units,
      to: to.iter().map(|s| s.to_string()).collect(),
      ..Default::default()
    }
  }

  fn bundle_of(apps: &[(&str, ApplicationSpec)]) -> Bundle {
    Bundle {
      applications: apps.iter().map(|(name, spec)| (name.to_string(), spec.clone())).collect(),
      ..Default::default()
    }
  }

  #[test]
  fn unknown_machine_fails() {
    let bundle = bundle_of(&[("django", app("django", 1, &["42"]))]);
    let err = from_bundle(&bundle).unwrap_err();
    assert_eq!(
      err.to_string(),
      "placement \"42\" references unknown machine \"42\"",
    );
  }

  #[test]
  fn unknown_application_fails() {
    let bundle = bundle_of(&[("django", app("django", 1, &["wordpress"]))]);
    let err = from_bundle(&bundle).unwrap_err();
    assert_eq!(
      err.to_string(),
      "placement \"wordpress\" references unknown application \"wordpress\"",
    );
  }

  #[test]
  fn unit_out_of_range_fails_loudly() {
    let bundle = bundle_of(&[
      ("django", app("django", 1, &["lxc:memcached/3"])),
      ("memcached", app("memcached", 2, &[])),
    ]);
    let err = from_bundle(&bundle).unwrap_err();
    assert_eq!(
      err.to_string(),
      "placement \"lxc:memcached/3\" references unit 3 of \"memcached\", which only has 2 units",
    );
  }

  #[test]
  fn colocation_with_unitless_application_fails() {
    let bundle = bundle_of(&[
      ("django", app("django", 1, &["memcached"])),
      ("memcached", app("memcached", 0, &[])),
    ]);
    let err = from_bundle(&bundle).unwrap_err();
    assert_eq!(
      err.to_string(),
      "placement \"memcached\" references \"memcached\", which has no units",
    );
  }

  #[test]
  fn malformed_directive_fails() {
    let bundle = bundle_of(&[("django", app("django", 1, &["lxc:kvm:1"]))]);
    let err = from_bundle(&bundle).unwrap_err();
    assert_eq!(err.to_string(), "invalid placement \"lxc:kvm:1\": containers cannot nest");
  }

  #[test]
  fn mutual_colocation_is_a_cycle() {
    let bundle = bundle_of(&[
      ("django", app("django", 1, &["wordpress"])),
      ("wordpress", app("wordpress", 1, &["django"])),
    ]);
    let err = from_bundle(&bundle).unwrap_err();
    assert!(matches!(err, PlanError::ChangeSet(ChangeSetError::Cycle { .. })), "got {err}");
  }

  #[test]
  fn zero_units_ignores_placements() {
    // Listed placements without units to consume them are dead letters,
    // not errors.
    let bundle = bundle_of(&[("django", app("django", 0, &["42", "bogus//placement"]))]);
    let changes = from_bundle(&bundle).unwrap();
    let methods: Vec<&str> = changes.iter().map(|c| c.method()).collect();
    assert_eq!(methods, ["addCharm", "deploy"]);
  }

  #[test]
  fn unknown_relation_endpoint_fails() {
    let bundle = Bundle {
      relations: vec![("django:db".to_string(), "mysql".to_string())],
      ..bundle_of(&[("django", app("django", 0, &[]))])
    };
    let err = from_bundle(&bundle).unwrap_err();
    assert_eq!(
      err.to_string(),
      "relation endpoint \"mysql\" references unknown application \"mysql\"",
    );
  }
}
