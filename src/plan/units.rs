//! Placement resolution: expanding unit counts and placement directives
//! into `addUnit` and machine changes.
//!
//! Units are planned in two passes. The allocation pass emits an
//! `addUnit` for every unit of every application before any directive is
//! looked at, so a directive that references an application planned later
//! (`django` placed on `wordpress` units, or `lxc:memcached/2`) already
//! has a change to point at. The resolution pass then interprets each
//! unit's directive, creating machines and containers on demand and
//! wiring the unit's target and requirement.
//!
//! A consequence of the split is that deferred units carry lower ids than
//! the machines later created for them; the closure pass reorders the
//! final sequence so requirements still come first.

use std::collections::HashMap;

use tracing::debug;

use crate::bundle::{Bundle, Directive, Target};
use crate::change::{AddMachineParams, AddUnitParams, ChangeSet, Params};

use super::apps::PlannedApplication;
use super::types::PlanError;

/// A unit emitted during the allocation pass.
struct UnitRecord {
  /// Position of the `addUnit` change inside the change set.
  index: usize,
  /// The change id, used as a co-location target.
  id: String,
}

pub(crate) fn plan_units(
  cs: &mut ChangeSet,
  bundle: &Bundle,
  names: &[&str],
  apps: &HashMap<String, PlannedApplication>,
  machines: &HashMap<String, String>,
) -> Result<(), PlanError> {
  let mut units: HashMap<&str, Vec<UnitRecord>> = HashMap::with_capacity(names.len());
  for &name in names {
    let app = &bundle.applications[name];
    let deploy = &apps[name].deploy_id;
    let records = (0..app.num_units)
      .map(|_| {
        let index = cs.len();
        let id = cs.add(
          Params::AddUnit(AddUnitParams {
            application: format!("${deploy}"),
            to: None,
          }),
          vec![deploy.clone()],
        );
        UnitRecord { index, id }
      })
      .collect();
    units.insert(name, records);
  }

  let mut resolver = Resolver {
    cs,
    bundle,
    apps,
    machines,
    units,
    cursors: HashMap::new(),
  };
  for &name in names {
    resolver.resolve_application(name)?;
  }
  Ok(())
}

struct Resolver<'a> {
  cs: &'a mut ChangeSet,
  bundle: &'a Bundle,
  apps: &'a HashMap<String, PlannedApplication>,
  machines: &'a HashMap<String, String>,
  units: HashMap<&'a str, Vec<UnitRecord>>,
  /// Round-robin cursor per co-location target application.
  cursors: HashMap<String, usize>,
}

impl Resolver<'_> {
  /// Interpret the placement directives of one application's units, in
  /// unit order. Unit `i` takes directive `to[i % len(to)]`; with no
  /// directives at all, units stay unplaced.
  fn resolve_application(&mut self, name: &str) -> Result<(), PlanError> {
    let app = &self.bundle.applications[name];
    let num_units = app.num_units;
    let to = app.to.clone();
    if to.is_empty() {
      return Ok(());
    }
    for i in 0..num_units {
      let text = &to[i % to.len()];
      let directive = Directive::parse(text)?;
      let target = self.resolve_directive(name, text, &directive)?;
      debug!(application = name, unit = i, directive = %text, target = %target, "placed unit");
      let index = self.units[name][i].index;
      self.cs.place_unit(index, &target);
    }
    Ok(())
  }

  /// Resolve a directive to the id of the change the unit lands on.
  fn resolve_directive(&mut self, name: &str, text: &str, directive: &Directive) -> Result<String, PlanError> {
    let Some(kind) = &directive.container else {
      return match &directive.target {
        Target::Machine(token) => self.explicit_machine(text, token),
        Target::New => Ok(self.add_machine(self.apps[name].series.clone(), String::new(), None)),
        Target::Unit { application, unit } => self.target_unit(text, application, *unit),
      };
    };

    // Container form: resolve the parent first, then nest a fresh
    // machine on it. `kind:new` is a standalone container with no
    // parent.
    let (parent, parent_series) = match &directive.target {
      Target::New => (None, None),
      Target::Machine(token) => {
        let id = self.explicit_machine(text, token)?;
        (Some(id), self.bundle.machines[token.as_str()].series.clone())
      }
      Target::Unit { application, unit } => (Some(self.target_unit(text, application, *unit)?), None),
    };
    let series = self.container_series(name, parent_series);
    Ok(self.add_machine(series, kind.clone(), parent))
  }

  /// A container inherits the application's effective series; when the
  /// application has none, the parent machine's declared series and then
  /// the bundle default stand in.
  fn container_series(&self, name: &str, parent_series: Option<String>) -> String {
    let series = &self.apps[name].series;
    if !series.is_empty() {
      return series.clone();
    }
    parent_series
      .filter(|series| !series.is_empty())
      .or_else(|| self.bundle.series.clone())
      .unwrap_or_default()
  }

  fn explicit_machine(&self, text: &str, token: &str) -> Result<String, PlanError> {
    self
      .machines
      .get(token)
      .cloned()
      .ok_or_else(|| PlanError::UnknownMachine {
        directive: text.to_string(),
        machine: token.to_string(),
      })
  }

  /// The change id of the target application's unit a directive lands
  /// on: a specific index for `app/N`, the round-robin cursor otherwise.
  /// The cursor wraps, distributing co-located peers over the target's
  /// units.
  fn target_unit(&mut self, text: &str, application: &str, unit: Option<usize>) -> Result<String, PlanError> {
    let records = self
      .units
      .get(application)
      .ok_or_else(|| PlanError::UnknownApplication {
        directive: text.to_string(),
        application: application.to_string(),
      })?;
    let index = match unit {
      Some(index) => {
        if index >= records.len() {
          return Err(PlanError::UnitOutOfRange {
            directive: text.to_string(),
            application: application.to_string(),
            unit: index,
            num_units: records.len(),
          });
        }
        index
      }
      None => {
        if records.is_empty() {
          return Err(PlanError::NoUnits {
            directive: text.to_string(),
            application: application.to_string(),
          });
        }
        let cursor = self.cursors.entry(application.to_string()).or_insert(0);
        let index = *cursor % records.len();
        *cursor += 1;
        index
      }
    };
    Ok(records[index].id.clone())
  }

  fn add_machine(&mut self, series: String, container_type: String, parent: Option<String>) -> String {
    let requires = parent.iter().cloned().collect();
    let parent_id = parent.map(|id| format!("${id}"));
    self.cs.add(
      Params::AddMachines(AddMachineParams {
        series,
        constraints: String::new(),
        container_type,
        parent_id,
      }),
      requires,
    )
  }
}
