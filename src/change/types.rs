//! Primitive change operations.
//!
//! A [`Change`] is one step of an emitted plan: a synthetic id, a method
//! from a closed set, the typed parameters for that method, and the ids of
//! the changes that must execute first. Wherever a parameter refers to
//! another change it holds the literal string `"$<id>"`, which keeps the
//! plan serialisable and acyclic by construction.

use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Value, json};

/// What a `setAnnotations` change annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
  Application,
  Machine,
}

impl EntityType {
  /// The wire literal for this entity type.
  pub fn as_str(self) -> &'static str {
    match self {
      EntityType::Application => "application",
      EntityType::Machine => "machine",
    }
  }
}

/// Parameters of an `addCharm` change.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddCharmParams {
  /// Charm reference as written in the bundle.
  pub charm: String,
  /// Effective series, empty when undetermined.
  pub series: String,
}

/// Parameters of a `deploy` change.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddApplicationParams {
  /// Id-ref to the `addCharm` providing the charm.
  pub charm: String,
  /// Application name.
  pub application: String,
  /// Effective series, empty when undetermined.
  pub series: String,
  /// Charm configuration options.
  pub options: BTreeMap<String, Value>,
  /// Constraints string, empty when unset.
  pub constraints: String,
  /// Storage constraints per store name.
  pub storage: BTreeMap<String, String>,
  /// Endpoint to network space bindings.
  pub endpoint_bindings: BTreeMap<String, String>,
  /// Resource revision pins.
  pub resources: BTreeMap<String, i64>,
}

/// Parameters of an `expose` change.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposeParams {
  /// Id-ref to the `deploy` of the exposed application.
  pub application: String,
}

/// Parameters of a `setAnnotations` change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetAnnotationsParams {
  /// Id-ref to the annotated `deploy` or `addMachines`.
  pub id: String,
  /// Whether the referent is an application or a machine.
  pub entity_type: EntityType,
  /// The annotations to set.
  pub annotations: BTreeMap<String, String>,
}

/// Parameters of an `addMachines` change.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddMachineParams {
  /// Series for the new machine, empty when undetermined.
  pub series: String,
  /// Constraints string, empty when unset.
  pub constraints: String,
  /// Container type (`lxc`, `kvm`, ...) when the machine is a container.
  pub container_type: String,
  /// Id-ref to the host change when the container nests on one.
  pub parent_id: Option<String>,
}

/// Parameters of an `addRelation` change.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRelationParams {
  /// First endpoint, `"$<deploy-id>[:relname]"`.
  pub endpoint1: String,
  /// Second endpoint, `"$<deploy-id>[:relname]"`.
  pub endpoint2: String,
}

/// Parameters of an `addUnit` change.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddUnitParams {
  /// Id-ref to the `deploy` of the unit's application.
  pub application: String,
  /// Id-ref to the machine or unit the new unit lands on, if placed.
  pub to: Option<String>,
}

/// The typed payload of a change, one variant per method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Params {
  AddCharm(AddCharmParams),
  Deploy(AddApplicationParams),
  Expose(ExposeParams),
  SetAnnotations(SetAnnotationsParams),
  AddMachines(AddMachineParams),
  AddRelation(AddRelationParams),
  AddUnit(AddUnitParams),
}

impl Params {
  /// The wire method literal for this change.
  pub fn method(&self) -> &'static str {
    match self {
      Params::AddCharm(_) => "addCharm",
      Params::Deploy(_) => "deploy",
      Params::Expose(_) => "expose",
      Params::SetAnnotations(_) => "setAnnotations",
      Params::AddMachines(_) => "addMachines",
      Params::AddRelation(_) => "addRelation",
      Params::AddUnit(_) => "addUnit",
    }
  }

  /// Flat positional projection of the parameters for clients that cannot
  /// introspect named fields.
  ///
  /// Map-valued fields are always present (empty maps, never absent); an
  /// unset constraints string projects as `""`, an absent unit placement
  /// as `null`. `addMachines` collapses its four fields into a single
  /// options object with empty fields omitted.
  pub fn gui_args(&self) -> Vec<Value> {
    match self {
      Params::AddCharm(p) => vec![json!(p.charm), json!(p.series)],
      Params::Deploy(p) => vec![
        json!(p.charm),
        json!(p.series),
        json!(p.application),
        json!(p.options),
        json!(p.constraints),
        json!(p.storage),
        json!(p.endpoint_bindings),
        json!(p.resources),
      ],
      Params::Expose(p) => vec![json!(p.application)],
      Params::SetAnnotations(p) => vec![json!(p.id), json!(p.entity_type.as_str()), json!(p.annotations)],
      Params::AddMachines(p) => {
        let mut options = serde_json::Map::new();
        if !p.series.is_empty() {
          options.insert("series".to_string(), json!(p.series));
        }
        if !p.constraints.is_empty() {
          options.insert("constraints".to_string(), json!(p.constraints));
        }
        if !p.container_type.is_empty() {
          options.insert("container_type".to_string(), json!(p.container_type));
        }
        if let Some(parent) = &p.parent_id {
          options.insert("parent_id".to_string(), json!(parent));
        }
        vec![Value::Object(options)]
      }
      Params::AddRelation(p) => vec![json!(p.endpoint1), json!(p.endpoint2)],
      Params::AddUnit(p) => vec![
        json!(p.application),
        p.to.as_ref().map_or(Value::Null, |to| json!(to)),
      ],
    }
  }
}

/// A primitive operation in an emitted plan.
///
/// Changes are value records: created once by the planner and never
/// mutated afterwards. They reference each other only through ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
  pub(crate) id: String,
  pub(crate) requires: Vec<String>,
  pub(crate) params: Params,
}

impl Change {
  /// Synthetic id, `"<method>-<n>"`.
  pub fn id(&self) -> &str {
    &self.id
  }

  /// The wire method literal.
  pub fn method(&self) -> &'static str {
    self.params.method()
  }

  /// Ids of the changes that must execute before this one.
  pub fn requires(&self) -> &[String] {
    &self.requires
  }

  /// The typed parameters.
  pub fn params(&self) -> &Params {
    &self.params
  }

  /// Positional argument projection; see [`Params::gui_args`].
  pub fn gui_args(&self) -> Vec<Value> {
    self.params.gui_args()
  }
}

impl Serialize for Change {
  /// Serialises to the downstream wire shape:
  /// `{id, method, args, requires}`.
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("Change", 4)?;
    state.serialize_field("id", &self.id)?;
    state.serialize_field("method", self.method())?;
    state.serialize_field("args", &self.gui_args())?;
    state.serialize_field("requires", &self.requires)?;
    state.end()
  }
}
