//! Bundle model types.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A declarative description of a multi-application deployment.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
  /// Default operating-system series for applications and machines that
  /// do not declare their own.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub series: Option<String>,

  /// Application name to application spec, in declaration order. The
  /// `services` key is accepted as the historical alias.
  #[serde(default, alias = "services")]
  pub applications: IndexMap<String, ApplicationSpec>,

  /// Explicit machines keyed by machine token ("1", "2", ...), in
  /// declaration order.
  #[serde(default, deserialize_with = "machine_map")]
  pub machines: IndexMap<String, MachineSpec>,

  /// Relations between application endpoints (`app` or `app:relname`).
  #[serde(default)]
  pub relations: Vec<(String, String)>,
}

/// One named application and everything the bundle says about it.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSpec {
  /// Charm reference: a store URL such as `cs:precise/mediawiki-10` or a
  /// local filesystem path.
  pub charm: String,

  /// Operating-system series, overriding every other source.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub series: Option<String>,

  /// How many units to run.
  #[serde(default)]
  pub num_units: usize,

  /// Placement directives, consumed round-robin by the units. A single
  /// bare directive is accepted in place of a list.
  #[serde(default, deserialize_with = "placement_list")]
  pub to: Vec<String>,

  /// Whether the application is exposed outside the model.
  #[serde(default)]
  pub expose: bool,

  /// Charm configuration options.
  #[serde(default)]
  pub options: BTreeMap<String, Value>,

  /// Machine constraints, as an opaque string ("mem=42G ...").
  #[serde(default)]
  pub constraints: String,

  /// Free-form annotations attached to the deployed application.
  #[serde(default)]
  pub annotations: BTreeMap<String, String>,

  /// Storage constraints per store name.
  #[serde(default)]
  pub storage: BTreeMap<String, String>,

  /// Endpoint name to network space bindings.
  #[serde(default, rename = "bindings")]
  pub endpoint_bindings: BTreeMap<String, String>,

  /// Resource name to revision pins.
  #[serde(default)]
  pub resources: BTreeMap<String, i64>,
}

/// One explicitly declared machine.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSpec {
  /// Operating-system series, falling back to the bundle default.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub series: Option<String>,

  /// Machine constraints, as an opaque string.
  #[serde(default)]
  pub constraints: String,

  /// Free-form annotations attached to the machine.
  #[serde(default)]
  pub annotations: BTreeMap<String, String>,
}

/// Bundle YAML writes machine tokens both bare (`1`) and quoted (`"1"`);
/// accept either and normalise to a string.
#[derive(Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
enum Token {
  Number(u64),
  Text(String),
}

impl From<Token> for String {
  fn from(token: Token) -> Self {
    match token {
      Token::Number(n) => n.to_string(),
      Token::Text(text) => text,
    }
  }
}

/// Machine entries may have no body at all (`2:`), which parses as null.
fn machine_map<'de, D>(deserializer: D) -> Result<IndexMap<String, MachineSpec>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw: IndexMap<Token, Option<MachineSpec>> = IndexMap::deserialize(deserializer)?;
  Ok(
    raw
      .into_iter()
      .map(|(token, spec)| (token.into(), spec.unwrap_or_default()))
      .collect(),
  )
}

fn placement_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum OneOrMany {
    One(Token),
    Many(Vec<Token>),
  }

  match OneOrMany::deserialize(deserializer) {
    Ok(OneOrMany::One(directive)) => Ok(vec![directive.into()]),
    Ok(OneOrMany::Many(directives)) => Ok(directives.into_iter().map(String::from).collect()),
    Err(_) => Err(D::Error::custom("placement must be a directive or a list of directives")),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deserialize_minimal_bundle() {
    let bundle: Bundle = serde_yaml::from_str(
      r#"
        applications:
          django:
            charm: django
      "#,
    )
    .unwrap();

    assert_eq!(bundle.applications.len(), 1);
    let app = &bundle.applications["django"];
    assert_eq!(app.charm, "django");
    assert_eq!(app.num_units, 0);
    assert!(!app.expose);
    assert!(app.to.is_empty());
  }

  #[test]
  fn services_alias_is_accepted() {
    let bundle: Bundle = serde_yaml::from_str(
      r#"
        services:
          mysql:
            charm: cs:precise/mysql-28
      "#,
    )
    .unwrap();

    assert!(bundle.applications.contains_key("mysql"));
  }

  #[test]
  fn machine_tokens_and_empty_specs() {
    let bundle: Bundle = serde_yaml::from_str(
      r#"
        machines:
          1:
            series: trusty
          2:
          "8":
            constraints: cpu-cores=8
      "#,
    )
    .unwrap();

    let tokens: Vec<&String> = bundle.machines.keys().collect();
    assert_eq!(tokens, ["1", "2", "8"]);
    assert_eq!(bundle.machines["1"].series.as_deref(), Some("trusty"));
    assert_eq!(bundle.machines["2"], MachineSpec::default());
    assert_eq!(bundle.machines["8"].constraints, "cpu-cores=8");
  }

  #[test]
  fn bare_and_listed_placements() {
    let bundle: Bundle = serde_yaml::from_str(
      r#"
        applications:
          django:
            charm: django
            num_units: 2
            to: [1, lxc:2]
          haproxy:
            charm: haproxy
            num_units: 1
            to: wordpress
      "#,
    )
    .unwrap();

    assert_eq!(bundle.applications["django"].to, ["1", "lxc:2"]);
    assert_eq!(bundle.applications["haproxy"].to, ["wordpress"]);
  }

  #[test]
  fn option_values_keep_their_types() {
    let bundle: Bundle = serde_yaml::from_str(
      r#"
        applications:
          haproxy:
            charm: haproxy
            options:
              bad: wolf
              number: 42.47
              debug: false
      "#,
    )
    .unwrap();

    let options = &bundle.applications["haproxy"].options;
    assert_eq!(options["bad"], Value::from("wolf"));
    assert_eq!(options["number"], Value::from(42.47));
    assert_eq!(options["debug"], Value::from(false));
  }

  #[test]
  fn relations_are_endpoint_pairs() {
    let bundle: Bundle = serde_yaml::from_str(
      r#"
        relations:
          - - mediawiki:db
            - mysql
      "#,
    )
    .unwrap();

    assert_eq!(bundle.relations, [("mediawiki:db".to_string(), "mysql".to_string())]);
  }
}
