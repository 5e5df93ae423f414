//! Placement directive parsing.
//!
//! A directive tells the planner where one unit should run: an explicit
//! machine token (`1`), a fresh machine (`new`), co-location with another
//! application's units (`wordpress`, `wordpress/0`), or a container on any
//! of those (`lxc:2`, `kvm:wordpress/0`, `lxc:new`).

use thiserror::Error;

/// A placement directive that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid placement {directive:?}: {problem}")]
pub struct InvalidPlacement {
  /// The directive text as it appeared in the bundle.
  pub directive: String,
  /// What is wrong with it.
  pub problem: &'static str,
}

/// A parsed placement directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
  /// Container type when the directive is `<kind>:<target>`.
  pub container: Option<String>,
  /// What the unit (or its container) lands on.
  pub target: Target,
}

/// The thing a directive points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
  /// A machine token declared under `machines:`.
  Machine(String),
  /// A fresh machine of the unit's own.
  New,
  /// A unit of another application: the next one in round-robin order
  /// when `unit` is `None`, or a specific index.
  Unit { application: String, unit: Option<usize> },
}

impl Directive {
  /// Parse a placement directive.
  pub fn parse(directive: &str) -> Result<Self, InvalidPlacement> {
    let fail = |problem| InvalidPlacement {
      directive: directive.to_string(),
      problem,
    };

    if directive.is_empty() {
      return Err(fail("directive is empty"));
    }

    let (container, rest) = match directive.split_once(':') {
      Some((kind, rest)) => {
        if kind.is_empty() {
          return Err(fail("container type is empty"));
        }
        if !kind.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
          return Err(fail("container type must be a lowercase token"));
        }
        if rest.contains(':') {
          return Err(fail("containers cannot nest"));
        }
        (Some(kind.to_string()), rest)
      }
      None => (None, directive),
    };

    let target = parse_target(rest).map_err(fail)?;
    Ok(Directive { container, target })
  }
}

fn parse_target(text: &str) -> Result<Target, &'static str> {
  if text.is_empty() {
    return Err("placement target is empty");
  }
  if text == "new" {
    return Ok(Target::New);
  }
  if text.chars().all(|c| c.is_ascii_digit()) {
    return Ok(Target::Machine(text.to_string()));
  }
  match text.split_once('/') {
    Some((application, index)) => {
      if application.is_empty() {
        return Err("application name is empty");
      }
      let unit = index.parse::<usize>().map_err(|_| "unit index is not a number")?;
      Ok(Target::Unit {
        application: application.to_string(),
        unit: Some(unit),
      })
    }
    None => Ok(Target::Unit {
      application: text.to_string(),
      unit: None,
    }),
  }
}
