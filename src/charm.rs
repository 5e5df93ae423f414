//! Charm references and series inference.
//!
//! A charm reference is either a store URL (`cs:precise/mediawiki-10`,
//! `precise/mediawiki-10`, `django`) or a local filesystem path. The
//! effective series of an application is the first defined of: its own
//! `series` field, the series embedded in the reference, the bundle
//! default, and (for local charms) the first entry of the `series` list in
//! the charm's `metadata.yaml`.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::bundle::ApplicationSpec;

/// Charm metadata could not be consulted for series inference.
#[derive(Debug, Error)]
pub enum MetadataError {
  /// The metadata file exists but could not be read.
  #[error("failed to read charm metadata at {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  /// The metadata file is not valid YAML.
  #[error("failed to parse charm metadata at {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: serde_yaml::Error,
  },
}

/// The subset of a charm's metadata.yaml the planner cares about.
#[derive(Debug, Default, Deserialize)]
struct CharmMetadata {
  #[serde(default)]
  series: Vec<String>,
}

/// Whether a charm reference is a local filesystem path rather than a
/// store URL.
pub fn is_local_path(charm: &str) -> bool {
  charm.starts_with('/') || charm.starts_with("./") || charm.starts_with("../")
}

/// The series embedded in a store reference of the form
/// `[cs:][~user/]<series>/<name>[-rev]`, if any.
pub fn series_in_reference(charm: &str) -> Option<&str> {
  if is_local_path(charm) {
    return None;
  }
  let rest = charm.strip_prefix("cs:").unwrap_or(charm);
  let segments: Vec<&str> = rest.split('/').collect();
  let segments = match segments.first() {
    Some(first) if first.starts_with('~') => &segments[1..],
    _ => &segments[..],
  };
  if segments.len() != 2 {
    return None;
  }
  let series = segments[0];
  is_series_token(series).then_some(series)
}

fn is_series_token(text: &str) -> bool {
  let mut chars = text.chars();
  matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
    && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

/// Resolve the effective series for an application.
///
/// Returns the empty string when no source defines one; bundle validation
/// decides whether that is acceptable.
///
/// # Errors
///
/// Fails when a local charm's `metadata.yaml` exists but cannot be read
/// or parsed. A missing file, or one without a `series` list, is not an
/// error.
pub fn application_series(app: &ApplicationSpec, bundle_series: Option<&str>) -> Result<String, MetadataError> {
  if let Some(series) = &app.series
    && !series.is_empty()
  {
    return Ok(series.clone());
  }
  if let Some(series) = series_in_reference(&app.charm) {
    return Ok(series.to_string());
  }
  if let Some(series) = bundle_series
    && !series.is_empty()
  {
    return Ok(series.to_string());
  }
  if is_local_path(&app.charm)
    && let Some(series) = metadata_series(Path::new(&app.charm))?
  {
    return Ok(series);
  }
  Ok(String::new())
}

/// First entry of the `series` list in `<dir>/metadata.yaml`, if present.
fn metadata_series(dir: &Path) -> Result<Option<String>, MetadataError> {
  let path = dir.join("metadata.yaml");
  if !path.exists() {
    return Ok(None);
  }
  let text = fs::read_to_string(&path).map_err(|source| MetadataError::Read {
    path: path.display().to_string(),
    source,
  })?;
  let metadata: CharmMetadata = serde_yaml::from_str(&text).map_err(|source| MetadataError::Parse {
    path: path.display().to_string(),
    source,
  })?;
  Ok(metadata.series.into_iter().next())
}
