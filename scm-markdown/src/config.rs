//! Pipeline configuration loaded from TOML or JSON files.
use std::{fs, io, path::Path};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Failed to read config file {path}: {source}")]
  Io {
    path:   String,
    #[source]
    source: io::Error,
  },

  #[error("Failed to parse JSON config: {0}")]
  Json(#[from] serde_json::Error),

  #[error("Failed to parse TOML config: {0}")]
  Toml(#[from] toml::de::Error),

  #[error("Unsupported config file format: {0}")]
  UnsupportedFormat(String),

  #[error("Invalid config override '{0}', expected key=value")]
  InvalidOverride(String),

  #[error("Unknown config key '{0}'")]
  UnknownKey(String),
}

/// Settings shared by every document a view renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Config struct with related boolean flags"
)]
pub struct MarkdownConfig {
  /// Leave raw HTML unstructured, so the sanitizer drops all of it.
  pub skip_html:              bool,

  /// Give headings anchors and copy-permalink buttons.
  pub enable_anchor_headings: bool,

  /// Syntax highlight code blocks no language extension claims.
  pub highlight_code:         bool,

  /// Highlighting theme; the backend's default when unset.
  pub highlight_theme:        Option<String>,

  /// Expand `namespace/name@revision` into changeset links.
  pub shortlinks:             bool,

  /// Link protocols to allow besides the ones extensions register.
  pub extra_protocols:        Vec<String>,
}

impl Default for MarkdownConfig {
  fn default() -> Self {
    Self {
      skip_html:              false,
      enable_anchor_headings: false,
      highlight_code:         cfg!(feature = "syntect"),
      highlight_theme:        None,
      shortlinks:             true,
      extra_protocols:        Vec::new(),
    }
  }
}

impl MarkdownConfig {
  /// Load configuration from a `.toml` or `.json` file.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or has another
  /// extension.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| {
      ConfigError::Io {
        path: path.display().to_string(),
        source,
      }
    })?;

    let extension = path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(str::to_lowercase);
    let config = match extension.as_deref() {
      Some("toml") => toml::from_str(&content)?,
      Some("json") => serde_json::from_str(&content)?,
      _ => {
        return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
      },
    };
    debug!("Loaded markdown config from {}", path.display());
    Ok(config)
  }

  /// Apply a `key=value` override, as given on the command line.
  ///
  /// List values are comma separated.
  ///
  /// # Errors
  ///
  /// Returns an error for malformed overrides, unknown keys or values that
  /// do not parse.
  pub fn apply_override(&mut self, assignment: &str) -> Result<(), ConfigError> {
    let Some((key, value)) = assignment.split_once('=') else {
      return Err(ConfigError::InvalidOverride(assignment.to_owned()));
    };
    let (key, value) = (key.trim(), value.trim());
    let flag = || {
      value
        .parse::<bool>()
        .map_err(|_| ConfigError::InvalidOverride(assignment.to_owned()))
    };

    match key {
      "skip_html" => self.skip_html = flag()?,
      "enable_anchor_headings" => self.enable_anchor_headings = flag()?,
      "highlight_code" => self.highlight_code = flag()?,
      "shortlinks" => self.shortlinks = flag()?,
      "highlight_theme" => {
        self.highlight_theme = (!value.is_empty()).then(|| value.to_owned());
      },
      "extra_protocols" => {
        self.extra_protocols = value
          .split(',')
          .map(str::trim)
          .filter(|protocol| !protocol.is_empty())
          .map(ToOwned::to_owned)
          .collect();
      },
      _ => return Err(ConfigError::UnknownKey(key.to_owned())),
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = MarkdownConfig::default();
    assert!(!config.skip_html);
    assert!(config.shortlinks);
    assert!(config.extra_protocols.is_empty());
  }

  #[test]
  fn test_partial_toml_keeps_defaults() {
    let config: MarkdownConfig =
      toml::from_str("enable_anchor_headings = true").expect("valid toml");
    assert!(config.enable_anchor_headings);
    assert!(config.shortlinks);
  }

  #[test]
  fn test_unknown_field_is_rejected() {
    assert!(serde_json::from_str::<MarkdownConfig>(r#"{"skipHtml": true}"#).is_err());
  }

  #[test]
  fn test_overrides() {
    let mut config = MarkdownConfig::default();
    config.apply_override("skip_html=true").expect("valid override");
    config
      .apply_override("extra_protocols = scw, ssh")
      .expect("valid override");
    assert!(config.skip_html);
    assert_eq!(config.extra_protocols, vec!["scw", "ssh"]);

    assert!(matches!(
      config.apply_override("skip_html"),
      Err(ConfigError::InvalidOverride(_))
    ));
    assert!(matches!(
      config.apply_override("skip_html=maybe"),
      Err(ConfigError::InvalidOverride(_))
    ));
    assert!(matches!(
      config.apply_override("colour=red"),
      Err(ConfigError::UnknownKey(key)) if key == "colour"
    ));
  }
}
