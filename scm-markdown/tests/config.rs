#![allow(clippy::expect_used, clippy::panic, reason = "Fine in tests")]
use std::fs;

use scm_markdown::{
  ConfigError,
  Document,
  DocumentBuilder,
  ExtensionRegistry,
  Location,
  MarkdownConfig,
  MarkdownView,
};
use tempfile::TempDir;

#[test]
fn test_load_toml() {
  let dir = TempDir::new().expect("temp dir");
  let path = dir.path().join("markdown.toml");
  fs::write(
    &path,
    "skip_html = true\nhighlight_code = false\nextra_protocols = [\"scw\"]\n",
  )
  .expect("write config");

  let config = MarkdownConfig::from_file(&path).expect("valid config");
  assert!(config.skip_html);
  assert!(!config.highlight_code);
  assert_eq!(config.extra_protocols, vec!["scw"]);
  assert!(config.shortlinks);
}

#[test]
fn test_load_json() {
  let dir = TempDir::new().expect("temp dir");
  let path = dir.path().join("markdown.json");
  fs::write(&path, r#"{"enable_anchor_headings": true, "shortlinks": false}"#)
    .expect("write config");

  let config = MarkdownConfig::from_file(&path).expect("valid config");
  assert!(config.enable_anchor_headings);
  assert!(!config.shortlinks);
}

#[test]
fn test_unsupported_extension() {
  let dir = TempDir::new().expect("temp dir");
  let path = dir.path().join("markdown.yaml");
  fs::write(&path, "skip_html: true").expect("write config");

  assert!(matches!(
    MarkdownConfig::from_file(&path),
    Err(ConfigError::UnsupportedFormat(_))
  ));
}

#[test]
fn test_missing_file() {
  let dir = TempDir::new().expect("temp dir");
  assert!(matches!(
    MarkdownConfig::from_file(dir.path().join("absent.toml")),
    Err(ConfigError::Io { .. })
  ));
}

#[test]
fn test_invalid_toml() {
  let dir = TempDir::new().expect("temp dir");
  let path = dir.path().join("markdown.toml");
  fs::write(&path, "skip_html = \"yes\"").expect("write config");

  assert!(matches!(
    MarkdownConfig::from_file(&path),
    Err(ConfigError::Toml(_))
  ));
}

#[test]
fn test_extra_protocols_reach_the_sanitizer() {
  let config = MarkdownConfig {
    extra_protocols: vec!["ssh".to_owned()],
    highlight_code: false,
    ..MarkdownConfig::default()
  };
  let mut view =
    MarkdownView::from_config(ExtensionRegistry::new().into_shared(), &config);
  assert!(view.policy().link_allowed("ssh:git@example.com"));

  let output = view.render(
    &Document::builder("[clone](ssh:git@example.com)").build(),
    &Location::new("/"),
  );
  assert_eq!(output.html, "<p><a href=\"ssh:git@example.com\">clone</a></p>");
}

#[test]
fn test_document_flags_from_config() {
  let config = MarkdownConfig {
    skip_html: true,
    shortlinks: false,
    ..MarkdownConfig::default()
  };
  let document = DocumentBuilder::from_config("ns/name@abc", &config).build();
  assert!(document.skip_html);
  assert!(!document.shortlinks);

  let mut view = MarkdownView::new(ExtensionRegistry::new().into_shared())
    .with_syntax(None);
  let output = view.render(&document, &Location::new("/"));
  assert_eq!(output.html, "<p>ns/name@abc</p>");
}
