//! Repository resource-name syntax.
//!
//! A single rule for namespace and repository names. Shortlink detection builds
//! its pattern from [`RESOURCE_NAME`] so that whatever the expander links is
//! also accepted by [`is_valid_name`], apart from the dot-only names.
use std::sync::LazyLock;

use regex::Regex;

use crate::utils::never_matching_regex;

/// Character class of a namespace or repository name, unanchored.
pub const RESOURCE_NAME: &str = r"[A-Za-z0-9._@-]+";

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(&format!("^{RESOURCE_NAME}$")).unwrap_or_else(|e| {
    log::error!("Failed to compile NAME_RE regex: {e}");
    never_matching_regex()
  })
});

/// Whether `name` is a valid namespace or repository name.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
  name != "." && name != ".." && NAME_RE.is_match(name)
}
