use std::sync::LazyLock;

use regex::Regex;

use crate::ast::Node;

/// Derive the anchor id of a heading.
///
/// Flattens all descendant text, lower-cases it and replaces every run of
/// non-word characters with a single `-`. Leading and trailing runs are kept,
/// so `"Hello!"` becomes `"hello-"`.
#[must_use]
pub fn heading_anchor_id(heading: &Node) -> String {
  slugify(&heading.text_content())
}

/// Slugify text the way heading anchors are derived.
#[must_use]
pub fn slugify(text: &str) -> String {
  static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\W+").unwrap_or_else(|e| {
      log::error!("Failed to compile NON_WORD_RE regex: {e}");
      never_matching_regex()
    })
  });

  NON_WORD_RE.replace_all(&text.to_lowercase(), "-").into_owned()
}

/// Create a regex that never matches anything.
///
/// Fallback for patterns that fail to compile, so a broken pattern degrades to
/// "no match" instead of a panic.
#[must_use]
pub fn never_matching_regex() -> Regex {
  Regex::new(r"[^\s\S]").unwrap_or_else(|_| {
    #[allow(
      clippy::unwrap_used,
      reason = "An empty-match anchor pattern always compiles"
    )]
    Regex::new(r"^\b$").unwrap()
  })
}
