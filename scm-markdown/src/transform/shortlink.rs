use std::sync::LazyLock;

use regex::Regex;

use super::Transform;
use crate::{
  ast::{Kind, Node, VisitAction, visit},
  error::TransformError,
  names::RESOURCE_NAME,
  utils::never_matching_regex,
};

static SHORTLINK_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(&format!(r"({RESOURCE_NAME})/({RESOURCE_NAME})@(\w+)"))
    .unwrap_or_else(|e| {
      log::error!("Failed to compile SHORTLINK_RE regex: {e}");
      never_matching_regex()
    })
});

/// Expands `namespace/name@revision` references in plain text into links to
/// the changeset.
///
/// Text that already sits inside a link is left alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShortlinkTransform;

impl ShortlinkTransform {
  #[must_use]
  pub const fn new() -> Self {
    Self
  }
}

impl Transform for ShortlinkTransform {
  fn name(&self) -> &str {
    "changeset-shortlinks"
  }

  fn apply(&self, tree: &mut Node) -> Result<(), TransformError> {
    visit(tree, Kind::Text, |node, ctx| {
      if ctx.is_inside(Kind::Link) {
        return Ok(VisitAction::Skip);
      }
      Ok(
        node
          .text_value()
          .and_then(expand_shortlinks)
          .map_or(VisitAction::Continue, VisitAction::Replace),
      )
    })
  }
}

/// Split `text` around its shortlinks.
///
/// Returns `None` when the text contains no shortlink, otherwise the ordered
/// replacement nodes: literal text between matches and one link per match.
pub(crate) fn expand_shortlinks(text: &str) -> Option<Vec<Node>> {
  let mut nodes = Vec::new();
  let mut last_end = 0;

  for caps in SHORTLINK_RE.captures_iter(text) {
    let (Some(whole), Some(namespace), Some(name), Some(revision)) =
      (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
    else {
      continue;
    };

    if whole.start() > last_end {
      nodes.push(Node::text(&text[last_end..whole.start()]));
    }

    let (namespace, name, revision) =
      (namespace.as_str(), name.as_str(), revision.as_str());
    nodes.push(Node::link(
      changeset_path(namespace, name, revision),
      Some(format!("Changeset {revision} of {namespace}/{name}")),
      vec![Node::text(whole.as_str())],
    ));
    last_end = whole.end();
  }

  if nodes.is_empty() {
    return None;
  }
  if last_end < text.len() {
    nodes.push(Node::text(&text[last_end..]));
  }
  Some(nodes)
}

/// Application path of a changeset.
#[must_use]
pub fn changeset_path(namespace: &str, name: &str, revision: &str) -> String {
  format!("/repo/{namespace}/{name}/code/changeset/{revision}")
}
