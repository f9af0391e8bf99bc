//! Visitor over the owned document tree.
use super::{Kind, Node};

/// What the visitor should do after the callback returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitAction {
  /// Keep the node and descend into its children.
  Continue,
  /// Keep the node but do not descend into its children.
  Skip,
  /// Replace the node by the given nodes (possibly none) in its parent's
  /// child list. Replacement nodes are not visited.
  Replace(Vec<Node>),
}

/// Position of the visited node.
#[derive(Debug, Clone, Copy)]
pub struct VisitContext<'a> {
  ancestors: &'a [Kind],
  index:     usize,
}

impl<'a> VisitContext<'a> {
  /// Kinds of the enclosing nodes, outermost first.
  #[must_use]
  pub const fn ancestors(&self) -> &'a [Kind] {
    self.ancestors
  }

  /// Index of the node in its parent's child list.
  #[must_use]
  pub const fn index(&self) -> usize {
    self.index
  }

  /// Whether any enclosing node is of the given kind.
  #[must_use]
  pub fn is_inside(&self, kind: Kind) -> bool {
    self.ancestors.contains(&kind)
  }
}

/// Call `f` for every node of `kind` below `root`, in document order.
///
/// The root itself is never passed to `f` since it has no parent list to be
/// replaced in. The first error returned by `f` stops the walk.
pub fn visit<E, F>(root: &mut Node, kind: Kind, mut f: F) -> Result<(), E>
where
  F: FnMut(&mut Node, &VisitContext<'_>) -> Result<VisitAction, E>,
{
  let mut ancestors = Vec::new();
  walk(root, kind, &mut ancestors, &mut f)
}

fn walk<E, F>(
  parent: &mut Node,
  kind: Kind,
  ancestors: &mut Vec<Kind>,
  f: &mut F,
) -> Result<(), E>
where
  F: FnMut(&mut Node, &VisitContext<'_>) -> Result<VisitAction, E>,
{
  ancestors.push(parent.kind());

  let mut i = 0;
  while i < parent.children.len() {
    let mut descend = true;

    if parent.children[i].kind() == kind {
      let ctx = VisitContext {
        ancestors,
        index: i,
      };
      match f(&mut parent.children[i], &ctx)? {
        VisitAction::Continue => {},
        VisitAction::Skip => descend = false,
        VisitAction::Replace(nodes) => {
          let count = nodes.len();
          parent.children.splice(i..=i, nodes);
          i += count;
          continue;
        },
      }
    }

    if descend {
      walk(&mut parent.children[i], kind, ancestors, f)?;
    }
    i += 1;
  }

  ancestors.pop();
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::convert::Infallible;

  use super::*;
  use crate::ast::NodeKind;

  #[test]
  fn test_replace_splices_by_index() {
    let mut tree = Node::root(vec![Node::paragraph(vec![
      Node::text("a"),
      Node::text("b"),
      Node::text("c"),
    ])]);

    visit::<Infallible, _>(&mut tree, Kind::Text, |node, _| {
      if node.text_value() == Some("b") {
        Ok(VisitAction::Replace(vec![Node::text("b1"), Node::text("b2")]))
      } else {
        Ok(VisitAction::Continue)
      }
    })
    .ok();

    let texts: Vec<&str> = tree.descendants().filter_map(Node::text_value).collect();
    assert_eq!(texts, vec!["a", "b1", "b2", "c"]);
  }

  #[test]
  fn test_replacements_are_not_revisited() {
    let mut tree = Node::root(vec![Node::text("x")]);
    let mut calls = 0;

    visit::<Infallible, _>(&mut tree, Kind::Text, |_, _| {
      calls += 1;
      Ok(VisitAction::Replace(vec![Node::text("x"), Node::text("x")]))
    })
    .ok();

    assert_eq!(calls, 1);
    assert_eq!(tree.children.len(), 2);
  }

  #[test]
  fn test_context_reports_ancestors() {
    let mut tree = Node::root(vec![Node::paragraph(vec![Node::link(
      "/x",
      None,
      vec![Node::text("inside")],
    )])]);
    let mut seen = Vec::new();

    visit::<Infallible, _>(&mut tree, Kind::Text, |_, ctx| {
      seen.push((ctx.is_inside(Kind::Link), ctx.ancestors().to_vec()));
      Ok(VisitAction::Continue)
    })
    .ok();

    assert_eq!(seen, vec![(true, vec![
      Kind::Root,
      Kind::Paragraph,
      Kind::Link
    ])]);
  }

  #[test]
  fn test_error_stops_walk() {
    let mut tree = Node::root(vec![Node::text("a"), Node::text("b")]);
    let mut calls = 0;
    let result = visit(&mut tree, Kind::Text, |_, _| {
      calls += 1;
      Err("boom")
    });
    assert_eq!(result, Err("boom"));
    assert_eq!(calls, 1);
  }

  #[test]
  fn test_skip_does_not_descend() {
    let mut tree = Node::root(vec![Node::new(NodeKind::Blockquote, vec![
      Node::new(NodeKind::Blockquote, vec![]),
    ])]);
    let mut calls = 0;
    visit::<Infallible, _>(&mut tree, Kind::Blockquote, |_, _| {
      calls += 1;
      Ok(VisitAction::Skip)
    })
    .ok();
    assert_eq!(calls, 1);
  }
}
