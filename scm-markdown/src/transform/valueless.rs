use super::Transform;
use crate::{
  ast::{Kind, NodeKind, VisitAction, visit},
  error::TransformError,
};

/// Retypes text nodes that carry children but no value into paragraphs.
///
/// Some transforms wrap inline nodes inside a node typed as text. Renderers
/// never look at the children of a text node, so that content would silently
/// disappear; as a paragraph it renders structurally.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValuelessTextRepair;

impl Transform for ValuelessTextRepair {
  fn name(&self) -> &str {
    "valueless-text-repair"
  }

  fn apply(&self, tree: &mut crate::ast::Node) -> Result<(), TransformError> {
    visit::<TransformError, _>(tree, Kind::Text, |node, _| {
      if matches!(node.kind, NodeKind::Text { value: None })
        && !node.children.is_empty()
      {
        node.kind = NodeKind::Paragraph;
      }
      Ok(VisitAction::Continue)
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ast::Node;

  fn valueless(children: Vec<Node>) -> Node {
    Node::new(NodeKind::Text { value: None }, children)
  }

  #[test]
  fn test_repairs_valueless_text_with_children() {
    let mut tree = Node::root(vec![valueless(vec![Node::text("inner")])]);
    ValuelessTextRepair.apply(&mut tree).expect("repair succeeds");
    assert_eq!(tree.children[0].kind, NodeKind::Paragraph);
    assert_eq!(tree.children[0].text_content(), "inner");
  }

  #[test]
  fn test_repairs_nested_valueless_text() {
    let mut tree = Node::root(vec![valueless(vec![valueless(vec![
      Node::text("deep"),
    ])])]);
    ValuelessTextRepair.apply(&mut tree).expect("repair succeeds");
    assert_eq!(tree.children[0].kind, NodeKind::Paragraph);
    assert_eq!(tree.children[0].children[0].kind, NodeKind::Paragraph);
  }

  #[test]
  fn test_leaves_regular_and_empty_text_alone() {
    let mut tree =
      Node::root(vec![Node::text("plain"), valueless(Vec::new())]);
    let before = tree.clone();
    ValuelessTextRepair.apply(&mut tree).expect("repair succeeds");
    assert_eq!(tree, before);
  }
}
