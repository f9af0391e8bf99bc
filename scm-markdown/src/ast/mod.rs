//! Owned document tree produced by the parser and rewritten by transforms.
//!
//! Every node exclusively owns its children. There are no parent pointers and
//! no shared subtrees, so a transform can splice a parent's child list by index
//! without aliasing another transform's view of the tree.
pub mod visit;

use std::fmt;

pub use visit::{VisitAction, VisitContext, visit};

/// Deepest nesting the parser and the raw HTML stage build.
///
/// Content nested further is flattened into a text node, so every stage that
/// walks the tree recursively stays within a bounded stack.
pub const MAX_DEPTH: usize = 128;

/// Depth of the deepest node, the root counting as zero.
#[must_use]
pub fn max_depth(tree: &Node) -> usize {
  let mut deepest = 0;
  let mut stack = vec![(tree, 0)];
  while let Some((node, depth)) = stack.pop() {
    deepest = deepest.max(depth);
    stack.extend(node.children.iter().map(|child| (child, depth + 1)));
  }
  deepest
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
  pub kind:     NodeKind,
  pub children: Vec<Node>,
}

/// Node payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
  /// Document root.
  Root,

  /// Literal text. A `None` value only appears when a transform wrapped other
  /// nodes inside a text node; see
  /// [`ValuelessTextRepair`](crate::transform::ValuelessTextRepair).
  Text { value: Option<String> },

  Paragraph,

  Heading { level: u8 },

  Link {
    url:   String,
    title: Option<String>,
  },

  Image {
    src:   String,
    alt:   String,
    title: Option<String>,
  },

  /// Fenced or indented code block.
  Code {
    lang:  Option<String>,
    value: String,
  },

  InlineCode { value: String },

  /// A tight list renders its items' paragraphs without `<p>` wrappers.
  List {
    ordered: bool,
    start:   Option<usize>,
    tight:   bool,
  },

  ListItem,

  Table,

  TableRow { header: bool },

  TableCell { header: bool },

  Blockquote,

  Emphasis,

  Strong,

  Delete,

  /// Hard line break.
  Break,

  ThematicBreak,

  /// Unparsed HTML as written in the source.
  RawHtml { value: String },

  /// HTML element recovered from raw HTML that has no markdown counterpart.
  Element {
    tag:        String,
    attributes: Vec<(String, String)>,
  },

  /// Parser construct without a dedicated kind (footnotes, description
  /// lists, ...). Never rendered.
  Unknown { name: String },
}

/// Field-less discriminant of [`NodeKind`].
///
/// Used as the key of renderer registries and sanitizer policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
  Root,
  Text,
  Paragraph,
  Heading,
  Link,
  Image,
  Code,
  InlineCode,
  List,
  ListItem,
  Table,
  TableRow,
  TableCell,
  Blockquote,
  Emphasis,
  Strong,
  Delete,
  Break,
  ThematicBreak,
  RawHtml,
  Element,
  Unknown,
}

impl Kind {
  /// All kinds, in declaration order.
  pub const ALL: [Self; 22] = [
    Self::Root,
    Self::Text,
    Self::Paragraph,
    Self::Heading,
    Self::Link,
    Self::Image,
    Self::Code,
    Self::InlineCode,
    Self::List,
    Self::ListItem,
    Self::Table,
    Self::TableRow,
    Self::TableCell,
    Self::Blockquote,
    Self::Emphasis,
    Self::Strong,
    Self::Delete,
    Self::Break,
    Self::ThematicBreak,
    Self::RawHtml,
    Self::Element,
    Self::Unknown,
  ];

  /// Position of this kind in [`Kind::ALL`].
  #[must_use]
  pub const fn index(self) -> usize {
    self as usize
  }

  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Root => "root",
      Self::Text => "text",
      Self::Paragraph => "paragraph",
      Self::Heading => "heading",
      Self::Link => "link",
      Self::Image => "image",
      Self::Code => "code",
      Self::InlineCode => "inlineCode",
      Self::List => "list",
      Self::ListItem => "listItem",
      Self::Table => "table",
      Self::TableRow => "tableRow",
      Self::TableCell => "tableCell",
      Self::Blockquote => "blockquote",
      Self::Emphasis => "emphasis",
      Self::Strong => "strong",
      Self::Delete => "delete",
      Self::Break => "break",
      Self::ThematicBreak => "thematicBreak",
      Self::RawHtml => "html",
      Self::Element => "element",
      Self::Unknown => "unknown",
    }
  }
}

impl fmt::Display for Kind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl NodeKind {
  #[must_use]
  pub const fn kind(&self) -> Kind {
    match self {
      Self::Root => Kind::Root,
      Self::Text { .. } => Kind::Text,
      Self::Paragraph => Kind::Paragraph,
      Self::Heading { .. } => Kind::Heading,
      Self::Link { .. } => Kind::Link,
      Self::Image { .. } => Kind::Image,
      Self::Code { .. } => Kind::Code,
      Self::InlineCode { .. } => Kind::InlineCode,
      Self::List { .. } => Kind::List,
      Self::ListItem => Kind::ListItem,
      Self::Table => Kind::Table,
      Self::TableRow { .. } => Kind::TableRow,
      Self::TableCell { .. } => Kind::TableCell,
      Self::Blockquote => Kind::Blockquote,
      Self::Emphasis => Kind::Emphasis,
      Self::Strong => Kind::Strong,
      Self::Delete => Kind::Delete,
      Self::Break => Kind::Break,
      Self::ThematicBreak => Kind::ThematicBreak,
      Self::RawHtml { .. } => Kind::RawHtml,
      Self::Element { .. } => Kind::Element,
      Self::Unknown { .. } => Kind::Unknown,
    }
  }
}

impl Node {
  #[must_use]
  pub const fn new(kind: NodeKind, children: Vec<Self>) -> Self {
    Self { kind, children }
  }

  /// A childless node.
  #[must_use]
  pub const fn leaf(kind: NodeKind) -> Self {
    Self::new(kind, Vec::new())
  }

  #[must_use]
  pub fn root(children: Vec<Self>) -> Self {
    Self::new(NodeKind::Root, children)
  }

  #[must_use]
  pub fn text(value: impl Into<String>) -> Self {
    Self::leaf(NodeKind::Text {
      value: Some(value.into()),
    })
  }

  #[must_use]
  pub fn paragraph(children: Vec<Self>) -> Self {
    Self::new(NodeKind::Paragraph, children)
  }

  #[must_use]
  pub fn link(
    url: impl Into<String>,
    title: Option<String>,
    children: Vec<Self>,
  ) -> Self {
    Self::new(
      NodeKind::Link {
        url: url.into(),
        title,
      },
      children,
    )
  }

  #[must_use]
  pub const fn kind(&self) -> Kind {
    self.kind.kind()
  }

  /// Literal value of a text node.
  #[must_use]
  pub fn text_value(&self) -> Option<&str> {
    match &self.kind {
      NodeKind::Text { value } => value.as_deref(),
      _ => None,
    }
  }

  /// Concatenated text of this node and all descendants.
  ///
  /// Inline code contributes its value and images their alt text, matching
  /// what a reader sees.
  #[must_use]
  pub fn text_content(&self) -> String {
    let mut out = String::new();
    self.collect_text(&mut out);
    out
  }

  fn collect_text(&self, out: &mut String) {
    match &self.kind {
      NodeKind::Text { value: Some(value) }
      | NodeKind::InlineCode { value }
      | NodeKind::Code { value, .. } => out.push_str(value),
      NodeKind::Image { alt, .. } => out.push_str(alt),
      _ => {},
    }
    for child in &self.children {
      child.collect_text(out);
    }
  }

  /// Depth-first iterator over this node and its descendants.
  pub fn descendants(&self) -> impl Iterator<Item = &Self> {
    let mut stack = vec![self];
    std::iter::from_fn(move || {
      let node = stack.pop()?;
      stack.extend(node.children.iter().rev());
      Some(node)
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_kind_index_matches_all() {
    for (i, kind) in Kind::ALL.iter().enumerate() {
      assert_eq!(kind.index(), i);
    }
  }

  #[test]
  fn test_text_content_flattens_nested_nodes() {
    let node = Node::paragraph(vec![
      Node::text("Hello "),
      Node::new(NodeKind::Strong, vec![Node::text("big")]),
      Node::leaf(NodeKind::InlineCode {
        value: " world".into(),
      }),
    ]);
    assert_eq!(node.text_content(), "Hello big world");
  }

  #[test]
  fn test_descendants_preorder() {
    let tree = Node::root(vec![
      Node::paragraph(vec![Node::text("a")]),
      Node::leaf(NodeKind::ThematicBreak),
    ]);
    let kinds: Vec<Kind> = tree.descendants().map(Node::kind).collect();
    assert_eq!(kinds, vec![
      Kind::Root,
      Kind::Paragraph,
      Kind::Text,
      Kind::ThematicBreak
    ]);
  }
}
