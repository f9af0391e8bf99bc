//! Markdown parsing into the owned document tree.
//!
//! comrak does the actual parsing (CommonMark plus the GFM table,
//! strikethrough, autolink and task list extensions); its arena AST is then
//! converted into [`Node`]s so the rest of the pipeline works on an owned tree.
//! Nesting beyond [`MAX_DEPTH`] is flattened into text.
use comrak::{
  Arena,
  nodes::{AstNode, ListType, NodeValue},
  options::Options,
  parse_document,
};
use log::trace;

use crate::ast::{MAX_DEPTH, Node, NodeKind};

/// Options for the markdown parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
  /// Enable the GitHub Flavored Markdown extensions (tables, strikethrough,
  /// autolinks, task lists).
  pub gfm: bool,
}

impl Default for ParseOptions {
  fn default() -> Self {
    Self { gfm: true }
  }
}

/// Parse markdown with the default dialect.
///
/// Never fails: syntax the grammar does not recognise is kept as literal
/// text.
#[must_use]
pub fn parse(content: &str) -> Node {
  parse_with(content, ParseOptions::default())
}

/// Parse markdown with explicit options.
#[must_use]
pub fn parse_with(content: &str, options: ParseOptions) -> Node {
  let arena = Arena::new();
  let comrak_options = comrak_options(options);
  let root = parse_document(&arena, content, &comrak_options);
  let tree = convert(root, 0);
  trace!("Parsed markdown into {} nodes", tree.descendants().count());
  tree
}

/// Build comrak options from [`ParseOptions`].
fn comrak_options<'c>(options: ParseOptions) -> Options<'c> {
  let mut comrak = Options::default();
  if options.gfm {
    comrak.extension.table = true;
    comrak.extension.strikethrough = true;
    comrak.extension.autolink = true;
    comrak.extension.tasklist = true;
  }
  // Raw HTML is kept in the tree; whether it survives is the sanitizer's call.
  comrak.render.r#unsafe = true;
  comrak
}

fn convert<'a>(node: &'a AstNode<'a>, depth: usize) -> Node {
  if depth >= MAX_DEPTH {
    trace!("Flattening markdown nested deeper than {MAX_DEPTH} levels");
    return Node::text(flatten_text(node));
  }
  let children: Vec<Node> = node
    .children()
    .map(|child| convert(child, depth + 1))
    .collect();

  let kind = match &node.data.borrow().value {
    NodeValue::Document => NodeKind::Root,
    NodeValue::Paragraph => NodeKind::Paragraph,
    NodeValue::Heading(heading) => {
      NodeKind::Heading {
        level: heading.level,
      }
    },
    NodeValue::Text(text) => {
      NodeKind::Text {
        value: Some(text.to_string()),
      }
    },
    NodeValue::SoftBreak => {
      NodeKind::Text {
        value: Some("\n".to_owned()),
      }
    },
    NodeValue::LineBreak => NodeKind::Break,
    NodeValue::Code(code) => {
      NodeKind::InlineCode {
        value: code.literal.to_string(),
      }
    },
    NodeValue::CodeBlock(block) => {
      NodeKind::Code {
        lang:  block
          .info
          .split_whitespace()
          .next()
          .map(ToOwned::to_owned),
        value: block.literal.to_string(),
      }
    },
    NodeValue::HtmlBlock(block) => {
      NodeKind::RawHtml {
        value: block.literal.to_string(),
      }
    },
    NodeValue::HtmlInline(html) => {
      NodeKind::RawHtml {
        value: html.to_string(),
      }
    },
    NodeValue::Emph => NodeKind::Emphasis,
    NodeValue::Strong => NodeKind::Strong,
    NodeValue::Strikethrough => NodeKind::Delete,
    NodeValue::Link(link) => {
      NodeKind::Link {
        url:   link.url.to_string(),
        title: non_empty(&link.title.to_string()),
      }
    },
    NodeValue::Image(link) => {
      // Alt text arrives as inline children; flatten it into the node.
      let alt = Node::root(children).text_content();
      return Node::leaf(NodeKind::Image {
        src: link.url.to_string(),
        alt,
        title: non_empty(&link.title.to_string()),
      });
    },
    NodeValue::List(list) => {
      let ordered = list.list_type == ListType::Ordered;
      NodeKind::List {
        ordered,
        start: ordered.then_some(list.start),
        tight: list.tight,
      }
    },
    NodeValue::Item(_) => NodeKind::ListItem,
    NodeValue::TaskItem(task) => {
      let checkbox = Node::leaf(NodeKind::Element {
        tag:        "input".to_owned(),
        attributes: task_checkbox_attributes(task.symbol.is_some()),
      });
      let mut children = children;
      children.insert(0, checkbox);
      return Node::new(NodeKind::ListItem, children);
    },
    NodeValue::BlockQuote => NodeKind::Blockquote,
    NodeValue::ThematicBreak => NodeKind::ThematicBreak,
    NodeValue::Table(..) => NodeKind::Table,
    NodeValue::TableRow(header) => {
      let header = *header;
      let cells = children
        .into_iter()
        .map(|mut cell| {
          if let NodeKind::TableCell { header: ref mut h } = cell.kind {
            *h = header;
          }
          cell
        })
        .collect();
      return Node::new(NodeKind::TableRow { header }, cells);
    },
    NodeValue::TableCell => NodeKind::TableCell { header: false },
    other => {
      NodeKind::Unknown {
        name: variant_name(other),
      }
    },
  };

  Node::new(kind, children)
}

fn task_checkbox_attributes(checked: bool) -> Vec<(String, String)> {
  let mut attributes = vec![("type".to_owned(), "checkbox".to_owned())];
  if checked {
    attributes.push(("checked".to_owned(), String::new()));
  }
  attributes.push(("disabled".to_owned(), String::new()));
  attributes
}

/// Text of a subtree, collected without recursion.
fn flatten_text<'a>(node: &'a AstNode<'a>) -> String {
  let mut out = String::new();
  for descendant in node.descendants() {
    match &descendant.data.borrow().value {
      NodeValue::Text(text) => out.push_str(text),
      NodeValue::Code(code) => out.push_str(&code.literal),
      NodeValue::CodeBlock(block) => out.push_str(&block.literal),
      NodeValue::SoftBreak | NodeValue::LineBreak => out.push('\n'),
      _ => {},
    }
  }
  out
}

fn non_empty(value: &str) -> Option<String> {
  (!value.is_empty()).then(|| value.to_owned())
}

/// Name of a comrak node variant, without its payload.
fn variant_name(value: &NodeValue) -> String {
  let debug = format!("{value:?}");
  debug
    .split(|c: char| !c.is_alphanumeric())
    .next()
    .unwrap_or_default()
    .to_owned()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ast::{Kind, max_depth};

  fn kinds(tree: &Node) -> Vec<Kind> {
    tree.descendants().map(Node::kind).collect()
  }

  #[test]
  fn test_parse_heading_and_paragraph() {
    let tree = parse("# Title\n\nSome *text*.");
    assert_eq!(tree.children.len(), 2);
    assert_eq!(tree.children[0].kind, NodeKind::Heading { level: 1 });
    assert_eq!(tree.children[0].text_content(), "Title");
    assert!(kinds(&tree).contains(&Kind::Emphasis));
  }

  #[test]
  fn test_parse_fenced_code_language() {
    let tree = parse("```rust title=main\nfn main() {}\n```\n");
    assert_eq!(tree.children[0].kind, NodeKind::Code {
      lang:  Some("rust".into()),
      value: "fn main() {}\n".into(),
    });
  }

  #[test]
  fn test_parse_code_without_language() {
    let tree = parse("```\nplain\n```\n");
    assert!(matches!(
      tree.children[0].kind,
      NodeKind::Code { lang: None, .. }
    ));
  }

  #[test]
  fn test_parse_gfm_extensions() {
    let tree = parse(
      "| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~ and https://example.com",
    );
    let kinds = kinds(&tree);
    assert!(kinds.contains(&Kind::Table));
    assert!(kinds.contains(&Kind::Delete));
    assert!(kinds.contains(&Kind::Link));

    let header_row = &tree.children[0].children[0];
    assert_eq!(header_row.kind, NodeKind::TableRow { header: true });
    assert_eq!(header_row.children[0].kind, NodeKind::TableCell {
      header: true,
    });
  }

  #[test]
  fn test_parse_image_alt_is_flattened() {
    let tree = parse("![an *alt*](img.png \"Title\")");
    let image = &tree.children[0].children[0];
    assert_eq!(image.kind, NodeKind::Image {
      src:   "img.png".into(),
      alt:   "an alt".into(),
      title: Some("Title".into()),
    });
    assert!(image.children.is_empty());
  }

  #[test]
  fn test_parse_keeps_raw_html() {
    let tree = parse("<div>hi</div>\n\ntext <b>bold</b>");
    let kinds = kinds(&tree);
    assert_eq!(kinds.iter().filter(|k| **k == Kind::RawHtml).count(), 3);
  }

  #[test]
  fn test_parse_never_fails_on_garbage() {
    let tree = parse("[unclosed](link *emph `code\n\n|||\n<<<>>>");
    assert_eq!(tree.kind, NodeKind::Root);
    assert!(!tree.children.is_empty());
  }

  #[test]
  fn test_parse_task_list() {
    let tree = parse("- [x] done\n- [ ] open\n");
    let list = &tree.children[0];
    assert_eq!(list.children.len(), 2);
    assert_eq!(list.children[0].kind, NodeKind::ListItem);

    let checkbox = |item: &Node| item.children[0].kind.clone();
    assert_eq!(checkbox(&list.children[0]), NodeKind::Element {
      tag:        "input".into(),
      attributes: vec![
        ("type".into(), "checkbox".into()),
        ("checked".into(), String::new()),
        ("disabled".into(), String::new()),
      ],
    });
    assert_eq!(checkbox(&list.children[1]), NodeKind::Element {
      tag:        "input".into(),
      attributes: vec![
        ("type".into(), "checkbox".into()),
        ("disabled".into(), String::new()),
      ],
    });
    assert_eq!(list.children[0].text_content(), "done");
  }

  #[test]
  fn test_deep_blockquotes_are_flattened() {
    let tree = parse(&(">".repeat(20_000) + " deep"));
    assert!(max_depth(&tree) <= MAX_DEPTH);
    assert_eq!(tree.text_content(), "deep");
  }

  #[test]
  fn test_deep_lists_are_flattened() {
    let tree = parse(&("- ".repeat(1_000) + "item"));
    assert!(max_depth(&tree) <= MAX_DEPTH);
    assert_eq!(tree.text_content(), "item");
  }

  #[test]
  fn test_shallow_nesting_is_kept() {
    let tree = parse("> > > quoted");
    assert_eq!(max_depth(&tree), 5);
    assert_eq!(tree.text_content(), "quoted");
  }

  #[test]
  fn test_parse_ordered_list_start() {
    let tree = parse("3. three\n4. four\n");
    assert_eq!(tree.children[0].kind, NodeKind::List {
      ordered: true,
      start:   Some(3),
      tight:   true,
    });
    assert_eq!(tree.children[0].children.len(), 2);
  }
}
