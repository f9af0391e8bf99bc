//! Structuring of raw HTML embedded in markdown.
//!
//! The parser keeps inline and block HTML as opaque [`RawHtml`] fragments,
//! often split across several sibling nodes (`<b>`, `text`, `</b>`). To let
//! the sanitizer judge it element by element, every child list that contains
//! raw HTML is written back out as HTML together with its markdown siblings,
//! cleaned by ammonia against the [`SanitizePolicy`] allow-list, re-parsed with
//! html5ever and mapped back into the tree. Elements with a markdown
//! counterpart become that node kind again; everything else becomes an
//! [`Element`] node. Nesting beyond [`MAX_DEPTH`] is flattened into text.
//!
//! [`RawHtml`]: crate::ast::NodeKind::RawHtml
//! [`Element`]: crate::ast::NodeKind::Element
use std::fmt::Write;

use kuchikikiki::{NodeRef, parse_html};
use log::{debug, trace};
use tendril::TendrilSink;

use crate::{
  ast::{Kind, MAX_DEPTH, Node, NodeKind},
  sanitize::SanitizePolicy,
};

/// Replace raw HTML fragments with structured nodes.
///
/// Only the outermost child lists containing raw HTML are re-parsed; their
/// descendants are re-parsed along with them. Markup outside the policy's
/// tags, attributes and protocols never reaches the tree; `script` and
/// `style` go with their content.
pub fn structure_raw_html(tree: &mut Node, policy: &SanitizePolicy) {
  let cleaner = policy.html_cleaner();
  structure(tree, &cleaner, 0);
}

fn structure(tree: &mut Node, cleaner: &ammonia::Builder<'_>, depth: usize) {
  if tree.children.iter().any(|child| child.kind() == Kind::RawHtml) {
    let source = to_html_source(&tree.children);
    trace!("Re-parsing {} bytes of mixed markdown and HTML", source.len());
    let cleaned = cleaner.clean(&source).to_string();
    tree.children = reparse(&cleaned, depth + 1);
    return;
  }
  for child in &mut tree.children {
    structure(child, cleaner, depth + 1);
  }
}

/// Write nodes back out as HTML, with raw fragments copied verbatim.
fn to_html_source(nodes: &[Node]) -> String {
  let mut out = String::new();
  for node in nodes {
    write_node(node, false, &mut out);
  }
  out
}

fn write_children(node: &Node, tight: bool, out: &mut String) {
  for child in &node.children {
    write_node(child, tight, out);
  }
}

fn write_wrapped(name: &str, node: &Node, out: &mut String) {
  let _ = write!(out, "<{name}>");
  write_children(node, false, out);
  let _ = write!(out, "</{name}>");
}

fn attr(out: &mut String, name: &str, value: &str) {
  let _ = write!(
    out,
    " {name}=\"{}\"",
    html_escape::encode_double_quoted_attribute(value)
  );
}

/// `tight` is set for the children of a tight list's items, whose paragraphs
/// are written without `<p>`.
fn write_node(node: &Node, tight: bool, out: &mut String) {
  match &node.kind {
    NodeKind::Root | NodeKind::Text { value: None } => {
      write_children(node, false, out);
    },
    NodeKind::Text { value: Some(value) } => {
      out.push_str(&html_escape::encode_text(value));
    },
    NodeKind::RawHtml { value } => out.push_str(value),
    NodeKind::Paragraph if tight => write_children(node, false, out),
    NodeKind::Paragraph => write_wrapped("p", node, out),
    NodeKind::Heading { level } => {
      write_wrapped(&format!("h{}", (*level).clamp(1, 6)), node, out);
    },
    NodeKind::Link { url, title } => {
      out.push_str("<a");
      attr(out, "href", url);
      if let Some(title) = title {
        attr(out, "title", title);
      }
      out.push('>');
      write_children(node, false, out);
      out.push_str("</a>");
    },
    NodeKind::Image { src, alt, title } => {
      out.push_str("<img");
      attr(out, "src", src);
      attr(out, "alt", alt);
      if let Some(title) = title {
        attr(out, "title", title);
      }
      out.push('>');
    },
    NodeKind::Code { lang, value } => {
      out.push_str("<pre><code");
      if let Some(lang) = lang {
        attr(out, "class", &format!("language-{lang}"));
      }
      out.push('>');
      out.push_str(&html_escape::encode_text(value));
      out.push_str("</code></pre>");
    },
    NodeKind::InlineCode { value } => {
      let _ = write!(out, "<code>{}</code>", html_escape::encode_text(value));
    },
    NodeKind::List {
      ordered,
      start,
      tight,
    } => {
      let name = if *ordered { "ol" } else { "ul" };
      out.push('<');
      out.push_str(name);
      if let Some(start) = start.filter(|start| *start != 1) {
        attr(out, "start", &start.to_string());
      }
      out.push('>');
      for item in &node.children {
        out.push_str("<li>");
        write_children(item, *tight, out);
        out.push_str("</li>");
      }
      let _ = write!(out, "</{name}>");
    },
    NodeKind::ListItem => write_wrapped("li", node, out),
    NodeKind::Table => write_wrapped("table", node, out),
    NodeKind::TableRow { .. } => write_wrapped("tr", node, out),
    NodeKind::TableCell { header } => {
      write_wrapped(if *header { "th" } else { "td" }, node, out);
    },
    NodeKind::Blockquote => write_wrapped("blockquote", node, out),
    NodeKind::Emphasis => write_wrapped("em", node, out),
    NodeKind::Strong => write_wrapped("strong", node, out),
    NodeKind::Delete => write_wrapped("del", node, out),
    NodeKind::Break => out.push_str("<br>"),
    NodeKind::ThematicBreak => out.push_str("<hr>"),
    NodeKind::Element { tag, attributes } => {
      out.push('<');
      out.push_str(tag);
      for (name, value) in attributes {
        attr(out, name, value);
      }
      out.push('>');
      write_children(node, false, out);
      let _ = write!(out, "</{tag}>");
    },
    NodeKind::Unknown { name } => {
      debug!("Dropping unsupported {name} node inside raw HTML");
    },
  }
}

/// Parse HTML and convert the content of its body into nodes at `depth`.
fn reparse(source: &str, depth: usize) -> Vec<Node> {
  let document = parse_html().one(source);
  let Ok(body) = document.select_first("body") else {
    return Vec::new();
  };
  let ctx = Context {
    in_thead: false,
    depth,
  };
  body.as_node().children().flat_map(|child| convert(&child, ctx)).collect()
}

#[derive(Debug, Clone, Copy, Default)]
struct Context {
  /// Rows inside `<thead>` are header rows.
  in_thead: bool,
  /// Tree depth of the node being converted.
  depth:    usize,
}

impl Context {
  const fn nested(self) -> Self {
    Self {
      depth: self.depth + 1,
      ..self
    }
  }
}

/// Convert the children of `node`, which sits at `ctx.depth`.
fn convert_children(node: &NodeRef, ctx: Context) -> Vec<Node> {
  let ctx = ctx.nested();
  node
    .children()
    .flat_map(|child| convert(&child, ctx))
    .collect()
}

fn convert(node: &NodeRef, ctx: Context) -> Vec<Node> {
  if ctx.depth >= MAX_DEPTH {
    trace!("Flattening HTML nested deeper than {MAX_DEPTH} levels");
    return vec![Node::text(node.text_contents())];
  }
  if let Some(text) = node.as_text() {
    return vec![Node::text(text.borrow().as_str())];
  }
  let Some(element) = node.as_element() else {
    // Comments, doctypes and processing instructions.
    return Vec::new();
  };

  let tag = element.name.local.to_string();
  let attributes: Vec<(String, String)> = element
    .attributes
    .borrow()
    .map
    .iter()
    .map(|(name, attribute)| {
      (name.local.to_string(), attribute.value.clone())
    })
    .collect();
  let get = |name: &str| {
    attributes
      .iter()
      .find(|(n, _)| n == name)
      .map(|(_, v)| v.clone())
  };

  // Table sections carry no meaning of their own.
  if matches!(tag.as_str(), "thead" | "tbody" | "tfoot") {
    let ctx = Context {
      in_thead: tag == "thead",
      depth:    ctx.depth,
    };
    return node
      .children()
      .flat_map(|child| convert(&child, ctx))
      .collect();
  }

  let kind = match &*element.name.local {
    "a" => {
      // An anchor whose href the cleaner removed links nowhere.
      let Some(url) = get("href") else {
        return convert_children(node, ctx);
      };
      NodeKind::Link {
        url,
        title: get("title"),
      }
    },
    "img" => {
      return vec![Node::leaf(NodeKind::Image {
        src:   get("src").unwrap_or_default(),
        alt:   get("alt").unwrap_or_default(),
        title: get("title"),
      })];
    },
    "pre" => {
      let code = node
        .children()
        .find(|child| {
          child
            .as_element()
            .is_some_and(|element| &*element.name.local == "code")
        });
      let lang = code
        .as_ref()
        .and_then(|code| code.as_element())
        .and_then(|element| {
          element
            .attributes
            .borrow()
            .get("class")
            .and_then(language_from_class)
        });
      return vec![Node::leaf(NodeKind::Code {
        lang,
        value: node.text_contents(),
      })];
    },
    "code" => {
      return vec![Node::leaf(NodeKind::InlineCode {
        value: node.text_contents(),
      })];
    },
    "tr" => {
      // Whitespace between cells is not content.
      let cells: Vec<Node> = convert_children(node, ctx)
        .into_iter()
        .filter(|cell| cell.kind() == Kind::TableCell)
        .collect();
      let header = ctx.in_thead
        || (!cells.is_empty()
          && cells
            .iter()
            .all(|cell| matches!(cell.kind, NodeKind::TableCell { header: true })));
      let cells = cells
        .into_iter()
        .map(|mut cell| {
          if let NodeKind::TableCell { header: ref mut h } = cell.kind {
            *h |= header;
          }
          cell
        })
        .collect();
      return vec![Node::new(NodeKind::TableRow { header }, cells)];
    },
    "th" => NodeKind::TableCell { header: true },
    "td" => NodeKind::TableCell { header: false },
    "ol" => {
      NodeKind::List {
        ordered: true,
        start:   get("start").and_then(|start| start.parse().ok()),
        tight:   false,
      }
    },
    _ if !attributes.is_empty() => {
      NodeKind::Element {
        tag,
        attributes,
      }
    },
    "p" => NodeKind::Paragraph,
    "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
      NodeKind::Heading {
        level: tag[1..].parse().unwrap_or(1),
      }
    },
    "em" => NodeKind::Emphasis,
    "strong" => NodeKind::Strong,
    "del" | "s" => NodeKind::Delete,
    "br" => NodeKind::Break,
    "hr" => NodeKind::ThematicBreak,
    "blockquote" => NodeKind::Blockquote,
    "ul" => {
      NodeKind::List {
        ordered: false,
        start:   None,
        tight:   false,
      }
    },
    "li" => NodeKind::ListItem,
    "table" => NodeKind::Table,
    _ => {
      NodeKind::Element {
        tag,
        attributes,
      }
    },
  };

  let children = match kind {
    NodeKind::Table => {
      convert_children(node, Context {
        in_thead: false,
        ..ctx
      })
        .into_iter()
        .filter(|row| row.kind() == Kind::TableRow)
        .collect()
    },
    NodeKind::List { .. } => {
      convert_children(node, ctx)
        .into_iter()
        .filter(|item| item.kind() == Kind::ListItem)
        .collect()
    },
    NodeKind::Break | NodeKind::ThematicBreak => Vec::new(),
    _ => convert_children(node, ctx),
  };
  vec![Node::new(kind, children)]
}

/// `language-rust` (possibly among other classes) to `rust`.
fn language_from_class(class: &str) -> Option<String> {
  class
    .split_whitespace()
    .find_map(|class| class.strip_prefix("language-"))
    .filter(|lang| !lang.is_empty())
    .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ast::max_depth, parser::parse};

  fn structured(markdown: &str) -> Node {
    let mut tree = parse(markdown);
    structure_raw_html(&mut tree, &SanitizePolicy::default());
    tree
  }

  fn kinds(tree: &Node) -> Vec<Kind> {
    tree.descendants().map(Node::kind).collect()
  }

  #[test]
  fn test_inline_html_is_structured() {
    let tree = structured("text <b>bold</b> and <em>em</em>");
    let paragraph = &tree.children[0];
    assert_eq!(paragraph.kind, NodeKind::Paragraph);
    assert!(!kinds(&tree).contains(&Kind::RawHtml));

    let bold = paragraph
      .children
      .iter()
      .find(|n| n.kind() == Kind::Element)
      .expect("b element");
    assert_eq!(bold.kind, NodeKind::Element {
      tag:        "b".into(),
      attributes: Vec::new(),
    });
    assert_eq!(bold.text_content(), "bold");
    assert!(kinds(paragraph).contains(&Kind::Emphasis));
  }

  #[test]
  fn test_block_html_wraps_markdown() {
    let tree = structured("<details>\n\n# Heading\n\nBody\n\n</details>\n");
    let details = tree
      .children
      .iter()
      .find(|n| n.kind() == Kind::Element)
      .expect("details element");
    let inner = kinds(details);
    assert!(inner.contains(&Kind::Heading));
    assert!(inner.contains(&Kind::Paragraph));
  }

  #[test]
  fn test_links_and_images_become_nodes() {
    let tree = structured(
      "<p align=\"center\"><img src=\"docs/logo.png\" alt=\"Logo\"></p>\n\n\
       <a href=\"docs/a.md\">A</a>",
    );
    let images: Vec<_> = tree
      .descendants()
      .filter(|n| n.kind() == Kind::Image)
      .collect();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].kind, NodeKind::Image {
      src:   "docs/logo.png".into(),
      alt:   "Logo".into(),
      title: None,
    });
    assert!(tree.descendants().any(|n| {
      matches!(&n.kind, NodeKind::Link { url, .. } if url == "docs/a.md")
    }));
    assert!(tree.descendants().any(|n| {
      matches!(&n.kind, NodeKind::Element { tag, .. } if tag == "p")
    }));
  }

  #[test]
  fn test_script_is_removed_with_its_content() {
    let tree = structured("Hello\n\n<div><script>alert(1)</script></div>\n");
    assert!(!tree.descendants().any(|n| {
      matches!(&n.kind, NodeKind::Element { tag, .. } if tag == "script")
    }));
    assert!(!tree.text_content().contains("alert"));
    assert!(tree.descendants().any(|n| {
      matches!(&n.kind, NodeKind::Element { tag, .. } if tag == "div")
    }));
  }

  #[test]
  fn test_disallowed_markup_never_becomes_a_node() {
    let tree = structured(
      "<div onclick=\"x()\"><iframe src=\"https://example.com\"></iframe>\
       <a href=\"javascript:alert(1)\">go</a></div>\n",
    );
    let div = tree
      .descendants()
      .find(|n| matches!(&n.kind, NodeKind::Element { tag, .. } if tag == "div"))
      .expect("div element");
    assert_eq!(div.kind, NodeKind::Element {
      tag:        "div".into(),
      attributes: Vec::new(),
    });
    assert!(!tree.descendants().any(|n| {
      matches!(&n.kind, NodeKind::Element { tag, .. } if tag == "iframe")
    }));
    // The link lost its href, so only its text remains.
    assert!(!kinds(&tree).contains(&Kind::Link));
    assert_eq!(tree.text_content().trim(), "go");
  }

  #[test]
  fn test_deep_html_is_flattened() {
    let markdown = format!("{}deep{}\n", "<div>".repeat(5000), "</div>".repeat(5000));
    let tree = structured(&markdown);
    assert!(max_depth(&tree) <= MAX_DEPTH);
    assert_eq!(tree.text_content().trim(), "deep");
  }

  #[test]
  fn test_html_below_nested_markdown_stays_within_depth() {
    let markdown = format!("{}<b>x</b>\n", "> ".repeat(MAX_DEPTH - 3));
    let tree = structured(&markdown);
    assert_eq!(max_depth(&tree), MAX_DEPTH);
    assert!(tree.descendants().any(|n| {
      matches!(&n.kind, NodeKind::Element { tag, .. } if tag == "b")
    }));
    assert_eq!(tree.text_content(), "x");
  }

  #[test]
  fn test_pre_code_becomes_code_block() {
    let tree = structured(
      "<pre><code class=\"language-rust\">fn a() {}</code></pre>\n",
    );
    let code = tree
      .descendants()
      .find(|n| n.kind() == Kind::Code)
      .expect("code block");
    assert_eq!(code.kind, NodeKind::Code {
      lang:  Some("rust".into()),
      value: "fn a() {}".into(),
    });
  }

  #[test]
  fn test_html_table_sections_are_flattened() {
    let tree = structured(
      "<table><thead><tr><td>a</td></tr></thead>\
       <tbody><tr><td>1</td></tr></tbody></table>\n",
    );
    let table = tree
      .descendants()
      .find(|n| n.kind() == Kind::Table)
      .expect("table");
    assert_eq!(table.children.len(), 2);
    assert_eq!(table.children[0].kind, NodeKind::TableRow { header: true });
    assert_eq!(table.children[1].kind, NodeKind::TableRow { header: false });
  }

  #[test]
  fn test_comments_are_dropped() {
    let tree = structured("before <!-- hidden --> after");
    assert_eq!(tree.text_content(), "before  after");
  }

  #[test]
  fn test_inline_html_in_tight_list_keeps_list() {
    let tree = structured("- one <b>1</b>\n- two\n");
    let list = &tree.children[0];
    assert!(matches!(list.kind, NodeKind::List { tight: true, .. }));
    assert_eq!(list.children.len(), 2);
    assert!(list.descendants().any(|n| {
      matches!(&n.kind, NodeKind::Element { tag, .. } if tag == "b")
    }));
  }

  #[test]
  fn test_html_list_drops_whitespace_between_items() {
    let tree = structured("<ol start=\"2\">\n<li>a</li>\n<li>b</li>\n</ol>\n");
    let list = tree
      .descendants()
      .find(|n| n.kind() == Kind::List)
      .expect("list");
    assert_eq!(list.kind, NodeKind::List {
      ordered: true,
      start:   Some(2),
      tight:   false,
    });
    assert_eq!(list.children.len(), 2);
  }

  #[test]
  fn test_language_from_class() {
    assert_eq!(
      language_from_class("hljs language-python").as_deref(),
      Some("python")
    );
    assert_eq!(language_from_class("plain"), None);
  }
}
