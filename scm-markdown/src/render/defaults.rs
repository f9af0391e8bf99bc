//! Built-in renderers for the structural node kinds.
use std::sync::Arc;

use super::{
  Element,
  RenderContext,
  Renderer,
  Tag,
  code::render_code,
  heading::render_heading,
  link::{render_image, render_link},
};
use crate::{
  ast::{Kind, Node, NodeKind},
  error::RenderResult,
};

/// The built-in renderer for `kind`, if it has one.
///
/// Raw HTML and unknown nodes have none; the sanitizer removes them before
/// rendering anyway.
pub(super) fn default_renderer(kind: Kind) -> Option<Arc<dyn Renderer>> {
  let renderer: Arc<dyn Renderer> = match kind {
    Kind::Root => Arc::new(render_root),
    Kind::Text => Arc::new(render_text),
    Kind::Paragraph => Arc::new(wrap("p")),
    Kind::Heading => Arc::new(render_heading),
    Kind::Link => Arc::new(render_link),
    Kind::Image => Arc::new(render_image),
    Kind::Code => Arc::new(render_code),
    Kind::InlineCode => Arc::new(render_inline_code),
    Kind::List => Arc::new(render_list),
    Kind::ListItem => Arc::new(wrap("li")),
    Kind::Table => Arc::new(render_table),
    Kind::TableRow => Arc::new(wrap("tr")),
    Kind::TableCell => Arc::new(render_table_cell),
    Kind::Blockquote => Arc::new(wrap("blockquote")),
    Kind::Emphasis => Arc::new(wrap("em")),
    Kind::Strong => Arc::new(wrap("strong")),
    Kind::Delete => Arc::new(wrap("del")),
    Kind::Break => Arc::new(wrap("br")),
    Kind::ThematicBreak => Arc::new(wrap("hr")),
    Kind::Element => Arc::new(render_element),
    Kind::RawHtml | Kind::Unknown => return None,
  };
  Some(renderer)
}

/// A renderer that wraps the children in a plain tag.
fn wrap(
  name: &'static str,
) -> impl Fn(&Node, Vec<Element>, &RenderContext<'_>) -> RenderResult<Element>
+ Send
+ Sync {
  move |_, children, _| Ok(Tag::new(name).children(children).into())
}

fn render_root(
  _: &Node,
  children: Vec<Element>,
  _: &RenderContext<'_>,
) -> RenderResult<Element> {
  Ok(Element::Fragment(children))
}

fn render_text(
  node: &Node,
  _: Vec<Element>,
  _: &RenderContext<'_>,
) -> RenderResult<Element> {
  Ok(node.text_value().map_or(Element::Empty, Element::text))
}

fn render_inline_code(
  node: &Node,
  _: Vec<Element>,
  _: &RenderContext<'_>,
) -> RenderResult<Element> {
  let NodeKind::InlineCode { value } = &node.kind else {
    return Ok(Element::Empty);
  };
  Ok(Tag::new("code").child(value.as_str()).into())
}

fn render_list(
  node: &Node,
  children: Vec<Element>,
  _: &RenderContext<'_>,
) -> RenderResult<Element> {
  let NodeKind::List {
    ordered,
    start,
    tight,
  } = node.kind
  else {
    return Ok(Element::Fragment(children));
  };

  let children = if tight {
    children.into_iter().map(unwrap_paragraphs).collect()
  } else {
    children
  };

  let tag = if ordered {
    Tag::new("ol").attr_opt(
      "start",
      start.filter(|start| *start != 1).map(|start| start.to_string()),
    )
  } else {
    Tag::new("ul")
  };
  Ok(tag.children(children).into())
}

/// Replace `<p>` children of a list item with their content.
fn unwrap_paragraphs(item: Element) -> Element {
  let Element::Tag(mut tag) = item else {
    return item;
  };
  tag.children = tag
    .children
    .into_iter()
    .map(|child| {
      match child {
        Element::Tag(p) if p.name == "p" => Element::Fragment(p.children),
        other => other,
      }
    })
    .collect();
  Element::Tag(tag)
}

fn render_table(
  node: &Node,
  children: Vec<Element>,
  _: &RenderContext<'_>,
) -> RenderResult<Element> {
  let mut head = Vec::new();
  let mut body = Vec::new();
  for (row, element) in node.children.iter().zip(children) {
    if matches!(row.kind, NodeKind::TableRow { header: true }) {
      head.push(element);
    } else {
      body.push(element);
    }
  }

  let mut table = Tag::new("table");
  if !head.is_empty() {
    table = table.child(Tag::new("thead").children(head));
  }
  if !body.is_empty() {
    table = table.child(Tag::new("tbody").children(body));
  }
  Ok(table.into())
}

fn render_table_cell(
  node: &Node,
  children: Vec<Element>,
  _: &RenderContext<'_>,
) -> RenderResult<Element> {
  let name = if matches!(node.kind, NodeKind::TableCell { header: true }) {
    "th"
  } else {
    "td"
  };
  Ok(Tag::new(name).children(children).into())
}

fn render_element(
  node: &Node,
  children: Vec<Element>,
  _: &RenderContext<'_>,
) -> RenderResult<Element> {
  let NodeKind::Element { tag, attributes } = &node.kind else {
    return Ok(Element::Fragment(children));
  };
  let mut element = Tag::new(tag.as_str()).children(children);
  element.attributes.clone_from(attributes);
  Ok(element.into())
}
