//! Rendered output tree.
//!
//! This is what a render pass hands to the host: a small, owned element tree
//! that can be mounted as-is or serialised to HTML. Every text and attribute
//! value is escaped on serialisation, so nothing in here is ever interpreted as
//! markup.
use std::fmt::Write;

/// Elements serialised without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
  "area", "br", "col", "embed", "hr", "img", "input", "source", "wbr",
];

/// A node of the rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Element {
  /// Renders nothing.
  #[default]
  Empty,
  Text(String),
  Tag(Tag),
  /// Children without a wrapping element.
  Fragment(Vec<Element>),
}

/// An element with a tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
  pub name:       String,
  pub attributes: Vec<(String, String)>,
  pub children:   Vec<Element>,
}

impl Tag {
  #[must_use]
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name:       name.into(),
      attributes: Vec::new(),
      children:   Vec::new(),
    }
  }

  /// Add an attribute, replacing an existing one of the same name.
  #[must_use]
  pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    let name = name.into();
    let value = value.into();
    if let Some(existing) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
      existing.1 = value;
    } else {
      self.attributes.push((name, value));
    }
    self
  }

  /// Add an attribute only when a value is present.
  #[must_use]
  pub fn attr_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
    match value {
      Some(value) => self.attr(name, value),
      None => self,
    }
  }

  #[must_use]
  pub fn child(mut self, child: impl Into<Element>) -> Self {
    self.children.push(child.into());
    self
  }

  #[must_use]
  pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
    self.children.extend(children);
    self
  }

  #[must_use]
  pub fn get_attr(&self, name: &str) -> Option<&str> {
    self
      .attributes
      .iter()
      .find(|(n, _)| n == name)
      .map(|(_, v)| v.as_str())
  }
}

impl From<Tag> for Element {
  fn from(tag: Tag) -> Self {
    Self::Tag(tag)
  }
}

impl From<&str> for Element {
  fn from(text: &str) -> Self {
    Self::Text(text.to_owned())
  }
}

impl From<String> for Element {
  fn from(text: String) -> Self {
    Self::Text(text)
  }
}

impl Element {
  #[must_use]
  pub fn text(value: impl Into<String>) -> Self {
    Self::Text(value.into())
  }

  #[must_use]
  pub const fn is_empty(&self) -> bool {
    matches!(self, Self::Empty)
  }

  /// The tag, if this element is one.
  #[must_use]
  pub const fn as_tag(&self) -> Option<&Tag> {
    match self {
      Self::Tag(tag) => Some(tag),
      _ => None,
    }
  }

  /// First tag in document order whose `id` attribute equals `id`.
  #[must_use]
  pub fn find_by_id(&self, id: &str) -> Option<&Tag> {
    match self {
      Self::Empty | Self::Text(_) => None,
      Self::Tag(tag) => {
        if tag.get_attr("id") == Some(id) {
          return Some(tag);
        }
        tag.children.iter().find_map(|child| child.find_by_id(id))
      },
      Self::Fragment(children) => {
        children.iter().find_map(|child| child.find_by_id(id))
      },
    }
  }

  /// All tags with the given name, in document order.
  #[must_use]
  pub fn find_all(&self, name: &str) -> Vec<&Tag> {
    let mut found = Vec::new();
    self.collect_tags(name, &mut found);
    found
  }

  fn collect_tags<'a>(&'a self, name: &str, found: &mut Vec<&'a Tag>) {
    match self {
      Self::Empty | Self::Text(_) => {},
      Self::Tag(tag) => {
        if tag.name == name {
          found.push(tag);
        }
        for child in &tag.children {
          child.collect_tags(name, found);
        }
      },
      Self::Fragment(children) => {
        for child in children {
          child.collect_tags(name, found);
        }
      },
    }
  }

  /// Concatenated text of the element and its descendants.
  #[must_use]
  pub fn text_content(&self) -> String {
    let mut out = String::new();
    self.collect_text(&mut out);
    out
  }

  fn collect_text(&self, out: &mut String) {
    match self {
      Self::Empty => {},
      Self::Text(text) => out.push_str(text),
      Self::Tag(Tag { children, .. }) | Self::Fragment(children) => {
        for child in children {
          child.collect_text(out);
        }
      },
    }
  }

  /// Serialise to HTML.
  #[must_use]
  pub fn to_html(&self) -> String {
    let mut out = String::new();
    self.write_html(&mut out);
    out
  }

  fn write_html(&self, out: &mut String) {
    match self {
      Self::Empty => {},
      Self::Text(text) => out.push_str(&html_escape::encode_text(text)),
      Self::Fragment(children) => {
        for child in children {
          child.write_html(out);
        }
      },
      Self::Tag(tag) => {
        out.push('<');
        out.push_str(&tag.name);
        for (name, value) in &tag.attributes {
          let _ = write!(
            out,
            " {name}=\"{}\"",
            html_escape::encode_double_quoted_attribute(value)
          );
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&tag.name.as_str()) {
          return;
        }
        for child in &tag.children {
          child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&tag.name);
        out.push('>');
      },
    }
  }
}
