//! Renderer registry and tree walk.
//!
//! Each node kind maps to one [`Renderer`]. Callers may override any kind;
//! overrides and defaults are merged once per render pass into a
//! [`ResolvedRenderers`] table, so the walk itself never has to decide between
//! an override and a default.
mod code;
mod defaults;
mod element;
mod heading;
mod link;

use std::{collections::HashMap, fmt, sync::Arc};

use log::trace;

pub use self::{
  code::render_code,
  element::{Element, Tag},
  heading::{ANCHOR_COPY_CLASS, ANCHOR_LINK_CLASS, render_heading},
  link::{render_image, render_link},
};
use crate::{
  ast::{Kind, Node},
  error::{MarkdownError, MarkdownResult, RenderResult},
  extensions::ExtensionRegistry,
  syntax::SyntaxManager,
};

/// Everything a renderer may consult besides the node itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
  /// Where the document's repository tree is mounted in the application.
  pub base_path:              Option<&'a str>,
  /// Path of the page showing the document.
  pub current_path:           &'a str,
  /// Revision the document was loaded at, for image URLs.
  pub revision:               Option<&'a str>,
  /// URL template with `{revision}` and `{path}` placeholders that fetches
  /// raw file content.
  pub content_template:       Option<&'a str>,
  /// Stable URL of the document, for heading self links.
  pub permalink:              Option<&'a str>,
  pub enable_anchor_headings: bool,
  pub extensions:             &'a ExtensionRegistry,
  pub syntax:                 Option<&'a SyntaxManager>,
}

impl<'a> RenderContext<'a> {
  /// A context with no path information and no highlighting.
  #[must_use]
  pub const fn new(extensions: &'a ExtensionRegistry) -> Self {
    Self {
      base_path: None,
      current_path: "/",
      revision: None,
      content_template: None,
      permalink: None,
      enable_anchor_headings: false,
      extensions,
      syntax: None,
    }
  }
}

/// Renders one node, given its already-rendered children.
pub trait Renderer: Send + Sync {
  /// # Errors
  ///
  /// Any error aborts the render pass.
  fn render(
    &self,
    node: &Node,
    children: Vec<Element>,
    ctx: &RenderContext<'_>,
  ) -> RenderResult<Element>;
}

impl<F> Renderer for F
where
  F: Fn(&Node, Vec<Element>, &RenderContext<'_>) -> RenderResult<Element>
    + Send
    + Sync,
{
  fn render(
    &self,
    node: &Node,
    children: Vec<Element>,
    ctx: &RenderContext<'_>,
  ) -> RenderResult<Element> {
    self(node, children, ctx)
  }
}

/// Caller-supplied renderer overrides, keyed by node kind.
#[derive(Default, Clone)]
pub struct RendererRegistry {
  overrides: HashMap<Kind, Arc<dyn Renderer>>,
}

impl fmt::Debug for RendererRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut kinds: Vec<_> = self.overrides.keys().collect();
    kinds.sort();
    f.debug_struct("RendererRegistry")
      .field("overrides", &kinds)
      .finish()
  }
}

impl RendererRegistry {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Override the renderer for `kind`.
  #[must_use]
  pub fn with(mut self, kind: Kind, renderer: impl Renderer + 'static) -> Self {
    self.insert(kind, Arc::new(renderer));
    self
  }

  pub fn insert(&mut self, kind: Kind, renderer: Arc<dyn Renderer>) {
    self.overrides.insert(kind, renderer);
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.overrides.is_empty()
  }

  /// Merge overrides with the defaults into one table.
  #[must_use]
  pub fn resolve(&self) -> ResolvedRenderers {
    ResolvedRenderers {
      table: Kind::ALL.map(|kind| {
        self
          .overrides
          .get(&kind)
          .cloned()
          .or_else(|| defaults::default_renderer(kind))
      }),
    }
  }
}

/// One renderer (or none) per node kind.
#[derive(Clone)]
pub struct ResolvedRenderers {
  table: [Option<Arc<dyn Renderer>>; Kind::ALL.len()],
}

impl Default for ResolvedRenderers {
  fn default() -> Self {
    RendererRegistry::new().resolve()
  }
}

impl fmt::Debug for ResolvedRenderers {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let kinds: Vec<Kind> = Kind::ALL
      .into_iter()
      .filter(|kind| self.table[kind.index()].is_some())
      .collect();
    f.debug_struct("ResolvedRenderers")
      .field("kinds", &kinds)
      .finish()
  }
}

impl ResolvedRenderers {
  #[must_use]
  pub fn get(&self, kind: Kind) -> Option<&dyn Renderer> {
    self.table[kind.index()].as_deref()
  }
}

/// Render a tree depth first, children before their parent.
///
/// Nodes whose kind has no renderer produce nothing, together with their
/// subtree.
///
/// # Errors
///
/// Returns the first renderer failure, tagged with the node kind.
pub fn render(
  tree: &Node,
  renderers: &ResolvedRenderers,
  ctx: &RenderContext<'_>,
) -> MarkdownResult<Element> {
  let kind = tree.kind();
  let Some(renderer) = renderers.get(kind) else {
    trace!("No renderer for {kind} node, skipping it");
    return Ok(Element::Empty);
  };

  let children = tree
    .children
    .iter()
    .map(|child| render(child, renderers, ctx))
    .collect::<MarkdownResult<Vec<_>>>()?;

  renderer
    .render(tree, children, ctx)
    .map_err(|source| MarkdownError::Render { kind, source })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ast::NodeKind, error::RenderError, parser::parse};

  fn html(markdown: &str) -> String {
    let registry = ExtensionRegistry::new();
    let ctx = RenderContext::new(&registry);
    render(&parse(markdown), &ResolvedRenderers::default(), &ctx)
      .expect("renders")
      .to_html()
  }

  #[test]
  fn test_renders_basic_blocks() {
    assert_eq!(
      html("Some *emphasis*, **strong** and ~~gone~~.\n\n---\n\n> quoted"),
      "<p>Some <em>emphasis</em>, <strong>strong</strong> and \
       <del>gone</del>.</p><hr><blockquote><p>quoted</p></blockquote>"
    );
  }

  #[test]
  fn test_renders_lists() {
    assert_eq!(
      html("3. three\n4. four"),
      "<ol start=\"3\"><li>three</li><li>four</li></ol>"
    );
    assert_eq!(html("- a\n- b"), "<ul><li>a</li><li>b</li></ul>");
  }

  #[test]
  fn test_renders_table_sections() {
    assert_eq!(
      html("| a | b |\n|---|---|\n| 1 | 2 |"),
      "<table><thead><tr><th>a</th><th>b</th></tr></thead>\
       <tbody><tr><td>1</td><td>2</td></tr></tbody></table>"
    );
  }

  #[test]
  fn test_override_replaces_default() {
    let overrides = RendererRegistry::new().with(
      Kind::Paragraph,
      |_: &Node, children: Vec<Element>, _: &RenderContext<'_>| -> RenderResult<Element> {
        Ok(Tag::new("div").attr("class", "para").children(children).into())
      },
    );
    let registry = ExtensionRegistry::new();
    let ctx = RenderContext::new(&registry);
    let element = render(&parse("hello"), &overrides.resolve(), &ctx)
      .expect("renders");
    assert_eq!(element.to_html(), "<div class=\"para\">hello</div>");
  }

  #[test]
  fn test_kinds_without_renderer_render_nothing() {
    let tree = Node::root(vec![
      Node::leaf(NodeKind::Unknown {
        name: "FootnoteDefinition".into(),
      }),
      Node::paragraph(vec![Node::text("kept")]),
    ]);
    let registry = ExtensionRegistry::new();
    let ctx = RenderContext::new(&registry);
    let element = render(&tree, &ResolvedRenderers::default(), &ctx)
      .expect("renders");
    assert_eq!(element.to_html(), "<p>kept</p>");
  }

  #[test]
  fn test_renderer_error_is_tagged_with_kind() {
    let overrides = RendererRegistry::new().with(
      Kind::Strong,
      |_: &Node, _: Vec<Element>, _: &RenderContext<'_>| -> RenderResult<Element> {
        Err(RenderError::new("boom"))
      },
    );
    let registry = ExtensionRegistry::new();
    let ctx = RenderContext::new(&registry);
    let err = render(&parse("**x**"), &overrides.resolve(), &ctx)
      .expect_err("render fails");
    assert!(matches!(err, MarkdownError::Render { kind: Kind::Strong, .. }));
  }
}
