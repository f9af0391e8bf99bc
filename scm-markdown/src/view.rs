//! Document orchestration.
//!
//! A [`MarkdownView`] runs one render pass per input change: parse,
//! transform, structure raw HTML, sanitize and render, all behind a failure
//! boundary. After the host has committed the output it calls
//! [`MarkdownView::commit`] so the view can scroll to the anchor named in the
//! location fragment.
use std::{
  fmt,
  panic::{AssertUnwindSafe, catch_unwind},
  sync::Arc,
};

use log::{debug, error, trace, warn};

use crate::{
  ast::{Kind, Node, NodeKind},
  config::MarkdownConfig,
  error::{MarkdownError, MarkdownResult},
  extensions::ExtensionRegistry,
  host::{ContainerId, Host, Location},
  parser::parse,
  raw::structure_raw_html,
  render::{Element, RenderContext, Renderer, RendererRegistry, Tag, render},
  sanitize::{SanitizePolicy, sanitize},
  syntax::{SyntaxManager, create_default_manager},
  transform::{Transform, apply_transforms, builtin_transforms},
  types::Header,
  utils::heading_anchor_id,
};

/// Where readers are pointed when their markdown cannot be rendered.
pub const GFM_SPEC_URL: &str = "https://github.github.com/gfm/";

/// Input of one render pass.
#[derive(Clone, Default)]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Document flags are independent switches"
)]
pub struct Document {
  pub content:                String,
  /// Where the document's repository tree is mounted in the application.
  pub base_path:              Option<String>,
  /// Stable URL of the document, used for heading anchors.
  pub permalink:              Option<String>,
  /// Leave raw HTML unstructured, so the sanitizer drops all of it.
  pub skip_html:              bool,
  pub enable_anchor_headings: bool,
  pub renderers:              RendererRegistry,
  /// Caller transforms, run before the built-in ones.
  pub transforms:             Vec<Arc<dyn Transform>>,
  /// Revision the document was loaded at.
  pub revision:               Option<String>,
  /// Raw content URL template with `{revision}` and `{path}` placeholders.
  pub content_template:       Option<String>,
  /// Expand `namespace/name@revision` shortlinks.
  pub shortlinks:             bool,
}

impl fmt::Debug for Document {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Document")
      .field("content", &self.content)
      .field("base_path", &self.base_path)
      .field("permalink", &self.permalink)
      .field("skip_html", &self.skip_html)
      .field("enable_anchor_headings", &self.enable_anchor_headings)
      .field("renderers", &self.renderers)
      .field(
        "transforms",
        &self.transforms.iter().map(|t| t.name()).collect::<Vec<_>>(),
      )
      .field("revision", &self.revision)
      .field("content_template", &self.content_template)
      .field("shortlinks", &self.shortlinks)
      .finish()
  }
}

impl Document {
  #[must_use]
  pub fn builder(content: impl Into<String>) -> DocumentBuilder {
    DocumentBuilder::new(content)
  }
}

/// Builder for [`Document`].
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
  document: Document,
}

impl DocumentBuilder {
  #[must_use]
  pub fn new(content: impl Into<String>) -> Self {
    Self {
      document: Document {
        content: content.into(),
        shortlinks: true,
        ..Document::default()
      },
    }
  }

  /// Start from the document flags in `config`.
  #[must_use]
  pub fn from_config(content: impl Into<String>, config: &MarkdownConfig) -> Self {
    Self::new(content)
      .skip_html(config.skip_html)
      .enable_anchor_headings(config.enable_anchor_headings)
      .shortlinks(config.shortlinks)
  }

  #[must_use]
  pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
    self.document.base_path = Some(base_path.into());
    self
  }

  #[must_use]
  pub fn permalink(mut self, permalink: impl Into<String>) -> Self {
    self.document.permalink = Some(permalink.into());
    self
  }

  #[must_use]
  pub const fn skip_html(mut self, skip_html: bool) -> Self {
    self.document.skip_html = skip_html;
    self
  }

  #[must_use]
  pub const fn enable_anchor_headings(mut self, enabled: bool) -> Self {
    self.document.enable_anchor_headings = enabled;
    self
  }

  #[must_use]
  pub const fn shortlinks(mut self, enabled: bool) -> Self {
    self.document.shortlinks = enabled;
    self
  }

  /// Override the renderer of one node kind.
  #[must_use]
  pub fn renderer(mut self, kind: Kind, renderer: impl Renderer + 'static) -> Self {
    self.document.renderers.insert(kind, Arc::new(renderer));
    self
  }

  /// Append a transform; transforms run in the order they were added.
  #[must_use]
  pub fn transform(mut self, transform: impl Transform + 'static) -> Self {
    self.document.transforms.push(Arc::new(transform));
    self
  }

  #[must_use]
  pub fn revision(mut self, revision: impl Into<String>) -> Self {
    self.document.revision = Some(revision.into());
    self
  }

  #[must_use]
  pub fn content_template(mut self, template: impl Into<String>) -> Self {
    self.document.content_template = Some(template.into());
    self
  }

  #[must_use]
  pub fn build(self) -> Document {
    self.document
  }
}

/// Progress of the current render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
  #[default]
  Idle,
  Parsing,
  Transforming,
  Sanitizing,
  Rendering,
  Rendered,
  Failed,
}

/// Result of a render pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderOutput {
  /// Rendered tree, or the fallback notification.
  pub element: Element,
  /// `element` serialised to HTML.
  pub html:    String,
  /// Headings in document order.
  pub headers: Vec<Header>,
  /// Text of the first level-one heading.
  pub title:   Option<String>,
  /// Why the pass failed, when it did.
  pub error:   Option<String>,
}

impl RenderOutput {
  #[must_use]
  pub const fn is_fallback(&self) -> bool {
    self.error.is_some()
  }
}

/// Inputs a cached output depends on.
///
/// Renderer overrides and transforms are closures and cannot be compared, so
/// they are not part of the key. A document with a different plugin list
/// needs a new view or new content to be rendered again.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RenderKey {
  content:                String,
  base_path:              Option<String>,
  permalink:              Option<String>,
  skip_html:              bool,
  enable_anchor_headings: bool,
  revision:               Option<String>,
  content_template:       Option<String>,
  shortlinks:             bool,
  pathname:               String,
}

impl RenderKey {
  fn new(document: &Document, location: &Location) -> Self {
    Self {
      content:                document.content.clone(),
      base_path:              document.base_path.clone(),
      permalink:              document.permalink.clone(),
      skip_html:              document.skip_html,
      enable_anchor_headings: document.enable_anchor_headings,
      revision:               document.revision.clone(),
      content_template:       document.content_template.clone(),
      shortlinks:             document.shortlinks,
      pathname:               location.pathname.clone(),
    }
  }
}

/// Renders documents and keeps the state between passes.
pub struct MarkdownView {
  extensions: Arc<ExtensionRegistry>,
  syntax:     Option<SyntaxManager>,
  policy:     SanitizePolicy,
  stage:      Stage,
  key:        Option<RenderKey>,
  output:     RenderOutput,
  container:  Option<ContainerId>,
}

impl fmt::Debug for MarkdownView {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MarkdownView")
      .field("extensions", &self.extensions)
      .field("syntax", &self.syntax)
      .field("stage", &self.stage)
      .field("container", &self.container)
      .finish_non_exhaustive()
  }
}

impl MarkdownView {
  /// A view with the default configuration.
  #[must_use]
  pub fn new(extensions: Arc<ExtensionRegistry>) -> Self {
    Self::from_config(extensions, &MarkdownConfig::default())
  }

  /// A view set up from `config`.
  ///
  /// Highlighting is left off, with a warning, if the configured backend or
  /// theme is unavailable.
  #[must_use]
  pub fn from_config(
    extensions: Arc<ExtensionRegistry>,
    config: &MarkdownConfig,
  ) -> Self {
    let syntax = if config.highlight_code {
      create_default_manager(config.highlight_theme.as_deref())
        .inspect_err(|e| warn!("Syntax highlighting disabled: {e}"))
        .ok()
    } else {
      None
    };
    let policy = SanitizePolicy::default()
      .with_protocols(extensions.protocols())
      .with_protocols(&config.extra_protocols);

    Self {
      extensions,
      syntax,
      policy,
      stage: Stage::Idle,
      key: None,
      output: RenderOutput::default(),
      container: None,
    }
  }

  /// Replace the highlighter.
  #[must_use]
  pub fn with_syntax(mut self, syntax: Option<SyntaxManager>) -> Self {
    self.syntax = syntax;
    self
  }

  #[must_use]
  pub const fn stage(&self) -> Stage {
    self.stage
  }

  #[must_use]
  pub const fn policy(&self) -> &SanitizePolicy {
    &self.policy
  }

  /// Output of the last render pass.
  #[must_use]
  pub const fn output(&self) -> &RenderOutput {
    &self.output
  }

  /// Render `document` as seen from `location`.
  ///
  /// The pipeline only runs again when the content, base path, permalink or
  /// location pathname differ from the previous pass. Failures never escape:
  /// the output is then the fallback notification.
  pub fn render(&mut self, document: &Document, location: &Location) -> &RenderOutput {
    let key = RenderKey::new(document, location);
    if self.key.as_ref() == Some(&key) {
      trace!("Inputs unchanged, reusing previous render");
      return &self.output;
    }

    self.stage = Stage::Idle;
    let stage = &mut self.stage;
    let outcome = catch_unwind(AssertUnwindSafe(|| {
      run_pipeline(
        document,
        location,
        &self.extensions,
        self.syntax.as_ref(),
        &self.policy,
        stage,
      )
    }));

    self.output = match outcome {
      Ok(Ok(output)) => {
        self.stage = Stage::Rendered;
        output
      },
      Ok(Err(e)) => self.fail(&e),
      Err(panic) => {
        let message = panic_message(&*panic);
        self.fail(&MarkdownError::Panic(message))
      },
    };
    self.key = Some(key);
    &self.output
  }

  fn fail(&mut self, e: &MarkdownError) -> RenderOutput {
    error!("Markdown could not be rendered during {:?}: {e}", self.stage);
    self.stage = Stage::Failed;
    let element = fallback_notification();
    RenderOutput {
      html: element.to_html(),
      element,
      headers: Vec::new(),
      title: None,
      error: Some(e.to_string()),
    }
  }

  /// Run after the host committed the output into `container`.
  ///
  /// The first time a given container is seen, and the location has a
  /// fragment, the element whose id equals the decoded fragment is scrolled
  /// into view. Returns whether a scroll was requested.
  pub fn commit(
    &mut self,
    container: Option<ContainerId>,
    location: &Location,
    host: &mut dyn Host,
  ) -> bool {
    let Some(container) = container else {
      return false;
    };
    if self.container == Some(container) {
      return false;
    }
    self.container = Some(container);

    let Some(fragment) = location.fragment() else {
      return false;
    };
    if self.output.element.find_by_id(&fragment).is_none() {
      debug!("No element with id '{fragment}' to scroll to");
      return false;
    }
    host.scroll_into_view(&fragment);
    true
  }

  /// Copy the absolute permalink of a heading anchor, then point the location
  /// fragment at it.
  ///
  /// Does nothing when the last rendered document had no permalink.
  pub fn copy_permalink(&self, anchor_id: &str, host: &mut dyn Host) -> bool {
    let Some(permalink) = self.key.as_ref().and_then(|key| key.permalink.as_deref())
    else {
      return false;
    };
    let url = format!("{}{permalink}#{anchor_id}", host.origin());
    host.copy_to_clipboard(&url);
    host.replace_fragment(anchor_id);
    true
  }
}

fn run_pipeline(
  document: &Document,
  location: &Location,
  extensions: &ExtensionRegistry,
  syntax: Option<&SyntaxManager>,
  policy: &SanitizePolicy,
  stage: &mut Stage,
) -> MarkdownResult<RenderOutput> {
  *stage = Stage::Parsing;
  trace!("Parsing {} bytes of markdown", document.content.len());
  let tree = parse(&document.content);

  *stage = Stage::Transforming;
  let plugins: Vec<Arc<dyn Transform>> = document
    .transforms
    .iter()
    .cloned()
    .chain(builtin_transforms(document.shortlinks))
    .collect();
  let mut tree = apply_transforms(tree, &plugins)?;
  if !document.skip_html {
    structure_raw_html(&mut tree, policy);
  }

  *stage = Stage::Sanitizing;
  let tree = sanitize(tree, policy);
  let headers = collect_headers(&tree);
  let title = headers
    .iter()
    .find(|header| header.level == 1)
    .map(|header| header.text.clone());

  *stage = Stage::Rendering;
  let renderers = document.renderers.resolve();
  let ctx = RenderContext {
    base_path: document.base_path.as_deref(),
    current_path: &location.pathname,
    revision: document.revision.as_deref(),
    content_template: document.content_template.as_deref(),
    permalink: document.permalink.as_deref(),
    enable_anchor_headings: document.enable_anchor_headings,
    extensions,
    syntax,
  };
  let element = render(&tree, &renderers, &ctx)?;

  Ok(RenderOutput {
    html: element.to_html(),
    element,
    headers,
    title,
    error: None,
  })
}

fn collect_headers(tree: &Node) -> Vec<Header> {
  tree
    .descendants()
    .filter_map(|node| {
      let NodeKind::Heading { level } = node.kind else {
        return None;
      };
      Some(Header {
        text: node.text_content(),
        level,
        id: heading_anchor_id(node),
      })
    })
    .collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
  payload
    .downcast_ref::<String>()
    .cloned()
    .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_owned()))
    .unwrap_or_else(|| "unknown panic".to_owned())
}

/// What the reader sees in place of a document that failed to render.
#[must_use]
pub fn fallback_notification() -> Element {
  Tag::new("div")
    .attr("class", "notification is-danger")
    .child(
      Tag::new("p")
        .child(Tag::new("strong").child("This content could not be rendered.")),
    )
    .child(Tag::new("p").child(
      "It may contain markup that is not supported. To show markup as it is \
       written, put it in a fenced code block:",
    ))
    .child(Tag::new("pre").child(Tag::new("code").child("```\n<your markup>\n```")))
    .child(
      Tag::new("p")
        .child("See the ")
        .child(
          Tag::new("a")
            .attr("href", GFM_SPEC_URL)
            .attr("target", "_blank")
            .attr("rel", "noopener noreferrer")
            .child("GitHub Flavored Markdown specification"),
        )
        .child(" for the supported syntax."),
    )
    .into()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::TransformError;

  fn view() -> MarkdownView {
    MarkdownView::new(ExtensionRegistry::new().into_shared()).with_syntax(None)
  }

  #[test]
  fn test_builder_defaults() {
    let document = Document::builder("# Hi").build();
    assert!(document.shortlinks);
    assert!(!document.skip_html);
    assert!(document.base_path.is_none());
  }

  #[test]
  fn test_render_collects_headers_and_title() {
    let mut view = view();
    let document = Document::builder("# Title\n\n## Sub Section\n").build();
    let output = view.render(&document, &Location::new("/"));
    assert_eq!(output.title.as_deref(), Some("Title"));
    assert_eq!(output.headers.len(), 2);
    assert_eq!(output.headers[1].id, "sub-section");
    assert_eq!(view.stage(), Stage::Rendered);
  }

  #[test]
  fn test_unchanged_inputs_reuse_output() {
    let mut view = view();
    let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let seen = Arc::clone(&counter);
    let document = Document::builder("text")
      .transform(move |_: &mut Node| -> Result<(), TransformError> {
        seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
      })
      .build();
    let location = Location::new("/a");

    view.render(&document, &location);
    view.render(&document, &location);
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);

    view.render(&document, &Location::new("/b"));
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 2);
  }

  #[test]
  fn test_document_flags_invalidate_output() {
    let mut view = view();
    let location = Location::new("/");

    let with_html = Document::builder("<b>x</b>").build();
    let output = view.render(&with_html, &location);
    assert!(output.html.contains("<b>x</b>"));

    let without_html = Document::builder("<b>x</b>").skip_html(true).build();
    let output = view.render(&without_html, &location);
    assert!(!output.html.contains("<b>"));
    assert!(output.html.contains('x'));
  }

  #[test]
  fn test_deep_nesting_renders() {
    let mut view = view();
    let content = format!("{} deep", ">".repeat(20_000));
    let output =
      view.render(&Document::builder(content).build(), &Location::new("/"));
    assert!(!output.is_fallback());
    assert!(output.html.contains("deep"));
  }

  #[test]
  fn test_transform_error_renders_fallback() {
    let mut view = view();
    let document = Document::builder("text")
      .transform(|_: &mut Node| -> Result<(), TransformError> {
        Err(TransformError::new("broken plugin"))
      })
      .build();
    let output = view.render(&document, &Location::new("/"));
    assert!(output.is_fallback());
    assert!(output.html.contains("notification is-danger"));
    assert!(output.html.contains(GFM_SPEC_URL));
    assert_eq!(view.stage(), Stage::Failed);
  }

  #[test]
  fn test_fallback_has_code_hint() {
    let fallback = fallback_notification();
    assert_eq!(fallback.find_all("pre").len(), 1);
    assert!(fallback.text_content().contains("```"));
  }
}
