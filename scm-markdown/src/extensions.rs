//! Renderers contributed by other parts of the application.
//!
//! Extensions are keyed by link protocol (`scw:` links, say) or by code-block
//! language. The registry is filled once at start-up and then shared
//! read-only by every render pass; registering a protocol also widens the
//! sanitizer's protocol allow-list so that such links survive sanitization.
use std::{collections::BTreeMap, fmt, sync::Arc};

use log::debug;

use crate::{error::RenderResult, render::Element};

/// A link whose protocol an extension claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolLinkProps<'a> {
  /// Protocol without the colon.
  pub protocol: &'a str,
  /// Percent-decoded remainder after `<protocol>:`.
  pub value:    String,
  /// The link target as written.
  pub href:     &'a str,
}

/// Renders links of one protocol.
pub trait ProtocolRenderer: Send + Sync {
  /// # Errors
  ///
  /// Errors are caught by the document boundary.
  fn render(
    &self,
    link: &ProtocolLinkProps<'_>,
    children: Vec<Element>,
  ) -> RenderResult<Element>;
}

impl<F> ProtocolRenderer for F
where
  F: Fn(&ProtocolLinkProps<'_>, Vec<Element>) -> RenderResult<Element>
    + Send
    + Sync,
{
  fn render(
    &self,
    link: &ProtocolLinkProps<'_>,
    children: Vec<Element>,
  ) -> RenderResult<Element> {
    self(link, children)
  }
}

/// Renders code blocks of one language.
pub trait LanguageRenderer: Send + Sync {
  /// # Errors
  ///
  /// Errors are caught by the document boundary.
  fn render(&self, language: &str, value: &str) -> RenderResult<Element>;
}

impl<F> LanguageRenderer for F
where
  F: Fn(&str, &str) -> RenderResult<Element> + Send + Sync,
{
  fn render(&self, language: &str, value: &str) -> RenderResult<Element> {
    self(language, value)
  }
}

/// Protocol and language renderers, looked up by exact key.
#[derive(Default, Clone)]
pub struct ExtensionRegistry {
  protocols: BTreeMap<String, Arc<dyn ProtocolRenderer>>,
  languages: BTreeMap<String, Arc<dyn LanguageRenderer>>,
}

impl ExtensionRegistry {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a renderer for links of `protocol`.
  ///
  /// A later registration for the same protocol replaces the earlier one.
  pub fn register_protocol_renderer(
    &mut self,
    protocol: impl Into<String>,
    renderer: impl ProtocolRenderer + 'static,
  ) -> &mut Self {
    let protocol = protocol.into();
    if self
      .protocols
      .insert(protocol.clone(), Arc::new(renderer))
      .is_some()
    {
      debug!("Protocol renderer for '{protocol}' replaced by a later registration");
    } else {
      debug!("Registered protocol renderer for '{protocol}'");
    }
    self
  }

  /// Register a renderer for code blocks tagged with `language`.
  ///
  /// A later registration for the same language replaces the earlier one.
  pub fn register_language_renderer(
    &mut self,
    language: impl Into<String>,
    renderer: impl LanguageRenderer + 'static,
  ) -> &mut Self {
    let language = language.into();
    if self
      .languages
      .insert(language.clone(), Arc::new(renderer))
      .is_some()
    {
      debug!("Language renderer for '{language}' replaced by a later registration");
    } else {
      debug!("Registered language renderer for '{language}'");
    }
    self
  }

  #[must_use]
  pub fn protocol_renderer(&self, protocol: &str) -> Option<&dyn ProtocolRenderer> {
    self.protocols.get(protocol).map(AsRef::as_ref)
  }

  #[must_use]
  pub fn language_renderer(&self, language: &str) -> Option<&dyn LanguageRenderer> {
    self.languages.get(language).map(AsRef::as_ref)
  }

  /// Protocols that have a registered renderer.
  pub fn protocols(&self) -> impl Iterator<Item = &str> {
    self.protocols.keys().map(String::as_str)
  }

  /// Freeze the registry for sharing between render passes.
  #[must_use]
  pub fn into_shared(self) -> Arc<Self> {
    Arc::new(self)
  }
}

impl fmt::Debug for ExtensionRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ExtensionRegistry")
      .field("protocols", &self.protocols.keys().collect::<Vec<_>>())
      .field("languages", &self.languages.keys().collect::<Vec<_>>())
      .finish()
  }
}
