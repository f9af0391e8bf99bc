//! Error types for the rendering pipeline.
use thiserror::Error;

use crate::ast::Kind;

/// Result type for a whole render pass.
pub type MarkdownResult<T> = Result<T, MarkdownError>;

/// Result type for a single renderer invocation.
pub type RenderResult<T> = Result<T, RenderError>;

/// Failure of a render pass.
///
/// Any of these is caught by the document boundary and replaced with the
/// fallback notification.
#[derive(Debug, Error)]
pub enum MarkdownError {
  #[error("Transform '{plugin}' failed: {source}")]
  Transform {
    plugin: String,
    #[source]
    source: TransformError,
  },

  #[error("Rendering {kind} node failed: {source}")]
  Render {
    kind:   Kind,
    #[source]
    source: RenderError,
  },

  #[error("Markdown pipeline panicked: {0}")]
  Panic(String),
}

/// Error raised by a transform plugin.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransformError {
  message: String,
}

impl TransformError {
  #[must_use]
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }

  #[must_use]
  pub fn message(&self) -> &str {
    &self.message
  }
}

/// Error raised by a renderer, built-in or extension-supplied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
  #[error("{0}")]
  Message(String),
}

impl RenderError {
  #[must_use]
  pub fn new(message: impl Into<String>) -> Self {
    Self::Message(message.into())
  }
}
