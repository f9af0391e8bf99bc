//! Types shared by the public API.
use serde::{Deserialize, Serialize};

/// A heading of a rendered document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Header {
  /// Heading text without markup.
  pub text:  String,
  /// Heading level (1-6).
  pub level: u8,
  /// Anchor id derived from the text.
  pub id:    String,
}
