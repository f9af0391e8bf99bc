//! The page a document is shown on.
//!
//! Navigation, clipboard and scrolling belong to whatever embeds the rendered
//! document. The view only asks for them through [`Host`].
use crate::paths::decode_fragment;

/// Side effects the embedding page performs on behalf of a view.
pub trait Host {
  /// Scheme, host and port of the page, e.g. `https://scm.example.com`.
  fn origin(&self) -> String;

  fn copy_to_clipboard(&mut self, text: &str);

  /// Set the location fragment without adding a history entry.
  fn replace_fragment(&mut self, fragment: &str);

  /// Scroll the element with this id into view.
  fn scroll_into_view(&mut self, id: &str);
}

/// The page location a document is rendered at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
  pub pathname: String,
  /// Fragment including the leading `#`, as the browser reports it.
  pub hash:     Option<String>,
}

impl Location {
  #[must_use]
  pub fn new(pathname: impl Into<String>) -> Self {
    Self {
      pathname: pathname.into(),
      hash:     None,
    }
  }

  #[must_use]
  pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
    self.hash = Some(hash.into());
    self
  }

  /// The decoded fragment, if there is a non-empty one.
  #[must_use]
  pub fn fragment(&self) -> Option<String> {
    self
      .hash
      .as_deref()
      .map(decode_fragment)
      .filter(|fragment| !fragment.is_empty())
  }
}

/// Identity of the mounted element a document was committed into.
///
/// Hosts hand out a new id whenever they mount a new container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(pub u64);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fragment_is_decoded() {
    let location = Location::new("/repo/ns/name").with_hash("#getting%20started");
    assert_eq!(location.fragment().as_deref(), Some("getting started"));
  }

  #[test]
  fn test_empty_fragment_is_none() {
    assert_eq!(Location::new("/").with_hash("#").fragment(), None);
    assert_eq!(Location::new("/").fragment(), None);
  }
}
