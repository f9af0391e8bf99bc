//! Classification and resolution of link and image targets.
//!
//! Everything here is a pure function over strings. Relative targets are
//! resolved against a base path (where the rendered document's repository
//! tree is mounted in the application) and the current path (the location
//! of the page showing the document).
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::Regex;

use crate::utils::never_matching_regex;

/// Prefix of application-internal resource paths.
pub const INTERNAL_PREFIX: &str = "/repo/";

/// Placeholder for the revision in a content URL template.
pub const REVISION_PLACEHOLDER: &str = "{revision}";

/// Placeholder for the file path in a content URL template.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Characters escaped like JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b'-')
  .remove(b'_')
  .remove(b'.')
  .remove(b'!')
  .remove(b'~')
  .remove(b'*')
  .remove(b'\'')
  .remove(b'(')
  .remove(b')');

static EXTERNAL_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^https?://").unwrap_or_else(|e| {
    log::error!("Failed to compile EXTERNAL_RE regex: {e}");
    never_matching_regex()
  })
});

static PROTOCOL_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^([a-z]+):(.+)").unwrap_or_else(|e| {
    log::error!("Failed to compile PROTOCOL_RE regex: {e}");
    never_matching_regex()
  })
});

/// A link with a non-http protocol, split at the first colon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolLink<'a> {
  pub protocol: &'a str,
  /// Everything after `<protocol>:`, still encoded.
  pub rest:     &'a str,
}

impl ProtocolLink<'_> {
  /// The remainder with percent-escapes decoded.
  #[must_use]
  pub fn decoded_rest(&self) -> String {
    decode(self.rest)
  }
}

/// How a link target is treated, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget<'a> {
  /// `#fragment` on the same page.
  Anchor,
  /// Absolute `http(s)://` URL.
  External,
  /// Any other `<protocol>:<rest>` target.
  Protocol(ProtocolLink<'a>),
  /// Application resource path, used unchanged.
  Internal,
  /// Relative to the document.
  Relative,
}

/// Classify a link target.
#[must_use]
pub fn classify(link: &str) -> LinkTarget<'_> {
  if is_anchor(link) {
    LinkTarget::Anchor
  } else if is_external(link) {
    LinkTarget::External
  } else if let Some(protocol) = is_foreign_protocol(link) {
    LinkTarget::Protocol(protocol)
  } else if is_internal(link) {
    LinkTarget::Internal
  } else {
    LinkTarget::Relative
  }
}

#[must_use]
pub fn is_external(link: &str) -> bool {
  EXTERNAL_RE.is_match(link)
}

#[must_use]
pub fn is_anchor(link: &str) -> bool {
  link.starts_with('#')
}

/// Split a `<protocol>:<rest>` link, unless the protocol is http(s).
#[must_use]
pub fn is_foreign_protocol(link: &str) -> Option<ProtocolLink<'_>> {
  let caps = PROTOCOL_RE.captures(link)?;
  let protocol = caps.get(1)?.as_str();
  if protocol == "http" || protocol == "https" {
    return None;
  }
  Some(ProtocolLink {
    protocol,
    rest: caps.get(2)?.as_str(),
  })
}

#[must_use]
pub fn is_absolute(link: &str) -> bool {
  link.starts_with('/')
}

#[must_use]
pub fn is_internal(link: &str) -> bool {
  link.starts_with(INTERNAL_PREFIX)
}

#[must_use]
pub fn is_sub_path_of(base: &str, current: &str) -> bool {
  current.starts_with(base)
}

/// Join two path fragments with exactly one separating slash.
///
/// An empty right-hand side yields the left-hand side without trailing
/// slashes, or `/` when nothing is left.
#[must_use]
pub fn join_path(left: &str, right: &str) -> String {
  let left = left.trim_end_matches('/');
  let right = right.trim_start_matches('/');
  if right.is_empty() {
    if left.is_empty() {
      return "/".to_owned();
    }
    return left.to_owned();
  }
  format!("{left}/{right}")
}

/// Resolve `.` and `..` segments.
///
/// `..` at the top is dropped rather than climbing above the start of the
/// path. Empty segments are removed; the result has no leading slash and
/// keeps a trailing one if the input had it.
#[must_use]
pub fn normalize_path(path: &str) -> String {
  let mut stack: Vec<&str> = Vec::new();
  for segment in path.split('/') {
    match segment {
      "" | "." => {},
      ".." => {
        stack.pop();
      },
      other => stack.push(other),
    }
  }

  let mut normalized = stack.join("/");
  if path.ends_with('/') && !normalized.is_empty() {
    normalized.push('/');
  }
  normalized
}

/// Path of `link` inside the repository tree mounted at `base`, seen from the
/// page at `current`.
///
/// Absolute links are taken as they are. When `current` lies outside `base`
/// there is no directory to be relative to and the link is returned as-is,
/// to be joined onto the base.
#[must_use]
pub fn repository_path(base: &str, current: &str, link: &str) -> String {
  if is_absolute(link) || !is_sub_path_of(base, current) {
    return link.to_owned();
  }

  let relative = &current[base.len()..];
  let directory = if relative.ends_with('/') {
    relative.trim_end_matches('/')
  } else {
    relative.rfind('/').map_or("", |slash| &relative[..slash])
  };

  format!("/{}", normalize_path(&join_path(directory, link)))
}

/// Resolve a link relative to the document into an application path.
#[must_use]
pub fn resolve_relative_link(base: &str, current: &str, link: &str) -> String {
  join_path(base, &repository_path(base, current, link))
}

/// Resolve an image target into a URL that fetches its raw content.
///
/// External, foreign-protocol and internal targets are returned unchanged.
/// Anything else is resolved like a link and substituted into
/// `content_template`, with the revision URL-encoded.
#[must_use]
pub fn resolve_relative_image(
  base: &str,
  content_template: &str,
  revision: &str,
  current: &str,
  link: &str,
) -> String {
  match classify(link) {
    LinkTarget::External
    | LinkTarget::Protocol(_)
    | LinkTarget::Internal
    | LinkTarget::Anchor => link.to_owned(),
    LinkTarget::Relative => {
      let path = repository_path(base, current, link);
      content_template
        .replace(REVISION_PLACEHOLDER, &encode_component(revision))
        .replace(PATH_PLACEHOLDER, path.trim_start_matches('/'))
    },
  }
}

/// Percent-encode a URL component, `encodeURIComponent` style.
#[must_use]
pub fn encode_component(value: &str) -> String {
  utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Decode a URL fragment into the element id it names.
///
/// A leading `#` is removed.
#[must_use]
pub fn decode_fragment(fragment: &str) -> String {
  decode(fragment.strip_prefix('#').unwrap_or(fragment))
}

/// Percent-decode a URL part, replacing invalid UTF-8.
#[must_use]
pub fn decode(value: &str) -> String {
  percent_decode_str(value).decode_utf8_lossy().into_owned()
}
