//! Allow-list sanitization of the document tree.
//!
//! The default policy mirrors the schema GitHub applies to user markdown:
//! a fixed set of HTML elements, per-element attribute lists and URL
//! protocol lists. Sanitization never fails. Whatever is not allowed is
//! dropped or unwrapped, and sanitizing an already sanitized tree changes
//! nothing.
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::{debug, warn};

use crate::ast::{Kind, Node, NodeKind};

/// Key of the attribute rules that apply to every element.
pub const ANY_TAG: &str = "*";

/// Elements allowed in structured HTML.
const GITHUB_TAGS: &[&str] = &[
  "a", "abbr", "b", "bdo", "blockquote", "br", "caption", "cite", "code",
  "dd", "del", "details", "dfn", "div", "dl", "dt", "em", "figcaption",
  "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "input",
  "ins", "kbd", "li", "mark", "ol", "p", "pre", "q", "rp", "rt", "ruby", "s",
  "samp", "small", "span", "strike", "strong", "sub", "summary", "sup",
  "table", "tbody", "td", "tfoot", "th", "thead", "time", "tr", "tt", "ul",
  "var", "wbr",
];

/// Attributes allowed on every element.
const GITHUB_GLOBAL_ATTRIBUTES: &[&str] = &[
  "abbr", "accept", "accept-charset", "accesskey", "action", "align", "alt",
  "aria-describedby", "aria-hidden", "aria-label", "aria-labelledby", "axis",
  "border", "cellpadding", "cellspacing", "char", "charoff", "charset",
  "checked", "clear", "color", "cols", "colspan", "compact", "coords",
  "datetime", "dir", "disabled", "enctype", "for", "frame", "headers",
  "height", "hreflang", "hspace", "id", "ismap", "itemprop", "label", "lang",
  "maxlength", "media", "method", "multiple", "name", "nohref", "noshade",
  "nowrap", "open", "prompt", "readonly", "rel", "rev", "rows", "rowspan",
  "rules", "scope", "selected", "shape", "size", "span", "start", "summary",
  "tabindex", "target", "title", "type", "usemap", "valign", "value",
  "vspace", "width",
];

const DEFAULT_LINK_PROTOCOLS: &[&str] =
  &["http", "https", "irc", "ircs", "mailto", "xmpp"];

const DEFAULT_IMAGE_PROTOCOLS: &[&str] = &["http", "https"];

/// Elements removed together with their content.
const DEFAULT_STRIP_TAGS: &[&str] = &["script", "style"];

/// A permitted attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeRule {
  /// The attribute with any value.
  Any(String),
  /// The attribute with exactly this value.
  Exact { name: String, value: String },
  /// The attribute when its value starts with `prefix` and has more after
  /// it, per whitespace-separated token.
  Prefix { name: String, prefix: String },
}

impl AttributeRule {
  fn name(&self) -> &str {
    match self {
      Self::Any(name)
      | Self::Exact { name, .. }
      | Self::Prefix { name, .. } => name,
    }
  }

  /// The permitted part of `value`, or `None` when nothing is permitted.
  fn permit(&self, value: &str) -> Option<String> {
    match self {
      Self::Any(_) => Some(value.to_owned()),
      Self::Exact { value: allowed, .. } => {
        (value == allowed).then(|| value.to_owned())
      },
      Self::Prefix { prefix, .. } => {
        let tokens: Vec<&str> = value
          .split_whitespace()
          .filter(|token| {
            token.len() > prefix.len() && token.starts_with(prefix.as_str())
          })
          .collect();
        (!tokens.is_empty()).then(|| tokens.join(" "))
      },
    }
  }
}

/// What survives sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizePolicy {
  /// Node kinds kept in the tree. Others are removed with their subtree.
  pub allowed_kinds:       BTreeSet<Kind>,
  /// Elements kept as such. Others are unwrapped.
  pub allowed_tags:        BTreeSet<String>,
  /// Elements removed with their subtree.
  pub strip_tags:          BTreeSet<String>,
  /// Permitted attributes per element, with [`ANY_TAG`] applying to all.
  pub attributes:          BTreeMap<String, Vec<AttributeRule>>,
  /// Attributes forced onto an element.
  pub required_attributes: BTreeMap<String, Vec<(String, String)>>,
  /// Protocols allowed in `href`.
  pub link_protocols:      BTreeSet<String>,
  /// Protocols allowed in `src`, `longdesc` and `cite`.
  pub image_protocols:     BTreeSet<String>,
}

fn strings(values: &[&str]) -> BTreeSet<String> {
  values.iter().map(|value| (*value).to_owned()).collect()
}

impl Default for SanitizePolicy {
  fn default() -> Self {
    let any = |name: &str| AttributeRule::Any(name.to_owned());
    let exact = |name: &str, value: &str| {
      AttributeRule::Exact {
        name:  name.to_owned(),
        value: value.to_owned(),
      }
    };

    let mut attributes = BTreeMap::new();
    attributes.insert(
      ANY_TAG.to_owned(),
      GITHUB_GLOBAL_ATTRIBUTES.iter().map(|name| any(*name)).collect(),
    );
    attributes.insert("a".to_owned(), vec![any("href")]);
    attributes.insert("img".to_owned(), vec![any("src"), any("longdesc")]);
    attributes.insert("div".to_owned(), vec![any("itemscope"), any("itemtype")]);
    for tag in ["blockquote", "del", "ins", "q"] {
      attributes.insert(tag.to_owned(), vec![any("cite")]);
    }
    attributes.insert("code".to_owned(), vec![AttributeRule::Prefix {
      name:   "class".to_owned(),
      prefix: "language-".to_owned(),
    }]);
    attributes.insert("input".to_owned(), vec![exact("type", "checkbox")]);
    attributes.insert("li".to_owned(), vec![exact("class", "task-list-item")]);
    for tag in ["ol", "ul"] {
      attributes.insert(tag.to_owned(), vec![exact("class", "contains-task-list")]);
    }

    let mut required_attributes = BTreeMap::new();
    required_attributes.insert("input".to_owned(), vec![
      ("type".to_owned(), "checkbox".to_owned()),
      ("disabled".to_owned(), String::new()),
    ]);

    Self {
      allowed_kinds: Kind::ALL
        .into_iter()
        .filter(|kind| !matches!(kind, Kind::RawHtml | Kind::Unknown))
        .collect(),
      allowed_tags: strings(GITHUB_TAGS),
      strip_tags: strings(DEFAULT_STRIP_TAGS),
      attributes,
      required_attributes,
      link_protocols: strings(DEFAULT_LINK_PROTOCOLS),
      image_protocols: strings(DEFAULT_IMAGE_PROTOCOLS),
    }
  }
}

impl SanitizePolicy {
  /// Additionally allow `protocols` in link and image URLs.
  #[must_use]
  pub fn with_protocols<I, S>(mut self, protocols: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    for protocol in protocols {
      let protocol = protocol.as_ref().to_lowercase();
      self.link_protocols.insert(protocol.clone());
      self.image_protocols.insert(protocol);
    }
    self
  }

  /// An HTML cleaner enforcing the tag, attribute and protocol lists.
  ///
  /// Raw HTML runs through it before being structured, so that markup the
  /// tree filter would drop never becomes a node in the first place.
  #[must_use]
  pub fn html_cleaner(&self) -> ammonia::Builder<'_> {
    let tags: HashSet<&str> =
      self.allowed_tags.iter().map(String::as_str).collect();
    // ammonia rejects tags that are both kept and cleaned with content.
    let clean_content_tags: HashSet<&str> = self
      .strip_tags
      .iter()
      .map(String::as_str)
      .filter(|tag| !tags.contains(tag))
      .collect();
    let generic_attributes: HashSet<&str> = self
      .attributes
      .get(ANY_TAG)
      .into_iter()
      .flatten()
      .map(AttributeRule::name)
      .collect();
    let tag_attributes: HashMap<&str, HashSet<&str>> = self
      .attributes
      .iter()
      .filter(|(tag, _)| tag.as_str() != ANY_TAG)
      .map(|(tag, rules)| {
        (tag.as_str(), rules.iter().map(AttributeRule::name).collect())
      })
      .collect();
    let url_schemes: HashSet<&str> = self
      .link_protocols
      .iter()
      .chain(&self.image_protocols)
      .map(String::as_str)
      .collect();

    let mut cleaner = ammonia::Builder::empty();
    cleaner
      .tags(tags)
      .clean_content_tags(clean_content_tags)
      .generic_attributes(generic_attributes)
      .tag_attributes(tag_attributes)
      .url_schemes(url_schemes)
      .url_relative(ammonia::UrlRelative::PassThrough)
      .link_rel(None)
      .strip_comments(true);
    cleaner
  }

  /// Whether `url` may appear in an attribute checked against `protocols`.
  fn url_allowed(url: &str, protocols: &BTreeSet<String>) -> bool {
    let Some(colon) = url.find(':') else {
      return true;
    };
    if url[..colon].contains(['/', '?', '#']) {
      return true;
    }
    protocols.contains(&url[..colon].to_lowercase())
  }

  #[must_use]
  pub fn link_allowed(&self, url: &str) -> bool {
    Self::url_allowed(url, &self.link_protocols)
  }

  #[must_use]
  pub fn image_allowed(&self, url: &str) -> bool {
    Self::url_allowed(url, &self.image_protocols)
  }

  /// Filter an element's attributes, then add the required ones.
  fn filter_attributes(
    &self,
    tag: &str,
    attributes: Vec<(String, String)>,
  ) -> Vec<(String, String)> {
    let rules: Vec<&AttributeRule> = [tag, ANY_TAG]
      .into_iter()
      .filter_map(|key| self.attributes.get(key))
      .flatten()
      .collect();

    let mut kept: Vec<(String, String)> = attributes
      .into_iter()
      .filter_map(|(name, value)| {
        let value = rules
          .iter()
          .filter(|rule| rule.name() == name)
          .find_map(|rule| rule.permit(&value))?;
        let url_ok = match name.as_str() {
          "href" => self.link_allowed(&value),
          "src" | "longdesc" | "cite" => self.image_allowed(&value),
          _ => true,
        };
        if url_ok {
          Some((name, value))
        } else {
          warn!("Removing {name} attribute with disallowed protocol from <{tag}>");
          None
        }
      })
      .collect();

    for (name, value) in self.required_attributes.get(tag).into_iter().flatten() {
      if let Some(existing) = kept.iter_mut().find(|(n, _)| n == name) {
        existing.1.clone_from(value);
      } else {
        kept.push((name.clone(), value.clone()));
      }
    }
    kept
  }
}

/// Sanitize a tree against `policy`.
///
/// The root itself is always kept.
#[must_use]
pub fn sanitize(tree: Node, policy: &SanitizePolicy) -> Node {
  Node::new(tree.kind, sanitize_children(tree.children, policy))
}

fn sanitize_children(children: Vec<Node>, policy: &SanitizePolicy) -> Vec<Node> {
  children
    .into_iter()
    .flat_map(|child| sanitize_node(child, policy))
    .collect()
}

/// Sanitize one node into zero or more replacement nodes.
fn sanitize_node(node: Node, policy: &SanitizePolicy) -> Vec<Node> {
  let kind = node.kind();
  if !policy.allowed_kinds.contains(&kind) {
    debug!("Dropping {kind} node");
    return Vec::new();
  }

  let Node { kind, children } = node;
  match kind {
    NodeKind::Link { url, .. } if !policy.link_allowed(&url) => {
      warn!("Unwrapping link with disallowed protocol");
      sanitize_children(children, policy)
    },
    NodeKind::Image { src, .. } if !policy.image_allowed(&src) => {
      warn!("Dropping image with disallowed protocol");
      Vec::new()
    },
    NodeKind::Element { tag, .. } if policy.strip_tags.contains(&tag) => {
      debug!("Dropping <{tag}> with its content");
      Vec::new()
    },
    NodeKind::Element { tag, .. } if !policy.allowed_tags.contains(&tag) => {
      debug!("Unwrapping disallowed <{tag}>");
      sanitize_children(children, policy)
    },
    NodeKind::Element { tag, attributes } => {
      let attributes = policy.filter_attributes(&tag, attributes);
      vec![Node::new(
        NodeKind::Element { tag, attributes },
        sanitize_children(children, policy),
      )]
    },
    kind => vec![Node::new(kind, sanitize_children(children, policy))],
  }
}
