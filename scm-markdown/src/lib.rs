//! # scm-markdown
//!
//! Renders untrusted markdown from repositories into a safe element tree.
//! Every document goes through the same pipeline: parse into an owned AST,
//! run transform plugins, turn embedded raw HTML into structured nodes,
//! sanitize against an allow-list, then render with per-kind renderers that
//! callers may override.
//!
//! ## Quick Start
//!
//! ```rust
//! use scm_markdown::{Document, ExtensionRegistry, Location, MarkdownView};
//!
//! let mut view = MarkdownView::new(ExtensionRegistry::new().into_shared());
//! let document = Document::builder("# Hello World\n\nThis is **bold** text.")
//!   .base_path("/repo/hitchhiker/heart-of-gold/code/sources/main")
//!   .build();
//!
//! let output = view.render(&document, &Location::new("/"));
//! println!("HTML: {}", output.html);
//! println!("Title: {:?}", output.title);
//! println!("Headers: {:?}", output.headers);
//! ```
//!
//! ## Features
//!
//! - **GFM parsing** with `comrak`, tables, strikethrough and task lists
//!   included
//! - **Shortlinks**: `namespace/name@revision` becomes a changeset link
//! - **Raw HTML** is cleaned with `ammonia`, parsed, and kept only as far as
//!   the sanitizer allows
//! - **Link resolution** against the repository a document lives in
//! - **Extensions** for custom link protocols and code-block languages
//! - **Failure boundary**: a broken document renders a notification instead
//!   of taking down the page
//!
//! ## Extensions
//!
//! ```rust
//! use scm_markdown::{
//!   Document, Element, ExtensionRegistry, Location, MarkdownView,
//!   ProtocolLinkProps, RenderResult, Tag,
//! };
//!
//! let mut extensions = ExtensionRegistry::new();
//! extensions.register_protocol_renderer(
//!   "scw",
//!   |link: &ProtocolLinkProps<'_>, _children: Vec<Element>| -> RenderResult<Element> {
//!     Ok(Tag::new("span").attr("class", "workspace").child(link.value.clone()).into())
//!   },
//! );
//!
//! let mut view = MarkdownView::new(extensions.into_shared());
//! let output = view.render(&Document::builder("[ws](scw:main)").build(), &Location::new("/"));
//! assert!(output.html.contains("workspace"));
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod extensions;
pub mod host;
pub mod names;
pub mod parser;
pub mod paths;
pub mod raw;
pub mod render;
pub mod sanitize;
pub mod syntax;
pub mod transform;
pub mod types;
pub mod utils;
pub mod view;

pub use crate::{
  ast::{Kind, Node, NodeKind},
  config::{ConfigError, MarkdownConfig},
  error::{MarkdownError, MarkdownResult, RenderError, RenderResult, TransformError},
  extensions::{ExtensionRegistry, LanguageRenderer, ProtocolLinkProps, ProtocolRenderer},
  host::{ContainerId, Host, Location},
  parser::{ParseOptions, parse, parse_with},
  render::{Element, RenderContext, Renderer, RendererRegistry, Tag},
  sanitize::{SanitizePolicy, sanitize},
  transform::{Transform, apply_transforms, builtin_transforms},
  types::Header,
  view::{Document, DocumentBuilder, MarkdownView, RenderOutput, Stage, fallback_notification},
};
