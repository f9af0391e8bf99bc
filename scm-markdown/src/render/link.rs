//! Link and image renderers.
use log::trace;

use super::{Element, RenderContext, Tag};
use crate::{
  ast::{Node, NodeKind},
  error::RenderResult,
  extensions::ProtocolLinkProps,
  paths::{self, LinkTarget},
};

/// Render a link according to what its target points at.
///
/// # Errors
///
/// Propagates the error of a protocol extension.
pub fn render_link(
  node: &Node,
  children: Vec<Element>,
  ctx: &RenderContext<'_>,
) -> RenderResult<Element> {
  let NodeKind::Link { url, title } = &node.kind else {
    return Ok(Element::Fragment(children));
  };

  let tag = match paths::classify(url) {
    LinkTarget::Anchor => Tag::new("a").attr("href", url.as_str()),
    LinkTarget::External => {
      Tag::new("a")
        .attr("href", url.as_str())
        .attr("target", "_blank")
        .attr("rel", "noopener noreferrer")
    },
    LinkTarget::Protocol(link) => {
      if let Some(renderer) = ctx.extensions.protocol_renderer(link.protocol) {
        trace!("Rendering '{}' link through its extension", link.protocol);
        let props = ProtocolLinkProps {
          protocol: link.protocol,
          value:    link.decoded_rest(),
          href:     url,
        };
        return renderer.render(&props, children);
      }
      Tag::new("a").attr("href", url.as_str())
    },
    LinkTarget::Internal => {
      Tag::new("a")
        .attr("href", url.as_str())
        .attr("data-navigate", url.as_str())
    },
    LinkTarget::Relative => {
      match ctx.base_path {
        Some(base) => {
          let resolved =
            paths::resolve_relative_link(base, ctx.current_path, url);
          Tag::new("a")
            .attr("href", resolved.as_str())
            .attr("data-navigate", resolved)
        },
        None => Tag::new("a").attr("href", url.as_str()),
      }
    },
  };

  Ok(tag.attr_opt("title", title.as_deref()).children(children).into())
}

/// Render an image, pointing relative sources at the raw file content.
///
/// Without a content template and revision, relative sources are resolved
/// like links; without a base path they are left as written.
///
/// # Errors
///
/// Never fails; the signature matches the other renderers.
pub fn render_image(
  node: &Node,
  _: Vec<Element>,
  ctx: &RenderContext<'_>,
) -> RenderResult<Element> {
  let NodeKind::Image { src, alt, title } = &node.kind else {
    return Ok(Element::Empty);
  };

  let resolved = match (ctx.base_path, ctx.content_template, ctx.revision) {
    (Some(base), Some(template), Some(revision)) => {
      paths::resolve_relative_image(
        base,
        template,
        revision,
        ctx.current_path,
        src,
      )
    },
    (Some(base), ..) if paths::classify(src) == LinkTarget::Relative => {
      paths::resolve_relative_link(base, ctx.current_path, src)
    },
    _ => src.clone(),
  };

  Ok(
    Tag::new("img")
      .attr("src", resolved)
      .attr("alt", alt.as_str())
      .attr_opt("title", title.as_deref())
      .into(),
  )
}
