use super::{Element, RenderContext, Tag};
use crate::{
  ast::{Node, NodeKind},
  error::RenderResult,
  utils::heading_anchor_id,
};

/// Class of the self link wrapping an anchored heading's content.
pub const ANCHOR_LINK_CLASS: &str = "anchor-link";

/// Class of the copy-permalink button next to an anchored heading.
pub const ANCHOR_COPY_CLASS: &str = "anchor-copy";

/// Render a heading, with an anchor when anchor headings are enabled and the
/// document has a permalink.
///
/// An anchored heading carries its derived id, wraps its content in a link to
/// `<permalink>#<id>` and is followed by a copy button whose `data-anchor`
/// the host hands to
/// [`MarkdownView::copy_permalink`](crate::view::MarkdownView::copy_permalink).
///
/// # Errors
///
/// Never fails; the signature matches the other renderers.
pub fn render_heading(
  node: &Node,
  children: Vec<Element>,
  ctx: &RenderContext<'_>,
) -> RenderResult<Element> {
  let NodeKind::Heading { level } = node.kind else {
    return Ok(Element::Fragment(children));
  };
  let tag = Tag::new(format!("h{}", level.clamp(1, 6)));

  let permalink = match ctx.permalink {
    Some(permalink) if ctx.enable_anchor_headings => permalink,
    _ => return Ok(tag.children(children).into()),
  };

  let id = heading_anchor_id(node);
  let self_link = Tag::new("a")
    .attr("href", format!("{permalink}#{id}"))
    .attr("class", ANCHOR_LINK_CLASS)
    .children(children);
  let copy = Tag::new("button")
    .attr("type", "button")
    .attr("class", ANCHOR_COPY_CLASS)
    .attr("title", "Copy permalink")
    .attr("data-anchor", id.as_str())
    .attr("data-permalink", permalink);

  Ok(tag.attr("id", id).child(self_link).child(copy).into())
}
