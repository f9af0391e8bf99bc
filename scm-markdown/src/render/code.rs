use log::{trace, warn};

use super::{Element, RenderContext, Tag};
use crate::{
  ast::{Node, NodeKind},
  error::RenderResult,
  syntax::HighlightedToken,
};

/// Render a code block.
///
/// A language extension registered for the block's exact language takes
/// over. Otherwise the block is syntax highlighted when a highlighter is
/// available, and shown as plain text when it is not or highlighting fails.
///
/// # Errors
///
/// Propagates the error of a language extension.
pub fn render_code(
  node: &Node,
  _: Vec<Element>,
  ctx: &RenderContext<'_>,
) -> RenderResult<Element> {
  let NodeKind::Code { lang, value } = &node.kind else {
    return Ok(Element::Empty);
  };
  let language = lang.as_deref();

  if let Some(language) = language
    && let Some(renderer) = ctx.extensions.language_renderer(language)
  {
    trace!("Rendering '{language}' code block through its extension");
    return renderer.render(language, value);
  }

  let code = Tag::new("code").attr_opt(
    "class",
    language.map(|language| format!("language-{language}")),
  );

  if let (Some(language), Some(syntax)) = (language, ctx.syntax) {
    match syntax.highlight_code(value, language, None) {
      Ok(tokens) => {
        return Ok(
          Tag::new("pre")
            .attr("class", "highlight")
            .child(code.children(tokens.into_iter().map(token_element)))
            .into(),
        );
      },
      Err(e) => {
        warn!("Highlighting '{language}' code block failed, showing plain text: {e}");
      },
    }
  }

  Ok(Tag::new("pre").child(code.child(value.as_str())).into())
}

fn token_element(token: HighlightedToken) -> Element {
  match token.style.and_then(|style| style.to_css()) {
    Some(css) => Tag::new("span").attr("style", css).child(token.text).into(),
    None => Element::Text(token.text),
  }
}
