#![allow(clippy::expect_used, clippy::panic, reason = "Fine in tests")]
use scm_markdown::{Document, ExtensionRegistry, Location, MarkdownView};

fn render(document: &Document) -> String {
  let mut view =
    MarkdownView::new(ExtensionRegistry::new().into_shared()).with_syntax(None);
  view.render(document, &Location::new("/")).html.clone()
}

#[test]
fn test_script_is_removed() {
  let html = render(
    &Document::builder("before\n\n<script>alert('pwned')</script>\n\nafter").build(),
  );
  assert!(!html.contains("script"), "{html}");
  assert!(!html.contains("pwned"), "{html}");
  assert!(html.contains("<p>before</p>"));
  assert!(html.contains("<p>after</p>"));
}

#[test]
fn test_event_handlers_are_stripped() {
  let html = render(
    &Document::builder("<div title=\"tip\" onmouseover=\"alert(1)\">hover me</div>\n")
      .build(),
  );
  assert!(!html.contains("onmouseover"), "{html}");
  assert!(!html.contains("alert"), "{html}");
  assert!(html.contains("hover me"));
  assert!(html.contains("title=\"tip\""));
}

#[test]
fn test_javascript_href_in_raw_html_is_removed() {
  let html = render(
    &Document::builder("<a href=\"javascript:alert(1)\">click</a>\n").build(),
  );
  assert!(!html.contains("javascript"), "{html}");
  assert!(html.contains("click"));
}

#[test]
fn test_skip_html_drops_markup() {
  let html = render(
    &Document::builder("text <b>bold</b>\n\n<details><summary>s</summary>d</details>\n")
      .skip_html(true)
      .build(),
  );
  assert!(!html.contains("<b>"), "{html}");
  assert!(!html.contains("details"), "{html}");
  assert!(html.contains("text "));
}

#[test]
fn test_allowed_markup_is_kept() {
  let html = render(
    &Document::builder(
      "<details>\n<summary>More</summary>\n\nHidden *text*\n\n</details>\n",
    )
    .build(),
  );
  assert!(html.contains("<details>"), "{html}");
  assert!(html.contains("<summary>More</summary>"), "{html}");
}

#[test]
fn test_inline_html_keeps_surrounding_text() {
  let html = render(&Document::builder("H<sub>2</sub>O is <kbd>wet</kbd>").build());
  assert_eq!(html, "<p>H<sub>2</sub>O is <kbd>wet</kbd></p>");
}

#[test]
fn test_raw_html_never_widens_protocols() {
  let html = render(
    &Document::builder("<img src=\"data:image/png;base64,AAAA\" alt=\"x\">\n").build(),
  );
  assert!(!html.contains("data:"), "{html}");
}
