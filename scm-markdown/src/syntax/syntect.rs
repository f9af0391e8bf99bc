//! Syntect-based syntax highlighting backend.
//!
//! Uses the syntax definitions and themes bundled with syntect (Sublime Text
//! grammars).

use std::sync::OnceLock;

use syntect::{
  easy::HighlightLines,
  highlighting::{FontStyle, Style, Theme, ThemeSet},
  parsing::SyntaxSet,
  util::LinesWithEndings,
};

use super::{
  error::{SyntaxError, SyntaxResult},
  types::{
    HighlightedToken,
    SyntaxConfig,
    SyntaxHighlighter,
    SyntaxManager,
    TokenStyle,
  },
};

/// Theme used when none is configured.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Syntect-based syntax highlighter
#[derive(Debug, Clone)]
pub struct SyntectHighlighter {
  theme_name: String,
}

impl SyntectHighlighter {
  /// Create a new Syntect highlighter with the specified theme.
  #[must_use]
  pub fn new(theme_name: Option<String>) -> Self {
    Self {
      theme_name: theme_name.unwrap_or_else(|| DEFAULT_THEME.to_owned()),
    }
  }

  fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
  }

  fn theme_set() -> &'static ThemeSet {
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(ThemeSet::load_defaults)
  }

  /// Look up a theme, falling back to the configured and then the default
  /// theme.
  fn theme(&self, theme_name: Option<&str>) -> SyntaxResult<&'static Theme> {
    let themes = &Self::theme_set().themes;
    let name = theme_name.unwrap_or(&self.theme_name);
    themes
      .get(name)
      .or_else(|| themes.get(&self.theme_name))
      .or_else(|| themes.get(DEFAULT_THEME))
      .ok_or_else(|| SyntaxError::ThemeNotFound(name.to_owned()))
  }
}

impl Default for SyntectHighlighter {
  fn default() -> Self {
    Self::new(None)
  }
}

fn token_style(style: Style) -> TokenStyle {
  let fg = style.foreground;
  TokenStyle {
    foreground: Some((fg.r, fg.g, fg.b)),
    bold:       style.font_style.contains(FontStyle::BOLD),
    italic:     style.font_style.contains(FontStyle::ITALIC),
    underline:  style.font_style.contains(FontStyle::UNDERLINE),
  }
}

impl SyntaxHighlighter for SyntectHighlighter {
  fn name(&self) -> &'static str {
    "Syntect"
  }

  fn supported_languages(&self) -> Vec<String> {
    Self::syntax_set()
      .syntaxes()
      .iter()
      .flat_map(|syntax| {
        std::iter::once(syntax.name.to_lowercase())
          .chain(syntax.file_extensions.iter().map(|ext| ext.to_lowercase()))
      })
      .collect()
  }

  fn available_themes(&self) -> Vec<String> {
    Self::theme_set().themes.keys().cloned().collect()
  }

  fn highlight(
    &self,
    code: &str,
    language: &str,
    theme: Option<&str>,
  ) -> SyntaxResult<Vec<HighlightedToken>> {
    let syntax_set = Self::syntax_set();
    let syntax = syntax_set
      .find_syntax_by_token(language)
      .unwrap_or_else(|| syntax_set.find_syntax_plain_text());
    let mut highlighter = HighlightLines::new(syntax, self.theme(theme)?);

    let mut tokens: Vec<HighlightedToken> = Vec::new();
    for line in LinesWithEndings::from(code) {
      let ranges = highlighter
        .highlight_line(line, syntax_set)
        .map_err(|e| SyntaxError::HighlightingFailed(e.to_string()))?;

      for (style, text) in ranges {
        let style = Some(token_style(style));
        // Adjacent runs with the same style are merged.
        match tokens.last_mut() {
          Some(last) if last.style == style => last.text.push_str(text),
          _ => {
            tokens.push(HighlightedToken {
              text: text.to_owned(),
              style,
            });
          },
        }
      }
    }
    Ok(tokens)
  }
}

/// Create a Syntect-based syntax manager.
///
/// # Errors
///
/// Returns [`SyntaxError::ThemeNotFound`] if `theme` names a theme syntect
/// does not bundle.
pub fn create_syntect_manager(theme: Option<&str>) -> SyntaxResult<SyntaxManager> {
  let highlighter = SyntectHighlighter::new(theme.map(str::to_owned));
  if let Some(theme) = theme
    && !highlighter.has_theme(theme)
  {
    return Err(SyntaxError::ThemeNotFound(theme.to_owned()));
  }

  let config = SyntaxConfig {
    default_theme: Some(theme.unwrap_or(DEFAULT_THEME).to_owned()),
    ..SyntaxConfig::default()
  };
  Ok(SyntaxManager::new(Box::new(highlighter), config))
}
