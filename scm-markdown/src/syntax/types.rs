//! Core types and traits for syntax highlighting.

use std::collections::HashMap;

use super::error::{SyntaxError, SyntaxResult};

/// Colour and font attributes of a highlighted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenStyle {
  /// Foreground colour as `(r, g, b)`.
  pub foreground: Option<(u8, u8, u8)>,
  pub bold:       bool,
  pub italic:     bool,
  pub underline:  bool,
}

impl TokenStyle {
  /// Inline CSS for this style, or `None` when it carries nothing.
  #[must_use]
  pub fn to_css(&self) -> Option<String> {
    let mut rules = Vec::new();
    if let Some((r, g, b)) = self.foreground {
      rules.push(format!("color:#{r:02x}{g:02x}{b:02x}"));
    }
    if self.bold {
      rules.push("font-weight:bold".to_owned());
    }
    if self.italic {
      rules.push("font-style:italic".to_owned());
    }
    if self.underline {
      rules.push("text-decoration:underline".to_owned());
    }
    (!rules.is_empty()).then(|| rules.join(";"))
  }
}

/// A run of source text with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightedToken {
  pub text:  String,
  pub style: Option<TokenStyle>,
}

/// Trait for syntax highlighting backends.
///
/// Backends return styled tokens rather than markup, so that the caller
/// decides how they are turned into output elements.
pub trait SyntaxHighlighter: Send + Sync {
  /// Get the name of this highlighter backend
  fn name(&self) -> &'static str;

  /// Get a list of supported languages
  fn supported_languages(&self) -> Vec<String>;

  /// Get a list of available themes
  fn available_themes(&self) -> Vec<String>;

  /// Check if a language is supported
  fn supports_language(&self, language: &str) -> bool {
    self
      .supported_languages()
      .iter()
      .any(|lang| lang.eq_ignore_ascii_case(language))
  }

  /// Check if a theme is available
  fn has_theme(&self, theme: &str) -> bool {
    self
      .available_themes()
      .iter()
      .any(|t| t.eq_ignore_ascii_case(theme))
  }

  /// Highlight code with the specified language and theme.
  ///
  /// # Errors
  ///
  /// Returns an error if the backend fails on the input.
  fn highlight(
    &self,
    code: &str,
    language: &str,
    theme: Option<&str>,
  ) -> SyntaxResult<Vec<HighlightedToken>>;
}

/// Configuration for syntax highlighting
#[derive(Debug, Clone)]
pub struct SyntaxConfig {
  /// Default theme to use when none is specified
  pub default_theme: Option<String>,

  /// Language aliases for mapping common names to supported languages
  pub language_aliases: HashMap<String, String>,

  /// Whether to fall back to plain text for unsupported languages
  pub fallback_to_plain: bool,
}

impl Default for SyntaxConfig {
  fn default() -> Self {
    let language_aliases = [
      ("js", "javascript"),
      ("ts", "typescript"),
      ("py", "python"),
      ("rb", "ruby"),
      ("sh", "bash"),
      ("shell", "bash"),
      ("yml", "yaml"),
      ("md", "markdown"),
      ("kt", "kotlin"),
      ("golang", "go"),
    ]
    .into_iter()
    .map(|(alias, language)| (alias.to_owned(), language.to_owned()))
    .collect();

    Self {
      default_theme: None,
      language_aliases,
      fallback_to_plain: true,
    }
  }
}

/// High-level syntax highlighting manager.
///
/// Wraps a backend with alias resolution and plain-text fallback.
pub struct SyntaxManager {
  highlighter: Box<dyn SyntaxHighlighter>,
  config:      SyntaxConfig,
}

impl std::fmt::Debug for SyntaxManager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SyntaxManager")
      .field("highlighter", &self.highlighter.name())
      .field("config", &self.config)
      .finish()
  }
}

impl SyntaxManager {
  /// Create a new syntax manager with the given highlighter and config
  #[must_use]
  pub fn new(
    highlighter: Box<dyn SyntaxHighlighter>,
    config: SyntaxConfig,
  ) -> Self {
    Self {
      highlighter,
      config,
    }
  }

  /// Create a new syntax manager with the default configuration
  #[must_use]
  pub fn with_highlighter(highlighter: Box<dyn SyntaxHighlighter>) -> Self {
    Self::new(highlighter, SyntaxConfig::default())
  }

  #[must_use]
  pub fn highlighter(&self) -> &dyn SyntaxHighlighter {
    self.highlighter.as_ref()
  }

  #[must_use]
  pub const fn config(&self) -> &SyntaxConfig {
    &self.config
  }

  pub fn set_config(&mut self, config: SyntaxConfig) {
    self.config = config;
  }

  /// Resolve a language name using aliases
  #[must_use]
  pub fn resolve_language(&self, language: &str) -> String {
    let lowered = language.to_lowercase();
    self
      .config
      .language_aliases
      .get(&lowered)
      .cloned()
      .unwrap_or(lowered)
  }

  /// Highlight code with automatic language resolution and fallback.
  ///
  /// # Errors
  ///
  /// Returns [`SyntaxError::UnsupportedLanguage`] when neither the language
  /// nor a plain-text fallback is available, or the backend's error.
  pub fn highlight_code(
    &self,
    code: &str,
    language: &str,
    theme: Option<&str>,
  ) -> SyntaxResult<Vec<HighlightedToken>> {
    let resolved_language = self.resolve_language(language);
    let theme = theme.or(self.config.default_theme.as_deref());

    if self.highlighter.supports_language(&resolved_language) {
      return self.highlighter.highlight(code, &resolved_language, theme);
    }

    if self.config.fallback_to_plain {
      for plain in ["plain text", "text", "txt"] {
        if self.highlighter.supports_language(plain) {
          return self.highlighter.highlight(code, plain, theme);
        }
      }
    }

    Err(SyntaxError::UnsupportedLanguage(resolved_language))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Uppercase;

  impl SyntaxHighlighter for Uppercase {
    fn name(&self) -> &'static str {
      "Uppercase"
    }

    fn supported_languages(&self) -> Vec<String> {
      vec!["shout".to_owned(), "text".to_owned()]
    }

    fn available_themes(&self) -> Vec<String> {
      vec!["loud".to_owned()]
    }

    fn highlight(
      &self,
      code: &str,
      language: &str,
      _theme: Option<&str>,
    ) -> SyntaxResult<Vec<HighlightedToken>> {
      let text = if language == "shout" {
        code.to_uppercase()
      } else {
        code.to_owned()
      };
      Ok(vec![HighlightedToken { text, style: None }])
    }
  }

  #[test]
  fn test_syntax_config_default() {
    let config = SyntaxConfig::default();
    assert!(config.fallback_to_plain);
    assert_eq!(config.language_aliases["js"], "javascript");
  }

  #[test]
  fn test_resolve_language_is_case_insensitive() {
    let manager = SyntaxManager::with_highlighter(Box::new(Uppercase));
    assert_eq!(manager.resolve_language("JS"), "javascript");
    assert_eq!(manager.resolve_language("Rust"), "rust");
  }

  #[test]
  fn test_fallback_to_plain() {
    let manager = SyntaxManager::with_highlighter(Box::new(Uppercase));
    let tokens = manager
      .highlight_code("hi", "klingon", None)
      .expect("falls back to text");
    assert_eq!(tokens[0].text, "hi");

    let tokens = manager
      .highlight_code("hi", "SHOUT", None)
      .expect("highlights");
    assert_eq!(tokens[0].text, "HI");
  }

  #[test]
  fn test_no_fallback_is_an_error() {
    let config = SyntaxConfig {
      fallback_to_plain: false,
      ..SyntaxConfig::default()
    };
    let manager = SyntaxManager::new(Box::new(Uppercase), config);
    assert!(matches!(
      manager.highlight_code("hi", "klingon", None),
      Err(SyntaxError::UnsupportedLanguage(lang)) if lang == "klingon"
    ));
  }

  #[test]
  fn test_token_style_css() {
    let style = TokenStyle {
      foreground: Some((0x12, 0xab, 0x00)),
      bold:       true,
      ..TokenStyle::default()
    };
    assert_eq!(
      style.to_css().as_deref(),
      Some("color:#12ab00;font-weight:bold")
    );
    assert_eq!(TokenStyle::default().to_css(), None);
  }
}
