//! Trait-based syntax highlighting for fenced code blocks.
//!
//! The only bundled backend is **Syntect**, behind the `syntect` feature.
//! Other backends can be plugged in through [`SyntaxHighlighter`].

pub mod error;
pub mod types;

pub use error::{SyntaxError, SyntaxResult};
pub use types::{
  HighlightedToken,
  SyntaxConfig,
  SyntaxHighlighter,
  SyntaxManager,
  TokenStyle,
};

#[cfg(feature = "syntect")] mod syntect;
#[cfg(feature = "syntect")] pub use syntect::*;

/// Create the default syntax manager based on available features.
///
/// # Errors
///
/// Returns an error if no backend is compiled in or the theme is unknown.
pub fn create_default_manager(theme: Option<&str>) -> SyntaxResult<SyntaxManager> {
  #[cfg(feature = "syntect")]
  {
    create_syntect_manager(theme)
  }

  #[cfg(not(feature = "syntect"))]
  {
    let _ = theme;
    Err(SyntaxError::NoBackendAvailable)
  }
}
