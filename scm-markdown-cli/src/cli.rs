use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

/// Command line interface for scm-markdown
#[derive(Parser, Debug)]
#[command(author, version, about = "Render repository markdown to sanitized HTML")]
pub struct Cli {
  /// Markdown file to render. Reads standard input when omitted or `-`.
  pub input: Option<PathBuf>,

  #[command(flatten)]
  pub verbose: Verbosity<InfoLevel>,

  /// Path to a configuration file (TOML or JSON)
  #[arg(short = 'c', long = "config-file")]
  pub config_file: Option<PathBuf>,

  /// Override configuration values (KEY=VALUE format, can be used multiple
  /// times)
  #[arg(long = "config", action = clap::ArgAction::Append)]
  pub config_overrides: Vec<String>,

  /// Where the document's repository tree is mounted, e.g.
  /// `/repo/hitchhiker/heart-of-gold/code/sources/main`
  #[arg(short, long)]
  pub base_path: Option<String>,

  /// Path of the page showing the document. Relative links resolve against
  /// it.
  #[arg(long, default_value = "/")]
  pub current_path: String,

  /// Stable URL of the document, used for heading anchors
  #[arg(short, long)]
  pub permalink: Option<String>,

  /// Revision the document was loaded at
  #[arg(short, long)]
  pub revision: Option<String>,

  /// Raw content URL template with `{revision}` and `{path}` placeholders
  #[arg(long)]
  pub content_template: Option<String>,

  /// Drop all raw HTML instead of keeping the allowed parts
  #[arg(long)]
  pub skip_html: bool,

  /// Give headings anchor links and copy-permalink buttons
  #[arg(long)]
  pub anchor_headings: bool,

  /// Output format.
  #[arg(short = 'F', long, default_value = "html", value_parser = ["html", "json"])]
  pub format: String,
}

impl Cli {
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }

  /// Whether the markdown comes from standard input.
  #[must_use]
  pub fn reads_stdin(&self) -> bool {
    self
      .input
      .as_ref()
      .is_none_or(|path| path.as_os_str() == "-")
  }
}
