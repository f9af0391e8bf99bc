use std::{
  fs,
  io::{self, Read},
};

use color_eyre::eyre::{Context, Result, bail};
use log::{debug, info, warn};
use scm_markdown::{
  Document,
  DocumentBuilder,
  ExtensionRegistry,
  Location,
  MarkdownConfig,
  MarkdownView,
  RenderOutput,
};

mod cli;

use cli::Cli;

fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse_args();

  env_logger::Builder::new()
    .filter_level(cli.verbose.log_level_filter())
    .write_style(env_logger::WriteStyle::Auto)
    .init();

  let config = load_config(&cli)?;
  let content = read_input(&cli)?;
  let document = build_document(&cli, &config, content);

  let mut view =
    MarkdownView::from_config(ExtensionRegistry::new().into_shared(), &config);
  let location = Location::new(cli.current_path.as_str());
  let output = view.render(&document, &location);

  if let Some(error) = &output.error {
    warn!("Rendered the fallback notification: {error}");
  }

  let rendered = match cli.format.as_str() {
    "json" => to_json(output)?,
    _ => output.html.clone(),
  };
  emit(&rendered);
  Ok(())
}

#[allow(clippy::print_stdout, reason = "Rendered output goes to stdout")]
fn emit(rendered: &str) {
  println!("{rendered}");
}

/// Load the configuration file, if any, then apply overrides in order.
fn load_config(cli: &Cli) -> Result<MarkdownConfig> {
  let mut config = match &cli.config_file {
    Some(path) => {
      info!("Loading configuration from {}", path.display());
      MarkdownConfig::from_file(path).wrap_err_with(|| {
        format!("Failed to load configuration file: {}", path.display())
      })?
    },
    None => MarkdownConfig::default(),
  };

  for assignment in &cli.config_overrides {
    config
      .apply_override(assignment)
      .wrap_err_with(|| format!("Invalid config override: {assignment}"))?;
  }
  if cli.skip_html {
    config.skip_html = true;
  }
  if cli.anchor_headings {
    config.enable_anchor_headings = true;
  }

  debug!("Effective configuration: {config:?}");
  Ok(config)
}

fn read_input(cli: &Cli) -> Result<String> {
  if cli.reads_stdin() {
    let mut content = String::new();
    io::stdin()
      .read_to_string(&mut content)
      .wrap_err("Failed to read markdown from standard input")?;
    return Ok(content);
  }

  let Some(path) = &cli.input else {
    bail!("No input file given");
  };
  fs::read_to_string(path)
    .wrap_err_with(|| format!("Failed to read markdown file: {}", path.display()))
}

fn build_document(cli: &Cli, config: &MarkdownConfig, content: String) -> Document {
  let mut builder = DocumentBuilder::from_config(content, config);
  if let Some(base_path) = &cli.base_path {
    builder = builder.base_path(base_path.as_str());
  }
  if let Some(permalink) = &cli.permalink {
    builder = builder.permalink(permalink.as_str());
  }
  if let Some(revision) = &cli.revision {
    builder = builder.revision(revision.as_str());
  }
  if let Some(template) = &cli.content_template {
    builder = builder.content_template(template.as_str());
  }
  builder.build()
}

fn to_json(output: &RenderOutput) -> Result<String> {
  let value = serde_json::json!({
    "html": output.html,
    "title": output.title,
    "headers": output.headers,
    "error": output.error,
  });
  serde_json::to_string_pretty(&value).wrap_err("Failed to serialize output")
}
