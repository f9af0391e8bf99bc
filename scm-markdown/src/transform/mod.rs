//! AST transform stage.
//!
//! Transforms are tree-rewrite plugins applied between parsing and
//! sanitization. They run strictly in list order, each receiving the tree
//! produced by the previous one, and must be idempotent since the host may
//! re-run the pipeline on unchanged input.
mod shortlink;
mod valueless;

use std::sync::Arc;

use log::trace;

pub use self::{shortlink::ShortlinkTransform, valueless::ValuelessTextRepair};
use crate::{
  ast::Node,
  error::{MarkdownError, MarkdownResult, TransformError},
};

/// A tree-rewrite plugin.
pub trait Transform: Send + Sync {
  /// Name used in logs and error messages.
  fn name(&self) -> &str;

  /// Rewrite the tree in place.
  ///
  /// # Errors
  ///
  /// An error is fatal to the current render pass.
  fn apply(&self, tree: &mut Node) -> Result<(), TransformError>;
}

impl<F> Transform for F
where
  F: Fn(&mut Node) -> Result<(), TransformError> + Send + Sync,
{
  fn name(&self) -> &str {
    "anonymous"
  }

  fn apply(&self, tree: &mut Node) -> Result<(), TransformError> {
    self(tree)
  }
}

/// Apply `plugins` to `tree` in order.
///
/// # Errors
///
/// Returns the first plugin failure, tagged with the plugin name. The tree
/// passed in is consumed either way, so a failed pass leaves nothing half
/// rewritten behind.
pub fn apply_transforms(
  mut tree: Node,
  plugins: &[Arc<dyn Transform>],
) -> MarkdownResult<Node> {
  for plugin in plugins {
    trace!("Applying transform '{}'", plugin.name());
    plugin.apply(&mut tree).map_err(|source| {
      MarkdownError::Transform {
        plugin: plugin.name().to_owned(),
        source,
      }
    })?;
  }
  Ok(tree)
}

/// Built-in transforms, in the order they run after caller-supplied ones.
#[must_use]
pub fn builtin_transforms(shortlinks: bool) -> Vec<Arc<dyn Transform>> {
  let mut plugins: Vec<Arc<dyn Transform>> = Vec::with_capacity(2);
  if shortlinks {
    plugins.push(Arc::new(ShortlinkTransform::new()));
  }
  plugins.push(Arc::new(ValuelessTextRepair));
  plugins
}
