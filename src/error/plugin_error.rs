//! Per-source plugin loading errors.

use thiserror::Error;

/// Errors raised while loading a single plugin source.
///
/// These never abort compilation; [`load_plugins`](crate::plugin::load_plugins)
/// converts them into error-level diagnostics and moves on to the next source.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Script error: {0}")]
    Script(String),
    #[error("Missing export: {0}")]
    MissingExport(String),
}
