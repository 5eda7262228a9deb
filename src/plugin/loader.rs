//! Dual-source plugin loading with best-effort semantics.

use tracing::{debug, warn};

use crate::diagnostics::{Diagnostic, Diagnostics};

use super::definition::{PluginDefinition, PluginMetadata};
use super::registry::{PluginRegistry, Registrar, RegistryBuilder};
use super::{declarative, scripted};

/// One plugin source: its kind plus content, with a label (typically the
/// file name) used in diagnostics. The core never reads files itself.
#[derive(Debug, Clone)]
pub enum PluginSource {
    /// Block-syntax definition file.
    Declarative { label: String, content: String },
    /// Executable JavaScript module with a `register(registry)` entry point.
    Scripted { label: String, content: String },
}

impl PluginSource {
    pub fn declarative(label: impl Into<String>, content: impl Into<String>) -> Self {
        PluginSource::Declarative {
            label: label.into(),
            content: content.into(),
        }
    }

    pub fn scripted(label: impl Into<String>, content: impl Into<String>) -> Self {
        PluginSource::Scripted {
            label: label.into(),
            content: content.into(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PluginSource::Declarative { label, .. } | PluginSource::Scripted { label, .. } => {
                label
            }
        }
    }
}

/// Contributions of one successfully parsed source. Sources parse
/// atomically: either all of a source's definitions apply or none do.
#[derive(Debug, Default)]
pub(crate) struct ParsedSource {
    pub definitions: Vec<(String, PluginDefinition)>,
    pub metadata: Option<PluginMetadata>,
}

/// Load all sources into a fresh registry, in slice order.
///
/// Never fails as a whole: a source that cannot be parsed or executed is
/// skipped with an error diagnostic (`E001` declarative, `E002` scripted)
/// and the remaining sources still apply. Within the registry the
/// last-loaded definition for a name wins, reported as a `W201` conflict.
pub fn load_plugins(sources: &[PluginSource], diagnostics: &mut Diagnostics) -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    for source in sources {
        let (code, parsed) = match source {
            PluginSource::Declarative { label, content } => {
                ("E001", declarative::parse_source(label, content, diagnostics))
            }
            PluginSource::Scripted { label, content } => {
                ("E002", scripted::parse_source(label, content, diagnostics))
            }
        };
        match parsed {
            Ok(parsed) => {
                debug!(
                    source = source.label(),
                    definitions = parsed.definitions.len(),
                    "loaded plugin source"
                );
                let mut builder =
                    RegistryBuilder::new(&mut registry, diagnostics, source.label());
                for (name, definition) in parsed.definitions {
                    builder.insert(&name, definition);
                }
                if let Some(metadata) = parsed.metadata {
                    registry.add_metadata(metadata);
                }
            }
            Err(err) => {
                warn!(source = source.label(), error = %err, "skipping plugin source");
                diagnostics.push(
                    Diagnostic::error(code, err.to_string()).with_source(source.label()),
                );
            }
        }
    }
    registry
}
