//! Case-insensitive plugin registry and the registration target trait.

use std::collections::HashMap;

use tracing::debug;

use crate::diagnostics::{Diagnostic, Diagnostics};

use super::definition::{PluginDefinition, PluginMetadata};

/// Mutable registration target handed to plugin loaders.
///
/// Both loader kinds funnel their definitions through this trait rather
/// than touching the registry map directly; the registry key is always the
/// lower-cased plugin name and the last insertion for a name wins.
pub trait Registrar {
    fn insert(&mut self, name: &str, definition: PluginDefinition);
}

/// Mapping from lower-cased plugin name to [`PluginDefinition`], rebuilt
/// fresh per compilation run and owned by that run.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    definitions: HashMap<String, PluginDefinition>,
    metadata: Vec<PluginMetadata>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&PluginDefinition> {
        self.definitions.get(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Informational metadata of the loaded sources, in load order.
    pub fn metadata(&self) -> &[PluginMetadata] {
        &self.metadata
    }

    /// Insert under the lower-cased key, returning the displaced definition
    /// on conflict.
    pub fn insert(&mut self, name: &str, definition: PluginDefinition) -> Option<PluginDefinition> {
        self.definitions
            .insert(name.to_ascii_lowercase(), definition)
    }

    pub(crate) fn add_metadata(&mut self, metadata: PluginMetadata) {
        self.metadata.push(metadata);
    }
}

/// [`Registrar`] that records conflicts as diagnostics, scoped to one
/// plugin source.
pub struct RegistryBuilder<'a> {
    registry: &'a mut PluginRegistry,
    diagnostics: &'a mut Diagnostics,
    source: &'a str,
}

impl<'a> RegistryBuilder<'a> {
    pub fn new(
        registry: &'a mut PluginRegistry,
        diagnostics: &'a mut Diagnostics,
        source: &'a str,
    ) -> Self {
        Self {
            registry,
            diagnostics,
            source,
        }
    }
}

impl Registrar for RegistryBuilder<'_> {
    fn insert(&mut self, name: &str, definition: PluginDefinition) {
        let key = name.to_ascii_lowercase();
        if self.registry.insert(name, definition).is_some() {
            debug!(plugin = %key, source = %self.source, "plugin redefined");
            self.diagnostics.push(
                Diagnostic::warning(
                    "W201",
                    format!("plugin '{key}' defined more than once; last definition wins"),
                )
                .with_source(self.source),
            );
        }
    }
}
