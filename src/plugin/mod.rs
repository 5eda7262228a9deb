//! Plugin model: the per-tag definition record, the case-insensitive
//! registry, and the two loader kinds (declarative `.box` files and
//! scripted JavaScript modules).
//!
//! Loading is best-effort: a broken source contributes zero definitions and
//! one error diagnostic; every other source still applies. See
//! [`load_plugins`] for the entry point.

mod declarative;
mod scripted;

pub mod definition;
pub mod loader;
pub mod registry;

pub use definition::{AllowList, PluginDefinition, PluginMetadata};
pub use loader::{load_plugins, PluginSource};
pub use registry::{PluginRegistry, Registrar};
