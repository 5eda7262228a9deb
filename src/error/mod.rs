//! Error types for the box compiler.
//!
//! The split mirrors the propagation rules: [`CompileError`] is fatal and
//! aborts a compilation, [`PluginError`] covers a single plugin source and
//! is downgraded to a diagnostic by the loader.

mod compile_error;
mod plugin_error;

pub use compile_error::CompileError;
pub use plugin_error::PluginError;
