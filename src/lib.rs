//! # boxc — a compiler for the box DSL
//!
//! `boxc` compiles a small tag-based DSL into static HTML with a pluggable
//! component model: each recognized tag name maps to a registered plugin
//! definition describing how to render it.
//!
//! - **Plugin registry**: case-insensitive lookup table fed by two loader
//!   kinds — declarative `define Name(...)` files and scripted JavaScript
//!   modules (evaluated with Boa) exposing a `register(registry)` entry
//!   point. Loading is best-effort; broken sources are skipped and reported.
//! - **Template engine**: `{{...}}` placeholder substitution with indexed
//!   data access and JSON-safe encodings; unknown tokens pass through.
//! - **Compiler**: walks the element tree depth-first, enforces
//!   attribute/children filtering, and aggregates per-plugin CSS and
//!   per-instance scripts into the final document.
//!
//! Compilation is a synchronous, pure transformation from input text to
//! output text. The core performs no I/O; reading sources and writing the
//! result is the caller's job (see the `boxc` binary). Anomalies that do
//! not abort compilation are collected on an ordered diagnostics channel.
//!
//! # Quick Start
//!
//! ```
//! use boxc::{load_plugins, Compiler, Diagnostics, PluginSource};
//!
//! let sources = vec![PluginSource::declarative(
//!     "default.box",
//!     r#"define Title(tag("h1") attr("class"))"#,
//! )];
//! let mut diagnostics = Diagnostics::new();
//! let registry = load_plugins(&sources, &mut diagnostics);
//! let compiler = Compiler::new(registry);
//! let output = compiler.compile(r#"Title(text("Hello"))"#).unwrap();
//! assert_eq!(output.html, "<h1>Hello</h1>");
//! ```

pub mod compiler;
pub mod diagnostics;
pub mod dsl;
pub mod error;
pub mod plugin;
pub mod template;

pub use crate::compiler::{CompileOptions, CompileOutput, Compiler, UnknownTagPolicy};
pub use crate::diagnostics::{Diagnostic, DiagnosticLevel, Diagnostics};
pub use crate::dsl::{parse_document, Element};
pub use crate::error::{CompileError, PluginError};
pub use crate::plugin::{
    load_plugins, AllowList, PluginDefinition, PluginMetadata, PluginRegistry, PluginSource,
    Registrar,
};
pub use crate::template::{resolve_content, resolve_script, TemplateContext};
