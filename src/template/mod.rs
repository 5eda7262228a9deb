//! Template substitution engine for `{{...}}` placeholder tokens.

mod engine;

pub use engine::{resolve_content, resolve_script, TemplateContext};
