//! DSL-to-HTML compilation: options, the emitter, and document assembly.

mod assembler;
#[allow(clippy::module_inception)]
mod compiler;

pub use compiler::Compiler;

use crate::diagnostics::Diagnostic;

/// Policy for DSL tags with no registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownTagPolicy {
    /// Emit a literal element using the tag name as-is, with no template,
    /// no CSS/script and permissive filtering; reported as a warning.
    #[default]
    Passthrough,
    /// Abort compilation with `CompileError::UnknownTag`.
    Error,
}

/// Knobs for one compilation run.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub unknown_tags: UnknownTagPolicy,
    /// Bound on element nesting, enforced by both the parser and the
    /// emitter so pathological inputs fail predictably.
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            unknown_tags: UnknownTagPolicy::default(),
            max_depth: 64,
        }
    }
}

/// Result of one compilation: the final document text, the plugins actually
/// instantiated (deduplicated, first-use order) and the collected
/// diagnostics.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub html: String,
    pub used_plugins: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = CompileOptions::default();
        assert_eq!(options.unknown_tags, UnknownTagPolicy::Passthrough);
        assert_eq!(options.max_depth, 64);
    }
}
