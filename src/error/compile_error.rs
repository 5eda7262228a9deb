//! Fatal compilation errors.

use thiserror::Error;

/// Errors that abort a compilation with no output.
///
/// Plugin loading problems are deliberately *not* represented here: a broken
/// plugin source is skipped and reported through the diagnostics channel,
/// while a broken DSL source has no well-defined partial output.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("DSL syntax error at line {line}, column {column}: {message}")]
    DslSyntax {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("Maximum nesting depth exceeded: {0}")]
    MaxDepth(usize),
    #[error("Unknown tag: {0}")]
    UnknownTag(String),
}

impl CompileError {
    pub(crate) fn syntax(message: impl Into<String>, line: usize, column: usize) -> Self {
        CompileError::DslSyntax {
            message: message.into(),
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_display() {
        assert_eq!(
            CompileError::syntax("unexpected ')'", 3, 7).to_string(),
            "DSL syntax error at line 3, column 7: unexpected ')'"
        );
        assert_eq!(
            CompileError::MaxDepth(64).to_string(),
            "Maximum nesting depth exceeded: 64"
        );
        assert_eq!(
            CompileError::UnknownTag("card".into()).to_string(),
            "Unknown tag: card"
        );
    }
}
