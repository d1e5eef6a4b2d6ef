use std::fmt;

use syntax::Span;
use thiserror::Error;

/// What kind of name failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Function,
    Variable,
    Scope,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RefKind::Function => "function",
            RefKind::Variable => "variable",
            RefKind::Scope => "scope",
        })
    }
}

/// Fatal code generation failures. Any of them aborts the run; the
/// checking pass should have ruled out the first two.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("unresolved {kind} `{name}`")]
    Unresolved { kind: RefKind, name: String },
    #[error("malformed tree at {span}: {message}")]
    Shape { message: String, span: Span },
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl CodegenError {
    pub(crate) fn shape(message: impl Into<String>, span: Span) -> Self {
        CodegenError::Shape {
            message: message.into(),
            span,
        }
    }

    pub(crate) fn unresolved(kind: RefKind, name: impl Into<String>) -> Self {
        CodegenError::Unresolved {
            kind,
            name: name.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CodegenError>;
