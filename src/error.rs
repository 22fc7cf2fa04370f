//! Custom error types.
//!
//! Two failure domains, mirroring the two phases of working with a
//! template: [`ParseError`] for malformed source (§4.1 "Failure modes")
//! and [`RenderError`] for everything that can go wrong evaluating an
//! already-parsed [`crate::ast::Template`] against a metadata provider
//! (§7).

use crate::ast::Span;
use thiserror::Error;

/// Errors raised while turning a template source string into a
/// [`crate::ast::Template`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Remedy: add the missing `}`.
    #[error("unterminated `{{` opened at byte {offset}")]
    UnterminatedBrace { offset: usize },

    /// Remedy: use one of `contains`, `matches`, `startswith`, `endswith`,
    /// `<=`, `>=`, `<`, `>`, `==`, `!=`.
    #[error("unknown conditional operator at byte {offset}")]
    UnknownOperator { offset: usize },

    /// Remedy: split the pair so that neither `find` nor `replace`
    /// contains a literal `|`.
    #[error("find/replace pair at byte {offset} must not contain `|`")]
    FindReplacePipe { offset: usize },

    /// Remedy: close the filter argument's parenthesis.
    #[error("unterminated filter argument at byte {offset}")]
    UnterminatedFilterArgument { offset: usize },

    /// Remedy: `chop`/`chomp` require an explicit count, e.g. `chop(1)`.
    #[error("filter `{filter}` at byte {offset} requires an explicit argument")]
    MissingFilterArgument { filter: String, offset: usize },

    /// Remedy: field names start with a character other than
    /// `: . | [ space ? , }`.
    #[error("empty field name at byte {offset}")]
    EmptyFieldName { offset: usize },

    /// Remedy: variable names match `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("invalid variable name `{name}` at byte {offset}")]
    InvalidVariableName { name: String, offset: usize },
}

impl ParseError {
    /// The byte offset the error is anchored to, for callers that want to
    /// build their own source-pointer rendering.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::UnterminatedBrace { offset }
            | ParseError::UnknownOperator { offset }
            | ParseError::FindReplacePipe { offset }
            | ParseError::UnterminatedFilterArgument { offset }
            | ParseError::MissingFilterArgument { offset, .. }
            | ParseError::EmptyFieldName { offset }
            | ParseError::InvalidVariableName { offset, .. } => *offset,
        }
    }
}

/// Errors raised while rendering an already-parsed template.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Remedy: register a provider for `name`, or check the template for a
    /// typo.
    #[error("unknown field `{name}` at {span:?}")]
    UnknownField { name: String, span: Span },

    /// Remedy: check the extractor backing `name`; it declared a `Hard`
    /// provider policy (§4.2, §7) and failed.
    #[error("provider `{name}` failed at {span:?}: {source}")]
    Provider {
        name: String,
        span: Span,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Remedy: none; the render was abandoned cooperatively (§5).
    #[error("render cancelled")]
    Cancelled,
}
