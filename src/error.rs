//! Error definitions for every stage of the expression pipeline.

use std::fmt;

use thiserror::Error;

/// Position of an AST node or token inside the original expression source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Byte offset into the source text.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number, counted in characters.
    pub column: usize,
}

impl Location {
    /// Derives line and column for `offset` within `source`.
    pub fn at(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let mut line = 1;
        let mut column = 1;
        for (idx, ch) in source.char_indices() {
            if idx >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Restriction rules enforced on otherwise well-formed expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictionRule {
    /// The internal helper-registry identifier `_` was used.
    ReservedIdentifier,
    /// `super` appeared in the expression.
    Super,
    /// An operator outside the allow-list (`in`, `instanceof`, `typeof`, ...).
    Operator,
    /// Object literal syntax (`{ ... }`).
    ObjectLiteral,
    /// Spread syntax (`...x`).
    Spread,
    /// Assignment or compound assignment.
    Assignment,
    /// Increment or decrement (`++`, `--`).
    Update,
    /// Arrow function syntax (`=>`).
    ArrowFunction,
    /// Constructor invocation with `new`.
    New,
}

impl RestrictionRule {
    /// Stable rule name used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReservedIdentifier => "reserved-identifier",
            Self::Super => "super",
            Self::Operator => "operator",
            Self::ObjectLiteral => "object-literal",
            Self::Spread => "spread",
            Self::Assignment => "assignment",
            Self::Update => "update",
            Self::ArrowFunction => "arrow-function",
            Self::New => "new",
        }
    }
}

impl fmt::Display for RestrictionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure raised while parsing, validating or resolving an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// Malformed text, or more than one top-level expression.
    #[error("syntax error at {location}: {message} (near '{fragment}')")]
    Syntax {
        message: String,
        fragment: String,
        location: Location,
    },
    /// Disallowed operator, construct, or reserved identifier.
    #[error("syntax restriction '{rule}' violated at {location}: {message}")]
    SyntaxRestriction {
        rule: RestrictionRule,
        message: String,
        location: Location,
    },
    /// Helper reference that is not present in the registry.
    #[error("helper '{name}' used at {location} is not registered")]
    UnresolvedHelper { name: String, location: Location },
}

impl ExprError {
    /// Location of the offending fragment.
    pub fn location(&self) -> Location {
        match self {
            Self::Syntax { location, .. }
            | Self::SyntaxRestriction { location, .. }
            | Self::UnresolvedHelper { location, .. } => *location,
        }
    }
}

/// Error returned by [`crate::ExprEngine::compile`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to compile expression `{source_text}`: {kind}")]
pub struct CompileError {
    /// Original expression text.
    pub source_text: String,
    /// Transformed form, when compilation got far enough to produce one.
    pub transformed: Option<String>,
    /// Underlying parse, restriction or resolution failure.
    pub kind: ExprError,
}

impl CompileError {
    pub(crate) fn new(source_text: &str, kind: ExprError) -> Self {
        Self {
            source_text: source_text.to_string(),
            transformed: None,
            kind,
        }
    }

    pub fn kind(&self) -> &ExprError {
        &self.kind
    }
}

/// Runtime failure raised while executing a compiled expression.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("error while evaluating `{source_text}`: {message}")]
pub struct EvaluationError {
    /// Message text of the underlying cause.
    pub message: String,
    /// Original expression text.
    pub source_text: String,
    /// Transformed form of the compiled expression.
    pub transformed: String,
}

/// Failure reported by a helper implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HelperError(pub String);

impl HelperError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for HelperError {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for HelperError {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Registration failures on a [`crate::HelperRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Name does not follow the `$name` convention.
    #[error("invalid helper name '{0}'; helper names must look like '$name'")]
    InvalidName(String),
    /// Helper passed to `add` does not declare its own name.
    #[error("helper does not declare a name; register it with an explicit name")]
    Unnamed,
}

/// Top-level error type returned by APIs spanning several stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprEngineError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_tracks_lines_and_columns() {
        let src = "a +\n  $b";
        let loc = Location::at(src, 6);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 3);
        assert_eq!(loc.to_string(), "line 2, column 3");
    }

    #[test]
    fn location_clamps_past_end() {
        let loc = Location::at("ab", 10);
        assert_eq!(loc.offset, 2);
        assert_eq!(loc.column, 3);
    }
}
