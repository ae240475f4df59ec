//! Restricted expression language: parsing, checking, lowering, evaluation.

/// Lowering into compiled form.
pub mod compile;
/// Async evaluator for compiled expressions.
pub mod eval;
/// Tokenizer for expression source text.
pub mod lexer;
/// Value semantics for operators, properties and methods.
pub mod ops;
/// Parser and expression AST definitions.
pub mod parser;
/// Helper versus context identifier resolution.
pub mod resolve;
/// Syntax restriction checks.
pub mod validate;

use crate::error::ExprError;

use lexer::syntax_error;

/// Upper bound on expression source length in bytes.
pub const MAX_EXPRESSION_SOURCE_LEN: usize = 4096;
/// Upper bound on expression tree height.
pub const MAX_EXPRESSION_DEPTH: usize = 64;

/// Size limits applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    pub max_source_len: usize,
    pub max_depth: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_source_len: MAX_EXPRESSION_SOURCE_LEN,
            max_depth: MAX_EXPRESSION_DEPTH,
        }
    }
}

/// Parses expression source into an AST using default limits.
pub fn parse_expression(input: &str) -> Result<parser::Expr, ExprError> {
    parse_expression_with_limits(input, &ParseLimits::default())
}

/// Parses expression source into an AST.
pub fn parse_expression_with_limits(
    input: &str,
    limits: &ParseLimits,
) -> Result<parser::Expr, ExprError> {
    if input.len() > limits.max_source_len {
        return Err(syntax_error(
            input,
            limits.max_source_len,
            limits.max_source_len,
            format!(
                "expression exceeds maximum length of {} bytes",
                limits.max_source_len
            ),
        ));
    }
    let tokens = lexer::tokenize(input)?;
    parser::parse(input, &tokens, limits.max_depth)
}
