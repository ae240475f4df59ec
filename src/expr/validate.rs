//! Restriction checks applied to a parsed expression before resolution.

use crate::error::{ExprError, RestrictionRule};

use super::parser::{BinaryOp, Expr, ExprKind, UnaryOp};

/// Identifier reserved for the helper registry inside compiled expressions.
pub const RESERVED_IDENTIFIER: &str = "_";

/// Walks `expr` top-down and returns the first restriction violation found.
pub fn validate(expr: &Expr, source: &str) -> Result<(), ExprError> {
    if let Some((rule, message)) = violation(expr) {
        return Err(ExprError::SyntaxRestriction {
            rule,
            message,
            location: expr.location(source),
        });
    }
    for child in expr.children() {
        validate(child, source)?;
    }
    Ok(())
}

fn violation(expr: &Expr) -> Option<(RestrictionRule, String)> {
    match &expr.kind {
        ExprKind::Identifier(name) if name == RESERVED_IDENTIFIER => Some((
            RestrictionRule::ReservedIdentifier,
            format!("identifier '{RESERVED_IDENTIFIER}' is reserved and cannot be used"),
        )),
        ExprKind::Identifier(name) if name == "super" => Some((
            RestrictionRule::Super,
            "'super' is not allowed".to_string(),
        )),
        ExprKind::Unary { op, .. } if !unary_allowed(*op) => Some((
            RestrictionRule::Operator,
            format!("operator '{}' is not allowed", op.symbol().trim_end()),
        )),
        ExprKind::Binary { op, .. } if !binary_allowed(*op) => Some((
            RestrictionRule::Operator,
            format!("operator '{}' is not allowed", op.symbol()),
        )),
        _ => None,
    }
}

fn unary_allowed(op: UnaryOp) -> bool {
    matches!(
        op,
        UnaryOp::Neg | UnaryOp::Plus | UnaryOp::Not | UnaryOp::BitNot
    )
}

fn binary_allowed(op: BinaryOp) -> bool {
    !matches!(op, BinaryOp::In | BinaryOp::InstanceOf)
}
