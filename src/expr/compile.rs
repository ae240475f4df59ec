//! Lowering of validated expressions into reusable compiled form.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{CompileError, ExprError};
use crate::helpers::HelperRegistry;

use super::lexer::syntax_error;
use super::ops::json_number;
use super::parser::{BinaryOp, Expr, ExprKind, LogicalOp, Property, UnaryOp};
use super::resolve::{classify, resolve, IdentifierKind};
use super::validate::validate;
use super::{parse_expression_with_limits, ParseLimits};

/// Executable step of a compiled expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Const(JsonValue),
    /// The context object itself (`$`, `this`).
    ContextRoot,
    /// Top-level context property read, resolved at evaluation time.
    ContextRead(String),
    /// Helper invocation; a suspension point.
    Helper {
        name: String,
        args: Vec<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Conditional {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    Member {
        object: Box<Node>,
        key: Key,
    },
    /// Built-in method call on a value, e.g. `x.toFixed(2)`.
    Method {
        object: Box<Node>,
        key: Key,
        args: Vec<Node>,
    },
    /// Call of a value that is not a helper or member; always fails at runtime
    /// after its operands are evaluated.
    CallValue {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    Array(Vec<Node>),
}

/// Property key of a member access or method call.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Static(String),
    Dynamic(Box<Node>),
}

/// Immutable, reusable result of compiling one expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    source: String,
    root: Node,
    transformed: String,
    helpers: BTreeSet<String>,
}

impl CompiledExpression {
    /// Original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Human-readable rendering of the compiled form, for diagnostics.
    pub fn transformed(&self) -> &str {
        &self.transformed
    }

    /// Helper names referenced by the expression.
    pub fn helpers(&self) -> &BTreeSet<String> {
        &self.helpers
    }

    pub fn root(&self) -> &Node {
        &self.root
    }
}

/// Runs parse, restriction checks, helper resolution and lowering.
///
/// Either every stage succeeds or a [`CompileError`] is returned; no partially
/// built artifact escapes.
pub fn compile_expression(
    source: &str,
    registry: &HelperRegistry,
    limits: &ParseLimits,
) -> Result<CompiledExpression, CompileError> {
    let stages = || -> Result<(Node, BTreeSet<String>), ExprError> {
        let ast = parse_expression_with_limits(source, limits)?;
        validate(&ast, source)?;
        let helpers = resolve(&ast, source, registry)?;
        let root = lower(&ast, source)?;
        Ok((root, helpers))
    };
    let (root, helpers) = stages().map_err(|kind| CompileError::new(source, kind))?;
    let transformed = render(&root);
    debug!(source, transformed = %transformed, "compiled expression");

    Ok(CompiledExpression {
        source: source.to_string(),
        root,
        transformed,
        helpers,
    })
}

/// Translates a validated AST into [`Node`]s.
pub fn lower(expr: &Expr, source: &str) -> Result<Node, ExprError> {
    let node = match &expr.kind {
        ExprKind::Number(n) => Node::Const(json_number(*n).ok_or_else(|| {
            syntax_error(source, expr.pos, expr.end, "numeric literal is out of range")
        })?),
        ExprKind::String(s) => Node::Const(JsonValue::String(s.clone())),
        ExprKind::Bool(b) => Node::Const(JsonValue::Bool(*b)),
        ExprKind::Null => Node::Const(JsonValue::Null),
        ExprKind::Identifier(name) => lower_identifier(name, Vec::new()),
        ExprKind::Unary { op, operand } => Node::Unary {
            op: *op,
            operand: Box::new(lower(operand, source)?),
        },
        ExprKind::Binary { op, left, right } => Node::Binary {
            op: *op,
            left: Box::new(lower(left, source)?),
            right: Box::new(lower(right, source)?),
        },
        ExprKind::Logical { op, left, right } => Node::Logical {
            op: *op,
            left: Box::new(lower(left, source)?),
            right: Box::new(lower(right, source)?),
        },
        ExprKind::Conditional {
            test,
            consequent,
            alternate,
        } => Node::Conditional {
            test: Box::new(lower(test, source)?),
            consequent: Box::new(lower(consequent, source)?),
            alternate: Box::new(lower(alternate, source)?),
        },
        ExprKind::Member { object, property } => {
            if let (ExprKind::Identifier(name), Property::Named(prop)) = (&object.kind, property) {
                if classify(name) == IdentifierKind::ContextRoot {
                    return Ok(Node::ContextRead(prop.clone()));
                }
            }
            Node::Member {
                object: Box::new(lower(object, source)?),
                key: lower_key(property, source)?,
            }
        }
        ExprKind::Call { callee, args } => {
            let args = args
                .iter()
                .map(|arg| lower(arg, source))
                .collect::<Result<Vec<_>, _>>()?;
            match &callee.kind {
                ExprKind::Identifier(name) if classify(name) == IdentifierKind::Helper => {
                    lower_identifier(name, args)
                }
                ExprKind::Member { object, property } => Node::Method {
                    object: Box::new(lower(object, source)?),
                    key: lower_key(property, source)?,
                    args,
                },
                _ => Node::CallValue {
                    callee: Box::new(lower(callee, source)?),
                    args,
                },
            }
        }
        ExprKind::Array(items) => Node::Array(
            items
                .iter()
                .map(|item| lower(item, source))
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };
    Ok(node)
}

fn lower_identifier(name: &str, args: Vec<Node>) -> Node {
    match classify(name) {
        IdentifierKind::Helper => Node::Helper {
            name: name.to_string(),
            args,
        },
        IdentifierKind::ContextRoot => Node::ContextRoot,
        IdentifierKind::Context => Node::ContextRead(name.to_string()),
    }
}

fn lower_key(property: &Property, source: &str) -> Result<Key, ExprError> {
    Ok(match property {
        Property::Named(name) => Key::Static(name.clone()),
        Property::Computed(expr) => Key::Dynamic(Box::new(lower(expr, source)?)),
    })
}

/// Renders the compiled tree as JavaScript-like text. Helper calls show the
/// registry receiver explicitly: `await _.$days(_, a, b)`.
pub fn render(node: &Node) -> String {
    let mut out = String::new();
    render_into(node, &mut out);
    out
}

fn render_into(node: &Node, out: &mut String) {
    match node {
        Node::Const(value) => out.push_str(&value.to_string()),
        Node::ContextRoot => out.push('$'),
        Node::ContextRead(name) => {
            out.push('$');
            render_key_static(name, out);
        }
        Node::Helper { name, args } => {
            let _ = write!(out, "await _.{name}(_");
            for arg in args {
                out.push_str(", ");
                render_into(arg, out);
            }
            out.push(')');
        }
        Node::Unary { op, operand } => {
            out.push('(');
            out.push_str(op.symbol());
            render_into(operand, out);
            out.push(')');
        }
        Node::Binary { op, left, right } => render_infix(left, op.symbol(), right, out),
        Node::Logical { op, left, right } => render_infix(left, op.symbol(), right, out),
        Node::Conditional {
            test,
            consequent,
            alternate,
        } => {
            out.push('(');
            render_into(test, out);
            out.push_str(" ? ");
            render_into(consequent, out);
            out.push_str(" : ");
            render_into(alternate, out);
            out.push(')');
        }
        Node::Member { object, key } => {
            render_into(object, out);
            render_key(key, out);
        }
        Node::Method { object, key, args } => {
            render_into(object, out);
            render_key(key, out);
            render_args(args, out);
        }
        Node::CallValue { callee, args } => {
            render_into(callee, out);
            render_args(args, out);
        }
        Node::Array(items) => {
            out.push('[');
            render_list(items, out);
            out.push(']');
        }
    }
}

fn render_infix(left: &Node, symbol: &str, right: &Node, out: &mut String) {
    out.push('(');
    render_into(left, out);
    let _ = write!(out, " {symbol} ");
    render_into(right, out);
    out.push(')');
}

fn render_key(key: &Key, out: &mut String) {
    match key {
        Key::Static(name) => render_key_static(name, out),
        Key::Dynamic(node) => {
            out.push('[');
            render_into(node, out);
            out.push(']');
        }
    }
}

fn render_key_static(name: &str, out: &mut String) {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if plain {
        let _ = write!(out, ".{name}");
    } else {
        let _ = write!(out, "[{}]", JsonValue::String(name.to_string()));
    }
}

fn render_args(args: &[Node], out: &mut String) {
    out.push('(');
    render_list(args, out);
    out.push(')');
}

fn render_list(items: &[Node], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        render_into(item, out);
    }
}
