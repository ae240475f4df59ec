//! Runtime evaluator for compiled expressions.

use futures::future::BoxFuture;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;

use crate::context::Context;
use crate::error::EvaluationError;
use crate::helpers::HelperRegistry;

use super::compile::{CompiledExpression, Key, Node};
use super::ops;
use super::parser::LogicalOp;

/// Failure inside a single evaluation, before it is attached to its source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Helper returned an error.
    #[error("helper '{name}' failed: {message}")]
    Helper { name: String, message: String },
    /// Helper was resolved at compile time but is absent from the registry used
    /// for this evaluation.
    #[error("helper '{0}' is not registered")]
    MissingHelper(String),
    #[error("cannot read property '{property}' of {found}")]
    NotAnObject {
        property: String,
        found: &'static str,
    },
    #[error("{0} is not a function")]
    NotCallable(String),
    #[error("type error: {0}")]
    Type(String),
    #[error("arithmetic error: {0}")]
    Arithmetic(String),
}

/// Everything a running evaluation reads from.
pub struct EvalContext<'a> {
    /// Registry used to look up helpers and passed to them as receiver.
    pub registry: &'a HelperRegistry,
    /// Caller-supplied context.
    pub context: &'a dyn Context,
}

/// Executes `compiled` and attaches source information to any failure.
pub async fn execute(
    compiled: &CompiledExpression,
    registry: &HelperRegistry,
    context: &dyn Context,
) -> Result<JsonValue, EvaluationError> {
    let ctx = EvalContext { registry, context };
    evaluate(compiled.root(), &ctx)
        .await
        .map_err(|err| EvaluationError {
            message: err.to_string(),
            source_text: compiled.source().to_string(),
            transformed: compiled.transformed().to_string(),
        })
}

/// Evaluates `node` depth-first, left to right.
///
/// Helper calls are the only await points that can actually suspend; all
/// other nodes complete synchronously once their operands are ready.
pub fn evaluate<'a>(
    node: &'a Node,
    ctx: &'a EvalContext<'a>,
) -> BoxFuture<'a, Result<JsonValue, RuntimeError>> {
    Box::pin(async move {
        match node {
            Node::Const(value) => Ok(value.clone()),
            Node::ContextRoot => Ok(ctx.context.root()),
            Node::ContextRead(name) => Ok(ctx.context.get(name).unwrap_or(JsonValue::Null)),
            Node::Helper { name, args } => {
                let args = evaluate_all(args, ctx).await?;
                call_helper(name, args, ctx).await
            }
            Node::Unary { op, operand } => {
                let value = evaluate(operand, ctx).await?;
                ops::unary(*op, &value)
            }
            Node::Binary { op, left, right } => {
                let l = evaluate(left, ctx).await?;
                let r = evaluate(right, ctx).await?;
                ops::binary(*op, &l, &r)
            }
            Node::Logical { op, left, right } => {
                let l = evaluate(left, ctx).await?;
                let decided = match op {
                    LogicalOp::And => !ops::truthy(&l),
                    LogicalOp::Or => ops::truthy(&l),
                };
                if decided {
                    Ok(l)
                } else {
                    evaluate(right, ctx).await
                }
            }
            Node::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if ops::truthy(&evaluate(test, ctx).await?) {
                    evaluate(consequent, ctx).await
                } else {
                    evaluate(alternate, ctx).await
                }
            }
            Node::Member { object, key } => {
                let object = evaluate(object, ctx).await?;
                let key = evaluate_key(key, ctx).await?;
                ops::get_property(&object, &key)
            }
            Node::Method { object, key, args } => {
                let object = evaluate(object, ctx).await?;
                let key = evaluate_key(key, ctx).await?;
                let args = evaluate_all(args, ctx).await?;
                ops::call_method(&object, &key, &args)
            }
            Node::CallValue { callee, args } => {
                let callee = evaluate(callee, ctx).await?;
                evaluate_all(args, ctx).await?;
                Err(RuntimeError::NotCallable(ops::to_display_string(&callee)))
            }
            Node::Array(items) => Ok(JsonValue::Array(evaluate_all(items, ctx).await?)),
        }
    })
}

async fn evaluate_all(
    nodes: &[Node],
    ctx: &EvalContext<'_>,
) -> Result<Vec<JsonValue>, RuntimeError> {
    let mut values = Vec::with_capacity(nodes.len());
    for node in nodes {
        values.push(evaluate(node, ctx).await?);
    }
    Ok(values)
}

async fn evaluate_key(key: &Key, ctx: &EvalContext<'_>) -> Result<JsonValue, RuntimeError> {
    match key {
        Key::Static(name) => Ok(JsonValue::String(name.clone())),
        Key::Dynamic(node) => evaluate(node, ctx).await,
    }
}

async fn call_helper(
    name: &str,
    args: Vec<JsonValue>,
    ctx: &EvalContext<'_>,
) -> Result<JsonValue, RuntimeError> {
    let helper = ctx
        .registry
        .lookup(name)
        .ok_or_else(|| RuntimeError::MissingHelper(name.to_string()))?;
    debug!(helper = name, args = args.len(), "invoking helper");
    helper
        .call(ctx.registry, args)
        .await
        .map_err(|err| RuntimeError::Helper {
            name: name.to_string(),
            message: err.to_string(),
        })
}
