//! Identifier classification: helper references versus context reads.

use std::collections::BTreeSet;

use crate::error::ExprError;
use crate::helpers::{is_helper_name, HelperRegistry};

use super::parser::{Expr, ExprKind};

/// Identifiers that denote the whole context object.
pub const CONTEXT_ROOTS: [&str; 2] = ["$", "this"];

/// How a bare identifier is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// `$name`: invoke the registered helper.
    Helper,
    /// `$` or `this`: the context object itself.
    ContextRoot,
    /// Anything else: a property read on the context.
    Context,
}

pub fn classify(name: &str) -> IdentifierKind {
    if CONTEXT_ROOTS.contains(&name) {
        IdentifierKind::ContextRoot
    } else if is_helper_name(name) {
        IdentifierKind::Helper
    } else {
        IdentifierKind::Context
    }
}

/// Checks every helper reference against `registry` in source order and
/// returns the set of helpers the expression uses.
///
/// Only the head of a member/call chain can be an identifier, so chains that
/// continue after a helper call (`$now.toString()`) need no extra handling.
pub fn resolve(
    expr: &Expr,
    source: &str,
    registry: &HelperRegistry,
) -> Result<BTreeSet<String>, ExprError> {
    let mut used = BTreeSet::new();
    collect(expr, source, registry, &mut used)?;
    Ok(used)
}

fn collect(
    expr: &Expr,
    source: &str,
    registry: &HelperRegistry,
    used: &mut BTreeSet<String>,
) -> Result<(), ExprError> {
    if let ExprKind::Identifier(name) = &expr.kind {
        if classify(name) == IdentifierKind::Helper {
            if !registry.contains(name) {
                return Err(ExprError::UnresolvedHelper {
                    name: name.clone(),
                    location: expr.location(source),
                });
            }
            used.insert(name.clone());
        }
        return Ok(());
    }
    for child in expr.children() {
        collect(child, source, registry, used)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parse_expression;
    use crate::helpers::{default_registry, sync_fn};

    fn resolve_src(src: &str, registry: &HelperRegistry) -> Result<BTreeSet<String>, ExprError> {
        let expr = parse_expression(src)?;
        resolve(&expr, src, registry)
    }

    #[test]
    fn classifies_identifiers() {
        assert_eq!(classify("$days"), IdentifierKind::Helper);
        assert_eq!(classify("$"), IdentifierKind::ContextRoot);
        assert_eq!(classify("this"), IdentifierKind::ContextRoot);
        assert_eq!(classify("price"), IdentifierKind::Context);
        assert_eq!(classify("$1"), IdentifierKind::Context);
    }

    #[test]
    fn reports_first_missing_helper_in_source_order() {
        let registry = default_registry();
        let err = resolve_src("$days($now, $later)", &registry).unwrap_err();
        match err {
            ExprError::UnresolvedHelper { name, location } => {
                assert_eq!(name, "$now");
                assert_eq!(location.column, 7);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn collects_used_helpers_including_computed_properties() {
        let registry = default_registry();
        registry
            .register("$now", sync_fn(|_, _| Ok(serde_json::json!(0))))
            .unwrap();
        let used = resolve_src("items[$now] + $days($now, x).y", &registry).unwrap();
        assert_eq!(
            used.into_iter().collect::<Vec<_>>(),
            vec!["$days".to_string(), "$now".to_string()]
        );
    }

    #[test]
    fn member_names_are_not_helper_references() {
        let registry = HelperRegistry::new();
        assert!(resolve_src("a.$missing + b['$missing']", &registry)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn context_identifiers_need_no_registration() {
        let registry = HelperRegistry::new();
        assert!(resolve_src("$.expiryDate > now && this.x", &registry).is_ok());
    }
}
