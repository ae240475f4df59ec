pub mod context;
pub mod engine;
pub mod error;
pub mod expr;
pub mod helpers;

pub use context::Context;
pub use engine::{EngineOptions, ExprEngine};
pub use error::{
    CompileError, EvaluationError, ExprEngineError, ExprError, HelperError, Location,
    RegistryError, RestrictionRule,
};
pub use expr::compile::CompiledExpression;
pub use helpers::{async_fn, default_registry, sync_fn, Helper, HelperRegistry};

/// Creates an engine over a fresh registry holding the built-in date helpers.
pub fn create() -> ExprEngine {
    ExprEngine::new(default_registry())
}

/// Creates an engine with explicit options over `registry`.
pub fn create_with(options: EngineOptions, registry: HelperRegistry) -> ExprEngine {
    ExprEngine::with_options(registry, options)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{create, create_with, sync_fn, EngineOptions, ExprEngineError, HelperRegistry};

    #[tokio::test]
    async fn exec_evaluates_against_json_context() {
        let engine = create();
        let out = engine
            .exec("price * qty + 1", &json!({"price": 12, "qty": 3}))
            .await
            .unwrap();
        assert_eq!(out, json!(37));
    }

    #[tokio::test]
    async fn exec_reuses_cached_compilation() {
        let engine = create();
        let ctx = json!({"a": 1});
        engine.exec("a + 1", &ctx).await.unwrap();
        engine.exec("a + 1", &ctx).await.unwrap();
        assert_eq!(engine.cached_len(), 1);

        engine.clear_cache();
        assert_eq!(engine.cached_len(), 0);
    }

    #[tokio::test]
    async fn cache_can_be_disabled() {
        let options = EngineOptions {
            cache_compiled: false,
            ..EngineOptions::default()
        };
        let engine = create_with(options, HelperRegistry::new());
        engine.exec("1 + 1", &json!({})).await.unwrap();
        assert_eq!(engine.cached_len(), 0);
    }

    #[tokio::test]
    async fn failed_compilation_is_not_cached() {
        let engine = create();
        let err = engine.exec("$missing()", &json!({})).await.unwrap_err();
        assert!(matches!(err, ExprEngineError::Compile(_)));
        assert_eq!(engine.cached_len(), 0);
    }

    #[test]
    fn create_registers_builtin_date_helpers() {
        let engine = create();
        assert_eq!(
            engine.registry().names(),
            vec!["$days", "$months", "$weeks", "$years"]
        );
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: EngineOptions = serde_json::from_value(json!({"max_depth": 8})).unwrap();
        assert_eq!(options.max_depth, 8);
        assert_eq!(options.max_source_len, 4096);
        assert!(options.cache_compiled);
    }

    #[test]
    fn compile_honors_configured_limits() {
        let options = EngineOptions {
            max_source_len: 8,
            ..EngineOptions::default()
        };
        let engine = create_with(options, HelperRegistry::new());
        assert!(engine.compile("1 + 2").is_ok());
        let err = engine.compile("1 + 2 + 3 + 4").unwrap_err();
        assert!(err.to_string().contains("maximum length"));
    }

    #[test]
    fn add_helper_extends_registry_after_construction() {
        let engine = create_with(EngineOptions::default(), HelperRegistry::new());
        assert!(engine.compile("$one()").is_err());
        engine
            .add_helper("$one", sync_fn(|_, _| Ok(json!(1))))
            .unwrap();
        assert!(engine.compile("$one()").is_ok());
    }
}
