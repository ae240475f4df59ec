//! Long-lived engine owning one helper registry.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::context::Context;
use crate::error::{CompileError, EvaluationError, ExprEngineError, RegistryError};
use crate::expr::compile::{compile_expression, CompiledExpression};
use crate::expr::eval;
use crate::expr::{ParseLimits, MAX_EXPRESSION_DEPTH, MAX_EXPRESSION_SOURCE_LEN};
use crate::helpers::{default_registry, Helper, HelperRegistry};

/// Engine configuration. Every field is optional when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Longest accepted expression, in bytes.
    pub max_source_len: usize,
    /// Tallest accepted expression tree. Operator chains (`a + b + c`) and
    /// member chains (`a.b.c`) count one level per link.
    pub max_depth: usize,
    /// Reuse compiled expressions across `exec` calls with the same source.
    pub cache_compiled: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_source_len: MAX_EXPRESSION_SOURCE_LEN,
            max_depth: MAX_EXPRESSION_DEPTH,
            cache_compiled: true,
        }
    }
}

impl EngineOptions {
    fn limits(&self) -> ParseLimits {
        ParseLimits {
            max_source_len: self.max_source_len,
            max_depth: self.max_depth,
        }
    }
}

/// Compiles and executes expressions against one [`HelperRegistry`].
///
/// The registry may be extended at any time through [`ExprEngine::add_helper`]
/// or [`ExprEngine::add`]. Expressions referencing a new helper must be
/// compiled after it is registered. The engine is `Send + Sync`; evaluations
/// may run concurrently on separate tasks.
#[derive(Debug)]
pub struct ExprEngine {
    registry: Arc<HelperRegistry>,
    options: EngineOptions,
    cache: DashMap<String, Arc<CompiledExpression>>,
}

impl Default for ExprEngine {
    fn default() -> Self {
        Self::new(default_registry())
    }
}

impl ExprEngine {
    /// Creates an engine over `registry` with default options.
    pub fn new(registry: HelperRegistry) -> Self {
        Self::with_options(registry, EngineOptions::default())
    }

    pub fn with_options(registry: HelperRegistry, options: EngineOptions) -> Self {
        Self::from_shared(Arc::new(registry), options)
    }

    /// Creates an engine over a registry that is shared with other owners.
    pub fn from_shared(registry: Arc<HelperRegistry>, options: EngineOptions) -> Self {
        Self {
            registry,
            options,
            cache: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<HelperRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Registers `helper` under `name`, replacing any existing entry.
    pub fn add_helper(
        &self,
        name: impl Into<String>,
        helper: impl Helper + 'static,
    ) -> Result<(), RegistryError> {
        self.registry.register(name, helper)
    }

    /// Registers `helper` under its declared [`Helper::name`].
    pub fn add(&self, helper: impl Helper + 'static) -> Result<(), RegistryError> {
        self.registry.add(helper)
    }

    /// Compiles `source` into a reusable expression.
    #[tracing::instrument(skip(self), level = "debug")]
    pub fn compile(&self, source: &str) -> Result<CompiledExpression, CompileError> {
        compile_expression(source, &self.registry, &self.options.limits())
    }

    /// Executes a compiled expression against `context`.
    #[tracing::instrument(skip_all, fields(source = compiled.source()), level = "debug")]
    pub async fn execute(
        &self,
        compiled: &CompiledExpression,
        context: &dyn Context,
    ) -> Result<JsonValue, EvaluationError> {
        eval::execute(compiled, &self.registry, context).await
    }

    /// Compiles (or fetches from cache) and executes `source` in one step.
    pub async fn exec(
        &self,
        source: &str,
        context: &dyn Context,
    ) -> Result<JsonValue, ExprEngineError> {
        let compiled = self.compile_cached(source)?;
        Ok(self.execute(&compiled, context).await?)
    }

    /// Returns the cached compilation of `source`, compiling it on first use.
    /// Failed compilations are not cached. Bypasses the cache when
    /// `cache_compiled` is off.
    pub fn compile_cached(&self, source: &str) -> Result<Arc<CompiledExpression>, CompileError> {
        if !self.options.cache_compiled {
            return self.compile(source).map(Arc::new);
        }
        if let Some(hit) = self.cache.get(source) {
            trace!(source, "compiled expression cache hit");
            return Ok(Arc::clone(hit.value()));
        }
        let compiled = Arc::new(self.compile(source)?);
        self.cache.insert(source.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Number of cached compiled expressions.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
