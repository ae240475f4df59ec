//! Helper functions callable from expressions through `$name` references.

pub mod dates;

use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{HelperError, RegistryError};

/// A named function invoked from expressions.
///
/// Helpers receive the registry they were resolved from as an explicit
/// receiver, so one helper can call a sibling through
/// [`HelperRegistry::invoke`]. Arguments arrive already evaluated, in source
/// order. A helper may await freely; the expression evaluation suspends until
/// it returns.
///
/// # Example
///
/// ```ignore
/// struct Double;
///
/// #[async_trait]
/// impl Helper for Double {
///     fn name(&self) -> Option<&str> {
///         Some("$double")
///     }
///
///     async fn call(
///         &self,
///         _registry: &HelperRegistry,
///         args: Vec<JsonValue>,
///     ) -> Result<JsonValue, HelperError> {
///         let n = args.first().and_then(JsonValue::as_f64).unwrap_or(0.0);
///         Ok(json!(n * 2.0))
///     }
/// }
/// ```
#[async_trait]
pub trait Helper: Send + Sync {
    /// Name the helper declares for itself, used by [`HelperRegistry::add`].
    fn name(&self) -> Option<&str> {
        None
    }

    /// Invokes the helper.
    async fn call(
        &self,
        registry: &HelperRegistry,
        args: Vec<JsonValue>,
    ) -> Result<JsonValue, HelperError>;
}

/// Returns true when `name` follows the helper naming convention (`$` followed
/// by an ASCII letter, then letters, digits or underscores).
pub fn is_helper_name(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^\$[A-Za-z][A-Za-z0-9_]*$").expect("valid regex"));
    re.is_match(name)
}

/// Name-to-helper mapping shared by compilation and evaluation.
///
/// Registration takes `&self`; entries live in a concurrent map so a registry
/// behind an `Arc` can be extended while evaluations are in flight. There is
/// no removal. Cloning produces an independent registry with the same
/// entries.
#[derive(Clone, Default)]
pub struct HelperRegistry {
    helpers: DashMap<String, Arc<dyn Helper>>,
}

impl HelperRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `helper` under `name`, replacing any previous entry.
    pub fn register(
        &self,
        name: impl Into<String>,
        helper: impl Helper + 'static,
    ) -> Result<(), RegistryError> {
        self.register_shared(name, Arc::new(helper))
    }

    /// Registers an already shared helper under `name`.
    pub fn register_shared(
        &self,
        name: impl Into<String>,
        helper: Arc<dyn Helper>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if !is_helper_name(&name) {
            return Err(RegistryError::InvalidName(name));
        }
        debug!(helper = %name, "registering helper");
        self.helpers.insert(name, helper);
        Ok(())
    }

    /// Registers `helper` under the name it declares via [`Helper::name`].
    pub fn add(&self, helper: impl Helper + 'static) -> Result<(), RegistryError> {
        let name = helper.name().ok_or(RegistryError::Unnamed)?.to_string();
        self.register(name, helper)
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Helper>> {
        self.helpers.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.helpers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }

    /// Calls the helper registered as `name` with this registry as receiver.
    pub async fn invoke(
        &self,
        name: &str,
        args: Vec<JsonValue>,
    ) -> Result<JsonValue, HelperError> {
        let helper = self
            .lookup(name)
            .ok_or_else(|| HelperError(format!("helper '{name}' is not registered")))?;
        helper.call(self, args).await
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperRegistry")
            .field("helpers", &self.names())
            .finish()
    }
}

/// Builds a fresh registry holding the built-in date helpers
/// (`$days`, `$weeks`, `$months`, `$years`).
pub fn default_registry() -> HelperRegistry {
    let registry = HelperRegistry::new();
    for helper in dates::builtin() {
        let name = helper.helper_name().to_string();
        registry.helpers.insert(name, Arc::new(helper));
    }
    registry
}

/// Helper backed by a synchronous closure. See [`sync_fn`].
pub struct SyncFn<F> {
    name: Option<String>,
    f: F,
}

/// Helper backed by a closure returning a future. See [`async_fn`].
pub struct AsyncFn<F> {
    name: Option<String>,
    f: F,
}

/// Wraps a synchronous closure as a [`Helper`].
pub fn sync_fn<F>(f: F) -> SyncFn<F>
where
    F: Fn(&HelperRegistry, &[JsonValue]) -> Result<JsonValue, HelperError> + Send + Sync,
{
    SyncFn { name: None, f }
}

/// Wraps a closure returning a future as a [`Helper`].
///
/// The closure receives only the evaluated arguments. The returned future is
/// `'static`, so it cannot borrow the registry; a helper that needs to call a
/// sibling through [`HelperRegistry::invoke`] should implement [`Helper`]
/// directly. [`sync_fn`] closures do receive the registry.
pub fn async_fn<F, Fut>(f: F) -> AsyncFn<F>
where
    F: Fn(Vec<JsonValue>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<JsonValue, HelperError>> + Send + 'static,
{
    AsyncFn { name: None, f }
}

impl<F> SyncFn<F> {
    /// Declares the name used by [`HelperRegistry::add`].
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<F> AsyncFn<F> {
    /// Declares the name used by [`HelperRegistry::add`].
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[async_trait]
impl<F> Helper for SyncFn<F>
where
    F: Fn(&HelperRegistry, &[JsonValue]) -> Result<JsonValue, HelperError> + Send + Sync,
{
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    async fn call(
        &self,
        registry: &HelperRegistry,
        args: Vec<JsonValue>,
    ) -> Result<JsonValue, HelperError> {
        (self.f)(registry, &args)
    }
}

#[async_trait]
impl<F, Fut> Helper for AsyncFn<F>
where
    F: Fn(Vec<JsonValue>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<JsonValue, HelperError>> + Send + 'static,
{
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    async fn call(
        &self,
        _registry: &HelperRegistry,
        args: Vec<JsonValue>,
    ) -> Result<JsonValue, HelperError> {
        (self.f)(args).await
    }
}
