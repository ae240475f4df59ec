//! Read-only view of the caller's evaluation context.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map as JsonMap, Value as JsonValue};

/// Context lookup abstraction used during evaluation.
///
/// Identifiers that are not helper references (`price`, `$.expiryDate`) are
/// resolved through [`Context::get`] each time an expression runs. The
/// evaluator never writes to the context.
pub trait Context: Send + Sync {
    /// Returns the top-level property `name`, if present.
    fn get(&self, name: &str) -> Option<JsonValue>;

    /// Returns the whole context as one value; bound to `$` and `this`.
    fn root(&self) -> JsonValue;
}

/// Any JSON value; properties are read when it is an object.
impl Context for JsonValue {
    fn get(&self, name: &str) -> Option<JsonValue> {
        self.as_object()?.get(name).cloned()
    }

    fn root(&self) -> JsonValue {
        self.clone()
    }
}

impl Context for JsonMap<String, JsonValue> {
    fn get(&self, name: &str) -> Option<JsonValue> {
        JsonMap::get(self, name).cloned()
    }

    fn root(&self) -> JsonValue {
        JsonValue::Object(self.clone())
    }
}

impl Context for BTreeMap<String, JsonValue> {
    fn get(&self, name: &str) -> Option<JsonValue> {
        BTreeMap::get(self, name).cloned()
    }

    fn root(&self) -> JsonValue {
        JsonValue::Object(self.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl Context for HashMap<String, JsonValue> {
    fn get(&self, name: &str) -> Option<JsonValue> {
        HashMap::get(self, name).cloned()
    }

    fn root(&self) -> JsonValue {
        JsonValue::Object(self.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_object_context_reads_properties() {
        let ctx = json!({"a": 1});
        assert_eq!(Context::get(&ctx, "a"), Some(json!(1)));
        assert_eq!(Context::get(&ctx, "b"), None);
        assert_eq!(ctx.root(), json!({"a": 1}));
    }

    #[test]
    fn non_object_json_context_has_no_properties() {
        let ctx = json!([1, 2]);
        assert_eq!(Context::get(&ctx, "length"), None);
    }

    #[test]
    fn map_contexts_expose_root_object() {
        let mut map = BTreeMap::new();
        map.insert("x".to_string(), json!("y"));
        assert_eq!(Context::get(&map, "x"), Some(json!("y")));
        assert_eq!(map.root(), json!({"x": "y"}));
    }
}
