//! The filter-type registry: which operators apply to a field kind and
//! what a fresh condition on it defaults to.
//!
//! Built-in types: `text`, `select`, `multiSelect`, `date`, `number`,
//! `boolean`, and `custom`. Callers register their own types, or re-register
//! a built-in id to change its operator list or defaults (later entries win).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::operator::SENTINEL_ALL;

/// One filter type: an abstract field kind and its operator vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterTypeDef {
    /// Type id, referenced by field configs.
    pub id: String,

    /// Display label.
    pub label: String,

    /// Ordered list of applicable operator ids.
    pub operators: Vec<String>,

    /// The operator a fresh condition starts with. Must be in `operators`
    /// (checked by eager validation, tolerated at runtime).
    pub default_operator: String,

    /// The value a fresh condition starts with.
    #[serde(default)]
    pub default_value: Value,
}

impl FilterTypeDef {
    /// Creates a type definition.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        operators: Vec<&str>,
        default_operator: impl Into<String>,
        default_value: Value,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            operators: operators.into_iter().map(str::to_string).collect(),
            default_operator: default_operator.into(),
            default_value,
        }
    }
}

/// String-keyed registry of filter types.
#[derive(Debug, Clone, Default)]
pub struct FilterTypeRegistry {
    types: HashMap<String, FilterTypeDef>,
}

impl FilterTypeRegistry {
    /// A registry with no types.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the built-in types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        for def in builtin_filter_types() {
            registry.register(def);
        }
        registry
    }

    /// Registers a type, replacing any existing one with the same id.
    pub fn register(&mut self, def: FilterTypeDef) {
        self.types.insert(def.id.clone(), def);
    }

    /// Looks up a type by id.
    pub fn get(&self, id: &str) -> Option<&FilterTypeDef> {
        self.types.get(id)
    }

    /// Returns true if a type is registered under the id.
    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    /// Iterates over the registered definitions, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &FilterTypeDef> {
        self.types.values()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// The built-in filter types and their defaults.
pub fn builtin_filter_types() -> Vec<FilterTypeDef> {
    vec![
        FilterTypeDef::new(
            "text",
            "Text",
            vec![
                "contains",
                "equals",
                "notEquals",
                "startsWith",
                "endsWith",
                "isEmpty",
                "isNotEmpty",
            ],
            "contains",
            json!(""),
        ),
        FilterTypeDef::new(
            "select",
            "Select",
            vec!["equals", "notEquals", "in", "notIn", "isEmpty", "isNotEmpty"],
            "equals",
            json!(SENTINEL_ALL),
        ),
        FilterTypeDef::new(
            "multiSelect",
            "Multi-select",
            vec!["in", "notIn", "isEmpty", "isNotEmpty"],
            "in",
            json!([]),
        ),
        FilterTypeDef::new(
            "date",
            "Date",
            vec![
                "equals",
                "notEquals",
                "greaterThan",
                "lessThan",
                "greaterOrEqual",
                "lessOrEqual",
                "between",
                "isEmpty",
                "isNotEmpty",
            ],
            "equals",
            Value::Null,
        ),
        FilterTypeDef::new(
            "number",
            "Number",
            vec![
                "equals",
                "notEquals",
                "greaterThan",
                "lessThan",
                "greaterOrEqual",
                "lessOrEqual",
                "between",
                "isEmpty",
                "isNotEmpty",
            ],
            "equals",
            Value::Null,
        ),
        FilterTypeDef::new(
            "boolean",
            "Boolean",
            vec!["equals", "notEquals"],
            "equals",
            Value::Null,
        ),
        FilterTypeDef::new("custom", "Custom", vec!["equals"], "equals", Value::Null),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_types_registered() {
        let registry = FilterTypeRegistry::with_builtins();
        for id in ["text", "select", "multiSelect", "date", "number", "boolean", "custom"] {
            assert!(registry.contains(id), "missing builtin type: {}", id);
        }
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn test_builtin_defaults() {
        let registry = FilterTypeRegistry::with_builtins();
        assert_eq!(registry.get("text").unwrap().default_value, json!(""));
        assert_eq!(
            registry.get("select").unwrap().default_value,
            json!(SENTINEL_ALL)
        );
        assert_eq!(registry.get("multiSelect").unwrap().default_value, json!([]));
        assert_eq!(registry.get("date").unwrap().default_value, Value::Null);
        assert_eq!(registry.get("number").unwrap().default_value, Value::Null);
        assert_eq!(registry.get("boolean").unwrap().default_value, Value::Null);
    }

    #[test]
    fn test_default_operator_is_in_operator_list() {
        let registry = FilterTypeRegistry::with_builtins();
        for def in registry.iter() {
            assert!(
                def.operators.contains(&def.default_operator),
                "{} default operator outside its list",
                def.id
            );
        }
    }

    #[test]
    fn test_register_override_wins() {
        let mut registry = FilterTypeRegistry::with_builtins();
        registry.register(FilterTypeDef::new(
            "text",
            "Short text",
            vec!["equals"],
            "equals",
            json!(""),
        ));
        let def = registry.get("text").unwrap();
        assert_eq!(def.label, "Short text");
        assert_eq!(def.operators, vec!["equals".to_string()]);
    }

    #[test]
    fn test_custom_type_registration() {
        let mut registry = FilterTypeRegistry::with_builtins();
        registry.register(FilterTypeDef::new(
            "user",
            "User",
            vec!["equals", "notEquals", "isEmpty", "isNotEmpty"],
            "equals",
            json!(SENTINEL_ALL),
        ));
        assert!(registry.contains("user"));
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn test_type_def_serde_roundtrip() {
        let def = FilterTypeDef::new("select", "Select", vec!["equals"], "equals", json!(SENTINEL_ALL));
        let json = serde_json::to_string(&def).unwrap();
        let back: FilterTypeDef = serde_json::from_str(&json).unwrap();
        assert_eq!(def, back);
    }
}
