//! A standalone `{operator, value}` pair for one field, used by per-column
//! filter controls that live outside any condition tree.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::FilterFieldConfig;
use crate::operator::{ignores_filter_value, is_unconstrained, SENTINEL_ALL};
use crate::system::FilterSystem;
use crate::tree::FilterCondition;

/// Fallback `(operator, value)` defaults by filter type, for construction
/// without a [`FilterSystem`] at hand.
fn fallback_defaults(filter_type: &str) -> (&'static str, Value) {
    match filter_type {
        "text" => ("contains", json!("")),
        "select" => ("equals", json!(SENTINEL_ALL)),
        "multiSelect" => ("in", json!([])),
        _ => ("equals", Value::Null),
    }
}

/// One field's filter state outside a tree: the chosen operator and value.
///
/// Unlike a [`FilterCondition`] this carries its own field config, so a
/// grid column can evaluate itself without a manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleFieldValue {
    /// The field this value filters.
    pub field: FilterFieldConfig,
    /// Current operator id.
    pub operator: String,
    /// Current filter value.
    pub value: Value,
}

impl SingleFieldValue {
    /// Creates a value with type-appropriate defaults, without consulting a
    /// registry.
    pub fn new(field: FilterFieldConfig) -> Self {
        let (operator, value) = match (&field.default_operator, &field.default_value) {
            (Some(op), Some(v)) => (op.clone(), v.clone()),
            (Some(op), None) => (op.clone(), fallback_defaults(&field.filter_type).1),
            (None, Some(v)) => (
                fallback_defaults(&field.filter_type).0.to_string(),
                v.clone(),
            ),
            (None, None) => {
                let (op, v) = fallback_defaults(&field.filter_type);
                (op.to_string(), v)
            }
        };
        Self {
            field,
            operator,
            value,
        }
    }

    /// Creates a value with defaults resolved through the system's
    /// registries, honoring custom filter types.
    pub fn with_system(field: FilterFieldConfig, system: &FilterSystem) -> Self {
        let operator = system.default_operator_for_field(&field);
        let value = system.default_value_for_field(&field);
        Self {
            field,
            operator,
            value,
        }
    }

    /// Switches the operator, adjusting the value shape where the operator
    /// demands it.
    ///
    /// Entering `between` on a ranged type resets the value to an open
    /// `[null, null]` pair; leaving `between` with a range still in place
    /// resets back to the type default.
    pub fn set_operator(&mut self, operator: impl Into<String>) {
        let operator = operator.into();
        let was_between = self.operator == "between";
        if operator == "between" && !was_between {
            if matches!(self.field.filter_type.as_str(), "number" | "date") {
                self.value = json!([Value::Null, Value::Null]);
            }
        } else if was_between && operator != "between" && self.value.is_array() {
            self.value = fallback_defaults(&self.field.filter_type).1;
        }
        self.operator = operator;
    }

    /// Replaces the filter value.
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    /// Returns true when this value places no constraint on rows.
    ///
    /// `isEmpty`/`isNotEmpty` constrain regardless of value. A `between`
    /// with both bounds null is open on both ends and constrains nothing.
    /// Otherwise the unconstrained sentinels apply: JSON null, the
    /// `__all__` marker, a blank string, or an empty array.
    pub fn is_empty(&self) -> bool {
        if ignores_filter_value(&self.operator) {
            return false;
        }
        if self.operator == "between" {
            if let Some(bounds) = self.value.as_array() {
                return bounds.iter().all(Value::is_null);
            }
        }
        match &self.value {
            Value::String(s) => s == SENTINEL_ALL || s.trim().is_empty(),
            Value::Array(items) => items.is_empty(),
            value => is_unconstrained(value),
        }
    }

    /// Evaluates this value against one row field, with the same policies
    /// as tree evaluation.
    pub fn evaluate(&self, system: &FilterSystem, target: Option<&Value>) -> bool {
        system.evaluate(&self.field, &self.operator, target, &self.value)
    }

    /// Converts into a tree condition for this value's field.
    pub fn to_condition(&self) -> FilterCondition {
        FilterCondition::new(&self.field.id, &self.operator, self.value.clone())
    }

    /// Resets operator and value to the field's defaults.
    pub fn reset(&mut self) {
        let fresh = SingleFieldValue::new(self.field.clone());
        self.operator = fresh.operator;
        self.value = fresh.value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterFieldConfig;

    fn field(id: &str, filter_type: &str) -> FilterFieldConfig {
        FilterFieldConfig::new(id, id, filter_type)
    }

    // ==================== Defaults ====================

    #[test]
    fn test_defaults_by_type() {
        let v = SingleFieldValue::new(field("title", "text"));
        assert_eq!(v.operator, "contains");
        assert_eq!(v.value, json!(""));

        let v = SingleFieldValue::new(field("status", "select"));
        assert_eq!(v.operator, "equals");
        assert_eq!(v.value, json!("__all__"));

        let v = SingleFieldValue::new(field("tags", "multiSelect"));
        assert_eq!(v.operator, "in");
        assert_eq!(v.value, json!([]));

        let v = SingleFieldValue::new(field("points", "number"));
        assert_eq!(v.operator, "equals");
        assert_eq!(v.value, Value::Null);
    }

    #[test]
    fn test_field_overrides_beat_type_defaults() {
        let cfg = field("title", "text")
            .with_default_operator("startsWith")
            .with_default_value(json!("draft"));
        let v = SingleFieldValue::new(cfg);
        assert_eq!(v.operator, "startsWith");
        assert_eq!(v.value, json!("draft"));
    }

    #[test]
    fn test_with_system_uses_registry_defaults() {
        let system = FilterSystem::default();
        let v = SingleFieldValue::with_system(field("due", "date"), &system);
        assert_eq!(v.operator, "equals");
        assert_eq!(v.value, Value::Null);
    }

    // ==================== set_operator ====================

    #[test]
    fn test_entering_between_resets_to_open_range() {
        let mut v = SingleFieldValue::new(field("points", "number"));
        v.set_value(json!(5));
        v.set_operator("between");
        assert_eq!(v.value, json!([null, null]));
    }

    #[test]
    fn test_leaving_between_resets_to_scalar_default() {
        let mut v = SingleFieldValue::new(field("points", "number"));
        v.set_operator("between");
        v.set_value(json!([1, 10]));
        v.set_operator("equals");
        assert_eq!(v.value, Value::Null);
    }

    #[test]
    fn test_between_on_text_leaves_value_alone() {
        let mut v = SingleFieldValue::new(field("title", "text"));
        v.set_value(json!("abc"));
        v.set_operator("between");
        assert_eq!(v.value, json!("abc"));
    }

    // ==================== is_empty ====================

    #[test]
    fn test_is_empty_sentinels() {
        let mut v = SingleFieldValue::new(field("status", "select"));
        assert!(v.is_empty()); // __all__ default

        v.set_value(json!("done"));
        assert!(!v.is_empty());

        v.set_value(Value::Null);
        assert!(v.is_empty());
        v.set_value(json!("  "));
        assert!(v.is_empty());
        v.set_value(json!([]));
        assert!(v.is_empty());
        v.set_value(json!(["a"]));
        assert!(!v.is_empty());
    }

    #[test]
    fn test_is_empty_presence_operators_always_constrain() {
        let mut v = SingleFieldValue::new(field("title", "text"));
        v.set_operator("isEmpty");
        assert!(!v.is_empty());
        v.set_operator("isNotEmpty");
        assert!(!v.is_empty());
    }

    #[test]
    fn test_is_empty_between_bounds() {
        let mut v = SingleFieldValue::new(field("points", "number"));
        v.set_operator("between");
        assert!(v.is_empty()); // [null, null]
        v.set_value(json!([null, 10]));
        assert!(!v.is_empty());
        v.set_value(json!([1, null]));
        assert!(!v.is_empty());
    }

    // ==================== evaluate / to_condition ====================

    #[test]
    fn test_evaluate_through_system() {
        let system = FilterSystem::default();
        let mut v = SingleFieldValue::new(field("status", "select"));

        // Sentinel matches everything, even absent fields.
        assert!(v.evaluate(&system, Some(&json!("open"))));
        assert!(v.evaluate(&system, None));

        v.set_value(json!("done"));
        assert!(v.evaluate(&system, Some(&json!("done"))));
        assert!(!v.evaluate(&system, Some(&json!("open"))));
        assert!(!v.evaluate(&system, None));
    }

    #[test]
    fn test_to_condition_carries_state() {
        let mut v = SingleFieldValue::new(field("points", "number"));
        v.set_operator("greaterThan");
        v.set_value(json!(3));
        let cond = v.to_condition();
        assert_eq!(cond.field, "points");
        assert_eq!(cond.operator, "greaterThan");
        assert_eq!(cond.value, json!(3));
        assert!(cond.active);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut v = SingleFieldValue::new(field("title", "text"));
        v.set_operator("equals");
        v.set_value(json!("x"));
        v.reset();
        assert_eq!(v.operator, "contains");
        assert_eq!(v.value, json!(""));
    }
}
