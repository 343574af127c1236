//! The filter system: the single entry point composing the operator and
//! filter-type registries.
//!
//! The system resolves the *effective* operator set and defaults for a field
//! (per-field overrides first, then the field's type) and evaluates one
//! condition value against one target value with the engine's edge-case
//! policies:
//!
//! - a `"__all__"` or null filter value imposes no constraint (except for
//!   `isEmpty`/`isNotEmpty`, which ignore the filter value)
//! - an unknown operator id matches everything, with a warning, so a
//!   misconfigured filter never silently hides rows
//! - a missing target (the field is absent from the row) never matches;
//!   that is a data-dependent miss, not a misconfiguration

use serde_json::Value;
use tracing::warn;

use crate::config::FilterFieldConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::filter_type::{FilterTypeDef, FilterTypeRegistry};
use crate::operator::{
    ignores_filter_value, is_unconstrained, OperatorOption, OperatorRegistry, OperatorSpec,
};

/// Composes the operator and filter-type registries.
#[derive(Debug, Clone)]
pub struct FilterSystem {
    operators: OperatorRegistry,
    filter_types: FilterTypeRegistry,
}

impl Default for FilterSystem {
    fn default() -> Self {
        Self::new(
            OperatorRegistry::with_builtins(),
            FilterTypeRegistry::with_builtins(),
        )
    }
}

impl FilterSystem {
    /// Creates a system from explicit registries.
    pub fn new(operators: OperatorRegistry, filter_types: FilterTypeRegistry) -> Self {
        Self {
            operators,
            filter_types,
        }
    }

    /// Creates a system from the built-ins with caller overrides merged on
    /// top, keyed by id (later entries win).
    pub fn with_overrides(
        operator_overrides: Vec<OperatorSpec>,
        filter_type_overrides: Vec<FilterTypeDef>,
    ) -> Self {
        let mut operators = OperatorRegistry::with_builtins();
        for spec in operator_overrides {
            operators.merge(spec);
        }
        let mut filter_types = FilterTypeRegistry::with_builtins();
        for def in filter_type_overrides {
            filter_types.register(def);
        }
        Self::new(operators, filter_types)
    }

    /// The operator registry.
    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    /// The filter-type registry.
    pub fn filter_types(&self) -> &FilterTypeRegistry {
        &self.filter_types
    }

    /// The effective operator ids for a field: its `available_operators`
    /// override when present, else its filter type's list.
    pub fn operator_ids_for_field(&self, field: &FilterFieldConfig) -> Vec<String> {
        if let Some(operators) = &field.available_operators {
            return operators.clone();
        }
        self.filter_types
            .get(&field.filter_type)
            .map(|def| def.operators.clone())
            .unwrap_or_default()
    }

    /// The effective operators for a field as `{value, label}` picker
    /// options, resolved through the operator registry.
    pub fn operators_for_field(&self, field: &FilterFieldConfig) -> Vec<OperatorOption> {
        self.operator_ids_for_field(field)
            .iter()
            .map(|id| self.operators.option_for(id))
            .collect()
    }

    /// The operator a fresh condition on this field starts with.
    pub fn default_operator_for_field(&self, field: &FilterFieldConfig) -> String {
        if let Some(op) = &field.default_operator {
            return op.clone();
        }
        self.filter_types
            .get(&field.filter_type)
            .map(|def| def.default_operator.clone())
            .unwrap_or_else(|| "equals".to_string())
    }

    /// The value a fresh condition on this field starts with.
    pub fn default_value_for_field(&self, field: &FilterFieldConfig) -> Value {
        if let Some(value) = &field.default_value {
            return value.clone();
        }
        self.filter_types
            .get(&field.filter_type)
            .map(|def| def.default_value.clone())
            .unwrap_or(Value::Null)
    }

    /// Evaluates one condition against one target value.
    ///
    /// `target` is `None` when the field is absent from the row; that never
    /// matches. A no-constraint filter value matches everything before the
    /// target is even looked at, and an unknown operator matches everything
    /// with a warning.
    pub fn evaluate(
        &self,
        field: &FilterFieldConfig,
        operator_id: &str,
        target: Option<&Value>,
        filter_value: &Value,
    ) -> bool {
        if !ignores_filter_value(operator_id) && is_unconstrained(filter_value) {
            return true;
        }
        let Some(operator) = self.operators.get(operator_id) else {
            warn!(operator = %operator_id, field = %field.id, "unknown operator, matching all rows");
            return true;
        };
        let Some(target) = target else {
            return false;
        };
        operator.evaluate(target, filter_value, field)
    }

    /// Checks every registered filter type against the operator registry:
    /// its operator list must be registered and its default operator must be
    /// in its own list.
    pub fn validate_types(&self) -> ConfigResult<()> {
        for def in self.filter_types.iter() {
            for op in &def.operators {
                if !self.operators.contains(op) {
                    return Err(ConfigError::unknown_operator(&def.id, op));
                }
            }
            if !def.operators.contains(&def.default_operator) {
                return Err(ConfigError::default_operator_not_applicable(
                    &def.id,
                    &def.default_operator,
                ));
            }
        }
        Ok(())
    }
}
