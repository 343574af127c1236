//! Filter configuration consumed from the surrounding application.
//!
//! A [`FilterConfiguration`] describes which fields are filterable, how they
//! behave, and how the filter UI should start out. It is plain serde data so
//! the host application can ship it from its own settings or CMS layer.
//!
//! The engine never rejects a configuration at runtime; bad references
//! degrade fail-soft during evaluation. [`FilterConfiguration::validate`]
//! offers the strict alternative: check every reference against the
//! registries once, at load time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::system::FilterSystem;
use crate::tree::LogicOperator;

/// One selectable option for a select/multi-select field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    /// The stored value.
    pub value: Value,
    /// The display label.
    pub label: String,
}

impl FieldOption {
    /// Creates an option.
    pub fn new(value: Value, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

/// The description of one filterable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterFieldConfig {
    /// Field id, referenced by conditions. May contain the relation
    /// separator (`author.name`) to filter through a related record.
    pub id: String,

    /// Display label.
    pub label: String,

    /// The filter type id this field resolves its operators through.
    pub filter_type: String,

    /// Options for select-like fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,

    /// When present, fully replaces the filter type's operator list for
    /// this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_operators: Option<Vec<String>>,

    /// Per-field default operator, overriding the filter type's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_operator: Option<String>,

    /// Per-field default value, overriding the filter type's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    /// Opaque bag threaded unchanged into every operator evaluator call
    /// (current-user id, date format, and the like).
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
}

impl FilterFieldConfig {
    /// Creates a field config with no overrides.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        filter_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            filter_type: filter_type.into(),
            options: Vec::new(),
            available_operators: None,
            default_operator: None,
            default_value: None,
            context: Value::Null,
        }
    }

    /// Replaces the filter type's operator list for this field.
    pub fn with_operators(mut self, operators: Vec<String>) -> Self {
        self.available_operators = Some(operators);
        self
    }

    /// Sets the per-field default operator.
    pub fn with_default_operator(mut self, operator: impl Into<String>) -> Self {
        self.default_operator = Some(operator.into());
        self
    }

    /// Sets the per-field default value.
    pub fn with_default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Sets the select options.
    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    /// Sets the evaluator context bag.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }
}

/// Which presentation the filter UI starts in.
///
/// Both modes are views over the same underlying tree: basic mode is the
/// root group's flat condition list, advanced mode is the full tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Flat single-level list of conditions under an AND root.
    #[default]
    Basic,
    /// Freely nested AND/OR tree.
    Advanced,
}

fn default_true() -> bool {
    true
}

/// The filter engine's configuration input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfiguration {
    /// The filterable fields.
    pub filters: Vec<FilterFieldConfig>,

    /// Logic operator for newly created groups.
    #[serde(default)]
    pub default_logic_operator: LogicOperator,

    /// Advisory condition limit. The engine does not enforce it; callers
    /// check it themselves before adding conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_conditions: Option<usize>,

    /// Whether the host UI offers the nested advanced mode.
    #[serde(default = "default_true")]
    pub enable_advanced_filter: bool,

    /// Which presentation the UI starts in.
    #[serde(default)]
    pub default_mode: FilterMode,

    /// Configuration-wide evaluator context. Fields without their own
    /// context inherit this one.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
}

impl Default for FilterConfiguration {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl FilterConfiguration {
    /// Creates a configuration with default flags.
    pub fn new(filters: Vec<FilterFieldConfig>) -> Self {
        Self {
            filters,
            default_logic_operator: LogicOperator::And,
            max_conditions: None,
            enable_advanced_filter: true,
            default_mode: FilterMode::Basic,
            context: Value::Null,
        }
    }

    /// Looks up a field config by id.
    pub fn field(&self, id: &str) -> Option<&FilterFieldConfig> {
        self.filters.iter().find(|f| f.id == id)
    }

    /// Checks every reference in this configuration against the system's
    /// registries.
    ///
    /// Validation is opt-in and strict where runtime evaluation is
    /// fail-soft: an unknown filter type, an unknown operator in a field's
    /// operator list or defaults, a default operator the field does not
    /// offer, or a duplicated field id is rejected here instead of degrading
    /// filtering later.
    pub fn validate(&self, system: &FilterSystem) -> ConfigResult<()> {
        let mut seen = std::collections::HashSet::new();
        for field in &self.filters {
            if !seen.insert(field.id.as_str()) {
                return Err(ConfigError::duplicate_field(&field.id));
            }
            if !system.filter_types().contains(&field.filter_type) {
                return Err(ConfigError::unknown_filter_type(
                    &field.id,
                    &field.filter_type,
                ));
            }
            if let Some(operators) = &field.available_operators {
                for op in operators {
                    if !system.operators().contains(op) {
                        return Err(ConfigError::unknown_operator(&field.id, op));
                    }
                }
            }
            if let Some(op) = &field.default_operator {
                if !system.operators().contains(op) {
                    return Err(ConfigError::unknown_operator(&field.id, op));
                }
                if !system.operator_ids_for_field(field).iter().any(|id| id == op) {
                    return Err(ConfigError::default_operator_not_applicable(&field.id, op));
                }
            }
        }
        system.validate_types()
    }
}
