//! The operator registry: named evaluator predicates plus display labels.
//!
//! Every operator is a pure function `(target, filter_value, field_config) ->
//! bool` registered under a string id. The built-ins cover the standard
//! comparison vocabulary; callers extend or override them by id through
//! [`OperatorRegistry::merge`].
//!
//! # Built-in semantics
//!
//! - `equals` / `notEquals` — boolean exact match, numeric match by
//!   coercion, else case-insensitive string comparison
//! - `contains` / `startsWith` / `endsWith` — case-insensitive substring
//!   tests on the string coercion of both sides
//! - `greaterThan` / `lessThan` / `greaterOrEqual` / `lessOrEqual` — numeric
//!   comparison, or date comparison when the field's type is `date` (the
//!   branch follows the field type, never the value shape)
//! - `between` — `[min, max]`; a `null` bound is open on that side, so
//!   `[null, null]` matches everything
//! - `in` / `notIn` — case-insensitive membership; `in([])` is always false,
//!   `notIn([])` is always true
//! - `isEmpty` / `isNotEmpty` — target is empty if null, blank after trim,
//!   or a zero-length array; exact complements of each other

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::config::FilterFieldConfig;

/// The reserved value meaning "this condition imposes no constraint".
///
/// Recognized engine-wide and never serialized to the wire.
pub const SENTINEL_ALL: &str = "__all__";

/// Returns true if a filter value imposes no constraint: the `"__all__"`
/// sentinel or JSON null.
pub fn is_unconstrained(value: &Value) -> bool {
    value.is_null() || value.as_str() == Some(SENTINEL_ALL)
}

/// Returns true if the operator carries its own emptiness semantics and
/// therefore ignores the filter value entirely.
pub fn ignores_filter_value(operator: &str) -> bool {
    operator == "isEmpty" || operator == "isNotEmpty"
}

/// The evaluator contract: compare a record's field value against a filter
/// value, with the field config (and its context bag) available.
pub type EvaluatorFn = Arc<dyn Fn(&Value, &Value, &FilterFieldConfig) -> bool + Send + Sync>;

/// A named, pure predicate comparing a target value against a filter value.
#[derive(Clone)]
pub struct Operator {
    /// Registry id.
    pub id: String,
    /// Display label for UI pickers.
    pub label: String,
    evaluator: EvaluatorFn,
}

impl Operator {
    /// Creates an operator from a closure.
    pub fn new<F>(id: impl Into<String>, label: impl Into<String>, evaluator: F) -> Self
    where
        F: Fn(&Value, &Value, &FilterFieldConfig) -> bool + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            label: label.into(),
            evaluator: Arc::new(evaluator),
        }
    }

    /// Runs the evaluator.
    pub fn evaluate(&self, target: &Value, filter_value: &Value, field: &FilterFieldConfig) -> bool {
        (self.evaluator)(target, filter_value, field)
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A `{value, label}` pair for operator pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorOption {
    /// The operator id.
    pub value: String,
    /// The display label.
    pub label: String,
}

/// A registration request: override or extend an operator by id.
///
/// When `evaluator` is `None` and an operator with the same id already
/// exists, the prior evaluator is inherited and only the label changes.
#[derive(Clone)]
pub struct OperatorSpec {
    /// Target operator id.
    pub id: String,
    /// New display label.
    pub label: String,
    /// New evaluator, or `None` to inherit the existing one.
    pub evaluator: Option<EvaluatorFn>,
}

impl OperatorSpec {
    /// A label-only registration (inherits the existing evaluator).
    pub fn relabel(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            evaluator: None,
        }
    }

    /// A full registration with an evaluator.
    pub fn with_evaluator<F>(id: impl Into<String>, label: impl Into<String>, evaluator: F) -> Self
    where
        F: Fn(&Value, &Value, &FilterFieldConfig) -> bool + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            label: label.into(),
            evaluator: Some(Arc::new(evaluator)),
        }
    }
}

/// String-keyed registry of operators.
#[derive(Clone, Default)]
pub struct OperatorRegistry {
    operators: HashMap<String, Operator>,
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.operators.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("OperatorRegistry").field("operators", &ids).finish()
    }
}

impl OperatorRegistry {
    /// A registry with no operators.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding all built-in operators.
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        for op in builtin_operators() {
            registry.register(op);
        }
        registry
    }

    /// Registers an operator, replacing any existing one with the same id.
    pub fn register(&mut self, operator: Operator) {
        self.operators.insert(operator.id.clone(), operator);
    }

    /// Merges a registration request: a spec without an evaluator inherits
    /// the evaluator already registered under its id.
    ///
    /// A spec with neither its own evaluator nor a prior registration is
    /// installed fail-open (matches everything) so a misconfigured custom
    /// operator never hides rows; the miss is logged when it happens.
    pub fn merge(&mut self, spec: OperatorSpec) {
        let evaluator = match spec.evaluator {
            Some(evaluator) => evaluator,
            None => match self.operators.get(&spec.id) {
                Some(existing) => existing.evaluator.clone(),
                None => {
                    let id = spec.id.clone();
                    Arc::new(move |_: &Value, _: &Value, _: &FilterFieldConfig| {
                        warn!(operator = %id, "operator registered without evaluator, matching all rows");
                        true
                    })
                }
            },
        };
        self.operators.insert(
            spec.id.clone(),
            Operator {
                id: spec.id,
                label: spec.label,
                evaluator,
            },
        );
    }

    /// Looks up an operator by id.
    pub fn get(&self, id: &str) -> Option<&Operator> {
        self.operators.get(id)
    }

    /// Returns true if an operator is registered under the id.
    pub fn contains(&self, id: &str) -> bool {
        self.operators.contains_key(id)
    }

    /// Resolves an id to a `{value, label}` picker option. Unregistered ids
    /// fall back to the id as the label so a custom list still renders.
    pub fn option_for(&self, id: &str) -> OperatorOption {
        match self.operators.get(id) {
            Some(op) => OperatorOption {
                value: op.id.clone(),
                label: op.label.clone(),
            },
            None => OperatorOption {
                value: id.to_string(),
                label: id.to_string(),
            },
        }
    }

    /// Number of registered operators.
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// Returns true if no operators are registered.
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

// ==================== Value coercion helpers ====================

/// Numeric coercion: JSON numbers and numeric strings.
fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Lowercased string coercion for scalar values.
fn as_norm_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_lowercase()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Date coercion: RFC 3339 datetimes or plain `YYYY-MM-DD` dates.
fn as_datetime(value: &Value) -> Option<NaiveDateTime> {
    let s = value.as_str()?.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Target emptiness: null, blank-after-trim string, or zero-length array.
fn is_empty_target(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Equality with coercion: boolean exact, numeric by coercion, else
/// case-insensitive string comparison, else structural equality.
fn loose_equals(target: &Value, filter_value: &Value) -> bool {
    if let (Value::Bool(a), Value::Bool(b)) = (target, filter_value) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (as_f64(target), as_f64(filter_value)) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (as_norm_string(target), as_norm_string(filter_value)) {
        return a == b;
    }
    target == filter_value
}

/// True if the field compares as a date rather than a number.
fn is_date_field(field: &FilterFieldConfig) -> bool {
    field.filter_type == "date"
}

/// Ordered comparison: date-typed fields compare as dates, everything else
/// numerically. Uncomparable inputs never match.
fn ordered_compare<F>(target: &Value, filter_value: &Value, field: &FilterFieldConfig, pred: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    if is_date_field(field) {
        match (as_datetime(target), as_datetime(filter_value)) {
            (Some(a), Some(b)) => pred(a.cmp(&b)),
            _ => false,
        }
    } else {
        match (as_f64(target), as_f64(filter_value)) {
            (Some(a), Some(b)) => a.partial_cmp(&b).map(&pred).unwrap_or(false),
            _ => false,
        }
    }
}

/// `between` semantics: `[min, max]` with null bounds open on that side.
/// A malformed value is treated as unconstrained rather than hiding rows.
fn between(target: &Value, filter_value: &Value, field: &FilterFieldConfig) -> bool {
    let bounds = match filter_value.as_array() {
        Some(bounds) if bounds.len() == 2 => bounds,
        _ => {
            warn!(value = %filter_value, "malformed 'between' value, matching all rows");
            return true;
        }
    };
    let lower_ok = bounds[0].is_null()
        || ordered_compare(target, &bounds[0], field, |o| o != Ordering::Less);
    let upper_ok = bounds[1].is_null()
        || ordered_compare(target, &bounds[1], field, |o| o != Ordering::Greater);
    lower_ok && upper_ok
}

/// `in` membership: case-insensitive; array targets match when any element
/// is in the list. Returns `None` for a non-array filter value so both
/// polarities can treat it as unconstrained.
fn membership(target: &Value, filter_value: &Value) -> Option<bool> {
    let Some(list) = filter_value.as_array() else {
        warn!(value = %filter_value, "malformed 'in' value, matching all rows");
        return None;
    };
    Some(match target {
        Value::Array(elements) => elements
            .iter()
            .any(|element| list.iter().any(|candidate| loose_equals(element, candidate))),
        _ => list.iter().any(|candidate| loose_equals(target, candidate)),
    })
}

/// Case-insensitive substring tests.
fn string_test<F>(target: &Value, filter_value: &Value, test: F) -> bool
where
    F: Fn(&str, &str) -> bool,
{
    match (as_norm_string(target), as_norm_string(filter_value)) {
        (Some(t), Some(v)) => test(&t, &v),
        _ => false,
    }
}

/// The built-in operator set.
pub fn builtin_operators() -> Vec<Operator> {
    vec![
        Operator::new("equals", "Equals", |t, v, _| loose_equals(t, v)),
        Operator::new("notEquals", "Not equals", |t, v, _| !loose_equals(t, v)),
        Operator::new("contains", "Contains", |t, v, _| {
            string_test(t, v, |t, v| t.contains(v))
        }),
        Operator::new("startsWith", "Starts with", |t, v, _| {
            string_test(t, v, |t, v| t.starts_with(v))
        }),
        Operator::new("endsWith", "Ends with", |t, v, _| {
            string_test(t, v, |t, v| t.ends_with(v))
        }),
        Operator::new("greaterThan", "Greater than", |t, v, f| {
            ordered_compare(t, v, f, |o| o == Ordering::Greater)
        }),
        Operator::new("lessThan", "Less than", |t, v, f| {
            ordered_compare(t, v, f, |o| o == Ordering::Less)
        }),
        Operator::new("greaterOrEqual", "Greater or equal", |t, v, f| {
            ordered_compare(t, v, f, |o| o != Ordering::Less)
        }),
        Operator::new("lessOrEqual", "Less or equal", |t, v, f| {
            ordered_compare(t, v, f, |o| o != Ordering::Greater)
        }),
        Operator::new("between", "Between", between),
        Operator::new("in", "Is one of", |t, v, _| {
            membership(t, v).unwrap_or(true)
        }),
        Operator::new("notIn", "Is not one of", |t, v, _| {
            membership(t, v).map(|found| !found).unwrap_or(true)
        }),
        Operator::new("isEmpty", "Is empty", |t, _, _| is_empty_target(t)),
        Operator::new("isNotEmpty", "Is not empty", |t, _, _| !is_empty_target(t)),
    ]
}
