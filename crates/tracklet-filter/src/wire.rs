//! Serialization of filter trees into the backend query dialect.
//!
//! The output format nests field paths and keys comparisons by operator
//! token, Directus-style:
//!
//! ```json
//! {"_and": [{"status": {"_eq": "done"}}, {"author": {"name": {"_contains": "ada"}}}]}
//! ```
//!
//! Serialization is lossy by design: inactive nodes, unconstrained values,
//! and operators without a wire token are elided rather than rejected, so a
//! half-built tree still produces a valid (possibly empty) query.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::operator::{ignores_filter_value, is_unconstrained};
use crate::tree::{FilterCondition, FilterGroup, LogicOperator};

/// The default operator-id to wire-token table.
fn default_tokens() -> HashMap<String, String> {
    [
        ("equals", "_eq"),
        ("notEquals", "_neq"),
        ("contains", "_contains"),
        ("startsWith", "_starts_with"),
        ("endsWith", "_ends_with"),
        ("greaterThan", "_gt"),
        ("lessThan", "_lt"),
        ("greaterOrEqual", "_gte"),
        ("lessOrEqual", "_lte"),
        ("between", "_between"),
        ("in", "_in"),
        ("notIn", "_nin"),
        ("isEmpty", "_null"),
        ("isNotEmpty", "_nnull"),
        ("custom", "_custom"),
    ]
    .into_iter()
    .map(|(op, token)| (op.to_string(), token.to_string()))
    .collect()
}

type FieldTransform = Box<dyn Fn(&str) -> String + Send + Sync>;
type ValueTransform = Box<dyn Fn(&str, &Value) -> Value + Send + Sync>;

/// Knobs for the wire serializer.
pub struct WireOptions {
    /// Operator id to wire token. Operators absent here are skipped with a
    /// warning.
    pub operator_tokens: HashMap<String, String>,
    /// Separator splitting relation-path field ids into nested objects.
    pub relation_separator: String,
    field_transform: Option<FieldTransform>,
    value_transform: Option<ValueTransform>,
}

impl Default for WireOptions {
    fn default() -> Self {
        Self {
            operator_tokens: default_tokens(),
            relation_separator: ".".to_string(),
            field_transform: None,
            value_transform: None,
        }
    }
}

impl fmt::Debug for WireOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireOptions")
            .field("operator_tokens", &self.operator_tokens)
            .field("relation_separator", &self.relation_separator)
            .field("field_transform", &self.field_transform.is_some())
            .field("value_transform", &self.value_transform.is_some())
            .finish()
    }
}

impl WireOptions {
    /// Options with the default token table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one operator's wire token.
    pub fn with_token(mut self, operator: impl Into<String>, token: impl Into<String>) -> Self {
        self.operator_tokens.insert(operator.into(), token.into());
        self
    }

    /// Sets the relation-path separator.
    pub fn with_relation_separator(mut self, separator: impl Into<String>) -> Self {
        self.relation_separator = separator.into();
        self
    }

    /// Rewrites field ids on the way out, e.g. mapping UI names to column
    /// names.
    pub fn with_field_transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.field_transform = Some(Box::new(f));
        self
    }

    /// Rewrites values on the way out, keyed by field id.
    pub fn with_value_transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Value) -> Value + Send + Sync + 'static,
    {
        self.value_transform = Some(Box::new(f));
        self
    }
}

/// Serializes one condition into a wire rule.
///
/// Returns `None` for anything that should not reach the backend: inactive
/// conditions, unconstrained values, and operators without a token.
pub fn condition_rule(condition: &FilterCondition, options: &WireOptions) -> Option<Value> {
    if !condition.active {
        return None;
    }
    let Some(token) = options.operator_tokens.get(&condition.operator) else {
        warn!(
            operator = %condition.operator,
            field = %condition.field,
            "operator has no wire token, skipping condition"
        );
        return None;
    };

    // Presence operators serialize as `{_null: true}` / `{_nnull: true}`
    // no matter what value the condition carries.
    let value = if ignores_filter_value(&condition.operator) {
        json!(true)
    } else {
        if is_unconstrained(&condition.value) {
            return None;
        }
        match &options.value_transform {
            Some(transform) => transform(&condition.field, &condition.value),
            None => condition.value.clone(),
        }
    };

    let field = match &options.field_transform {
        Some(transform) => transform(&condition.field),
        None => condition.field.clone(),
    };

    // Wrap innermost-out so `author.name` becomes {author: {name: {...}}}.
    let mut rule = json!({ token.as_str(): value });
    for segment in field.rsplit(options.relation_separator.as_str()) {
        let mut wrapper = Map::new();
        wrapper.insert(segment.to_string(), rule);
        rule = Value::Object(wrapper);
    }
    Some(rule)
}

/// Serializes a group into a wire rule.
///
/// An inactive or effectively empty group serializes to `{}`. A group with
/// exactly one surviving rule unwraps to that rule without a logic
/// envelope.
pub fn group_rule(group: &FilterGroup, options: &WireOptions) -> Value {
    if !group.active {
        return json!({});
    }
    let mut rules: Vec<Value> = group
        .conditions
        .iter()
        .filter_map(|c| condition_rule(c, options))
        .collect();
    for sub in &group.groups {
        let rule = group_rule(sub, options);
        if rule.as_object().is_some_and(|o| !o.is_empty()) {
            rules.push(rule);
        }
    }
    match rules.len() {
        0 => json!({}),
        1 => rules.remove(0),
        _ => {
            let envelope = match group.logic_operator {
                LogicOperator::And => "_and",
                LogicOperator::Or => "_or",
            };
            json!({ envelope: rules })
        }
    }
}

/// A flat advanced filter: one logic operator over a condition list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedFilter {
    #[serde(default)]
    pub logic_operator: LogicOperator,
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,
}

/// The three shapes callers hand to [`build_filter`], in precedence order:
/// a full tree, a flat advanced filter, then a basic condition list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireFilterInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<FilterGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced: Option<AdvancedFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<Vec<FilterCondition>>,
}

/// Builds the wire filter from whichever input is present, trying the tree
/// first, then the advanced list, then the basic list. Returns `{}` when
/// nothing constrains the query.
pub fn build_filter(input: &WireFilterInput, options: &WireOptions) -> Value {
    if let Some(tree) = &input.tree {
        return group_rule(tree, options);
    }
    if let Some(advanced) = &input.advanced {
        let mut group = FilterGroup::new(advanced.logic_operator);
        group.conditions = advanced.conditions.clone();
        return group_rule(&group, options);
    }
    if let Some(basic) = &input.basic {
        let mut group = FilterGroup::new(LogicOperator::And);
        group.conditions = basic.clone();
        return group_rule(&group, options);
    }
    json!({})
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(field: &str, operator: &str, value: Value) -> FilterCondition {
        FilterCondition::new(field, operator, value)
    }

    fn group_with(conditions: Vec<FilterCondition>) -> FilterGroup {
        let mut group = FilterGroup::new(LogicOperator::And);
        group.conditions = conditions;
        group
    }

    // ==================== condition_rule ====================

    #[test]
    fn test_condition_rule_tokens() {
        let opts = WireOptions::default();
        assert_eq!(
            condition_rule(&cond("status", "equals", json!("done")), &opts),
            Some(json!({"status": {"_eq": "done"}}))
        );
        assert_eq!(
            condition_rule(&cond("title", "contains", json!("bug")), &opts),
            Some(json!({"title": {"_contains": "bug"}}))
        );
        assert_eq!(
            condition_rule(&cond("points", "between", json!([1, 5])), &opts),
            Some(json!({"points": {"_between": [1, 5]}}))
        );
    }

    #[test]
    fn test_inactive_condition_elided() {
        let opts = WireOptions::default();
        let mut c = cond("status", "equals", json!("done"));
        c.active = false;
        assert_eq!(condition_rule(&c, &opts), None);
    }

    #[test]
    fn test_unconstrained_value_elided() {
        let opts = WireOptions::default();
        assert_eq!(condition_rule(&cond("status", "equals", json!("__all__")), &opts), None);
        assert_eq!(condition_rule(&cond("status", "equals", Value::Null), &opts), None);
    }

    #[test]
    fn test_presence_operators_serialize_true() {
        let opts = WireOptions::default();
        // Value is ignored, even when null.
        assert_eq!(
            condition_rule(&cond("due", "isEmpty", Value::Null), &opts),
            Some(json!({"due": {"_null": true}}))
        );
        assert_eq!(
            condition_rule(&cond("due", "isNotEmpty", json!("whatever")), &opts),
            Some(json!({"due": {"_nnull": true}}))
        );
    }

    #[test]
    fn test_unknown_operator_skipped() {
        let opts = WireOptions::default();
        assert_eq!(condition_rule(&cond("x", "bogusOp", json!(1)), &opts), None);
    }

    #[test]
    fn test_relation_path_nests() {
        let opts = WireOptions::default();
        assert_eq!(
            condition_rule(&cond("author.name", "contains", json!("ada")), &opts),
            Some(json!({"author": {"name": {"_contains": "ada"}}}))
        );
        assert_eq!(
            condition_rule(&cond("a.b.c", "equals", json!(1)), &opts),
            Some(json!({"a": {"b": {"c": {"_eq": 1}}}}))
        );
    }

    #[test]
    fn test_custom_separator() {
        let opts = WireOptions::default().with_relation_separator("__");
        assert_eq!(
            condition_rule(&cond("author__name", "equals", json!("ada")), &opts),
            Some(json!({"author": {"name": {"_eq": "ada"}}}))
        );
    }

    #[test]
    fn test_field_and_value_transforms() {
        let opts = WireOptions::default()
            .with_field_transform(|f| format!("t_{f}"))
            .with_value_transform(|field, v| {
                if field == "status" {
                    json!(format!("st:{}", v.as_str().unwrap_or_default()))
                } else {
                    v.clone()
                }
            });
        assert_eq!(
            condition_rule(&cond("status", "equals", json!("done")), &opts),
            Some(json!({"t_status": {"_eq": "st:done"}}))
        );
    }

    #[test]
    fn test_token_override() {
        let opts = WireOptions::default().with_token("equals", "$eq");
        assert_eq!(
            condition_rule(&cond("status", "equals", json!("done")), &opts),
            Some(json!({"status": {"$eq": "done"}}))
        );
    }

    // ==================== group_rule ====================

    #[test]
    fn test_empty_group_serializes_to_empty_object() {
        let opts = WireOptions::default();
        assert_eq!(group_rule(&FilterGroup::new(LogicOperator::And), &opts), json!({}));
    }

    #[test]
    fn test_single_rule_unwraps() {
        let opts = WireOptions::default();
        let group = group_with(vec![cond("status", "equals", json!("done"))]);
        assert_eq!(group_rule(&group, &opts), json!({"status": {"_eq": "done"}}));
    }

    #[test]
    fn test_multiple_rules_get_logic_envelope() {
        let opts = WireOptions::default();
        let mut group = group_with(vec![
            cond("status", "equals", json!("done")),
            cond("points", "greaterThan", json!(3)),
        ]);
        assert_eq!(
            group_rule(&group, &opts),
            json!({"_and": [
                {"status": {"_eq": "done"}},
                {"points": {"_gt": 3}},
            ]})
        );

        group.logic_operator = LogicOperator::Or;
        assert_eq!(
            group_rule(&group, &opts),
            json!({"_or": [
                {"status": {"_eq": "done"}},
                {"points": {"_gt": 3}},
            ]})
        );
    }

    #[test]
    fn test_envelope_collapses_when_elision_leaves_one_rule() {
        let opts = WireOptions::default();
        let mut inactive = cond("points", "greaterThan", json!(3));
        inactive.active = false;
        let group = group_with(vec![cond("status", "equals", json!("done")), inactive]);
        // Two conditions in the tree, one on the wire: no envelope.
        assert_eq!(group_rule(&group, &opts), json!({"status": {"_eq": "done"}}));
    }

    #[test]
    fn test_inactive_group_serializes_empty() {
        let opts = WireOptions::default();
        let mut group = group_with(vec![cond("status", "equals", json!("done"))]);
        group.active = false;
        assert_eq!(group_rule(&group, &opts), json!({}));
    }

    #[test]
    fn test_empty_subgroup_elided() {
        let opts = WireOptions::default();
        let mut group = group_with(vec![cond("status", "equals", json!("done"))]);
        group.groups.push(FilterGroup::new(LogicOperator::Or));
        // The empty subgroup contributes nothing, so a single rule remains.
        assert_eq!(group_rule(&group, &opts), json!({"status": {"_eq": "done"}}));
    }

    #[test]
    fn test_nested_groups() {
        let opts = WireOptions::default();
        let mut sub = FilterGroup::new(LogicOperator::Or);
        sub.conditions = vec![
            cond("points", "greaterThan", json!(8)),
            cond("title", "contains", json!("urgent")),
        ];
        let mut group = group_with(vec![cond("status", "equals", json!("done"))]);
        group.groups.push(sub);
        assert_eq!(
            group_rule(&group, &opts),
            json!({"_and": [
                {"status": {"_eq": "done"}},
                {"_or": [
                    {"points": {"_gt": 8}},
                    {"title": {"_contains": "urgent"}},
                ]},
            ]})
        );
    }

    // ==================== build_filter ====================

    #[test]
    fn test_build_filter_precedence() {
        let opts = WireOptions::default();
        let input = WireFilterInput {
            tree: Some(group_with(vec![cond("a", "equals", json!(1))])),
            advanced: Some(AdvancedFilter {
                logic_operator: LogicOperator::Or,
                conditions: vec![cond("b", "equals", json!(2))],
            }),
            basic: Some(vec![cond("c", "equals", json!(3))]),
        };
        assert_eq!(build_filter(&input, &opts), json!({"a": {"_eq": 1}}));

        let input = WireFilterInput { tree: None, ..input };
        assert_eq!(build_filter(&input, &opts), json!({"b": {"_eq": 2}}));

        let input = WireFilterInput { advanced: None, ..input };
        assert_eq!(build_filter(&input, &opts), json!({"c": {"_eq": 3}}));
    }

    #[test]
    fn test_build_filter_empty_input() {
        let opts = WireOptions::default();
        assert_eq!(build_filter(&WireFilterInput::default(), &opts), json!({}));
    }

    #[test]
    fn test_basic_list_combines_with_and() {
        let opts = WireOptions::default();
        let input = WireFilterInput {
            basic: Some(vec![
                cond("status", "equals", json!("done")),
                cond("points", "lessOrEqual", json!(5)),
            ]),
            ..Default::default()
        };
        assert_eq!(
            build_filter(&input, &opts),
            json!({"_and": [
                {"status": {"_eq": "done"}},
                {"points": {"_lte": 5}},
            ]})
        );
    }
}
