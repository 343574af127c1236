//! The condition/group tree: the persistent data model for filters.
//!
//! A filter is a tree of [`FilterGroup`] nodes rooted at exactly one group.
//! Each group combines its child conditions and subgroups with a single
//! [`LogicOperator`]. Both node kinds carry an `active` flag so the UI can
//! disable a rule without losing it.
//!
//! The tree is plain serde data: the engine does not persist filters, callers
//! serialize a snapshot to their own storage and restore it later.
//!
//! Structural edits are functional. The helpers on [`FilterGroup`] locate a
//! node anywhere in the tree by id and return a rebuilt tree, cloning only
//! the path from the edited node up to the root; a lookup miss returns `None`
//! and leaves nothing half-edited.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// How a group combines its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicOperator {
    /// Every active child must match.
    #[default]
    And,
    /// At least one active child must match.
    Or,
}

impl std::fmt::Display for LogicOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicOperator::And => write!(f, "AND"),
            LogicOperator::Or => write!(f, "OR"),
        }
    }
}

fn default_active() -> bool {
    true
}

/// One leaf rule: a field, an operator, a value, and an active flag.
///
/// `field` should reference a known field config id; the engine tolerates
/// unknown fields at evaluation time rather than rejecting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Unique id within the owning tree.
    pub id: String,

    /// The field config id this condition filters on.
    pub field: String,

    /// The operator id, resolved through the operator registry.
    pub operator: String,

    /// The filter value. `null` and the `"__all__"` sentinel both mean
    /// "no constraint".
    #[serde(default)]
    pub value: Value,

    /// Inactive conditions are excluded from evaluation and serialization.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl FilterCondition {
    /// Creates an active condition with a generated id.
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            field: field.into(),
            operator: operator.into(),
            value,
            active: true,
        }
    }

    /// Creates an active condition with a caller-supplied id.
    pub fn with_id(
        id: impl Into<String>,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            id: id.into(),
            field: field.into(),
            operator: operator.into(),
            value,
            active: true,
        }
    }
}

/// A boolean AND/OR combination of child conditions and subgroups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    /// Unique id within the owning tree.
    pub id: String,

    /// How the active children are combined.
    #[serde(default)]
    pub logic_operator: LogicOperator,

    /// Child conditions, in insertion order.
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,

    /// Child subgroups, in insertion order.
    #[serde(default)]
    pub groups: Vec<FilterGroup>,

    /// Inactive groups are excluded from evaluation and serialization,
    /// along with everything beneath them.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl FilterGroup {
    /// Creates an empty active group with a generated id.
    pub fn new(logic_operator: LogicOperator) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            logic_operator,
            conditions: Vec::new(),
            groups: Vec::new(),
            active: true,
        }
    }

    /// Creates an empty active group with a caller-supplied id.
    pub fn with_id(id: impl Into<String>, logic_operator: LogicOperator) -> Self {
        Self {
            id: id.into(),
            logic_operator,
            conditions: Vec::new(),
            groups: Vec::new(),
            active: true,
        }
    }

    /// Returns true if the group has no children at all.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.groups.is_empty()
    }

    /// Total number of conditions in this subtree, active or not.
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
            + self
                .groups
                .iter()
                .map(FilterGroup::condition_count)
                .sum::<usize>()
    }

    /// Total number of groups in this subtree, including this one.
    pub fn group_count(&self) -> usize {
        1 + self
            .groups
            .iter()
            .map(FilterGroup::group_count)
            .sum::<usize>()
    }

    /// Number of active conditions, counting only through active groups.
    ///
    /// An inactive ancestor suppresses everything beneath it: an active
    /// condition inside an inactive subgroup is not counted.
    pub fn active_condition_count(&self) -> usize {
        if !self.active {
            return 0;
        }
        self.conditions.iter().filter(|c| c.active).count()
            + self
                .groups
                .iter()
                .map(FilterGroup::active_condition_count)
                .sum::<usize>()
    }

    /// Finds a group anywhere in this subtree by id.
    pub fn find_group(&self, id: &str) -> Option<&FilterGroup> {
        if self.id == id {
            return Some(self);
        }
        self.groups.iter().find_map(|g| g.find_group(id))
    }

    /// Finds a condition anywhere in this subtree by id.
    pub fn find_condition(&self, id: &str) -> Option<&FilterCondition> {
        self.conditions
            .iter()
            .find(|c| c.id == id)
            .or_else(|| self.groups.iter().find_map(|g| g.find_condition(id)))
    }

    /// Rebuilds the tree with the group `id` replaced by `f(group)`.
    ///
    /// Returns `None` when no group carries the id. Only the path from the
    /// edited group to the root is rebuilt; sibling branches are reused
    /// as-is.
    pub fn map_group<F>(&self, id: &str, f: F) -> Option<FilterGroup>
    where
        F: FnOnce(&FilterGroup) -> FilterGroup,
    {
        if self.id == id {
            return Some(f(self));
        }
        let pos = self.groups.iter().position(|g| g.find_group(id).is_some())?;
        let rebuilt = self.groups[pos].map_group(id, f)?;
        let mut next = self.clone();
        next.groups[pos] = rebuilt;
        Some(next)
    }

    /// Rebuilds the tree with the condition `id` replaced by `f(condition)`.
    ///
    /// Returns `None` when no condition carries the id.
    pub fn map_condition<F>(&self, id: &str, f: F) -> Option<FilterGroup>
    where
        F: FnOnce(&FilterCondition) -> FilterCondition,
    {
        if let Some(pos) = self.conditions.iter().position(|c| c.id == id) {
            let mut next = self.clone();
            next.conditions[pos] = f(&self.conditions[pos]);
            return Some(next);
        }
        let pos = self
            .groups
            .iter()
            .position(|g| g.find_condition(id).is_some())?;
        let rebuilt = self.groups[pos].map_condition(id, f)?;
        let mut next = self.clone();
        next.groups[pos] = rebuilt;
        Some(next)
    }

    /// Rebuilds the tree with the condition `id` removed.
    ///
    /// Returns `None` when no condition carries the id.
    pub fn remove_condition(&self, id: &str) -> Option<FilterGroup> {
        if self.conditions.iter().any(|c| c.id == id) {
            let mut next = self.clone();
            next.conditions.retain(|c| c.id != id);
            return Some(next);
        }
        let pos = self
            .groups
            .iter()
            .position(|g| g.find_condition(id).is_some())?;
        let rebuilt = self.groups[pos].remove_condition(id)?;
        let mut next = self.clone();
        next.groups[pos] = rebuilt;
        Some(next)
    }

    /// Rebuilds the tree with the subgroup `id` removed.
    ///
    /// Returns `None` when no *descendant* group carries the id. Removing
    /// the node this is called on is not expressible here; the manager
    /// treats removing the root as a no-op.
    pub fn remove_group(&self, id: &str) -> Option<FilterGroup> {
        if self.groups.iter().any(|g| g.id == id) {
            let mut next = self.clone();
            next.groups.retain(|g| g.id != id);
            return Some(next);
        }
        let pos = self
            .groups
            .iter()
            .position(|g| g.find_group(id).is_some())?;
        let rebuilt = self.groups[pos].remove_group(id)?;
        let mut next = self.clone();
        next.groups[pos] = rebuilt;
        Some(next)
    }
}

/// A partial update for a condition, applied by the manager.
///
/// Unset fields keep their current values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionUpdate {
    /// New field id, if changing.
    pub field: Option<String>,
    /// New operator id, if changing.
    pub operator: Option<String>,
    /// New filter value, if changing.
    pub value: Option<Value>,
    /// New active flag, if changing.
    pub active: Option<bool>,
}

impl ConditionUpdate {
    /// An empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the operator id.
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Sets the filter value.
    pub fn value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Sets the field id.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Sets the active flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Applies this update to a condition, producing the updated copy.
    pub fn apply(&self, condition: &FilterCondition) -> FilterCondition {
        FilterCondition {
            id: condition.id.clone(),
            field: self.field.clone().unwrap_or_else(|| condition.field.clone()),
            operator: self
                .operator
                .clone()
                .unwrap_or_else(|| condition.operator.clone()),
            value: self.value.clone().unwrap_or_else(|| condition.value.clone()),
            active: self.active.unwrap_or(condition.active),
        }
    }
}

/// A partial update for a group, applied by the manager.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupUpdate {
    /// New logic operator, if changing.
    pub logic_operator: Option<LogicOperator>,
    /// New active flag, if changing.
    pub active: Option<bool>,
}

impl GroupUpdate {
    /// An empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the logic operator.
    pub fn logic_operator(mut self, logic_operator: LogicOperator) -> Self {
        self.logic_operator = Some(logic_operator);
        self
    }

    /// Sets the active flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Applies this update to a group, keeping its children intact.
    pub fn apply(&self, group: &FilterGroup) -> FilterGroup {
        let mut next = group.clone();
        if let Some(op) = self.logic_operator {
            next.logic_operator = op;
        }
        if let Some(active) = self.active {
            next.active = active;
        }
        next
    }
}
