//! The filter manager: a stateful controller owning one condition/group
//! tree.
//!
//! The manager wires a [`FilterConfiguration`] and a [`FilterSystem`] to a
//! single root [`FilterGroup`] and exposes the structural mutators, local
//! row evaluation, and per-field operator lookup the surrounding UI needs.
//!
//! Every structural edit locates its target by id anywhere in the tree,
//! rebuilds the path from that node to the root, and swaps the root
//! atomically. Snapshots handed out through [`FilterManager::root`] stay
//! valid across later edits. Mutators signal "nothing happened" with
//! `None`/`false` instead of panicking or erroring.
//!
//! The flat "basic" filter list is not separate state: it is a depth-1 view
//! over the root group's direct conditions
//! ([`FilterManager::basic_conditions`]), so the basic and advanced
//! presentations can never drift apart.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{FilterConfiguration, FilterFieldConfig};
use crate::operator::OperatorOption;
use crate::system::FilterSystem;
use crate::tree::{ConditionUpdate, FilterCondition, FilterGroup, GroupUpdate, LogicOperator};
use crate::wire::{group_rule, WireOptions};

/// Separator for relation paths in field ids (`author.name`).
const RELATION_SEPARATOR: char = '.';

/// Resolves a field id against a row, descending nested objects when the id
/// is a relation path.
fn row_value<'a>(row: &'a Value, field: &str) -> Option<&'a Value> {
    if let Some(value) = row.get(field) {
        return Some(value);
    }
    if !field.contains(RELATION_SEPARATOR) {
        return None;
    }
    let mut current = row;
    for segment in field.split(RELATION_SEPARATOR) {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Stateful controller owning one filter tree.
///
/// A manager instance has one logical owner at a time (one active filter
/// session); share snapshots, not the manager.
#[derive(Debug, Clone)]
pub struct FilterManager {
    system: FilterSystem,
    config: FilterConfiguration,
    /// Field configs by id, with the configuration-wide context threaded
    /// into fields that have none of their own.
    fields: HashMap<String, FilterFieldConfig>,
    root: Arc<FilterGroup>,
}

impl FilterManager {
    /// Creates a manager with the built-in registries and a fresh empty
    /// root group.
    pub fn new(config: FilterConfiguration) -> Self {
        Self::with_system(config, FilterSystem::default())
    }

    /// Creates a manager with an explicit filter system.
    pub fn with_system(config: FilterConfiguration, system: FilterSystem) -> Self {
        let root = FilterGroup::new(config.default_logic_operator);
        Self::from_snapshot(config, system, root)
    }

    /// Restores a manager around a previously serialized tree snapshot.
    pub fn from_snapshot(
        config: FilterConfiguration,
        system: FilterSystem,
        root: FilterGroup,
    ) -> Self {
        let mut fields = HashMap::new();
        for field in &config.filters {
            let mut field = field.clone();
            if field.context.is_null() && !config.context.is_null() {
                field.context = config.context.clone();
            }
            fields.insert(field.id.clone(), field);
        }
        Self {
            system,
            config,
            fields,
            root: Arc::new(root),
        }
    }

    /// The current tree. The returned snapshot stays valid and internally
    /// consistent across later edits.
    pub fn root(&self) -> Arc<FilterGroup> {
        Arc::clone(&self.root)
    }

    /// The root group's id.
    pub fn root_id(&self) -> &str {
        &self.root.id
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &FilterConfiguration {
        &self.config
    }

    /// The composed registries.
    pub fn system(&self) -> &FilterSystem {
        &self.system
    }

    /// The flat "basic" view: the root group's direct conditions.
    pub fn basic_conditions(&self) -> &[FilterCondition] {
        &self.root.conditions
    }

    /// Creates a detached empty group, defaulting to the configured logic
    /// operator.
    pub fn create_empty_group(&self, logic_operator: Option<LogicOperator>) -> FilterGroup {
        FilterGroup::new(logic_operator.unwrap_or(self.config.default_logic_operator))
    }

    // ==================== Structural mutators ====================

    /// Appends a new condition for `field` to the named group, with the
    /// field's default operator and value.
    ///
    /// Returns `None`, without touching the tree, when the field is not a
    /// known field config or the group id does not exist.
    pub fn add_condition(&mut self, group_id: &str, field_id: &str) -> Option<FilterCondition> {
        let field = match self.fields.get(field_id) {
            Some(field) => field,
            None => {
                warn!(field = %field_id, "add_condition: unknown field");
                return None;
            }
        };
        let condition = FilterCondition::new(
            field_id,
            self.system.default_operator_for_field(field),
            self.system.default_value_for_field(field),
        );
        let added = condition.clone();
        let next = self.root.map_group(group_id, move |group| {
            let mut group = group.clone();
            group.conditions.push(condition);
            group
        })?;
        self.root = Arc::new(next);
        Some(added)
    }

    /// Applies a partial update to the condition with the given id,
    /// wherever it sits in the tree. Returns false when the id is unknown.
    pub fn update_condition(&mut self, condition_id: &str, update: ConditionUpdate) -> bool {
        match self.root.map_condition(condition_id, |c| update.apply(c)) {
            Some(next) => {
                self.root = Arc::new(next);
                true
            }
            None => false,
        }
    }

    /// Removes the condition with the given id. Returns false when the id
    /// is unknown.
    pub fn remove_condition(&mut self, condition_id: &str) -> bool {
        match self.root.remove_condition(condition_id) {
            Some(next) => {
                self.root = Arc::new(next);
                true
            }
            None => false,
        }
    }

    /// Appends a new empty subgroup under the named parent group.
    ///
    /// Returns `None` when the parent id does not exist.
    pub fn add_group(
        &mut self,
        parent_group_id: &str,
        logic_operator: Option<LogicOperator>,
    ) -> Option<FilterGroup> {
        let group = self.create_empty_group(logic_operator);
        let added = group.clone();
        let next = self.root.map_group(parent_group_id, move |parent| {
            let mut parent = parent.clone();
            parent.groups.push(group);
            parent
        })?;
        self.root = Arc::new(next);
        Some(added)
    }

    /// Applies a partial update to the group with the given id. Returns
    /// false when the id is unknown.
    pub fn update_group(&mut self, group_id: &str, update: GroupUpdate) -> bool {
        match self.root.map_group(group_id, |g| update.apply(g)) {
            Some(next) => {
                self.root = Arc::new(next);
                true
            }
            None => false,
        }
    }

    /// Removes the subgroup with the given id and everything beneath it.
    ///
    /// Removing the root group is always a no-op returning false.
    pub fn remove_group(&mut self, group_id: &str) -> bool {
        if group_id == self.root.id {
            return false;
        }
        match self.root.remove_group(group_id) {
            Some(next) => {
                self.root = Arc::new(next);
                true
            }
            None => false,
        }
    }

    /// Flips a condition's active flag. Returns false when the id is
    /// unknown.
    pub fn toggle_condition_active(&mut self, condition_id: &str) -> bool {
        match self.root.map_condition(condition_id, |c| {
            let mut c = c.clone();
            c.active = !c.active;
            c
        }) {
            Some(next) => {
                self.root = Arc::new(next);
                true
            }
            None => false,
        }
    }

    /// Flips a group's active flag. Returns false when the id is unknown.
    pub fn toggle_group_active(&mut self, group_id: &str) -> bool {
        match self.root.map_group(group_id, |g| {
            let mut g = g.clone();
            g.active = !g.active;
            g
        }) {
            Some(next) => {
                self.root = Arc::new(next);
                true
            }
            None => false,
        }
    }

    /// Replaces the tree with a single fresh empty root group.
    pub fn reset(&mut self) {
        self.root = Arc::new(FilterGroup::new(self.config.default_logic_operator));
    }

    // ==================== Evaluation ====================

    /// Evaluates the tree against one in-memory row.
    ///
    /// A group combines its *active* children with its logic operator;
    /// inactive children are excluded from the reduction, not treated as
    /// false. A group with zero active children matches everything: nothing
    /// there constrains the row. A condition whose field is absent from the
    /// row never matches; that asymmetry is intentional, an absent field is
    /// a data-dependent miss rather than an absent constraint.
    pub fn evaluate_row(&self, row: &Value) -> bool {
        if !self.root.active {
            return true;
        }
        self.evaluate_group(&self.root, row)
    }

    /// Filters a slice of rows, keeping those the tree matches.
    pub fn filter_rows<'a>(&self, rows: &'a [Value]) -> Vec<&'a Value> {
        rows.iter().filter(|row| self.evaluate_row(row)).collect()
    }

    fn evaluate_group(&self, group: &FilterGroup, row: &Value) -> bool {
        let condition_results = group
            .conditions
            .iter()
            .filter(|c| c.active)
            .map(|c| self.evaluate_condition(c, row));
        let group_results = group
            .groups
            .iter()
            .filter(|g| g.active)
            .map(|g| self.evaluate_group(g, row));
        let mut results = condition_results.chain(group_results).peekable();
        if results.peek().is_none() {
            // Vacuous truth: nothing here constrains the row.
            return true;
        }
        match group.logic_operator {
            LogicOperator::And => results.all(|matched| matched),
            LogicOperator::Or => results.any(|matched| matched),
        }
    }

    fn evaluate_condition(&self, condition: &FilterCondition, row: &Value) -> bool {
        let Some(field) = self.fields.get(&condition.field) else {
            warn!(field = %condition.field, "condition references unknown field, matching all rows");
            return true;
        };
        let target = row_value(row, &condition.field);
        if target.is_none() {
            debug!(field = %condition.field, "field absent from row");
        }
        self.system
            .evaluate(field, &condition.operator, target, &condition.value)
    }

    // ==================== Introspection ====================

    /// The `{value, label}` operator options for a field, honoring its
    /// `available_operators` override. Empty for unknown fields.
    pub fn operators_for_field(&self, field_id: &str) -> Vec<OperatorOption> {
        match self.fields.get(field_id) {
            Some(field) => self.system.operators_for_field(field),
            None => Vec::new(),
        }
    }

    /// Count of active conditions, counting only through active groups.
    pub fn active_conditions_count(&self) -> usize {
        self.root.active_condition_count()
    }

    /// Total number of conditions in the tree, active or not.
    pub fn condition_count(&self) -> usize {
        self.root.condition_count()
    }

    /// Total number of groups in the tree, including the root.
    pub fn group_count(&self) -> usize {
        self.root.group_count()
    }

    /// Returns true if the tree has no conditions and no subgroups.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    // ==================== Serialization ====================

    /// Serializes the current tree into the backend filter dialect.
    pub fn to_wire(&self, options: &WireOptions) -> Value {
        group_rule(&self.root, options)
    }
}
