//! Filter engine for ticket and project views.
//!
//! This crate builds, evaluates, and serializes arbitrarily nested boolean
//! filter trees over JSON rows, without server round-trips for local data.
//!
//! # Pieces
//!
//! - [`OperatorRegistry`] - named comparison predicates (`equals`,
//!   `contains`, `between`, ...) with pluggable custom operators
//! - [`FilterTypeRegistry`] - field kinds (`text`, `select`, `date`, ...)
//!   mapping to applicable operators and default values
//! - [`FilterSystem`] - both registries composed, with the field-level
//!   evaluation policies
//! - [`FilterCondition`] / [`FilterGroup`] - the serializable tree of
//!   AND/OR groups and leaf conditions
//! - [`FilterManager`] - a stateful controller over one tree: structural
//!   edits, local row evaluation, operator lookup
//! - [`SingleFieldValue`] - a standalone per-column `{operator, value}`
//!   pair for grid headers
//! - [`wire`] - serialization into the nested backend query dialect
//!   (`{"status": {"_eq": "done"}}`)
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tracklet_filter_rs::{
//!     ConditionUpdate, FilterConfiguration, FilterFieldConfig, FilterManager,
//! };
//! use tracklet_filter_rs::wire::WireOptions;
//!
//! let config = FilterConfiguration::new(vec![
//!     FilterFieldConfig::new("status", "Status", "select"),
//!     FilterFieldConfig::new("points", "Points", "number"),
//! ]);
//! let mut manager = FilterManager::new(config);
//!
//! let root = manager.root_id().to_string();
//! let cond = manager.add_condition(&root, "status").unwrap();
//! manager.update_condition(&cond.id, ConditionUpdate::new().value(json!("done")));
//!
//! assert!(manager.evaluate_row(&json!({"status": "done"})));
//! assert!(!manager.evaluate_row(&json!({"status": "open"})));
//!
//! let wire = manager.to_wire(&WireOptions::default());
//! assert_eq!(wire, json!({"status": {"_eq": "done"}}));
//! ```

mod config;
mod error;
mod field_value;
mod filter_type;
mod manager;
mod operator;
mod system;
mod tree;

pub mod prelude;
pub mod wire;

pub use config::{FieldOption, FilterConfiguration, FilterFieldConfig, FilterMode};
pub use error::{ConfigError, ConfigResult};
pub use field_value::SingleFieldValue;
pub use filter_type::{builtin_filter_types, FilterTypeDef, FilterTypeRegistry};
pub use manager::FilterManager;
pub use operator::{
    builtin_operators, ignores_filter_value, is_unconstrained, EvaluatorFn, Operator,
    OperatorOption, OperatorRegistry, OperatorSpec, SENTINEL_ALL,
};
pub use system::FilterSystem;
pub use tree::{ConditionUpdate, FilterCondition, FilterGroup, GroupUpdate, LogicOperator};
