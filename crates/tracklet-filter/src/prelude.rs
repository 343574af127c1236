//! Convenience re-exports for callers that want the whole surface at once.
//!
//! ```
//! use tracklet_filter_rs::prelude::*;
//! ```

pub use crate::config::{FieldOption, FilterConfiguration, FilterFieldConfig, FilterMode};
pub use crate::error::{ConfigError, ConfigResult};
pub use crate::field_value::SingleFieldValue;
pub use crate::filter_type::{FilterTypeDef, FilterTypeRegistry};
pub use crate::manager::FilterManager;
pub use crate::operator::{Operator, OperatorOption, OperatorRegistry, OperatorSpec, SENTINEL_ALL};
pub use crate::system::FilterSystem;
pub use crate::tree::{ConditionUpdate, FilterCondition, FilterGroup, GroupUpdate, LogicOperator};
pub use crate::wire::{build_filter, AdvancedFilter, WireFilterInput, WireOptions};
