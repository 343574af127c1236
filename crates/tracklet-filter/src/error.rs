//! Error types for configuration validation.
//!
//! Runtime evaluation and serialization never fail; data-shape problems are
//! resolved fail-soft (see the crate docs). The only fallible surface is the
//! opt-in eager validation of a [`FilterConfiguration`], which rejects
//! misconfiguration at load time instead of letting it degrade filtering
//! silently.
//!
//! [`FilterConfiguration`]: crate::config::FilterConfiguration

use thiserror::Error;

/// A specialized Result type for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur when validating a filter configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A field config references a filter type that is not registered.
    #[error("field '{field}' references unknown filter type: {filter_type}")]
    UnknownFilterType {
        /// The field whose config is invalid.
        field: String,
        /// The unregistered filter type id.
        filter_type: String,
    },

    /// A field config or type definition references an unregistered operator.
    #[error("'{owner}' references unknown operator: {operator}")]
    UnknownOperator {
        /// The field or filter type owning the reference.
        owner: String,
        /// The unregistered operator id.
        operator: String,
    },

    /// A filter type's or field's default operator is not in its effective
    /// operator list.
    #[error("'{owner}' has default operator '{operator}' outside its operator list")]
    DefaultOperatorNotApplicable {
        /// The filter type or field owning the default.
        owner: String,
        /// The default operator id.
        operator: String,
    },

    /// Two field configs share the same id.
    #[error("duplicate field id: {field}")]
    DuplicateField {
        /// The duplicated field id.
        field: String,
    },
}

impl ConfigError {
    /// Creates an unknown filter type error.
    pub fn unknown_filter_type(field: impl Into<String>, filter_type: impl Into<String>) -> Self {
        ConfigError::UnknownFilterType {
            field: field.into(),
            filter_type: filter_type.into(),
        }
    }

    /// Creates an unknown operator error.
    pub fn unknown_operator(owner: impl Into<String>, operator: impl Into<String>) -> Self {
        ConfigError::UnknownOperator {
            owner: owner.into(),
            operator: operator.into(),
        }
    }

    /// Creates a default-operator-not-applicable error.
    pub fn default_operator_not_applicable(
        owner: impl Into<String>,
        operator: impl Into<String>,
    ) -> Self {
        ConfigError::DefaultOperatorNotApplicable {
            owner: owner.into(),
            operator: operator.into(),
        }
    }

    /// Creates a duplicate field error.
    pub fn duplicate_field(field: impl Into<String>) -> Self {
        ConfigError::DuplicateField {
            field: field.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display_unknown_filter_type() {
        let err = ConfigError::unknown_filter_type("status", "fancy");
        assert_eq!(
            format!("{}", err),
            "field 'status' references unknown filter type: fancy"
        );
    }

    #[test]
    fn test_config_error_display_unknown_operator() {
        let err = ConfigError::unknown_operator("status", "sounds_like");
        assert_eq!(
            format!("{}", err),
            "'status' references unknown operator: sounds_like"
        );
    }

    #[test]
    fn test_config_error_display_default_operator() {
        let err = ConfigError::default_operator_not_applicable("text", "between");
        let msg = format!("{}", err);
        assert!(msg.contains("text"));
        assert!(msg.contains("between"));
    }

    #[test]
    fn test_config_error_display_duplicate_field() {
        let err = ConfigError::duplicate_field("status");
        assert_eq!(format!("{}", err), "duplicate field id: status");
    }

    #[test]
    fn test_config_error_implements_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(ConfigError::duplicate_field("assignee"));
        assert!(err.to_string().contains("assignee"));
    }
}
