//! # Error Types
//!
//! Typed errors for rule matching and discount resolution.
//! Rule evaluation returns `RuleResult<T>`, discount resolution returns
//! `DiscountResult<T>`.

use thiserror::Error;

/// Errors raised while validating or matching a rule
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    /// Operator is unknown or outside the rule's supported set
    #[error("Unsupported operator `{operator}` for rule {rule}")]
    UnsupportedOperator { rule: String, operator: String },

    /// A value the rule needs in order to compare was not configured
    #[error("Missing required value `{field}` for rule {rule}")]
    MissingRequiredValue {
        rule: &'static str,
        field: &'static str,
    },

    /// A configured value cannot be used (NaN, infinite, ...)
    #[error("Invalid value for `{field}` in rule {rule}: {reason}")]
    InvalidValue {
        rule: String,
        field: &'static str,
        reason: String,
    },

    /// The configured rule type is not one this engine knows
    #[error("Unknown rule type: {0}")]
    UnknownRule(String),
}

/// Errors raised while validating or resolving a promotion discount
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscountError {
    /// A gating rule failed to evaluate
    #[error("Rule evaluation failed for discount {discount_id}: {source}")]
    Rule {
        discount_id: String,
        #[source]
        source: RuleError,
    },

    /// A gating rule could not be built from configuration
    #[error("Invalid rule in discount {discount_id}: {source}")]
    InvalidRule {
        discount_id: String,
        #[source]
        source: RuleError,
    },

    /// Scope string is neither a known scope nor a well-formed set group
    #[error("Invalid discount scope: {0}")]
    InvalidScope(String),

    /// Discount value, cap or currency override is unusable
    #[error("Invalid value for `{field}` in discount {discount_id}: {reason}")]
    InvalidValue {
        discount_id: String,
        field: &'static str,
        reason: String,
    },

    /// A sorter/applier/usage/picker key has no registered strategy
    #[error("Unknown {kind} strategy: {key}")]
    UnknownStrategy { kind: &'static str, key: String },

    /// Catalog text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DiscountError {
    /// Returns true if the error was raised while evaluating gating rules,
    /// as opposed to while validating configuration
    pub fn is_evaluation_error(&self) -> bool {
        matches!(self, DiscountError::Rule { .. })
    }

    /// Id of the discount the error belongs to, when known
    pub fn discount_id(&self) -> Option<&str> {
        match self {
            DiscountError::Rule { discount_id, .. }
            | DiscountError::InvalidRule { discount_id, .. }
            | DiscountError::InvalidValue { discount_id, .. } => Some(discount_id),
            _ => None,
        }
    }
}

/// Result type alias for rule operations
pub type RuleResult<T> = Result<T, RuleError>;

/// Result type alias for discount operations
pub type DiscountResult<T> = Result<T, DiscountError>;
