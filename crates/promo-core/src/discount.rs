//! # Promotion Discounts
//!
//! Validated discount records: what a discount targets, how its value is
//! interpreted, per-currency overrides, an optional cap and optional gating
//! rules. Built from configuration (see [`crate::config`]) at the start of a
//! cart pass and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::cart::CurrencyId;
use crate::error::DiscountError;
use crate::rule::Rule;

/// Prefix of set-group scope strings
pub const SET_GROUP_PREFIX: &str = "setgroup-";

/// What a discount is applied against
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DiscountScope {
    /// The cart's goods
    Cart,
    /// Shipping costs
    Delivery,
    /// Every line item of the promotion's product set
    Set,
    /// The line items of one named set group
    SetGroup(String),
}

impl DiscountScope {
    pub fn is_set_group(&self) -> bool {
        matches!(self, DiscountScope::SetGroup(_))
    }

    /// Set-group id, or an empty string for every other scope
    pub fn group_id(&self) -> &str {
        match self {
            DiscountScope::SetGroup(id) => id,
            _ => "",
        }
    }
}

impl FromStr for DiscountScope {
    type Err = DiscountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cart" => Ok(DiscountScope::Cart),
            "delivery" => Ok(DiscountScope::Delivery),
            "set" => Ok(DiscountScope::Set),
            other => match other.strip_prefix(SET_GROUP_PREFIX) {
                Some(id) if !id.is_empty() => Ok(DiscountScope::SetGroup(id.to_string())),
                _ => Err(DiscountError::InvalidScope(other.to_string())),
            },
        }
    }
}

impl TryFrom<String> for DiscountScope {
    type Error = DiscountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for DiscountScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountScope::Cart => f.write_str("cart"),
            DiscountScope::Delivery => f.write_str("delivery"),
            DiscountScope::Set => f.write_str("set"),
            DiscountScope::SetGroup(id) => write!(f, "{SET_GROUP_PREFIX}{id}"),
        }
    }
}

impl From<DiscountScope> for String {
    fn from(scope: DiscountScope) -> Self {
        scope.to_string()
    }
}

/// How a discount's value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Percentage points of the targeted amount
    Percentage,
    /// Fixed amount off the targeted amount
    Absolute,
    /// Fixed price per unit
    FixedUnit,
    /// Fixed price for the whole target
    Fixed,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Absolute => "absolute",
            DiscountKind::FixedUnit => "fixed_unit",
            DiscountKind::Fixed => "fixed",
        }
    }
}

impl FromStr for DiscountKind {
    type Err = DiscountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountKind::Percentage),
            "absolute" => Ok(DiscountKind::Absolute),
            "fixed_unit" => Ok(DiscountKind::FixedUnit),
            "fixed" => Ok(DiscountKind::Fixed),
            other => Err(DiscountError::Parse(format!("unknown discount type `{other}`"))),
        }
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy keys of a discount. `None` means "use the default strategy".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyKeys {
    pub sorter: Option<String>,
    pub applier: Option<String>,
    pub usage: Option<String>,
    pub picker: Option<String>,
}

/// A validated promotion discount
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionDiscount {
    /// Discount id
    pub id: String,

    /// Owning promotion, if known
    pub promotion_id: Option<String>,

    /// Target of the discount
    pub scope: DiscountScope,

    /// Interpretation of `value`
    pub kind: DiscountKind,

    /// Base magnitude
    pub value: f64,

    /// Cap on the computed amount; only honoured for percentage discounts
    pub max_value: Option<f64>,

    /// Whether `discount_rules` and the strategy keys are consulted
    pub consider_advanced_rules: bool,

    /// Gating rules, combined with AND
    pub discount_rules: Vec<Rule>,

    /// Per-currency replacements for `value`
    pub discount_prices: HashMap<CurrencyId, f64>,

    /// Sorter/applier/usage/picker keys
    pub strategy_keys: StrategyKeys,
}

impl PromotionDiscount {
    /// Create a discount without rules, overrides or cap
    pub fn new(id: impl Into<String>, scope: DiscountScope, kind: DiscountKind, value: f64) -> Self {
        Self {
            id: id.into(),
            promotion_id: None,
            scope,
            kind,
            value,
            max_value: None,
            consider_advanced_rules: false,
            discount_rules: Vec::new(),
            discount_prices: HashMap::new(),
            strategy_keys: StrategyKeys::default(),
        }
    }

    /// Builder: set the cap
    pub fn with_max_value(mut self, max_value: f64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    /// Builder: add a currency override
    pub fn with_currency_price(mut self, currency_id: impl Into<CurrencyId>, value: f64) -> Self {
        self.discount_prices.insert(currency_id.into(), value);
        self
    }

    /// Builder: add a gating rule and enable advanced rules
    pub fn with_rule(mut self, rule: impl Into<Rule>) -> Self {
        self.consider_advanced_rules = true;
        self.discount_rules.push(rule.into());
        self
    }

    /// Builder: set strategy keys
    pub fn with_strategy_keys(mut self, keys: StrategyKeys) -> Self {
        self.strategy_keys = keys;
        self
    }

    /// Value for `currency_id`: the exact-match override if one exists, else `value`
    pub fn effective_value(&self, currency_id: &str) -> f64 {
        self.discount_prices
            .get(currency_id)
            .copied()
            .unwrap_or(self.value)
    }

    /// Returns true if a cap is in force
    pub fn is_capped(&self) -> bool {
        self.kind == DiscountKind::Percentage && self.max_value.is_some()
    }

    /// Returns true if gating rules must be evaluated
    pub fn has_gating_rules(&self) -> bool {
        self.consider_advanced_rules && !self.discount_rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_group_scope_parsing() {
        let scope: DiscountScope = "setgroup-abc123".parse().unwrap();
        assert!(scope.is_set_group());
        assert_eq!(scope.group_id(), "abc123");
        assert_eq!(scope.to_string(), "setgroup-abc123");

        let scope: DiscountScope = "cart".parse().unwrap();
        assert!(!scope.is_set_group());
        assert_eq!(scope.group_id(), "");
    }

    #[test]
    fn test_scope_parsing_rejects_malformed_strings() {
        assert_eq!(
            "setgroup-".parse::<DiscountScope>(),
            Err(DiscountError::InvalidScope("setgroup-".into()))
        );
        assert!("setgroup".parse::<DiscountScope>().is_err());
        assert!("Cart".parse::<DiscountScope>().is_err());
        assert_eq!("delivery".parse::<DiscountScope>(), Ok(DiscountScope::Delivery));
        assert_eq!("set".parse::<DiscountScope>(), Ok(DiscountScope::Set));
    }

    #[test]
    fn test_scope_serde_uses_wire_strings() {
        let scope: DiscountScope = serde_json::from_str("\"setgroup-g1\"").unwrap();
        assert_eq!(scope, DiscountScope::SetGroup("g1".into()));
        assert_eq!(serde_json::to_string(&scope).unwrap(), "\"setgroup-g1\"");
        assert!(serde_json::from_str::<DiscountScope>("\"shipping\"").is_err());
    }

    #[test]
    fn test_kind_wire_names() {
        let kind: DiscountKind = serde_json::from_str("\"fixed_unit\"").unwrap();
        assert_eq!(kind, DiscountKind::FixedUnit);
        assert_eq!("fixed".parse::<DiscountKind>(), Ok(DiscountKind::Fixed));
        assert!("percent".parse::<DiscountKind>().is_err());
        assert_eq!(DiscountKind::Percentage.to_string(), "percentage");
    }

    #[test]
    fn test_currency_override_precedence() {
        let discount = PromotionDiscount::new("d", DiscountScope::Cart, DiscountKind::Absolute, 10.0)
            .with_currency_price("USD", 8.0);

        assert_eq!(discount.effective_value("USD"), 8.0);
        assert_eq!(discount.effective_value("EUR"), 10.0);
        assert_eq!(discount.effective_value("usd"), 10.0);
    }

    #[test]
    fn test_cap_only_for_percentage() {
        let pct = PromotionDiscount::new("p", DiscountScope::Cart, DiscountKind::Percentage, 20.0)
            .with_max_value(15.0);
        let abs = PromotionDiscount::new("a", DiscountScope::Cart, DiscountKind::Absolute, 20.0)
            .with_max_value(15.0);

        assert!(pct.is_capped());
        assert!(!abs.is_capped());
    }
}
