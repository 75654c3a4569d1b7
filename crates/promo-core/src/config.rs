//! # Configuration
//!
//! Wire shapes for rules and discounts as they are stored by the admin
//! tooling, and their validating conversion into [`Rule`] and
//! [`PromotionDiscount`]. Catalogs load from TOML or JSON.
//!
//! ```toml
//! [[discounts]]
//! id = "summer-10"
//! scope = "cart"
//! type = "percentage"
//! value = 10.0
//! maxValue = 25.0
//! considerAdvancedRules = true
//! discountRules = [{ type = "cartVolume", operator = "lte", amount = 2.0 }]
//! discountPrices = [{ currencyId = "USD", value = 12.0 }]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::discount::{DiscountKind, DiscountScope, PromotionDiscount, StrategyKeys};
use crate::error::{DiscountError, DiscountResult, RuleError, RuleResult};
use crate::operator::Operator;
use crate::rule::{
    CartVolumeRule, CartWeightRule, LineItemAmount, LineItemListPriceRule,
    LineItemPurchasePriceRule, LineItemTaxRateRule, LineItemTotalPriceRule, LineItemUnitPriceRule,
    Rule,
};

/// Rule as configured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    /// Rule name, e.g. `cartVolume`
    #[serde(rename = "type")]
    pub rule_type: String,

    /// Operator string (`eq`, `neq`, `gt`, `gte`, `lt`, `lte`)
    pub operator: String,

    /// Threshold
    #[serde(default)]
    pub amount: Option<f64>,

    /// Purchase price rules: compare net instead of gross
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_net: Option<bool>,
}

impl RuleConfig {
    pub fn new(rule_type: impl Into<String>, operator: Operator, amount: Option<f64>) -> Self {
        Self {
            rule_type: rule_type.into(),
            operator: operator.to_string(),
            amount,
            is_net: None,
        }
    }
}

impl TryFrom<&RuleConfig> for Rule {
    type Error = RuleError;

    fn try_from(config: &RuleConfig) -> RuleResult<Self> {
        let operator: Operator =
            config
                .operator
                .parse()
                .map_err(|_| RuleError::UnsupportedOperator {
                    rule: config.rule_type.clone(),
                    operator: config.operator.clone(),
                })?;
        let amount = config.amount;

        let rule = match config.rule_type.as_str() {
            LineItemPurchasePriceRule::NAME => Rule::LineItemPurchasePrice(
                LineItemPurchasePriceRule::new(operator, amount, config.is_net.unwrap_or(true)),
            ),
            LineItemUnitPriceRule::NAME => {
                Rule::LineItemUnitPrice(LineItemUnitPriceRule::new(operator, amount))
            }
            LineItemTotalPriceRule::NAME => {
                Rule::LineItemTotalPrice(LineItemTotalPriceRule::new(operator, amount))
            }
            LineItemListPriceRule::NAME => {
                Rule::LineItemListPrice(LineItemListPriceRule::new(operator, amount))
            }
            LineItemTaxRateRule::NAME => {
                Rule::LineItemTaxRate(LineItemTaxRateRule::new(operator, amount))
            }
            CartVolumeRule::NAME => Rule::CartVolume(CartVolumeRule::new(operator, amount)),
            CartWeightRule::NAME => Rule::CartWeight(CartWeightRule::new(operator, amount)),
            other => return Err(RuleError::UnknownRule(other.to_string())),
        };

        rule.validate()?;
        Ok(rule)
    }
}

/// Currency override entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountPriceConfig {
    pub currency_id: String,
    pub value: f64,
}

/// Discount as configured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountConfig {
    /// Optional; [`DiscountCatalog::build`] falls back to the entry position
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion_id: Option<String>,

    /// `cart`, `delivery`, `set` or `setgroup-<id>`
    pub scope: String,

    /// `percentage`, `absolute`, `fixed_unit` or `fixed`
    #[serde(rename = "type")]
    pub kind: String,

    pub value: f64,

    #[serde(default)]
    pub max_value: Option<f64>,

    #[serde(default)]
    pub consider_advanced_rules: bool,

    #[serde(default)]
    pub discount_rules: Vec<RuleConfig>,

    #[serde(default)]
    pub discount_prices: Vec<DiscountPriceConfig>,

    #[serde(default)]
    pub sorter_key: Option<String>,

    #[serde(default)]
    pub applier_key: Option<String>,

    #[serde(default)]
    pub usage_key: Option<String>,

    #[serde(default)]
    pub picker_key: Option<String>,
}

impl DiscountConfig {
    /// Configured id, or one derived from the catalog position `index`
    pub fn id_at(&self, index: usize) -> String {
        if self.id.is_empty() {
            format!("discount-{}", index + 1)
        } else {
            self.id.clone()
        }
    }
}

impl TryFrom<&DiscountConfig> for PromotionDiscount {
    type Error = DiscountError;

    fn try_from(config: &DiscountConfig) -> DiscountResult<Self> {
        let id = config.id.clone();
        let invalid = |field: &'static str, reason: String| DiscountError::InvalidValue {
            discount_id: id.clone(),
            field,
            reason,
        };

        let scope: DiscountScope = config.scope.parse()?;
        let kind: DiscountKind = config
            .kind
            .parse()
            .map_err(|_| invalid("type", format!("unknown discount type `{}`", config.kind)))?;

        // overrides replace `value` and share its bounds
        let check_value = |field: &'static str, value: f64| -> DiscountResult<()> {
            check_amount(value).map_err(|reason| invalid(field, reason))?;
            if kind == DiscountKind::Percentage && value > 100.0 {
                return Err(invalid(field, format!("{value} exceeds 100 percent")));
            }
            Ok(())
        };

        check_value("value", config.value)?;

        if let Some(max_value) = config.max_value {
            check_amount(max_value).map_err(|reason| invalid("maxValue", reason))?;
        }

        let mut discount_prices = HashMap::with_capacity(config.discount_prices.len());
        for price in &config.discount_prices {
            check_value("discountPrices", price.value)?;
            if discount_prices
                .insert(price.currency_id.clone(), price.value)
                .is_some()
            {
                return Err(invalid(
                    "discountPrices",
                    format!("duplicate override for currency {}", price.currency_id),
                ));
            }
        }

        let discount_rules = config
            .discount_rules
            .iter()
            .map(Rule::try_from)
            .collect::<RuleResult<Vec<_>>>()
            .map_err(|source| DiscountError::InvalidRule {
                discount_id: id.clone(),
                source,
            })?;

        let strategy_keys = StrategyKeys {
            sorter: strategy_key(&id, "sorterKey", &config.sorter_key),
            applier: strategy_key(&id, "applierKey", &config.applier_key),
            usage: strategy_key(&id, "usageKey", &config.usage_key),
            picker: strategy_key(&id, "pickerKey", &config.picker_key),
        };

        Ok(PromotionDiscount {
            id: id.clone(),
            promotion_id: config.promotion_id.clone(),
            scope,
            kind,
            value: config.value,
            max_value: config.max_value,
            consider_advanced_rules: config.consider_advanced_rules,
            discount_rules,
            discount_prices,
            strategy_keys,
        })
    }
}

/// Finite and not negative
fn check_amount(value: f64) -> Result<(), String> {
    if !value.is_finite() {
        Err(format!("{value} is not a finite number"))
    } else if value < 0.0 {
        Err(format!("{value} is negative"))
    } else {
        Ok(())
    }
}

/// An empty key means "not configured"
fn strategy_key(discount_id: &str, field: &str, key: &Option<String>) -> Option<String> {
    match key.as_deref() {
        Some("") => {
            debug!(discount_id, field, "empty strategy key treated as unset");
            None
        }
        other => other.map(str::to_string),
    }
}

/// A set of configured discounts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscountCatalog {
    #[serde(default)]
    pub discounts: Vec<DiscountConfig>,
}

impl DiscountCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            discounts: Vec::new(),
        }
    }

    /// Add a discount config
    pub fn add(&mut self, discount: DiscountConfig) {
        self.discounts.push(discount);
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> DiscountResult<Self> {
        toml::from_str(toml_str).map_err(|e| DiscountError::Parse(e.to_string()))
    }

    /// Load catalog from JSON string
    pub fn from_json(json_str: &str) -> DiscountResult<Self> {
        serde_json::from_str(json_str).map_err(|e| DiscountError::Parse(e.to_string()))
    }

    /// Find a discount config by id
    pub fn get(&self, id: &str) -> Option<&DiscountConfig> {
        self.discounts.iter().find(|d| d.id == id)
    }

    /// Validate every entry. Each entry is converted independently, so one
    /// invalid discount does not hide the others. Entries without an id get
    /// `discount-<position>`, counting from 1.
    pub fn build(&self) -> Vec<DiscountResult<PromotionDiscount>> {
        self.discounts
            .iter()
            .enumerate()
            .map(|(index, config)| {
                if config.id.is_empty() {
                    let mut config = config.clone();
                    config.id = config.id_at(index);
                    PromotionDiscount::try_from(&config)
                } else {
                    PromotionDiscount::try_from(config)
                }
            })
            .collect()
    }

    /// Number of configured discounts
    pub fn len(&self) -> usize {
        self.discounts.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.discounts.is_empty()
    }
}
