//! # Rules
//!
//! The closed set of rule kinds the engine can evaluate. Each variant carries
//! its own operator and threshold, and knows how to aggregate over a cart:
//!
//! ```text
//! ┌──────────────────────────────┬─────────────────────────────────────────┐
//! │ line item rules              │ cart aggregate rules                    │
//! │  cartLineItemPurchasePrice   │  cartVolume                             │
//! │  cartLineItemUnitPrice       │  cartWeight                             │
//! │  cartLineItemTotalPrice      │                                         │
//! │  cartLineItemListPrice       │  SUM over delivery positions,           │
//! │  cartLineItemTaxRate         │  convert, compare once                  │
//! │                              │                                         │
//! │  ANY good satisfies          │  line item scope: no match              │
//! └──────────────────────────────┴─────────────────────────────────────────┘
//! ```
//!
//! Rules are immutable; the same value can be matched any number of times,
//! from any thread, and always gives the same answer for the same scope.

pub mod cart;
pub mod line_item;

use tracing::debug;

use crate::error::{RuleError, RuleResult};
use crate::operator::Operator;
use crate::scope::Scope;

pub use cart::{CartVolumeRule, CartWeightRule};
pub use line_item::{
    LineItemAmount, LineItemListPriceRule, LineItemPurchasePriceRule, LineItemTaxRateRule,
    LineItemTotalPriceRule, LineItemUnitPriceRule,
};

/// Threshold of a rule, or `MissingRequiredValue`
pub(crate) fn required_amount(amount: Option<f64>, rule: &'static str) -> RuleResult<f64> {
    amount.ok_or(RuleError::MissingRequiredValue {
        rule,
        field: "amount",
    })
}

/// A configured predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    LineItemPurchasePrice(LineItemPurchasePriceRule),
    LineItemUnitPrice(LineItemUnitPriceRule),
    LineItemTotalPrice(LineItemTotalPriceRule),
    LineItemListPrice(LineItemListPriceRule),
    LineItemTaxRate(LineItemTaxRateRule),
    CartVolume(CartVolumeRule),
    CartWeight(CartWeightRule),
}

impl Rule {
    /// Identifier used to persist and look up this rule kind
    pub fn name(&self) -> &'static str {
        match self {
            Rule::LineItemPurchasePrice(_) => LineItemPurchasePriceRule::NAME,
            Rule::LineItemUnitPrice(_) => LineItemUnitPriceRule::NAME,
            Rule::LineItemTotalPrice(_) => LineItemTotalPriceRule::NAME,
            Rule::LineItemListPrice(_) => LineItemListPriceRule::NAME,
            Rule::LineItemTaxRate(_) => LineItemTaxRateRule::NAME,
            Rule::CartVolume(_) => CartVolumeRule::NAME,
            Rule::CartWeight(_) => CartWeightRule::NAME,
        }
    }

    pub fn operator(&self) -> Operator {
        match self {
            Rule::LineItemPurchasePrice(rule) => rule.operator,
            Rule::LineItemUnitPrice(rule) => rule.operator,
            Rule::LineItemTotalPrice(rule) => rule.operator,
            Rule::LineItemListPrice(rule) => rule.operator,
            Rule::LineItemTaxRate(rule) => rule.operator,
            Rule::CartVolume(rule) => rule.operator,
            Rule::CartWeight(rule) => rule.operator,
        }
    }

    pub fn amount(&self) -> Option<f64> {
        match self {
            Rule::LineItemPurchasePrice(rule) => rule.amount,
            Rule::LineItemUnitPrice(rule) => rule.amount,
            Rule::LineItemTotalPrice(rule) => rule.amount,
            Rule::LineItemListPrice(rule) => rule.amount,
            Rule::LineItemTaxRate(rule) => rule.amount,
            Rule::CartVolume(rule) => rule.amount,
            Rule::CartWeight(rule) => rule.amount,
        }
    }

    /// Operators this rule kind accepts
    pub fn supported_operators(&self) -> &'static [Operator] {
        match self {
            Rule::LineItemTaxRate(_) => &Operator::EQUALITY,
            _ => &Operator::ALL,
        }
    }

    /// Configuration-time checks: supported operator, finite threshold.
    ///
    /// A missing threshold passes; it is reported when the rule is matched.
    pub fn validate(&self) -> RuleResult<()> {
        let operator = self.operator();
        if !self.supported_operators().contains(&operator) {
            return Err(RuleError::UnsupportedOperator {
                rule: self.name().to_string(),
                operator: operator.to_string(),
            });
        }

        if let Some(amount) = self.amount() {
            if !amount.is_finite() {
                return Err(RuleError::InvalidValue {
                    rule: self.name().to_string(),
                    field: "amount",
                    reason: format!("{amount} is not a finite number"),
                });
            }
        }

        Ok(())
    }

    /// Match this rule against a scope
    pub fn matches(&self, scope: &Scope<'_>) -> RuleResult<bool> {
        let matched = match self {
            Rule::LineItemPurchasePrice(rule) => line_item::match_any(rule, scope),
            Rule::LineItemUnitPrice(rule) => line_item::match_any(rule, scope),
            Rule::LineItemTotalPrice(rule) => line_item::match_any(rule, scope),
            Rule::LineItemListPrice(rule) => line_item::match_any(rule, scope),
            Rule::LineItemTaxRate(rule) => line_item::match_any(rule, scope),
            Rule::CartVolume(rule) => rule.matches(scope),
            Rule::CartWeight(rule) => rule.matches(scope),
        }?;

        debug!(
            rule = self.name(),
            operator = %self.operator(),
            amount = ?self.amount(),
            matched,
            "rule evaluated"
        );

        Ok(matched)
    }
}

impl From<LineItemPurchasePriceRule> for Rule {
    fn from(rule: LineItemPurchasePriceRule) -> Self {
        Rule::LineItemPurchasePrice(rule)
    }
}

impl From<LineItemUnitPriceRule> for Rule {
    fn from(rule: LineItemUnitPriceRule) -> Self {
        Rule::LineItemUnitPrice(rule)
    }
}

impl From<LineItemTotalPriceRule> for Rule {
    fn from(rule: LineItemTotalPriceRule) -> Self {
        Rule::LineItemTotalPrice(rule)
    }
}

impl From<LineItemListPriceRule> for Rule {
    fn from(rule: LineItemListPriceRule) -> Self {
        Rule::LineItemListPrice(rule)
    }
}

impl From<LineItemTaxRateRule> for Rule {
    fn from(rule: LineItemTaxRateRule) -> Self {
        Rule::LineItemTaxRate(rule)
    }
}

impl From<CartVolumeRule> for Rule {
    fn from(rule: CartVolumeRule) -> Self {
        Rule::CartVolume(rule)
    }
}

impl From<CartWeightRule> for Rule {
    fn from(rule: CartWeightRule) -> Self {
        Rule::CartWeight(rule)
    }
}
