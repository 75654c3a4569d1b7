//! # Line Item Rules
//!
//! Rules that read one amount off a line item. Matched against a line item
//! scope they compare that item; matched against a cart scope they match if
//! ANY good in the cart (nested items included) satisfies the constraint.
//! An item without the amount (no purchase price in the context currency, no
//! list price, ...) is a non-match, never an error.

use crate::cart::LineItem;
use crate::error::RuleResult;
use crate::operator::{compare, Operator};
use crate::scope::Scope;

use super::required_amount;

/// Amount extraction shared by every line item rule
pub trait LineItemAmount {
    /// Rule name
    const NAME: &'static str;

    fn operator(&self) -> Operator;

    fn amount(&self) -> Option<f64>;

    /// Comparable amount of `item` in `currency_id`, if the item has one
    fn amount_of(&self, item: &LineItem, currency_id: &str) -> Option<f64>;
}

/// Match a line item rule with the ANY policy
pub(crate) fn match_any<R: LineItemAmount>(rule: &R, scope: &Scope<'_>) -> RuleResult<bool> {
    let expected = required_amount(rule.amount(), R::NAME)?;
    let currency_id = scope.currency_id();

    let item_matches = |item: &LineItem| {
        rule.amount_of(item, currency_id)
            .map(|actual| compare(rule.operator(), actual, expected))
            .unwrap_or(false)
    };

    Ok(match scope {
        Scope::LineItem(scope) => item_matches(scope.item),
        Scope::Cart(scope) => scope.cart.goods().into_iter().any(item_matches),
    })
}

/// Compares the purchase price (net or gross) in the context currency
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemPurchasePriceRule {
    pub operator: Operator,
    pub amount: Option<f64>,
    pub is_net: bool,
}

impl LineItemPurchasePriceRule {
    pub fn new(operator: Operator, amount: Option<f64>, is_net: bool) -> Self {
        Self {
            operator,
            amount,
            is_net,
        }
    }
}

impl LineItemAmount for LineItemPurchasePriceRule {
    const NAME: &'static str = "cartLineItemPurchasePrice";

    fn operator(&self) -> Operator {
        self.operator
    }

    fn amount(&self) -> Option<f64> {
        self.amount
    }

    fn amount_of(&self, item: &LineItem, currency_id: &str) -> Option<f64> {
        item.purchase_price(currency_id)
            .map(|price| price.amount(self.is_net))
    }
}

/// Compares the unit price
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemUnitPriceRule {
    pub operator: Operator,
    pub amount: Option<f64>,
}

impl LineItemUnitPriceRule {
    pub fn new(operator: Operator, amount: Option<f64>) -> Self {
        Self { operator, amount }
    }
}

impl LineItemAmount for LineItemUnitPriceRule {
    const NAME: &'static str = "cartLineItemUnitPrice";

    fn operator(&self) -> Operator {
        self.operator
    }

    fn amount(&self) -> Option<f64> {
        self.amount
    }

    fn amount_of(&self, item: &LineItem, _currency_id: &str) -> Option<f64> {
        Some(item.unit_price)
    }
}

/// Compares the line total
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemTotalPriceRule {
    pub operator: Operator,
    pub amount: Option<f64>,
}

impl LineItemTotalPriceRule {
    pub fn new(operator: Operator, amount: Option<f64>) -> Self {
        Self { operator, amount }
    }
}

impl LineItemAmount for LineItemTotalPriceRule {
    const NAME: &'static str = "cartLineItemTotalPrice";

    fn operator(&self) -> Operator {
        self.operator
    }

    fn amount(&self) -> Option<f64> {
        self.amount
    }

    fn amount_of(&self, item: &LineItem, _currency_id: &str) -> Option<f64> {
        Some(item.total_price)
    }
}

/// Compares the list price; items without one never match
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemListPriceRule {
    pub operator: Operator,
    pub amount: Option<f64>,
}

impl LineItemListPriceRule {
    pub fn new(operator: Operator, amount: Option<f64>) -> Self {
        Self { operator, amount }
    }
}

impl LineItemAmount for LineItemListPriceRule {
    const NAME: &'static str = "cartLineItemListPrice";

    fn operator(&self) -> Operator {
        self.operator
    }

    fn amount(&self) -> Option<f64> {
        self.amount
    }

    fn amount_of(&self, item: &LineItem, _currency_id: &str) -> Option<f64> {
        item.list_price
    }
}

/// Compares the tax rate. Only equality operators are supported.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemTaxRateRule {
    pub operator: Operator,
    pub amount: Option<f64>,
}

impl LineItemTaxRateRule {
    pub fn new(operator: Operator, amount: Option<f64>) -> Self {
        Self { operator, amount }
    }
}

impl LineItemAmount for LineItemTaxRateRule {
    const NAME: &'static str = "cartLineItemTaxRate";

    fn operator(&self) -> Operator {
        self.operator
    }

    fn amount(&self) -> Option<f64> {
        self.amount
    }

    fn amount_of(&self, item: &LineItem, _currency_id: &str) -> Option<f64> {
        item.tax_rate
    }
}
