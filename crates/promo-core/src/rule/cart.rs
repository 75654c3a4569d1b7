//! # Cart Aggregate Rules
//!
//! Rules that sum a metric over every delivery position of the cart,
//! convert the sum to the threshold's unit, and compare once. They only
//! apply to a cart scope; a line item scope never matches.

use crate::cart::{Cart, DeliveryPosition};
use crate::error::RuleResult;
use crate::operator::{compare, Operator};
use crate::scope::Scope;

use super::required_amount;

/// Sum `metric` over all delivery positions of `cart`
fn sum_positions(cart: &Cart, metric: impl Fn(&DeliveryPosition) -> f64) -> f64 {
    cart.delivery_positions().map(metric).sum()
}

/// Compares the total shipped volume in cubic metres
#[derive(Debug, Clone, PartialEq)]
pub struct CartVolumeRule {
    pub operator: Operator,
    /// Threshold in cubic metres
    pub amount: Option<f64>,
}

impl CartVolumeRule {
    pub const NAME: &'static str = "cartVolume";

    /// Positions carry cubic millimetres; thresholds are cubic metres
    pub const VOLUME_FACTOR: f64 = 1e-9;

    pub fn new(operator: Operator, amount: Option<f64>) -> Self {
        Self { operator, amount }
    }

    /// Total cart volume in cubic metres
    pub fn cart_volume(cart: &Cart) -> f64 {
        sum_positions(cart, DeliveryPosition::volume) * Self::VOLUME_FACTOR
    }

    pub fn matches(&self, scope: &Scope<'_>) -> RuleResult<bool> {
        let expected = required_amount(self.amount, Self::NAME)?;

        let Scope::Cart(scope) = scope else {
            return Ok(false);
        };

        Ok(compare(self.operator, Self::cart_volume(scope.cart), expected))
    }
}

/// Compares the total shipped weight in kilograms
#[derive(Debug, Clone, PartialEq)]
pub struct CartWeightRule {
    pub operator: Operator,
    /// Threshold in kilograms
    pub amount: Option<f64>,
}

impl CartWeightRule {
    pub const NAME: &'static str = "cartWeight";

    pub fn new(operator: Operator, amount: Option<f64>) -> Self {
        Self { operator, amount }
    }

    /// Total cart weight in kilograms
    pub fn cart_weight(cart: &Cart) -> f64 {
        sum_positions(cart, DeliveryPosition::weight)
    }

    pub fn matches(&self, scope: &Scope<'_>) -> RuleResult<bool> {
        let expected = required_amount(self.amount, Self::NAME)?;

        let Scope::Cart(scope) = scope else {
            return Ok(false);
        };

        Ok(compare(self.operator, Self::cart_weight(scope.cart), expected))
    }
}
