//! # Discount Resolver
//!
//! Turns a validated [`PromotionDiscount`] into the value it contributes to
//! a cart pass:
//!
//! ```text
//! gate ──false──► Ineligible
//!   │ true
//!   ▼
//! effective value (currency override or base value)
//!   │
//!   ▼
//! valuation by kind ──► cap (percentage only) ──► ResolvedDiscount
//! ```
//!
//! Each discount is resolved independently. `resolve_all` isolates failures
//! so one misconfigured discount never affects its siblings.

use tracing::{debug, instrument, warn};

use crate::cart::Cart;
use crate::discount::{DiscountKind, DiscountScope, PromotionDiscount};
use crate::error::{DiscountError, DiscountResult};
use crate::scope::{CartScope, Scope};
use crate::strategy::{DiscountStrategies, StrategyRegistry};

/// Value a discount contributes after gating and valuation
#[derive(Debug, Clone)]
pub struct ResolvedDiscount {
    pub discount_id: String,
    pub scope: DiscountScope,
    pub kind: DiscountKind,

    /// Value after the currency override, before valuation
    pub effective_value: f64,

    /// Monetary discount for percentage and absolute discounts, target
    /// price for fixed and fixed unit discounts
    pub amount: f64,

    /// Whether `max_value` reduced the amount
    pub capped: bool,

    /// Resolved strategies, for discounts with advanced rules
    pub strategies: Option<DiscountStrategies>,
}

/// Result of resolving one discount within a batch
#[derive(Debug, Clone)]
pub enum DiscountOutcome {
    /// Eligible and valued
    Applied(ResolvedDiscount),
    /// A gating rule did not match
    Ineligible,
    /// Percentage discount without a base amount for its scope
    Unpriced,
    /// Resolution failed; siblings are unaffected
    Failed(DiscountError),
}

impl DiscountOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, DiscountOutcome::Applied(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountOutcome::Applied(_) => "applied",
            DiscountOutcome::Ineligible => "ineligible",
            DiscountOutcome::Unpriced => "unpriced",
            DiscountOutcome::Failed(_) => "failed",
        }
    }
}

/// Base amount a discount of `scope` is computed against.
///
/// Set and set-group membership is decided outside this crate, so those
/// scopes have no base amount here.
pub fn targeted_base_amount(scope: &DiscountScope, cart: &Cart) -> Option<f64> {
    match scope {
        DiscountScope::Cart => Some(cart.goods_total()),
        DiscountScope::Delivery => Some(cart.shipping_total()),
        DiscountScope::Set | DiscountScope::SetGroup(_) => None,
    }
}

/// Gates and values promotion discounts
#[derive(Debug, Clone)]
pub struct DiscountResolver {
    registry: StrategyRegistry,
}

impl DiscountResolver {
    /// Create a resolver using `registry` for strategy keys
    pub fn new(registry: StrategyRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Evaluate the gating rules of `discount` against the cart.
    ///
    /// All rules must match. The first non-match or error ends evaluation.
    #[instrument(skip_all, fields(discount_id = %discount.id))]
    pub fn gate(&self, discount: &PromotionDiscount, scope: &CartScope<'_>) -> DiscountResult<bool> {
        if !discount.has_gating_rules() {
            return Ok(true);
        }

        let scope = Scope::from(*scope);
        for rule in &discount.discount_rules {
            let matched = rule.matches(&scope).map_err(|source| DiscountError::Rule {
                discount_id: discount.id.clone(),
                source,
            })?;

            if !matched {
                debug!(rule = rule.name(), "discount gated out");
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Gate and value `discount` against `base_amount`.
    ///
    /// Returns `None` when a gating rule does not match.
    #[instrument(skip_all, fields(discount_id = %discount.id, base_amount = base_amount))]
    pub fn resolve(
        &self,
        discount: &PromotionDiscount,
        scope: &CartScope<'_>,
        base_amount: f64,
    ) -> DiscountResult<Option<ResolvedDiscount>> {
        if !self.gate(discount, scope)? {
            return Ok(None);
        }

        self.value(discount, scope.context.currency_id.as_str(), base_amount)
            .map(Some)
    }

    /// Resolve every discount against the cart. Base amounts come from
    /// [`targeted_base_amount`]. The outcomes are in input order.
    #[instrument(skip_all, fields(cart = %scope.cart.token, discounts = discounts.len()))]
    pub fn resolve_all(
        &self,
        discounts: &[PromotionDiscount],
        scope: &CartScope<'_>,
    ) -> Vec<DiscountOutcome> {
        discounts
            .iter()
            .map(|discount| {
                let outcome = self.outcome(discount, scope).unwrap_or_else(DiscountOutcome::Failed);
                if let DiscountOutcome::Failed(err) = &outcome {
                    warn!(discount_id = %discount.id, error = %err, "discount resolution failed");
                }
                outcome
            })
            .collect()
    }

    fn outcome(
        &self,
        discount: &PromotionDiscount,
        scope: &CartScope<'_>,
    ) -> DiscountResult<DiscountOutcome> {
        if !self.gate(discount, scope)? {
            return Ok(DiscountOutcome::Ineligible);
        }

        let base_amount = match targeted_base_amount(&discount.scope, scope.cart) {
            Some(amount) => amount,
            None if discount.kind == DiscountKind::Percentage => {
                debug!(discount_id = %discount.id, scope = %discount.scope, "no base amount for scope");
                return Ok(DiscountOutcome::Unpriced);
            }
            None => 0.0,
        };

        let resolved = self.value(discount, scope.context.currency_id.as_str(), base_amount)?;
        Ok(DiscountOutcome::Applied(resolved))
    }

    fn value(
        &self,
        discount: &PromotionDiscount,
        currency_id: &str,
        base_amount: f64,
    ) -> DiscountResult<ResolvedDiscount> {
        let effective_value = discount.effective_value(currency_id);

        let (amount, capped) = match discount.kind {
            DiscountKind::Percentage => {
                let amount = base_amount * effective_value / 100.0;
                match discount.max_value {
                    Some(max_value) if amount > max_value => (max_value, true),
                    _ => (amount, false),
                }
            }
            DiscountKind::Absolute | DiscountKind::Fixed | DiscountKind::FixedUnit => {
                (effective_value, false)
            }
        };

        let strategies = if discount.consider_advanced_rules {
            Some(self.registry.resolve(&discount.strategy_keys)?)
        } else {
            None
        };

        debug!(
            discount_id = %discount.id,
            kind = %discount.kind,
            effective_value,
            amount,
            capped,
            "discount resolved"
        );

        Ok(ResolvedDiscount {
            discount_id: discount.id.clone(),
            scope: discount.scope.clone(),
            kind: discount.kind,
            effective_value,
            amount,
            capped,
            strategies,
        })
    }
}

impl Default for DiscountResolver {
    fn default() -> Self {
        Self::new(StrategyRegistry::with_defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{Context, Delivery, DeliveryPosition, LineItem, PurchasePrice};
    use crate::discount::StrategyKeys;
    use crate::error::RuleError;
    use crate::operator::Operator;
    use crate::rule::{CartVolumeRule, CartWeightRule, LineItemPurchasePriceRule};

    fn heavy_cart() -> Cart {
        Cart::new()
            .with_item(
                LineItem::new("Sofa", 800.0, 1)
                    .with_purchase_price("EUR", PurchasePrice::new(300.0, 357.0)),
            )
            .with_item(LineItem::new("Cushion", 50.0, 4))
            .with_delivery(Delivery::new(49.0).with_position(DeliveryPosition {
                line_item_id: "sofa".into(),
                quantity: 1,
                unit_volume: Some(1.5e9),
                unit_weight: Some(60.0),
            }))
    }

    #[test]
    fn test_percentage_is_capped() {
        let resolver = DiscountResolver::default();
        let cart = Cart::new();
        let context = Context::new("EUR");
        let scope = CartScope::new(&cart, &context);

        let discount =
            PromotionDiscount::new("pct", DiscountScope::Cart, DiscountKind::Percentage, 20.0)
                .with_max_value(15.0);

        let resolved = resolver.resolve(&discount, &scope, 1000.0).unwrap().unwrap();
        assert_eq!(resolved.effective_value, 20.0);
        assert_eq!(resolved.amount, 15.0);
        assert!(resolved.capped);

        let resolved = resolver.resolve(&discount, &scope, 50.0).unwrap().unwrap();
        assert_eq!(resolved.amount, 10.0);
        assert!(!resolved.capped);
    }

    #[test]
    fn test_cap_ignored_for_other_kinds() {
        let resolver = DiscountResolver::default();
        let cart = Cart::new();
        let context = Context::new("EUR");
        let scope = CartScope::new(&cart, &context);

        for kind in [DiscountKind::Absolute, DiscountKind::Fixed, DiscountKind::FixedUnit] {
            let discount =
                PromotionDiscount::new("d", DiscountScope::Cart, kind, 40.0).with_max_value(15.0);
            let resolved = resolver.resolve(&discount, &scope, 1000.0).unwrap().unwrap();
            assert_eq!(resolved.amount, 40.0);
            assert!(!resolved.capped);
        }
    }

    #[test]
    fn test_currency_override_drives_value() {
        let resolver = DiscountResolver::default();
        let cart = Cart::new();
        let discount =
            PromotionDiscount::new("abs", DiscountScope::Cart, DiscountKind::Absolute, 10.0)
                .with_currency_price("USD", 8.0);

        let usd = Context::new("USD");
        let resolved = resolver
            .resolve(&discount, &CartScope::new(&cart, &usd), 100.0)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.amount, 8.0);

        let eur = Context::new("EUR");
        let resolved = resolver
            .resolve(&discount, &CartScope::new(&cart, &eur), 100.0)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.amount, 10.0);
    }

    #[test]
    fn test_gate_requires_every_rule() {
        let resolver = DiscountResolver::default();
        let cart = heavy_cart();
        let context = Context::new("EUR");
        let scope = CartScope::new(&cart, &context);

        let discount =
            PromotionDiscount::new("bulky", DiscountScope::Delivery, DiscountKind::Fixed, 0.0)
                .with_rule(CartVolumeRule::new(Operator::Gte, Some(1.0)))
                .with_rule(CartWeightRule::new(Operator::Gt, Some(50.0)));
        assert_eq!(resolver.gate(&discount, &scope), Ok(true));

        let discount = discount.with_rule(CartWeightRule::new(Operator::Lt, Some(10.0)));
        assert_eq!(resolver.gate(&discount, &scope), Ok(false));
        assert!(resolver.resolve(&discount, &scope, 49.0).unwrap().is_none());
    }

    #[test]
    fn test_rules_ignored_without_advanced_rules() {
        let resolver = DiscountResolver::default();
        let cart = heavy_cart();
        let context = Context::new("EUR");
        let scope = CartScope::new(&cart, &context);

        let mut discount =
            PromotionDiscount::new("plain", DiscountScope::Cart, DiscountKind::Absolute, 5.0)
                .with_rule(CartVolumeRule::new(Operator::Lt, None));
        discount.consider_advanced_rules = false;

        assert_eq!(resolver.gate(&discount, &scope), Ok(true));
        let resolved = resolver.resolve(&discount, &scope, 0.0).unwrap().unwrap();
        assert!(resolved.strategies.is_none());
    }

    #[test]
    fn test_rule_error_aborts_resolution() {
        let resolver = DiscountResolver::default();
        let cart = heavy_cart();
        let context = Context::new("EUR");
        let scope = CartScope::new(&cart, &context);

        let discount =
            PromotionDiscount::new("broken", DiscountScope::Cart, DiscountKind::Absolute, 5.0)
                .with_rule(CartVolumeRule::new(Operator::Lte, None));

        let err = resolver.resolve(&discount, &scope, 100.0).unwrap_err();
        assert!(err.is_evaluation_error());
        assert_eq!(
            err,
            DiscountError::Rule {
                discount_id: "broken".into(),
                source: RuleError::MissingRequiredValue {
                    rule: "cartVolume",
                    field: "amount",
                },
            }
        );
    }

    #[test]
    fn test_gate_short_circuits_on_non_match() {
        let resolver = DiscountResolver::default();
        let cart = heavy_cart();
        let context = Context::new("EUR");
        let scope = CartScope::new(&cart, &context);

        // the failing second rule is never evaluated
        let discount =
            PromotionDiscount::new("d", DiscountScope::Cart, DiscountKind::Absolute, 5.0)
                .with_rule(CartWeightRule::new(Operator::Lt, Some(1.0)))
                .with_rule(CartVolumeRule::new(Operator::Lte, None));

        assert_eq!(resolver.gate(&discount, &scope), Ok(false));
    }

    #[test]
    fn test_resolve_all_isolates_failures() {
        let resolver = DiscountResolver::default();
        let cart = heavy_cart();
        let context = Context::new("EUR");
        let scope = CartScope::new(&cart, &context);

        let discounts = vec![
            PromotionDiscount::new("ten", DiscountScope::Cart, DiscountKind::Percentage, 10.0),
            PromotionDiscount::new("broken", DiscountScope::Cart, DiscountKind::Absolute, 5.0)
                .with_rule(CartWeightRule::new(Operator::Gt, None)),
            PromotionDiscount::new("cheap", DiscountScope::Cart, DiscountKind::Absolute, 5.0)
                .with_rule(LineItemPurchasePriceRule::new(Operator::Lt, Some(10.0), true)),
            PromotionDiscount::new(
                "group",
                DiscountScope::SetGroup("g1".into()),
                DiscountKind::Percentage,
                10.0,
            ),
            PromotionDiscount::new("ship", DiscountScope::Delivery, DiscountKind::Percentage, 50.0),
        ];

        let outcomes = resolver.resolve_all(&discounts, &scope);
        assert_eq!(outcomes.len(), 5);

        match &outcomes[0] {
            // goods total: 800 + 4 x 50
            DiscountOutcome::Applied(resolved) => assert_eq!(resolved.amount, 100.0),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(matches!(
            &outcomes[1],
            DiscountOutcome::Failed(DiscountError::Rule { discount_id, .. }) if discount_id == "broken"
        ));
        assert!(matches!(outcomes[2], DiscountOutcome::Ineligible));
        assert!(matches!(outcomes[3], DiscountOutcome::Unpriced));
        match &outcomes[4] {
            DiscountOutcome::Applied(resolved) => assert_eq!(resolved.amount, 24.5),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_unknown_strategy_fails_resolution() {
        let resolver = DiscountResolver::default();
        let cart = Cart::new();
        let context = Context::new("EUR");
        let scope = CartScope::new(&cart, &context);

        let keys = StrategyKeys {
            sorter: Some("RANDOM".into()),
            ..StrategyKeys::default()
        };
        let mut discount =
            PromotionDiscount::new("d", DiscountScope::Set, DiscountKind::FixedUnit, 9.99)
                .with_strategy_keys(keys);
        discount.consider_advanced_rules = true;

        assert_eq!(
            resolver.resolve(&discount, &scope, 0.0).unwrap_err(),
            DiscountError::UnknownStrategy {
                kind: "sorter",
                key: "RANDOM".into(),
            }
        );

        discount.strategy_keys.sorter = Some("PRICE_DESC".into());
        let resolved = resolver.resolve(&discount, &scope, 0.0).unwrap().unwrap();
        let strategies = resolved.strategies.unwrap();
        assert_eq!(strategies.sorter.key(), "PRICE_DESC");
        assert_eq!(strategies.picker.key(), "VERTICAL");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let resolver = DiscountResolver::default();
        let cart = heavy_cart();
        let context = Context::new("EUR");
        let scope = CartScope::new(&cart, &context);

        let discount =
            PromotionDiscount::new("pct", DiscountScope::Cart, DiscountKind::Percentage, 20.0)
                .with_max_value(150.0)
                .with_rule(CartWeightRule::new(Operator::Gte, Some(60.0)));

        let first = resolver.resolve(&discount, &scope, 1000.0).unwrap().unwrap();
        let second = resolver.resolve(&discount, &scope, 1000.0).unwrap().unwrap();
        assert_eq!(first.amount, second.amount);
        assert_eq!(first.capped, second.capped);
        assert_eq!(first.amount, 150.0);
    }

    #[test]
    fn test_targeted_base_amount() {
        let cart = heavy_cart();
        assert_eq!(targeted_base_amount(&DiscountScope::Cart, &cart), Some(1000.0));
        assert_eq!(targeted_base_amount(&DiscountScope::Delivery, &cart), Some(49.0));
        assert_eq!(targeted_base_amount(&DiscountScope::Set, &cart), None);
        assert_eq!(
            targeted_base_amount(&DiscountScope::SetGroup("g".into()), &cart),
            None
        );
    }
}
