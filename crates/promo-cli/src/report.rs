//! # Evaluation Report
//!
//! JSON report of one evaluation run: cart totals plus one entry per
//! configured discount, in catalog order.

use chrono::{DateTime, Utc};
use promo_core::{
    CartScope, CartVolumeRule, CartWeightRule, DiscountCatalog, DiscountOutcome, DiscountResolver,
    DiscountStrategies, PromotionDiscount,
};
use serde::Serialize;

/// Report for one cart
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub evaluated_at: DateTime<Utc>,
    pub cart_token: String,
    pub currency_id: String,
    pub goods_total: f64,
    pub shipping_total: f64,
    /// Cubic metres
    pub cart_volume: f64,
    /// Kilograms
    pub cart_weight: f64,
    pub applied: usize,
    pub entries: Vec<ReportEntry>,
}

/// Outcome of one discount
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub discount_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_id: Option<String>,
    /// `applied`, `ineligible`, `unpriced`, `failed` or `invalid`
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub capped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategies: Option<StrategySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportEntry {
    fn invalid(discount_id: &str, error: String) -> Self {
        Self {
            discount_id: discount_id.to_string(),
            promotion_id: None,
            status: "invalid",
            scope: None,
            group_id: None,
            kind: None,
            effective_value: None,
            amount: None,
            capped: false,
            strategies: None,
            error: Some(error),
        }
    }

    fn from_outcome(discount: &PromotionDiscount, outcome: &DiscountOutcome) -> Self {
        let mut entry = Self {
            discount_id: discount.id.clone(),
            promotion_id: discount.promotion_id.clone(),
            status: outcome.as_str(),
            scope: Some(discount.scope.to_string()),
            group_id: discount
                .scope
                .is_set_group()
                .then(|| discount.scope.group_id().to_string()),
            kind: Some(discount.kind.to_string()),
            effective_value: None,
            amount: None,
            capped: false,
            strategies: None,
            error: None,
        };

        match outcome {
            DiscountOutcome::Applied(resolved) => {
                entry.effective_value = Some(resolved.effective_value);
                entry.amount = Some(resolved.amount);
                entry.capped = resolved.capped;
                entry.strategies = resolved.strategies.as_ref().map(StrategySummary::from);
            }
            DiscountOutcome::Failed(err) => entry.error = Some(err.to_string()),
            DiscountOutcome::Ineligible | DiscountOutcome::Unpriced => {}
        }

        entry
    }
}

/// Strategy keys a discount resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategySummary {
    pub sorter: String,
    pub applier: String,
    pub usage: String,
    pub picker: String,
}

impl From<&DiscountStrategies> for StrategySummary {
    fn from(strategies: &DiscountStrategies) -> Self {
        Self {
            sorter: strategies.sorter.key().to_string(),
            applier: strategies.applier.key().to_string(),
            usage: strategies.usage.key().to_string(),
            picker: strategies.picker.key().to_string(),
        }
    }
}

impl EvaluationReport {
    /// Validate the catalog and resolve every valid discount against the cart.
    ///
    /// Invalid catalog entries are reported with status `invalid` and do not
    /// stop the run.
    pub fn evaluate(
        catalog: &DiscountCatalog,
        scope: &CartScope<'_>,
        resolver: &DiscountResolver,
    ) -> Self {
        let built = catalog.build();

        let valid: Vec<PromotionDiscount> = built
            .iter()
            .filter_map(|result| result.as_ref().ok().cloned())
            .collect();
        let mut outcomes = resolver.resolve_all(&valid, scope).into_iter();
        let mut resolved = valid.iter();

        let entries: Vec<ReportEntry> = catalog
            .discounts
            .iter()
            .zip(&built)
            .enumerate()
            .filter_map(|(index, (config, result))| match result {
                Ok(_) => {
                    let discount = resolved.next()?;
                    let outcome = outcomes.next()?;
                    Some(ReportEntry::from_outcome(discount, &outcome))
                }
                Err(err) => {
                    let discount_id = config.id_at(index);
                    tracing::warn!(discount_id = %discount_id, error = %err, "invalid discount");
                    Some(ReportEntry::invalid(&discount_id, err.to_string()))
                }
            })
            .collect();

        let cart = scope.cart;
        Self {
            evaluated_at: Utc::now(),
            cart_token: cart.token.clone(),
            currency_id: scope.context.currency_id.clone(),
            goods_total: cart.goods_total(),
            shipping_total: cart.shipping_total(),
            cart_volume: CartVolumeRule::cart_volume(cart),
            cart_weight: CartWeightRule::cart_weight(cart),
            applied: entries.iter().filter(|e| e.status == "applied").count(),
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promo_core::{Cart, Context, Delivery, DeliveryPosition, LineItem};

    const CATALOG: &str = r#"
        [[discounts]]
        id = "ten-percent"
        promotionId = "summer"
        scope = "cart"
        type = "percentage"
        value = 10.0
        maxValue = 5.0

        [[discounts]]
        id = "bad-scope"
        scope = "basket"
        type = "absolute"
        value = 1.0

        [[discounts]]
        id = "light-shipping"
        scope = "delivery"
        type = "fixed"
        value = 0.0
        considerAdvancedRules = true
        discountRules = [{ type = "cartWeight", operator = "lt", amount = 5.0 }]

        [[discounts]]
        id = "bundle"
        scope = "setgroup-g1"
        type = "fixed_unit"
        value = 9.99
        considerAdvancedRules = true
        sorterKey = "PRICE_DESC"
        usageKey = "2"
    "#;

    fn cart() -> Cart {
        Cart::new()
            .with_item(LineItem::new("Mug", 12.0, 2))
            .with_item(LineItem::new("Tea", 6.0, 1))
            .with_delivery(Delivery::new(4.95).with_position(DeliveryPosition {
                line_item_id: "mug".into(),
                quantity: 2,
                unit_volume: None,
                unit_weight: Some(0.4),
            }))
    }

    #[test]
    fn test_report_keeps_catalog_order() {
        let catalog = DiscountCatalog::from_toml(CATALOG).unwrap();
        let cart = cart();
        let context = Context::new("EUR");
        let report = EvaluationReport::evaluate(
            &catalog,
            &CartScope::new(&cart, &context),
            &DiscountResolver::default(),
        );

        let ids: Vec<&str> = report.entries.iter().map(|e| e.discount_id.as_str()).collect();
        assert_eq!(ids, ["ten-percent", "bad-scope", "light-shipping", "bundle"]);

        let statuses: Vec<&str> = report.entries.iter().map(|e| e.status).collect();
        assert_eq!(statuses, ["applied", "invalid", "applied", "applied"]);
        assert_eq!(report.applied, 3);
        assert_eq!(report.goods_total, 30.0);
        assert!((report.cart_weight - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_report_entry_details() {
        let catalog = DiscountCatalog::from_toml(CATALOG).unwrap();
        let cart = cart();
        let context = Context::new("EUR");
        let report = EvaluationReport::evaluate(
            &catalog,
            &CartScope::new(&cart, &context),
            &DiscountResolver::default(),
        );

        let pct = &report.entries[0];
        assert_eq!(pct.promotion_id.as_deref(), Some("summer"));
        assert_eq!(pct.amount, Some(3.0));
        assert!(!pct.capped);

        let invalid = &report.entries[1];
        assert!(invalid.error.as_deref().unwrap().contains("basket"));

        let bundle = &report.entries[3];
        assert_eq!(bundle.group_id.as_deref(), Some("g1"));
        assert_eq!(bundle.amount, Some(9.99));
        let strategies = bundle.strategies.as_ref().unwrap();
        assert_eq!(strategies.sorter, "PRICE_DESC");
        assert_eq!(strategies.usage, "2");
        assert_eq!(strategies.applier, "ALL");
    }

    #[test]
    fn test_invalid_entries_do_not_stop_the_run() {
        let json = r#"{
            "discounts": [
                { "scope": "cart", "type": "percent", "value": 5 },
                { "scope": "delivery", "type": "absolute", "value": 2 }
            ]
        }"#;
        let catalog = DiscountCatalog::from_json(json).unwrap();
        let cart = cart();
        let context = Context::new("EUR");
        let report = EvaluationReport::evaluate(
            &catalog,
            &CartScope::new(&cart, &context),
            &DiscountResolver::default(),
        );

        assert_eq!(report.entries[0].discount_id, "discount-1");
        assert_eq!(report.entries[0].status, "invalid");
        assert!(report.entries[0].error.as_deref().unwrap().contains("percent"));
        assert_eq!(report.entries[1].discount_id, "discount-2");
        assert_eq!(report.entries[1].amount, Some(2.0));
        assert_eq!(report.applied, 1);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let catalog = DiscountCatalog::from_toml(CATALOG).unwrap();
        let cart = cart();
        let context = Context::new("EUR");
        let report = EvaluationReport::evaluate(
            &catalog,
            &CartScope::new(&cart, &context),
            &DiscountResolver::default(),
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["currencyId"], "EUR");
        assert_eq!(json["entries"][0]["discountId"], "ten-percent");
        assert!(json["entries"][0].get("error").is_none());
        assert!(json["evaluatedAt"].is_string());
    }
}
