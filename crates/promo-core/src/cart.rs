//! # Cart Snapshot
//!
//! Read-only cart types handed to the engine by the cart calculation
//! pipeline. Prices are already calculated in the context currency; only
//! purchase prices are kept per currency.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Currency identifier as used by the surrounding platform
pub type CurrencyId = String;

/// Evaluation context for a cart pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// Active currency
    pub currency_id: CurrencyId,
}

impl Context {
    /// Create a context for the given currency
    pub fn new(currency_id: impl Into<CurrencyId>) -> Self {
        Self {
            currency_id: currency_id.into(),
        }
    }
}

/// Purchase price of a product in one currency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PurchasePrice {
    pub net: f64,
    pub gross: f64,
}

impl PurchasePrice {
    pub fn new(net: f64, gross: f64) -> Self {
        Self { net, gross }
    }

    /// Net or gross amount
    pub fn amount(&self, is_net: bool) -> f64 {
        if is_net {
            self.net
        } else {
            self.gross
        }
    }
}

/// Shipping-relevant product data
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryInformation {
    /// Weight in kilograms
    #[serde(default)]
    pub weight: Option<f64>,
    /// Width in millimetres
    #[serde(default)]
    pub width: Option<f64>,
    /// Height in millimetres
    #[serde(default)]
    pub height: Option<f64>,
    /// Length in millimetres
    #[serde(default)]
    pub length: Option<f64>,
}

impl DeliveryInformation {
    /// Volume in cubic millimetres, if all three dimensions are known
    pub fn volume(&self) -> Option<f64> {
        Some(self.width? * self.height? * self.length?)
    }
}

/// A line item in the cart
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Line item id
    pub id: String,

    /// Referenced product id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_id: Option<String>,

    /// Label (denormalized for display)
    #[serde(default)]
    pub label: String,

    /// Quantity
    pub quantity: u32,

    /// Unit price in the context currency
    pub unit_price: f64,

    /// Line total in the context currency
    pub total_price: f64,

    /// List (strike-through) price, if the product has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_price: Option<f64>,

    /// Tax rate in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<f64>,

    /// Whether this is a good (promotion and credit lines are not)
    #[serde(default = "default_true")]
    pub good: bool,

    /// Purchase prices keyed by currency id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_prices: Option<HashMap<CurrencyId, PurchasePrice>>,

    /// Shipping data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_information: Option<DeliveryInformation>,

    /// Nested items (bundles, configurator children)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LineItem>,
}

fn default_true() -> bool {
    true
}

impl LineItem {
    /// Create a good line item with a generated id
    pub fn new(label: impl Into<String>, unit_price: f64, quantity: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            referenced_id: None,
            label: label.into(),
            quantity,
            unit_price,
            total_price: unit_price * f64::from(quantity),
            list_price: None,
            tax_rate: None,
            good: true,
            purchase_prices: None,
            delivery_information: None,
            children: Vec::new(),
        }
    }

    /// Builder: set the id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder: add a purchase price for a currency
    pub fn with_purchase_price(
        mut self,
        currency_id: impl Into<CurrencyId>,
        price: PurchasePrice,
    ) -> Self {
        self.purchase_prices
            .get_or_insert_with(HashMap::new)
            .insert(currency_id.into(), price);
        self
    }

    /// Builder: set the list price
    pub fn with_list_price(mut self, list_price: f64) -> Self {
        self.list_price = Some(list_price);
        self
    }

    /// Builder: set the tax rate
    pub fn with_tax_rate(mut self, tax_rate: f64) -> Self {
        self.tax_rate = Some(tax_rate);
        self
    }

    /// Builder: set delivery information
    pub fn with_delivery_information(mut self, info: DeliveryInformation) -> Self {
        self.delivery_information = Some(info);
        self
    }

    /// Builder: add a nested item
    pub fn with_child(mut self, child: LineItem) -> Self {
        self.children.push(child);
        self
    }

    /// Builder: mark as a non-good line (e.g. a promotion line)
    pub fn not_good(mut self) -> Self {
        self.good = false;
        self
    }

    /// Purchase price for an exact currency id; no fallback to other currencies
    pub fn purchase_price(&self, currency_id: &str) -> Option<&PurchasePrice> {
        self.purchase_prices.as_ref()?.get(currency_id)
    }
}

/// One line item's share of a delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPosition {
    /// Line item being shipped
    pub line_item_id: String,

    /// Quantity shipped
    pub quantity: u32,

    /// Volume of one unit in cubic millimetres
    #[serde(default)]
    pub unit_volume: Option<f64>,

    /// Weight of one unit in kilograms
    #[serde(default)]
    pub unit_weight: Option<f64>,
}

impl DeliveryPosition {
    /// Build a position from a line item and its delivery information
    pub fn from_line_item(item: &LineItem) -> Self {
        let info = item.delivery_information.unwrap_or_default();
        Self {
            line_item_id: item.id.clone(),
            quantity: item.quantity,
            unit_volume: info.volume(),
            unit_weight: info.weight,
        }
    }

    /// Total volume of this position; unknown volume counts as zero
    pub fn volume(&self) -> f64 {
        self.unit_volume.unwrap_or(0.0) * f64::from(self.quantity)
    }

    /// Total weight of this position; unknown weight counts as zero
    pub fn weight(&self) -> f64 {
        self.unit_weight.unwrap_or(0.0) * f64::from(self.quantity)
    }
}

/// A delivery (shipment) of the cart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    /// Shipping costs in the context currency
    #[serde(default)]
    pub shipping_costs: f64,

    /// Shipped positions
    #[serde(default)]
    pub positions: Vec<DeliveryPosition>,
}

impl Delivery {
    pub fn new(shipping_costs: f64) -> Self {
        Self {
            shipping_costs,
            positions: Vec::new(),
        }
    }

    /// Builder: add a position
    pub fn with_position(mut self, position: DeliveryPosition) -> Self {
        self.positions.push(position);
        self
    }
}

/// Cart snapshot for one calculation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Cart token
    pub token: String,

    /// Currency the cart was calculated in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_id: Option<CurrencyId>,

    /// Top-level line items
    #[serde(default)]
    pub line_items: Vec<LineItem>,

    /// Deliveries
    #[serde(default)]
    pub deliveries: Vec<Delivery>,
}

impl Cart {
    /// Create an empty cart with a generated token
    pub fn new() -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            currency_id: None,
            line_items: Vec::new(),
            deliveries: Vec::new(),
        }
    }

    /// Add a line item
    pub fn add_item(&mut self, item: LineItem) {
        self.line_items.push(item);
    }

    /// Builder: add a line item
    pub fn with_item(mut self, item: LineItem) -> Self {
        self.add_item(item);
        self
    }

    /// Builder: add a delivery
    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.deliveries.push(delivery);
        self
    }

    /// All goods, nested items included, depth first
    pub fn goods(&self) -> Vec<&LineItem> {
        fn collect<'a>(items: &'a [LineItem], out: &mut Vec<&'a LineItem>) {
            for item in items {
                if item.good {
                    out.push(item);
                }
                collect(&item.children, out);
            }
        }

        let mut out = Vec::new();
        collect(&self.line_items, &mut out);
        out
    }

    /// Sum of top-level goods totals
    pub fn goods_total(&self) -> f64 {
        self.line_items
            .iter()
            .filter(|item| item.good)
            .map(|item| item.total_price)
            .sum()
    }

    /// Sum of shipping costs across deliveries
    pub fn shipping_total(&self) -> f64 {
        self.deliveries.iter().map(|d| d.shipping_costs).sum()
    }

    /// All delivery positions across deliveries
    pub fn delivery_positions(&self) -> impl Iterator<Item = &DeliveryPosition> {
        self.deliveries.iter().flat_map(|d| d.positions.iter())
    }

    /// Check if the cart has no line items
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}
