//! # promo-core
//!
//! Rule matching and discount valuation for cart pricing.
//!
//! This crate provides:
//! - `Operator` and the float-tolerant `compare` used by every rule
//! - `Cart`, `LineItem` and `Delivery` snapshot types
//! - `Rule`, a closed set of line item and cart aggregate predicates
//! - `PromotionDiscount` with currency overrides, caps and gating rules
//! - `DiscountCatalog` for loading discounts from TOML or JSON
//! - `StrategyRegistry` for sorter/applier/usage/picker keys
//! - `DiscountResolver` for gating and valuing discounts against a cart
//!
//! ## Example
//!
//! ```rust,ignore
//! use promo_core::{Cart, CartScope, Context, DiscountCatalog, DiscountResolver};
//!
//! let catalog = DiscountCatalog::from_toml(&std::fs::read_to_string("discounts.toml")?)?;
//! let discounts = catalog.build().into_iter().collect::<Result<Vec<_>, _>>()?;
//!
//! let cart: Cart = serde_json::from_str(&cart_json)?;
//! let context = Context::new("EUR");
//!
//! let resolver = DiscountResolver::default();
//! for outcome in resolver.resolve_all(&discounts, &CartScope::new(&cart, &context)) {
//!     println!("{}", outcome.as_str());
//! }
//! ```

pub mod cart;
pub mod config;
pub mod discount;
pub mod error;
pub mod operator;
pub mod resolver;
pub mod rule;
pub mod scope;
pub mod strategy;

// Re-exports for convenience
pub use cart::{
    Cart, Context, CurrencyId, Delivery, DeliveryInformation, DeliveryPosition, LineItem,
    PurchasePrice,
};
pub use config::{DiscountCatalog, DiscountConfig, DiscountPriceConfig, RuleConfig};
pub use discount::{DiscountKind, DiscountScope, PromotionDiscount, StrategyKeys};
pub use error::{DiscountError, DiscountResult, RuleError, RuleResult};
pub use operator::{compare, Operator, FLOAT_EPSILON};
pub use resolver::{targeted_base_amount, DiscountOutcome, DiscountResolver, ResolvedDiscount};
pub use rule::{
    CartVolumeRule, CartWeightRule, LineItemListPriceRule, LineItemPurchasePriceRule,
    LineItemTaxRateRule, LineItemTotalPriceRule, LineItemUnitPriceRule, Rule,
};
pub use scope::{CartScope, LineItemScope, Scope};
pub use strategy::{DiscountStrategies, StrategyRegistry};
