//! # Application Config
//!
//! Settings read from the environment and the loaders for the files they
//! point at.

use anyhow::{bail, Context as _};
use promo_core::{Cart, DiscountCatalog};
use std::path::{Path, PathBuf};

pub const DEFAULT_DISCOUNTS_PATH: &str = "config/discounts.toml";
pub const DEFAULT_CART_PATH: &str = "cart.json";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Discount catalog file
    pub discounts_path: PathBuf,
    /// Cart snapshot file
    pub cart_path: PathBuf,
    /// Active currency; must agree with the cart's currency when both are set
    pub currency_id: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from a variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            discounts_path: lookup("PROMO_DISCOUNTS_PATH")
                .unwrap_or_else(|| DEFAULT_DISCOUNTS_PATH.to_string())
                .into(),
            cart_path: lookup("PROMO_CART_PATH")
                .unwrap_or_else(|| DEFAULT_CART_PATH.to_string())
                .into(),
            currency_id: lookup("PROMO_CURRENCY_ID").filter(|c| !c.is_empty()),
            log_format: match lookup("PROMO_LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }

    /// Active currency: the configured currency, else the cart's currency.
    ///
    /// Cart amounts are in the cart's currency, so a configured currency that
    /// differs from it is rejected.
    pub fn currency_for(&self, cart: &Cart) -> anyhow::Result<String> {
        match (&self.currency_id, &cart.currency_id) {
            (Some(configured), Some(cart_currency)) if configured != cart_currency => bail!(
                "PROMO_CURRENCY_ID {configured} does not match the cart's currency {cart_currency}"
            ),
            (Some(currency_id), _) | (None, Some(currency_id)) => Ok(currency_id.clone()),
            (None, None) => bail!("No currency: set PROMO_CURRENCY_ID or the cart's currencyId"),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Load a discount catalog. `.json` files are read as JSON, anything else
/// as TOML.
pub fn load_catalog(path: &Path) -> anyhow::Result<DiscountCatalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read discount catalog {}", path.display()))?;

    let catalog = if is_json(path) {
        DiscountCatalog::from_json(&content)
    } else {
        DiscountCatalog::from_toml(&content)
    }
    .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::info!("Loaded {} discounts from {}", catalog.len(), path.display());
    Ok(catalog)
}

/// Load a cart snapshot from JSON
pub fn load_cart(path: &Path) -> anyhow::Result<Cart> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cart {}", path.display()))?;
    let cart: Cart = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::info!(
        "Loaded cart {} with {} line items",
        cart.token,
        cart.line_items.len()
    );
    Ok(cart)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
