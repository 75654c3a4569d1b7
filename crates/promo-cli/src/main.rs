//! # promo-eval
//!
//! Resolves a discount catalog against a cart snapshot and prints a JSON
//! evaluation report to stdout. Logs go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! export PROMO_DISCOUNTS_PATH=config/discounts.toml
//! export PROMO_CART_PATH=config/cart.json
//! export PROMO_CURRENCY_ID=EUR
//!
//! promo-eval > report.json
//! ```

use anyhow::Context as _;
use promo_cli::config::{load_cart, load_catalog};
use promo_cli::{AppConfig, EvaluationReport, LogFormat};
use promo_core::{CartScope, Context, DiscountResolver, StrategyRegistry};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    // Initialize logging
    let json = config.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let catalog = load_catalog(&config.discounts_path)?;
    let cart = load_cart(&config.cart_path)?;
    let context = Context::new(config.currency_for(&cart)?);

    let registry = StrategyRegistry::with_defaults();
    info!("Strategies: {:?}", registry.registered_keys());
    let resolver = DiscountResolver::new(registry);

    let report = EvaluationReport::evaluate(&catalog, &CartScope::new(&cart, &context), &resolver);
    info!(
        "Evaluated {} discounts, {} applied",
        report.entries.len(),
        report.applied
    );

    let output = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{output}");

    Ok(())
}
