//! # promo-cli
//!
//! Command line evaluation of a discount catalog against a cart snapshot.
//!
//! ## Environment
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PROMO_DISCOUNTS_PATH` | `config/discounts.toml` | Discount catalog (TOML or JSON) |
//! | `PROMO_CART_PATH` | `cart.json` | Cart snapshot (JSON) |
//! | `PROMO_CURRENCY_ID` | cart's `currencyId` | Active currency; must match the cart's when both are set |
//! | `PROMO_LOG_FORMAT` | `pretty` | `json` for structured logs |
//! | `RUST_LOG` | `info` | Log filter |

pub mod config;
pub mod report;

pub use config::{AppConfig, LogFormat};
pub use report::{EvaluationReport, ReportEntry};
