//! Stock ledger - warehouse inventory from movement ledgers
//!
//! Reads a movement ledger (CSV or Excel), optionally reconciles the initial
//! lot's weights against an import manifest, and computes per-warehouse stock
//! positions, health classification, portfolio rollups and sales analytics.

pub mod config;
pub mod error;
pub mod importers;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod reconciliation;
pub mod reports;
pub mod utils;

pub use config::Config;
pub use error::{LedgerError, LoadWarning};
pub use pipeline::{refresh, refresh_from_config, StockReport};
