//! TOML configuration: data sources, initial lot and stock thresholds
//!
//! ```toml
//! [sources]
//! ledger = "movimientos.xlsx"
//! ledger_sheet = "Movimientos"
//! manifest = "manifiesto.csv"
//!
//! [reconciliation]
//! initial_lot = "LOTE 1"
//!
//! [[thresholds.levels]]
//! state = "CRITICAL"
//! max_boxes = 5
//!
//! [[thresholds.levels]]
//! state = "LOW"
//! max_boxes = 20
//! ```

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::LedgerError;
use crate::reconciliation::LotSelector;
use crate::reports::StockThresholds;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "STOCK_LEDGER_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub ledger: Option<PathBuf>,
    pub ledger_sheet: Option<String>,
    pub manifest: Option<PathBuf>,
    pub manifest_sheet: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    pub initial_lot: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub reconciliation: ReconciliationConfig,
    pub thresholds: StockThresholds,
}

impl Config {
    /// Parse a TOML document; relative source paths stay as written
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| LedgerError::Config(e.message().to_string()).into())
    }

    /// Load a config file, resolving relative source paths against its directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::parse(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.sources.ledger = config.sources.ledger.map(|p| resolve(base, p));
            config.sources.manifest = config.sources.manifest.map(|p| resolve(base, p));
        }

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `$STOCK_LEDGER_CONFIG`, else `<config home>/stock-ledger/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let config_home = dir_spec::config_home()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_home.join("stock-ledger").join("config.toml"))
    }

    /// Load the config from its default location
    pub fn discover() -> Result<Self> {
        let path = Self::default_path()?;
        debug!("Looking for config at {}", path.display());
        Self::load(&path)
    }

    pub fn lot_selector(&self) -> LotSelector {
        self.reconciliation
            .initial_lot
            .as_deref()
            .map(str::trim)
            .filter(|lot| !lot.is_empty())
            .map(LotSelector::exact)
            .unwrap_or_default()
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}
