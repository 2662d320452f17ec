//! End-to-end refresh: raw tables in, a serializable stock report out
//!
//! Every refresh recomputes everything from the source tables; nothing is
//! carried over from a previous run.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::LoadWarning;
use crate::importers::{normalize_ledger, parse_manifest, read_table, RawTable};
use crate::reconciliation::{reconcile_initial_entries, ManifestComparison};
use crate::reports::{
    attach_manifest, compute_stock_positions, priced_sales, PortfolioMetrics, SalesOverview,
    StockPosition,
};
use crate::utils::format_compact;

#[derive(Debug, Clone, Serialize)]
pub struct StockReport {
    pub generated_at: DateTime<Utc>,
    pub positions: Vec<StockPosition>,
    pub portfolio: PortfolioMetrics,
    pub sales: SalesOverview,
    /// Empty unless a manifest was supplied and an initial lot configured
    pub manifest: Vec<ManifestComparison>,
    pub warnings: Vec<LoadWarning>,
}

/// Recompute the full report from already-read tables
pub fn refresh(
    ledger: &RawTable,
    manifest: Option<&RawTable>,
    config: &Config,
) -> Result<StockReport> {
    let normalized = normalize_ledger(ledger).context("Failed to normalize ledger")?;
    let mut records = normalized.records;
    let mut warnings = normalized.warnings;

    let manifest = manifest
        .map(parse_manifest)
        .transpose()
        .context("Failed to read import manifest")?;

    let selector = config.lot_selector();
    let mut comparisons = Vec::new();
    if let Some(manifest) = &manifest {
        if manifest.is_empty() {
            warn!("Import manifest has no product rows");
        }
        let outcome = reconcile_initial_entries(&mut records, manifest, &selector);
        if !outcome.unmatched_products.is_empty() {
            let warning = LoadWarning::UnmatchedManifestProducts {
                products: outcome.unmatched_products,
            };
            warn!("{}", warning);
            warnings.push(warning);
        }
        comparisons = outcome.comparisons;
    }

    let mut positions = compute_stock_positions(&records, &config.thresholds);
    if let Some(manifest) = &manifest {
        attach_manifest(&mut positions, manifest, &selector);
    }

    if positions.is_empty() {
        let warning = LoadWarning::EmptyResult;
        warn!("{}", warning);
        warnings.push(warning);
    }

    let portfolio = PortfolioMetrics::from_positions(&positions);
    let sales = SalesOverview::from_sales(&priced_sales(&records));

    info!(
        "Refresh complete: {} positions, {} boxes, sales {}",
        positions.len(),
        format_compact(portfolio.total_boxes, 2),
        format_compact(sales.total_sales, 2)
    );

    Ok(StockReport {
        generated_at: Utc::now(),
        positions,
        portfolio,
        sales,
        manifest: comparisons,
        warnings,
    })
}

/// Read the configured source files and refresh
pub fn refresh_from_config(config: &Config) -> Result<StockReport> {
    let ledger_path = config
        .sources
        .ledger
        .as_ref()
        .ok_or_else(|| anyhow!("No ledger file configured ([sources] ledger)"))?;

    let ledger = read_table(ledger_path, config.sources.ledger_sheet.as_deref())
        .with_context(|| format!("Failed to read ledger {}", ledger_path.display()))?;

    let manifest = config
        .sources
        .manifest
        .as_ref()
        .map(|path| {
            read_table(path, config.sources.manifest_sheet.as_deref())
                .with_context(|| format!("Failed to read manifest {}", path.display()))
        })
        .transpose()?;

    refresh(&ledger, manifest.as_ref(), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::models::StockState;
    use crate::reconciliation::LotSelector;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const HEADER: [&str; 11] = [
        "NOMBRE",
        "LOTE",
        "MOVIMIENTO",
        "ALMACEN",
        "ALMACEN ACTUAL",
        "CAJAS",
        "KG",
        "PRECIO",
        "PRECIO TOTAL",
        "CLIENTE",
        "VENDEDOR",
    ];

    fn table(header: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            header.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn config_with_lot(lot: &str) -> Config {
        let mut config = Config::default();
        config.reconciliation.initial_lot = Some(lot.to_string());
        config
    }

    #[test]
    fn test_refresh_basic() {
        crate::logging::init_test();
        let ledger = table(
            &HEADER,
            &[
                &["Salmon", "L1", "ENTRADA", "WH1", "", "100", "1000", "0", "0", "", ""],
                &["Salmon", "L1", "SALIDA", "WH1", "", "30", "300", "5", "1500", "ACME", "ANA"],
            ],
        );
        let report = refresh(&ledger, None, &Config::default()).unwrap();
        assert_eq!(report.positions.len(), 1);
        let position = &report.positions[0];
        assert_eq!(position.product, "SALMON");
        assert_eq!(position.stock, dec!(70));
        assert_eq!(position.state, StockState::Normal);
        assert_eq!(report.portfolio.total_boxes, dec!(70));
        assert_eq!(report.sales.total_sales, dec!(1500));
        assert!(report.warnings.is_empty());
        assert!(report.manifest.is_empty());
    }

    #[test]
    fn test_refresh_with_manifest() {
        let ledger = table(
            &HEADER,
            &[&["A", "L1", "ENTRADA", "WH1", "", "10", "999", "0", "0", "", ""]],
        );
        let manifest = table(
            &["MERCADERIA", "KG NETOS", "CAJAS"],
            &[&["A", "500", "100"]],
        );
        let report = refresh(&ledger, Some(&manifest), &config_with_lot("L1")).unwrap();
        let position = &report.positions[0];
        assert_eq!(position.kg_total, dec!(50));
        let figures = position.manifest.as_ref().unwrap();
        assert_eq!(figures.imported_kg, dec!(500));
        assert_eq!(figures.kg_difference, dec!(450));
        assert_eq!(figures.percent_utilized, dec!(90));
        assert_eq!(report.manifest.len(), 1);
        assert_eq!(report.manifest[0].recorded_kg, dec!(999));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_unmatched_initial_lot_products_are_warned() {
        let ledger = table(
            &HEADER,
            &[
                &["A", "L1", "ENTRADA", "WH1", "", "10", "999", "0", "0", "", ""],
                &["B", "L1", "ENTRADA", "WH1", "", "5", "77", "0", "0", "", ""],
                &["C", "L2", "ENTRADA", "WH1", "", "5", "77", "0", "0", "", ""],
            ],
        );
        let manifest = table(
            &["MERCADERIA", "KG NETOS", "CAJAS"],
            &[&["A", "500", "100"]],
        );
        let report = refresh(&ledger, Some(&manifest), &config_with_lot("L1")).unwrap();
        assert_eq!(
            report.warnings,
            vec![LoadWarning::UnmatchedManifestProducts {
                products: vec!["B".to_string()]
            }]
        );
        let b = report.positions.iter().find(|p| p.product == "B").unwrap();
        assert_eq!(b.kg_total, dec!(77));
    }

    #[test]
    fn test_oversized_cells_do_not_abort_refresh() {
        // Parses as a Decimal, but two of them cannot be summed
        const HUGE: &str = "50000000000000000000000000000";
        let ledger = table(
            &HEADER,
            &[
                &["A", "L1", "ENTRADA", "WH1", "", "1", "10", "0", "0", "", ""],
                &["A", "L1", "SALIDA", "WH1", "", "1e27", "1e27", "1e27", "1e27", "X", ""],
                &["B", "L1", "ENTRADA", "WH1", "", HUGE, "1", "0", "0", "", ""],
                &["B", "L1", "ENTRADA", "WH1", "", HUGE, "1", "0", "0", "", ""],
                &["B", "L1", "ENTRADA", "WH1", "", "3", "1", "0", "0", "", ""],
            ],
        );
        let report = refresh(&ledger, None, &Config::default()).unwrap();

        let a = report.positions.iter().find(|p| p.product == "A").unwrap();
        assert_eq!(a.stock, dec!(1));
        assert_eq!(a.percent_sold, Decimal::ZERO);
        let b = report.positions.iter().find(|p| p.product == "B").unwrap();
        assert_eq!(b.stock, dec!(3));
        assert_eq!(report.sales.total_sales, Decimal::ZERO);
    }

    #[test]
    fn test_manifest_ignored_without_initial_lot() {
        let ledger = table(
            &HEADER,
            &[&["A", "L1", "ENTRADA", "WH1", "", "10", "999", "0", "0", "", ""]],
        );
        let manifest = table(
            &["MERCADERIA", "KG NETOS", "CAJAS"],
            &[&["A", "500", "100"]],
        );
        let config = Config::default();
        assert_eq!(config.lot_selector(), LotSelector::Disabled);
        let report = refresh(&ledger, Some(&manifest), &config).unwrap();
        assert_eq!(report.positions[0].kg_total, dec!(999));
        assert!(report.positions[0].manifest.is_none());
    }

    #[test]
    fn test_schema_error_aborts() {
        let ledger = table(&["NOMBRE", "LOTE"], &[&["A", "L1"]]);
        let err = refresh(&ledger, None, &Config::default()).unwrap_err();
        let ledger_err = err.downcast_ref::<LedgerError>().unwrap();
        assert!(ledger_err.is_schema());
        assert!(ledger_err.to_string().contains("movimiento"));
    }

    #[test]
    fn test_empty_result_warning() {
        let ledger = table(
            &HEADER,
            &[&["A", "L1", "AJUSTE", "WH1", "", "10", "100", "0", "0", "", ""]],
        );
        let report = refresh(&ledger, None, &Config::default()).unwrap();
        assert!(report.positions.is_empty());
        assert!(report.warnings.contains(&LoadWarning::EmptyResult));
        assert!(matches!(
            report.warnings[0],
            LoadWarning::NonStandardMovements { .. }
        ));
    }

    #[test]
    fn test_refresh_from_config_requires_ledger() {
        assert!(refresh_from_config(&Config::default()).is_err());
    }
}
