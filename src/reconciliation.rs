//! Import manifest reconciliation
//!
//! Initial-lot ENTRY rows trust their box counts but not always their
//! weights. When the manifest knows a product's net weight and box count,
//! each such entry is re-weighted proportionally:
//!
//! `corrected_kg = (manifest.net_weight_kg / manifest.box_count) * entry.boxes`
//!
//! Entries outside the initial lot, non-ENTRY rows, products missing from the
//! manifest and manifest rows with zero boxes are left untouched.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::importers::ledger::MAX_CELL_MAGNITUDE;
use crate::importers::Manifest;
use crate::models::{ImportManifestEntry, MovementKind, MovementRecord};
use crate::reports::metrics::percentage;

/// Which lot counts as first-receipt inventory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LotSelector {
    /// No lot is reconciled
    #[default]
    Disabled,
    /// Lot ids equal to this one (trimmed, case-insensitive including non-ASCII)
    Exact(String),
}

impl LotSelector {
    pub fn exact(lot: impl Into<String>) -> Self {
        LotSelector::Exact(lot.into())
    }

    pub fn matches(&self, lot: &str) -> bool {
        match self {
            LotSelector::Disabled => false,
            LotSelector::Exact(wanted) => {
                wanted.trim().to_uppercase() == lot.trim().to_uppercase()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, LotSelector::Disabled)
    }
}

/// Manifest-versus-ledger figures for one product of the initial lot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestComparison {
    pub product: String,
    pub manifest_kg: Decimal,
    pub manifest_boxes: Decimal,
    pub entry_boxes: Decimal,
    /// Weight on the ENTRY rows as written in the ledger
    pub recorded_kg: Decimal,
    /// Weight on the ENTRY rows after reconciliation
    pub corrected_kg: Decimal,
}

/// Manifest figures attached to a single stock position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestFigures {
    pub imported_kg: Decimal,
    pub imported_boxes: Decimal,
    pub kg_difference: Decimal,
    pub percent_utilized: Decimal,
}

impl ManifestFigures {
    /// Compare imported weight with the weight a position still holds
    pub fn compare(entry: &ImportManifestEntry, stock_kg: Decimal) -> Self {
        let kg_difference = entry.net_weight_kg - stock_kg;
        Self {
            imported_kg: entry.net_weight_kg.round_dp(2),
            imported_boxes: entry.box_count.round_dp(2),
            kg_difference: kg_difference.round_dp(2),
            percent_utilized: percentage(kg_difference, entry.net_weight_kg),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconciliationOutcome {
    /// Initial-lot products with no manifest row
    pub unmatched_products: Vec<String>,
    pub comparisons: Vec<ManifestComparison>,
}

#[derive(Debug, Default)]
struct InitialEntryTotals {
    boxes: Decimal,
    recorded_kg: Decimal,
    corrected_kg: Decimal,
}

/// Re-weight initial-lot ENTRY rows from the manifest, in place
pub fn reconcile_initial_entries(
    records: &mut [MovementRecord],
    manifest: &Manifest,
    selector: &LotSelector,
) -> ReconciliationOutcome {
    if !selector.is_enabled() {
        debug!("No initial lot configured, skipping manifest reconciliation");
        return ReconciliationOutcome::default();
    }

    let mut totals: BTreeMap<String, InitialEntryTotals> = BTreeMap::new();
    let mut unmatched = BTreeSet::new();
    let mut corrected_rows = 0;

    for record in records
        .iter_mut()
        .filter(|r| r.kind == MovementKind::Entry && selector.matches(&r.lot))
    {
        let product_totals = totals.entry(record.product.clone()).or_default();
        product_totals.boxes += record.boxes;
        product_totals.recorded_kg += record.weight_kg;

        match manifest.get(&record.product) {
            Some(entry) => {
                let corrected = entry
                    .kg_per_box()
                    .and_then(|kg_per_box| kg_per_box.checked_mul(record.boxes));
                match corrected {
                    Some(kg) if kg.abs() <= MAX_CELL_MAGNITUDE => {
                        debug!(
                            "Row {}: {} weight {} -> {}",
                            record.row, record.product, record.weight_kg, kg
                        );
                        record.weight_kg = kg;
                        corrected_rows += 1;
                    }
                    Some(_) => warn!(
                        "Row {}: corrected weight for {} is out of range, keeping {}",
                        record.row, record.product, record.weight_kg
                    ),
                    None if entry.box_count > Decimal::ZERO => warn!(
                        "Row {}: corrected weight for {} overflowed, keeping {}",
                        record.row, record.product, record.weight_kg
                    ),
                    None => {}
                }
            }
            None => {
                unmatched.insert(record.product.clone());
            }
        }

        product_totals.corrected_kg += record.weight_kg;
    }

    let comparisons = manifest
        .iter()
        .map(|entry| {
            let seen = totals.get(&entry.product);
            let pick = |f: fn(&InitialEntryTotals) -> Decimal| {
                seen.map(f).unwrap_or(Decimal::ZERO).round_dp(2)
            };
            ManifestComparison {
                product: entry.product.clone(),
                manifest_kg: entry.net_weight_kg.round_dp(2),
                manifest_boxes: entry.box_count.round_dp(2),
                entry_boxes: pick(|t| t.boxes),
                recorded_kg: pick(|t| t.recorded_kg),
                corrected_kg: pick(|t| t.corrected_kg),
            }
        })
        .collect();

    info!(
        "Manifest reconciliation corrected {} entry rows ({} products without manifest)",
        corrected_rows,
        unmatched.len()
    );

    ReconciliationOutcome {
        unmatched_products: unmatched.into_iter().collect(),
        comparisons,
    }
}
