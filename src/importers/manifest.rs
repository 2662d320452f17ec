//! Import manifest (packing list) parser
//!
//! The manifest is an independent feed with one row per product: net weight
//! and box count as declared on import. Weights often use a decimal comma.

use anyhow::Result;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::ledger::coerce_decimal;
use super::table::{cell, RawTable};
use crate::error::LedgerError;
use crate::models::{normalize_name, ImportManifestEntry};

pub const COL_MANIFEST_PRODUCT: &str = "MERCADERIA";
pub const COL_MANIFEST_NET_KG: &str = "KG NETOS";
pub const COL_MANIFEST_BOXES: &str = "CAJAS";

/// Manifest entries keyed by normalized product name
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: BTreeMap<String, ImportManifestEntry>,
}

impl Manifest {
    /// Build from entries; rows for the same product are summed
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = ImportManifestEntry>,
    {
        let mut map: BTreeMap<String, ImportManifestEntry> = BTreeMap::new();
        for entry in entries {
            let key = normalize_name(&entry.product);
            if key.is_empty() {
                continue;
            }
            match map.get_mut(&key) {
                Some(existing) => {
                    debug!("Merging duplicate manifest row for {}", key);
                    existing.net_weight_kg += entry.net_weight_kg;
                    existing.box_count += entry.box_count;
                }
                None => {
                    map.insert(
                        key.clone(),
                        ImportManifestEntry {
                            product: key,
                            net_weight_kg: entry.net_weight_kg,
                            box_count: entry.box_count,
                        },
                    );
                }
            }
        }
        Self { entries: map }
    }

    /// Look up a product; the name is normalized before matching
    pub fn get(&self, product: &str) -> Option<&ImportManifestEntry> {
        self.entries.get(&normalize_name(product))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportManifestEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a manifest table (`MERCADERIA`, `KG NETOS`, `CAJAS`)
pub fn parse_manifest(table: &RawTable) -> Result<Manifest> {
    let columns = [COL_MANIFEST_PRODUCT, COL_MANIFEST_NET_KG, COL_MANIFEST_BOXES];
    let missing: Vec<&str> = columns
        .iter()
        .copied()
        .filter(|name| table.column_index(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(LedgerError::schema(missing).into());
    }

    let product_idx = table.column_index(COL_MANIFEST_PRODUCT).unwrap_or_default();
    let kg_idx = table.column_index(COL_MANIFEST_NET_KG).unwrap_or_default();
    let boxes_idx = table.column_index(COL_MANIFEST_BOXES).unwrap_or_default();

    let entries = table.rows.iter().map(|row| ImportManifestEntry {
        product: cell(row, product_idx).to_string(),
        net_weight_kg: parse_locale_decimal(cell(row, kg_idx)),
        box_count: parse_locale_decimal(cell(row, boxes_idx)),
    });

    let manifest = Manifest::from_entries(entries);
    info!("Parsed manifest with {} products", manifest.len());
    Ok(manifest)
}

/// Parse a number written with either decimal separator
///
/// Whichever of `,` and `.` comes last is the decimal separator and the other
/// one groups thousands (`1.250,5` and `1,250.5` are both 1250.5). A lone
/// comma is a decimal comma, so `1,250` reads as 1.25. Unreadable values
/// resolve to zero like every other numeric cell.
pub fn parse_locale_decimal(text: &str) -> Decimal {
    let trimmed = text.trim();
    match (trimmed.rfind(','), trimmed.rfind('.')) {
        (Some(comma), Some(dot)) if dot > comma => coerce_decimal(&trimmed.replace(',', "")),
        (Some(_), _) => coerce_decimal(&trimmed.replace('.', "").replace(',', ".")),
        (None, _) => coerce_decimal(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn manifest_table(rows: &[[&str; 3]]) -> RawTable {
        RawTable::new(
            vec!["MERCADERIA".into(), "KG NETOS".into(), "CAJAS".into()],
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_parse_locale_decimal() {
        assert_eq!(parse_locale_decimal("1250,5"), dec!(1250.5));
        assert_eq!(parse_locale_decimal("1.250,75"), dec!(1250.75));
        assert_eq!(parse_locale_decimal("1250.5"), dec!(1250.5));
        assert_eq!(parse_locale_decimal("1,250.50"), dec!(1250.5));
        assert_eq!(parse_locale_decimal("1,234,567.8"), dec!(1234567.8));
        assert_eq!(parse_locale_decimal("1.234.567,8"), dec!(1234567.8));
        assert_eq!(parse_locale_decimal("1,250"), dec!(1.25));
        assert_eq!(parse_locale_decimal(""), Decimal::ZERO);
        assert_eq!(parse_locale_decimal("n/d"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_manifest_normalizes_names() {
        let manifest = parse_manifest(&manifest_table(&[
            [" lomo vetado ", "500,5", "100"],
            ["", "10", "1"],
        ]))
        .unwrap();
        assert_eq!(manifest.len(), 1);
        let entry = manifest.get("Lomo  Vetado").unwrap();
        assert_eq!(entry.product, "LOMO VETADO");
        assert_eq!(entry.net_weight_kg, dec!(500.5));
        assert_eq!(entry.box_count, dec!(100));
    }

    #[test]
    fn test_duplicate_products_are_summed() {
        let manifest = parse_manifest(&manifest_table(&[
            ["LOMO", "100", "10"],
            ["lomo", "50,5", "5"],
        ]))
        .unwrap();
        let entry = manifest.get("LOMO").unwrap();
        assert_eq!(entry.net_weight_kg, dec!(150.5));
        assert_eq!(entry.box_count, dec!(15));
    }

    #[test]
    fn test_missing_manifest_columns() {
        let table = RawTable::new(vec!["MERCADERIA".into()], vec![]);
        let err = parse_manifest(&table).unwrap_err();
        assert!(err.to_string().contains("KG NETOS"));
        assert!(err.to_string().contains("CAJAS"));
    }
}
