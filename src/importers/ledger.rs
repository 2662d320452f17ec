//! Ledger normalizer
//!
//! Turns raw ledger rows into typed [`MovementRecord`]s:
//! - every required column must be present, otherwise the load fails with
//!   [`LedgerError::Schema`] and nothing downstream may run
//! - numeric cells never fail: blanks, `E`, `#VALUE!`, `#N/A` and any other
//!   unparseable text become zero (a known data-quality blind spot)
//! - movement kinds are upper-cased, warehouse names trimmed
//! - unknown movement kinds are kept and reported as a [`LoadWarning`]

use anyhow::Result;
use itertools::Itertools;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::table::{cell, RawTable};
use crate::error::{LedgerError, LoadWarning};
use crate::models::{normalize_name, MovementKind, MovementRecord};

pub const COL_PRODUCT: &str = "nombre";
pub const COL_LOT: &str = "lote";
pub const COL_MOVEMENT: &str = "movimiento";
pub const COL_SOURCE_WAREHOUSE: &str = "almacen";
pub const COL_DESTINATION_WAREHOUSE: &str = "almacen actual";
pub const COL_BOXES: &str = "cajas";
pub const COL_KG: &str = "kg";
pub const COL_UNIT_PRICE: &str = "precio";
pub const COL_TOTAL_PRICE: &str = "precio total";
pub const COL_CLIENT: &str = "cliente";
pub const COL_SELLER: &str = "vendedor";

pub const REQUIRED_COLUMNS: [&str; 9] = [
    COL_PRODUCT,
    COL_LOT,
    COL_MOVEMENT,
    COL_SOURCE_WAREHOUSE,
    COL_DESTINATION_WAREHOUSE,
    COL_BOXES,
    COL_KG,
    COL_UNIT_PRICE,
    COL_TOTAL_PRICE,
];

/// Cell values a spreadsheet uses for "no number here"
const ZERO_MARKERS: [&str; 4] = ["", "E", "#VALUE!", "#N/A"];

/// Normalized ledger plus the non-fatal issues found while reading it
#[derive(Debug, Clone, Default)]
pub struct NormalizedLedger {
    pub records: Vec<MovementRecord>,
    pub warnings: Vec<LoadWarning>,
}

#[derive(Debug)]
struct LedgerColumns {
    product: usize,
    lot: usize,
    movement: usize,
    source_warehouse: usize,
    destination_warehouse: usize,
    boxes: usize,
    kg: usize,
    unit_price: usize,
    total_price: usize,
    client: Option<usize>,
    seller: Option<usize>,
}

impl LedgerColumns {
    fn from_table(table: &RawTable) -> Result<Self, LedgerError> {
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| table.column_index(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(LedgerError::schema(missing));
        }

        let required = |name: &str| table.column_index(name).unwrap_or_default();
        Ok(Self {
            product: required(COL_PRODUCT),
            lot: required(COL_LOT),
            movement: required(COL_MOVEMENT),
            source_warehouse: required(COL_SOURCE_WAREHOUSE),
            destination_warehouse: required(COL_DESTINATION_WAREHOUSE),
            boxes: required(COL_BOXES),
            kg: required(COL_KG),
            unit_price: required(COL_UNIT_PRICE),
            total_price: required(COL_TOTAL_PRICE),
            client: table.column_index(COL_CLIENT),
            seller: table.column_index(COL_SELLER),
        })
    }
}

/// Normalize a raw ledger table
pub fn normalize_ledger(table: &RawTable) -> Result<NormalizedLedger> {
    let columns = LedgerColumns::from_table(table)?;
    debug!("Ledger column mapping: {:?}", columns);

    let records: Vec<MovementRecord> = table
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| parse_row(row, &columns, idx + 2))
        .collect();

    let mut warnings = Vec::new();
    let unexpected: Vec<String> = records
        .iter()
        .filter(|r| !r.kind.is_standard())
        .map(|r| r.kind.as_str().to_string())
        .unique()
        .sorted()
        .collect();
    if !unexpected.is_empty() {
        let warning = LoadWarning::NonStandardMovements { values: unexpected };
        warn!("{}", warning);
        warnings.push(warning);
    }

    info!("Normalized {} ledger rows", records.len());
    Ok(NormalizedLedger { records, warnings })
}

fn parse_row(row: &[String], columns: &LedgerColumns, row_num: usize) -> MovementRecord {
    let optional_text = |idx: Option<usize>| {
        idx.map(|i| cell(row, i).trim().to_string())
            .filter(|s| !s.is_empty())
    };

    MovementRecord {
        row: row_num,
        product: normalize_name(cell(row, columns.product)),
        lot: cell(row, columns.lot).trim().to_string(),
        kind: MovementKind::parse(cell(row, columns.movement)),
        source_warehouse: cell(row, columns.source_warehouse).trim().to_string(),
        destination_warehouse: cell(row, columns.destination_warehouse).trim().to_string(),
        boxes: coerce_decimal(cell(row, columns.boxes)),
        weight_kg: coerce_decimal(cell(row, columns.kg)),
        unit_price: coerce_decimal(cell(row, columns.unit_price)),
        total_price: coerce_decimal(cell(row, columns.total_price)),
        client: optional_text(columns.client),
        seller: optional_text(columns.seller),
    }
}

/// Largest magnitude a numeric cell may carry (1e12); anything beyond is a data-entry error
pub const MAX_CELL_MAGNITUDE: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Parse a numeric cell, resolving anything unreadable or out of range to zero
pub fn coerce_decimal(text: &str) -> Decimal {
    let trimmed = text.trim();
    if ZERO_MARKERS.contains(&trimmed) {
        return Decimal::ZERO;
    }
    match Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed)) {
        Ok(value) if value.abs() <= MAX_CELL_MAGNITUDE => value,
        Ok(value) => {
            warn!("Coercing out-of-range numeric cell {} to zero", value);
            Decimal::ZERO
        }
        Err(_) => {
            debug!("Coercing unparseable numeric cell {:?} to zero", trimmed);
            Decimal::ZERO
        }
    }
}
