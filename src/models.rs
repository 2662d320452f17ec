//! Ledger data model: movement rows, manifest rows and stock-health states.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

/// Direction of a ledger movement
///
/// The ledger writes these in Spanish (`ENTRADA`, `SALIDA`, `TRASPASO`);
/// the English names are accepted as aliases. Anything else is kept verbatim
/// as `Other` so it can be reported, and never lands in a stock bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MovementKind {
    Entry,
    Exit,
    Transfer,
    Other(String),
}

impl MovementKind {
    /// Upper-case and classify a raw cell value
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            "ENTRADA" | "ENTRY" => MovementKind::Entry,
            "SALIDA" | "EXIT" => MovementKind::Exit,
            "TRASPASO" | "TRANSFER" => MovementKind::Transfer,
            _ => MovementKind::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MovementKind::Entry => "ENTRADA",
            MovementKind::Exit => "SALIDA",
            MovementKind::Transfer => "TRASPASO",
            MovementKind::Other(value) => value,
        }
    }

    pub fn is_standard(&self) -> bool {
        !matches!(self, MovementKind::Other(_))
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MovementKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One normalized ledger row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementRecord {
    /// Spreadsheet row number (header is row 1)
    pub row: usize,
    pub product: String,
    pub lot: String,
    pub kind: MovementKind,
    pub source_warehouse: String,
    /// Only meaningful for transfers
    pub destination_warehouse: String,
    pub boxes: Decimal,
    pub weight_kg: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub client: Option<String>,
    pub seller: Option<String>,
}

/// One row of the import/packing-list feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportManifestEntry {
    pub product: String,
    pub net_weight_kg: Decimal,
    pub box_count: Decimal,
}

impl ImportManifestEntry {
    /// Weight of a single box, when the manifest records any boxes
    pub fn kg_per_box(&self) -> Option<Decimal> {
        if self.box_count > Decimal::ZERO {
            self.net_weight_kg.checked_div(self.box_count)
        } else {
            None
        }
    }
}

/// Stock-health classification of a position
///
/// Variants are declared from most to least severe, so `Ord` follows severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StockState {
    #[serde(alias = "CRÍTICO", alias = "CRITICO")]
    Critical,
    #[serde(alias = "BAJO")]
    Low,
    Normal,
}

impl StockState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockState::Critical => "CRITICAL",
            StockState::Low => "LOW",
            StockState::Normal => "NORMAL",
        }
    }
}

impl fmt::Display for StockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CRITICAL" | "CRÍTICO" | "CRITICO" => Ok(StockState::Critical),
            "LOW" | "BAJO" => Ok(StockState::Low),
            "NORMAL" => Ok(StockState::Normal),
            _ => Err(()),
        }
    }
}

/// Canonical form of a product name: NFC, upper-case, single spaces
///
/// Ledger and manifest names are both passed through this before any lookup.
pub fn normalize_name(input: &str) -> String {
    let composed: String = input.nfc().collect();
    composed
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
