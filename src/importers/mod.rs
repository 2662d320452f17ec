// Import module - ledger and manifest tables from CSV or Excel

pub mod csv_table;
pub mod excel_table;
pub mod ledger;
pub mod manifest;
pub mod table;

use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::info;

use crate::error::LedgerError;

pub use ledger::{normalize_ledger, NormalizedLedger};
pub use manifest::{parse_manifest, Manifest};
pub use table::RawTable;

/// Read a table from a file (auto-detects Excel vs CSV by extension)
///
/// `sheet` selects a worksheet in workbooks and is ignored for CSV.
pub fn read_table<P: AsRef<Path>>(file_path: P, sheet: Option<&str>) -> Result<RawTable> {
    let path = file_path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| anyhow!("File has no extension: {:?}", path))?
        .to_lowercase();

    info!("Reading table: {:?} (type: {})", path, extension);

    match extension.as_str() {
        "xlsx" | "xls" => excel_table::read_excel_table(path, sheet),
        "csv" | "txt" => csv_table::read_csv_table(path),
        _ => Err(LedgerError::UnsupportedFormat(extension).into()),
    }
}
