use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, info};

use super::table::RawTable;

/// Read one worksheet of an Excel workbook into a RawTable
///
/// Uses the named sheet when given, otherwise the first sheet. Numeric cells
/// are rendered the way a spreadsheet shows them (`10`, not `10.0`), and error
/// cells keep their marker text (`#VALUE!`, `#N/A`) so the normalizer can
/// coerce them.
pub fn read_excel_table<P: AsRef<Path>>(file_path: P, sheet: Option<&str>) -> Result<RawTable> {
    let path = file_path.as_ref();
    info!("Reading Excel table: {:?}", path);

    let mut workbook = open_workbook_auto(path).context("Failed to open Excel file")?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("Workbook has no sheets"))?,
    };
    debug!("Using sheet {:?}", sheet_name);

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read sheet '{}'", sheet_name))?;

    let values: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let table = RawTable::from_values(values);
    info!("Read {} data rows from sheet '{}'", table.len(), sheet_name);
    Ok(table)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        other => other.to_string(),
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
