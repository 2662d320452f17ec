use anyhow::{Context, Result};
use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, info};

use super::table::RawTable;
use crate::error::LedgerError;

/// Read a delimited file into a RawTable
pub fn read_csv_table<P: AsRef<Path>>(file_path: P) -> Result<RawTable> {
    let path = file_path.as_ref();
    info!("Reading CSV table: {:?}", path);

    let bytes = std::fs::read(path).with_context(|| format!("Failed to open CSV file {:?}", path))?;
    parse_csv_table(&bytes)
}

/// Parse CSV bytes; the first record is the header
///
/// Spreadsheet exports on Spanish-locale machines are often Windows-1252 and
/// semicolon-delimited, so both the encoding and the delimiter are sniffed.
pub fn parse_csv_table(bytes: &[u8]) -> Result<RawTable> {
    let content = decode(bytes);
    let content = content.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(content);
    debug!("CSV delimiter: {:?}", delimiter as char);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true) // Allow variable number of columns
        .from_reader(content.as_bytes());

    let mut values = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| LedgerError::Parse(format!("CSV record {}: {}", idx + 1, e)))?;
        values.push(record.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    let table = RawTable::from_values(values);
    info!("Read {} data rows from CSV", table.len());
    Ok(table)
}

fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            debug!("CSV is not valid UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = WINDOWS_1252.decode(bytes);
            decoded
        }
    }
}

fn sniff_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or("");
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comma_delimited() {
        let table = parse_csv_table(b"nombre,lote,cajas\nLOMO,L1,10\n").unwrap();
        assert_eq!(table.header, vec!["nombre", "lote", "cajas"]);
        assert_eq!(table.rows, vec![vec!["LOMO", "L1", "10"]]);
    }

    #[test]
    fn test_parse_semicolon_with_decimal_commas() {
        let table = parse_csv_table(b"MERCADERIA;KG NETOS;CAJAS\nLOMO;1250,5;50\n").unwrap();
        assert_eq!(table.header.len(), 3);
        assert_eq!(table.rows[0][1], "1250,5");
    }

    #[test]
    fn test_windows_1252_fallback() {
        // "almacén" with é encoded as 0xE9
        let bytes = b"nombre,almac\xe9n\nLOMO,CENTRAL\n";
        let table = parse_csv_table(bytes).unwrap();
        assert_eq!(table.header[1], "almacén");
    }

    #[test]
    fn test_bom_and_ragged_rows() {
        let table = parse_csv_table("\u{feff}a,b,c\n1,2\n".as_bytes()).unwrap();
        assert_eq!(table.header[0], "a");
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
    }
}
