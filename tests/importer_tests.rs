//! File adapters feeding the refresh pipeline
//!
//! CSV files are written as raw bytes (to exercise delimiter sniffing and the
//! Windows-1252 fallback); workbooks are generated with rust_xlsxwriter.

use rust_decimal_macros::dec;
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::Path;
use stock_ledger::importers::read_table;
use stock_ledger::models::StockState;
use stock_ledger::{refresh, refresh_from_config, Config, LedgerError};
use tempfile::TempDir;

const LEDGER_HEADER: [&str; 11] = [
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

fn write_ledger_xlsx(path: &Path) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Movimientos").unwrap();

    for (col, header) in LEDGER_HEADER.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header).unwrap();
    }

    // product, lot, kind, source, destination, then boxes, kg, price, total
    let rows: [(&str, &str, &str, &str, &str, [f64; 4], &str); 3] = [
        ("Salmón", "LOTE 1", "ENTRADA", "WH1", "", [100.0, 1000.0, 0.0, 0.0], ""),
        ("Salmón", "LOTE 1", "TRASPASO", "WH1", "WH2", [18.0, 180.0, 0.0, 0.0], ""),
        ("Salmón", "LOTE 1", "SALIDA", "WH1", "", [30.0, 300.0, 2.5, 750.0], "ACME"),
    ];
    for (i, (product, lot, kind, src, dst, numbers, client)) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        let text = [(0, *product), (1, *lot), (2, *kind), (3, *src), (4, *dst), (9, *client)];
        // Blank cells are left unwritten
        for (col, value) in text.iter().filter(|(_, v)| !v.is_empty()) {
            worksheet.write_string(row, *col, *value).unwrap();
        }
        for (offset, value) in numbers.iter().enumerate() {
            worksheet.write_number(row, 5 + offset as u16, *value).unwrap();
        }
    }

    workbook.save(path).unwrap();
}

#[test]
fn test_semicolon_csv_with_latin1_bytes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.csv");

    let mut bytes = Vec::new();
    bytes.extend_from_slice(
        b"Nombre;Lote;Movimiento;Almac\xe9n;Almac\xe9n Actual;Cajas;Kg;Precio;Precio Total\n",
    );
    bytes.extend_from_slice(b"Salm\xf3n;L1;ENTRADA;WH1;;10;100;0;0\n");
    bytes.extend_from_slice(b";;;;;;;;\n");
    bytes.extend_from_slice(b"Salm\xf3n;L1;SALIDA;WH1;;4;40;3;120\n");
    fs::write(&path, bytes).unwrap();

    let table = read_table(&path, None).unwrap();
    assert_eq!(table.header[3], "Almacén");
    assert_eq!(table.len(), 2);

    let report = refresh(&table, None, &Config::default()).unwrap();
    assert_eq!(report.positions.len(), 1);
    assert_eq!(report.positions[0].product, "SALMÓN");
    assert_eq!(report.positions[0].stock, dec!(6));
    assert_eq!(report.positions[0].state, StockState::Low);
    assert_eq!(report.sales.total_sales, dec!(120));
}

#[test]
fn test_comma_csv_with_short_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.txt");
    fs::write(
        &path,
        "NOMBRE,LOTE,MOVIMIENTO,ALMACEN,ALMACEN ACTUAL,CAJAS,KG,PRECIO,PRECIO TOTAL\n\
         A,L1,ENTRADA,WH1,,50,500\n",
    )
    .unwrap();

    let table = read_table(&path, None).unwrap();
    assert_eq!(table.rows[0].len(), table.header.len());

    let report = refresh(&table, None, &Config::default()).unwrap();
    assert_eq!(report.positions[0].stock, dec!(50));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.json");
    fs::write(&path, "{}").unwrap();

    let err = read_table(&path, None).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_xlsx_ledger_named_sheet() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.xlsx");
    write_ledger_xlsx(&path);

    let table = read_table(&path, Some("Movimientos")).unwrap();
    assert_eq!(table.len(), 3);
    // Whole numbers come back without a trailing ".0"
    assert_eq!(table.rows[0][5], "100");
    assert_eq!(table.rows[2][7], "2.5");

    let report = refresh(&table, None, &Config::default()).unwrap();
    let wh1 = report.positions.iter().find(|p| p.warehouse == "WH1").unwrap();
    let wh2 = report.positions.iter().find(|p| p.warehouse == "WH2").unwrap();
    assert_eq!(wh1.stock, dec!(52));
    assert_eq!(wh2.stock, dec!(18));
    assert_eq!(wh2.state, StockState::Low);
}

#[test]
fn test_xlsx_missing_sheet_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.xlsx");
    write_ledger_xlsx(&path);

    assert!(read_table(&path, Some("Nope")).is_err());
}

#[test]
fn test_refresh_from_config_files() {
    let dir = TempDir::new().unwrap();
    write_ledger_xlsx(&dir.path().join("ledger.xlsx"));
    fs::write(
        dir.path().join("manifest.csv"),
        "MERCADERIA;KG NETOS;CAJAS\nsalmón;1.250,5;125\n",
    )
    .unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[sources]
ledger = "ledger.xlsx"
ledger_sheet = "Movimientos"
manifest = "manifest.csv"

[reconciliation]
initial_lot = "lote 1"
"#,
    )
    .unwrap();

    let config = Config::load(&config_path).unwrap();
    let report = refresh_from_config(&config).unwrap();

    // 1250.5 kg over 125 boxes is 10.004 kg per box
    let comparison = &report.manifest[0];
    assert_eq!(comparison.product, "SALMÓN");
    assert_eq!(comparison.manifest_kg, dec!(1250.5));
    assert_eq!(comparison.corrected_kg, dec!(1000.4));

    let wh1 = report.positions.iter().find(|p| p.warehouse == "WH1").unwrap();
    assert_eq!(wh1.kg_entries, dec!(1000.4));
    assert!(wh1.manifest.is_some());
}
