use assert_cmd::{cargo, prelude::*};
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const LEDGER: &str = "NOMBRE;LOTE;MOVIMIENTO;ALMACEN;ALMACEN ACTUAL;CAJAS;KG;PRECIO;PRECIO TOTAL;CLIENTE
Salmon;L1;ENTRADA;WH1;;100;1000;0;0;
Salmon;L1;SALIDA;WH1;;30;300;3;900;ACME
";

fn setup_config(dir: &TempDir, ledger: &str) -> std::path::PathBuf {
    fs::write(dir.path().join("ledger.csv"), ledger).expect("failed to write ledger");
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[sources]\nledger = \"ledger.csv\"\n").expect("failed to write config");
    config_path
}

#[test]
fn report_json_on_stdout() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let config_path = setup_config(&dir, LEDGER);

    let mut cmd = Command::new(cargo::cargo_bin!("stock-ledger"));
    cmd.env("STOCK_LEDGER_CONFIG", &config_path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"product\": \"SALMON\""))
        .stdout(predicate::str::contains("\"state\": \"NORMAL\""))
        .stdout(predicate::str::contains("\"generated_at\""))
        // Logs stay on stderr
        .stdout(predicate::str::contains("Refresh complete").not());
}

#[test]
fn missing_config_fails() {
    let dir = TempDir::new().expect("failed to create temp dir");

    let mut cmd = Command::new(cargo::cargo_bin!("stock-ledger"));
    cmd.env("STOCK_LEDGER_CONFIG", dir.path().join("absent.toml"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn schema_error_is_fatal() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let config_path = setup_config(&dir, "NOMBRE;LOTE\nSalmon;L1\n");

    let mut cmd = Command::new(cargo::cargo_bin!("stock-ledger"));
    cmd.env("STOCK_LEDGER_CONFIG", &config_path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing required columns"))
        .stdout(predicate::str::is_empty());
}
