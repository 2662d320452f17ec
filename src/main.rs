use anyhow::Result;
use tracing::info;

use stock_ledger::utils::format_compact;
use stock_ledger::{logging, refresh_from_config, Config};

fn main() -> Result<()> {
    logging::init();

    let config = Config::discover()?;
    let report = refresh_from_config(&config)?;

    info!(
        "{} positions across {} warehouses, {} kg in stock",
        report.positions.len(),
        report.portfolio.warehouse_count,
        format_compact(report.portfolio.total_kg, 2)
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
