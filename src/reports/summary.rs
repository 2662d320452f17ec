//! Filtered views and per-product / per-warehouse summaries over stock positions.

use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::StockState;

use super::metrics::{mean, StockThresholds};
use super::stock::StockPosition;

/// Restricts positions by lot, warehouse and state
///
/// An empty set places no restriction on that field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionFilter {
    pub lots: BTreeSet<String>,
    pub warehouses: BTreeSet<String>,
    pub states: BTreeSet<StockState>,
}

impl PositionFilter {
    pub fn with_lots<I, S>(mut self, lots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lots.extend(lots.into_iter().map(Into::into));
        self
    }

    pub fn with_warehouses<I, S>(mut self, warehouses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.warehouses.extend(warehouses.into_iter().map(Into::into));
        self
    }

    pub fn with_states<I: IntoIterator<Item = StockState>>(mut self, states: I) -> Self {
        self.states.extend(states);
        self
    }

    pub fn matches(&self, position: &StockPosition) -> bool {
        (self.lots.is_empty() || self.lots.contains(&position.lot))
            && (self.warehouses.is_empty() || self.warehouses.contains(&position.warehouse))
            && (self.states.is_empty() || self.states.contains(&position.state))
    }

    pub fn apply<'a>(&self, positions: &'a [StockPosition]) -> Vec<&'a StockPosition> {
        positions.iter().filter(|p| self.matches(p)).collect()
    }
}

/// Everything known about one product across warehouses and lots
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub product: String,
    pub total_stock: Decimal,
    pub total_kg: Decimal,
    pub total_sales: Decimal,
    pub mean_rotation: Decimal,
    /// The product's positions, by (warehouse, lot)
    pub positions: Vec<StockPosition>,
}

pub fn product_summary<'a, I>(positions: I, product: &str) -> Option<ProductSummary>
where
    I: IntoIterator<Item = &'a StockPosition>,
{
    let rows: Vec<StockPosition> = positions
        .into_iter()
        .filter(|p| p.product == product)
        .sorted_by(|a, b| (&a.warehouse, &a.lot).cmp(&(&b.warehouse, &b.lot)))
        .cloned()
        .collect();
    if rows.is_empty() {
        return None;
    }

    Some(ProductSummary {
        product: product.to_string(),
        total_stock: rows.iter().map(|p| p.stock).sum(),
        total_kg: rows.iter().map(|p| p.kg_total).sum(),
        total_sales: rows.iter().map(|p| p.sales_value).sum(),
        mean_rotation: mean(rows.iter().map(|p| p.rotation)),
        positions: rows,
    })
}

/// One product's rollup inside a warehouse
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseProductRow {
    pub product: String,
    pub stock: Decimal,
    pub kg_total: Decimal,
    pub total_initial: Decimal,
    pub exits: Decimal,
    pub mean_percent_sold: Decimal,
    pub mean_percent_available: Decimal,
    /// Classified on the summed stock, not taken from any single lot
    pub state: StockState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseSummary {
    pub warehouse: String,
    pub product_count: usize,
    pub total_stock: Decimal,
    pub critical_count: usize,
    /// Sorted by stock, largest first
    pub products: Vec<WarehouseProductRow>,
}

pub fn warehouse_summary<'a, I>(
    positions: I,
    warehouse: &str,
    thresholds: &StockThresholds,
) -> Option<WarehouseSummary>
where
    I: IntoIterator<Item = &'a StockPosition>,
{
    let rows: Vec<&StockPosition> = positions
        .into_iter()
        .filter(|p| p.warehouse == warehouse)
        .collect();
    if rows.is_empty() {
        return None;
    }

    let mut by_product: BTreeMap<&str, Vec<&StockPosition>> = BTreeMap::new();
    for position in rows.iter().copied() {
        by_product.entry(position.product.as_str()).or_default().push(position);
    }

    let mut products: Vec<WarehouseProductRow> = by_product
        .into_iter()
        .map(|(product, lots)| {
            let stock: Decimal = lots.iter().map(|p| p.stock).sum();
            WarehouseProductRow {
                product: product.to_string(),
                stock,
                kg_total: lots.iter().map(|p| p.kg_total).sum(),
                total_initial: lots.iter().map(|p| p.total_initial).sum(),
                exits: lots.iter().map(|p| p.exits).sum(),
                mean_percent_sold: mean(lots.iter().map(|p| p.percent_sold)),
                mean_percent_available: mean(lots.iter().map(|p| p.percent_available)),
                state: thresholds.classify(stock),
            }
        })
        .collect();
    products.sort_by(|a, b| b.stock.cmp(&a.stock).then_with(|| a.product.cmp(&b.product)));

    Some(WarehouseSummary {
        warehouse: warehouse.to_string(),
        product_count: products.len(),
        total_stock: rows.iter().map(|p| p.stock).sum(),
        critical_count: rows
            .iter()
            .filter(|p| p.state == StockState::Critical)
            .count(),
        products,
    })
}
