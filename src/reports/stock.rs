//! Stock aggregator
//!
//! Folds the normalized ledger into one position per (warehouse, product, lot).
//! For each position, in boxes and in kg:
//!
//! - entries: ENTRY rows whose source warehouse is this one
//! - transfers received: TRANSFER rows whose destination is this one
//! - transfers sent: TRANSFER rows whose source is this one
//! - exits: EXIT rows whose source is this one (their total price is the sales value)
//!
//! `total_initial = entries + transfers_received` and
//! `stock = total_initial - transfers_sent - exits`.
//!
//! The ledger is grouped once by (product, lot) and each group is folded per
//! warehouse, so a position costs time proportional to its own rows. Blank
//! warehouse names never form a position. Positions with no history and no
//! stock are dropped. Sums rely on the normalizer's cell bound
//! (`MAX_CELL_MAGNITUDE`) to stay within `Decimal` range.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::importers::Manifest;
use crate::models::{MovementKind, MovementRecord, StockState};
use crate::reconciliation::{LotSelector, ManifestFigures};

use super::metrics::{percentage, StockThresholds};

/// Per-direction sums for one position, in a single unit (boxes or kg)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MovementTotals {
    pub entries: Decimal,
    pub transfers_received: Decimal,
    pub transfers_sent: Decimal,
    pub exits: Decimal,
}

impl MovementTotals {
    pub fn total_initial(&self) -> Decimal {
        self.entries + self.transfers_received
    }

    pub fn outgoing(&self) -> Decimal {
        self.transfers_sent + self.exits
    }

    pub fn net(&self) -> Decimal {
        self.total_initial() - self.outgoing()
    }
}

/// Aggregation key; field order gives the output ordering
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PositionKey {
    pub warehouse: String,
    pub product: String,
    pub lot: String,
}

/// Unrounded sums collected for one position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionFlows {
    pub boxes: MovementTotals,
    pub kg: MovementTotals,
    pub sales_value: Decimal,
}

impl PositionFlows {
    /// A position is reported when it has any inflow or a non-zero balance
    pub fn is_reportable(&self) -> bool {
        self.boxes.total_initial() > Decimal::ZERO || self.boxes.net() != Decimal::ZERO
    }
}

/// One computed stock position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockPosition {
    pub warehouse: String,
    pub product: String,
    pub lot: String,
    pub stock: Decimal,
    pub kg_total: Decimal,
    pub total_initial: Decimal,
    pub entries: Decimal,
    pub transfers_received: Decimal,
    pub transfers_sent: Decimal,
    pub exits: Decimal,
    pub sales_value: Decimal,
    pub percent_sold: Decimal,
    pub percent_available: Decimal,
    /// Same figure as `percent_sold`, reported under its own label
    pub rotation: Decimal,
    pub state: StockState,
    pub kg_entries: Decimal,
    pub kg_transfers_received: Decimal,
    pub kg_transfers_sent: Decimal,
    pub kg_exits: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestFigures>,
}

impl StockPosition {
    pub fn from_flows(
        key: PositionKey,
        flows: &PositionFlows,
        thresholds: &StockThresholds,
    ) -> Self {
        let boxes = &flows.boxes;
        let kg = &flows.kg;
        let total_initial = boxes.total_initial();
        let stock = boxes.net();
        let percent_sold = percentage(boxes.exits, total_initial);

        Self {
            warehouse: key.warehouse,
            product: key.product,
            lot: key.lot,
            stock: stock.round_dp(2),
            kg_total: kg.net().round_dp(2),
            total_initial: total_initial.round_dp(2),
            entries: boxes.entries.round_dp(2),
            transfers_received: boxes.transfers_received.round_dp(2),
            transfers_sent: boxes.transfers_sent.round_dp(2),
            exits: boxes.exits.round_dp(2),
            sales_value: flows.sales_value.round_dp(2),
            percent_sold,
            percent_available: percentage(stock, total_initial),
            rotation: percent_sold,
            state: thresholds.classify(stock),
            kg_entries: kg.entries.round_dp(2),
            kg_transfers_received: kg.transfers_received.round_dp(2),
            kg_transfers_sent: kg.transfers_sent.round_dp(2),
            kg_exits: kg.exits.round_dp(2),
            manifest: None,
        }
    }

    /// Entries plus transfers received
    pub fn boxes_in(&self) -> Decimal {
        self.total_initial
    }

    /// Transfers sent plus exits
    pub fn boxes_out(&self) -> Decimal {
        self.transfers_sent + self.exits
    }
}

/// Group the ledger and fold every (product, lot) group per warehouse
pub fn aggregate_flows(records: &[MovementRecord]) -> BTreeMap<PositionKey, PositionFlows> {
    let mut by_product_lot: HashMap<(&str, &str), Vec<&MovementRecord>> = HashMap::new();
    for record in records.iter().filter(|r| r.kind.is_standard()) {
        by_product_lot
            .entry((record.product.as_str(), record.lot.as_str()))
            .or_default()
            .push(record);
    }
    debug!("Ledger grouped into {} product/lot groups", by_product_lot.len());

    let mut flows = BTreeMap::new();
    for ((product, lot), rows) in by_product_lot {
        let mut by_warehouse: HashMap<&str, PositionFlows> = HashMap::new();
        for record in rows {
            apply_movement(&mut by_warehouse, record);
        }
        for (warehouse, position_flows) in by_warehouse {
            flows.insert(
                PositionKey {
                    warehouse: warehouse.to_string(),
                    product: product.to_string(),
                    lot: lot.to_string(),
                },
                position_flows,
            );
        }
    }
    flows
}

fn apply_movement<'a>(
    by_warehouse: &mut HashMap<&'a str, PositionFlows>,
    record: &'a MovementRecord,
) {
    match record.kind {
        MovementKind::Entry => {
            if let Some(flows) = bucket(by_warehouse, &record.source_warehouse) {
                flows.boxes.entries += record.boxes;
                flows.kg.entries += record.weight_kg;
            }
        }
        MovementKind::Exit => {
            if let Some(flows) = bucket(by_warehouse, &record.source_warehouse) {
                flows.boxes.exits += record.boxes;
                flows.kg.exits += record.weight_kg;
                flows.sales_value += record.total_price;
            }
        }
        MovementKind::Transfer => {
            if let Some(flows) = bucket(by_warehouse, &record.destination_warehouse) {
                flows.boxes.transfers_received += record.boxes;
                flows.kg.transfers_received += record.weight_kg;
            }
            if let Some(flows) = bucket(by_warehouse, &record.source_warehouse) {
                flows.boxes.transfers_sent += record.boxes;
                flows.kg.transfers_sent += record.weight_kg;
            }
        }
        MovementKind::Other(_) => {}
    }
}

fn bucket<'m, 'a>(
    by_warehouse: &'m mut HashMap<&'a str, PositionFlows>,
    warehouse: &'a str,
) -> Option<&'m mut PositionFlows> {
    if warehouse.is_empty() {
        None
    } else {
        Some(by_warehouse.entry(warehouse).or_default())
    }
}

/// Turn collected flows into reportable positions, in (warehouse, product, lot) order
pub fn build_positions(
    flows: BTreeMap<PositionKey, PositionFlows>,
    thresholds: &StockThresholds,
) -> Vec<StockPosition> {
    flows
        .into_iter()
        .filter(|(_, f)| f.is_reportable())
        .map(|(key, f)| StockPosition::from_flows(key, &f, thresholds))
        .collect()
}

/// Compute every stock position of a normalized ledger
pub fn compute_stock_positions(
    records: &[MovementRecord],
    thresholds: &StockThresholds,
) -> Vec<StockPosition> {
    let positions = build_positions(aggregate_flows(records), thresholds);
    info!("Computed {} stock positions", positions.len());
    positions
}

/// Attach manifest figures to positions of the initial lot
pub fn attach_manifest(
    positions: &mut [StockPosition],
    manifest: &Manifest,
    selector: &LotSelector,
) {
    for position in positions.iter_mut().filter(|p| selector.matches(&p.lot)) {
        if let Some(entry) = manifest.get(&position.product) {
            position.manifest = Some(ManifestFigures::compare(entry, position.kg_total));
        }
    }
}
