//! Sales and client analytics over priced EXIT movements.
//!
//! Only exits with a unit price above zero count as sales; unpriced exits are
//! non-commercial movements (samples, internal use) and are left out.

use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use crate::models::{MovementKind, MovementRecord};

use super::metrics::percentage;

/// One priced exit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleLine {
    pub row: usize,
    pub product: String,
    pub lot: String,
    /// Empty when the ledger row names no client
    pub client: String,
    pub seller: Option<String>,
    pub warehouse: String,
    pub boxes: Decimal,
    pub weight_kg: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Extract the sales lines from a normalized ledger
pub fn priced_sales(records: &[MovementRecord]) -> Vec<SaleLine> {
    records
        .iter()
        .filter(|r| r.kind == MovementKind::Exit && r.unit_price > Decimal::ZERO)
        .map(|r| SaleLine {
            row: r.row,
            product: r.product.clone(),
            lot: r.lot.clone(),
            client: r.client.clone().unwrap_or_default(),
            seller: r.seller.clone(),
            warehouse: r.source_warehouse.clone(),
            boxes: r.boxes,
            weight_kg: r.weight_kg,
            unit_price: r.unit_price,
            total_price: r.total_price,
        })
        .collect()
}

/// Keys a sales breakdown is grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesGrouping {
    Product,
    ProductLot,
    Client,
    ClientProduct,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    client: Option<String>,
    product: Option<String>,
    lot: Option<String>,
}

impl SalesGrouping {
    fn key(&self, sale: &SaleLine) -> GroupKey {
        let (client, product, lot) = match self {
            SalesGrouping::Product => (None, Some(&sale.product), None),
            SalesGrouping::ProductLot => (None, Some(&sale.product), Some(&sale.lot)),
            SalesGrouping::Client => (Some(&sale.client), None, None),
            SalesGrouping::ClientProduct => (Some(&sale.client), Some(&sale.product), None),
        };
        GroupKey {
            client: client.cloned(),
            product: product.cloned(),
            lot: lot.cloned(),
        }
    }
}

/// Summed sales for one group; key fields not used by the grouping are `None`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesGroup {
    pub product: Option<String>,
    pub lot: Option<String>,
    pub client: Option<String>,
    pub boxes: Decimal,
    pub weight_kg: Decimal,
    pub sales_value: Decimal,
    /// Share of the sales value of the set that was grouped
    pub percent_of_total: Decimal,
    /// 0 when the group recorded no weight
    pub price_per_kg: Decimal,
}

#[derive(Debug, Default)]
struct SalesSums {
    boxes: Decimal,
    weight_kg: Decimal,
    sales_value: Decimal,
}

impl SalesSums {
    fn add(&mut self, sale: &SaleLine) {
        self.boxes += sale.boxes;
        self.weight_kg += sale.weight_kg;
        self.sales_value += sale.total_price;
    }
}

/// `value / kg` rounded to 2 places; 0 when there is no weight or the ratio overflows
pub fn price_per_kg(value: Decimal, kg: Decimal) -> Decimal {
    if kg <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    value
        .checked_div(kg)
        .map(|price| price.round_dp(2))
        .unwrap_or(Decimal::ZERO)
}

/// Group sales, largest sales value first
pub fn group_sales<'a, I>(sales: I, grouping: SalesGrouping) -> Vec<SalesGroup>
where
    I: IntoIterator<Item = &'a SaleLine>,
{
    let mut sums: BTreeMap<GroupKey, SalesSums> = BTreeMap::new();
    let mut grand_total = Decimal::ZERO;
    for sale in sales {
        grand_total += sale.total_price;
        sums.entry(grouping.key(sale)).or_default().add(sale);
    }

    sums.into_iter()
        .map(|(key, s)| SalesGroup {
            product: key.product,
            lot: key.lot,
            client: key.client,
            boxes: s.boxes.round_dp(2),
            weight_kg: s.weight_kg.round_dp(2),
            sales_value: s.sales_value.round_dp(2),
            percent_of_total: percentage(s.sales_value, grand_total),
            price_per_kg: price_per_kg(s.sales_value, s.weight_kg),
        })
        // stable sort keeps key order among equal values
        .sorted_by(|a, b| b.sales_value.cmp(&a.sales_value))
        .collect()
}

/// Headline sales figures with product and client breakdowns
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesOverview {
    pub total_sales: Decimal,
    pub total_kg: Decimal,
    pub total_boxes: Decimal,
    pub average_price_per_kg: Decimal,
    /// Grouped by product and lot
    pub by_product: Vec<SalesGroup>,
    pub by_client: Vec<SalesGroup>,
}

impl SalesOverview {
    pub fn from_sales(sales: &[SaleLine]) -> Self {
        if sales.is_empty() {
            return Self::default();
        }
        let mut totals = SalesSums::default();
        sales.iter().for_each(|s| totals.add(s));

        info!(
            "Sales overview over {} lines, total {}",
            sales.len(),
            totals.sales_value
        );

        Self {
            total_sales: totals.sales_value.round_dp(2),
            total_kg: totals.weight_kg.round_dp(2),
            total_boxes: totals.boxes.round_dp(2),
            average_price_per_kg: price_per_kg(totals.sales_value, totals.weight_kg),
            by_product: group_sales(sales, SalesGrouping::ProductLot),
            by_client: group_sales(sales, SalesGrouping::Client),
        }
    }
}

/// One client's purchases
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientDrillDown {
    pub client: String,
    pub total_sales: Decimal,
    pub total_kg: Decimal,
    pub total_boxes: Decimal,
    /// Share of all sales, not just this client's
    pub percent_of_total: Decimal,
    pub average_price_per_kg: Decimal,
    /// Per-product lines; their percentages are relative to this client
    pub products: Vec<SalesGroup>,
}

pub fn client_drill_down(sales: &[SaleLine], client: &str) -> Option<ClientDrillDown> {
    let grand_total: Decimal = sales.iter().map(|s| s.total_price).sum();
    let mine: Vec<&SaleLine> = sales.iter().filter(|s| s.client == client).collect();
    if mine.is_empty() {
        return None;
    }

    let mut totals = SalesSums::default();
    mine.iter().for_each(|s| totals.add(s));

    Some(ClientDrillDown {
        client: client.to_string(),
        total_sales: totals.sales_value.round_dp(2),
        total_kg: totals.weight_kg.round_dp(2),
        total_boxes: totals.boxes.round_dp(2),
        percent_of_total: percentage(totals.sales_value, grand_total),
        average_price_per_kg: price_per_kg(totals.sales_value, totals.weight_kg),
        products: group_sales(mine, SalesGrouping::Product),
    })
}

/// Restricts sales lines by client, product and seller (empty set = any)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesFilter {
    pub clients: BTreeSet<String>,
    pub products: BTreeSet<String>,
    pub sellers: BTreeSet<String>,
}

impl SalesFilter {
    pub fn matches(&self, sale: &SaleLine) -> bool {
        let seller_ok = self.sellers.is_empty()
            || sale
                .seller
                .as_ref()
                .map(|s| self.sellers.contains(s))
                .unwrap_or(false);
        (self.clients.is_empty() || self.clients.contains(&sale.client))
            && (self.products.is_empty() || self.products.contains(&sale.product))
            && seller_ok
    }
}

/// Individual sales lines matching a filter, by (client, product)
pub fn sales_detail(sales: &[SaleLine], filter: &SalesFilter) -> Vec<SaleLine> {
    sales
        .iter()
        .filter(|s| filter.matches(s))
        .sorted_by(|a, b| (&a.client, &a.product).cmp(&(&b.client, &b.product)))
        .cloned()
        .collect()
}
