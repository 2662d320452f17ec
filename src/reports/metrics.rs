//! Percentages, stock-health classification and portfolio rollups.

use itertools::Itertools;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::LedgerError;
use crate::models::StockState;

use super::stock::StockPosition;

/// `part / total * 100`, rounded to 2 places
///
/// 0 when `total` is not positive or the ratio does not fit in a `Decimal`.
pub fn percentage(part: Decimal, total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part.checked_div(total)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| pct.round_dp(2))
        .unwrap_or_else(|| {
            warn!("Percentage {} / {} overflowed, reporting 0", part, total);
            Decimal::ZERO
        })
}

/// Mean of a set of values, rounded to 2 places; 0 when empty or on overflow
pub fn mean<I: IntoIterator<Item = Decimal>>(values: I) -> Decimal {
    let folded = values
        .into_iter()
        .try_fold((Decimal::ZERO, 0u32), |(sum, count), v| {
            sum.checked_add(v).map(|sum| (sum, count + 1))
        });
    match folded {
        Some((_, 0)) => Decimal::ZERO,
        Some((sum, count)) => (sum / Decimal::from(count)).round_dp(2),
        None => {
            warn!("Mean overflowed, reporting 0");
            Decimal::ZERO
        }
    }
}

/// Upper bound (inclusive) on remaining boxes for a state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLevel {
    pub state: StockState,
    pub max_boxes: Decimal,
}

/// Serialized shape of the `[thresholds]` config table
#[derive(Debug, Deserialize)]
pub struct ThresholdsConfig {
    pub levels: Vec<ThresholdLevel>,
}

/// Ordered stock-health thresholds
///
/// Levels are evaluated in ascending `max_boxes` order and the first level
/// whose bound holds wins; stock above every bound is NORMAL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ThresholdsConfig")]
pub struct StockThresholds {
    levels: Vec<ThresholdLevel>,
}

impl StockThresholds {
    /// Validate a level list: strictly ascending bounds, no NORMAL level
    pub fn try_new(levels: Vec<ThresholdLevel>) -> Result<Self, LedgerError> {
        if levels.iter().any(|l| l.state == StockState::Normal) {
            return Err(LedgerError::Config(
                "NORMAL is the fallback state and takes no threshold".to_string(),
            ));
        }
        if levels.iter().map(|l| l.state).duplicates().next().is_some() {
            return Err(LedgerError::Config(
                "each stock state may appear only once in thresholds".to_string(),
            ));
        }
        if levels
            .iter()
            .tuple_windows()
            .any(|(a, b)| a.max_boxes >= b.max_boxes || a.state >= b.state)
        {
            return Err(LedgerError::Config(
                "threshold bounds must be strictly ascending, most severe state first"
                    .to_string(),
            ));
        }
        Ok(Self { levels })
    }

    pub fn classify(&self, stock: Decimal) -> StockState {
        self.levels
            .iter()
            .find(|level| stock <= level.max_boxes)
            .map(|level| level.state)
            .unwrap_or(StockState::Normal)
    }
}

impl Default for StockThresholds {
    fn default() -> Self {
        Self {
            levels: vec![
                ThresholdLevel {
                    state: StockState::Critical,
                    max_boxes: Decimal::from(5),
                },
                ThresholdLevel {
                    state: StockState::Low,
                    max_boxes: Decimal::from(20),
                },
            ],
        }
    }
}

impl TryFrom<ThresholdsConfig> for StockThresholds {
    type Error = LedgerError;

    fn try_from(file: ThresholdsConfig) -> Result<Self, Self::Error> {
        Self::try_new(file.levels)
    }
}

/// Rollup over a (possibly filtered) set of positions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioMetrics {
    pub product_count: usize,
    pub warehouse_count: usize,
    pub lot_count: usize,
    pub total_boxes: Decimal,
    pub total_kg: Decimal,
    pub total_sales: Decimal,
    pub critical_count: usize,
    pub mean_rotation: Decimal,
}

impl PortfolioMetrics {
    pub fn from_positions<'a, I>(positions: I) -> Self
    where
        I: IntoIterator<Item = &'a StockPosition>,
    {
        let positions: Vec<&StockPosition> = positions.into_iter().collect();
        if positions.is_empty() {
            return Self::default();
        }

        Self {
            product_count: positions.iter().map(|p| &p.product).unique().count(),
            warehouse_count: positions.iter().map(|p| &p.warehouse).unique().count(),
            lot_count: positions.iter().map(|p| &p.lot).unique().count(),
            total_boxes: positions.iter().map(|p| p.stock).sum(),
            total_kg: positions.iter().map(|p| p.kg_total).sum(),
            total_sales: positions.iter().map(|p| p.sales_value).sum(),
            critical_count: positions
                .iter()
                .filter(|p| p.state == StockState::Critical)
                .count(),
            mean_rotation: mean(positions.iter().map(|p| p.rotation)),
        }
    }
}
