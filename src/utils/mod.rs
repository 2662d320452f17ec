//! Formatting helpers for log lines and presentation layers

use rust_decimal::{Decimal, RoundingStrategy};

const MILLION: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
const THOUSAND: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

/// Fixed-point rendering with `decimals` places, half away from zero.
fn fixed(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", decimals as usize, rounded)
}

/// Compact rendering with a K/M suffix based on magnitude.
///
/// # Examples
/// ```
/// use stock_ledger::utils::format_compact;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_compact(dec!(1500000), 2), "1.50M");
/// assert_eq!(format_compact(dec!(12345), 2), "12.35K");
/// assert_eq!(format_compact(dec!(999), 2), "999.00");
/// ```
pub fn format_compact(value: Decimal, decimals: u32) -> String {
    let magnitude = value.abs();
    if magnitude >= MILLION {
        format!("{}M", fixed(value / MILLION, decimals))
    } else if magnitude >= THOUSAND {
        format!("{}K", fixed(value / THOUSAND, decimals))
    } else {
        fixed(value, decimals)
    }
}

/// Two-decimal fixed point: "1234.50"
///
/// # Examples
/// ```
/// use stock_ledger::utils::format_decimal;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_decimal(dec!(1234.5)), "1234.50");
/// ```
pub fn format_decimal(value: Decimal) -> String {
    fixed(value, 2)
}
