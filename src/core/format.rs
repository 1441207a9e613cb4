//! Output formatting of monetary values, quantities and rates.
//!
//! The same helpers are used by every renderer so the documents agree on
//! each printed figure.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round half away from zero to `dp` places.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether `value` can be held at a scale of two decimals.
pub fn fits_2dp(value: Decimal) -> bool {
    let mut rounded = round_half_up(value, 2);
    rounded.rescale(2);
    rounded.scale() == 2
}

/// Exactly two decimals, no grouping: `1234.5` → `"1234.50"`.
///
/// Values too large for a scale of two are zero-padded in the text.
pub fn amount_2dp(value: Decimal) -> String {
    let mut rounded = round_half_up(value, 2);
    if rounded.is_zero() {
        rounded = Decimal::ZERO;
    }
    rounded.rescale(2);
    let text = rounded.to_string();
    match rounded.scale() {
        2 => text,
        0 => format!("{text}.00"),
        _ => format!("{text}0"),
    }
}

/// Two decimals with thousands separators: `1234567.891` → `"1,234,567.89"`.
pub fn grouped_2dp(value: Decimal) -> String {
    let plain = amount_2dp(value);
    let (sign, digits) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}.{frac_part}")
}

/// Currency-prefixed amount: `"AED 1,234.50"`.
pub fn money(currency: &str, value: Decimal) -> String {
    format!("{currency} {}", grouped_2dp(value))
}

/// Rate fraction as a whole percentage: `0.05` → `"5%"`.
pub fn percent_whole(rate: Decimal) -> String {
    let mut pct = round_half_up(rate.saturating_mul(Decimal::ONE_HUNDRED), 0);
    pct.rescale(0);
    format!("{pct}%")
}

/// Rate fraction as a two-decimal percentage: `0.05` → `"5.00"`.
pub fn percent_2dp(rate: Decimal) -> String {
    amount_2dp(rate.saturating_mul(Decimal::ONE_HUNDRED))
}
