//! Lenient price parsing into the catalog's integer minor units.
//!
//! Prices arrive either as numbers or as locale-formatted strings using `,`
//! or `.` as the decimal separator. The catalog stores integers scaled by a
//! fixed factor ([`DEFAULT_PRICE_SCALE`]).
//!
//! Unparseable input normalizes to `0` instead of failing. This can create a
//! zero-priced catalog entry from a typo, but existing callers rely on the
//! fallback, so it is kept. Use [`try_normalize_price`] to detect it.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Multiplier from a unit price to catalog minor units.
pub const DEFAULT_PRICE_SCALE: i64 = 1000;

/// A price as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Amount(f64),
    Text(String),
}

impl Default for PriceInput {
    fn default() -> Self {
        Self::Amount(0.0)
    }
}

impl From<f64> for PriceInput {
    fn from(value: f64) -> Self {
        Self::Amount(value)
    }
}

impl From<&str> for PriceInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Converts `input` to minor units, or `None` if it cannot be parsed or the
/// scaled value does not fit an `i64`.
#[must_use]
pub fn try_normalize_price(input: &PriceInput, scale: i64) -> Option<i64> {
    let amount = match input {
        PriceInput::Amount(value) => Decimal::try_from(*value).ok()?,
        PriceInput::Text(raw) => parse_locale_decimal(raw)?,
    };
    amount
        .checked_mul(Decimal::from(scale))?
        .round()
        .to_i64()
}

/// Converts `input` to minor units, falling back to `0` when unparseable.
#[must_use]
pub fn normalize_price(input: &PriceInput, scale: i64) -> i64 {
    try_normalize_price(input, scale).unwrap_or(0)
}

/// Parses `"12,5"`, `"12.5"`, `"1.234,5"`, `"1,234.5"` and `"1.000.000"`.
///
/// A separator kind occurring once is the decimal separator; occurring more
/// than once it is digit grouping. With both kinds present the rightmost one
/// is the decimal separator.
fn parse_locale_decimal(raw: &str) -> Option<Decimal> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty()
        || !compact
            .chars()
            .enumerate()
            .all(|(i, c)| c.is_ascii_digit() || c == ',' || c == '.' || (i == 0 && c == '-'))
    {
        return None;
    }

    let commas = compact.matches(',').count();
    let dots = compact.matches('.').count();

    let decimal_sep = match (commas, dots) {
        (0, 0) => None,
        (_, 0) => (commas == 1).then_some(','),
        (0, _) => (dots == 1).then_some('.'),
        _ => {
            let last_comma = compact.rfind(',');
            let last_dot = compact.rfind('.');
            let sep = if last_comma > last_dot { ',' } else { '.' };
            let sep_count = if sep == ',' { commas } else { dots };
            if sep_count > 1 {
                return None;
            }
            Some(sep)
        }
    };

    let canonical: String = compact
        .chars()
        .filter_map(|c| match c {
            ',' | '.' if Some(c) == decimal_sep => Some('.'),
            ',' | '.' => None,
            other => Some(other),
        })
        .collect();

    Decimal::from_str(&canonical).ok()
}
