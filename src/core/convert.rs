//! Pure currency conversion through the base currency.

use crate::core::rates::RateTable;
use crate::error::ConvertError;

/// Converts `amount` from one currency to another using a day's rate table.
///
/// Two-hop star conversion: the amount is first expressed in the table's
/// base currency (`amount * rates[from]`), then in the target currency
/// (`in_base / rates[to]`). Fails with [`ConvertError::UnsupportedCurrency`]
/// when either code is absent from the table.
///
/// No rounding happens here; callers sum unrounded values and round once at
/// final output (see [`round2`]).
pub fn convert(amount: f64, from: &str, to: &str, rates: &RateTable) -> Result<f64, ConvertError> {
    let from = from.to_ascii_uppercase();
    let to = to.to_ascii_uppercase();

    let from_rate = rates
        .rate(&from)
        .ok_or_else(|| ConvertError::UnsupportedCurrency(from.clone()))?;
    let to_rate = rates
        .rate(&to)
        .ok_or_else(|| ConvertError::UnsupportedCurrency(to.clone()))?;

    // Identity conversions must be exact, not `x * r / r`.
    if from == to {
        return Ok(amount);
    }

    let in_base = if from == rates.base() {
        amount
    } else {
        amount * from_rate
    };
    if to == rates.base() {
        Ok(in_base)
    } else {
        Ok(in_base / to_rate)
    }
}

/// Rounds to 2 decimal places, half away from zero. Applied once, at the
/// point of final output only.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
