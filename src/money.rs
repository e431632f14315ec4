//! Currency helpers.
//!
//! Prices, VAT rates and totals are carried as [`BigDecimal`] end to end and
//! only become JSON numbers when a response is serialized.

use bigdecimal::{BigDecimal, RoundingMode};
use serde::Serializer;

/// Number of decimal places every currency amount is reported with.
pub const CURRENCY_SCALE: i64 = 2;

/// Round to two decimals, halves away from zero.
pub fn round_currency(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(CURRENCY_SCALE, RoundingMode::HalfUp)
}

/// Serialize a decimal amount as a plain JSON number.
///
/// Goes through the decimal text so the result is the f64 nearest to the
/// exact amount.
pub fn serialize_as_number<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value.to_string().parse::<f64>() {
        Ok(number) if number.is_finite() => serializer.serialize_f64(number),
        _ => Err(serde::ser::Error::custom(format!(
            "amount {value} is not representable as a JSON number"
        ))),
    }
}
