use rust_decimal::{Decimal, RoundingStrategy};

/// Round half-up at `scale` decimal places (2.345 -> 2.35), padding to exactly `scale`.
///
/// Amounts here are non-negative, so away-from-zero midpoint rounding is half-up.
pub fn round_half_up(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    rounded
}

/// `numerator / denominator` rounded half-up at `scale`. None when the denominator is zero.
pub fn ratio(numerator: Decimal, denominator: Decimal, scale: u32) -> Option<Decimal> {
    numerator
        .checked_div(denominator)
        .map(|q| round_half_up(q, scale))
}
