use alloy_primitives::U256;

/// Number of decimal places every price is rounded to before comparison.
pub const PRICE_PRECISION: i32 = 12;

/// Converts a U256 into a f64, manually combining its limbs.
/// This is an approximation and will lose precision for very large numbers,
/// but is suitable for price calculations.
pub fn u256_to_f64(value: U256) -> f64 {
    let limbs = value.as_limbs();
    let mut result = 0.0;

    const TWO_POW_64: f64 = (1u64 << 63) as f64 * 2.0;

    result += limbs[3] as f64;
    result = result * TWO_POW_64 + (limbs[2] as f64);
    result = result * TWO_POW_64 + (limbs[1] as f64);
    result = result * TWO_POW_64 + (limbs[0] as f64);

    result
}

/// Rounds `value` to `places` decimal places, half away from zero.
pub fn round_to_places(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// Rounds a price to the shared 12-decimal precision.
pub fn round_price(value: f64) -> f64 {
    round_to_places(value, PRICE_PRECISION)
}

/// Two prices are equal when they agree after rounding to 12 decimals.
pub fn prices_equal(a: f64, b: f64) -> bool {
    round_price(a) == round_price(b)
}

/// Scaling factor turning a raw quote/base ratio into a nominal price.
pub fn decimal_scale(decimals_base: u8, decimals_quote: u8) -> f64 {
    10_f64.powi(decimals_base as i32 - decimals_quote as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u256_conversion_spans_limbs() {
        assert_eq!(u256_to_f64(U256::from(1_000_000u64)), 1_000_000.0);
        let two_pow_64 = U256::from(1u8) << 64;
        assert_eq!(u256_to_f64(two_pow_64), 18_446_744_073_709_551_616.0);
    }

    #[test]
    fn rounding_ignores_digits_past_the_twelfth() {
        assert!(prices_equal(0.000000028_000_1, 0.000000028_000_4));
        assert!(!prices_equal(0.000_000_028_001, 0.000_000_028_002));
    }

    #[test]
    fn round_to_two_places() {
        assert_eq!(round_to_places(66.666_66, 2), 66.67);
        assert_eq!(round_to_places(12.344, 2), 12.34);
    }
}
