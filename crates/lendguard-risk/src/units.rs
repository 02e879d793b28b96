//! base unit <-> display unit conversion
//!
//! every amount on chain is an integer in the token's base units. the
//! token's own `decimals` is the only correct scale; feeding the wrong one
//! shifts every derived value by powers of ten.

use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::error::{Result, RiskError};

/// largest scale a `Decimal` can represent
pub const MAX_DECIMALS: u8 = 28;

fn pow10(exp: u8) -> U256 {
    // exp <= MAX_DECIMALS, cannot overflow
    U256::from(10u64).pow(U256::from(exp))
}

/// convert a raw base-unit amount to display units (`raw / 10^decimals`)
pub fn to_display(raw: U256, decimals: u8) -> Result<Decimal> {
    if decimals > MAX_DECIMALS {
        return Err(RiskError::UnsupportedDecimals(decimals));
    }

    let divisor = pow10(decimals);
    let whole = raw / divisor;
    let frac = raw % divisor;

    let whole = u128::try_from(whole)
        .ok()
        .and_then(|w| i128::try_from(w).ok())
        .and_then(|w| Decimal::try_from_i128_with_scale(w, 0).ok())
        .ok_or(RiskError::Overflow)?;

    // frac < 10^28 always fits the 96-bit mantissa
    let frac = u128::try_from(frac).map_err(|_| RiskError::Overflow)?;
    let frac = Decimal::try_from_i128_with_scale(frac as i128, decimals as u32)
        .map_err(|_| RiskError::Overflow)?;

    whole
        .checked_add(frac)
        .map(|d| d.normalize())
        .ok_or(RiskError::Overflow)
}

/// convert a display amount to raw base units
///
/// rejects negative amounts and amounts with more fractional digits than
/// the token supports instead of silently truncating them.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256> {
    if decimals > MAX_DECIMALS {
        return Err(RiskError::UnsupportedDecimals(decimals));
    }
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(RiskError::Negative);
    }

    let amount = amount.normalize();
    let scale = amount.scale();
    if scale > decimals as u32 {
        return Err(RiskError::TooPrecise { decimals });
    }

    let mantissa = u128::try_from(amount.mantissa()).map_err(|_| RiskError::Negative)?;
    U256::from(mantissa)
        .checked_mul(pow10(decimals - scale as u8))
        .ok_or(RiskError::Overflow)
}

/// format a raw amount for display, keeping at most `max_fraction_digits`
/// (truncated, trailing zeros trimmed). never fails.
pub fn format_units(raw: U256, decimals: u8, max_fraction_digits: usize) -> String {
    let digits = raw.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = &frac[..frac.len().min(max_fraction_digits)];
    let frac = frac.trim_end_matches('0');

    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_display_scales_by_decimals() {
        let raw = U256::from(1_500_000u64);
        assert_eq!(to_display(raw, 6).unwrap(), dec!(1.5));
        assert_eq!(to_display(raw, 0).unwrap(), dec!(1500000));
    }

    #[test]
    fn test_to_display_eighteen_decimals() {
        let raw = U256::from(123_456_789_000_000_000_000u128);
        assert_eq!(to_display(raw, 18).unwrap(), dec!(123.456789));
    }

    #[test]
    fn test_to_display_large_whole_part() {
        // 10^12 tokens with 18 decimals = 10^30 raw, beyond a 96-bit mantissa
        let raw = U256::from(10u64).pow(U256::from(30));
        assert_eq!(to_display(raw, 18).unwrap(), dec!(1000000000000));
    }

    #[test]
    fn test_to_display_rejects_wide_decimals() {
        assert_eq!(
            to_display(U256::from(1u64), 30),
            Err(RiskError::UnsupportedDecimals(30))
        );
    }

    #[test]
    fn test_to_display_overflow() {
        assert_eq!(to_display(U256::MAX, 0), Err(RiskError::Overflow));
    }

    #[test]
    fn test_to_base_units() {
        assert_eq!(to_base_units(dec!(1.5), 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(
            to_base_units(dec!(2), 18).unwrap(),
            U256::from(2_000_000_000_000_000_000u128)
        );
        assert_eq!(to_base_units(dec!(0), 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_to_base_units_trailing_zeros_are_not_precision() {
        assert_eq!(to_base_units(dec!(1.50000000), 2).unwrap(), U256::from(150u64));
    }

    #[test]
    fn test_to_base_units_rejects_excess_precision() {
        assert_eq!(
            to_base_units(dec!(1.2345), 2),
            Err(RiskError::TooPrecise { decimals: 2 })
        );
    }

    #[test]
    fn test_to_base_units_rejects_negative() {
        assert_eq!(to_base_units(dec!(-1), 6), Err(RiskError::Negative));
    }

    #[test]
    fn test_format_units() {
        let raw = U256::from(1_234_567u64);
        assert_eq!(format_units(raw, 6, 4), "1.2345");
        assert_eq!(format_units(raw, 6, 6), "1.234567");
        assert_eq!(format_units(U256::from(5u64), 6, 6), "0.000005");
        assert_eq!(format_units(U256::from(5u64), 6, 2), "0");
        assert_eq!(format_units(U256::from(2_000_000u64), 6, 6), "2");
        assert_eq!(format_units(U256::from(42u64), 0, 6), "42");
    }
}
