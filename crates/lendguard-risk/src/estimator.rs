//! aggregate risk, withdraw and repay bounds

use alloy_primitives::Address;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::factor::{CollateralFactor, SafetyBuffer};
use crate::position::{value_position, PoolPosition, ValuedPosition};
use crate::price::{PriceSource, UnitPrice};
use crate::token::TokenDecimals;

/// ratios above this are reported as [`HealthFactor::Safe`]
pub const HEALTH_FACTOR_CEILING: Decimal = dec!(1000000);

/// health factor at or above which a position is considered comfortable
pub const COMFORTABLE_HEALTH_FACTOR: Decimal = dec!(1.5);

/// risk-adjusted collateral capacity over outstanding debt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthFactor {
    /// no debt, or a ratio too large to be meaningful
    Safe,
    /// `collateral * factor / debt`
    Ratio(Decimal),
    /// inputs could not be read or valued
    Unknown,
}

/// coarse classification for display
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Safe,
    Healthy,
    AtRisk,
    Liquidatable,
    Unknown,
}

impl HealthFactor {
    pub fn compute(collateral_value: Decimal, debt_value: Decimal, factor: CollateralFactor) -> Self {
        if debt_value <= Decimal::ZERO {
            return HealthFactor::Safe;
        }
        let capacity = match collateral_value.checked_mul(factor.value()) {
            Some(c) => c,
            None => return HealthFactor::Unknown,
        };
        match capacity.checked_div(debt_value) {
            Some(ratio) if ratio > HEALTH_FACTOR_CEILING => HealthFactor::Safe,
            Some(ratio) => HealthFactor::Ratio(ratio),
            None => HealthFactor::Unknown,
        }
    }

    pub fn ratio(&self) -> Option<Decimal> {
        match self {
            HealthFactor::Ratio(r) => Some(*r),
            _ => None,
        }
    }

    pub fn status(&self) -> HealthStatus {
        match self {
            HealthFactor::Safe => HealthStatus::Safe,
            HealthFactor::Unknown => HealthStatus::Unknown,
            HealthFactor::Ratio(r) if *r >= COMFORTABLE_HEALTH_FACTOR => HealthStatus::Healthy,
            HealthFactor::Ratio(r) if *r >= Decimal::ONE => HealthStatus::AtRisk,
            HealthFactor::Ratio(_) => HealthStatus::Liquidatable,
        }
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthFactor::Safe => write!(f, "safe"),
            HealthFactor::Ratio(r) => write!(f, "{}", r.round_dp(2)),
            HealthFactor::Unknown => write!(f, "unknown"),
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Safe => "safe",
            HealthStatus::Healthy => "healthy",
            HealthStatus::AtRisk => "at risk",
            HealthStatus::Liquidatable => "liquidatable",
            HealthStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// risk across all of a user's positions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    /// non-empty positions only
    pub positions: Vec<ValuedPosition>,
    pub total_collateral_value: Decimal,
    pub total_borrowed_value: Decimal,
    pub available_to_borrow: Decimal,
    pub health_factor: HealthFactor,
}

impl RiskSummary {
    /// conservative result when inputs are missing: nothing available,
    /// health unknown
    pub fn unknown() -> Self {
        Self {
            positions: Vec::new(),
            total_collateral_value: Decimal::ZERO,
            total_borrowed_value: Decimal::ZERO,
            available_to_borrow: Decimal::ZERO,
            health_factor: HealthFactor::Unknown,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.health_factor == HealthFactor::Unknown
    }
}

/// `max(0, collateral * factor - debt)`
pub fn available_to_borrow(collateral_value: Decimal, debt_value: Decimal, factor: CollateralFactor) -> Decimal {
    collateral_value
        .checked_mul(factor.value())
        .map(|capacity| (capacity - debt_value).max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO)
}

/// aggregate risk, valuing every token 1:1
pub fn aggregate_risk<D>(positions: &[PoolPosition], decimals: &D, factor: CollateralFactor) -> RiskSummary
where
    D: TokenDecimals + ?Sized,
{
    aggregate_risk_with_prices(positions, decimals, &UnitPrice, factor)
}

/// aggregate risk across positions using `prices` for valuation
///
/// positions with no collateral and no debt are dropped. if any remaining
/// position cannot be valued the whole summary is [`RiskSummary::unknown`].
pub fn aggregate_risk_with_prices<D, P>(
    positions: &[PoolPosition],
    decimals: &D,
    prices: &P,
    factor: CollateralFactor,
) -> RiskSummary
where
    D: TokenDecimals + ?Sized,
    P: PriceSource + ?Sized,
{
    let mut valued = Vec::new();
    let mut total_collateral = Decimal::ZERO;
    let mut total_borrowed = Decimal::ZERO;

    for position in positions.iter().filter(|p| !p.position.is_empty()) {
        let Some(v) = value_position(position, decimals, prices) else {
            return RiskSummary::unknown();
        };
        let (Some(c), Some(d)) = (
            total_collateral.checked_add(v.collateral_value),
            total_borrowed.checked_add(v.debt_value),
        ) else {
            return RiskSummary::unknown();
        };
        total_collateral = c;
        total_borrowed = d;
        valued.push(v);
    }

    RiskSummary {
        positions: valued,
        total_collateral_value: total_collateral,
        total_borrowed_value: total_borrowed,
        available_to_borrow: available_to_borrow(total_collateral, total_borrowed, factor),
        health_factor: HealthFactor::compute(total_collateral, total_borrowed, factor),
    }
}

/// largest amount of `token` that can be withdrawn from `position`
/// while keeping a buffer above the minimum collateral
///
/// returns zero for tokens outside the pool.
pub fn max_withdrawable(
    position: &ValuedPosition,
    token: &Address,
    factor: CollateralFactor,
    buffer: SafetyBuffer,
) -> Decimal {
    let Some(deposited) = position.deposited(token) else {
        return Decimal::ZERO;
    };
    if position.debt_value <= Decimal::ZERO {
        return deposited;
    }

    let min_required = position
        .debt_value
        .checked_div(factor.value())
        .and_then(|m| m.checked_mul(buffer.multiplier()));
    let Some(min_required) = min_required else {
        return Decimal::ZERO;
    };

    let excess_value = (position.collateral_value - min_required).max(Decimal::ZERO);
    if excess_value.is_zero() {
        return Decimal::ZERO;
    }

    // value -> token units
    let price = position.price(token).unwrap_or(Decimal::ZERO);
    if price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    excess_value
        .checked_div(price)
        .map(|amount| amount.min(deposited))
        .unwrap_or(Decimal::ZERO)
}

/// repay bound for one token
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repayable {
    pub max_repayable: Decimal,
    pub current_borrowed: Decimal,
}

/// how much of `token` can be repaid given the caller's wallet balance
///
/// `wallet_balance` of `None` means the balance read failed; nothing is
/// repayable then.
pub fn max_repayable(position: &ValuedPosition, token: &Address, wallet_balance: Option<Decimal>) -> Repayable {
    let Some(current_borrowed) = position.borrowed(token) else {
        return Repayable::default();
    };
    let max_repayable = wallet_balance
        .map(|balance| current_borrowed.min(balance).max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO);

    Repayable {
        max_repayable,
        current_borrowed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{AssetAmounts, Position};
    use alloy_primitives::{B256, U256};
    use std::collections::HashMap;

    fn factor() -> CollateralFactor {
        CollateralFactor::new(dec!(0.75)).unwrap()
    }

    fn token_a() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn token_b() -> Address {
        Address::repeat_byte(0xbb)
    }

    fn decimals() -> HashMap<Address, u8> {
        [(token_a(), 0), (token_b(), 0)].into_iter().collect()
    }

    fn raw(collateral_a: u64, collateral_b: u64, borrowed_a: u64, borrowed_b: u64) -> PoolPosition {
        PoolPosition {
            pool_id: B256::repeat_byte(1),
            token_a: token_a(),
            token_b: token_b(),
            position: Position {
                collateral_a: U256::from(collateral_a),
                collateral_b: U256::from(collateral_b),
                borrowed_a: U256::from(borrowed_a),
                borrowed_b: U256::from(borrowed_b),
            },
        }
    }

    fn valued(deposited_a: Decimal, deposited_b: Decimal, borrowed_a: Decimal, borrowed_b: Decimal) -> ValuedPosition {
        ValuedPosition {
            pool_id: B256::repeat_byte(1),
            token_a: token_a(),
            token_b: token_b(),
            amounts: AssetAmounts {
                collateral_a: deposited_a,
                collateral_b: deposited_b,
                borrowed_a,
                borrowed_b,
            },
            price_a: Decimal::ONE,
            price_b: Decimal::ONE,
            collateral_value: deposited_a + deposited_b,
            debt_value: borrowed_a + borrowed_b,
        }
    }

    #[test]
    fn test_health_factor_example() {
        let summary = aggregate_risk(&[raw(200, 0, 0, 100)], &decimals(), factor());
        assert_eq!(summary.total_collateral_value, dec!(200));
        assert_eq!(summary.total_borrowed_value, dec!(100));
        assert_eq!(summary.health_factor, HealthFactor::Ratio(dec!(1.5)));
        assert_eq!(summary.available_to_borrow, dec!(50));
    }

    #[test]
    fn test_no_debt_is_safe() {
        let summary = aggregate_risk(&[raw(100, 0, 0, 0)], &decimals(), factor());
        assert_eq!(summary.health_factor, HealthFactor::Safe);
        assert_eq!(summary.available_to_borrow, dec!(75));
    }

    #[test]
    fn test_ceiling_collapses_to_safe() {
        let hf = HealthFactor::compute(dec!(10000000000), dec!(1), factor());
        assert_eq!(hf, HealthFactor::Safe);
    }

    #[test]
    fn test_empty_positions_excluded() {
        let summary = aggregate_risk(&[raw(0, 0, 0, 0), raw(10, 0, 0, 0)], &decimals(), factor());
        assert_eq!(summary.positions.len(), 1);
    }

    #[test]
    fn test_empty_position_with_unknown_tokens_is_ignored() {
        let mut empty = raw(0, 0, 0, 0);
        empty.token_a = Address::repeat_byte(0xcc);
        let summary = aggregate_risk(&[empty, raw(10, 0, 0, 0)], &decimals(), factor());
        assert!(!summary.is_unknown());
    }

    #[test]
    fn test_unknown_decimals_is_conservative() {
        let mut position = raw(1000, 0, 0, 1);
        position.token_b = Address::repeat_byte(0xcc);
        let summary = aggregate_risk(&[position], &decimals(), factor());
        assert_eq!(summary.health_factor, HealthFactor::Unknown);
        assert_eq!(summary.available_to_borrow, Decimal::ZERO);
    }

    #[test]
    fn test_over_borrowed_has_nothing_available() {
        let summary = aggregate_risk(&[raw(100, 0, 90, 0)], &decimals(), factor());
        assert_eq!(summary.available_to_borrow, Decimal::ZERO);
        assert_eq!(summary.health_factor.status(), HealthStatus::Liquidatable);
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(HealthFactor::Ratio(dec!(2)).status(), HealthStatus::Healthy);
        assert_eq!(HealthFactor::Ratio(dec!(1.2)).status(), HealthStatus::AtRisk);
        assert_eq!(HealthFactor::Ratio(dec!(0.9)).status(), HealthStatus::Liquidatable);
        assert_eq!(HealthFactor::Safe.status(), HealthStatus::Safe);
    }

    #[test]
    fn test_max_withdrawable_example() {
        let position = valued(dec!(50), dec!(70), dec!(0), dec!(80));
        let amount = max_withdrawable(&position, &token_a(), factor(), SafetyBuffer::default());
        // 120 - (80 / 0.75) * 1.1
        assert!((amount - dec!(2.6667)).abs() < dec!(0.0001), "got {}", amount);
    }

    #[test]
    fn test_max_withdrawable_no_debt_is_full_deposit() {
        let position = valued(dec!(50), dec!(70), dec!(0), dec!(0));
        let amount = max_withdrawable(&position, &token_b(), factor(), SafetyBuffer::default());
        assert_eq!(amount, dec!(70));
    }

    #[test]
    fn test_max_withdrawable_capped_at_deposit() {
        let position = valued(dec!(5), dec!(1000), dec!(10), dec!(0));
        let amount = max_withdrawable(&position, &token_a(), factor(), SafetyBuffer::default());
        assert_eq!(amount, dec!(5));
    }

    #[test]
    fn test_max_withdrawable_unknown_token() {
        let position = valued(dec!(50), dec!(70), dec!(0), dec!(0));
        let amount = max_withdrawable(&position, &Address::ZERO, factor(), SafetyBuffer::default());
        assert_eq!(amount, Decimal::ZERO);
    }

    #[test]
    fn test_max_withdrawable_zero_inside_buffer() {
        // min required = 100 / 0.75 * 1.1 = 146.67 > 140
        let position = valued(dec!(140), dec!(0), dec!(100), dec!(0));
        let amount = max_withdrawable(&position, &token_a(), factor(), SafetyBuffer::default());
        assert_eq!(amount, Decimal::ZERO);
    }

    #[test]
    fn test_max_repayable() {
        let position = valued(dec!(100), dec!(0), dec!(40), dec!(0));

        let r = max_repayable(&position, &token_a(), Some(dec!(25)));
        assert_eq!(r.max_repayable, dec!(25));
        assert_eq!(r.current_borrowed, dec!(40));

        let r = max_repayable(&position, &token_a(), Some(dec!(1000)));
        assert_eq!(r.max_repayable, dec!(40));
    }

    #[test]
    fn test_max_repayable_failed_balance_read() {
        let position = valued(dec!(100), dec!(0), dec!(40), dec!(0));
        let r = max_repayable(&position, &token_a(), None);
        assert_eq!(r.max_repayable, Decimal::ZERO);
        assert_eq!(r.current_borrowed, dec!(40));
    }

    #[test]
    fn test_max_repayable_unknown_token() {
        let position = valued(dec!(100), dec!(0), dec!(40), dec!(0));
        let r = max_repayable(&position, &Address::ZERO, Some(dec!(10)));
        assert_eq!(r, Repayable::default());
    }
}
