//! local checks run before a write is submitted
//!
//! each check uses state the caller already fetched, so a transaction that
//! is bound to revert is never sent.

use alloy_primitives::{Address, U256};
use lendguard_risk::{
    max_repayable, max_withdrawable, CollateralFactor, PoolId, RiskSummary, SafetyBuffer,
    ValuedPosition,
};
use rust_decimal::Decimal;
use thiserror::Error;

/// basis points in one
pub const BPS: u32 = 10_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreflightError {
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("wallet balance unknown")]
    UnknownBalance,

    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Decimal, need: Decimal },

    #[error("insufficient liquidity: pool holds {available}, requested {requested}")]
    InsufficientLiquidity { available: Decimal, requested: Decimal },

    #[error("position risk unknown, refusing to {0}")]
    UnknownRisk(&'static str),

    #[error("insufficient collateral: can borrow at most {available}, requested {requested}")]
    ExceedsBorrowCapacity { available: Decimal, requested: Decimal },

    #[error("insufficient collateral: can safely withdraw at most {max}, requested {requested}")]
    ExceedsWithdrawable { max: Decimal, requested: Decimal },

    #[error("can repay at most {max}, requested {requested}")]
    ExceedsRepayable { max: Decimal, requested: Decimal },

    #[error("token {0} is not part of this pool")]
    TokenNotInPool(Address),

    #[error("slippage must be below 10000 bps, got {0}")]
    InvalidSlippage(u32),

    #[error("quote {0} too large to apply slippage")]
    QuoteOverflow(U256),

    #[error("pool {0} not found")]
    PoolNotFound(PoolId),

    #[error("pool {0} already exists")]
    PoolExists(PoolId),
}

type Result<T> = std::result::Result<T, PreflightError>;

fn positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(PreflightError::ZeroAmount);
    }
    Ok(())
}

/// wallet must hold `amount`; an unknown balance never passes
pub fn check_balance(amount: Decimal, balance: Option<Decimal>) -> Result<()> {
    positive(amount)?;
    let have = balance.ok_or(PreflightError::UnknownBalance)?;
    if have < amount {
        return Err(PreflightError::InsufficientBalance { have, need: amount });
    }
    Ok(())
}

/// deposit, add liquidity and swap input all spend wallet balance
pub fn check_deposit(amount: Decimal, balance: Option<Decimal>) -> Result<()> {
    check_balance(amount, balance)
}

/// borrow must fit in the aggregate capacity and the pool's reserve
pub fn check_borrow(amount: Decimal, summary: &RiskSummary, reserve: Decimal) -> Result<()> {
    positive(amount)?;
    if summary.is_unknown() {
        return Err(PreflightError::UnknownRisk("borrow"));
    }
    if amount > summary.available_to_borrow {
        return Err(PreflightError::ExceedsBorrowCapacity {
            available: summary.available_to_borrow,
            requested: amount,
        });
    }
    if amount > reserve {
        return Err(PreflightError::InsufficientLiquidity {
            available: reserve,
            requested: amount,
        });
    }
    Ok(())
}

pub fn check_withdraw(
    amount: Decimal,
    position: &ValuedPosition,
    token: &Address,
    factor: CollateralFactor,
    buffer: SafetyBuffer,
) -> Result<()> {
    positive(amount)?;
    if position.side(token).is_none() {
        return Err(PreflightError::TokenNotInPool(*token));
    }
    let max = max_withdrawable(position, token, factor, buffer);
    if amount > max {
        return Err(PreflightError::ExceedsWithdrawable { max, requested: amount });
    }
    Ok(())
}

pub fn check_repay(amount: Decimal, position: &ValuedPosition, token: &Address, balance: Option<Decimal>) -> Result<()> {
    positive(amount)?;
    if position.side(token).is_none() {
        return Err(PreflightError::TokenNotInPool(*token));
    }
    let bound = max_repayable(position, token, balance);
    if amount > bound.max_repayable {
        return Err(PreflightError::ExceedsRepayable {
            max: bound.max_repayable,
            requested: amount,
        });
    }
    Ok(())
}

/// whether an approval must precede a transfer of `required`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllowanceCheck {
    Sufficient,
    NeedsApproval { missing: U256 },
}

pub fn check_allowance(allowance: U256, required: U256) -> AllowanceCheck {
    if allowance >= required {
        AllowanceCheck::Sufficient
    } else {
        AllowanceCheck::NeedsApproval {
            missing: required - allowance,
        }
    }
}

/// least acceptable swap output for a quote and slippage tolerance
pub fn min_amount_out(quote: U256, slippage_bps: u32) -> Result<U256> {
    if slippage_bps >= BPS {
        return Err(PreflightError::InvalidSlippage(slippage_bps));
    }
    let scaled = quote
        .checked_mul(U256::from(BPS - slippage_bps))
        .ok_or(PreflightError::QuoteOverflow(quote))?;
    Ok(scaled / U256::from(BPS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use lendguard_risk::{AssetAmounts, HealthFactor};
    use rust_decimal_macros::dec;

    fn position() -> ValuedPosition {
        ValuedPosition {
            pool_id: B256::ZERO,
            token_a: Address::repeat_byte(0xa),
            token_b: Address::repeat_byte(0xb),
            amounts: AssetAmounts {
                collateral_a: dec!(50),
                collateral_b: dec!(70),
                borrowed_a: dec!(0),
                borrowed_b: dec!(80),
            },
            price_a: Decimal::ONE,
            price_b: Decimal::ONE,
            collateral_value: dec!(120),
            debt_value: dec!(80),
        }
    }

    fn factor() -> CollateralFactor {
        CollateralFactor::new(dec!(0.75)).unwrap()
    }

    #[test]
    fn test_balance() {
        assert!(check_deposit(dec!(5), Some(dec!(10))).is_ok());
        assert_eq!(check_deposit(dec!(0), Some(dec!(10))), Err(PreflightError::ZeroAmount));
        assert_eq!(check_deposit(dec!(5), None), Err(PreflightError::UnknownBalance));
        assert!(matches!(
            check_deposit(dec!(11), Some(dec!(10))),
            Err(PreflightError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_withdraw_bound() {
        let p = position();
        let a = p.token_a;
        assert!(check_withdraw(dec!(2), &p, &a, factor(), SafetyBuffer::default()).is_ok());
        assert!(matches!(
            check_withdraw(dec!(3), &p, &a, factor(), SafetyBuffer::default()),
            Err(PreflightError::ExceedsWithdrawable { .. })
        ));
        assert_eq!(
            check_withdraw(dec!(1), &p, &Address::ZERO, factor(), SafetyBuffer::default()),
            Err(PreflightError::TokenNotInPool(Address::ZERO))
        );
    }

    #[test]
    fn test_repay_bound() {
        let p = position();
        let b = p.token_b;
        assert!(check_repay(dec!(20), &p, &b, Some(dec!(20))).is_ok());
        assert!(check_repay(dec!(21), &p, &b, Some(dec!(20))).is_err());
        assert!(check_repay(dec!(81), &p, &b, Some(dec!(1000))).is_err());
        assert!(check_repay(dec!(1), &p, &b, None).is_err());
    }

    #[test]
    fn test_borrow_capacity() {
        let summary = RiskSummary {
            positions: vec![],
            total_collateral_value: dec!(200),
            total_borrowed_value: dec!(100),
            available_to_borrow: dec!(50),
            health_factor: HealthFactor::Ratio(dec!(1.5)),
        };
        assert!(check_borrow(dec!(50), &summary, dec!(1000)).is_ok());
        assert!(matches!(
            check_borrow(dec!(51), &summary, dec!(1000)),
            Err(PreflightError::ExceedsBorrowCapacity { .. })
        ));
        assert!(matches!(
            check_borrow(dec!(40), &summary, dec!(10)),
            Err(PreflightError::InsufficientLiquidity { .. })
        ));
        assert_eq!(
            check_borrow(dec!(1), &RiskSummary::unknown(), dec!(1000)),
            Err(PreflightError::UnknownRisk("borrow"))
        );
    }

    #[test]
    fn test_allowance() {
        assert_eq!(
            check_allowance(U256::from(10u64), U256::from(10u64)),
            AllowanceCheck::Sufficient
        );
        assert_eq!(
            check_allowance(U256::from(4u64), U256::from(10u64)),
            AllowanceCheck::NeedsApproval { missing: U256::from(6u64) }
        );
    }

    #[test]
    fn test_min_amount_out() {
        assert_eq!(min_amount_out(U256::from(1000u64), 50).unwrap(), U256::from(995u64));
        assert_eq!(min_amount_out(U256::from(1000u64), 0).unwrap(), U256::from(1000u64));
        assert!(min_amount_out(U256::from(1000u64), 10_000).is_err());
    }

    #[test]
    fn test_min_amount_out_rejects_huge_quote() {
        assert_eq!(min_amount_out(U256::MAX, 50), Err(PreflightError::QuoteOverflow(U256::MAX)));
        assert_eq!(min_amount_out(U256::MAX, 0), Err(PreflightError::QuoteOverflow(U256::MAX)));
        let largest = U256::MAX / U256::from(BPS);
        assert_eq!(min_amount_out(largest, 0).unwrap(), largest);
    }
}
