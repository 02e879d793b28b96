//! pool and position data as read from the pool contract

use alloy_primitives::{Address, B256, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::price::PriceSource;
use crate::token::TokenDecimals;
use crate::units::to_display;

/// pool identifier, `keccak256(lower_token ++ higher_token)`
pub type PoolId = B256;

/// a user's raw position in one pool (base units)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub collateral_a: U256,
    pub collateral_b: U256,
    pub borrowed_a: U256,
    pub borrowed_b: U256,
}

impl Position {
    /// no collateral and no debt in either asset
    pub fn is_empty(&self) -> bool {
        self.collateral_a.is_zero()
            && self.collateral_b.is_zero()
            && self.borrowed_a.is_zero()
            && self.borrowed_b.is_zero()
    }

    pub fn has_debt(&self) -> bool {
        !self.borrowed_a.is_zero() || !self.borrowed_b.is_zero()
    }
}

/// pool state (base units)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub token_a: Address,
    pub token_b: Address,
    pub reserve_a: U256,
    pub reserve_b: U256,
    pub total_liquidity: U256,
    pub total_borrowed_a: U256,
    pub total_borrowed_b: U256,
    pub interest_rate_a: U256,
    pub interest_rate_b: U256,
}

impl Pool {
    /// share of asset a currently lent out
    pub fn utilization_a(&self) -> Option<Decimal> {
        utilization(self.reserve_a, self.total_borrowed_a)
    }

    /// share of asset b currently lent out
    pub fn utilization_b(&self) -> Option<Decimal> {
        utilization(self.reserve_b, self.total_borrowed_b)
    }

    pub fn has_token(&self, token: &Address) -> bool {
        self.token_a == *token || self.token_b == *token
    }
}

fn utilization(reserve: U256, borrowed: U256) -> Option<Decimal> {
    let total = reserve.checked_add(borrowed)?;
    if total.is_zero() {
        return Some(Decimal::ZERO);
    }
    // ratio of raw amounts, the scale cancels
    let borrowed = to_display(borrowed, 0).ok()?;
    let total = to_display(total, 0).ok()?;
    borrowed.checked_div(total)
}

/// a position joined with the token pair of its pool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolPosition {
    pub pool_id: PoolId,
    pub token_a: Address,
    pub token_b: Address,
    pub position: Position,
}

/// position amounts in display units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmounts {
    pub collateral_a: Decimal,
    pub collateral_b: Decimal,
    pub borrowed_a: Decimal,
    pub borrowed_b: Decimal,
}

/// which side of a pool a token is on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

/// a position converted to display units and valued
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuedPosition {
    pub pool_id: PoolId,
    pub token_a: Address,
    pub token_b: Address,
    pub amounts: AssetAmounts,
    pub price_a: Decimal,
    pub price_b: Decimal,
    pub collateral_value: Decimal,
    pub debt_value: Decimal,
}

impl ValuedPosition {
    pub fn side(&self, token: &Address) -> Option<Side> {
        if *token == self.token_a {
            Some(Side::A)
        } else if *token == self.token_b {
            Some(Side::B)
        } else {
            None
        }
    }

    /// collateral deposited of `token`, `None` if not in this pool
    pub fn deposited(&self, token: &Address) -> Option<Decimal> {
        self.side(token).map(|side| match side {
            Side::A => self.amounts.collateral_a,
            Side::B => self.amounts.collateral_b,
        })
    }

    /// debt outstanding in `token`, `None` if not in this pool
    pub fn borrowed(&self, token: &Address) -> Option<Decimal> {
        self.side(token).map(|side| match side {
            Side::A => self.amounts.borrowed_a,
            Side::B => self.amounts.borrowed_b,
        })
    }

    pub fn price(&self, token: &Address) -> Option<Decimal> {
        self.side(token).map(|side| match side {
            Side::A => self.price_a,
            Side::B => self.price_b,
        })
    }
}

/// convert and value one position
///
/// `None` if either token's decimals or price is unknown, or a value
/// overflows. callers must treat that as "unknown", never as zero.
pub fn value_position<D, P>(position: &PoolPosition, decimals: &D, prices: &P) -> Option<ValuedPosition>
where
    D: TokenDecimals + ?Sized,
    P: PriceSource + ?Sized,
{
    let decimals_a = decimals.decimals_of(&position.token_a)?;
    let decimals_b = decimals.decimals_of(&position.token_b)?;
    let price_a = prices.price_of(&position.token_a)?;
    let price_b = prices.price_of(&position.token_b)?;

    let raw = &position.position;
    let amounts = AssetAmounts {
        collateral_a: to_display(raw.collateral_a, decimals_a).ok()?,
        collateral_b: to_display(raw.collateral_b, decimals_b).ok()?,
        borrowed_a: to_display(raw.borrowed_a, decimals_a).ok()?,
        borrowed_b: to_display(raw.borrowed_b, decimals_b).ok()?,
    };

    let collateral_value = amounts
        .collateral_a
        .checked_mul(price_a)?
        .checked_add(amounts.collateral_b.checked_mul(price_b)?)?;
    let debt_value = amounts
        .borrowed_a
        .checked_mul(price_a)?
        .checked_add(amounts.borrowed_b.checked_mul(price_b)?)?;

    Some(ValuedPosition {
        pool_id: position.pool_id,
        token_a: position.token_a,
        token_b: position.token_b,
        amounts,
        price_a,
        price_b,
        collateral_value,
        debt_value,
    })
}
