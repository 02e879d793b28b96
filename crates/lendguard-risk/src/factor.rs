//! protocol risk parameters

use alloy_primitives::U256;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// fraction of collateral value usable as borrowing capacity, applied
/// uniformly to every asset. always strictly between 0 and 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct CollateralFactor(Decimal);

impl CollateralFactor {
    pub fn new(fraction: Decimal) -> Result<Self> {
        if fraction <= Decimal::ZERO || fraction >= Decimal::ONE {
            return Err(RiskError::InvalidCollateralFactor(fraction.to_string()));
        }
        Ok(Self(fraction))
    }

    /// from the pool's `COLLATERAL_FACTOR()`, an integer percentage
    pub fn from_percent(percent: U256) -> Result<Self> {
        let percent = u64::try_from(percent)
            .map_err(|_| RiskError::InvalidCollateralFactor(format!("{}%", percent)))?;
        Self::new(Decimal::from(percent) / dec!(100))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for CollateralFactor {
    type Error = RiskError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CollateralFactor> for Decimal {
    fn from(factor: CollateralFactor) -> Self {
        factor.0
    }
}

/// margin added on top of the minimum collateral when estimating how much
/// can be withdrawn. estimates ignore interest accrued before execution and
/// integer truncation on chain, so an "exactly safe" withdrawal can revert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyBuffer {
    percent: Decimal,
}

impl SafetyBuffer {
    pub const DEFAULT_PERCENT: Decimal = dec!(10);

    pub fn from_percent(percent: Decimal) -> Result<Self> {
        if percent.is_sign_negative() || percent > dec!(100) {
            return Err(RiskError::InvalidSafetyBuffer(percent.to_string()));
        }
        Ok(Self { percent })
    }

    pub fn percent(&self) -> Decimal {
        self.percent
    }

    /// `1 + percent / 100`
    pub fn multiplier(&self) -> Decimal {
        Decimal::ONE + self.percent / dec!(100)
    }
}

impl Default for SafetyBuffer {
    fn default() -> Self {
        Self {
            percent: Self::DEFAULT_PERCENT,
        }
    }
}
