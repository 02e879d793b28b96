//! protection parameters and the validation gate

use alloy_primitives::{Address, U256};
use lendguard_risk::{to_base_units, PoolId, RiskError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// highest accepted target ratio
pub const MAX_TARGET_RATIO: Decimal = dec!(3.0);

/// ratios go on chain as 18-decimal fixed point
const RATIO_DECIMALS: u8 = 18;

/// protection request as entered by the user
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionParams {
    pub pool_id: String,
    pub user: String,
    pub collateral_token: String,
    /// most collateral the callback may pull, in token units
    pub max_amount: String,
    /// health factor that triggers protection
    pub threshold: String,
    /// health factor protection restores
    pub target: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("pool id must be 0x followed by 64 hex characters, got {0:?}")]
    PoolId(String),

    #[error("user is not a valid address: {0:?}")]
    User(String),

    #[error("collateral token is not a valid address: {0:?}")]
    CollateralToken(String),

    #[error("max amount must be a positive number, got {0:?}")]
    MaxAmount(String),

    #[error("threshold must be a number greater than 1.0, got {0:?}")]
    Threshold(String),

    #[error("target must be a number no greater than 3.0, got {0:?}")]
    Target(String),

    #[error("threshold {threshold} must be below target {target}")]
    ThresholdNotBelowTarget { threshold: Decimal, target: Decimal },
}

/// every violation found, in field order
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ParamError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[ParamError] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid protection parameters")?;
        for (i, e) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, e)?;
        }
        Ok(())
    }
}

/// parameters that passed the gate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedParams {
    pub pool_id: PoolId,
    pub user: Address,
    pub collateral_token: Address,
    pub max_amount: Decimal,
    pub threshold: Decimal,
    pub target: Decimal,
}

impl ValidatedParams {
    pub fn threshold_wei(&self) -> Result<U256, RiskError> {
        to_base_units(self.threshold, RATIO_DECIMALS)
    }

    pub fn target_wei(&self) -> Result<U256, RiskError> {
        to_base_units(self.target, RATIO_DECIMALS)
    }
}

fn is_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn parse_pool_id(s: &str) -> Option<PoolId> {
    let digits = s.strip_prefix("0x")?;
    is_hex(digits, 64).then(|| PoolId::from_str(digits).ok()).flatten()
}

fn parse_address(s: &str) -> Option<Address> {
    let digits = s.strip_prefix("0x")?;
    is_hex(digits, 40).then(|| Address::from_str(digits).ok()).flatten()
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s).ok()
}

impl ProtectionParams {
    /// check every field, reporting all violations together
    pub fn validate(&self) -> Result<ValidatedParams, ValidationErrors> {
        let mut errors = Vec::new();

        let pool_id = parse_pool_id(self.pool_id.trim());
        if pool_id.is_none() {
            errors.push(ParamError::PoolId(self.pool_id.clone()));
        }

        let user = parse_address(self.user.trim());
        if user.is_none() {
            errors.push(ParamError::User(self.user.clone()));
        }

        let collateral_token = parse_address(self.collateral_token.trim());
        if collateral_token.is_none() {
            errors.push(ParamError::CollateralToken(self.collateral_token.clone()));
        }

        let max_amount = parse_decimal(self.max_amount.trim()).filter(|a| *a > Decimal::ZERO);
        if max_amount.is_none() {
            errors.push(ParamError::MaxAmount(self.max_amount.clone()));
        }

        let threshold = parse_decimal(self.threshold.trim()).filter(|t| *t > Decimal::ONE);
        if threshold.is_none() {
            errors.push(ParamError::Threshold(self.threshold.clone()));
        }

        let target = parse_decimal(self.target.trim()).filter(|t| *t <= MAX_TARGET_RATIO);
        if target.is_none() {
            errors.push(ParamError::Target(self.target.clone()));
        }

        if let (Some(threshold), Some(target)) = (threshold, target) {
            if threshold >= target {
                errors.push(ParamError::ThresholdNotBelowTarget { threshold, target });
            }
        }

        match (pool_id, user, collateral_token, max_amount, threshold, target) {
            (Some(pool_id), Some(user), Some(collateral_token), Some(max_amount), Some(threshold), Some(target))
                if errors.is_empty() =>
            {
                Ok(ValidatedParams {
                    pool_id,
                    user,
                    collateral_token,
                    max_amount,
                    threshold,
                    target,
                })
            }
            _ => Err(ValidationErrors(errors)),
        }
    }
}
