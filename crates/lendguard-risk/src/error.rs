//! error types for risk estimation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("unsupported token decimals: {0} (max 28)")]
    UnsupportedDecimals(u8),

    #[error("amount does not fit in a decimal")]
    Overflow,

    #[error("amount must not be negative")]
    Negative,

    #[error("amount has more than {decimals} fractional digits")]
    TooPrecise { decimals: u8 },

    #[error("collateral factor must be strictly between 0 and 1, got {0}")]
    InvalidCollateralFactor(String),

    #[error("safety buffer must be between 0 and 100 percent, got {0}")]
    InvalidSafetyBuffer(String),
}

pub type Result<T> = std::result::Result<T, RiskError>;
