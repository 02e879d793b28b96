//! deployment errors

use lendguard_client::ClientError;
use lendguard_risk::RiskError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::params::ValidationErrors;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("a deployment is already running")]
    AlreadyRunning,

    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Decimal, need: Decimal },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("invalid amount: {0}")]
    Amount(#[from] RiskError),
}

impl DeployError {
    /// raw message, with an explanation prepended for known reverts
    pub fn friendly(&self) -> String {
        match self {
            DeployError::Client(e) => e.friendly(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
