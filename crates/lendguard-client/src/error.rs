//! error types for the pool client

use lendguard_risk::RiskError;
use thiserror::Error;

use crate::preflight::PreflightError;
use crate::revert;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("unknown chain: {0}")]
    UnknownChain(u64),

    #[error("chain id mismatch: expected {expected}, endpoint reports {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] RiskError),

    #[error(transparent)]
    Preflight(#[from] PreflightError),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    IoError(String),
}

impl ClientError {
    /// user-facing message: a known revert reason is explained, anything
    /// else is passed through raw
    pub fn friendly(&self) -> String {
        let raw = self.to_string();
        match revert::explain(&raw) {
            Some(hint) => format!("{} ({})", hint, raw),
            None => raw,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::IoError(e.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::ConnectionFailed(e.to_string())
    }
}

impl From<alloy_sol_types::Error> for ClientError {
    fn from(e: alloy_sol_types::Error) -> Self {
        ClientError::DecodingError(e.to_string())
    }
}
