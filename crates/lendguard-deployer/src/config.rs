//! `[protection]` section of the client config

use lendguard_risk::{to_base_units, RiskError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::deployer::{DeployerConfig, ResumePolicy};

/// native currency decimals on both chains
const NATIVE_DECIMALS: u8 = 18;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionConfig {
    /// chain holding the pool and the callback contract
    pub callback_chain: u64,
    /// chain running the reactive contract
    pub reactive_chain: u64,
    /// hex creation bytecode
    pub callback_bytecode: PathBuf,
    pub reactive_bytecode: PathBuf,
    /// native currency sent with the callback deployment
    #[serde(default = "default_callback_payment")]
    pub callback_payment: Decimal,
    /// native currency sent with the reactive deployment
    #[serde(default = "default_reactive_payment")]
    pub reactive_payment: Decimal,
    /// reuse artifacts of an earlier partial run
    #[serde(default = "default_resume")]
    pub resume: bool,
}

fn default_callback_payment() -> Decimal {
    dec!(0.01)
}

fn default_reactive_payment() -> Decimal {
    dec!(0.1)
}

fn default_resume() -> bool {
    true
}

impl ProtectionConfig {
    pub fn deployer_config(&self) -> Result<DeployerConfig, RiskError> {
        Ok(DeployerConfig {
            callback_chain_id: self.callback_chain,
            reactive_chain_id: self.reactive_chain,
            callback_payment: to_base_units(self.callback_payment, NATIVE_DECIMALS)?,
            reactive_payment: to_base_units(self.reactive_payment, NATIVE_DECIMALS)?,
            resume: if self.resume {
                ResumePolicy::Resume
            } else {
                ResumePolicy::Fresh
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn test_defaults_from_toml() {
        let config: ProtectionConfig = toml::from_str(
            r#"
            callback_chain = 11155111
            reactive_chain = 5318007
            callback_bytecode = "callback.hex"
            reactive_bytecode = "reactive.hex"
            "#,
        )
        .unwrap();

        assert!(config.resume);
        let deployer = config.deployer_config().unwrap();
        assert_eq!(deployer.callback_payment, U256::from(10_000_000_000_000_000u64));
        assert_eq!(deployer.reactive_payment, U256::from(100_000_000_000_000_000u64));
        assert_eq!(deployer.resume, ResumePolicy::Resume);
    }

    #[test]
    fn test_fresh_and_custom_payment() {
        let config: ProtectionConfig = toml::from_str(
            r#"
            callback_chain = 1
            reactive_chain = 2
            callback_bytecode = "a.hex"
            reactive_bytecode = "b.hex"
            callback_payment = "0.5"
            resume = false
            "#,
        )
        .unwrap();

        let deployer = config.deployer_config().unwrap();
        assert_eq!(deployer.callback_payment, U256::from(500_000_000_000_000_000u64));
        assert_eq!(deployer.resume, ResumePolicy::Fresh);
    }
}
