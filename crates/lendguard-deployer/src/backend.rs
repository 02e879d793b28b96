//! remote calls the deployment makes

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use lendguard_client::{deploy_contract, CallbackContract, ClientError, Erc20Client, Provider, Result};
use lendguard_risk::PoolId;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::state::ReactiveTrigger;

/// arguments of `setupProtection` on the callback contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionSetup {
    pub pool_id: PoolId,
    pub threshold: U256,
    pub target: U256,
    pub collateral_token: Address,
    pub max_amount: U256,
}

/// one method per remote call, each against the active chain
#[async_trait]
pub trait DeploymentBackend: Send + Sync {
    async fn switch_chain(&self, chain_id: u64) -> Result<()>;

    /// deploy the callback contract, paying `payment` to its constructor
    async fn deploy_callback(&self, payment: U256) -> Result<Address>;

    /// deploy the reactive contract watching `trigger`
    async fn deploy_reactive(&self, trigger: &ReactiveTrigger, payment: U256) -> Result<Address>;

    async fn token_decimals(&self, token: Address) -> Result<u8>;

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256>;

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<B256>;

    async fn setup_protection(&self, callback: Address, setup: &ProtectionSetup) -> Result<B256>;
}

/// reactive constructor arguments: `(callback, user, poolId, threshold)`
pub fn reactive_constructor_args(trigger: &ReactiveTrigger) -> Vec<u8> {
    (trigger.callback, trigger.user, trigger.pool_id, trigger.threshold).abi_encode_params()
}

/// read hex creation bytecode from a file, with or without `0x`
pub fn load_bytecode(path: impl AsRef<Path>) -> Result<Bytes> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let digits = text.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| ClientError::Config(format!("{}: {}", path.display(), e)))
}

/// backend over a json-rpc provider and compiled contract bytecode
pub struct RpcBackend<P> {
    provider: P,
    erc20: Erc20Client<P>,
    callback_bytecode: Bytes,
    reactive_bytecode: Bytes,
}

impl<P: Provider + Clone> RpcBackend<P> {
    pub fn new(provider: P, callback_bytecode: impl Into<Bytes>, reactive_bytecode: impl Into<Bytes>) -> Self {
        Self {
            erc20: Erc20Client::new(provider.clone()),
            provider,
            callback_bytecode: callback_bytecode.into(),
            reactive_bytecode: reactive_bytecode.into(),
        }
    }
}

#[async_trait]
impl<P: Provider + Clone> DeploymentBackend for RpcBackend<P> {
    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        self.provider.switch_chain(chain_id).await
    }

    async fn deploy_callback(&self, payment: U256) -> Result<Address> {
        deploy_contract(&self.provider, &self.callback_bytecode, &[], payment).await
    }

    async fn deploy_reactive(&self, trigger: &ReactiveTrigger, payment: U256) -> Result<Address> {
        let args = reactive_constructor_args(trigger);
        deploy_contract(&self.provider, &self.reactive_bytecode, &args, payment).await
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        self.erc20.decimals(token).await
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        self.erc20.balance_of(token, owner).await
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        self.erc20.allowance(token, owner, spender).await
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<B256> {
        self.erc20.approve(token, spender, amount).await
    }

    async fn setup_protection(&self, callback: Address, setup: &ProtectionSetup) -> Result<B256> {
        CallbackContract::new(callback, self.provider.clone())
            .setup_protection(
                setup.pool_id,
                setup.threshold,
                setup.target,
                setup.collateral_token,
                setup.max_amount,
            )
            .await
    }
}
