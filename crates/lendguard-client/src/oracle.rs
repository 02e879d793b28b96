//! read-side seams over the pool and token contracts

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use lendguard_risk::{CollateralFactor, Pool, PoolId, Position, TokenInfo};

use crate::contracts::{Erc20Client, PoolContract};
use crate::error::Result;
use crate::provider::Provider;

/// read methods of the pool contract
#[async_trait]
pub trait PoolOracle: Send + Sync {
    async fn all_pools(&self) -> Result<Vec<PoolId>>;

    async fn pool_info(&self, pool_id: PoolId) -> Result<Pool>;

    async fn user_position(&self, user: Address, pool_id: PoolId) -> Result<Position>;

    async fn collateral_factor(&self) -> Result<CollateralFactor>;
}

/// erc-20 metadata and balances
#[async_trait]
pub trait TokenReader: Send + Sync {
    async fn token_info(&self, token: Address) -> Result<TokenInfo>;

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256>;
}

#[async_trait]
impl<P: Provider> PoolOracle for PoolContract<P> {
    async fn all_pools(&self) -> Result<Vec<PoolId>> {
        self.get_all_pools().await
    }

    async fn pool_info(&self, pool_id: PoolId) -> Result<Pool> {
        self.get_pool_info(pool_id).await
    }

    async fn user_position(&self, user: Address, pool_id: PoolId) -> Result<Position> {
        self.get_user_position(user, pool_id).await
    }

    async fn collateral_factor(&self) -> Result<CollateralFactor> {
        PoolContract::collateral_factor(self).await
    }
}

#[async_trait]
impl<P: Provider> TokenReader for Erc20Client<P> {
    async fn token_info(&self, token: Address) -> Result<TokenInfo> {
        // independent reads, issued together
        let (name, symbol, decimals) =
            tokio::try_join!(self.name(token), self.symbol(token), self.decimals(token))?;
        Ok(TokenInfo {
            address: token,
            name,
            symbol,
            decimals,
        })
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        Erc20Client::balance_of(self, token, owner).await
    }
}
