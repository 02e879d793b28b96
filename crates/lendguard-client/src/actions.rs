//! pool write actions with pre-flight checks
//!
//! every action reads fresh state, validates locally, approves the pool as
//! spender if the allowance is short, then submits. writes are strictly
//! sequential; each waits for its receipt.

use alloy_primitives::{Address, B256, U256};
use lendguard_risk::{to_base_units, to_display, PoolId, SafetyBuffer, TokenInfo};
use rust_decimal::Decimal;

use crate::contracts::{Erc20Client, PoolContract};
use crate::dashboard::{load_dashboard, Dashboard};
use crate::error::{ClientError, Result};
use crate::pool_id::pool_id;
use crate::preflight::{self, AllowanceCheck, PreflightError};
use crate::provider::Provider;
use crate::tokens::TokenRegistry;

pub struct PoolActions<P> {
    pool: PoolContract<P>,
    erc20: Erc20Client<P>,
    tokens: TokenRegistry<Erc20Client<P>>,
    buffer: SafetyBuffer,
}

impl<P: Provider + Clone> PoolActions<P> {
    pub fn new(pool: Address, provider: P) -> Self {
        Self {
            pool: PoolContract::new(pool, provider.clone()),
            erc20: Erc20Client::new(provider.clone()),
            tokens: TokenRegistry::new(Erc20Client::new(provider)),
            buffer: SafetyBuffer::default(),
        }
    }

    pub fn with_buffer(mut self, buffer: SafetyBuffer) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn pool(&self) -> &PoolContract<P> {
        &self.pool
    }

    pub fn tokens(&self) -> &TokenRegistry<Erc20Client<P>> {
        &self.tokens
    }

    pub fn user(&self) -> Address {
        self.pool.provider().sender()
    }

    pub async fn dashboard(&self) -> Dashboard {
        load_dashboard(&self.pool, &self.tokens, self.user()).await
    }

    /// wallet balance in display units, `None` if the read failed
    pub async fn wallet_balance(&self, token: &TokenInfo) -> Option<Decimal> {
        match self.erc20.balance_of(token.address, self.user()).await {
            Ok(raw) => to_display(raw, token.decimals).ok(),
            Err(e) => {
                tracing::warn!("balance read for {} failed: {}", token.symbol, e);
                None
            }
        }
    }

    /// approve the pool for `amount` if the current allowance is short
    async fn ensure_allowance(&self, token: Address, amount: U256) -> Result<Option<B256>> {
        let allowance = self.erc20.allowance(token, self.user(), self.pool.address()).await?;
        match preflight::check_allowance(allowance, amount) {
            AllowanceCheck::Sufficient => Ok(None),
            AllowanceCheck::NeedsApproval { missing } => {
                tracing::info!("allowance short by {}, approving", missing);
                let hash = self.erc20.approve(token, self.pool.address(), amount).await?;
                Ok(Some(hash))
            }
        }
    }

    async fn pool_token(&self, pool_id: PoolId, token: Address) -> Result<TokenInfo> {
        let pool = self.pool.get_pool_info(pool_id).await?;
        if !pool.has_token(&token) {
            return Err(PreflightError::TokenNotInPool(token).into());
        }
        self.tokens.get(token).await
    }

    pub async fn deposit(&self, pool_id: PoolId, token: Address, amount: Decimal) -> Result<B256> {
        let info = self.pool_token(pool_id, token).await?;
        preflight::check_deposit(amount, self.wallet_balance(&info).await)?;

        let raw = to_base_units(amount, info.decimals)?;
        self.ensure_allowance(token, raw).await?;
        tracing::info!("depositing {} {} into {}", amount, info.symbol, pool_id);
        self.pool.deposit_collateral(pool_id, token, raw).await
    }

    pub async fn withdraw(&self, pool_id: PoolId, token: Address, amount: Decimal) -> Result<B256> {
        let dashboard = self.dashboard().await;
        let factor = dashboard
            .collateral_factor
            .filter(|_| !dashboard.risk.is_unknown())
            .ok_or(PreflightError::UnknownRisk("withdraw"))?;
        let position = dashboard.position(&pool_id).ok_or(PreflightError::ExceedsWithdrawable {
            max: Decimal::ZERO,
            requested: amount,
        })?;
        preflight::check_withdraw(amount, position, &token, factor, self.buffer)?;

        let info = self.tokens.get(token).await?;
        let raw = to_base_units(amount, info.decimals)?;
        tracing::info!("withdrawing {} {} from {}", amount, info.symbol, pool_id);
        self.pool.withdraw_collateral(pool_id, token, raw).await
    }

    pub async fn borrow(&self, pool_id: PoolId, token: Address, amount: Decimal) -> Result<B256> {
        let dashboard = self.dashboard().await;
        let entry = dashboard.pool(&pool_id).ok_or(PreflightError::PoolNotFound(pool_id))?;
        let info = self.tokens.get(token).await?;
        let reserve = if entry.pool.token_a == token {
            entry.pool.reserve_a
        } else if entry.pool.token_b == token {
            entry.pool.reserve_b
        } else {
            return Err(PreflightError::TokenNotInPool(token).into());
        };
        let reserve = to_display(reserve, info.decimals)?;
        preflight::check_borrow(amount, &dashboard.risk, reserve)?;

        let raw = to_base_units(amount, info.decimals)?;
        tracing::info!("borrowing {} {} from {}", amount, info.symbol, pool_id);
        self.pool.borrow(pool_id, token, raw).await
    }

    pub async fn repay(&self, pool_id: PoolId, token: Address, amount: Decimal) -> Result<B256> {
        let dashboard = self.dashboard().await;
        let position = dashboard.position(&pool_id).ok_or(PreflightError::ExceedsRepayable {
            max: Decimal::ZERO,
            requested: amount,
        })?;
        let info = self.tokens.get(token).await?;
        let balance = self.wallet_balance(&info).await;
        preflight::check_repay(amount, position, &token, balance)?;

        let raw = to_base_units(amount, info.decimals)?;
        self.ensure_allowance(token, raw).await?;
        tracing::info!("repaying {} {} in {}", amount, info.symbol, pool_id);
        self.pool.repay(pool_id, token, raw).await
    }

    pub async fn swap(&self, pool_id: PoolId, token_in: Address, amount: Decimal, slippage_bps: u32) -> Result<B256> {
        let info = self.pool_token(pool_id, token_in).await?;
        preflight::check_deposit(amount, self.wallet_balance(&info).await)?;

        let raw = to_base_units(amount, info.decimals)?;
        let quote = self.pool.get_amount_out(pool_id, token_in, raw).await?;
        let min_out = preflight::min_amount_out(quote, slippage_bps)?;
        self.ensure_allowance(token_in, raw).await?;
        tracing::info!("swapping {} {} (quote {}, min {})", amount, info.symbol, quote, min_out);
        self.pool.swap(pool_id, token_in, raw, min_out).await
    }

    pub async fn add_liquidity(&self, pool_id: PoolId, amount_a: Decimal, amount_b: Decimal) -> Result<B256> {
        let pool = self.pool.get_pool_info(pool_id).await?;
        let (info_a, info_b) = tokio::try_join!(self.tokens.get(pool.token_a), self.tokens.get(pool.token_b))?;
        let (balance_a, balance_b) = tokio::join!(self.wallet_balance(&info_a), self.wallet_balance(&info_b));
        preflight::check_deposit(amount_a, balance_a)?;
        preflight::check_deposit(amount_b, balance_b)?;

        let raw_a = to_base_units(amount_a, info_a.decimals)?;
        let raw_b = to_base_units(amount_b, info_b.decimals)?;
        self.ensure_allowance(pool.token_a, raw_a).await?;
        self.ensure_allowance(pool.token_b, raw_b).await?;
        tracing::info!("adding liquidity {} {} / {} {}", amount_a, info_a.symbol, amount_b, info_b.symbol);
        self.pool.add_liquidity(pool_id, raw_a, raw_b).await
    }

    pub async fn remove_liquidity(&self, pool_id: PoolId, liquidity: U256) -> Result<B256> {
        if liquidity.is_zero() {
            return Err(PreflightError::ZeroAmount.into());
        }
        tracing::info!("removing {} liquidity from {}", liquidity, pool_id);
        self.pool.remove_liquidity(pool_id, liquidity).await
    }

    /// create the pool for a pair, returns its id
    pub async fn create_pool(&self, token_a: Address, token_b: Address) -> Result<PoolId> {
        if token_a == token_b {
            return Err(ClientError::InvalidAddress("pool needs two distinct tokens".into()));
        }
        let id = pool_id(token_a, token_b);
        if self.pool.get_all_pools().await?.contains(&id) {
            return Err(PreflightError::PoolExists(id).into());
        }
        self.pool.create_pool(token_a, token_b).await?;
        tracing::info!("created pool {}", id);
        Ok(id)
    }
}
