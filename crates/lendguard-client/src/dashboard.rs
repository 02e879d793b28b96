//! one-shot load of everything a position view needs
//!
//! reads are issued concurrently and joined. a failed read never aborts
//! the load: it is recorded as a warning and the risk summary falls back to
//! the conservative "unknown" sentinel.

use alloy_primitives::Address;
use futures::future::join_all;
use lendguard_risk::{
    aggregate_risk, CollateralFactor, Pool, PoolId, PoolPosition, Position, RiskSummary, TokenInfo,
    ValuedPosition,
};
use serde::Serialize;

use crate::oracle::{PoolOracle, TokenReader};
use crate::tokens::TokenRegistry;

#[derive(Clone, Debug, Serialize)]
pub struct PoolEntry {
    pub pool_id: PoolId,
    pub pool: Pool,
    pub token_a: Option<TokenInfo>,
    pub token_b: Option<TokenInfo>,
    /// `None` when the position read failed
    pub position: Option<Position>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Dashboard {
    pub user: Address,
    pub collateral_factor: Option<CollateralFactor>,
    pub pools: Vec<PoolEntry>,
    pub risk: RiskSummary,
    pub warnings: Vec<String>,
}

impl Dashboard {
    pub fn pool(&self, pool_id: &PoolId) -> Option<&PoolEntry> {
        self.pools.iter().find(|p| p.pool_id == *pool_id)
    }

    pub fn position(&self, pool_id: &PoolId) -> Option<&ValuedPosition> {
        self.risk.positions.iter().find(|p| p.pool_id == *pool_id)
    }

    pub fn token(&self, address: &Address) -> Option<&TokenInfo> {
        self.pools
            .iter()
            .flat_map(|p| [p.token_a.as_ref(), p.token_b.as_ref()])
            .flatten()
            .find(|t| t.address == *address)
    }
}

pub async fn load_dashboard<O, R>(oracle: &O, tokens: &TokenRegistry<R>, user: Address) -> Dashboard
where
    O: PoolOracle + ?Sized,
    R: TokenReader,
{
    let mut warnings = Vec::new();

    let (pool_ids, factor) = tokio::join!(oracle.all_pools(), oracle.collateral_factor());

    let collateral_factor = match factor {
        Ok(f) => Some(f),
        Err(e) => {
            tracing::warn!("collateral factor read failed: {}", e);
            warnings.push(format!("collateral factor: {}", e.friendly()));
            None
        }
    };

    let pool_ids = match pool_ids {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!("pool list read failed: {}", e);
            warnings.push(format!("pool list: {}", e.friendly()));
            return Dashboard {
                user,
                collateral_factor,
                pools: Vec::new(),
                risk: RiskSummary::unknown(),
                warnings,
            };
        }
    };

    let reads = join_all(pool_ids.iter().map(|id| async move {
        let (info, position) = tokio::join!(oracle.pool_info(*id), oracle.user_position(user, *id));
        (*id, info, position)
    }))
    .await;

    let mut degraded = false;
    let mut loaded = Vec::with_capacity(reads.len());
    for (pool_id, info, position) in reads {
        let pool = match info {
            Ok(pool) => pool,
            Err(e) => {
                tracing::warn!("pool {} read failed: {}", pool_id, e);
                warnings.push(format!("pool {}: {}", pool_id, e.friendly()));
                degraded = true;
                continue;
            }
        };
        let position = match position {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!("position in {} read failed: {}", pool_id, e);
                warnings.push(format!("position in {}: {}", pool_id, e.friendly()));
                degraded = true;
                None
            }
        };
        loaded.push((pool_id, pool, position));
    }

    let mut addresses: Vec<Address> = loaded
        .iter()
        .flat_map(|(_, pool, _)| [pool.token_a, pool.token_b])
        .collect();
    addresses.sort();
    addresses.dedup();

    for (address, result) in tokens.get_many(&addresses).await {
        if let Err(e) = result {
            tracing::warn!("token {} metadata read failed: {}", address, e);
            warnings.push(format!("token {}: {}", address, e.friendly()));
        }
    }
    let infos = tokens.snapshot().await;

    let positions: Vec<PoolPosition> = loaded
        .iter()
        .filter_map(|(pool_id, pool, position)| {
            position.map(|position| PoolPosition {
                pool_id: *pool_id,
                token_a: pool.token_a,
                token_b: pool.token_b,
                position,
            })
        })
        .collect();

    // missing decimals are handled inside the estimator
    let risk = match collateral_factor {
        Some(factor) if !degraded => aggregate_risk(&positions, &infos, factor),
        _ => RiskSummary::unknown(),
    };

    let pools = loaded
        .into_iter()
        .map(|(pool_id, pool, position)| PoolEntry {
            token_a: infos.get(&pool.token_a).cloned(),
            token_b: infos.get(&pool.token_b).cloned(),
            pool_id,
            pool,
            position,
        })
        .collect();

    Dashboard {
        user,
        collateral_factor,
        pools,
        risk,
        warnings,
    }
}
