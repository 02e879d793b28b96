//! session-scoped token metadata cache

use alloy_primitives::Address;
use futures::future::join_all;
use lendguard_risk::TokenInfo;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::oracle::TokenReader;

/// memoizes token metadata per address for the lifetime of the session.
/// entries are only dropped by [`TokenRegistry::clear`].
pub struct TokenRegistry<R> {
    reader: R,
    cache: RwLock<HashMap<Address, TokenInfo>>,
}

impl<R: TokenReader> TokenRegistry<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// cached info, fetching it on first use
    pub async fn get(&self, token: Address) -> Result<TokenInfo> {
        if let Some(info) = self.cache.read().await.get(&token) {
            return Ok(info.clone());
        }

        tracing::debug!("fetching token metadata for {}", token);
        let info = self.reader.token_info(token).await?;
        self.cache.write().await.insert(token, info.clone());
        Ok(info)
    }

    /// fetch several tokens concurrently; failures are per token
    pub async fn get_many(&self, tokens: &[Address]) -> Vec<(Address, Result<TokenInfo>)> {
        let results = join_all(tokens.iter().map(|t| self.get(*t))).await;
        tokens.iter().copied().zip(results).collect()
    }

    pub async fn cached(&self, token: &Address) -> Option<TokenInfo> {
        self.cache.read().await.get(token).cloned()
    }

    /// everything cached so far, usable as a decimals lookup
    pub async fn snapshot(&self) -> HashMap<Address, TokenInfo> {
        self.cache.read().await.clone()
    }

    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use alloy_primitives::U256;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingReader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenReader for CountingReader {
        async fn token_info(&self, token: Address) -> Result<TokenInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if token == Address::ZERO {
                return Err(ClientError::Reverted("not a token".into()));
            }
            Ok(TokenInfo {
                address: token,
                name: "Test".into(),
                symbol: "TST".into(),
                decimals: 18,
            })
        }

        async fn balance_of(&self, _token: Address, _owner: Address) -> Result<U256> {
            Ok(U256::ZERO)
        }
    }

    #[tokio::test]
    async fn test_registry_memoizes() {
        let registry = TokenRegistry::new(CountingReader {
            calls: AtomicUsize::new(0),
        });
        let token = Address::repeat_byte(1);

        registry.get(token).await.unwrap();
        registry.get(token).await.unwrap();
        assert_eq!(registry.reader().calls.load(Ordering::SeqCst), 1);

        registry.clear().await;
        registry.get(token).await.unwrap();
        assert_eq!(registry.reader().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_registry_does_not_cache_failures() {
        let registry = TokenRegistry::new(CountingReader {
            calls: AtomicUsize::new(0),
        });

        let results = registry.get_many(&[Address::repeat_byte(2), Address::ZERO]).await;
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert!(registry.cached(&Address::ZERO).await.is_none());
        assert_eq!(registry.snapshot().await.len(), 1);
    }
}
