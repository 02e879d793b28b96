//! json-rpc provider
//!
//! the provider is the wallet: it owns the active chain and signs whatever
//! `eth_sendTransaction` it is handed. nothing here touches keys.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::{ChainConfig, ClientConfig};
use crate::error::{ClientError, Result};

/// transaction handed to the provider for signing and submission
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    /// `None` deploys `data` as creation code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    pub data: Bytes,
}

impl TransactionRequest {
    pub fn call(from: Address, to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            from,
            to: Some(to),
            value: None,
            data: data.into(),
        }
    }

    pub fn deploy(from: Address, code: impl Into<Bytes>, value: U256) -> Self {
        Self {
            from,
            to: None,
            value: (!value.is_zero()).then_some(value),
            data: code.into(),
        }
    }
}

/// mined transaction
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// 1 = success, 0 = reverted
    #[serde(default)]
    pub status: Option<U256>,
    #[serde(default)]
    pub block_number: Option<U256>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| s == U256::from(1u64))
    }
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// chain the provider currently talks to
    async fn chain_id(&self) -> Result<u64>;

    /// make `chain_id` the active chain
    async fn switch_chain(&self, chain_id: u64) -> Result<()>;

    /// account transactions are sent from
    fn sender(&self) -> Address;

    /// read-only call against the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// submit a transaction, returns its hash
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256>;

    /// block until the transaction is mined
    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt>;

    /// submit and wait, failing if the transaction reverted
    async fn send_and_confirm(&self, tx: TransactionRequest) -> Result<TransactionReceipt> {
        let hash = self.send_transaction(tx).await?;
        tracing::info!("submitted {}", hash);
        let receipt = self.wait_for_receipt(hash).await?;
        if !receipt.succeeded() {
            return Err(ClientError::TransactionFailed(format!("{} reverted", hash)));
        }
        Ok(receipt)
    }
}

#[async_trait]
impl<T: Provider + ?Sized> Provider for Arc<T> {
    async fn chain_id(&self) -> Result<u64> {
        (**self).chain_id().await
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        (**self).switch_chain(chain_id).await
    }

    fn sender(&self) -> Address {
        (**self).sender()
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        (**self).call(to, data).await
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256> {
        (**self).send_transaction(tx).await
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
        (**self).wait_for_receipt(hash).await
    }
}

/// http json-rpc provider with one endpoint per configured chain
pub struct RpcProvider {
    client: Client,
    chains: HashMap<u64, ChainConfig>,
    active: RwLock<u64>,
    sender: Address,
    poll_interval: Duration,
}

impl RpcProvider {
    /// provider starting on the config's home chain
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let home = config.home()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            chains: config.chains.iter().map(|c| (c.chain_id, c.clone())).collect(),
            active: RwLock::new(home.chain_id),
            sender: config.sender,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    async fn active_url(&self) -> Result<String> {
        let id = *self.active.read().await;
        self.chains
            .get(&id)
            .map(|c| c.rpc_url.clone())
            .ok_or(ClientError::UnknownChain(id))
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let url = self.active_url().await?;
        self.request_to(&url, method, params).await
    }

    async fn request_to(&self, url: &str, method: &str, params: Value) -> Result<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: RpcResponse = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(error.into_client_error());
        }

        // null results are meaningful (pending receipts)
        Ok(response.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl Provider for RpcProvider {
    async fn chain_id(&self) -> Result<u64> {
        let result = self.request("eth_chainId", json!([])).await?;
        parse_quantity(&result)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        let chain = self
            .chains
            .get(&chain_id)
            .ok_or(ClientError::UnknownChain(chain_id))?;

        let reported = self.request_to(&chain.rpc_url, "eth_chainId", json!([])).await?;
        let actual = parse_quantity(&reported)?;
        if actual != chain_id {
            return Err(ClientError::ChainMismatch {
                expected: chain_id,
                actual,
            });
        }

        *self.active.write().await = chain_id;
        tracing::info!("switched to {} ({})", chain.name, chain_id);
        Ok(())
    }

    fn sender(&self) -> Address {
        self.sender
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let result = self
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        serde_json::from_value(result).map_err(|e| ClientError::DecodingError(e.to_string()))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256> {
        let result = self.request("eth_sendTransaction", json!([tx])).await?;
        serde_json::from_value(result).map_err(|e| ClientError::DecodingError(e.to_string()))
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
        loop {
            let result = self
                .request("eth_getTransactionReceipt", json!([hash]))
                .await?;
            if !result.is_null() {
                return serde_json::from_value(result)
                    .map_err(|e| ClientError::DecodingError(e.to_string()));
            }
            tracing::debug!("waiting for {}", hash);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcError {
    fn into_client_error(self) -> ClientError {
        // revert data comes back as abi-encoded Error(string)
        let reason = self
            .data
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|s| hex::decode(s.trim_start_matches("0x")).ok())
            .and_then(|bytes| alloy_sol_types::decode_revert_reason(&bytes));

        match reason {
            Some(reason) => ClientError::Reverted(reason),
            None if self.message.contains("revert") => ClientError::Reverted(self.message),
            None => ClientError::Rpc {
                code: self.code,
                message: self.message,
            },
        }
    }
}

/// parse a hex quantity (`"0x1a"`)
pub fn parse_quantity(value: &Value) -> Result<u64> {
    let s = value
        .as_str()
        .ok_or_else(|| ClientError::DecodingError(format!("expected hex quantity, got {}", value)))?;
    u64::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| ClientError::DecodingError(format!("{}: {}", s, e)))
}
