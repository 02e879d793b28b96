//! lendguard-client: lending pool interaction over json-rpc
//!
//! reads are batched and degrade gracefully, writes are pre-flighted
//! against local risk math before anything is submitted
//!
//! ## usage
//!
//! ```rust,ignore
//! let config = ClientConfig::load("lendctl.toml")?;
//! let provider = Arc::new(RpcProvider::new(&config)?);
//! let actions = PoolActions::new(config.pool, provider);
//!
//! let dashboard = actions.dashboard().await;
//! println!("health factor: {}", dashboard.risk.health_factor);
//! ```

pub mod actions;
pub mod config;
pub mod contracts;
pub mod dashboard;
pub mod error;
pub mod oracle;
pub mod pool_id;
pub mod preflight;
pub mod provider;
pub mod revert;
pub mod tokens;

pub use actions::PoolActions;
pub use config::*;
pub use contracts::{deploy_contract, CallbackContract, Erc20Client, PoolContract};
pub use dashboard::*;
pub use error::*;
pub use oracle::*;
pub use pool_id::*;
pub use preflight::{AllowanceCheck, PreflightError};
pub use provider::*;
pub use tokens::TokenRegistry;
