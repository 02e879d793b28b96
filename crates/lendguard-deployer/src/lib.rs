//! lendguard-deployer: position protection across two chains
//!
//! deploys a callback contract on the pool's chain and a reactive contract
//! that watches the position on the reactive chain, then approves the
//! callback to move collateral and configures it. there is no rollback:
//! the state records every artifact produced so far and a later run picks
//! up from it.
//!
//! ```text
//! idle -> callback -> reactive -> approval -> complete
//! ```
//!
//! ## usage
//!
//! ```rust,ignore
//! let backend = RpcBackend::new(provider, callback_code, reactive_code);
//! let deployer = Deployer::new(backend, DeployerConfig::new(11_155_111, 5_318_007));
//!
//! let mut session = DeploymentSession::default();
//! if let Err(e) = session.run(&deployer, &params).await {
//!     eprintln!("stopped at {:?}: {}", session.state.step(), e.friendly());
//! }
//! ```

pub mod backend;
pub mod config;
pub mod deployer;
pub mod error;
pub mod params;
pub mod state;

pub use backend::*;
pub use config::*;
pub use deployer::*;
pub use error::*;
pub use params::*;
pub use state::*;
