//! the deployment workflow
//!
//! steps run strictly in order and each waits for its transaction. a
//! failing step stops the run and the report carries the state as of the
//! last completed step; nothing is rolled back.

use alloy_primitives::U256;
use lendguard_risk::{to_base_units, to_display};
use serde::{Deserialize, Serialize};

use crate::backend::{DeploymentBackend, ProtectionSetup};
use crate::error::{DeployError, Result};
use crate::params::{ProtectionParams, ValidatedParams};
use crate::state::{Approval, DeploymentState, ReactiveDeployment, ReactiveTrigger};

/// what to do with the state left by an earlier run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumePolicy {
    /// skip deployments already recorded
    #[default]
    Resume,
    /// ignore prior state and deploy everything again
    Fresh,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployerConfig {
    pub callback_chain_id: u64,
    pub reactive_chain_id: u64,
    /// wei sent with the callback deployment
    pub callback_payment: U256,
    /// wei sent with the reactive deployment
    pub reactive_payment: U256,
    pub resume: ResumePolicy,
}

impl DeployerConfig {
    /// 0.01 and 0.1 native currency, resuming
    pub fn new(callback_chain_id: u64, reactive_chain_id: u64) -> Self {
        Self {
            callback_chain_id,
            reactive_chain_id,
            callback_payment: U256::from(10_000_000_000_000_000u64),
            reactive_payment: U256::from(100_000_000_000_000_000u64),
            resume: ResumePolicy::Resume,
        }
    }

    pub fn with_resume(mut self, resume: ResumePolicy) -> Self {
        self.resume = resume;
        self
    }
}

/// outcome of one run: the state reached and how the run ended
#[derive(Debug)]
pub struct DeploymentReport {
    pub state: DeploymentState,
    pub result: Result<()>,
}

pub struct Deployer<B> {
    backend: B,
    config: DeployerConfig,
}

impl<B: DeploymentBackend> Deployer<B> {
    pub fn new(backend: B, config: DeployerConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &DeployerConfig {
        &self.config
    }

    /// run the workflow from `prior`. parameters are validated before any
    /// remote call; on failure `prior` is returned untouched.
    pub async fn deploy(&self, params: &ProtectionParams, prior: &DeploymentState) -> DeploymentReport {
        let params = match params.validate() {
            Ok(params) => params,
            Err(e) => {
                tracing::warn!("{}", e);
                return DeploymentReport {
                    state: prior.clone(),
                    result: Err(e.into()),
                };
            }
        };

        let mut state = match self.config.resume {
            ResumePolicy::Resume => prior.clone(),
            ResumePolicy::Fresh => DeploymentState::Idle,
        };

        let result = self.advance(&params, &mut state).await;
        match &result {
            Ok(()) => tracing::info!("protection active for pool {}", params.pool_id),
            Err(e) => tracing::error!("deployment stopped at {:?}: {}", state.step(), e),
        }
        DeploymentReport { state, result }
    }

    async fn advance(&self, params: &ValidatedParams, state: &mut DeploymentState) -> Result<()> {
        let config = &self.config;

        // callback
        let callback = match state.callback_contract() {
            Some(callback) => {
                tracing::info!("reusing callback contract {}", callback);
                callback
            }
            None => {
                tracing::info!("deploying callback contract on chain {}", config.callback_chain_id);
                self.backend.switch_chain(config.callback_chain_id).await?;
                let callback = self.backend.deploy_callback(config.callback_payment).await?;
                tracing::info!("callback contract at {}", callback);
                *state = DeploymentState::Callback { callback };
                callback
            }
        };

        // an approval recorded against this callback stays valid for it
        let prior_approval = state.approval();

        // reactive
        let trigger = ReactiveTrigger {
            callback,
            user: params.user,
            pool_id: params.pool_id,
            threshold: params.threshold_wei()?,
        };
        let recorded = state.reactive().cloned();
        let reactive = match recorded {
            Some(reactive) if reactive.trigger == trigger => {
                tracing::info!("reusing reactive contract {}", reactive.address);
                reactive
            }
            recorded => {
                if let Some(old) = recorded {
                    tracing::warn!("trigger changed, replacing reactive contract {}", old.address);
                }
                tracing::info!("deploying reactive contract on chain {}", config.reactive_chain_id);
                self.backend.switch_chain(config.reactive_chain_id).await?;
                let address = self.backend.deploy_reactive(&trigger, config.reactive_payment).await?;
                tracing::info!("reactive contract at {}", address);
                let reactive = ReactiveDeployment { address, trigger };
                *state = DeploymentState::Reactive {
                    callback,
                    reactive: reactive.clone(),
                };
                reactive
            }
        };

        self.backend.switch_chain(config.callback_chain_id).await?;
        let token = params.collateral_token;
        let decimals = self.backend.token_decimals(token).await?;
        let max_amount = to_base_units(params.max_amount, decimals)?;
        let setup = ProtectionSetup {
            pool_id: params.pool_id,
            threshold: reactive.trigger.threshold,
            target: params.target_wei()?,
            collateral_token: token,
            max_amount,
        };

        // a complete state still here has an unchanged trigger
        match (state.setup().cloned(), prior_approval) {
            (Some(applied), _) if applied == setup => {
                tracing::info!("deployment already complete");
                return Ok(());
            }
            (Some(_), Some(approval)) => {
                tracing::warn!("protection settings changed, configuring callback {} again", callback);
                *state = DeploymentState::Approval {
                    callback,
                    reactive: reactive.clone(),
                    approval,
                };
            }
            _ => {}
        }

        // approval, always re-checked: amounts may differ from an earlier run
        let balance = self.backend.balance_of(token, params.user).await?;
        if balance < max_amount {
            return Err(DeployError::InsufficientBalance {
                have: to_display(balance, decimals)?,
                need: params.max_amount,
            });
        }

        let allowance = self.backend.allowance(token, params.user, callback).await?;
        let approval = if allowance >= max_amount {
            tracing::info!("allowance already covers {}", params.max_amount);
            match prior_approval {
                Some(approved @ Approval::Approved { .. }) => approved,
                _ => Approval::AlreadySufficient,
            }
        } else {
            let tx_hash = self.backend.approve(token, callback, max_amount).await?;
            tracing::info!("approved callback for {} in {}", params.max_amount, tx_hash);
            Approval::Approved { tx_hash }
        };
        *state = DeploymentState::Approval {
            callback,
            reactive: reactive.clone(),
            approval,
        };

        // setup
        let setup_tx_hash = self.backend.setup_protection(callback, &setup).await?;
        tracing::info!("protection configured in {}", setup_tx_hash);
        *state = DeploymentState::Complete {
            callback,
            reactive,
            approval,
            setup,
            setup_tx_hash,
        };
        Ok(())
    }
}
