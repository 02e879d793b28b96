//! deployment progress

use alloy_primitives::{Address, B256, U256};
use lendguard_risk::PoolId;
use serde::{Deserialize, Serialize};

use crate::backend::{DeploymentBackend, ProtectionSetup};
use crate::deployer::Deployer;
use crate::error::{DeployError, Result};
use crate::params::ProtectionParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Idle,
    Callback,
    Reactive,
    Approval,
    Complete,
}

/// what the reactive contract was constructed to watch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactiveTrigger {
    pub callback: Address,
    pub user: Address,
    pub pool_id: PoolId,
    /// 18-decimal fixed point
    pub threshold: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactiveDeployment {
    pub address: Address,
    pub trigger: ReactiveTrigger,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Approval {
    AlreadySufficient,
    Approved { tx_hash: B256 },
}

/// each variant carries the artifacts of every step completed so far
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum DeploymentState {
    #[default]
    Idle,
    Callback {
        callback: Address,
    },
    Reactive {
        callback: Address,
        reactive: ReactiveDeployment,
    },
    Approval {
        callback: Address,
        reactive: ReactiveDeployment,
        approval: Approval,
    },
    Complete {
        callback: Address,
        reactive: ReactiveDeployment,
        approval: Approval,
        /// what the callback contract was last configured with
        setup: ProtectionSetup,
        setup_tx_hash: B256,
    },
}

impl DeploymentState {
    pub fn step(&self) -> Step {
        match self {
            DeploymentState::Idle => Step::Idle,
            DeploymentState::Callback { .. } => Step::Callback,
            DeploymentState::Reactive { .. } => Step::Reactive,
            DeploymentState::Approval { .. } => Step::Approval,
            DeploymentState::Complete { .. } => Step::Complete,
        }
    }

    pub fn callback_contract(&self) -> Option<Address> {
        match self {
            DeploymentState::Idle => None,
            DeploymentState::Callback { callback }
            | DeploymentState::Reactive { callback, .. }
            | DeploymentState::Approval { callback, .. }
            | DeploymentState::Complete { callback, .. } => Some(*callback),
        }
    }

    pub fn reactive(&self) -> Option<&ReactiveDeployment> {
        match self {
            DeploymentState::Idle | DeploymentState::Callback { .. } => None,
            DeploymentState::Reactive { reactive, .. }
            | DeploymentState::Approval { reactive, .. }
            | DeploymentState::Complete { reactive, .. } => Some(reactive),
        }
    }

    pub fn reactive_contract(&self) -> Option<Address> {
        self.reactive().map(|r| r.address)
    }

    pub fn approval(&self) -> Option<Approval> {
        match self {
            DeploymentState::Approval { approval, .. } | DeploymentState::Complete { approval, .. } => {
                Some(*approval)
            }
            _ => None,
        }
    }

    /// `None` both before the approval step and when no approval was needed
    pub fn approval_tx_hash(&self) -> Option<B256> {
        match self.approval()? {
            Approval::Approved { tx_hash } => Some(tx_hash),
            Approval::AlreadySufficient => None,
        }
    }

    pub fn setup_tx_hash(&self) -> Option<B256> {
        match self {
            DeploymentState::Complete { setup_tx_hash, .. } => Some(*setup_tx_hash),
            _ => None,
        }
    }

    pub fn setup(&self) -> Option<&ProtectionSetup> {
        match self {
            DeploymentState::Complete { setup, .. } => Some(setup),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.step() == Step::Complete
    }
}

/// caller-owned view of a deployment: progress, whether a run is in
/// flight, and the last failure
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSession {
    pub state: DeploymentState,
    pub running: bool,
    pub last_error: Option<String>,
}

impl DeploymentSession {
    pub fn new(state: DeploymentState) -> Self {
        Self {
            state,
            running: false,
            last_error: None,
        }
    }

    /// run the deployer from the current state, folding the outcome back in.
    /// a run dropped mid-flight leaves `running` set and later runs refuse
    /// to start until the caller clears it.
    pub async fn run<B: DeploymentBackend>(&mut self, deployer: &Deployer<B>, params: &ProtectionParams) -> Result<()> {
        if self.running {
            return Err(DeployError::AlreadyRunning);
        }
        self.running = true;
        self.last_error = None;

        let report = deployer.deploy(params, &self.state).await;

        self.state = report.state;
        self.running = false;
        if let Err(e) = &report.result {
            self.last_error = Some(e.friendly());
        }
        report.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reactive() -> ReactiveDeployment {
        ReactiveDeployment {
            address: Address::repeat_byte(0xbb),
            trigger: ReactiveTrigger {
                callback: Address::repeat_byte(0xaa),
                user: Address::repeat_byte(0x11),
                pool_id: B256::repeat_byte(0x01),
                threshold: U256::from(12u64),
            },
        }
    }

    #[test]
    fn test_flat_view() {
        let state = DeploymentState::Approval {
            callback: Address::repeat_byte(0xaa),
            reactive: reactive(),
            approval: Approval::AlreadySufficient,
        };
        assert_eq!(state.step(), Step::Approval);
        assert_eq!(state.callback_contract(), Some(Address::repeat_byte(0xaa)));
        assert_eq!(state.reactive_contract(), Some(Address::repeat_byte(0xbb)));
        assert_eq!(state.approval_tx_hash(), None);
        assert_eq!(state.setup_tx_hash(), None);
        assert_eq!(state.setup(), None);

        assert_eq!(DeploymentState::Idle.callback_contract(), None);
        assert!(Step::Callback < Step::Complete);
    }

    #[test]
    fn test_state_json_roundtrip() {
        let state = DeploymentState::Complete {
            callback: Address::repeat_byte(0xaa),
            reactive: reactive(),
            approval: Approval::Approved {
                tx_hash: B256::repeat_byte(0x02),
            },
            setup: ProtectionSetup {
                pool_id: B256::repeat_byte(0x01),
                threshold: U256::from(12u64),
                target: U256::from(15u64),
                collateral_token: Address::repeat_byte(0x22),
                max_amount: U256::from(100u64),
            },
            setup_tx_hash: B256::repeat_byte(0x03),
        };

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["step"], json!("complete"));
        assert_eq!(value["approval"]["kind"], json!("approved"));

        let back: DeploymentState = serde_json::from_value(value).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.approval_tx_hash(), Some(B256::repeat_byte(0x02)));
        assert_eq!(back.setup().map(|s| s.target), Some(U256::from(15u64)));
    }

    #[test]
    fn test_idle_from_json() {
        let state: DeploymentState = serde_json::from_str(r#"{"step":"idle"}"#).unwrap();
        assert_eq!(state, DeploymentState::Idle);
    }
}
