//! lendctl.toml

use anyhow::{Context, Result};
use lendguard_client::ClientConfig;
use lendguard_deployer::ProtectionConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub client: ClientConfig,
    /// only needed by `protect`
    #[serde(default)]
    pub protection: Option<ProtectionConfig>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}
