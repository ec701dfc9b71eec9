use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::account::Amount;
use crate::address::Address;
use crate::alert::DEFAULT_ALERT_BLOCK_WAIT;
use crate::error::CustodyError;
use crate::governance::SIGNER_COUNT;
use crate::ledger::{BurnPolicy, TokenParams, DEFAULT_SUPPLY_CAP};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WbtcvConfig {
    pub node: NodeConfig,
    pub token: TokenConfig,
    #[serde(default)]
    pub governance: GovernanceConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeConfig {
    pub db_path: String,
    pub log_level: String,
    /// Identity that deploys the ledger before ownership is handed over.
    #[serde(default = "default_deployer")]
    pub deployer: String,
}

fn default_deployer() -> String {
    "deployer".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Base units. TOML integers are 64-bit, hence `u64` here.
    pub supply_cap: u64,
    #[serde(default = "default_alert_block_wait")]
    pub alert_block_wait: u64,
    #[serde(default)]
    pub burn_policy: BurnPolicy,
}

fn default_alert_block_wait() -> u64 {
    DEFAULT_ALERT_BLOCK_WAIT
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GovernanceConfig {
    /// Label or hex address the controller acts as on the ledger.
    pub controller: String,
    /// Labels or hex addresses of the approved signers. Empty deploys the
    /// ledger without a controller.
    #[serde(default)]
    pub signers: Vec<String>,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            controller: "controller".to_string(),
            signers: vec![
                "signer-a".to_string(),
                "signer-b".to_string(),
                "signer-c".to_string(),
            ],
        }
    }
}

impl Default for WbtcvConfig {
    fn default() -> Self {
        let params = TokenParams::default();
        Self {
            node: NodeConfig {
                db_path: "./data/wbtcv".to_string(),
                log_level: "info".to_string(),
                deployer: default_deployer(),
            },
            token: TokenConfig {
                name: params.name,
                symbol: params.symbol,
                decimals: params.decimals,
                supply_cap: DEFAULT_SUPPLY_CAP as u64,
                alert_block_wait: params.alert_block_wait,
                burn_policy: params.burn_policy,
            },
            governance: GovernanceConfig::default(),
        }
    }
}

impl WbtcvConfig {
    /// Read `path`, or write and return the defaults when it does not exist.
    pub fn load_or_default(path: &str) -> Result<Self, CustodyError> {
        if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| CustodyError::ConfigError(format!("reading {}: {}", path, e)))?;
            let config: Self = toml::from_str(&raw)
                .map_err(|e| CustodyError::ConfigError(format!("parsing {}: {}", path, e)))?;
            config.validate()?;
            info!("Config loaded from {}", path);
            Ok(config)
        } else {
            warn!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            match toml::to_string_pretty(&config) {
                Ok(s) => {
                    if let Err(e) = std::fs::write(path, s) {
                        warn!("Could not write default config to '{}': {}", path, e);
                    }
                }
                Err(e) => warn!("Could not render default config: {}", e),
            }
            Ok(config)
        }
    }

    pub fn validate(&self) -> Result<(), CustodyError> {
        if self.token.supply_cap == 0 {
            return Err(CustodyError::ConfigError("token.supply_cap must be positive".into()));
        }
        if self.token.decimals > 18 {
            return Err(CustodyError::ConfigError("token.decimals must be at most 18".into()));
        }
        let signers = self.governance.signers.len();
        if signers != 0 && signers != SIGNER_COUNT {
            return Err(CustodyError::ConfigError(format!(
                "governance.signers must list {} signers or none, got {}",
                SIGNER_COUNT, signers
            )));
        }
        Ok(())
    }

    pub fn token_params(&self) -> TokenParams {
        TokenParams {
            name: self.token.name.clone(),
            symbol: self.token.symbol.clone(),
            decimals: self.token.decimals,
            supply_cap: Amount::from(self.token.supply_cap),
            alert_block_wait: self.token.alert_block_wait,
            burn_policy: self.token.burn_policy,
        }
    }

    pub fn deployer(&self) -> Result<Address, CustodyError> {
        Ok(Address::parse_or_label(&self.node.deployer)?)
    }

    pub fn controller(&self) -> Result<Address, CustodyError> {
        Ok(Address::parse_or_label(&self.governance.controller)?)
    }

    pub fn signers(&self) -> Result<Vec<Address>, CustodyError> {
        self.governance
            .signers
            .iter()
            .map(|s| Address::parse_or_label(s).map_err(CustodyError::from))
            .collect()
    }
}
