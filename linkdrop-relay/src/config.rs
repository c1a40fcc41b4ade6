//! Relay configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 4022
//! relayer = "$RELAYER_ADDRESS"
//!
//! [campaign.deployment]
//! address = "0x00000000000000000000000000000000000000ca"
//! owner = "0x0000000000000000000000000000000000000015"
//! value = "1000000000000000000"
//!
//! [campaign.params]
//! variant = "erc20"
//! token = "0x0000000000000000000000000000000000000070"
//! claim_amount = "10"
//! referral_amount = "1"
//! claim_amount_native = "0"
//! verification_address = "${VERIFICATION_ADDRESS}"
//!
//! [[seed.tokens]]
//! token = "0x0000000000000000000000000000000000000070"
//! holder = "0x0000000000000000000000000000000000000015"
//! amount = "1000"
//! ```
//!
//! Amounts are decimal or `0x`-prefixed hex strings.
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `config.toml`)
//! - `HOST` - Override server bind address
//! - `PORT` - Override server port
//! - Any variable referenced by `$VAR` in the config file

use std::net::IpAddr;
use std::path::Path;

use alloy_primitives::{Address, U256};
use linkdrop::{Deployment, Erc20CampaignConfig, Erc721CampaignConfig};
use serde::{Deserialize, Serialize};

/// Errors raised while loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The (expanded) file is not valid configuration TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `4022`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Identity the relay submits claims as; native rebates are paid here.
    pub relayer: Address,

    /// The campaign this relay serves.
    pub campaign: CampaignSection,

    /// Initial state of the in-memory value ledger.
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Campaign deployment and its variant-specific parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSection {
    /// Campaign address, owner and initial native deposit.
    pub deployment: Deployment,
    /// Variant parameters.
    pub params: CampaignParams,
}

/// Variant-specific campaign parameters, tagged by `variant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum CampaignParams {
    /// Fungible token campaign.
    Erc20(Erc20CampaignConfig),
    /// Ownership registry campaign.
    Erc721(Erc721CampaignConfig),
}

/// Balances, allowances and tokens the in-memory ledger starts with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Native currency balances.
    #[serde(default)]
    pub native: Vec<NativeSeed>,
    /// Fungible token balances.
    #[serde(default)]
    pub tokens: Vec<TokenSeed>,
    /// Fungible token allowances.
    #[serde(default)]
    pub allowances: Vec<AllowanceSeed>,
    /// Registry tokens.
    #[serde(default)]
    pub nfts: Vec<NftSeed>,
    /// Registry operator approvals.
    #[serde(default)]
    pub operators: Vec<OperatorSeed>,
}

/// A native currency balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeSeed {
    /// Holder credited.
    pub holder: Address,
    /// Amount.
    pub amount: U256,
}

/// A fungible token balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSeed {
    /// Token contract.
    pub token: Address,
    /// Holder credited.
    pub holder: Address,
    /// Amount.
    pub amount: U256,
}

/// A fungible token allowance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowanceSeed {
    /// Token contract.
    pub token: Address,
    /// Holder granting the allowance.
    pub owner: Address,
    /// Party allowed to spend.
    pub spender: Address,
    /// Amount.
    pub amount: U256,
}

/// A registry token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftSeed {
    /// Registry contract.
    pub registry: Address,
    /// Owner.
    pub owner: Address,
    /// Token identifier.
    pub token_id: U256,
}

/// An operator approval on a registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorSeed {
    /// Registry contract.
    pub registry: Address,
    /// Token owner.
    pub owner: Address,
    /// Approved operator.
    pub operator: Address,
}

const fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
}

const fn default_port() -> u16 {
    4022
}

impl RelayConfig {
    /// Loads configuration from a specific file path.
    ///
    /// All `$VAR` / `${VAR}` references are expanded from the process
    /// environment before parsing. `HOST` and `PORT` env vars override the
    /// file values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::parse(&content)?;

        if let Ok(host) = std::env::var("HOST")
            && let Ok(addr) = host.parse()
        {
            config.host = addr;
        }
        if let Ok(port) = std::env::var("PORT")
            && let Ok(p) = port.parse()
        {
            config.port = p;
        }

        Ok(config)
    }

    /// Parses configuration text after environment expansion.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on invalid TOML or missing fields.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content);
        Ok(toml::from_str(&expanded)?)
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut var_name = String::new();
        while let Some(&c) = chars.peek() {
            if braced {
                if c == '}' {
                    chars.next();
                    break;
                }
            } else if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            var_name.push(c);
            chars.next();
        }

        match std::env::var(&var_name) {
            Ok(val) if !var_name.is_empty() => result.push_str(&val),
            _ if braced => {
                result.push_str("${");
                result.push_str(&var_name);
                if !var_name.is_empty() {
                    result.push('}');
                }
            }
            _ => {
                result.push('$');
                result.push_str(&var_name);
            }
        }
    }

    result
}
