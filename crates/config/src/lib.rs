//! # dpay-config
//!
//! Layered configuration for the dpay payment client.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

use alloy_chains::{Chain, NamedChain};
use alloy_primitives::{Address, B256};
use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Map},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

mod error;
pub use error::ExtractConfigError;

pub use figment;

/// dpay configuration.
///
/// Values are read from the following sources, in ascending priority order:
///
///   1. [`Config::default()`]
///   2. `dpay.toml` _or_ the file named by the `DPAY_CONFIG` environment variable
///   3. `DPAY_` prefixed environment variables
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Address of the deployed payment contract.
    ///
    /// Transfers cannot be submitted until this is set.
    pub contract_address: Option<Address>,
    /// Chain the contract is deployed on.
    pub chain_id: u64,
    /// Base URL of the block explorer used for transaction links.
    pub explorer_url: String,
    /// Port of the local browser bridge. `0` picks a free port.
    pub port: u16,
    /// Whether to open the bridge page in the system browser.
    pub open_browser: bool,
    /// Seconds to wait for the bridge page to load.
    pub attach_timeout: u64,
    /// Milliseconds between receipt polls while awaiting confirmation.
    pub poll_interval: u64,
    /// Number of blocks that must include a transfer before it counts as confirmed.
    pub confirmations: u64,
    /// Decimal places used for every token amount.
    ///
    /// When unset, the token contract's `decimals()` is queried before each transfer.
    pub token_decimals: Option<u8>,
}

impl Config {
    /// The default config file name.
    pub const FILE_NAME: &'static str = "dpay.toml";

    /// Environment variable overriding the config file path.
    pub const CONFIG_ENV: &'static str = "DPAY_CONFIG";

    /// Prefix of the environment variables merged on top of the config file.
    pub const ENV_PREFIX: &'static str = "DPAY_";

    /// Loads the config from the default [`figment`](Self::figment).
    pub fn load() -> Result<Self, ExtractConfigError> {
        Self::from_provider(Self::figment())
    }

    /// Extracts a config from any figment [`Provider`].
    pub fn from_provider<T: Provider>(provider: T) -> Result<Self, ExtractConfigError> {
        let figment = Figment::from(provider);
        let config = figment.extract::<Self>().map_err(ExtractConfigError::new)?;
        trace!(?config, "extracted config");
        Ok(config)
    }

    /// Returns the default figment: defaults, then the config file, then the environment.
    pub fn figment() -> Figment {
        Figment::from(Self::default())
            .merge(Toml::file(Self::config_path()))
            .merge(Env::prefixed(Self::ENV_PREFIX).ignore(&["config"]))
    }

    /// Path of the config file, honoring [`Self::CONFIG_ENV`].
    pub fn config_path() -> PathBuf {
        Env::var_or(Self::CONFIG_ENV, Self::FILE_NAME).into()
    }

    /// The configured chain.
    pub fn chain(&self) -> Chain {
        Chain::from_id(self.chain_id)
    }

    /// Link to a transaction on the configured block explorer.
    pub fn tx_url(&self, hash: &B256) -> String {
        format!("{}/tx/{hash:#x}", self.explorer_url.trim_end_matches('/'))
    }

    /// Interval between receipt polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }

    /// How long to wait for the bridge page to attach.
    pub fn attach_timeout(&self) -> Duration {
        Duration::from_secs(self.attach_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contract_address: None,
            chain_id: NamedChain::Sepolia as u64,
            explorer_url: "https://sepolia.etherscan.io".to_string(),
            port: 9545,
            open_browser: true,
            attach_timeout: 120,
            poll_interval: 1_000,
            confirmations: 1,
            token_decimals: None,
        }
    }
}

impl Provider for Config {
    fn metadata(&self) -> Metadata {
        Metadata::named("dpay Config")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}
